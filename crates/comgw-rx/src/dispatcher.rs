//! Receive dispatcher
//!
//! Entry point for received PDUs. Each PDU is configured for one of two
//! paths:
//!
//! - **immediate**: signals are processed in the reception context, under the
//!   dispatcher lock, and notifications fire once the lock is released.
//! - **deferred**: the payload is parked in the PDU's slot and its handle is
//!   put on the event queue of the owning main function. The main function
//!   later drains the queue, or scans all of its PDUs when the queue lost
//!   entries.
//!
//! Processed payloads are handed to the gateway through [`RxPduRouter`] with
//! the dispatcher lock released.

use std::sync::Arc;

use comgw_core::{
    ApiId, ComTables, Det, DetErrorCode, Idx, MainFunctionId, NotificationId, Notifier,
    PduHandle, PreemptionBudget, Processing, RxCollaborators, RxMainFunction, RxPdu, RxPduRouter,
};
use comgw_queue::{BoundedRingQueue, NotifyCache, QueueError};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, trace};

use crate::report::{RxCycleReport, ScanStrategy};
use crate::sink::{drain, CachingSink};
use crate::slot::DeferredPduSlot;

/// Notification cache entries available to the immediate path
pub const IMMEDIATE_CACHE_CAPACITY: usize = 16;

/// Event queue of one main function
#[derive(Debug)]
struct EventQueue {
    queue: BoundedRingQueue,
    /// A put was rejected since the last drain
    lost: bool,
}

/// State shared between reception and the main functions
#[derive(Debug)]
struct RxState {
    /// Indexed by rx PDU; `Some` for deferred PDUs only
    slots: Vec<Option<DeferredPduSlot>>,
    /// Indexed by main function; `None` without a configured queue
    queues: Vec<Option<EventQueue>>,
}

/// Per-main-function working memory
#[derive(Debug)]
struct RxTaskContext {
    budget: PreemptionBudget,
    notify_backing: Vec<NotificationId>,
    /// Copy of the payload being processed
    scratch: Vec<u8>,
}

pub struct RxDispatcher {
    tables: Arc<ComTables>,
    collab: RxCollaborators,
    router: Option<Arc<dyn RxPduRouter>>,
    det: Det,
    state: Mutex<RxState>,
    tasks: Vec<Mutex<RxTaskContext>>,
}

impl RxDispatcher {
    pub fn new(tables: Arc<ComTables>, collab: RxCollaborators, det: Det) -> Self {
        let slots = tables
            .rx_pdus
            .iter()
            .map(|(_, pdu)| {
                (pdu.processing == Processing::Deferred).then(|| DeferredPduSlot::new(pdu.length))
            })
            .collect();

        let queues = tables
            .rx_main_functions
            .iter()
            .map(|(_, mf)| {
                mf.event_queue.map(|capacity| EventQueue {
                    queue: BoundedRingQueue::new(capacity, tables.rx_pdus.limit()),
                    lost: false,
                })
            })
            .collect();

        let tasks = tables
            .rx_main_functions
            .iter()
            .map(|(idx, mf)| {
                let scratch_len = tables
                    .deferred_pdus(idx)
                    .iter()
                    .map(|&pdu| tables.rx_pdus[pdu].length)
                    .max()
                    .unwrap_or(0);
                Mutex::new(RxTaskContext {
                    budget: PreemptionBudget::new(mf.budget),
                    notify_backing: vec![NotificationId::default(); mf.notify_cache],
                    scratch: Vec::with_capacity(scratch_len),
                })
            })
            .collect();

        Self {
            tables,
            collab,
            router: None,
            det,
            state: Mutex::new(RxState { slots, queues }),
            tasks,
        }
    }

    /// Hand every processed PDU to `router`
    pub fn with_router(mut self, router: Arc<dyn RxPduRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn tables(&self) -> &Arc<ComTables> {
        &self.tables
    }

    /// Drop every stored payload and queued handle
    pub fn init(&self) {
        let mut state = self.state.lock();
        for slot in state.slots.iter_mut().flatten() {
            slot.clear();
        }
        for eq in state.queues.iter_mut().flatten() {
            eq.queue.flush();
            eq.lost = false;
        }
        info!(
            rx_pdus = self.tables.rx_pdus.len(),
            main_functions = self.tables.rx_main_functions.len(),
            "Receive dispatcher initialised"
        );
    }

    /// Indication of a received PDU. Returns whether it was accepted.
    pub fn rx_indication(&self, handle: PduHandle, payload: &[u8]) -> bool {
        let Some(idx) = self.tables.rx_pdu(handle) else {
            self.det
                .development(ApiId::RxIndication, DetErrorCode::ParamPduId);
            return false;
        };

        if !self.collab.groups.is_pdu_active(handle) {
            trace!(pdu = %handle, "PDU group inactive, reception dropped");
            return false;
        }

        let pdu = &self.tables.rx_pdus[idx];
        let mut backing = [NotificationId::default(); IMMEDIATE_CACHE_CAPACITY];
        let mut cache = NotifyCache::new(
            &mut backing,
            self.tables.immediate_notify_cache.min(IMMEDIATE_CACHE_CAPACITY),
        );

        let mut state = self.state.lock();
        let accepted = {
            let mut sink = CachingSink::new(&mut cache, &mut state, &*self.collab.notifier);
            pdu.prefilter
                .accept(handle, payload, &*self.collab.callouts, &mut sink)
        };
        if !accepted {
            drop(state);
            drain(&mut cache, &*self.collab.notifier);
            debug!(pdu = %handle, "Reception rejected by callout");
            return false;
        }

        self.collab.deadlines.reset(handle);

        match pdu.processing {
            Processing::Immediate => {
                {
                    let mut sink =
                        CachingSink::new(&mut cache, &mut state, &*self.collab.notifier);
                    self.collab.signals.process_signals(handle, payload, &mut sink);
                    pdu.notification
                        .fire(handle, payload, &*self.collab.callouts, &mut sink);
                }
                drop(state);
                drain(&mut cache, &*self.collab.notifier);
                self.route(handle, payload);
            }
            Processing::Deferred => {
                Self::store_deferred(&mut state, idx, pdu, payload);
                drop(state);
                drain(&mut cache, &*self.collab.notifier);
            }
        }
        true
    }

    fn store_deferred(state: &mut RxState, idx: Idx<RxPdu>, pdu: &RxPdu, payload: &[u8]) {
        let handle = PduHandle::from(idx);
        let Some(slot) = state.slots[idx.as_usize()].as_mut() else {
            return;
        };
        if slot.store(payload) {
            // Already queued (or already lost); processed once with the newest payload
            trace!(pdu = %handle, "Deferred PDU overwritten before processing");
            return;
        }
        let Some(mf) = pdu.main_function else {
            return;
        };
        if let Some(eq) = state.queues[mf.as_usize()].as_mut() {
            if eq.queue.put(handle.0).is_err() {
                eq.lost = true;
                debug!(pdu = %handle, "Event queue full, PDU left for full scan");
            }
        }
    }

    /// Periodic receive task
    pub fn main_function_rx(&self, id: MainFunctionId) -> RxCycleReport {
        let Some(mf_idx) = self.tables.main_function(id) else {
            self.det
                .development(ApiId::MainFunctionRx, DetErrorCode::ParamMainFunction);
            return RxCycleReport::default();
        };
        let Some(mut task) = self.tasks[mf_idx.as_usize()].try_lock() else {
            self.det
                .development(ApiId::MainFunctionRx, DetErrorCode::Reentrant);
            return RxCycleReport::default();
        };

        let mf = &self.tables.rx_main_functions[mf_idx];
        let RxTaskContext {
            budget,
            notify_backing,
            scratch,
        } = &mut *task;
        budget.reset();
        let mut cache = NotifyCache::new(notify_backing, mf.notify_cache);
        let mut cycle = Cycle {
            budget,
            cache: &mut cache,
            scratch,
            processed: 0,
        };

        let mut state = self.state.lock();
        let strategy = if self.drain_event_queue(mf_idx, &mut state, &mut cycle) {
            ScanStrategy::EventQueue
        } else {
            self.full_scan(mf_idx, &mut state, &mut cycle);
            ScanStrategy::FullScan
        };
        drop(state);

        let processed = cycle.processed;
        let yields = cycle.budget.yields();
        drain(&mut cache, &*self.collab.notifier);

        trace!(main_function = %mf.name, ?strategy, processed, yields, "Receive cycle done");
        RxCycleReport {
            strategy,
            processed,
            yields,
        }
    }

    /// Try the event-queue path. Returns false when the main function has no
    /// queue or the queue lost entries; the queue is flushed in that case and
    /// the caller falls back to a full scan.
    fn drain_event_queue(
        &self,
        mf: Idx<RxMainFunction>,
        state: &mut MutexGuard<'_, RxState>,
        cycle: &mut Cycle<'_, '_>,
    ) -> bool {
        let Some(read_limit) = state.queues[mf.as_usize()]
            .as_ref()
            .map(|eq| eq.queue.read_limit())
        else {
            return false;
        };

        let mut reads = 0;
        loop {
            let next = match state.queues[mf.as_usize()].as_mut() {
                Some(eq) if eq.lost || eq.queue.is_full() => break,
                Some(eq) if reads >= read_limit => {
                    if eq.queue.is_empty() {
                        return true;
                    }
                    break;
                }
                Some(eq) => eq.queue.get(),
                None => return false,
            };
            reads += 1;
            match next {
                Ok(Some(raw)) => {
                    if let Some(pdu) = self.tables.rx_pdu(PduHandle(raw)) {
                        self.process_deferred(pdu, state, cycle);
                    }
                }
                Ok(None) => return true,
                Err(QueueError::HandleOutOfRange { handle, .. }) => {
                    debug!(handle, "Event queue returned invalid handle");
                    self.det
                        .development(ApiId::MainFunctionRx, DetErrorCode::QueueHandleOutOfRange);
                }
                Err(QueueError::Full) => {}
            }
            cycle.checkpoint(state, &*self.collab.notifier);
        }

        if let Some(eq) = state.queues[mf.as_usize()].as_mut() {
            eq.queue.flush();
            eq.lost = false;
        }
        debug!(main_function = %self.tables.rx_main_functions[mf].name, "Event queue overrun, falling back to full scan");
        false
    }

    fn full_scan(
        &self,
        mf: Idx<RxMainFunction>,
        state: &mut MutexGuard<'_, RxState>,
        cycle: &mut Cycle<'_, '_>,
    ) {
        for &pdu in self.tables.deferred_pdus(mf) {
            self.process_deferred(pdu, state, cycle);
            cycle.checkpoint(state, &*self.collab.notifier);
        }
    }

    /// Process one deferred PDU if it is stored and still active
    fn process_deferred(
        &self,
        idx: Idx<RxPdu>,
        state: &mut MutexGuard<'_, RxState>,
        cycle: &mut Cycle<'_, '_>,
    ) {
        let handle = PduHandle::from(idx);
        let Some(slot) = state.slots[idx.as_usize()].as_mut() else {
            return;
        };
        if !slot.take_into(cycle.scratch) {
            return;
        }
        if !self.collab.groups.is_pdu_active(handle) {
            trace!(pdu = %handle, "PDU group deactivated, stored payload discarded");
            return;
        }

        let pdu = &self.tables.rx_pdus[idx];
        let payload = cycle.scratch.as_slice();
        {
            let mut sink = CachingSink::new(cycle.cache, state, &*self.collab.notifier);
            self.collab.signals.process_signals(handle, payload, &mut sink);
            pdu.notification
                .fire(handle, payload, &*self.collab.callouts, &mut sink);
        }
        cycle.processed += 1;

        if let Some(router) = &self.router {
            MutexGuard::unlocked(state, || router.route(handle, payload));
        }
    }

    fn route(&self, handle: PduHandle, payload: &[u8]) {
        if let Some(router) = &self.router {
            router.route(handle, payload);
        }
    }
}

/// Borrowed task context for one main-function run
struct Cycle<'t, 'b> {
    budget: &'t mut PreemptionBudget,
    cache: &'t mut NotifyCache<'b, NotificationId>,
    scratch: &'t mut Vec<u8>,
    processed: usize,
}

impl Cycle<'_, '_> {
    fn checkpoint(&mut self, state: &mut MutexGuard<'_, RxState>, notifier: &dyn Notifier) {
        let cache = &mut *self.cache;
        self.budget.checkpoint(state, || {
            drain(cache, notifier);
        });
    }
}

impl std::fmt::Debug for RxDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RxDispatcher")
            .field("rx_pdus", &self.tables.rx_pdus.len())
            .field("main_functions", &self.tasks.len())
            .field("det", &self.det)
            .finish_non_exhaustive()
    }
}
