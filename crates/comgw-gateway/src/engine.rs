//! Gateway engine - copies routed signals into transmit buffers
//!
//! The engine owns one transmit buffer per outbound PDU and one inbound
//! [`CrossPartitionQueue`] per partition. A processed PDU arrives through
//! [`RxPduRouter::route`]; each of its description groups is either evaluated
//! directly or framed into the destination partition's queue, depending on
//! the route chosen at build time. Queued frames are evaluated by
//! [`GatewayEngine::main_function_gateway`] running in that partition.

use std::sync::Arc;

use comgw_conv::copy_bits;
use comgw_core::{
    ApiId, ComTables, Det, DetErrorCode, GatewayGroup, Idx, PartitionId, PduHandle,
    PreemptionBudget, Repetition, Route, RxPduRouter, Transmitter, TxPduHandle,
};
use comgw_queue::CrossPartitionQueue;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::transfer::{evaluate, TriggerAccumulator};

/// Outcome of one `main_function_gateway` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCycleReport {
    /// Frames evaluated
    pub frames: usize,
    /// Bytes consumed from the queue
    pub bytes: usize,
    /// Transmit-buffer lock releases forced by the partition's budget
    pub yields: u32,
    /// Stopped because more than the queue capacity was read
    pub aborted: bool,
}

/// Per-partition working memory
#[derive(Debug, Default)]
struct GatewayTaskContext {
    frame: Vec<u8>,
}

pub struct GatewayEngine {
    tables: Arc<ComTables>,
    transmitter: Arc<dyn Transmitter>,
    det: Det,
    /// Indexed by tx PDU
    tx_buffers: Vec<Mutex<Box<[u8]>>>,
    /// Indexed by partition
    inboxes: Vec<Mutex<CrossPartitionQueue>>,
    tasks: Vec<Mutex<GatewayTaskContext>>,
}

impl GatewayEngine {
    pub fn new(tables: Arc<ComTables>, transmitter: Arc<dyn Transmitter>, det: Det) -> Self {
        let tx_buffers = tables
            .tx_pdus
            .iter()
            .map(|(_, pdu)| Mutex::new(pdu.init_value.clone().into_boxed_slice()))
            .collect();
        let inboxes = tables
            .partitions
            .iter()
            .map(|(_, p)| Mutex::new(CrossPartitionQueue::new(p.queue_bytes)))
            .collect();
        let tasks = tables
            .partitions
            .iter()
            .map(|_| Mutex::new(GatewayTaskContext::default()))
            .collect();

        Self {
            tables,
            transmitter,
            det,
            tx_buffers,
            inboxes,
            tasks,
        }
    }

    /// Restore transmit buffers to their init values and drop queued frames
    pub fn init(&self) {
        for (idx, pdu) in self.tables.tx_pdus.iter() {
            self.tx_buffers[idx.as_usize()]
                .lock()
                .copy_from_slice(&pdu.init_value);
        }
        for inbox in &self.inboxes {
            inbox.lock().flush();
        }
        info!(
            groups = self.tables.gateway_groups.len(),
            tx_pdus = self.tables.tx_pdus.len(),
            "Gateway initialised"
        );
    }

    /// Copy of a transmit buffer
    pub fn tx_buffer(&self, handle: TxPduHandle) -> Option<Vec<u8>> {
        let idx = self.tables.tx_pdu(handle)?;
        Some(self.tx_buffers[idx.as_usize()].lock().to_vec())
    }

    /// Bytes waiting in a partition's inbound queue
    pub fn queued_bytes(&self, partition: PartitionId) -> Option<usize> {
        let idx = self.tables.partition(partition)?;
        Some(self.inboxes[idx.as_usize()].lock().used())
    }

    /// Route a processed PDU into every group it feeds.
    ///
    /// Bytes beyond the configured PDU length are ignored.
    pub fn route_rx_pdu(&self, pdu: PduHandle, payload: &[u8]) {
        let Some(source) = self.tables.rx_pdu(pdu) else {
            self.det
                .development(ApiId::GatewayRoute, DetErrorCode::ParamPduId);
            return;
        };
        let payload = &payload[..payload.len().min(self.tables.rx_pdus[source].length)];

        for &group_idx in self.tables.groups_for(source) {
            match self.tables.gateway_groups[group_idx].route {
                Route::Local => {
                    self.evaluate_group(group_idx, payload, ApiId::GatewayRoute);
                }
                Route::CrossPartition { partition } => {
                    let mut inbox = self.inboxes[partition.as_usize()].lock();
                    if let Err(e) = inbox.write_frame(group_idx.raw(), payload) {
                        drop(inbox);
                        warn!(
                            %pdu,
                            group = group_idx.raw(),
                            partition = %self.tables.partitions[partition].name,
                            error = %e,
                            "Cross-partition frame dropped"
                        );
                        self.det
                            .runtime(ApiId::GatewayRoute, DetErrorCode::CrossPartitionOverflow);
                    }
                }
            }
        }
    }

    /// Walk one description group against a received payload.
    ///
    /// Every description whose source range lies inside the payload and whose
    /// update bit (if any) is set is copied, whatever the trigger outcome.
    /// Returns the transmission requested, if any.
    pub fn evaluate_group(
        &self,
        idx: Idx<GatewayGroup>,
        payload: &[u8],
        api: ApiId,
    ) -> Option<Repetition> {
        self.walk_group(idx, payload, api).0
    }

    /// [`evaluate_group`](Self::evaluate_group), also returning the lock
    /// releases taken during the walk
    fn walk_group(
        &self,
        idx: Idx<GatewayGroup>,
        payload: &[u8],
        api: ApiId,
    ) -> (Option<Repetition>, u32) {
        let group = &self.tables.gateway_groups[idx];
        let tx = &self.tables.tx_pdus[group.destination];
        let mut budget = PreemptionBudget::new(self.tables.partitions[tx.partition].gateway_budget);
        let mut acc = TriggerAccumulator::default();

        let mut buffer = self.tx_buffers[group.destination.as_usize()].lock();
        for desc in &group.descriptions {
            let updated = desc
                .update_bit
                .map_or(true, |bit| bit.is_updated(payload));
            if desc.source.is_contained_in(payload.len()) && updated {
                match copy_bits(payload, desc.source, &mut buffer, desc.destination) {
                    Ok(changed) => {
                        if let Some(bit) = desc.destination_update_bit {
                            bit.set(&mut buffer);
                        }
                        acc.record(evaluate(desc.transfer, changed));
                    }
                    Err(e) => {
                        debug!(group = idx.raw(), error = %e, "Gateway copy failed");
                        self.det.runtime(api, DetErrorCode::CopyFailed);
                    }
                }
            }
            budget.checkpoint(&mut buffer, || {});
        }

        let decision = acc.decision();
        if let Some(repetition) = decision {
            let handle = TxPduHandle::from(group.destination);
            trace!(pdu = %handle, ?repetition, "Gateway transmission triggered");
            self.transmitter
                .trigger_transmit(handle, &buffer, repetition);
        }
        (decision, budget.yields())
    }

    /// Periodic gateway task of one partition: evaluate queued frames
    pub fn main_function_gateway(&self, partition: PartitionId) -> GatewayCycleReport {
        let mut report = GatewayCycleReport::default();
        let Some(idx) = self.tables.partition(partition) else {
            self.det
                .development(ApiId::MainFunctionGateway, DetErrorCode::ParamPartition);
            return report;
        };
        let Some(mut task) = self.tasks[idx.as_usize()].try_lock() else {
            self.det
                .development(ApiId::MainFunctionGateway, DetErrorCode::Reentrant);
            return report;
        };

        let inbox = &self.inboxes[idx.as_usize()];
        let capacity = inbox.lock().capacity();
        loop {
            let frame = inbox.lock().read_frame(&mut task.frame);
            let info = match frame {
                Ok(Some(info)) => info,
                Ok(None) => break,
                Err(e) => {
                    inbox.lock().flush();
                    warn!(%partition, error = %e, "Corrupt cross-partition frame, queue flushed");
                    self.det
                        .runtime(ApiId::MainFunctionGateway, DetErrorCode::CorruptFrame);
                    break;
                }
            };
            report.frames += 1;
            report.bytes += info.encoded_len();

            let target = Route::CrossPartition { partition: idx };
            match self.tables.gateway_groups.index(info.group) {
                Some(group) if self.tables.gateway_groups[group].route == target => {
                    let (_, yields) =
                        self.walk_group(group, &task.frame, ApiId::MainFunctionGateway);
                    report.yields += yields;
                }
                _ => {
                    debug!(%partition, group = info.group, "Frame for a group not routed here");
                    self.det
                        .development(ApiId::MainFunctionGateway, DetErrorCode::ParamGroup);
                }
            }

            if report.bytes > capacity {
                report.aborted = true;
                warn!(%partition, bytes = report.bytes, capacity, "Gateway cycle aborted, producer outran queue");
                break;
            }
        }

        if report.frames > 0 {
            trace!(%partition, frames = report.frames, bytes = report.bytes, "Gateway cycle done");
        }
        report
    }

    /// Raw frame injection into a partition's queue (diagnostics and tests)
    pub fn enqueue_frame(&self, partition: PartitionId, group: u16, payload: &[u8]) -> bool {
        match self.tables.partition(partition) {
            Some(idx) => self.inboxes[idx.as_usize()]
                .lock()
                .write_frame(group, payload)
                .is_ok(),
            None => false,
        }
    }
}

impl RxPduRouter for GatewayEngine {
    fn route(&self, pdu: PduHandle, payload: &[u8]) {
        self.route_rx_pdu(pdu, payload);
    }
}

impl std::fmt::Debug for GatewayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayEngine")
            .field("groups", &self.tables.gateway_groups.len())
            .field("partitions", &self.inboxes.len())
            .field("det", &self.det)
            .finish_non_exhaustive()
    }
}
