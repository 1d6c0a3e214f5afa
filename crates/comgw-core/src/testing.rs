//! Recording collaborators for tests and simulations
//!
//! Every collaborator trait has an implementation here that records what it
//! was asked to do. They are cheap to clone behind an `Arc` and are shared by
//! the unit tests of this workspace and the daemon's dry-run mode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::collab::{
    Callouts, DeadlineMonitor, NotificationSink, Notifier, PduGroupState, RxCollaborators,
    RxPduRouter, SignalProcessor, Transmitter,
};
use crate::det::{ApiId, Det, DetErrorCode, DetReporter};
use crate::models::{CalloutId, NotificationId, PduHandle, Repetition, TxPduHandle};

/// One recorded Det report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetReport {
    pub api: ApiId,
    pub code: DetErrorCode,
    /// Reported as a runtime error
    pub runtime: bool,
}

#[derive(Debug, Default)]
pub struct RecordingDet {
    reports: Mutex<Vec<DetReport>>,
}

impl RecordingDet {
    pub fn reports(&self) -> Vec<DetReport> {
        self.reports.lock().clone()
    }

    pub fn count(&self, code: DetErrorCode) -> usize {
        self.reports.lock().iter().filter(|r| r.code == code).count()
    }
}

impl DetReporter for RecordingDet {
    fn report_error(&self, api: ApiId, code: DetErrorCode) {
        self.reports.lock().push(DetReport {
            api,
            code,
            runtime: false,
        });
    }

    fn report_runtime_error(&self, api: ApiId, code: DetErrorCode) {
        self.reports.lock().push(DetReport {
            api,
            code,
            runtime: true,
        });
    }
}

type Hook = Box<dyn Fn(NotificationId) + Send + Sync>;

/// Notifier recording fired ids in order
#[derive(Default)]
pub struct RecordingNotifier {
    fired: Mutex<Vec<NotificationId>>,
    hook: Option<Hook>,
}

impl RecordingNotifier {
    /// Run `hook` on every notification, before it is recorded.
    ///
    /// Lets a test observe state (for example, try a lock) from inside the
    /// notification context.
    pub fn with_hook(hook: impl Fn(NotificationId) + Send + Sync + 'static) -> Self {
        Self {
            fired: Mutex::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn fired(&self) -> Vec<NotificationId> {
        self.fired.lock().clone()
    }

    pub fn clear(&self) {
        self.fired.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, id: NotificationId) {
        if let Some(hook) = &self.hook {
            hook(id);
        }
        self.fired.lock().push(id);
    }
}

/// Signal processor emitting configured notifications per PDU
#[derive(Debug, Default)]
pub struct ScriptedSignalProcessor {
    notifications: Mutex<HashMap<PduHandle, Vec<NotificationId>>>,
    processed: Mutex<Vec<(PduHandle, Vec<u8>)>>,
}

impl ScriptedSignalProcessor {
    /// Emit `ids` whenever `pdu` is processed
    pub fn with_notifications(self, pdu: PduHandle, ids: impl IntoIterator<Item = u16>) -> Self {
        self.notifications
            .lock()
            .insert(pdu, ids.into_iter().map(NotificationId).collect());
        self
    }

    /// Processed PDUs with the payload they were processed with
    pub fn processed(&self) -> Vec<(PduHandle, Vec<u8>)> {
        self.processed.lock().clone()
    }
}

impl SignalProcessor for ScriptedSignalProcessor {
    fn process_signals(&self, pdu: PduHandle, payload: &[u8], sink: &mut dyn NotificationSink) {
        self.processed.lock().push((pdu, payload.to_vec()));
        let ids = self.notifications.lock().get(&pdu).cloned().unwrap_or_default();
        for id in ids {
            sink.push(id);
        }
    }
}

/// Group state with individually deactivated PDUs
#[derive(Debug, Default)]
pub struct StaticPduGroups {
    inactive: Mutex<HashSet<PduHandle>>,
}

impl StaticPduGroups {
    pub fn set_active(&self, pdu: PduHandle, active: bool) {
        let mut inactive = self.inactive.lock();
        if active {
            inactive.remove(&pdu);
        } else {
            inactive.insert(pdu);
        }
    }
}

impl PduGroupState for StaticPduGroups {
    fn is_pdu_active(&self, pdu: PduHandle) -> bool {
        !self.inactive.lock().contains(&pdu)
    }
}

#[derive(Debug, Default)]
pub struct RecordingDeadlines {
    resets: Mutex<Vec<PduHandle>>,
}

impl RecordingDeadlines {
    pub fn resets(&self) -> Vec<PduHandle> {
        self.resets.lock().clone()
    }
}

impl DeadlineMonitor for RecordingDeadlines {
    fn reset(&self, pdu: PduHandle) {
        self.resets.lock().push(pdu);
    }
}

/// Callouts accepting unless told otherwise
#[derive(Debug, Default)]
pub struct StaticCallouts {
    results: Mutex<HashMap<CalloutId, bool>>,
    calls: Mutex<Vec<(CalloutId, PduHandle)>>,
}

impl StaticCallouts {
    pub fn set_result(&self, id: CalloutId, accept: bool) {
        self.results.lock().insert(id, accept);
    }

    pub fn calls(&self) -> Vec<(CalloutId, PduHandle)> {
        self.calls.lock().clone()
    }
}

impl Callouts for StaticCallouts {
    fn invoke(&self, id: CalloutId, pdu: PduHandle, _payload: &[u8]) -> bool {
        self.calls.lock().push((id, pdu));
        self.results.lock().get(&id).copied().unwrap_or(true)
    }
}

/// One gateway-triggered transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub pdu: TxPduHandle,
    pub payload: Vec<u8>,
    pub repetition: Repetition,
}

#[derive(Debug, Default)]
pub struct RecordingTransmitter {
    sent: Mutex<Vec<Transmission>>,
}

impl RecordingTransmitter {
    pub fn sent(&self) -> Vec<Transmission> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Transmitter for RecordingTransmitter {
    fn trigger_transmit(&self, pdu: TxPduHandle, payload: &[u8], repetition: Repetition) {
        self.sent.lock().push(Transmission {
            pdu,
            payload: payload.to_vec(),
            repetition,
        });
    }
}

#[derive(Debug, Default)]
pub struct RecordingRouter {
    routed: Mutex<Vec<(PduHandle, Vec<u8>)>>,
}

impl RecordingRouter {
    pub fn routed(&self) -> Vec<(PduHandle, Vec<u8>)> {
        self.routed.lock().clone()
    }
}

impl RxPduRouter for RecordingRouter {
    fn route(&self, pdu: PduHandle, payload: &[u8]) {
        self.routed.lock().push((pdu, payload.to_vec()));
    }
}

/// All recording collaborators in one place
#[derive(Clone)]
pub struct TestBench {
    pub det: Arc<RecordingDet>,
    pub notifier: Arc<RecordingNotifier>,
    pub signals: Arc<ScriptedSignalProcessor>,
    pub groups: Arc<StaticPduGroups>,
    pub deadlines: Arc<RecordingDeadlines>,
    pub callouts: Arc<StaticCallouts>,
    pub transmitter: Arc<RecordingTransmitter>,
    pub router: Arc<RecordingRouter>,
}

impl Default for TestBench {
    fn default() -> Self {
        Self::with_signals(ScriptedSignalProcessor::default())
    }
}

impl TestBench {
    pub fn with_signals(signals: ScriptedSignalProcessor) -> Self {
        Self {
            det: Arc::default(),
            notifier: Arc::default(),
            signals: Arc::new(signals),
            groups: Arc::default(),
            deadlines: Arc::default(),
            callouts: Arc::default(),
            transmitter: Arc::default(),
            router: Arc::default(),
        }
    }

    /// Replace the notifier, keeping the other collaborators
    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn rx_collaborators(&self) -> RxCollaborators {
        RxCollaborators {
            signals: self.signals.clone(),
            groups: self.groups.clone(),
            deadlines: self.deadlines.clone(),
            notifier: self.notifier.clone(),
            callouts: self.callouts.clone(),
        }
    }

    pub fn det(&self, runtime_checks: bool) -> Det {
        Det::new(self.det.clone(), runtime_checks)
    }
}
