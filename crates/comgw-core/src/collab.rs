//! Collaborator traits - the narrow interfaces this core consumes
//!
//! Signal decoding, I-PDU group bookkeeping, deadline monitoring and the
//! transmit path live outside the core. They are reached through these traits
//! and may be called while the caller's critical section is held, so
//! implementations must not block.

use std::sync::Arc;

use crate::models::{CalloutId, NotificationId, PduHandle, Repetition, TxPduHandle};

/// Receives notifications produced while processing a PDU
pub trait NotificationSink {
    fn push(&mut self, id: NotificationId);
}

impl NotificationSink for Vec<NotificationId> {
    fn push(&mut self, id: NotificationId) {
        Vec::push(self, id);
    }
}

/// Decodes and stores the signals and signal groups of a received PDU
pub trait SignalProcessor: Send + Sync {
    /// Process `payload` of `pdu`, pushing every notification that must fire
    fn process_signals(&self, pdu: PduHandle, payload: &[u8], sink: &mut dyn NotificationSink);
}

/// I-PDU group activation state
pub trait PduGroupState: Send + Sync {
    fn is_pdu_active(&self, pdu: PduHandle) -> bool;
}

/// Reception deadline monitoring
pub trait DeadlineMonitor: Send + Sync {
    /// Restart the reception timeout of `pdu`
    fn reset(&self, pdu: PduHandle);
}

/// Fires user notifications. Never called with a lock held.
pub trait Notifier: Send + Sync {
    fn notify(&self, id: NotificationId);
}

/// User callouts
pub trait Callouts: Send + Sync {
    /// Returns false to reject the PDU
    fn invoke(&self, id: CalloutId, pdu: PduHandle, payload: &[u8]) -> bool;
}

/// Transmit path for gateway-triggered PDUs
pub trait Transmitter: Send + Sync {
    fn trigger_transmit(&self, pdu: TxPduHandle, payload: &[u8], repetition: Repetition);
}

/// Consumer of processed PDUs (the gateway)
pub trait RxPduRouter: Send + Sync {
    fn route(&self, pdu: PduHandle, payload: &[u8]);
}

/// Everything the receive dispatcher calls out to
#[derive(Clone)]
pub struct RxCollaborators {
    pub signals: Arc<dyn SignalProcessor>,
    pub groups: Arc<dyn PduGroupState>,
    pub deadlines: Arc<dyn DeadlineMonitor>,
    pub notifier: Arc<dyn Notifier>,
    pub callouts: Arc<dyn Callouts>,
}

/// Signal processor that decodes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl SignalProcessor for NoSignals {
    fn process_signals(&self, _pdu: PduHandle, _payload: &[u8], _sink: &mut dyn NotificationSink) {}
}

/// Group state with every PDU active
#[derive(Debug, Default, Clone, Copy)]
pub struct AllActive;

impl PduGroupState for AllActive {
    fn is_pdu_active(&self, _pdu: PduHandle) -> bool {
        true
    }
}

/// Deadline monitor that monitors nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeadlines;

impl DeadlineMonitor for NoDeadlines {
    fn reset(&self, _pdu: PduHandle) {}
}

/// Callouts that accept everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Callouts for AcceptAll {
    fn invoke(&self, _id: CalloutId, _pdu: PduHandle, _payload: &[u8]) -> bool {
        true
    }
}

impl RxCollaborators {
    /// Collaborators with no signal layer attached, firing into `notifier`
    pub fn standalone(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            signals: Arc::new(NoSignals),
            groups: Arc::new(AllActive),
            deadlines: Arc::new(NoDeadlines),
            notifier,
            callouts: Arc::new(AcceptAll),
        }
    }
}
