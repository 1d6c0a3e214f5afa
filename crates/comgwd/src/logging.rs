//! Collaborators that log instead of driving a network

use std::sync::atomic::{AtomicU64, Ordering};

use comgw_core::{NotificationId, Notifier, Repetition, Transmitter, TxPduHandle};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct LoggingNotifier {
    fired: AtomicU64,
}

impl LoggingNotifier {
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

impl Notifier for LoggingNotifier {
    fn notify(&self, id: NotificationId) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        debug!(notification = %id, "Notification");
    }
}

#[derive(Debug, Default)]
pub struct LoggingTransmitter {
    sent: AtomicU64,
}

impl LoggingTransmitter {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Transmitter for LoggingTransmitter {
    fn trigger_transmit(&self, pdu: TxPduHandle, payload: &[u8], repetition: Repetition) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        info!(%pdu, payload = %hex::encode(payload), ?repetition, "Transmit");
    }
}
