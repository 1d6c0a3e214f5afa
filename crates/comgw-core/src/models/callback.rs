//! Configured user callbacks
//!
//! The set of callback kinds is fixed by configuration, so callbacks are a
//! closed enum dispatched by `match` instead of a table of function pointers.

use crate::collab::{Callouts, NotificationSink};

use super::handle::{CalloutId, NotificationId, PduHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Callback {
    #[default]
    NoOp,
    /// Fire a user notification (deferred through the notification cache)
    Notification(NotificationId),
    /// Ask a user callout; its verdict decides acceptance where one is needed
    Callout(CalloutId),
}

impl Callback {
    /// Evaluate as a reception pre-filter. Returns whether the PDU is accepted.
    ///
    /// Notifications never reject; they are queued on `sink`.
    pub fn accept(
        &self,
        pdu: PduHandle,
        payload: &[u8],
        callouts: &dyn Callouts,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        match *self {
            Callback::NoOp => true,
            Callback::Notification(id) => {
                sink.push(id);
                true
            }
            Callback::Callout(id) => callouts.invoke(id, pdu, payload),
        }
    }

    /// Run after a PDU was processed. Callout verdicts are ignored here.
    pub fn fire(
        &self,
        pdu: PduHandle,
        payload: &[u8],
        callouts: &dyn Callouts,
        sink: &mut dyn NotificationSink,
    ) {
        match *self {
            Callback::NoOp => {}
            Callback::Notification(id) => sink.push(id),
            Callback::Callout(id) => {
                callouts.invoke(id, pdu, payload);
            }
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Callback::NoOp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticCallouts;

    #[test]
    fn test_accept() {
        let callouts = StaticCallouts::default();
        callouts.set_result(CalloutId(2), false);
        let mut fired: Vec<NotificationId> = Vec::new();

        assert!(Callback::NoOp.accept(PduHandle(0), &[], &callouts, &mut fired));
        assert!(Callback::Callout(CalloutId(1)).accept(PduHandle(0), &[], &callouts, &mut fired));
        assert!(!Callback::Callout(CalloutId(2)).accept(PduHandle(0), &[], &callouts, &mut fired));
        assert!(Callback::Notification(NotificationId(9)).accept(
            PduHandle(0),
            &[],
            &callouts,
            &mut fired
        ));
        assert_eq!(fired, vec![NotificationId(9)]);
        assert_eq!(callouts.calls().len(), 2);
    }

    #[test]
    fn test_fire_ignores_callout_verdict() {
        let callouts = StaticCallouts::default();
        callouts.set_result(CalloutId(4), false);
        let mut fired: Vec<NotificationId> = Vec::new();
        Callback::Callout(CalloutId(4)).fire(PduHandle(1), &[1], &callouts, &mut fired);
        Callback::Notification(NotificationId(3)).fire(PduHandle(1), &[1], &callouts, &mut fired);
        assert_eq!(fired, vec![NotificationId(3)]);
        assert_eq!(callouts.calls(), vec![(CalloutId(4), PduHandle(1))]);
    }
}
