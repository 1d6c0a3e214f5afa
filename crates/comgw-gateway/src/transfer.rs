//! Transfer-property evaluation
//!
//! Every description of a group reports a [`TriggerSignal`] after its copy.
//! The group transmits when any description triggered, and suppresses
//! repetition only when every triggering description asked for that.

use comgw_core::{Repetition, TransferProperty};

/// Per-description trigger result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSignal {
    NotFulfilled,
    Trigger,
    TriggerWithoutRepetition,
}

/// Evaluate one description after its copy
pub fn evaluate(kind: TransferProperty, content_changed: bool) -> TriggerSignal {
    let condition = !kind.is_on_change() || content_changed;
    if !condition {
        return TriggerSignal::NotFulfilled;
    }
    if kind.is_without_repetition() {
        TriggerSignal::TriggerWithoutRepetition
    } else if kind != TransferProperty::Pending {
        TriggerSignal::Trigger
    } else {
        TriggerSignal::NotFulfilled
    }
}

/// Aggregate of the signals of one group walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerAccumulator {
    triggered: bool,
    with_repetition: bool,
}

impl TriggerAccumulator {
    pub fn record(&mut self, signal: TriggerSignal) {
        match signal {
            TriggerSignal::NotFulfilled => {}
            TriggerSignal::Trigger => {
                self.triggered = true;
                self.with_repetition = true;
            }
            TriggerSignal::TriggerWithoutRepetition => self.triggered = true,
        }
    }

    /// Transmission to request, if any
    pub fn decision(&self) -> Option<Repetition> {
        match (self.triggered, self.with_repetition) {
            (false, _) => None,
            (true, true) => Some(Repetition::WithRepetition),
            (true, false) => Some(Repetition::WithoutRepetition),
        }
    }
}
