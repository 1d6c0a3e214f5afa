//! Gateway transfer properties

use serde::{Deserialize, Serialize};

/// Trigger policy of a gateway description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferProperty {
    /// Updates the buffer, never triggers on its own
    #[default]
    Pending,
    Triggered,
    TriggeredWithoutRepetition,
    TriggeredOnChange,
    TriggeredOnChangeWithoutRepetition,
}

impl TransferProperty {
    /// Only triggers when the copied content changed
    pub fn is_on_change(&self) -> bool {
        matches!(
            self,
            TransferProperty::TriggeredOnChange
                | TransferProperty::TriggeredOnChangeWithoutRepetition
        )
    }

    pub fn is_without_repetition(&self) -> bool {
        matches!(
            self,
            TransferProperty::TriggeredWithoutRepetition
                | TransferProperty::TriggeredOnChangeWithoutRepetition
        )
    }
}

/// Whether a triggered transmission may be repeated by the transmit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    WithRepetition,
    WithoutRepetition,
}
