//! Raw handles exchanged with neighbouring layers
//!
//! A handle is the position of an entry in its configuration table. Handles
//! come from outside the core and are validated into typed
//! [`Idx`](crate::index::Idx) values at the API boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! raw_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u16);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u16> for $name {
            fn from(raw: u16) -> Self {
                Self(raw)
            }
        }
    };
}

raw_handle!(
    /// Received PDU, as passed to `rx_indication`
    PduHandle,
    "rx"
);
raw_handle!(
    /// Outbound PDU whose transmit buffer the gateway writes
    TxPduHandle,
    "tx"
);
raw_handle!(
    /// Receive main function (one per configured task)
    MainFunctionId,
    "mf"
);
raw_handle!(
    /// Execution partition
    PartitionId,
    "partition"
);
raw_handle!(
    /// User notification fired after processing
    NotificationId,
    "notification"
);
raw_handle!(
    /// User callout consulted during reception
    CalloutId,
    "callout"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(PduHandle(3).to_string(), "rx#3");
        assert_eq!(TxPduHandle(12).to_string(), "tx#12");
        assert_eq!(NotificationId::from(7).to_string(), "notification#7");
    }
}
