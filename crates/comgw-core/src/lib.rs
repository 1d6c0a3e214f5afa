//! comgw-core - Tables, handles and shared runtime pieces of the COM gateway
//!
//! This crate holds what the receive dispatcher and the gateway engine share:
//! the resolved configuration tables, the collaborator traits through which
//! neighbouring layers are reached, error reporting and the preemption budget.

pub mod budget;
pub mod collab;
pub mod config;
pub mod det;
pub mod error;
pub mod index;
pub mod models;
pub mod routing;
pub mod tables;
pub mod testing;

pub use budget::PreemptionBudget;
pub use collab::{
    Callouts, DeadlineMonitor, NotificationSink, Notifier, PduGroupState, RxCollaborators,
    RxPduRouter, SignalProcessor, Transmitter,
};
pub use config::ComConfig;
pub use det::{ApiId, Det, DetErrorCode, DetReporter, TracingDet};
pub use error::{ComError, ComResult};
pub use index::{Idx, Table};
pub use models::*;
pub use routing::Route;
pub use tables::{
    ComTables, GatewayDescription, GatewayGroup, Partition, Processing, RxMainFunction, RxPdu,
    TxPdu,
};

pub use comgw_conv::{BitRange, ByteOrder, UpdateBit};
