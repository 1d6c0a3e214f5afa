//! comgw-gateway - Signal gateway of the COM stack
//!
//! Copies configured bit ranges of received PDUs into transmit buffers and
//! decides per destination PDU whether a transmission is triggered.
//!
//! Groups whose source and destination share a partition are evaluated
//! directly in the receiving context. Others travel through the destination
//! partition's cross-partition queue and are evaluated by its
//! [`GatewayEngine::main_function_gateway`].

pub mod engine;
pub mod transfer;

pub use engine::{GatewayCycleReport, GatewayEngine};
pub use transfer::{evaluate, TriggerAccumulator, TriggerSignal};
