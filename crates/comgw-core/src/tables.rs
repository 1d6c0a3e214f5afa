//! Resolved build-time tables
//!
//! Produced by [`ComConfig::build`](crate::config::ComConfig::build) and
//! immutable afterwards. Cross references are typed indices, so the runtime
//! never handles an unchecked table position.

use comgw_conv::{BitRange, UpdateBit};
use serde::{Deserialize, Serialize};

use crate::index::{Idx, Table};
use crate::models::{Callback, MainFunctionId, PartitionId, PduHandle, TransferProperty, TxPduHandle};
use crate::routing::Route;

pub const DEFAULT_QUEUE_BYTES: usize = 256;
pub const DEFAULT_GATEWAY_BUDGET: u16 = 8;

/// Execution partition (OS application / core)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    /// Capacity of the inbound cross-partition queue
    pub queue_bytes: usize,
    /// Descriptions walked before the transmit-buffer lock is released
    pub gateway_budget: u16,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue_bytes: DEFAULT_QUEUE_BYTES,
            gateway_budget: DEFAULT_GATEWAY_BUDGET,
        }
    }
}

/// When a received PDU is processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processing {
    /// In the reception (interrupt) context
    #[default]
    Immediate,
    /// In the next run of the PDU's receive main function
    Deferred,
}

/// Periodic receive task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxMainFunction {
    pub name: String,
    /// Event-queue capacity; `None` always scans every assigned PDU
    pub event_queue: Option<usize>,
    /// PDUs processed before the lock is released
    pub budget: u16,
    /// Notifications cached before they are fired
    pub notify_cache: usize,
    /// Scheduling period used by hosts
    pub period_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxPdu {
    pub name: String,
    /// Deferred slot size; longer payloads are truncated
    pub length: usize,
    pub processing: Processing,
    pub main_function: Option<Idx<RxMainFunction>>,
    pub partition: Idx<Partition>,
    /// Reception pre-filter
    pub prefilter: Callback,
    /// Fired after the PDU was processed
    pub notification: Callback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPdu {
    pub name: String,
    pub length: usize,
    pub partition: Idx<Partition>,
    /// Transmit buffer content after init
    pub init_value: Vec<u8>,
}

/// Bit-range copy from a received PDU into a transmit buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayDescription {
    pub source: BitRange,
    pub destination: BitRange,
    pub transfer: TransferProperty,
    /// Update bit in the source PDU
    pub update_bit: Option<UpdateBit>,
    /// Update bit set in the destination PDU on every copy
    pub destination_update_bit: Option<UpdateBit>,
}

/// All descriptions from one source PDU into one destination PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayGroup {
    pub source: Idx<RxPdu>,
    pub destination: Idx<TxPdu>,
    pub route: Route,
    pub descriptions: Vec<GatewayDescription>,
}

/// The complete resolved configuration
#[derive(Debug, Clone)]
pub struct ComTables {
    pub runtime_checks: bool,
    /// Cache size of the immediate receive path
    pub immediate_notify_cache: usize,
    pub partitions: Table<Partition>,
    pub rx_main_functions: Table<RxMainFunction>,
    pub rx_pdus: Table<RxPdu>,
    pub tx_pdus: Table<TxPdu>,
    pub gateway_groups: Table<GatewayGroup>,
    pub(crate) deferred_by_main_function: Vec<Vec<Idx<RxPdu>>>,
    pub(crate) groups_by_source: Vec<Vec<Idx<GatewayGroup>>>,
}

impl ComTables {
    pub fn rx_pdu(&self, handle: PduHandle) -> Option<Idx<RxPdu>> {
        self.rx_pdus.index(handle.0)
    }

    pub fn tx_pdu(&self, handle: TxPduHandle) -> Option<Idx<TxPdu>> {
        self.tx_pdus.index(handle.0)
    }

    pub fn main_function(&self, id: MainFunctionId) -> Option<Idx<RxMainFunction>> {
        self.rx_main_functions.index(id.0)
    }

    pub fn partition(&self, id: PartitionId) -> Option<Idx<Partition>> {
        self.partitions.index(id.0)
    }

    /// Deferred PDUs served by a main function, in table order
    pub fn deferred_pdus(&self, main_function: Idx<RxMainFunction>) -> &[Idx<RxPdu>] {
        &self.deferred_by_main_function[main_function.as_usize()]
    }

    /// Description groups fed by a received PDU
    pub fn groups_for(&self, pdu: Idx<RxPdu>) -> &[Idx<GatewayGroup>] {
        &self.groups_by_source[pdu.as_usize()]
    }

    pub fn rx_pdu_by_name(&self, name: &str) -> Option<PduHandle> {
        self.rx_pdus.position(|p| p.name == name).map(PduHandle::from)
    }

    pub fn tx_pdu_by_name(&self, name: &str) -> Option<TxPduHandle> {
        self.tx_pdus.position(|p| p.name == name).map(TxPduHandle::from)
    }

    pub fn main_function_by_name(&self, name: &str) -> Option<MainFunctionId> {
        self.rx_main_functions
            .position(|m| m.name == name)
            .map(MainFunctionId::from)
    }

    pub fn partition_by_name(&self, name: &str) -> Option<PartitionId> {
        self.partitions
            .position(|p| p.name == name)
            .map(PartitionId::from)
    }
}

impl From<Idx<RxPdu>> for PduHandle {
    fn from(idx: Idx<RxPdu>) -> Self {
        PduHandle(idx.raw())
    }
}

impl From<Idx<TxPdu>> for TxPduHandle {
    fn from(idx: Idx<TxPdu>) -> Self {
        TxPduHandle(idx.raw())
    }
}

impl From<Idx<RxMainFunction>> for MainFunctionId {
    fn from(idx: Idx<RxMainFunction>) -> Self {
        MainFunctionId(idx.raw())
    }
}

impl From<Idx<Partition>> for PartitionId {
    fn from(idx: Idx<Partition>) -> Self {
        PartitionId(idx.raw())
    }
}
