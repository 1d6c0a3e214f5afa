//! Configuration file model
//!
//! Describes the build-time tables in TOML. Entries reference each other by
//! name; [`ComConfig::build`] validates the model and resolves it into
//! [`ComTables`]. A PDU's handle is its position in its table.
//!
//! ```toml
//! runtime_checks = true
//!
//! [[partitions]]
//! name = "body"
//!
//! [[rx_main_functions]]
//! name = "rx_10ms"
//! event_queue = 8
//!
//! [[rx_pdus]]
//! name = "EngineStatus"
//! length = 8
//! processing = "deferred"
//! main_function = "rx_10ms"
//!
//! [[tx_pdus]]
//! name = "GwEngineStatus"
//! length = 8
//!
//! [[gateway_groups]]
//! source = "EngineStatus"
//! destination = "GwEngineStatus"
//!
//! [[gateway_groups.descriptions]]
//! source = { start_bit = 0, length = 16 }
//! destination_start_bit = 16
//! transfer_property = "triggered_on_change"
//! ```

use std::collections::HashSet;
use std::path::Path;

use comgw_conv::{BitRange, ByteOrder, UpdateBit};
use comgw_queue::FRAME_OVERHEAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ComError, ComResult};
use crate::index::{Idx, Table};
use crate::models::{Callback, CalloutId, NotificationId, TransferProperty};
use crate::routing::{select_route, Route};
use crate::tables::{
    ComTables, GatewayDescription, GatewayGroup, Partition, Processing, RxMainFunction, RxPdu,
    TxPdu, DEFAULT_GATEWAY_BUDGET, DEFAULT_QUEUE_BYTES,
};

/// Name of the partition created when none is configured
pub const DEFAULT_PARTITION: &str = "default";

/// Root of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComConfig {
    /// Report configuration-impossible conditions through the Det hook
    #[serde(default)]
    pub runtime_checks: bool,
    /// Notification cache size of the immediate receive path
    #[serde(default = "default_notify_cache")]
    pub immediate_notify_cache: usize,
    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,
    #[serde(default)]
    pub rx_main_functions: Vec<RxMainFunctionConfig>,
    #[serde(default)]
    pub rx_pdus: Vec<RxPduConfig>,
    #[serde(default)]
    pub tx_pdus: Vec<TxPduConfig>,
    #[serde(default)]
    pub gateway_groups: Vec<GatewayGroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub name: String,
    #[serde(default = "default_queue_bytes")]
    pub queue_bytes: usize,
    #[serde(default = "default_gateway_budget")]
    pub gateway_budget: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxMainFunctionConfig {
    pub name: String,
    /// Event-queue capacity (omit to always scan)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_queue: Option<usize>,
    #[serde(default = "default_rx_budget")]
    pub budget: u16,
    #[serde(default = "default_notify_cache")]
    pub notify_cache: usize,
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxPduConfig {
    pub name: String,
    pub length: usize,
    #[serde(default)]
    pub processing: Processing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_function: Option<String>,
    /// Defaults to the first partition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Callout deciding whether a reception is accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callout: Option<CalloutId>,
    /// Notification fired after processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxPduConfig {
    pub name: String,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Defaults to all zeros
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_value: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayGroupConfig {
    /// Received PDU name
    pub source: String,
    /// Transmitted PDU name
    pub destination: String,
    #[serde(default)]
    pub descriptions: Vec<GatewayDescriptionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayDescriptionConfig {
    pub source: BitRange,
    pub destination_start_bit: u16,
    /// Defaults to the source byte order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_byte_order: Option<ByteOrder>,
    #[serde(default)]
    pub transfer_property: TransferProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_bit: Option<UpdateBit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_update_bit: Option<UpdateBit>,
}

fn default_queue_bytes() -> usize {
    DEFAULT_QUEUE_BYTES
}

fn default_gateway_budget() -> u16 {
    DEFAULT_GATEWAY_BUDGET
}

fn default_rx_budget() -> u16 {
    4
}

fn default_notify_cache() -> usize {
    8
}

fn default_period_ms() -> u64 {
    10
}

impl ComConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> ComResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ComResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate and resolve into runtime tables
    pub fn build(&self) -> ComResult<ComTables> {
        let partitions = self.build_partitions()?;
        let rx_main_functions = self.build_main_functions()?;
        let rx_pdus = self.build_rx_pdus(&partitions, &rx_main_functions)?;
        let tx_pdus = self.build_tx_pdus(&partitions)?;
        let gateway_groups = self.build_groups(&partitions, &rx_pdus, &tx_pdus)?;

        let mut deferred_by_main_function = vec![Vec::new(); rx_main_functions.len()];
        for (idx, pdu) in rx_pdus.iter() {
            if let (Processing::Deferred, Some(mf)) = (pdu.processing, pdu.main_function) {
                deferred_by_main_function[mf.as_usize()].push(idx);
            }
        }

        let mut groups_by_source = vec![Vec::new(); rx_pdus.len()];
        for (idx, group) in gateway_groups.iter() {
            groups_by_source[group.source.as_usize()].push(idx);
        }

        debug!(
            partitions = partitions.len(),
            rx_pdus = rx_pdus.len(),
            tx_pdus = tx_pdus.len(),
            gateway_groups = gateway_groups.len(),
            "Configuration resolved"
        );

        Ok(ComTables {
            runtime_checks: self.runtime_checks,
            immediate_notify_cache: self.immediate_notify_cache,
            partitions,
            rx_main_functions,
            rx_pdus,
            tx_pdus,
            gateway_groups,
            deferred_by_main_function,
            groups_by_source,
        })
    }

    fn build_partitions(&self) -> ComResult<Table<Partition>> {
        if self.partitions.is_empty() {
            return Table::from_vec("partition", vec![Partition::new(DEFAULT_PARTITION)]);
        }
        unique_names("partition", self.partitions.iter().map(|p| p.name.as_str()))?;
        let items = self
            .partitions
            .iter()
            .map(|p| Partition {
                name: p.name.clone(),
                queue_bytes: p.queue_bytes,
                gateway_budget: p.gateway_budget,
            })
            .collect();
        Table::from_vec("partition", items)
    }

    fn build_main_functions(&self) -> ComResult<Table<RxMainFunction>> {
        unique_names(
            "rx main function",
            self.rx_main_functions.iter().map(|m| m.name.as_str()),
        )?;
        let items = self
            .rx_main_functions
            .iter()
            .map(|m| RxMainFunction {
                name: m.name.clone(),
                event_queue: m.event_queue,
                budget: m.budget,
                notify_cache: m.notify_cache,
                period_ms: m.period_ms,
            })
            .collect();
        Table::from_vec("rx main function", items)
    }

    fn build_rx_pdus(
        &self,
        partitions: &Table<Partition>,
        main_functions: &Table<RxMainFunction>,
    ) -> ComResult<Table<RxPdu>> {
        unique_names("rx PDU", self.rx_pdus.iter().map(|p| p.name.as_str()))?;
        let mut items = Vec::with_capacity(self.rx_pdus.len());
        for pdu in &self.rx_pdus {
            let main_function = pdu
                .main_function
                .as_deref()
                .map(|name| resolve(main_functions, "rx main function", name, |m| &m.name))
                .transpose()?;
            if pdu.processing == Processing::Deferred && main_function.is_none() {
                return Err(ComError::Config(format!(
                    "deferred rx PDU '{}' has no main function",
                    pdu.name
                )));
            }
            items.push(RxPdu {
                name: pdu.name.clone(),
                length: pdu.length,
                processing: pdu.processing,
                main_function,
                partition: partition_of(partitions, pdu.partition.as_deref())?,
                prefilter: pdu.callout.map_or(Callback::NoOp, Callback::Callout),
                notification: pdu.notification.map_or(Callback::NoOp, Callback::Notification),
            });
        }
        Table::from_vec("rx PDU", items)
    }

    fn build_tx_pdus(&self, partitions: &Table<Partition>) -> ComResult<Table<TxPdu>> {
        unique_names("tx PDU", self.tx_pdus.iter().map(|p| p.name.as_str()))?;
        let mut items = Vec::with_capacity(self.tx_pdus.len());
        for pdu in &self.tx_pdus {
            let init_value = match &pdu.init_value {
                Some(value) if value.len() != pdu.length => {
                    return Err(ComError::Config(format!(
                        "tx PDU '{}' init value has {} bytes, expected {}",
                        pdu.name,
                        value.len(),
                        pdu.length
                    )));
                }
                Some(value) => value.clone(),
                None => vec![0; pdu.length],
            };
            items.push(TxPdu {
                name: pdu.name.clone(),
                length: pdu.length,
                partition: partition_of(partitions, pdu.partition.as_deref())?,
                init_value,
            });
        }
        Table::from_vec("tx PDU", items)
    }

    fn build_groups(
        &self,
        partitions: &Table<Partition>,
        rx_pdus: &Table<RxPdu>,
        tx_pdus: &Table<TxPdu>,
    ) -> ComResult<Table<GatewayGroup>> {
        let mut items = Vec::with_capacity(self.gateway_groups.len());
        for group in &self.gateway_groups {
            let source = resolve(rx_pdus, "rx PDU", &group.source, |p| &p.name)?;
            let destination = resolve(tx_pdus, "tx PDU", &group.destination, |p| &p.name)?;
            let tx = tx_pdus.get(destination);

            let mut descriptions = Vec::with_capacity(group.descriptions.len());
            for desc in &group.descriptions {
                descriptions.push(build_description(desc, tx)?);
            }

            let rx = rx_pdus.get(source);
            let route = select_route(rx.partition, tx.partition);
            if let Route::CrossPartition { partition } = route {
                let queue = partitions.get(partition);
                let frame = FRAME_OVERHEAD + rx.length;
                if rx.length > usize::from(u16::MAX) || frame > queue.queue_bytes {
                    return Err(ComError::Config(format!(
                        "'{}' frames of {} bytes cannot fit the {}-byte queue of partition '{}'",
                        rx.name, frame, queue.queue_bytes, queue.name
                    )));
                }
            }

            items.push(GatewayGroup {
                source,
                destination,
                route,
                descriptions,
            });
        }
        Table::from_vec("gateway group", items)
    }
}

fn build_description(desc: &GatewayDescriptionConfig, tx: &TxPdu) -> ComResult<GatewayDescription> {
    if desc.source.length == 0 {
        return Err(ComError::Config(format!(
            "gateway description into '{}' has an empty source range",
            tx.name
        )));
    }
    let mut destination = desc.source.with_start(desc.destination_start_bit);
    if let Some(order) = desc.destination_byte_order {
        destination.byte_order = order;
    }
    if !destination.is_contained_in(tx.length) {
        return Err(ComError::Config(format!(
            "destination range at bit {} ({} bits) exceeds tx PDU '{}' of {} bytes",
            destination.start_bit, destination.length, tx.name, tx.length
        )));
    }
    if let Some(bit) = desc.destination_update_bit {
        if bit.byte_index() >= tx.length {
            return Err(ComError::Config(format!(
                "destination update bit outside tx PDU '{}'",
                tx.name
            )));
        }
    }
    Ok(GatewayDescription {
        source: desc.source,
        destination,
        transfer: desc.transfer_property,
        update_bit: desc.update_bit,
        destination_update_bit: desc.destination_update_bit,
    })
}

fn partition_of(partitions: &Table<Partition>, name: Option<&str>) -> ComResult<Idx<Partition>> {
    match name {
        Some(name) => resolve(partitions, "partition", name, |p| &p.name),
        // Tables always hold at least one partition
        None => partitions
            .index(0)
            .ok_or_else(|| ComError::Config("no partition defined".to_string())),
    }
}

fn resolve<T>(
    table: &Table<T>,
    kind: &'static str,
    name: &str,
    name_of: impl Fn(&T) -> &String,
) -> ComResult<Idx<T>> {
    table
        .position(|item| name_of(item) == name)
        .ok_or_else(|| ComError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

fn unique_names<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> ComResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ComError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
