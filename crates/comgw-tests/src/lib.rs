//! Integration tests for the COM gateway
//!
//! The tests in `tests/` wire the receive dispatcher and the gateway together
//! the way a host does and drive them through their public entry points.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p comgw-tests
//! ```
//!
//! # Test Structure
//!
//! - `pipeline_test.rs` - reception through transmission, local and cross-partition
//! - `concurrency_test.rs` - receptions racing the receive main function
//! - `config_test.rs` - configuration files on disk

use std::sync::Arc;

use comgw_core::testing::TestBench;
use comgw_core::{
    ComConfig, ComResult, ComTables, MainFunctionId, PartitionId, PduHandle, RxPduRouter,
    TxPduHandle,
};
use comgw_gateway::GatewayEngine;
use comgw_rx::RxDispatcher;

/// Dispatcher and gateway sharing one set of recording collaborators
pub struct Stack {
    pub tables: Arc<ComTables>,
    pub bench: TestBench,
    pub rx: Arc<RxDispatcher>,
    pub gateway: Arc<GatewayEngine>,
}

impl Stack {
    pub fn from_config(config: &ComConfig) -> ComResult<Self> {
        Self::with_bench(config, TestBench::default())
    }

    pub fn from_toml(content: &str) -> ComResult<Self> {
        Self::from_config(&ComConfig::from_toml(content)?)
    }

    pub fn with_bench(config: &ComConfig, bench: TestBench) -> ComResult<Self> {
        let tables = Arc::new(config.build()?);
        let det = bench.det(tables.runtime_checks);
        let gateway = Arc::new(GatewayEngine::new(
            tables.clone(),
            bench.transmitter.clone(),
            det.clone(),
        ));
        let router: Arc<dyn RxPduRouter> = gateway.clone();
        let rx = Arc::new(
            RxDispatcher::new(tables.clone(), bench.rx_collaborators(), det).with_router(router),
        );
        rx.init();
        gateway.init();
        Ok(Self {
            tables,
            bench,
            rx,
            gateway,
        })
    }

    pub fn rx_pdu(&self, name: &str) -> PduHandle {
        self.tables
            .rx_pdu_by_name(name)
            .unwrap_or_else(|| panic!("no rx PDU named {name}"))
    }

    pub fn tx_pdu(&self, name: &str) -> TxPduHandle {
        self.tables
            .tx_pdu_by_name(name)
            .unwrap_or_else(|| panic!("no tx PDU named {name}"))
    }

    pub fn main_function(&self, name: &str) -> MainFunctionId {
        self.tables
            .main_function_by_name(name)
            .unwrap_or_else(|| panic!("no main function named {name}"))
    }

    pub fn partition(&self, name: &str) -> PartitionId {
        self.tables
            .partition_by_name(name)
            .unwrap_or_else(|| panic!("no partition named {name}"))
    }
}
