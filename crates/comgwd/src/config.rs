//! Daemon configuration: the COM tables plus a traffic simulation

use std::path::Path;

use anyhow::Context;
use comgw_core::{ComConfig, ComTables, PduHandle};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(flatten)]
    pub com: ComConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Period of every partition's gateway main function
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default)]
    pub frames: Vec<SimulatedFrame>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            frames: Vec::new(),
        }
    }
}

fn default_tick_ms() -> u64 {
    10
}

/// A PDU received periodically with a fixed payload
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedFrame {
    /// Rx PDU name
    pub pdu: String,
    /// Payload as hex
    pub payload: String,
    pub period_ms: u64,
}

/// Frame resolved against the tables
#[derive(Debug, Clone)]
pub struct SimulatedTraffic {
    pub pdu: PduHandle,
    pub payload: Vec<u8>,
    pub period_ms: u64,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve simulated frames to PDU handles and raw payloads
    pub fn traffic(&self, tables: &ComTables) -> anyhow::Result<Vec<SimulatedTraffic>> {
        self.simulation
            .frames
            .iter()
            .map(|frame| -> anyhow::Result<SimulatedTraffic> {
                let pdu = tables
                    .rx_pdu_by_name(&frame.pdu)
                    .with_context(|| format!("Simulated frame for unknown rx PDU '{}'", frame.pdu))?;
                let payload = hex::decode(&frame.payload)
                    .with_context(|| format!("Invalid hex payload for '{}'", frame.pdu))?;
                anyhow::ensure!(frame.period_ms > 0, "Frame '{}' has a zero period", frame.pdu);
                Ok(SimulatedTraffic {
                    pdu,
                    payload,
                    period_ms: frame.period_ms,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = include_str!("../config/comgw.toml");

    #[test]
    fn test_sample_config_builds() {
        let config = DaemonConfig::from_toml(SAMPLE).unwrap();
        let tables = config.com.build().unwrap();
        assert_eq!(tables.partitions.len(), 2);
        assert_eq!(tables.gateway_groups.len(), 3);

        let traffic = config.traffic(&tables).unwrap();
        assert_eq!(traffic.len(), 3);
        assert_eq!(traffic[1].pdu, PduHandle(1));
        assert_eq!(traffic[1].payload, vec![0x03, 0x00]);
        assert_eq!(config.simulation.tick_ms, 10);
    }

    #[test]
    fn test_simulation_is_optional() {
        let config = DaemonConfig::from_toml(
            r#"
[[rx_pdus]]
name = "A"
length = 1
"#,
        )
        .unwrap();
        assert!(config.simulation.frames.is_empty());
        assert_eq!(config.com.rx_pdus.len(), 1);
    }

    #[test]
    fn test_unknown_simulated_pdu() {
        let config = DaemonConfig::from_toml(
            r#"
[[simulation.frames]]
pdu = "Missing"
payload = "00"
period_ms = 10
"#,
        )
        .unwrap();
        let tables = config.com.build().unwrap();
        let err = config.traffic(&tables).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_from_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"runtime_checks = \"yes\"").unwrap();
        let err = DaemonConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
