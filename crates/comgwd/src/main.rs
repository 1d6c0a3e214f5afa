//! comgwd - COM gateway host daemon
//!
//! Loads the build-time tables from TOML, schedules every receive and
//! gateway main function on its own interval and replays the simulated
//! traffic of the `[simulation]` section.
//!
//! Usage:
//!   comgwd [OPTIONS] config.toml
//!
//! Options:
//!   --duration-ms <ms>  Stop after the given time instead of waiting for Ctrl+C

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use comgw_core::{Det, MainFunctionId, PartitionId, RxCollaborators, RxPduRouter};
use comgw_gateway::GatewayEngine;
use comgw_rx::{RxDispatcher, ScanStrategy};
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DaemonConfig;
use crate::logging::{LoggingNotifier, LoggingTransmitter};

/// Parsed command-line arguments
struct Args {
    config_path: Option<PathBuf>,
    duration: Option<Duration>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        duration: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--duration-ms" => {
                match args.get(i + 1).map(|v| v.parse::<u64>()) {
                    Some(Ok(ms)) => result.duration = Some(Duration::from_millis(ms)),
                    Some(Err(_)) => tracing::error!("Invalid value for --duration-ms: {}", args[i + 1]),
                    None => tracing::error!("Missing argument for --duration-ms"),
                }
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(PathBuf::from(arg));
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"comgwd - COM gateway host daemon

Usage: comgwd [OPTIONS] config.toml

Options:
      --duration-ms <ms>  Stop after <ms> milliseconds instead of waiting for Ctrl+C
  -h, --help              Print this help message

Examples:
  # Run until Ctrl+C
  comgwd crates/comgwd/config/comgw.toml

  # Two-second run with gateway tracing
  RUST_LOG=comgw_gateway=trace comgwd --duration-ms 2000 crates/comgwd/config/comgw.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comgwd=info,comgw_rx=info,comgw_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting comgwd (COM gateway daemon)");

    let args = parse_args();
    let Some(path) = args.config_path else {
        print_help();
        anyhow::bail!("No config file given");
    };

    tracing::info!("Loading config from: {}", path.display());
    let config = DaemonConfig::from_file(&path)?;
    let tables = Arc::new(
        config
            .com
            .build()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?,
    );
    let traffic = config.traffic(&tables)?;

    let det = Det::tracing(tables.runtime_checks);
    let notifier = Arc::new(LoggingNotifier::default());
    let transmitter = Arc::new(LoggingTransmitter::default());

    let gateway = Arc::new(GatewayEngine::new(
        tables.clone(),
        transmitter.clone(),
        det.clone(),
    ));
    let router: Arc<dyn RxPduRouter> = gateway.clone();
    let rx = Arc::new(
        RxDispatcher::new(
            tables.clone(),
            RxCollaborators::standalone(notifier.clone()),
            det,
        )
        .with_router(router),
    );
    rx.init();
    gateway.init();

    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    for (idx, mf) in tables.rx_main_functions.iter() {
        let rx = rx.clone();
        let id = MainFunctionId::from(idx);
        let period = Duration::from_millis(mf.period_ms.max(1));
        let name = mf.name.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let report = rx.main_function_rx(id);
                if report.strategy == ScanStrategy::FullScan && report.processed > 0 {
                    tracing::debug!(main_function = %name, processed = report.processed, "Full scan");
                }
            }
        }));
    }

    let tick = Duration::from_millis(config.simulation.tick_ms.max(1));
    for (idx, partition) in tables.partitions.iter() {
        let gateway = gateway.clone();
        let id = PartitionId::from(idx);
        let name = partition.name.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                let report = gateway.main_function_gateway(id);
                if report.aborted {
                    tracing::warn!(partition = %name, frames = report.frames, "Gateway cycle aborted");
                }
            }
        }));
    }

    for frame in traffic {
        let rx = rx.clone();
        handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(frame.period_ms));
            loop {
                interval.tick().await;
                if !rx.rx_indication(frame.pdu, &frame.payload) {
                    tracing::debug!(pdu = %frame.pdu, "Simulated frame rejected");
                }
            }
        }));
    }

    tracing::info!(
        rx_main_functions = tables.rx_main_functions.len(),
        partitions = tables.partitions.len(),
        "Scheduler running"
    );

    match args.duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => tokio::signal::ctrl_c().await?,
    }
    tracing::info!("Shutting down...");

    for handle in &handles {
        handle.abort();
    }

    tracing::info!(
        notifications = notifier.fired(),
        transmissions = transmitter.sent(),
        "Stopped"
    );
    Ok(())
}
