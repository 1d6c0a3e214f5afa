//! Configuration files on disk

use std::io::Write;

use comgw_core::{ComConfig, ComError, Repetition, Route};
use comgw_tests::Stack;
use pretty_assertions::assert_eq;

const DAEMON_SAMPLE: &str = include_str!("../../comgwd/config/comgw.toml");

#[test]
fn test_daemon_sample_drives_the_stack() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DAEMON_SAMPLE.as_bytes()).unwrap();

    let config = ComConfig::from_file(file.path()).unwrap();
    let stack = Stack::from_config(&config).unwrap();

    let wheels = stack.rx_pdu("WheelSpeeds");
    let group = stack.tables.groups_for(stack.tables.rx_pdu(wheels).unwrap())[0];
    assert!(!stack.tables.gateway_groups[group].route.is_local());
    assert!(matches!(
        stack.tables.gateway_groups[group].route,
        Route::CrossPartition { .. }
    ));

    // Big-endian source word 0x01F4 lands little-endian in the chassis PDU
    assert!(stack.rx.rx_indication(wheels, &[0x01, 0xF4, 0, 0, 0, 0, 0, 0x80]));
    stack.rx.main_function_rx(stack.main_function("rx_100ms"));
    stack.gateway.main_function_gateway(stack.partition("chassis"));

    let sent = stack.bench.transmitter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].pdu, stack.tx_pdu("GwChassisInfo"));
    assert_eq!(sent[0].payload, vec![0xF4, 0x01, 0, 0, 0, 0, 0, 0x80]);
    assert_eq!(sent[0].repetition, Repetition::WithRepetition);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ComConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ComError::Io(_)));
}

#[test]
fn test_invalid_reference_in_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[[gateway_groups]]
source = "Nowhere"
destination = "Nothing"
"#
    )
    .unwrap();

    let config = ComConfig::from_file(file.path()).unwrap();
    let err = Stack::from_config(&config).err().unwrap();
    assert_eq!(err.to_string(), "unknown rx PDU 'Nowhere'");
}
