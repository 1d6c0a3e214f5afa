//! Reception through transmission, local and cross-partition

use comgw_core::testing::Transmission;
use comgw_core::{NotificationId, Repetition};
use comgw_rx::ScanStrategy;
use comgw_tests::Stack;
use pretty_assertions::assert_eq;
use rstest::rstest;

const CONFIG: &str = r#"
runtime_checks = true

[[partitions]]
name = "body"

[[partitions]]
name = "chassis"
queue_bytes = 64

[[rx_main_functions]]
name = "rx_fast"
event_queue = 4
budget = 2

[[rx_main_functions]]
name = "rx_tiny"
event_queue = 1
budget = 0

[[rx_pdus]]
name = "EngineStatus"
length = 4
processing = "deferred"
main_function = "rx_fast"
notification = 1

[[rx_pdus]]
name = "DoorStatus"
length = 1

[[rx_pdus]]
name = "Wheel0"
length = 2
processing = "deferred"
main_function = "rx_tiny"

[[rx_pdus]]
name = "Wheel1"
length = 2
processing = "deferred"
main_function = "rx_tiny"

[[tx_pdus]]
name = "GwBody"
length = 4

[[tx_pdus]]
name = "GwChassis"
length = 4
partition = "chassis"

[[tx_pdus]]
name = "GwWheels"
length = 4

[[gateway_groups]]
source = "EngineStatus"
destination = "GwChassis"

[[gateway_groups.descriptions]]
source = { start_bit = 0, length = 16 }
destination_start_bit = 0
transfer_property = "triggered_on_change"

[[gateway_groups.descriptions]]
source = { start_bit = 16, length = 8 }
destination_start_bit = 16
transfer_property = "pending"

[[gateway_groups]]
source = "DoorStatus"
destination = "GwBody"

[[gateway_groups.descriptions]]
source = { start_bit = 0, length = 8 }
destination_start_bit = 0
transfer_property = "triggered"

[[gateway_groups]]
source = "Wheel0"
destination = "GwWheels"

[[gateway_groups.descriptions]]
source = { start_bit = 0, length = 16 }
destination_start_bit = 0
transfer_property = "triggered"

[[gateway_groups]]
source = "Wheel1"
destination = "GwWheels"

[[gateway_groups.descriptions]]
source = { start_bit = 0, length = 16 }
destination_start_bit = 16
transfer_property = "triggered_without_repetition"
"#;

fn transmission(pdu: comgw_core::TxPduHandle, payload: &[u8], repetition: Repetition) -> Transmission {
    Transmission {
        pdu,
        payload: payload.to_vec(),
        repetition,
    }
}

#[test]
fn test_deferred_pdu_crosses_partition() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let engine = stack.rx_pdu("EngineStatus");
    let chassis = stack.partition("chassis");

    assert!(stack.rx.rx_indication(engine, &[0x10, 0x27, 0x5A, 0x00]));
    assert!(stack.bench.signals.processed().is_empty());

    let report = stack.rx.main_function_rx(stack.main_function("rx_fast"));
    assert_eq!(report.strategy, ScanStrategy::EventQueue);
    assert_eq!(report.processed, 1);
    assert_eq!(stack.bench.notifier.fired(), vec![NotificationId(1)]);

    // Framed into the chassis queue, not yet evaluated
    assert_eq!(stack.gateway.queued_bytes(chassis), Some(9));
    assert!(stack.bench.transmitter.sent().is_empty());

    let report = stack.gateway.main_function_gateway(chassis);
    assert_eq!(report.frames, 1);
    assert!(!report.aborted);
    assert_eq!(
        stack.bench.transmitter.sent(),
        vec![transmission(
            stack.tx_pdu("GwChassis"),
            &[0x10, 0x27, 0x5A, 0x00],
            Repetition::WithRepetition
        )]
    );
    assert!(stack.bench.det.reports().is_empty());
}

#[test]
fn test_on_change_and_pending_ride_along() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let engine = stack.rx_pdu("EngineStatus");
    let rx_fast = stack.main_function("rx_fast");
    let chassis = stack.partition("chassis");
    let gw_chassis = stack.tx_pdu("GwChassis");

    let cycle = |payload: &[u8]| {
        stack.rx.rx_indication(engine, payload);
        stack.rx.main_function_rx(rx_fast);
        stack.gateway.main_function_gateway(chassis);
    };

    cycle(&[0x01, 0x00, 0x20, 0x00]);
    cycle(&[0x01, 0x00, 0x20, 0x00]);
    assert_eq!(stack.bench.transmitter.sent().len(), 1);

    // Only the pending byte changes: buffer follows, nothing is sent
    cycle(&[0x01, 0x00, 0x21, 0x00]);
    assert_eq!(stack.bench.transmitter.sent().len(), 1);
    assert_eq!(
        stack.gateway.tx_buffer(gw_chassis),
        Some(vec![0x01, 0x00, 0x21, 0x00])
    );

    cycle(&[0x02, 0x00, 0x22, 0x00]);
    let sent = stack.bench.transmitter.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].payload, vec![0x02, 0x00, 0x22, 0x00]);
}

#[test]
fn test_immediate_pdu_gatewayed_in_reception() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let door = stack.rx_pdu("DoorStatus");

    assert!(stack.rx.rx_indication(door, &[0x03]));
    assert_eq!(
        stack.bench.transmitter.sent(),
        vec![transmission(
            stack.tx_pdu("GwBody"),
            &[0x03, 0, 0, 0],
            Repetition::WithRepetition
        )]
    );
}

#[test]
fn test_queue_overrun_loses_no_update() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let wheel0 = stack.rx_pdu("Wheel0");
    let wheel1 = stack.rx_pdu("Wheel1");
    let gw_wheels = stack.tx_pdu("GwWheels");

    // Queue of one: the second reception is only remembered in its slot
    stack.rx.rx_indication(wheel1, &[0x01, 0x00]);
    stack.rx.rx_indication(wheel0, &[0x02, 0x00]);

    let report = stack.rx.main_function_rx(stack.main_function("rx_tiny"));
    assert_eq!(report.strategy, ScanStrategy::FullScan);
    assert_eq!(report.processed, 2);

    assert_eq!(
        stack.bench.transmitter.sent(),
        vec![
            transmission(gw_wheels, &[0x02, 0x00, 0x00, 0x00], Repetition::WithRepetition),
            transmission(gw_wheels, &[0x02, 0x00, 0x01, 0x00], Repetition::WithoutRepetition),
        ]
    );
}

#[test]
fn test_inactive_group_blocks_gateway() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let door = stack.rx_pdu("DoorStatus");

    stack.bench.groups.set_active(door, false);
    assert!(!stack.rx.rx_indication(door, &[0x03]));
    assert!(stack.bench.transmitter.sent().is_empty());
}

#[test]
fn test_init_resets_both_layers() {
    let stack = Stack::from_toml(CONFIG).unwrap();
    let engine = stack.rx_pdu("EngineStatus");
    let chassis = stack.partition("chassis");

    stack.rx.rx_indication(engine, &[1, 2, 3, 4]);
    stack.rx.main_function_rx(stack.main_function("rx_fast"));
    stack.rx.rx_indication(engine, &[5, 6, 7, 8]);

    stack.rx.init();
    stack.gateway.init();

    assert_eq!(stack.rx.main_function_rx(stack.main_function("rx_fast")).processed, 0);
    assert_eq!(stack.gateway.main_function_gateway(chassis).frames, 0);
    assert_eq!(
        stack.gateway.tx_buffer(stack.tx_pdu("GwChassis")),
        Some(vec![0, 0, 0, 0])
    );
}

#[rstest]
#[case("triggered", &[1], &[1], &[Repetition::WithRepetition, Repetition::WithRepetition])]
#[case("triggered_on_change", &[1], &[1], &[Repetition::WithRepetition])]
#[case("triggered_on_change", &[0], &[1], &[Repetition::WithRepetition])]
#[case(
    "triggered_on_change_without_repetition",
    &[1],
    &[2],
    &[Repetition::WithoutRepetition, Repetition::WithoutRepetition]
)]
#[case("triggered_without_repetition", &[0], &[0], &[Repetition::WithoutRepetition, Repetition::WithoutRepetition])]
#[case("pending", &[1], &[2], &[])]
fn test_transfer_property_end_to_end(
    #[case] property: &str,
    #[case] first: &[u8],
    #[case] second: &[u8],
    #[case] expected: &[Repetition],
) {
    let config = format!(
        r#"
[[rx_pdus]]
name = "Src"
length = 1

[[tx_pdus]]
name = "Dst"
length = 1

[[gateway_groups]]
source = "Src"
destination = "Dst"

[[gateway_groups.descriptions]]
source = {{ start_bit = 0, length = 8 }}
destination_start_bit = 0
transfer_property = "{property}"
"#
    );
    let stack = Stack::from_toml(&config).unwrap();
    let src = stack.rx_pdu("Src");

    stack.rx.rx_indication(src, first);
    stack.rx.rx_indication(src, second);

    let repetitions: Vec<Repetition> = stack
        .bench
        .transmitter
        .sent()
        .iter()
        .map(|t| t.repetition)
        .collect();
    assert_eq!(repetitions, expected.to_vec());
    assert_eq!(stack.gateway.tx_buffer(stack.tx_pdu("Dst")), Some(second.to_vec()));
}
