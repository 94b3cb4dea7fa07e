// Unit tests for the registry event logger

use crate::event_log::{describe, watched_types};

use realtime_core::{EventType, InboundEvent};

#[test]
fn given_event_with_timestamp_when_described_then_type_time_and_payload() {
    let event = InboundEvent::parse(
        r#"{"type":"instance.status_changed","payload":{"status":"DOWN"},"timestamp":1700000000000}"#,
    )
    .unwrap();

    assert_eq!(
        describe(&event),
        r#"instance.status_changed @1700000000000 {"status":"DOWN"}"#
    );
}

#[test]
fn given_event_without_timestamp_when_described_then_type_and_payload() {
    let event = InboundEvent::parse(r#"{"type":"cluster.node_added","data":{"nodeId":"n-4"}}"#).unwrap();

    assert_eq!(describe(&event), r#"cluster.node_added {"nodeId":"n-4"}"#);
}

#[test]
fn given_watched_types_when_listed_then_all_known_registry_events() {
    let types: Vec<EventType> = watched_types().collect();

    assert_eq!(types.len(), 7);
    assert!(types.iter().all(EventType::is_known));
    assert!(types.contains(&EventType::InstanceStatusChanged));
}
