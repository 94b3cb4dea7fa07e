// Unit tests for ConnectionState

use crate::state::ConnectionState;

#[test]
fn given_states_when_serialized_then_lowercase_names() {
    let all = [
        ConnectionState::Idle,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Reconnecting,
        ConnectionState::Disconnected,
        ConnectionState::Failed,
    ];

    for state in all {
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, format!("\"{}\"", state.as_str()));
        assert_eq!(state.to_string(), state.as_str());
        let back: ConnectionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}

/// **VALUE**: Verifies which states make `connect()` a no-op and which are sticky.
///
/// **WHY THIS MATTERS**: `connect()` idempotence and the "only an explicit connect
/// leaves failed" rule both hinge on these predicates.
///
/// **BUG THIS CATCHES**: Would catch `reconnecting` being treated as active, which
/// would make a "retry now" button do nothing.
#[test]
fn given_states_when_classified_then_active_and_terminal_sets_correct() {
    assert_eq!(ConnectionState::default(), ConnectionState::Idle);

    assert!(ConnectionState::Connecting.is_active());
    assert!(ConnectionState::Connected.is_active());
    assert!(!ConnectionState::Reconnecting.is_active());
    assert!(!ConnectionState::Idle.is_active());

    assert!(ConnectionState::Disconnected.is_terminal());
    assert!(ConnectionState::Failed.is_terminal());
    assert!(!ConnectionState::Reconnecting.is_terminal());
}
