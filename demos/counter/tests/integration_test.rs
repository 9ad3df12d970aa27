//! Integration tests for Counter with Store
//!
//! These tests run the reference scenarios and the counter's properties
//! end to end through a real store.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use counter::{CounterAction, CounterError, CounterReducer, CounterState, parse_action};
use proptest::prelude::*;
use tally_runtime::{Store, StoreError};
use tally_testing::RecordingListener;

#[test]
fn test_counter_with_store() {
    let store = Store::new(CounterReducer, Some(CounterState { count: 0 })).unwrap();
    let recorder = RecordingListener::new();
    recorder.attach(&store);

    // Initial state
    assert_eq!(store.get_state().count, 0);

    // Add twice
    store.dispatch(CounterAction::Add).unwrap();
    store.dispatch(CounterAction::Add).unwrap();
    assert_eq!(store.get_state().count, 2);

    // Subtract
    store.dispatch(CounterAction::Subtract).unwrap();
    assert_eq!(store.get_state().count, 1);

    // Reset
    store.dispatch(CounterAction::Reset).unwrap();
    assert_eq!(store.get_state().count, 0);

    let counts: Vec<i64> = recorder.states().iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![1, 2, 1, 0]);
}

#[test]
fn test_store_without_initial_state_starts_at_zero() {
    let store = Store::new(CounterReducer, None).unwrap();
    assert_eq!(*store.get_state(), CounterState { count: 0 });
}

#[test]
fn test_state_isolation() {
    let store1 = Store::new(CounterReducer, None).unwrap();
    let store2 = Store::new(CounterReducer, None).unwrap();

    // Modify store1
    store1.dispatch(CounterAction::Add).unwrap();
    store1.dispatch(CounterAction::Add).unwrap();

    // Modify store2
    store2.dispatch(CounterAction::Add).unwrap();

    // Verify isolation
    assert_eq!(store1.get_state().count, 2);
    assert_eq!(store2.get_state().count, 1);
}

#[test]
fn test_negative_count() {
    let store = Store::new(CounterReducer, None).unwrap();

    // Subtract below zero
    for _ in 0..3 {
        store.dispatch(CounterAction::Subtract).unwrap();
    }

    assert_eq!(store.get_state().count, -3);
}

#[test]
fn test_large_counts() {
    let store = Store::new(
        CounterReducer,
        Some(CounterState {
            count: i64::MAX - 5,
        }),
    )
    .unwrap();

    for _ in 0..3 {
        store.dispatch(CounterAction::Add).unwrap();
    }
    assert_eq!(store.get_state().count, i64::MAX - 2);

    // Reset works even with large numbers
    store.dispatch(CounterAction::Reset).unwrap();
    assert_eq!(store.get_state().count, 0);
}

#[test]
fn test_overflow_keeps_state_and_skips_listeners() {
    let store = Store::new(CounterReducer, Some(CounterState { count: i64::MAX })).unwrap();
    let recorder = RecordingListener::new();
    recorder.attach(&store);

    let err = store.dispatch(CounterAction::Add).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Reducer {
            source: CounterError::Overflow { count: i64::MAX, .. },
            ..
        }
    ));

    assert_eq!(store.get_state().count, i64::MAX);
    assert_eq!(recorder.calls(), 0);
}

#[test]
fn test_json_actions_through_store() {
    let store = Store::new(CounterReducer, None).unwrap();

    for raw in [
        r#"{"type":"ADD"}"#,
        r#"{"type":"ADD"}"#,
        r#"{"type":"DIVIDE"}"#,
        r#"{"type":"SUBTRACT"}"#,
    ] {
        store.dispatch(parse_action(raw).unwrap()).unwrap();
    }

    assert_eq!(store.get_state().count, 1);
}

#[test]
fn test_invalid_json_action_never_reaches_store() {
    let store = Store::new(CounterReducer, None).unwrap();
    let recorder = RecordingListener::new();
    recorder.attach(&store);

    let results: Vec<_> = [r#"{"type":"ADD"}"#, "not json", r#"{"type":"ADD"}"#]
        .into_iter()
        .map(parse_action)
        .collect();

    assert!(results[1].is_err());
    for action in results.into_iter().flatten() {
        store.dispatch(action).unwrap();
    }

    assert_eq!(store.get_state().count, 2);
    assert_eq!(recorder.calls(), 2);
}

fn counter_action() -> impl Strategy<Value = CounterAction> {
    prop_oneof![
        Just(CounterAction::Add),
        Just(CounterAction::Subtract),
        Just(CounterAction::Unrecognized),
    ]
}

proptest! {
    #[test]
    fn prop_count_is_net_sum(
        start in -1_000_000i64..1_000_000,
        actions in tally_testing::action_sequence(counter_action(), 64),
    ) {
        let store = Store::new(CounterReducer, Some(CounterState { count: start })).unwrap();
        for action in &actions {
            store.dispatch(*action).unwrap();
        }

        let net: i64 = actions
            .iter()
            .map(|action| match action {
                CounterAction::Add => 1,
                CounterAction::Subtract => -1,
                CounterAction::Reset | CounterAction::Unrecognized => 0,
            })
            .sum();
        prop_assert_eq!(store.get_state().count, start + net);
    }

    #[test]
    fn prop_reset_always_zero(start in any::<i64>()) {
        let store = Store::new(CounterReducer, Some(CounterState { count: start })).unwrap();
        store.dispatch(CounterAction::Reset).unwrap();
        prop_assert_eq!(store.get_state().count, 0);
    }

    #[test]
    fn prop_unrecognized_is_identity(start in any::<i64>()) {
        let store = Store::new(CounterReducer, Some(CounterState { count: start })).unwrap();
        let before = store.get_state();
        store.dispatch(CounterAction::Unrecognized).unwrap();
        prop_assert_eq!(&*store.get_state(), &*before);
    }
}
