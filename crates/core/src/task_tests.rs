// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn queued_allows_running_and_canceled_only() {
    assert!(can_transition(TaskStatus::Queued, TaskStatus::Running));
    assert!(can_transition(TaskStatus::Queued, TaskStatus::Canceled));
    assert!(!can_transition(TaskStatus::Queued, TaskStatus::Passed));
}

#[test]
fn terminal_states_accept_nothing() {
    for to in [
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::WaitingManual,
        TaskStatus::Passed,
        TaskStatus::FailedGate,
        TaskStatus::FailedSystem,
        TaskStatus::Canceled,
    ] {
        assert!(!can_transition(TaskStatus::Passed, to));
        assert!(!can_transition(TaskStatus::Canceled, to));
    }
}

#[test]
fn failed_states_can_reenter_running() {
    assert!(can_transition(TaskStatus::FailedGate, TaskStatus::Running));
    assert!(can_transition(
        TaskStatus::FailedSystem,
        TaskStatus::Running
    ));
    assert!(can_transition(
        TaskStatus::WaitingManual,
        TaskStatus::Running
    ));
}

#[test]
fn passed_and_canceled_are_terminal() {
    assert!(TaskStatus::Passed.is_terminal());
    assert!(TaskStatus::Canceled.is_terminal());
    assert!(!TaskStatus::Running.is_terminal());
}

#[test]
fn status_display_matches_serialized_token() {
    assert_eq!(TaskStatus::WaitingManual.to_string(), "waiting_manual");
    assert_eq!(TaskStatus::FailedGate.to_string(), "failed_gate");
}

proptest! {
    #[test]
    fn event_kind_round_trips_through_json(output in ".*", round in 0u32..50) {
        let event = TaskEvent {
            task_id: TaskId::new("task-1"),
            seq: 1,
            kind: TaskEventKind::Discussion {
                participant: "claude#author".to_string(),
                output: output.clone(),
            },
            round: Some(round),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&event).expect("serializes");
        let decoded: TaskEvent = serde_json::from_str(&json).expect("deserializes");
        match decoded.kind {
            TaskEventKind::Discussion { output: decoded_output, .. } => {
                prop_assert_eq!(decoded_output, output);
            }
            _ => prop_assert!(false, "wrong variant decoded"),
        }
        prop_assert_eq!(decoded.round, Some(round));
    }
}
