// SPDX-License-Identifier: MIT

//! Property tests for Run/TaskOutcome serialization round-tripping.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use noa_core::{Run, RunId, TaskKind, TaskOutcome};
use proptest::prelude::*;

fn arb_task_kind() -> impl Strategy<Value = TaskKind> {
    prop_oneof![
        Just(TaskKind::Kubelet),
        Just(TaskKind::Runtime),
        Just(TaskKind::Script),
        Just(TaskKind::Unknown),
    ]
}

fn arb_outcome() -> impl Strategy<Value = TaskOutcome> {
    (arb_task_kind(), any::<bool>(), 0i64..1_000_000, 0i64..1_000, ".{0,64}").prop_map(
        |(kind, successful, begin_secs, span, error)| {
            let begin_time = Utc.timestamp_opt(begin_secs, 0).unwrap();
            let end_time = begin_time + chrono::Duration::seconds(span);
            if successful {
                TaskOutcome::success(kind, begin_time, end_time)
            } else {
                TaskOutcome::failure(kind, begin_time, end_time, error)
            }
        },
    )
}

proptest! {
    #[test]
    fn task_outcome_round_trips(outcome in arb_outcome()) {
        let json = serde_json::to_string(&outcome).unwrap();
        let back: TaskOutcome = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(outcome, back);
    }

    #[test]
    fn task_outcome_preserves_monotonicity(outcome in arb_outcome()) {
        prop_assert!(outcome.begin_time <= outcome.end_time);
    }

    #[test]
    fn run_round_trips_with_arbitrary_outcomes(outcomes in prop::collection::vec(arb_outcome(), 0..4)) {
        let mut run = Run::new(RunId::new());
        for outcome in outcomes {
            run.push(outcome);
        }
        let json = serde_json::to_string(&run).unwrap();
        let back: Run = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(run, back);
    }
}
