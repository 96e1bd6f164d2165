use serde::{Deserialize, Serialize};

/// Where the caller should send the user once an operation succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    CompleteProfile { profile_id: i64 },
    LogProgress { workout_id: i64, exercise_id: i64 },
    WorkoutSummary { workout_id: i64 },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_serializes_with_step_tag() {
        let step = NextStep::LogProgress {
            workout_id: 1,
            exercise_id: 2,
        };
        assert_eq!(
            serde_json::to_value(step).unwrap(),
            serde_json::json!({ "step": "log_progress", "workout_id": 1, "exercise_id": 2 })
        );
    }
}
