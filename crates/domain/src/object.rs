use std::fmt;

use serde::{Deserialize, Serialize};

/// Every persisted entity kind. Used to key generic repository functions and
/// to name the missing entity in [`crate::DomainError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    User,
    Profile,
    ProfileHistory,
    ExerciseType,
    Exercise,
    Workout,
    WorkoutExercise,
    ExerciseProgress,
}

impl Object {
    pub const fn table(&self) -> &'static str {
        use Object::*;
        match self {
            User => "user",
            Profile => "profile",
            ProfileHistory => "profile_history",
            ExerciseType => "exercise_type",
            Exercise => "exercise",
            Workout => "workout",
            WorkoutExercise => "workout_exercise",
            ExerciseProgress => "exercise_progress",
        }
    }

    pub const fn name(&self) -> &'static str {
        use Object::*;
        match self {
            User => "User",
            Profile => "Profile",
            ProfileHistory => "Profile history",
            ExerciseType => "Exercise type",
            Exercise => "Exercise",
            Workout => "Workout",
            WorkoutExercise => "Workout exercise",
            ExerciseProgress => "Exercise progress",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
