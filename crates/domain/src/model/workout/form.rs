use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    model::{constants::NAME_MAX_LENGTH, fetch_optional, validators::required_text, Exercise},
    DomainError, FieldErrorKind, ValidationError,
};

/// Workout create/edit form. `completed` is deliberately absent; it only
/// changes through [`crate::model::Workout::complete`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutForm {
    pub name: String,
    /// Minutes
    pub duration: Option<u32>,
    pub description: String,
    pub public: bool,
    /// In the order they should be performed. Saving an existing workout
    /// renumbers its exercises in this order.
    pub exercises: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutChanges {
    pub name: String,
    pub duration: u32,
    pub description: String,
    pub public: bool,
    pub exercises: Vec<i64>,
}

impl WorkoutForm {
    pub fn clean(&self, conn: &Connection, profile_id: i64) -> Result<WorkoutChanges, DomainError> {
        let mut errors = ValidationError::default();

        let name = required_text(&mut errors, "name", &self.name, NAME_MAX_LENGTH);

        let duration = match self.duration {
            Some(d) if d > 0 => d,
            _ => {
                errors.add("duration", FieldErrorKind::Required, "Duration is required.");
                0
            }
        };

        let exercises = clean_exercise_choices(conn, &mut errors, profile_id, &self.exercises)?;

        errors.into_result(WorkoutChanges {
            name,
            duration,
            description: self.description.trim().to_owned(),
            public: self.public,
            exercises,
        })
        .map_err(Into::into)
    }
}

/// Drops duplicates keeping the first occurrence and flags every id that is
/// not one of `profile_id`'s exercises.
pub(crate) fn clean_exercise_choices(
    conn: &Connection,
    errors: &mut ValidationError,
    profile_id: i64,
    ids: &[i64],
) -> Result<Vec<i64>, DomainError> {
    let mut cleaned = Vec::with_capacity(ids.len());
    for &id in ids {
        if cleaned.contains(&id) {
            continue;
        }
        match fetch_optional::<Exercise>(conn, id)? {
            Some(exercise) if exercise.profile_id == profile_id => cleaned.push(id),
            _ => errors.add(
                "exercises",
                FieldErrorKind::Choice,
                format!("Select a valid choice. {id} is not one of the available choices."),
            ),
        }
    }
    Ok(cleaned)
}
