use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    model::{constants::NAME_MAX_LENGTH, validators::required_text, ExerciseType},
    DomainError, FieldErrorKind, ValidationError,
};

/// Exercise create/edit form. The category is submitted by name and must be
/// one of the allowed categories; no other catalog entry is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseForm {
    pub name: String,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseChanges {
    pub exercise_type_id: i64,
    pub name: String,
    pub description: String,
}

impl ExerciseForm {
    pub fn clean(&self, conn: &Connection) -> Result<ExerciseChanges, DomainError> {
        let mut errors = ValidationError::default();

        let name = required_text(&mut errors, "name", &self.name, NAME_MAX_LENGTH);

        let category = self.category.trim();
        let exercise_type = if category.is_empty() {
            errors.add("category", FieldErrorKind::Required, "This field is required.");
            None
        } else if !ExerciseType::is_allowed_category(category) {
            errors.add(
                "category",
                FieldErrorKind::Choice,
                format!("Select a valid choice. {category} is not one of the available choices."),
            );
            None
        } else {
            let found = ExerciseType::fetch_by_name(conn, category)?;
            if found.is_none() {
                errors.add(
                    "category",
                    FieldErrorKind::Choice,
                    format!("Select a valid choice. {category} is not one of the available choices."),
                );
            }
            found
        };

        let description = self.description.trim().to_owned();

        match exercise_type {
            Some(exercise_type) if errors.is_empty() => Ok(ExerciseChanges {
                exercise_type_id: exercise_type.id,
                name,
                description,
            }),
            _ => Err(errors.into()),
        }
    }
}
