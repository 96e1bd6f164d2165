use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    model::{
        constants::{FITNESS_GOAL_MAX_LENGTH, NAME_MAX_LENGTH},
        validators::{blank_to_none, is_valid_email, max_length, non_negative_decimal},
        Profile,
    },
    types::{Gender, Height, HEIGHT_FORMAT_MESSAGE},
    DomainError, FieldErrorKind, ValidationError,
};

/// Profile edit form as submitted. Text fields arrive raw; [`ProfileForm::clean`]
/// turns them into [`ProfileChanges`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub gender: Option<String>,
    /// `5'4"` or `5'4`
    pub height: Option<String>,
    pub weight: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub fitness_goal: Option<String>,
}

/// Prefills the form with the current values
impl From<&Profile> for ProfileForm {
    fn from(profile: &Profile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            age: Some(profile.age),
            email: profile.email.clone(),
            gender: profile.gender.map(|g| g.code().to_owned()),
            height: profile.height.map(|h| h.to_string()),
            weight: profile.weight,
            birthdate: profile.birthdate,
            fitness_goal: Some(profile.fitness_goal.clone()),
        }
    }
}

/// Validated profile values ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: u32,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub height: Option<Height>,
    pub weight: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub fitness_goal: String,
}

impl ProfileForm {
    /// Field checks that don't touch the database. Every field is checked
    /// even after a failure.
    pub fn clean_fields(&self) -> (ProfileChanges, ValidationError) {
        let mut errors = ValidationError::default();

        let first_name = blank_to_none(self.first_name.as_deref());
        if let Some(v) = &first_name {
            max_length(&mut errors, "first_name", v, NAME_MAX_LENGTH);
        }
        let last_name = blank_to_none(self.last_name.as_deref());
        if let Some(v) = &last_name {
            max_length(&mut errors, "last_name", v, NAME_MAX_LENGTH);
        }

        let age = match self.age {
            None => {
                errors.add("age", FieldErrorKind::Required, "This field is required.");
                0
            }
            Some(0) => {
                errors.add("age", FieldErrorKind::Invalid, "Ensure this value is greater than 0.");
                0
            }
            Some(age) => age,
        };

        let email = blank_to_none(self.email.as_deref());
        if let Some(v) = &email {
            if !is_valid_email(v) {
                errors.add("email", FieldErrorKind::Format, "Enter a valid email address.");
            }
        }

        let gender = match blank_to_none(self.gender.as_deref()) {
            None => None,
            Some(v) => match v.parse::<Gender>() {
                Ok(g) => Some(g),
                Err(message) => {
                    errors.add("gender", FieldErrorKind::Choice, message);
                    None
                }
            },
        };

        let height = match blank_to_none(self.height.as_deref()) {
            None => None,
            Some(v) => match v.parse::<Height>() {
                Ok(h) => Some(h),
                Err(_) => {
                    errors.add("height", FieldErrorKind::Format, HEIGHT_FORMAT_MESSAGE);
                    None
                }
            },
        };

        if let Some(weight) = self.weight {
            non_negative_decimal(&mut errors, "weight", weight);
        }

        let fitness_goal = self.fitness_goal.as_deref().unwrap_or_default().trim().to_owned();
        max_length(&mut errors, "fitness_goal", &fitness_goal, FITNESS_GOAL_MAX_LENGTH);

        let changes = ProfileChanges {
            first_name,
            last_name,
            age,
            email,
            gender,
            height,
            weight: self.weight,
            birthdate: self.birthdate,
            fitness_goal,
        };
        (changes, errors)
    }

    /// Full validation for the profile `profile_id`, including email
    /// uniqueness against every other profile
    pub fn clean(&self, conn: &Connection, profile_id: i64) -> Result<ProfileChanges, DomainError> {
        let (changes, mut errors) = self.clean_fields();

        if let Some(email) = &changes.email {
            if !errors.has("email", FieldErrorKind::Format) && Profile::email_taken(conn, email, profile_id)? {
                errors.add(
                    "email",
                    FieldErrorKind::Uniqueness,
                    "This email address is already in use.",
                );
            }
        }

        Ok(errors.into_result(changes)?)
    }
}
