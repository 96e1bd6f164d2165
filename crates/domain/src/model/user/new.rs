use chrono::{DateTime, Utc};
use exemplar::Model;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    error::ResultContext,
    model::{
        constants::{USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH},
        fetch,
        validators::is_valid_username,
        NewProfile, NextStep, Profile, User, ValidateModel,
    },
    DomainError, FieldErrorKind, ValidationError,
};

/// Registration input. Creating it is the only way a user comes into
/// existence, and it always brings the user's profile with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[table("user")]
pub struct NewUser {
    pub username: String,
    pub registration_date: DateTime<Utc>,
}

impl NewUser {
    pub fn new<T: Into<String>>(username: T) -> Self {
        Self {
            username: username.into().trim().to_owned(),
            registration_date: Utc::now(),
        }
    }

    /// Inserts the user and its default profile in one transaction so there
    /// is never a user without a profile. The caller should continue with
    /// [`NewUser::next_step`].
    #[instrument(skip(conn))]
    pub fn create(self, conn: &mut Connection) -> Result<(User, Profile), DomainError> {
        self.validate()?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if User::fetch_by_username(&tx, &self.username)?.is_some() {
            return Err(ValidationError::single(
                "username",
                FieldErrorKind::Uniqueness,
                "A user with that username already exists.",
            )
            .into());
        }

        let user = {
            self.insert(&tx).context("NewUser::insert(User)")?;
            fetch::<User>(&tx, tx.last_insert_rowid()).context("NewUser::fetch(User)")?
        };

        let profile = {
            NewProfile::new(user.id)
                .insert(&tx)
                .context("NewUser::insert(Profile)")?;
            fetch::<Profile>(&tx, tx.last_insert_rowid()).context("NewUser::fetch(Profile)")?
        };

        tx.commit()?;

        info!(user_id = user.id, profile_id = profile.id, "Registered user");
        Ok((user, profile))
    }

    pub fn next_step(profile: &Profile) -> NextStep {
        NextStep::CompleteProfile {
            profile_id: profile.id,
        }
    }
}

impl ValidateModel for NewUser {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        let len = self.username.chars().count();

        if len < USERNAME_MIN_LENGTH {
            errors.add("username", FieldErrorKind::Required, "This field is required.");
        } else if len > USERNAME_MAX_LENGTH {
            errors.add(
                "username",
                FieldErrorKind::Invalid,
                format!("Username needs to be at most {USERNAME_MAX_LENGTH} characters long"),
            );
        } else if !is_valid_username(&self.username) {
            errors.add(
                "username",
                FieldErrorKind::Format,
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        errors.into_result(())
    }
}
