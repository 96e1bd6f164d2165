use deadpool_sqlite::HookError;
use domain::DomainError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("No user named {0:?}")]
    UnknownUser(String),
    #[error("This command needs --username (or TRACKER_USERNAME)")]
    MissingUsername,
    #[error("Deadpool interact error: {0}")]
    DeadpoolInteract(#[from] deadpool_sqlite::InteractError),
    #[error("Deadpool pool error: {0}")]
    DeadpoolPool(#[from] deadpool_sqlite::PoolError),
    #[error("Serde json encode error: {0}")]
    JsonEncode(#[from] serde_json::Error),
}

impl AppError {
    /// Distinct per failure category so scripts can branch on it
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Domain(e) => match e.root() {
                DomainError::Validation(_) => 2,
                DomainError::Authorization { .. } => 3,
                DomainError::NotFound { .. } => 4,
                _ => 1,
            },
            AppError::UnknownUser(_) | AppError::MissingUsername => 5,
            _ => 1,
        }
    }

    /// Validation failures keep their per-field structure
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AppError::Domain(e) => match e.validation() {
                Some(v) => json!({ "error": "validation", "field_errors": v.field_errors }),
                None => json!({ "error": e.to_string() }),
            },
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl From<AppError> for HookError {
    fn from(err: AppError) -> Self {
        Self::Message(err.to_string())
    }
}

#[cfg(test)]
mod test {
    use domain::{FieldErrorKind, Object, ValidationError};

    use super::*;

    #[test]
    fn test_validation_errors_render_per_field() {
        let e: AppError = DomainError::from(ValidationError::single(
            "duration",
            FieldErrorKind::Required,
            "Duration is required.",
        ))
        .into();

        assert_eq!(e.exit_code(), 2);
        let json = e.to_json();
        assert_eq!(json["field_errors"][0]["field"], "duration");
        assert_eq!(json["field_errors"][0]["kind"], "Required");
        assert_eq!(json["field_errors"][0]["message"], "Duration is required.");
    }

    #[test]
    fn test_exit_codes_follow_root_error() {
        use domain::error::ErrorContext;

        let e = AppError::from(DomainError::not_found(Object::Workout, 1).context("detail"));
        assert_eq!(e.exit_code(), 4);
        assert_eq!(AppError::MissingUsername.exit_code(), 5);
        assert_eq!(e.to_json()["error"], "detail: Workout 1 not found");
    }
}
