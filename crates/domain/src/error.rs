use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Object;

/// Which rule a field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldErrorKind {
    /// Malformed structured input, e.g. a height string
    Format,
    /// A mandatory field is missing or empty
    Required,
    /// The value collides with another record
    Uniqueness,
    /// The value is not one of the allowed choices
    Choice,
    /// The value is out of range or too long
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors found while validating one form. Validation of one field
/// never stops validation of the others so this is reported as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single<F: Into<String>, M: Into<String>>(
        field: F,
        kind: FieldErrorKind,
        message: M,
    ) -> Self {
        let mut errors = Self::default();
        errors.add(field, kind, message);
        errors
    }

    pub fn add<F: Into<String>, M: Into<String>>(
        &mut self,
        field: F,
        kind: FieldErrorKind,
        message: M,
    ) {
        self.field_errors.push(FieldError {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationError) {
        self.field_errors.extend(other.field_errors);
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.field_errors.iter().filter(move |e| e.field == field)
    }

    pub fn has(&self, field: &str, kind: FieldErrorKind) -> bool {
        self.for_field(field).any(|e| e.kind == kind)
    }

    /// `Ok(value)` if no errors were collected
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.field_errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            e.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Not authorized: {message}")]
    Authorization { message: String },
    #[error("{object} {id} not found")]
    NotFound { object: Object, id: i64 },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),
    #[error("{message}")]
    Other { message: String },
    #[error("{context}: {inner}")]
    WithContext {
        context: String,
        inner: Box<DomainError>,
    },
}

impl DomainError {
    pub fn not_found(object: Object, id: i64) -> Self {
        Self::NotFound { object, id }
    }

    /// Strips any context wrappers
    pub fn root(&self) -> &DomainError {
        match self {
            Self::WithContext { inner, .. } => inner.root(),
            e => e,
        }
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self.root() {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self.root(), Self::Authorization { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }
}

#[macro_export]
macro_rules! other_error {
    ($($arg:tt)+) => {
        $crate::DomainError::Other { message: format!($($arg)+) }
    };
}

#[macro_export]
macro_rules! unauthorized_error {
    ($($arg:tt)+) => {
        $crate::DomainError::Authorization { message: format!($($arg)+) }
    };
}

pub trait ErrorContext<E>: Sized {
    /// Add helpful context to errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    #[allow(dead_code)]
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> E;
    /// Add helpful context to errors
    fn context<S: Into<String>>(self, context: S) -> E;
}

impl<E: Into<DomainError>> ErrorContext<DomainError> for E {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> DomainError {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> DomainError {
        DomainError::WithContext {
            context: context.into(),
            inner: Box::new(self.into()),
        }
    }
}

pub trait ResultContext<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, DomainError>;
    fn context<S: Into<String>>(self, context: S) -> Result<T, DomainError>;
}

impl<T, E: Into<DomainError>> ResultContext<T, E> for Result<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, DomainError> {
        self.map_err(|e| e.with_context(context))
    }
    fn context<S: Into<String>>(self, context: S) -> Result<T, DomainError> {
        self.map_err(|e| e.context(context))
    }
}
