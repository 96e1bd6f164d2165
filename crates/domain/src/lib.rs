pub mod db;
pub mod error;
pub mod model;
pub mod object;
pub mod types;

pub use error::{DomainError, FieldError, FieldErrorKind, ValidationError};
pub use object::Object;

#[cfg(test)]
pub(crate) mod test_utils;
