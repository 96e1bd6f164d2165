use crate::ValidationError;

pub mod constants;
pub mod validators;

mod repository;
pub use repository::*;

mod identity;
pub use identity::*;

mod next_step;
pub use next_step::*;

mod user;
pub use user::*;

mod profile;
pub use profile::*;

mod exercise;
pub use exercise::*;

mod workout;
pub use workout::*;

/// Checks that don't need the database
pub trait ValidateModel {
    fn validate(&self) -> Result<(), ValidationError>;
}
