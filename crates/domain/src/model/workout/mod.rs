mod workout;
pub use workout::*;

mod form;
pub use form::*;

mod workout_exercise;
pub use workout_exercise::*;
