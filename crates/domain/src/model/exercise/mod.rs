mod exercise_type;
pub use exercise_type::*;

mod exercise;
pub use exercise::*;

mod form;
pub use form::*;

mod progress;
pub use progress::*;
