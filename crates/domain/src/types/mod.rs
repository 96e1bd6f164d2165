mod height;
pub use height::*;

mod gender;
pub use gender::*;
