mod profile;
pub use profile::*;

mod form;
pub use form::*;

mod history;
pub use history::*;
