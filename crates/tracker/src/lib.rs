pub mod cli;
pub mod commands;
pub mod db;
pub mod service;

mod utils;
pub use utils::*;

mod errors;
pub use errors::*;
