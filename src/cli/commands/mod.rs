//! CLI command implementations

pub mod check;
pub mod clear;
pub mod config;
pub mod entry;
pub mod list;

pub use check::execute as check;
pub use clear::execute as clear;
pub use config::execute as config;
pub use entry::{get, remove};
pub use list::execute as list;
