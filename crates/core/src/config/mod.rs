//! Configuration loading and schema definitions
//!
//! Shared by the CLI and every service adapter.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
