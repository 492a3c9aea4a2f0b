//! Configuration for nslock.
//!
//! The config file is YAML. Unknown fields are ignored for forward
//! compatibility and every field has a default, so an empty file is valid.
//! Environment variables override the file for the two values operators most
//! often need to change per invocation.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{BASE_DIR_ENV, CONFIG_PATH_ENV};
