//! Configuration module.

mod build_config;
mod loader;
mod types;

pub use build_config::*;
pub use loader::*;
pub use types::*;
