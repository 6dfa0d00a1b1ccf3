//! Build Relay - local build orchestration with live progress streaming.

pub mod config;
pub mod display;
pub mod process;
pub mod server;
pub mod shell;
pub mod stage;
pub mod stream;
