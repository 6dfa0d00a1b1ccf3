//! Build stage classification for progress display.
//!
//! Raw build output is free-form text. This module maps it onto a fixed
//! stage vocabulary (explicit `[STAGE]` markers first, keyword heuristics
//! second) and strips progress-bar noise from the human-readable log.

mod classifier;
mod noise;
mod tracker;
mod types;

pub use classifier::*;
pub use noise::*;
pub use tracker::*;
pub use types::*;
