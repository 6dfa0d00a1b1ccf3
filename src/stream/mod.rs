//! Client-facing delivery of supervised build output.

mod emitter;
mod record;

pub use emitter::*;
pub use record::*;
