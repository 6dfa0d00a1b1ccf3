//! Interpreter resolution for running build scripts on the current host.
//!
//! POSIX hosts execute the build script directly. Windows-class hosts probe
//! for a Linux-compatible subsystem first, then a short list of well-known
//! shell installations, then the executable search path.

mod error;
mod path;
mod plan;
mod probe;
mod resolver;

pub use error::*;
pub use path::*;
pub use plan::*;
pub use probe::*;
pub use resolver::*;
