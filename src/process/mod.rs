//! Build process spawning and supervision.

mod child;
mod decode;
mod events;
mod supervisor;

pub use child::*;
pub use decode::*;
pub use events::*;
pub use supervisor::*;
