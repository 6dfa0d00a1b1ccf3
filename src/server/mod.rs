//! HTTP boundary: build triggers, probes and the configurator UI.

mod api;
mod error;
mod handlers;
mod prereq;
mod router;
mod state;

pub use api::*;
pub use error::ApiError;
pub use handlers::BOOTSTRAP_ONLY_KEY;
pub use prereq::probe_prerequisites;
pub use router::{RelayServer, RUN_ID_HEADER};
pub use state::{AppState, RunGuard};
