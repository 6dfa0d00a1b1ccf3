//! Shared state handed to every handler.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use super::ApiError;
use crate::config::ServerConfig;
use crate::shell::ShellResolver;

/// Held for the whole lifetime of one build or bootstrap run.
pub type RunGuard = OwnedMutexGuard<()>;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub resolver: Arc<ShellResolver>,
    /// Cancelled on server shutdown; each run derives a child token.
    pub cancel: CancellationToken,
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, resolver: ShellResolver) -> Self {
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            cancel: CancellationToken::new(),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Take the run lock without waiting.
    ///
    /// The configuration file and working directory are shared by every
    /// run, so only one run may be active at a time.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BuildInProgress` if another run holds the lock.
    pub fn begin_run(&self) -> Result<RunGuard, ApiError> {
        self.run_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| ApiError::BuildInProgress)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }
}
