//! Presence checks behind the status endpoint.

use std::collections::BTreeMap;
use std::path::Path;

use super::StatusResponse;
use crate::config::Prerequisite;

/// Check every prerequisite under `root`.
///
/// `ready` is the conjunction of the required entries only.
#[must_use]
pub fn probe_prerequisites(root: &Path, prerequisites: &[Prerequisite]) -> StatusResponse {
    let mut checks = BTreeMap::new();
    let mut ready = true;
    for prerequisite in prerequisites {
        let present = prerequisite.is_present(root);
        if prerequisite.required && !present {
            ready = false;
        }
        checks.insert(prerequisite.name.clone(), present);
    }
    tracing::debug!(ready, ?checks, "Probed prerequisites");
    StatusResponse { checks, ready }
}
