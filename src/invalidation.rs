//! View invalidation signalling.
//!
//! After a successful mutation the API nudges the rendering layer to refresh
//! cached views of the deployments dashboard. The signal is keyed by logical
//! path, carries no payload, and is strictly fire-and-forget: a lost or
//! failed invalidation only delays a refresh, so no caller ever propagates
//! an error from it.

use tracing::debug;

/// Logical path of the owner deployments dashboard.
pub const DEPLOYMENTS_PATH: &str = "/deployments";

/// Best-effort signal that a rendered view became stale.
pub trait ViewInvalidator: Send + Sync {
    /// Signal that views under `path` should be re-rendered. Must not block
    /// and must not fail the calling request.
    fn invalidate(&self, path: &str);
}

/// Default invalidator that records the signal in the log stream.
///
/// Deployments run behind a renderer that watches for these events; emitting
/// the structured log line is the whole contract here.
#[derive(Debug, Default, Clone)]
pub struct LogInvalidator;

impl ViewInvalidator for LogInvalidator {
    fn invalidate(&self, path: &str) {
        debug!(path = %path, "View invalidation signalled");
    }
}
