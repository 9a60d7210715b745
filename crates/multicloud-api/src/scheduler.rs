//! Request-to-provider selection.

use crate::client::CloudVmClient;
use crate::error::Result;
use crate::request::CreateInstanceRequest;
use std::sync::Arc;

/// Picks exactly one provider client for a creation request.
///
/// Selection is a pure function of the request and the registry snapshot:
/// it must not mutate either. The shipped strategy routes on the explicit
/// provider hint; a cost- or availability-ranking strategy can implement
/// this trait with `requires_provider() == false` without any caller
/// changes.
pub trait Scheduler: Send + Sync {
    /// Select a client, or fail with a typed scheduling error.
    fn select(&self, request: &CreateInstanceRequest) -> Result<Arc<dyn CloudVmClient>>;

    /// Strategy name, e.g. `FixedScheduler`.
    fn name(&self) -> &str;

    fn description(&self) -> String {
        self.name().to_string()
    }

    /// Whether requests must carry an explicit provider hint.
    fn requires_provider(&self) -> bool {
        true
    }
}
