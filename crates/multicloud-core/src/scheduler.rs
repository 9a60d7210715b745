//! Shipped scheduling strategy.

use crate::registry::ClientRegistry;
use multicloud_api::{CloudVmClient, CreateInstanceRequest, EcsError, Result, Scheduler};
use std::sync::Arc;

/// Routes on the request's explicit provider hint.
///
/// Deterministic: no ranking, no fallback. Requests without a hint are
/// rejected with `PROVIDER_REQUIRED`.
pub struct FixedScheduler {
    registry: Arc<ClientRegistry>,
}

impl FixedScheduler {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }
}

impl Scheduler for FixedScheduler {
    fn select(&self, request: &CreateInstanceRequest) -> Result<Arc<dyn CloudVmClient>> {
        let provider = match request.provider.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(EcsError::ProviderRequired {
                    scheduler: self.name().to_string(),
                });
            }
        };

        let client = self.registry.get(provider)?;

        if !client.is_available() {
            return Err(EcsError::ProviderUnavailable {
                code: provider.to_ascii_uppercase(),
            });
        }

        tracing::debug!(
            provider = client.provider_code(),
            scheduler = self.name(),
            "selected provider client"
        );
        Ok(client)
    }

    fn name(&self) -> &str {
        "FixedScheduler"
    }

    fn description(&self) -> String {
        "routes on the request's explicit provider code".to_string()
    }

    fn requires_provider(&self) -> bool {
        true
    }
}
