//! Provider client contract.

use crate::error::Result;
use crate::request::CreateInstanceRequest;
use crate::vm::{PriceInfo, VirtualMachine};
use async_trait::async_trait;

/// One implementation per cloud vendor.
///
/// All instance ids are the vendor's own ids. "Not found" outcomes are
/// `Ok(None)`, never errors; errors are reserved for vendor failures and
/// invalid input.
///
/// Clients are not required to stamp `provider` or `tenant_id` onto
/// returned snapshots — the service facade back-fills both.
#[async_trait]
pub trait CloudVmClient: Send + Sync {
    /// Short uppercase vendor code used for registration and routing,
    /// e.g. `ALIYUN`.
    fn provider_code(&self) -> &str;

    /// Human-readable vendor name.
    fn provider_name(&self) -> &str;

    /// Quote the price of the requested instance. Clients without pricing
    /// wired up fail with `NOT_IMPLEMENTED` rather than returning zeros.
    async fn calculate_price(&self, request: &CreateInstanceRequest) -> Result<PriceInfo>;

    /// Create an instance. Returns immediately with a `PENDING` snapshot;
    /// polling to a terminal state is the caller's job via
    /// [`CloudVmClient::get_instance`].
    async fn create_instance(&self, request: CreateInstanceRequest) -> Result<VirtualMachine>;

    async fn delete_instance(&self, instance_id: &str) -> Result<bool>;

    async fn start_instance(&self, instance_id: &str) -> Result<bool>;

    async fn stop_instance(&self, instance_id: &str) -> Result<bool>;

    async fn restart_instance(&self, instance_id: &str) -> Result<bool>;

    /// Fetch a fresh snapshot; `Ok(None)` when the instance does not exist.
    async fn get_instance(&self, instance_id: &str) -> Result<Option<VirtualMachine>>;

    /// Resolve a business-facing name to the vendor instance id.
    async fn find_instance_id_by_name(&self, instance_name: &str) -> Result<Option<String>>;

    /// Health signal used by the registry and scheduler.
    fn is_available(&self) -> bool {
        true
    }

    /// Scheduling priority, lower is preferred.
    fn priority(&self) -> i32 {
        100
    }
}

impl std::fmt::Debug for dyn CloudVmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudVmClient")
            .field("provider_code", &self.provider_code())
            .finish_non_exhaustive()
    }
}
