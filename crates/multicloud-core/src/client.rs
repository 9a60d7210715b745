//! Shared client lifecycle around vendor-specific hooks.
//!
//! [`LifecycleClient`] wraps a vendor's [`VmOps`] value and provides the
//! cross-cutting behavior every client needs: creation preconditions,
//! idempotent tag injection, structured start/success/failure logging, and
//! error normalization. Vendor crates implement `VmOps` only and get a
//! full [`CloudVmClient`] by composition.

use crate::tags;
use async_trait::async_trait;
use multicloud_api::{
    CloudVmClient, CreateInstanceRequest, EcsError, PriceInfo, Result, VirtualMachine, VmOperation,
};

/// Vendor-specific hook set.
///
/// Hooks return `anyhow::Result` so vendor layers can bubble up whatever
/// they hit; the lifecycle wrapper passes already-typed [`EcsError`]s
/// through unchanged and wraps anything else into the operation-specific
/// `<OP>_FAILED` error carrying the provider code.
#[async_trait]
pub trait VmOps: Send + Sync {
    fn provider_code(&self) -> &str;

    fn provider_name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    fn priority(&self) -> i32 {
        100
    }

    /// Pricing has no sensible universal default: vendors that have not
    /// wired it up fail loudly instead of quoting zero.
    async fn calculate_price(&self, _request: &CreateInstanceRequest) -> anyhow::Result<PriceInfo> {
        tracing::warn!(
            provider = self.provider_code(),
            "calculate_price not implemented"
        );
        Err(EcsError::not_implemented(self.provider_code(), "calculate_price").into())
    }

    async fn create(&self, request: &CreateInstanceRequest) -> anyhow::Result<VirtualMachine>;

    async fn delete(&self, instance_id: &str) -> anyhow::Result<bool>;

    async fn start(&self, instance_id: &str) -> anyhow::Result<bool>;

    async fn stop(&self, instance_id: &str) -> anyhow::Result<bool>;

    async fn restart(&self, instance_id: &str) -> anyhow::Result<bool>;

    async fn get(&self, instance_id: &str) -> anyhow::Result<Option<VirtualMachine>>;

    async fn find_id_by_name(&self, instance_name: &str) -> anyhow::Result<Option<String>>;
}

/// Generic lifecycle wrapper turning a [`VmOps`] value into a
/// [`CloudVmClient`].
pub struct LifecycleClient<O: VmOps> {
    ops: O,
}

impl<O: VmOps> LifecycleClient<O> {
    pub fn new(ops: O) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    fn normalize_err(&self, op: VmOperation, err: anyhow::Error) -> EcsError {
        match err.downcast::<EcsError>() {
            Ok(typed) => typed,
            Err(other) => {
                EcsError::operation(self.ops.provider_code(), op, format!("{other:#}"))
            }
        }
    }

    fn check_create_preconditions(request: &CreateInstanceRequest) -> Result<()> {
        if request.tenant_id.trim().is_empty() {
            return Err(EcsError::validation(
                "TENANT_ID_REQUIRED",
                "tenant id must not be blank",
            ));
        }
        if request.image_key.trim().is_empty() {
            return Err(EcsError::validation(
                "IMAGE_REQUIRED",
                "image key must not be blank",
            ));
        }
        if request.instance_name.trim().is_empty() {
            return Err(EcsError::validation(
                "INSTANCE_NAME_REQUIRED",
                "instance name must not be blank",
            ));
        }
        if request.region.trim().is_empty() {
            return Err(EcsError::validation(
                "REGION_REQUIRED",
                "region must not be blank",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<O: VmOps> CloudVmClient for LifecycleClient<O> {
    fn provider_code(&self) -> &str {
        self.ops.provider_code()
    }

    fn provider_name(&self) -> &str {
        self.ops.provider_name()
    }

    async fn calculate_price(&self, request: &CreateInstanceRequest) -> Result<PriceInfo> {
        tracing::debug!(
            provider = self.provider_code(),
            instance_type = request.instance_type.as_deref(),
            region = %request.region,
            "calculating price"
        );
        self.ops
            .calculate_price(request)
            .await
            .map_err(|e| self.normalize_err(VmOperation::CalculatePrice, e))
    }

    async fn create_instance(&self, mut request: CreateInstanceRequest) -> Result<VirtualMachine> {
        Self::check_create_preconditions(&request)?;
        // Re-injection is idempotent; clients can be called directly,
        // without the service facade in front.
        tags::inject(&mut request);

        tracing::info!(
            provider = self.provider_code(),
            instance_name = %request.instance_name,
            tenant_id = %request.tenant_id,
            user_id = %request.user_id,
            region = %request.region,
            image_key = %request.image_key,
            gpu_model = request.gpu_model.as_deref(),
            "creating instance"
        );

        match self.ops.create(&request).await {
            Ok(vm) => {
                tracing::info!(
                    provider = self.provider_code(),
                    instance_id = vm.instance_id.as_deref(),
                    instance_name = vm.instance_name.as_deref(),
                    status = %vm.status,
                    "instance created"
                );
                Ok(vm)
            }
            Err(e) => {
                tracing::error!(
                    provider = self.provider_code(),
                    instance_name = %request.instance_name,
                    tenant_id = %request.tenant_id,
                    error = %e,
                    "instance creation failed"
                );
                Err(self.normalize_err(VmOperation::Create, e))
            }
        }
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = self.provider_code(), instance_id, "deleting instance");
        match self.ops.delete(instance_id).await {
            Ok(result) => {
                tracing::info!(provider = self.provider_code(), instance_id, result, "delete finished");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(provider = self.provider_code(), instance_id, error = %e, "delete failed");
                Err(self.normalize_err(VmOperation::Delete, e))
            }
        }
    }

    async fn start_instance(&self, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = self.provider_code(), instance_id, "starting instance");
        match self.ops.start(instance_id).await {
            Ok(result) => {
                tracing::info!(provider = self.provider_code(), instance_id, result, "start finished");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(provider = self.provider_code(), instance_id, error = %e, "start failed");
                Err(self.normalize_err(VmOperation::Start, e))
            }
        }
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = self.provider_code(), instance_id, "stopping instance");
        match self.ops.stop(instance_id).await {
            Ok(result) => {
                tracing::info!(provider = self.provider_code(), instance_id, result, "stop finished");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(provider = self.provider_code(), instance_id, error = %e, "stop failed");
                Err(self.normalize_err(VmOperation::Stop, e))
            }
        }
    }

    async fn restart_instance(&self, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = self.provider_code(), instance_id, "restarting instance");
        match self.ops.restart(instance_id).await {
            Ok(result) => {
                tracing::info!(provider = self.provider_code(), instance_id, result, "restart finished");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(provider = self.provider_code(), instance_id, error = %e, "restart failed");
                Err(self.normalize_err(VmOperation::Restart, e))
            }
        }
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<VirtualMachine>> {
        tracing::debug!(provider = self.provider_code(), instance_id, "fetching instance");
        self.ops
            .get(instance_id)
            .await
            .map_err(|e| self.normalize_err(VmOperation::Get, e))
    }

    async fn find_instance_id_by_name(&self, instance_name: &str) -> Result<Option<String>> {
        tracing::debug!(
            provider = self.provider_code(),
            instance_name,
            "resolving instance id by name"
        );
        self.ops
            .find_id_by_name(instance_name)
            .await
            .map_err(|e| self.normalize_err(VmOperation::FindByName, e))
    }

    fn is_available(&self) -> bool {
        self.ops.is_available()
    }

    fn priority(&self) -> i32 {
        self.ops.priority()
    }
}
