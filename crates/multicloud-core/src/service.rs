//! Unified service facade.

use crate::registry::ClientRegistry;
use crate::tags;
use multicloud_api::{
    CreateInstanceRequest, EcsError, Result, Scheduler, VirtualMachine,
};
use std::sync::Arc;

/// Entry point for business callers; hides scheduling and vendor
/// differences behind the normalized operations.
///
/// Creation flows validate → tag → schedule → delegate; every other
/// operation takes an explicit provider code and goes straight through the
/// registry.
pub struct MultiCloudService {
    registry: Arc<ClientRegistry>,
    scheduler: Arc<dyn Scheduler>,
}

impl MultiCloudService {
    pub fn new(registry: Arc<ClientRegistry>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self { registry, scheduler }
    }

    /// Create an instance on the scheduled provider.
    ///
    /// Validation failures are synchronous and happen before tagging or
    /// any vendor call. On success the provider code and tenant id are
    /// back-filled onto the snapshot if the client omitted them.
    pub async fn create_instance(
        &self,
        mut request: CreateInstanceRequest,
    ) -> Result<VirtualMachine> {
        self.validate_create(&request)?;
        tags::inject(&mut request);

        let client = self.scheduler.select(&request)?;
        tracing::info!(
            provider = client.provider_code(),
            instance_name = %request.instance_name,
            tenant_id = %request.tenant_id,
            region = %request.region,
            "dispatching instance creation"
        );

        let tenant_id = request.tenant_id.clone();
        let instance_name = request.instance_name.clone();
        let provider_code = client.provider_code().to_string();

        match client.create_instance(request).await {
            Ok(mut vm) => {
                if vm.provider.is_none() {
                    vm.provider = Some(provider_code);
                }
                if vm.tenant_id.is_none() {
                    vm.tenant_id = Some(tenant_id);
                }
                tracing::info!(
                    provider = vm.provider.as_deref(),
                    instance_id = vm.instance_id.as_deref(),
                    instance_name = vm.instance_name.as_deref(),
                    status = %vm.status,
                    "instance creation dispatched"
                );
                Ok(vm)
            }
            Err(e) => {
                tracing::error!(
                    provider = %provider_code,
                    instance_name = %instance_name,
                    error = %e,
                    "instance creation failed"
                );
                Err(e)
            }
        }
    }

    pub async fn delete_instance(&self, provider_code: &str, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = provider_code, instance_id, "delete requested");
        let client = self.registry.get(provider_code)?;
        client.delete_instance(instance_id).await
    }

    pub async fn start_instance(&self, provider_code: &str, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = provider_code, instance_id, "start requested");
        let client = self.registry.get(provider_code)?;
        client.start_instance(instance_id).await
    }

    pub async fn stop_instance(&self, provider_code: &str, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = provider_code, instance_id, "stop requested");
        let client = self.registry.get(provider_code)?;
        client.stop_instance(instance_id).await
    }

    pub async fn restart_instance(&self, provider_code: &str, instance_id: &str) -> Result<bool> {
        tracing::info!(provider = provider_code, instance_id, "restart requested");
        let client = self.registry.get(provider_code)?;
        client.restart_instance(instance_id).await
    }

    /// Fresh snapshot, `Ok(None)` when the instance does not exist.
    pub async fn get_instance(
        &self,
        provider_code: &str,
        instance_id: &str,
    ) -> Result<Option<VirtualMachine>> {
        tracing::debug!(provider = provider_code, instance_id, "snapshot requested");
        let client = self.registry.get(provider_code)?;
        client.get_instance(instance_id).await
    }

    pub async fn find_instance_id_by_name(
        &self,
        provider_code: &str,
        instance_name: &str,
    ) -> Result<Option<String>> {
        tracing::debug!(provider = provider_code, instance_name, "id lookup by name");
        let client = self.registry.get(provider_code)?;
        client.find_instance_id_by_name(instance_name).await
    }

    pub fn registered_providers(&self) -> Vec<String> {
        self.registry.registered_codes()
    }

    /// False for unknown codes as well as for registered-but-unavailable
    /// clients.
    pub fn is_provider_available(&self, provider_code: &str) -> bool {
        self.registry
            .get_opt(provider_code)
            .is_some_and(|c| c.is_available())
    }

    fn validate_create(&self, request: &CreateInstanceRequest) -> Result<()> {
        if request.tenant_id.trim().is_empty() {
            return Err(EcsError::validation(
                "TENANT_ID_REQUIRED",
                "tenant id must not be blank",
            ));
        }
        if request.user_id.trim().is_empty() {
            return Err(EcsError::validation(
                "USER_ID_REQUIRED",
                "user id must not be blank",
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
        if request.image_key.trim().is_empty() {
            return Err(EcsError::validation(
                "IMAGE_REQUIRED",
                "image key must not be blank",
            ));
        }
        if self.scheduler.requires_provider()
            && request
                .provider
                .as_deref()
                .map(str::trim)
                .is_none_or(str::is_empty)
        {
            return Err(EcsError::ProviderRequired {
                scheduler: self.scheduler.name().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LifecycleClient, VmOps};
    use crate::scheduler::FixedScheduler;
    use async_trait::async_trait;
    use multicloud_api::{CloudVmClient, VmStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Vendor ops that record create calls and deliberately omit
    /// provider/tenant stamping.
    struct RecordingOps {
        creates: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VmOps for RecordingOps {
        fn provider_code(&self) -> &str {
            "ALIYUN"
        }
        fn provider_name(&self) -> &str {
            "Alibaba Cloud"
        }
        async fn create(&self, request: &CreateInstanceRequest) -> anyhow::Result<VirtualMachine> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let mut vm = VirtualMachine::with_status(VmStatus::Pending);
            vm.instance_id = Some("i-0001".into());
            vm.instance_name = Some(request.instance_name.clone());
            vm.tags = request.tags.clone();
            Ok(vm)
        }
        async fn delete(&self, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn start(&self, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn stop(&self, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn restart(&self, _: &str) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn get(&self, _: &str) -> anyhow::Result<Option<VirtualMachine>> {
            Ok(None)
        }
        async fn find_id_by_name(&self, name: &str) -> anyhow::Result<Option<String>> {
            Ok((name == "vm-known").then(|| "i-0001".to_string()))
        }
    }

    fn service() -> (MultiCloudService, Arc<AtomicUsize>) {
        let creates = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ClientRegistry::new());
        registry
            .register(Arc::new(LifecycleClient::new(RecordingOps {
                creates: creates.clone(),
            })) as Arc<dyn CloudVmClient>)
            .unwrap();
        let scheduler = Arc::new(FixedScheduler::new(registry.clone()));
        (MultiCloudService::new(registry, scheduler), creates)
    }

    fn request() -> CreateInstanceRequest {
        CreateInstanceRequest::new("t1", "u1", "cn-hangzhou", "vm-1", "centos-7.9")
            .with_provider("ALIYUN")
    }

    #[tokio::test]
    async fn create_backfills_provider_and_tenant() {
        let (service, _) = service();
        let vm = service.create_instance(request()).await.unwrap();
        assert_eq!(vm.provider.as_deref(), Some("ALIYUN"));
        assert_eq!(vm.tenant_id.as_deref(), Some("t1"));
        assert_eq!(vm.status, VmStatus::Pending);
        assert_eq!(vm.tags.get(tags::TENANT_TAG).map(String::as_str), Some("t1"));
    }

    #[tokio::test]
    async fn validation_happens_before_any_vendor_call() {
        let (service, creates) = service();
        let mut req = request();
        req.image_key = String::new();
        let err = service.create_instance(req).await.unwrap_err();
        assert_eq!(err.code(), "IMAGE_REQUIRED");
        assert_eq!(creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_provider_fails_before_dispatch() {
        let (service, creates) = service();
        let mut req = request();
        req.provider = None;
        let err = service.create_instance(req).await.unwrap_err();
        assert_eq!(err.code(), "PROVIDER_REQUIRED");
        assert_eq!(creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn management_ops_route_through_registry() {
        let (service, _) = service();
        assert!(service.delete_instance("aliyun", "i-0001").await.unwrap());
        assert!(service.start_instance(" ALIYUN ", "i-0001").await.unwrap());
        assert_eq!(
            service
                .find_instance_id_by_name("ALIYUN", "vm-known")
                .await
                .unwrap()
                .as_deref(),
            Some("i-0001")
        );
        assert_eq!(
            service
                .find_instance_id_by_name("ALIYUN", "vm-unknown")
                .await
                .unwrap(),
            None
        );

        let err = service
            .delete_instance("TENCENT", "i-0001")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PROVIDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn registry_projections() {
        let (service, _) = service();
        assert_eq!(service.registered_providers(), vec!["ALIYUN".to_string()]);
        assert!(service.is_provider_available("aliyun"));
        assert!(!service.is_provider_available("TENCENT"));
    }
}
