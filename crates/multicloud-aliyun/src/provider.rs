//! Alibaba Cloud provider client.

use crate::api::{ApiError, EcsApi, InstanceRecord, RunInstancesSpec};
use crate::config::AliyunConfig;
use crate::mapper::{self, ParameterMapper};
use crate::network::NetworkProvisioner;
use async_trait::async_trait;
use chrono::Utc;
use multicloud_api::{
    CreateInstanceRequest, EcsError, PriceInfo, VirtualMachine, VmOperation, VmStatus,
};
use multicloud_core::{LifecycleClient, VmOps};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle-managed Alibaba Cloud client, ready for registration.
pub type AliyunClient = LifecycleClient<AliyunOps>;

/// Vendor hooks for Alibaba Cloud ECS.
///
/// Creation provisions the caller's network sandbox first, then runs the
/// instance, then spawns the best-effort follow-ups (elastic IP, ingress)
/// and waits for them up to the configured bound. A follow-up that fails
/// or overruns degrades the result (no public address) without failing
/// the creation.
pub struct AliyunOps {
    config: Arc<AliyunConfig>,
    api: Arc<dyn EcsApi>,
    mapper: ParameterMapper,
    network: Arc<NetworkProvisioner>,
}

impl AliyunOps {
    pub fn new(config: AliyunConfig, api: Arc<dyn EcsApi>) -> Self {
        let config = Arc::new(config);
        let network = Arc::new(NetworkProvisioner::new(
            config.provider_code.clone(),
            api.clone(),
        ));
        let mapper = ParameterMapper::new(config.clone());
        Self {
            config,
            api,
            mapper,
            network,
        }
    }

    pub fn into_client(self) -> AliyunClient {
        LifecycleClient::new(self)
    }

    pub fn config(&self) -> &AliyunConfig {
        &self.config
    }

    /// Typed classification of a vendor failure: quota stays quota, the
    /// rest becomes an operation failure keeping the vendor request id.
    fn vendor_err(&self, op: VmOperation, err: ApiError) -> anyhow::Error {
        let typed = match err {
            ApiError::QuotaExceeded(message) => EcsError::QuotaExceeded {
                provider: self.config.provider_code.clone(),
                message,
            },
            other => match other.request_id().map(str::to_string) {
                Some(id) => EcsError::operation_with_request(
                    &self.config.provider_code,
                    op,
                    other.to_string(),
                    id,
                ),
                None => EcsError::operation(&self.config.provider_code, op, other.to_string()),
            },
        };
        typed.into()
    }

    fn run_spec(
        &self,
        request: &CreateInstanceRequest,
        zone: &str,
        vswitch_id: &str,
        security_group_id: &str,
    ) -> RunInstancesSpec {
        RunInstancesSpec {
            region_id: request.region.trim().to_string(),
            zone_id: zone.to_string(),
            image_id: self.mapper.resolve_image_id(&request.image_key),
            instance_type: self
                .mapper
                .resolve_instance_type(request.instance_type.as_deref(), request.gpu_model.as_deref()),
            instance_name: request.instance_name.clone(),
            vswitch_id: vswitch_id.to_string(),
            security_group_id: security_group_id.to_string(),
            system_disk_category: request
                .system_disk_type
                .clone()
                .unwrap_or_else(|| self.config.default_system_disk_category.clone()),
            system_disk_size: if request.system_disk_size == 0 {
                self.config.default_system_disk_size
            } else {
                request.system_disk_size
            },
            instance_charge_type: mapper::instance_charge_type(request.charge_mode).to_string(),
            internet_charge_type: mapper::internet_charge_type(request.bandwidth_mode).to_string(),
            // Public addresses are bound via EIP after creation
            internet_max_bandwidth_out: 0,
            password: request.password.clone(),
            key_pair_name: request.key_pair_name.clone(),
            period: request.duration_months,
            amount: request.quantity.max(1),
            description: request.description.clone(),
            tags: request.tags.clone(),
        }
    }

    fn map_status(&self, raw: &str) -> VmStatus {
        let status = VmStatus::from_code(raw);
        if status == VmStatus::Unknown {
            tracing::warn!(
                provider = %self.config.provider_code,
                raw_status = raw,
                "unmapped vendor status"
            );
        }
        status
    }

    fn map_instance(&self, record: InstanceRecord) -> VirtualMachine {
        let mut vm = VirtualMachine::with_status(self.map_status(&record.status));
        vm.raw_status = Some(record.status);
        vm.instance_id = Some(record.instance_id);
        vm.instance_name = Some(record.instance_name);
        vm.provider = Some(self.config.provider_code.clone());
        vm.region = Some(record.region_id);
        vm.zone = Some(record.zone_id);
        vm.instance_type = Some(record.instance_type);
        vm.image_id = Some(record.image_id);
        vm.cpu = record.cpu;
        vm.memory_gb = record.memory_gb;
        vm.private_ip = record.private_ip;
        vm.public_ip = record.public_ip;
        vm.created_at = Some(record.creation_time);
        vm.expired_at = record.expired_time;
        vm.tenant_id = record.tags.get("tenantId").cloned();
        if let Some(vpc_id) = record.vpc_id {
            vm.metadata.insert("vpcId".into(), serde_json::json!(vpc_id));
        }
        if let Some(vswitch_id) = record.vswitch_id {
            vm.metadata
                .insert("vSwitchId".into(), serde_json::json!(vswitch_id));
        }
        if !record.security_group_ids.is_empty() {
            vm.metadata.insert(
                "securityGroupIds".into(),
                serde_json::json!(record.security_group_ids),
            );
        }
        vm.tags = record.tags;
        vm
    }
}

#[async_trait]
impl VmOps for AliyunOps {
    fn provider_code(&self) -> &str {
        &self.config.provider_code
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn is_available(&self) -> bool {
        self.config.enabled && self.config.has_credentials()
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    async fn calculate_price(&self, request: &CreateInstanceRequest) -> anyhow::Result<PriceInfo> {
        let zone = self.config.zone_for(&request.region, request.zone.as_deref());
        // Pricing does not depend on the network triple
        let spec = self.run_spec(request, &zone, "", "");
        let quote = self
            .api
            .describe_price(&spec)
            .await
            .map_err(|e| self.vendor_err(VmOperation::CalculatePrice, e))?;

        let mut price = PriceInfo::new(&self.config.provider_code, request.region.trim());
        price.instance_type = Some(spec.instance_type);
        price.instance_price_per_hour = quote.price_per_hour.clone();
        price.instance_price_per_month = quote.price_per_month.clone();
        price.total_price_per_hour = quote.price_per_hour;
        price.total_price_per_month = quote.price_per_month;
        price.currency = quote.currency;
        price.validity_secs = quote.validity_secs;
        price
            .metadata
            .insert("requestId".into(), serde_json::json!(quote.request_id));
        Ok(price)
    }

    async fn create(&self, request: &CreateInstanceRequest) -> anyhow::Result<VirtualMachine> {
        let region = request.region.trim().to_string();
        let zone = self.config.zone_for(&region, request.zone.as_deref());

        let net = self
            .network
            .ensure_network(&request.user_id, &region, &zone, &request.tags)
            .await?;

        let spec = self.run_spec(request, &zone, &net.vswitch_id, &net.security_group_id);
        let result = self
            .api
            .run_instances(&spec)
            .await
            .map_err(|e| self.vendor_err(VmOperation::Create, e))?;
        let instance_id = result.instance_ids.first().cloned().ok_or_else(|| {
            EcsError::operation(
                &self.config.provider_code,
                VmOperation::Create,
                "vendor accepted the request but returned no instance ids",
            )
        })?;

        let eip_task = request.allocate_public_ip.then(|| {
            let network = self.network.clone();
            let instance_id = instance_id.clone();
            let region = region.clone();
            let bandwidth = request
                .public_ip_bandwidth
                .unwrap_or(self.config.eip_bandwidth_mbps);
            tokio::spawn(async move {
                network.bind_public_ip(&instance_id, &region, bandwidth).await
            })
        });
        let ports_task = (!request.open_ports.is_empty()).then(|| {
            let network = self.network.clone();
            let security_group_id = net.security_group_id.clone();
            let region = region.clone();
            let ports = request.open_ports.clone();
            tokio::spawn(async move {
                network.open_ports(&security_group_id, &region, &ports).await
            })
        });

        let wait = Duration::from_secs(self.config.post_provision_wait_secs);
        let mut public_ip = None;
        if let Some(task) = eip_task {
            match tokio::time::timeout(wait, task).await {
                Ok(Ok(Ok(ip))) => public_ip = Some(ip),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(instance_id = %instance_id, error = %e, "public ip binding failed, continuing without")
                }
                Ok(Err(e)) => {
                    tracing::warn!(instance_id = %instance_id, error = %e, "public ip task aborted, continuing without")
                }
                Err(_) => {
                    tracing::warn!(
                        instance_id = %instance_id,
                        wait_secs = self.config.post_provision_wait_secs,
                        "public ip binding still running after wait bound, continuing without"
                    )
                }
            }
        }
        if let Some(task) = ports_task {
            match tokio::time::timeout(wait, task).await {
                Ok(Ok(open)) => {
                    tracing::debug!(instance_id = %instance_id, open, "ingress follow-up finished")
                }
                Ok(Err(e)) => {
                    tracing::warn!(instance_id = %instance_id, error = %e, "ingress task aborted")
                }
                Err(_) => {
                    tracing::warn!(instance_id = %instance_id, "ingress follow-up still running after wait bound")
                }
            }
        }

        let mut vm = VirtualMachine::with_status(VmStatus::Pending);
        vm.instance_id = Some(instance_id);
        vm.instance_name = Some(request.instance_name.clone());
        vm.provider = Some(self.config.provider_code.clone());
        vm.region = Some(region);
        vm.zone = Some(zone);
        vm.instance_type = Some(spec.instance_type.clone());
        vm.image_id = Some(spec.image_id.clone());
        vm.public_ip = public_ip;
        vm.created_at = Some(Utc::now());
        vm.tenant_id = Some(request.tenant_id.clone());
        vm.tags = request.tags.clone();
        vm.request_id = Some(result.request_id);
        vm.metadata
            .insert("vpcId".into(), serde_json::json!(net.vpc_id));
        vm.metadata
            .insert("vSwitchId".into(), serde_json::json!(net.vswitch_id));
        vm.metadata.insert(
            "securityGroupId".into(),
            serde_json::json!(net.security_group_id),
        );
        vm.metadata
            .insert("cidrBlock".into(), serde_json::json!(net.cidr_block));
        vm.metadata.insert(
            "instanceChargeType".into(),
            serde_json::json!(spec.instance_charge_type),
        );
        vm.metadata.insert(
            "internetChargeType".into(),
            serde_json::json!(spec.internet_charge_type),
        );
        Ok(vm)
    }

    async fn delete(&self, instance_id: &str) -> anyhow::Result<bool> {
        match self.api.delete_instance(instance_id).await {
            Ok(()) => Ok(true),
            Err(ApiError::NotFound) => {
                tracing::warn!(instance_id, "delete of unknown instance, reporting false");
                Ok(false)
            }
            Err(e) => Err(self.vendor_err(VmOperation::Delete, e)),
        }
    }

    async fn start(&self, instance_id: &str) -> anyhow::Result<bool> {
        match self.api.start_instance(instance_id).await {
            Ok(()) => Ok(true),
            Err(ApiError::NotFound) => Ok(false),
            Err(e) => Err(self.vendor_err(VmOperation::Start, e)),
        }
    }

    async fn stop(&self, instance_id: &str) -> anyhow::Result<bool> {
        match self.api.stop_instance(instance_id).await {
            Ok(()) => Ok(true),
            Err(ApiError::NotFound) => Ok(false),
            Err(e) => Err(self.vendor_err(VmOperation::Stop, e)),
        }
    }

    async fn restart(&self, instance_id: &str) -> anyhow::Result<bool> {
        match self.api.reboot_instance(instance_id).await {
            Ok(()) => Ok(true),
            Err(ApiError::NotFound) => Ok(false),
            Err(e) => Err(self.vendor_err(VmOperation::Restart, e)),
        }
    }

    async fn get(&self, instance_id: &str) -> anyhow::Result<Option<VirtualMachine>> {
        let record = self
            .api
            .describe_instance(instance_id)
            .await
            .map_err(|e| self.vendor_err(VmOperation::Get, e))?;
        Ok(record.map(|r| self.map_instance(r)))
    }

    async fn find_id_by_name(&self, instance_name: &str) -> anyhow::Result<Option<String>> {
        let records = self
            .api
            .describe_instances_by_name(instance_name)
            .await
            .map_err(|e| self.vendor_err(VmOperation::FindByName, e))?;
        if records.len() > 1 {
            tracing::warn!(
                instance_name,
                count = records.len(),
                "instance name is ambiguous, returning the first match"
            );
        }
        Ok(records.into_iter().next().map(|r| r.instance_id))
    }
}
