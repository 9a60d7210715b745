//! Vendor API boundary.
//!
//! [`EcsApi`] is the narrow slice of the ECS/VPC surface the provider
//! actually calls, expressed over plain record types so the transport can
//! be swapped (SDK, signed HTTP, or the in-memory stand-in) without
//! touching provisioning logic.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Vendor call failure, classified structurally where the vendor response
/// allows.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The addressed resource does not exist
    #[error("resource not found")]
    NotFound,

    /// A capacity limit was hit. The message names the limited resource,
    /// e.g. `QuotaExceeded.Vpc`.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limited; safe to retry later
    #[error("throttled: {0}")]
    Throttled(String),

    /// Any other vendor error, with the vendor's own code
    #[error("vendor error {code}: {message}")]
    Api {
        code: String,
        message: String,
        request_id: Option<String>,
    },
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled(_))
    }

    /// Whether this is the vendor's duplicate-ingress-rule rejection,
    /// which idempotent port opening treats as success.
    pub fn is_duplicate_rule(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code.contains("Duplicate"))
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct VpcRecord {
    pub vpc_id: String,
    pub region_id: String,
    pub cidr_block: String,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct VswitchRecord {
    pub vswitch_id: String,
    pub vpc_id: String,
    pub zone_id: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone)]
pub struct SecurityGroupRecord {
    pub security_group_id: String,
    pub vpc_id: String,
    pub tags: HashMap<String, String>,
}

/// Raw instance view as the vendor reports it. `status` keeps the vendor
/// vocabulary (`Running`, `Stopped`, ...); normalization happens in the
/// provider.
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub instance_name: String,
    pub status: String,
    pub region_id: String,
    pub zone_id: String,
    pub instance_type: String,
    pub image_id: String,
    pub cpu: Option<u32>,
    pub memory_gb: Option<u32>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub vpc_id: Option<String>,
    pub vswitch_id: Option<String>,
    pub security_group_ids: Vec<String>,
    pub creation_time: DateTime<Utc>,
    pub expired_time: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
}

/// Fully-mapped creation parameters for one `RunInstances` call.
#[derive(Debug, Clone)]
pub struct RunInstancesSpec {
    pub region_id: String,
    pub zone_id: String,
    pub image_id: String,
    pub instance_type: String,
    pub instance_name: String,
    pub vswitch_id: String,
    pub security_group_id: String,
    pub system_disk_category: String,
    pub system_disk_size: u32,
    /// `PostPaid` or `PrePaid`
    pub instance_charge_type: String,
    /// `PayByTraffic` or `PayByBandwidth`
    pub internet_charge_type: String,
    /// 0 means no public address assigned at creation
    pub internet_max_bandwidth_out: u32,
    pub password: Option<String>,
    pub key_pair_name: Option<String>,
    /// Prepaid duration in months
    pub period: Option<u32>,
    pub amount: u32,
    pub description: Option<String>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RunInstancesResult {
    pub instance_ids: Vec<String>,
    pub request_id: String,
}

#[derive(Debug, Clone)]
pub struct EipResult {
    pub eip_address: String,
    pub allocation_id: String,
}

#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub price_per_hour: Option<BigDecimal>,
    pub price_per_month: Option<BigDecimal>,
    pub currency: String,
    pub validity_secs: Option<u64>,
    pub request_id: String,
}

/// The ECS/VPC calls the provider depends on.
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// VPCs in a region carrying the given `Owner` tag value.
    async fn describe_vpcs(&self, region_id: &str, owner_id: &str) -> ApiResult<Vec<VpcRecord>>;

    async fn create_vpc(
        &self,
        region_id: &str,
        cidr_block: &str,
        tags: &HashMap<String, String>,
    ) -> ApiResult<VpcRecord>;

    /// Vswitches of a VPC in one zone.
    async fn describe_vswitches(
        &self,
        vpc_id: &str,
        zone_id: &str,
    ) -> ApiResult<Vec<VswitchRecord>>;

    async fn create_vswitch(
        &self,
        vpc_id: &str,
        zone_id: &str,
        cidr_block: &str,
    ) -> ApiResult<VswitchRecord>;

    /// Security groups of a VPC carrying the given `Owner` tag value.
    async fn describe_security_groups(
        &self,
        vpc_id: &str,
        owner_id: &str,
    ) -> ApiResult<Vec<SecurityGroupRecord>>;

    async fn create_security_group(
        &self,
        vpc_id: &str,
        region_id: &str,
        tags: &HashMap<String, String>,
    ) -> ApiResult<SecurityGroupRecord>;

    /// Open one inbound TCP port to 0.0.0.0/0.
    async fn authorize_ingress(
        &self,
        security_group_id: &str,
        region_id: &str,
        port: u16,
    ) -> ApiResult<()>;

    /// Allocate an elastic IP and bind it to the instance in one step.
    async fn allocate_and_associate_eip(
        &self,
        instance_id: &str,
        region_id: &str,
        bandwidth_mbps: u32,
    ) -> ApiResult<EipResult>;

    async fn run_instances(&self, spec: &RunInstancesSpec) -> ApiResult<RunInstancesResult>;

    async fn describe_instance(&self, instance_id: &str) -> ApiResult<Option<InstanceRecord>>;

    async fn describe_instances_by_name(
        &self,
        instance_name: &str,
    ) -> ApiResult<Vec<InstanceRecord>>;

    async fn start_instance(&self, instance_id: &str) -> ApiResult<()>;

    async fn stop_instance(&self, instance_id: &str) -> ApiResult<()>;

    async fn reboot_instance(&self, instance_id: &str) -> ApiResult<()>;

    async fn delete_instance(&self, instance_id: &str) -> ApiResult<()>;

    async fn describe_price(&self, spec: &RunInstancesSpec) -> ApiResult<PriceQuote>;
}
