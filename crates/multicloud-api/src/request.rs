//! Normalized instance creation request.

use crate::enums::{BandwidthMode, ChargeMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_system_disk_size() -> u32 {
    40
}

fn default_quantity() -> u32 {
    1
}

/// Creation request, normalized across vendors.
///
/// Constructed by the caller, labeled once by tag injection, then consumed
/// by a single create call. Tenant id, user id, region, instance name and
/// image key must be non-blank by the time the request reaches a provider
/// client; the service facade and client lifecycle both enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    /// Provider hint. Required by the fixed scheduler; ranking schedulers
    /// may ignore it.
    #[serde(default)]
    pub provider: Option<String>,

    /// Region, e.g. `cn-hangzhou`
    pub region: String,

    /// Availability zone, e.g. `cn-hangzhou-g`. Providers fall back to a
    /// deterministic default zone when absent.
    #[serde(default)]
    pub zone: Option<String>,

    /// Tenant owning the resource, for isolation and cost attribution
    pub tenant_id: String,

    /// End user the resource is provisioned for; keys the per-user network
    /// sandbox
    pub user_id: String,

    pub instance_name: String,

    /// Vendor sizing type, e.g. `ecs.g7.large`. When absent the provider
    /// resolves one from `gpu_model` or its configured default.
    #[serde(default)]
    pub instance_type: Option<String>,

    /// Vendor-neutral image key, e.g. `centos-7.9`; providers map it to
    /// their image id
    pub image_key: String,

    /// GPU model wanted, e.g. `A100`; mapped to a vendor instance type
    #[serde(default)]
    pub gpu_model: Option<String>,

    /// Explicit sizing, used when no `instance_type` is given
    #[serde(default)]
    pub cpu: Option<u32>,
    #[serde(default)]
    pub memory_gb: Option<u32>,

    /// System disk size in GB
    #[serde(default = "default_system_disk_size")]
    pub system_disk_size: u32,

    /// Vendor disk category, e.g. `cloud_essd`
    #[serde(default)]
    pub system_disk_type: Option<String>,

    /// Whether to bind a public address after creation (best-effort)
    #[serde(default)]
    pub allocate_public_ip: bool,

    /// Inbound TCP ports to open on the instance's security group
    /// (best-effort)
    #[serde(default)]
    pub open_ports: Vec<u16>,

    /// Public bandwidth in Mbps, meaningful with `allocate_public_ip`
    #[serde(default)]
    pub public_ip_bandwidth: Option<u32>,

    #[serde(default)]
    pub bandwidth_mode: BandwidthMode,

    /// Plaintext password; the provider is responsible for secure transport
    #[serde(default)]
    pub password: Option<String>,

    /// Key pair name, alternative to `password`
    #[serde(default)]
    pub key_pair_name: Option<String>,

    #[serde(default)]
    pub charge_mode: ChargeMode,

    /// Prepaid duration in months
    #[serde(default)]
    pub duration_months: Option<u32>,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form labels. Tenant/owner/created-by markers are injected here.
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Vendor-specific extension bag, e.g. a spot strategy
    #[serde(default)]
    pub extensions: HashMap<String, serde_json::Value>,
}

impl CreateInstanceRequest {
    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        region: impl Into<String>,
        instance_name: impl Into<String>,
        image_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: None,
            region: region.into(),
            zone: None,
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            instance_name: instance_name.into(),
            instance_type: None,
            image_key: image_key.into(),
            gpu_model: None,
            cpu: None,
            memory_gb: None,
            system_disk_size: default_system_disk_size(),
            system_disk_type: None,
            allocate_public_ip: false,
            open_ports: Vec::new(),
            public_ip_bandwidth: None,
            bandwidth_mode: BandwidthMode::default(),
            password: None,
            key_pair_name: None,
            charge_mode: ChargeMode::default(),
            duration_months: None,
            quantity: default_quantity(),
            description: None,
            tags: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    pub fn with_provider(mut self, code: impl Into<String>) -> Self {
        self.provider = Some(code.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = Some(instance_type.into());
        self
    }

    pub fn with_gpu_model(mut self, gpu_model: impl Into<String>) -> Self {
        self.gpu_model = Some(gpu_model.into());
        self
    }

    pub fn with_system_disk(mut self, size_gb: u32) -> Self {
        self.system_disk_size = size_gb;
        self
    }

    pub fn with_public_ip(mut self, bandwidth_mbps: u32) -> Self {
        self.allocate_public_ip = true;
        self.public_ip_bandwidth = Some(bandwidth_mbps);
        self
    }

    pub fn with_open_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.open_ports = ports.into_iter().collect();
        self
    }

    pub fn with_charge_mode(mut self, mode: ChargeMode) -> Self {
        self.charge_mode = mode;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Typed lookup into the vendor extension bag.
    pub fn extension<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extensions
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Typed lookup with a fallback value.
    pub fn extension_or<T: serde::de::DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.extension(key).unwrap_or(default)
    }
}
