//! Provider settings and built-in defaults.

use serde::Deserialize;
use std::collections::HashMap;

fn default_provider_code() -> String {
    "ALIYUN".to_string()
}

fn default_provider_name() -> String {
    "Alibaba Cloud".to_string()
}

fn default_region_id() -> String {
    "cn-hangzhou".to_string()
}

fn default_instance_type() -> String {
    "ecs.g7.large".to_string()
}

fn default_system_disk_category() -> String {
    "cloud_essd".to_string()
}

fn default_system_disk_size() -> u32 {
    40
}

fn default_eip_bandwidth() -> u32 {
    10
}

fn default_priority() -> i32 {
    100
}

fn default_post_provision_wait_secs() -> u64 {
    30
}

/// Business image keys shipped with a built-in vendor mapping.
fn default_image_aliases() -> HashMap<String, String> {
    HashMap::from([
        (
            "centos-7.9".to_string(),
            "centos_7_9_x64_20G_alibase_20220824.vhd".to_string(),
        ),
        (
            "ubuntu-20.04".to_string(),
            "ubuntu_20_04_x64_20G_alibase_20220824.vhd".to_string(),
        ),
        (
            "pytorch-1.12".to_string(),
            "pytorch_1_12_cuda11_3_ubuntu20_04".to_string(),
        ),
        (
            "tensorflow-2.8".to_string(),
            "tensorflow_2_8_cuda11_2_ubuntu20_04".to_string(),
        ),
    ])
}

/// GPU models shipped with a built-in instance type mapping.
fn default_gpu_instance_types() -> HashMap<String, String> {
    HashMap::from([
        ("A100".to_string(), "ecs.gn7i-c8g1.2xlarge".to_string()),
        ("V100".to_string(), "ecs.gn6i-c4g1.xlarge".to_string()),
        ("T4".to_string(), "ecs.gn6i-c4g1.xlarge".to_string()),
    ])
}

/// Deployment-time settings for the Alibaba Cloud client.
///
/// Everything has a default so a config source only needs to override what
/// differs; credentials and `enabled` are the only fields a real
/// deployment must set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AliyunConfig {
    pub enabled: bool,
    pub provider_code: String,
    pub provider_name: String,

    /// Default region, e.g. `cn-hangzhou`
    pub region_id: String,

    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,

    /// Fallback image when a key has no alias mapping
    pub default_image_id: Option<String>,
    pub default_instance_type: String,
    /// `cloud_efficiency`, `cloud_ssd` or `cloud_essd`
    pub default_system_disk_category: String,
    pub default_system_disk_size: u32,

    /// Bandwidth for allocated elastic IPs when the request names none
    pub eip_bandwidth_mbps: u32,

    /// Scheduler preference, lower wins
    pub priority: i32,

    /// Upper bound on waiting for post-creation follow-ups (EIP binding,
    /// port opening) before degrading
    pub post_provision_wait_secs: u64,

    /// Zone used when a request names none; falls back to `{region}-a`
    pub default_zone: Option<String>,

    pub image_aliases: HashMap<String, String>,
    pub gpu_instance_types: HashMap<String, String>,
}

impl Default for AliyunConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_code: default_provider_code(),
            provider_name: default_provider_name(),
            region_id: default_region_id(),
            access_key_id: None,
            access_key_secret: None,
            default_image_id: None,
            default_instance_type: default_instance_type(),
            default_system_disk_category: default_system_disk_category(),
            default_system_disk_size: default_system_disk_size(),
            eip_bandwidth_mbps: default_eip_bandwidth(),
            priority: default_priority(),
            post_provision_wait_secs: default_post_provision_wait_secs(),
            default_zone: None,
            image_aliases: default_image_aliases(),
            gpu_instance_types: default_gpu_instance_types(),
        }
    }
}

impl AliyunConfig {
    pub fn has_credentials(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.access_key_id) && set(&self.access_key_secret)
    }

    /// Zone to place resources in: request > configured default >
    /// `{region}-a`.
    pub fn zone_for(&self, region: &str, requested: Option<&str>) -> String {
        if let Some(zone) = requested.map(str::trim).filter(|z| !z.is_empty()) {
            return zone.to_string();
        }
        if let Some(zone) = self.default_zone.as_deref() {
            return zone.to_string();
        }
        format!("{region}-a")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_values() {
        let config = AliyunConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.provider_code, "ALIYUN");
        assert_eq!(config.region_id, "cn-hangzhou");
        assert_eq!(config.default_system_disk_category, "cloud_essd");
        assert_eq!(config.default_system_disk_size, 40);
        assert_eq!(config.eip_bandwidth_mbps, 10);
        assert_eq!(config.priority, 100);
        assert_eq!(config.post_provision_wait_secs, 30);
        assert_eq!(
            config.image_aliases.get("centos-7.9").map(String::as_str),
            Some("centos_7_9_x64_20G_alibase_20220824.vhd")
        );
        assert_eq!(
            config.gpu_instance_types.get("A100").map(String::as_str),
            Some("ecs.gn7i-c8g1.2xlarge")
        );
    }

    #[test]
    fn credentials_require_both_keys_non_blank() {
        let mut config = AliyunConfig::default();
        assert!(!config.has_credentials());
        config.access_key_id = Some("ak".into());
        assert!(!config.has_credentials());
        config.access_key_secret = Some("  ".into());
        assert!(!config.has_credentials());
        config.access_key_secret = Some("sk".into());
        assert!(config.has_credentials());
    }

    #[test]
    fn zone_resolution_order() {
        let mut config = AliyunConfig::default();
        assert_eq!(config.zone_for("cn-shanghai", None), "cn-shanghai-a");
        assert_eq!(
            config.zone_for("cn-shanghai", Some(" cn-shanghai-g ")),
            "cn-shanghai-g"
        );

        config.default_zone = Some("cn-hangzhou-k".into());
        assert_eq!(config.zone_for("cn-hangzhou", None), "cn-hangzhou-k");
        assert_eq!(config.zone_for("cn-hangzhou", Some("")), "cn-hangzhou-k");
    }

    #[test]
    fn deserializes_partial_overrides() {
        let config: AliyunConfig = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "access-key-id": "ak",
            "access-key-secret": "sk",
            "region-id": "cn-beijing",
        }))
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.region_id, "cn-beijing");
        // Untouched fields keep their defaults
        assert_eq!(config.default_instance_type, "ecs.g7.large");
    }
}
