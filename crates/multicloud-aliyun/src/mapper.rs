//! Business parameters to vendor parameters.

use crate::config::AliyunConfig;
use multicloud_api::{BandwidthMode, ChargeMode};
use std::sync::Arc;

/// Vendor billing code for the instance itself.
pub fn instance_charge_type(mode: ChargeMode) -> &'static str {
    match mode {
        ChargeMode::OnDemand => "PostPaid",
        ChargeMode::Prepaid => "PrePaid",
    }
}

/// Vendor billing code for public bandwidth.
pub fn internet_charge_type(mode: BandwidthMode) -> &'static str {
    match mode {
        BandwidthMode::Traffic => "PayByTraffic",
        BandwidthMode::Fixed => "PayByBandwidth",
    }
}

/// Resolves vendor image ids and instance types from the business-level
/// request fields, using the configured alias tables.
pub struct ParameterMapper {
    config: Arc<AliyunConfig>,
}

impl ParameterMapper {
    pub fn new(config: Arc<AliyunConfig>) -> Self {
        Self { config }
    }

    /// Alias table first, then the configured default image, then the key
    /// itself (it may already be a full vendor image id).
    pub fn resolve_image_id(&self, image_key: &str) -> String {
        let key = image_key.trim();
        if let Some(image_id) = self.config.image_aliases.get(&key.to_ascii_lowercase()) {
            tracing::debug!(image_key = key, image_id, "image alias resolved");
            return image_id.clone();
        }
        if let Some(default) = self.config.default_image_id.as_deref() {
            tracing::warn!(image_key = key, default, "no image alias, using default image");
            return default.to_string();
        }
        tracing::warn!(image_key = key, "no image alias, passing key through as image id");
        key.to_string()
    }

    /// Explicit type wins, then the GPU model table, then the configured
    /// default.
    pub fn resolve_instance_type(
        &self,
        explicit: Option<&str>,
        gpu_model: Option<&str>,
    ) -> String {
        if let Some(explicit) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return explicit.to_string();
        }
        if let Some(gpu) = gpu_model.map(str::trim).filter(|g| !g.is_empty()) {
            match self.config.gpu_instance_types.get(&gpu.to_ascii_uppercase()) {
                Some(instance_type) => {
                    tracing::debug!(gpu_model = gpu, instance_type, "gpu model resolved");
                    return instance_type.clone();
                }
                None => {
                    tracing::warn!(gpu_model = gpu, "unmapped gpu model, using default type");
                }
            }
        }
        self.config.default_instance_type.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ParameterMapper {
        ParameterMapper::new(Arc::new(AliyunConfig::default()))
    }

    #[test]
    fn image_alias_lookup_is_case_insensitive() {
        let mapper = mapper();
        assert_eq!(
            mapper.resolve_image_id("CentOS-7.9"),
            "centos_7_9_x64_20G_alibase_20220824.vhd"
        );
        assert_eq!(
            mapper.resolve_image_id(" ubuntu-20.04 "),
            "ubuntu_20_04_x64_20G_alibase_20220824.vhd"
        );
    }

    #[test]
    fn unmapped_image_falls_back_to_default_then_pass_through() {
        let mut config = AliyunConfig::default();
        config.default_image_id = Some("debian_11_x64.vhd".into());
        let mapper = ParameterMapper::new(Arc::new(config));
        assert_eq!(mapper.resolve_image_id("alpine-3.18"), "debian_11_x64.vhd");

        let mapper = ParameterMapper::new(Arc::new(AliyunConfig::default()));
        assert_eq!(
            mapper.resolve_image_id("m-custom0123456789"),
            "m-custom0123456789"
        );
    }

    #[test]
    fn instance_type_resolution_order() {
        let mapper = mapper();
        assert_eq!(
            mapper.resolve_instance_type(Some("ecs.c7.xlarge"), Some("A100")),
            "ecs.c7.xlarge"
        );
        assert_eq!(
            mapper.resolve_instance_type(None, Some("a100")),
            "ecs.gn7i-c8g1.2xlarge"
        );
        assert_eq!(
            mapper.resolve_instance_type(None, Some("T4")),
            "ecs.gn6i-c4g1.xlarge"
        );
        // Unknown GPU and no explicit type: configured default
        assert_eq!(mapper.resolve_instance_type(None, Some("H100")), "ecs.g7.large");
        assert_eq!(mapper.resolve_instance_type(None, None), "ecs.g7.large");
        assert_eq!(mapper.resolve_instance_type(Some("  "), None), "ecs.g7.large");
    }

    #[test]
    fn billing_code_mapping() {
        assert_eq!(instance_charge_type(ChargeMode::OnDemand), "PostPaid");
        assert_eq!(instance_charge_type(ChargeMode::Prepaid), "PrePaid");
        assert_eq!(internet_charge_type(BandwidthMode::Traffic), "PayByTraffic");
        assert_eq!(internet_charge_type(BandwidthMode::Fixed), "PayByBandwidth");
    }
}
