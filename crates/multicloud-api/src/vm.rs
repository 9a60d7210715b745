//! VM snapshots and price quotes.

use crate::enums::VmStatus;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time view of a vendor instance, normalized.
///
/// Snapshots are never mutated after being returned; re-querying produces a
/// new one. `error_message` is only ever set together with
/// [`VmStatus::Error`] — use [`VirtualMachine::error`] to build failure
/// snapshots so the invariant holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Vendor instance id
    pub instance_id: Option<String>,
    pub instance_name: Option<String>,
    pub status: VmStatus,
    /// Vendor's raw status string, for diagnostics only
    pub raw_status: Option<String>,
    /// Provider code; back-filled by the service facade when a client
    /// omits it
    pub provider: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub instance_type: Option<String>,
    /// Resolved vendor image id
    pub image_id: Option<String>,
    pub cpu: Option<u32>,
    pub memory_gb: Option<u32>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Expiry for prepaid instances
    pub expired_at: Option<DateTime<Utc>>,
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Vendor-specific details: vpcId, vSwitchId, securityGroupId, ...
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Failure detail; present implies `status == Error`
    pub error_message: Option<String>,
    /// Vendor correlation id
    pub request_id: Option<String>,
    /// Vendor async task id, when the operation continues server-side
    pub task_id: Option<String>,
}

impl VirtualMachine {
    /// Empty snapshot in the given status.
    pub fn with_status(status: VmStatus) -> Self {
        Self {
            instance_id: None,
            instance_name: None,
            status,
            raw_status: None,
            provider: None,
            region: None,
            zone: None,
            instance_type: None,
            image_id: None,
            cpu: None,
            memory_gb: None,
            private_ip: None,
            public_ip: None,
            created_at: None,
            expired_at: None,
            tenant_id: None,
            tags: HashMap::new(),
            metadata: HashMap::new(),
            error_message: None,
            request_id: None,
            task_id: None,
        }
    }

    /// Failure snapshot; forces `status == Error` so the error invariant
    /// cannot be violated.
    pub fn error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        let mut vm = Self::with_status(VmStatus::Error);
        vm.provider = Some(provider.into());
        vm.error_message = Some(message.into());
        vm
    }

    /// Failure snapshot carrying the vendor correlation id.
    pub fn error_with_request(
        provider: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        let mut vm = Self::error(provider, message);
        vm.request_id = Some(request_id.into());
        vm
    }

    pub fn is_success(&self) -> bool {
        self.status != VmStatus::Error && self.error_message.is_none()
    }

    pub fn is_final_state(&self) -> bool {
        self.status.is_final()
    }

    pub fn is_running(&self) -> bool {
        self.status == VmStatus::Running
    }

    /// Typed lookup into the vendor metadata bag.
    pub fn metadata<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Price quote for one creation request.
///
/// Quotes carry no identity and are never cached by the core; every call
/// computes a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceInfo {
    pub provider: String,
    pub region: String,
    pub instance_type: Option<String>,

    /// Compute unit price per hour
    pub instance_price_per_hour: Option<BigDecimal>,
    /// Compute unit price per month, prepaid mode only
    pub instance_price_per_month: Option<BigDecimal>,
    /// System disk price per GB per month
    pub disk_price_per_gb_month: Option<BigDecimal>,
    /// Fixed bandwidth price per Mbps per month
    pub bandwidth_price_per_mbps_month: Option<BigDecimal>,
    /// Traffic price per GB, traffic billing only
    pub traffic_price_per_gb: Option<BigDecimal>,

    /// Aggregate across compute, disk and bandwidth
    pub total_price_per_hour: Option<BigDecimal>,
    pub total_price_per_month: Option<BigDecimal>,

    pub currency: String,
    pub queried_at: DateTime<Utc>,
    /// How long the vendor considers the quote valid
    pub validity_secs: Option<u64>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PriceInfo {
    pub fn new(provider: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            region: region.into(),
            instance_type: None,
            instance_price_per_hour: None,
            instance_price_per_month: None,
            disk_price_per_gb_month: None,
            bandwidth_price_per_mbps_month: None,
            traffic_price_per_gb: None,
            total_price_per_hour: None,
            total_price_per_month: None,
            currency: "CNY".to_string(),
            queried_at: Utc::now(),
            validity_secs: None,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_constructor_forces_error_status() {
        let vm = VirtualMachine::error("ALIYUN", "quota exceeded");
        assert_eq!(vm.status, VmStatus::Error);
        assert_eq!(vm.error_message.as_deref(), Some("quota exceeded"));
        assert!(!vm.is_success());
        assert!(vm.is_final_state());
    }

    #[test]
    fn error_status_without_message_is_allowed() {
        // Vendors can report a terminal error without detail text.
        let vm = VirtualMachine::with_status(VmStatus::Error);
        assert!(vm.error_message.is_none());
        assert!(!vm.is_success());
    }

    #[test]
    fn pending_snapshot_is_success_but_not_final() {
        let vm = VirtualMachine::with_status(VmStatus::Pending);
        assert!(vm.is_success());
        assert!(!vm.is_final_state());
        assert!(!vm.is_running());
    }

    #[test]
    fn metadata_typed_access() {
        let mut vm = VirtualMachine::with_status(VmStatus::Pending);
        vm.metadata
            .insert("vpcId".into(), serde_json::json!("vpc-123"));
        assert_eq!(vm.metadata::<String>("vpcId").as_deref(), Some("vpc-123"));
        assert_eq!(vm.metadata::<String>("subnetId"), None);
    }

    #[test]
    fn price_defaults_to_cny() {
        let price = PriceInfo::new("ALIYUN", "cn-hangzhou");
        assert_eq!(price.currency, "CNY");
        assert!(price.total_price_per_hour.is_none());
    }
}
