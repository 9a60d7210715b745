//! Normalized enums shared across all providers.

use serde::{Deserialize, Serialize};

/// Normalized VM lifecycle status.
///
/// Providers map their raw status vocabulary onto this enum; the raw string
/// is kept separately on [`crate::VirtualMachine`] for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmStatus {
    /// Creation accepted, instance not yet running
    Pending,
    /// Boot in progress
    Starting,
    /// Up and serving
    Running,
    /// Shutdown in progress
    Stopping,
    /// Shut down, still provisioned
    Stopped,
    /// Reboot in progress
    Rebooting,
    /// Teardown in progress
    Deleting,
    /// Gone
    Deleted,
    /// Vendor reported a failure
    Error,
    /// Unmapped vendor status
    Unknown,
}

impl VmStatus {
    /// Parse a status code case-insensitively. Unrecognized input maps to
    /// [`VmStatus::Unknown`] rather than failing.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "REBOOTING" => Self::Rebooting,
            "DELETING" => Self::Deleting,
            "DELETED" => Self::Deleted,
            "ERROR" => Self::Error,
            _ => Self::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Rebooting => "REBOOTING",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Terminal for vendor-driven transitions: the status will not change
    /// again without caller action.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Running | Self::Stopped | Self::Deleted | Self::Error
        )
    }

    /// Start/stop/restart are only accepted in these states.
    pub fn is_operable(&self) -> bool {
        matches!(self, Self::Running | Self::Stopped)
    }
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Known cloud vendors.
///
/// The registry itself is keyed by free-form codes so new vendors can be
/// plugged in without touching this crate; this enum covers the codes the
/// platform ships mappings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    Aliyun,
    Tencent,
    Huawei,
    Aws,
    /// China Mobile cloud, Suzhou
    Scc,
    MobileCloud,
}

impl ProviderKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ALIYUN" => Some(Self::Aliyun),
            "TENCENT" => Some(Self::Tencent),
            "HUAWEI" => Some(Self::Huawei),
            "AWS" => Some(Self::Aws),
            "SCC" => Some(Self::Scc),
            "MOBILECLOUD" => Some(Self::MobileCloud),
            _ => None,
        }
    }

    pub fn is_valid_code(code: &str) -> bool {
        Self::from_code(code).is_some()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Aliyun => "ALIYUN",
            Self::Tencent => "TENCENT",
            Self::Huawei => "HUAWEI",
            Self::Aws => "AWS",
            Self::Scc => "SCC",
            Self::MobileCloud => "MOBILECLOUD",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aliyun => "Alibaba Cloud",
            Self::Tencent => "Tencent Cloud",
            Self::Huawei => "Huawei Cloud",
            Self::Aws => "Amazon Web Services",
            Self::Scc => "China Mobile Cloud (Suzhou)",
            Self::MobileCloud => "China Mobile Cloud",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// How public bandwidth is billed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandwidthMode {
    /// Pay per transferred GB
    Traffic,
    /// Pay for a fixed bandwidth cap
    #[default]
    Fixed,
}

impl BandwidthMode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "TRAFFIC" => Some(Self::Traffic),
            "FIXED" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// How the instance itself is billed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeMode {
    /// Hourly/per-second metering, pay as you go
    #[default]
    OnDemand,
    /// Paid up front for a fixed duration in months
    Prepaid,
}

impl ChargeMode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ON_DEMAND" => Some(Self::OnDemand),
            "PREPAID" => Some(Self::Prepaid),
            _ => None,
        }
    }
}
