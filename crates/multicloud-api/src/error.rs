//! Unified error type for all provisioning operations.

use thiserror::Error;

/// The normalized operations a provider client executes. Used to tag
/// operation failures with a stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmOperation {
    CalculatePrice,
    Create,
    Delete,
    Start,
    Stop,
    Restart,
    Get,
    FindByName,
    ProvisionNetwork,
}

impl VmOperation {
    /// Stable `<OPERATION>_FAILED` code attached to wrapped failures.
    pub fn failure_code(&self) -> &'static str {
        match self {
            Self::CalculatePrice => "CALCULATE_PRICE_FAILED",
            Self::Create => "CREATE_FAILED",
            Self::Delete => "DELETE_FAILED",
            Self::Start => "START_FAILED",
            Self::Stop => "STOP_FAILED",
            Self::Restart => "RESTART_FAILED",
            Self::Get => "GET_INSTANCE_FAILED",
            Self::FindByName => "FIND_INSTANCE_FAILED",
            Self::ProvisionNetwork => "NETWORK_CREATE_FAILED",
        }
    }

    /// Human verb for log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::CalculatePrice => "calculate price",
            Self::Create => "create instance",
            Self::Delete => "delete instance",
            Self::Start => "start instance",
            Self::Stop => "stop instance",
            Self::Restart => "restart instance",
            Self::Get => "get instance",
            Self::FindByName => "find instance by name",
            Self::ProvisionNetwork => "provision network",
        }
    }
}

impl std::fmt::Display for VmOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// Unified provisioning error.
///
/// Validation and scheduling failures are always raised locally, before any
/// vendor call. Vendor operation failures carry the provider code and, where
/// the vendor supplied one, a correlation id.
#[derive(Debug, Error)]
pub enum EcsError {
    /// A required request field was missing or blank. `code` is the
    /// field-specific code, e.g. `TENANT_ID_REQUIRED`.
    #[error("validation failed ({code}): {message}")]
    Validation { code: &'static str, message: String },

    /// The active scheduler demands an explicit provider code and the
    /// request carried none.
    #[error("scheduler {scheduler} requires an explicit provider code")]
    ProviderRequired { scheduler: String },

    /// No client registered under this code. The message enumerates the
    /// registered codes to aid diagnosis.
    #[error("provider not registered: {code} (registered: [{}])", registered.join(", "))]
    ProviderNotFound {
        code: String,
        registered: Vec<String>,
    },

    /// The client exists but reports itself unavailable.
    #[error("provider not available: {code}")]
    ProviderUnavailable { code: String },

    /// A vendor operation failed. Already-typed vendor errors are never
    /// re-wrapped into this variant.
    #[error("[{provider}] failed to {op}: {message}")]
    Operation {
        provider: String,
        op: VmOperation,
        message: String,
        request_id: Option<String>,
    },

    /// A vendor capacity limit was hit. Classified structurally where the
    /// vendor API allows, by message heuristics otherwise.
    #[error("[{provider}] quota exceeded: {message}")]
    QuotaExceeded { provider: String, message: String },

    /// The provider client has not wired up this capability.
    #[error("[{provider}] {capability} not implemented")]
    NotImplemented {
        provider: String,
        capability: &'static str,
    },
}

impl EcsError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn operation(
        provider: impl Into<String>,
        op: VmOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::Operation {
            provider: provider.into(),
            op,
            message: message.into(),
            request_id: None,
        }
    }

    pub fn operation_with_request(
        provider: impl Into<String>,
        op: VmOperation,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self::Operation {
            provider: provider.into(),
            op,
            message: message.into(),
            request_id: Some(request_id.into()),
        }
    }

    pub fn not_implemented(provider: impl Into<String>, capability: &'static str) -> Self {
        Self::NotImplemented {
            provider: provider.into(),
            capability,
        }
    }

    /// Stable error code for this failure class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } => code,
            Self::ProviderRequired { .. } => "PROVIDER_REQUIRED",
            Self::ProviderNotFound { .. } => "PROVIDER_NOT_FOUND",
            Self::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            Self::Operation { op, .. } => op.failure_code(),
            Self::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            Self::NotImplemented { .. } => "NOT_IMPLEMENTED",
        }
    }

    /// Provider code this failure originated from, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Operation { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::NotImplemented { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Vendor correlation id, if the vendor supplied one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Operation { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Whether this failure is a vendor capacity limit.
    ///
    /// Besides the typed variant, this also matches the `QuotaExceeded`
    /// marker in raw vendor messages. Vendor error vocabularies drift, so
    /// the substring match is a best-effort heuristic; provider crates
    /// classify structurally where their API allows.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            Self::QuotaExceeded { .. } => true,
            Self::Operation { message, .. } => message.contains("QuotaExceeded"),
            _ => false,
        }
    }

    /// Quota failure specifically on network infrastructure
    /// (VPC / vswitch / security group).
    pub fn is_network_quota_exceeded(&self) -> bool {
        if !self.is_quota_exceeded() {
            return false;
        }
        let message = match self {
            Self::QuotaExceeded { message, .. } | Self::Operation { message, .. } => message,
            _ => return false,
        };
        message.contains("Vpc") || message.contains("VSwitch") || message.contains("SecurityGroup")
    }
}

pub type Result<T> = std::result::Result<T, EcsError>;
