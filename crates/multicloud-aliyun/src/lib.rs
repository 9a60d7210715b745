//! Alibaba Cloud ECS provider client.
//!
//! The crate is split along the vendor boundary:
//!
//! - [`api`] — the narrow surface of ECS/VPC calls the provider needs,
//!   behind the [`api::EcsApi`] trait so transports can be swapped
//! - [`mock`] — in-memory [`api::EcsApi`] stand-in, also the test double
//! - [`config`] — deployment-time settings and built-in defaults
//! - [`mapper`] — business parameters to vendor parameters
//! - [`network`] — per-user VPC/vswitch/security-group provisioning
//! - [`provider`] — [`provider::AliyunOps`] wiring it all into a
//!   lifecycle-managed client
//!
//! ```no_run
//! use multicloud_aliyun::{AliyunConfig, AliyunOps, mock::MockEcsApi};
//! use std::sync::Arc;
//!
//! let config = AliyunConfig {
//!     enabled: true,
//!     access_key_id: Some("ak".into()),
//!     access_key_secret: Some("sk".into()),
//!     ..AliyunConfig::default()
//! };
//! let client = AliyunOps::new(config, Arc::new(MockEcsApi::new())).into_client();
//! ```

pub mod api;
pub mod config;
pub mod mapper;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod network;
pub mod provider;

pub use config::AliyunConfig;
pub use network::{NetworkProvisioner, NetworkResources};
pub use provider::{AliyunClient, AliyunOps};
