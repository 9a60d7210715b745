//! Vendor-neutral contracts for the multicloud VM provisioning plane.
//!
//! This crate defines the normalized data model (requests, VM snapshots,
//! price quotes), the unified error type, and the two capability traits
//! every deployment wires together:
//!
//! - [`CloudVmClient`]: one implementation per cloud vendor, executing the
//!   normalized operations against that vendor's API.
//! - [`Scheduler`]: picks exactly one client for a creation request.
//!
//! Vendor differences (status vocabulary, billing modes, networking
//! prerequisites) are normalized away here; provider crates only map
//! between this model and their SDK.

pub mod client;
pub mod enums;
pub mod error;
pub mod request;
pub mod scheduler;
pub mod vm;

pub use client::CloudVmClient;
pub use enums::{BandwidthMode, ChargeMode, ProviderKind, VmStatus};
pub use error::{EcsError, Result, VmOperation};
pub use request::CreateInstanceRequest;
pub use scheduler::Scheduler;
pub use vm::{PriceInfo, VirtualMachine};
