//! Dispatch and provisioning core for multicloud.
//!
//! Orchestration layer between callers and the per-vendor provider crates:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │              MultiCloudService                 │
//! │   validate → tag → schedule → delegate         │
//! └──────┬──────────────────┬──────────────────────┘
//!        │                  │
//! ┌──────▼───────┐  ┌───────▼────────┐
//! │  Scheduler   │  │ ClientRegistry │
//! │ (FixedSched) │  │ code → client  │
//! └──────────────┘  └───────┬────────┘
//!                           │
//!                  ┌────────▼─────────┐
//!                  │ LifecycleClient  │  per-vendor VmOps hooks
//!                  └──────────────────┘
//! ```
//!
//! The registry is an explicit instance constructed at process start and
//! passed by handle to the scheduler and facade; there is no ambient
//! global state.

pub mod client;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod tags;

pub use client::{LifecycleClient, VmOps};
pub use registry::ClientRegistry;
pub use scheduler::FixedScheduler;
pub use service::MultiCloudService;
