//! Per-user network provisioning.
//!
//! Every end user gets an isolated VPC / vswitch / security-group triple,
//! created on first use and found by the `Owner` tag afterwards. Callers
//! never pass network ids; the provisioner resolves or creates them as a
//! side effect of instance creation.

use crate::api::{ApiError, EcsApi};
use multicloud_api::{EcsError, Result, VmOperation};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The resolved per-user network triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResources {
    pub vpc_id: String,
    pub vswitch_id: String,
    pub security_group_id: String,
    pub cidr_block: String,
}

/// Stable FNV-1a over the owner id. `String::hash` is not guaranteed
/// stable across releases, and CIDR assignment must survive upgrades.
fn fnv1a(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Deterministic /24 block inside 172.16.0.0/12 for one owner.
///
/// 4096 distinct blocks; collisions between owners are possible but only
/// cost shared address space, never cross-tenant access (isolation comes
/// from the per-owner VPC, not the block).
pub fn derive_cidr(owner_id: &str) -> String {
    let idx = fnv1a(owner_id) % 4096;
    format!("172.{}.{}.0/24", 16 + idx / 256, idx % 256)
}

/// The vswitch takes the lower half of the VPC block.
fn vswitch_cidr(vpc_cidr: &str) -> String {
    match vpc_cidr.strip_suffix("/24") {
        Some(prefix) => format!("{prefix}/25"),
        None => vpc_cidr.to_string(),
    }
}

/// Resolves or creates the per-user network triple, and runs the
/// best-effort follow-ups (elastic IP binding, port opening).
pub struct NetworkProvisioner {
    provider_code: String,
    api: Arc<dyn EcsApi>,
    /// One async lock per (owner, region): two concurrent first creations
    /// by the same owner must not each build a VPC.
    locks: Mutex<HashMap<(String, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl NetworkProvisioner {
    pub fn new(provider_code: impl Into<String>, api: Arc<dyn EcsApi>) -> Self {
        Self {
            provider_code: provider_code.into(),
            api,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn owner_lock(&self, owner_id: &str, region: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .expect("provisioner lock map poisoned")
            .entry((owner_id.to_string(), region.to_string()))
            .or_default()
            .clone()
    }

    fn classify(&self, err: ApiError, resource: &str) -> EcsError {
        match err {
            ApiError::QuotaExceeded(message) => EcsError::QuotaExceeded {
                provider: self.provider_code.clone(),
                message: format!("{resource}: {message}"),
            },
            other => {
                let request_id = other.request_id().map(str::to_string);
                let message = format!("{resource}: {other}");
                match request_id {
                    Some(id) => EcsError::operation_with_request(
                        &self.provider_code,
                        VmOperation::ProvisionNetwork,
                        message,
                        id,
                    ),
                    None => EcsError::operation(
                        &self.provider_code,
                        VmOperation::ProvisionNetwork,
                        message,
                    ),
                }
            }
        }
    }

    /// Find or create the owner's network triple in one region/zone.
    ///
    /// Idempotent: a second call for the same owner and region resolves the
    /// existing triple without creating anything. `tags` are stamped onto
    /// every resource this call creates.
    pub async fn ensure_network(
        &self,
        owner_id: &str,
        region: &str,
        zone: &str,
        tags: &HashMap<String, String>,
    ) -> Result<NetworkResources> {
        let lock = self.owner_lock(owner_id, region);
        let _guard = lock.lock().await;

        let existing = self
            .api
            .describe_vpcs(region, owner_id)
            .await
            .map_err(|e| self.classify(e, "Vpc"))?;

        let vpc = match existing.into_iter().next() {
            Some(vpc) => {
                tracing::debug!(owner_id, region, vpc_id = %vpc.vpc_id, "reusing owner vpc");
                vpc
            }
            None => {
                let cidr = derive_cidr(owner_id);
                let vpc = self
                    .api
                    .create_vpc(region, &cidr, tags)
                    .await
                    .map_err(|e| self.classify(e, "Vpc"))?;
                tracing::info!(
                    owner_id,
                    region,
                    vpc_id = %vpc.vpc_id,
                    cidr = %vpc.cidr_block,
                    "created owner vpc"
                );
                vpc
            }
        };

        let vswitches = self
            .api
            .describe_vswitches(&vpc.vpc_id, zone)
            .await
            .map_err(|e| self.classify(e, "VSwitch"))?;
        let vswitch = match vswitches.into_iter().next() {
            Some(vswitch) => vswitch,
            None => {
                let cidr = vswitch_cidr(&vpc.cidr_block);
                let vswitch = self
                    .api
                    .create_vswitch(&vpc.vpc_id, zone, &cidr)
                    .await
                    .map_err(|e| self.classify(e, "VSwitch"))?;
                tracing::info!(
                    owner_id,
                    zone,
                    vswitch_id = %vswitch.vswitch_id,
                    cidr = %vswitch.cidr_block,
                    "created owner vswitch"
                );
                vswitch
            }
        };

        let groups = self
            .api
            .describe_security_groups(&vpc.vpc_id, owner_id)
            .await
            .map_err(|e| self.classify(e, "SecurityGroup"))?;
        let group = match groups.into_iter().next() {
            Some(group) => group,
            None => {
                let group = self
                    .api
                    .create_security_group(&vpc.vpc_id, region, tags)
                    .await
                    .map_err(|e| self.classify(e, "SecurityGroup"))?;
                tracing::info!(
                    owner_id,
                    region,
                    security_group_id = %group.security_group_id,
                    "created owner security group"
                );
                group
            }
        };

        Ok(NetworkResources {
            vpc_id: vpc.vpc_id,
            vswitch_id: vswitch.vswitch_id,
            security_group_id: group.security_group_id,
            cidr_block: vpc.cidr_block,
        })
    }

    /// Best-effort elastic IP binding, returning the bound address.
    pub async fn bind_public_ip(
        &self,
        instance_id: &str,
        region: &str,
        bandwidth_mbps: u32,
    ) -> anyhow::Result<String> {
        let eip = self
            .api
            .allocate_and_associate_eip(instance_id, region, bandwidth_mbps)
            .await?;
        tracing::info!(
            instance_id,
            eip = %eip.eip_address,
            allocation_id = %eip.allocation_id,
            bandwidth_mbps,
            "elastic ip bound"
        );
        Ok(eip.eip_address)
    }

    /// Best-effort ingress opening. Duplicate rules count as open; other
    /// per-port failures are logged and skipped. Returns how many ports
    /// ended up open.
    pub async fn open_ports(
        &self,
        security_group_id: &str,
        region: &str,
        ports: &[u16],
    ) -> usize {
        let mut open = 0;
        for &port in ports {
            match self.api.authorize_ingress(security_group_id, region, port).await {
                Ok(()) => {
                    tracing::debug!(security_group_id, port, "ingress opened");
                    open += 1;
                }
                Err(e) if e.is_duplicate_rule() => {
                    tracing::debug!(security_group_id, port, "ingress already open");
                    open += 1;
                }
                Err(e) => {
                    tracing::warn!(security_group_id, port, error = %e, "ingress failed, skipping");
                }
            }
        }
        open
    }
}
