//! In-memory [`EcsApi`] stand-in.
//!
//! Serves two purposes: the test double for provider and provisioner
//! tests, and the transport used until the real SDK integration lands.
//! State lives behind a std `Mutex` which is never held across an await;
//! fault knobs simulate the vendor failures the provider must tolerate.

use crate::api::{
    ApiError, ApiResult, EcsApi, EipResult, InstanceRecord, PriceQuote, RunInstancesResult,
    RunInstancesSpec, SecurityGroupRecord, VpcRecord, VswitchRecord,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
struct State {
    vpcs: Vec<VpcRecord>,
    vswitches: Vec<VswitchRecord>,
    security_groups: Vec<SecurityGroupRecord>,
    instances: HashMap<String, InstanceRecord>,
    authorized: HashSet<(String, u16)>,
}

/// In-memory vendor API with per-resource creation counters and fault
/// injection knobs.
#[derive(Default)]
pub struct MockEcsApi {
    state: Mutex<State>,
    seq: AtomicU64,

    vpcs_created: AtomicUsize,
    vswitches_created: AtomicUsize,
    security_groups_created: AtomicUsize,
    instances_created: AtomicUsize,
    eips_allocated: AtomicUsize,

    quota_on_vpc_create: AtomicBool,
    fail_run_instances: AtomicBool,
    fail_eip: AtomicBool,
    fail_ingress: AtomicBool,
    eip_delay: Mutex<Option<Duration>>,
}

impl MockEcsApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-mock{seq:04}")
    }

    fn request_id() -> String {
        Uuid::new_v4().to_string()
    }

    // Creation counters, for idempotency assertions.

    pub fn vpcs_created(&self) -> usize {
        self.vpcs_created.load(Ordering::Relaxed)
    }

    pub fn vswitches_created(&self) -> usize {
        self.vswitches_created.load(Ordering::Relaxed)
    }

    pub fn security_groups_created(&self) -> usize {
        self.security_groups_created.load(Ordering::Relaxed)
    }

    pub fn instances_created(&self) -> usize {
        self.instances_created.load(Ordering::Relaxed)
    }

    pub fn eips_allocated(&self) -> usize {
        self.eips_allocated.load(Ordering::Relaxed)
    }

    // Fault knobs.

    pub fn set_quota_on_vpc_create(&self, on: bool) {
        self.quota_on_vpc_create.store(on, Ordering::Relaxed);
    }

    pub fn set_fail_run_instances(&self, on: bool) {
        self.fail_run_instances.store(on, Ordering::Relaxed);
    }

    pub fn set_fail_eip(&self, on: bool) {
        self.fail_eip.store(on, Ordering::Relaxed);
    }

    pub fn set_fail_ingress(&self, on: bool) {
        self.fail_ingress.store(on, Ordering::Relaxed);
    }

    pub fn set_eip_delay(&self, delay: Duration) {
        *self.eip_delay.lock().expect("mock lock poisoned") = Some(delay);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock lock poisoned")
    }

    /// First usable host address inside the vswitch block.
    fn private_ip_for(state: &State, vswitch_id: &str, host: u64) -> Option<String> {
        let vswitch = state.vswitches.iter().find(|v| v.vswitch_id == vswitch_id)?;
        let prefix = vswitch.cidr_block.split('/').next()?;
        let mut octets: Vec<&str> = prefix.split('.').collect();
        if octets.len() != 4 {
            return None;
        }
        let last = format!("{}", 2 + host % 120);
        octets[3] = &last;
        Some(octets.join("."))
    }
}

#[async_trait]
impl EcsApi for MockEcsApi {
    async fn describe_vpcs(&self, region_id: &str, owner_id: &str) -> ApiResult<Vec<VpcRecord>> {
        Ok(self
            .lock()
            .vpcs
            .iter()
            .filter(|v| {
                v.region_id == region_id
                    && v.tags.get("Owner").is_some_and(|owner| owner == owner_id)
            })
            .cloned()
            .collect())
    }

    async fn create_vpc(
        &self,
        region_id: &str,
        cidr_block: &str,
        tags: &HashMap<String, String>,
    ) -> ApiResult<VpcRecord> {
        if self.quota_on_vpc_create.load(Ordering::Relaxed) {
            return Err(ApiError::QuotaExceeded(
                "QuotaExceeded.Vpc: the number of VPCs exceeds the quota".into(),
            ));
        }
        let vpc = VpcRecord {
            vpc_id: self.next_id("vpc"),
            region_id: region_id.to_string(),
            cidr_block: cidr_block.to_string(),
            tags: tags.clone(),
        };
        self.lock().vpcs.push(vpc.clone());
        self.vpcs_created.fetch_add(1, Ordering::Relaxed);
        Ok(vpc)
    }

    async fn describe_vswitches(
        &self,
        vpc_id: &str,
        zone_id: &str,
    ) -> ApiResult<Vec<VswitchRecord>> {
        Ok(self
            .lock()
            .vswitches
            .iter()
            .filter(|v| v.vpc_id == vpc_id && v.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn create_vswitch(
        &self,
        vpc_id: &str,
        zone_id: &str,
        cidr_block: &str,
    ) -> ApiResult<VswitchRecord> {
        let vswitch = VswitchRecord {
            vswitch_id: self.next_id("vsw"),
            vpc_id: vpc_id.to_string(),
            zone_id: zone_id.to_string(),
            cidr_block: cidr_block.to_string(),
        };
        self.lock().vswitches.push(vswitch.clone());
        self.vswitches_created.fetch_add(1, Ordering::Relaxed);
        Ok(vswitch)
    }

    async fn describe_security_groups(
        &self,
        vpc_id: &str,
        owner_id: &str,
    ) -> ApiResult<Vec<SecurityGroupRecord>> {
        Ok(self
            .lock()
            .security_groups
            .iter()
            .filter(|g| {
                g.vpc_id == vpc_id
                    && g.tags.get("Owner").is_some_and(|owner| owner == owner_id)
            })
            .cloned()
            .collect())
    }

    async fn create_security_group(
        &self,
        vpc_id: &str,
        _region_id: &str,
        tags: &HashMap<String, String>,
    ) -> ApiResult<SecurityGroupRecord> {
        let group = SecurityGroupRecord {
            security_group_id: self.next_id("sg"),
            vpc_id: vpc_id.to_string(),
            tags: tags.clone(),
        };
        self.lock().security_groups.push(group.clone());
        self.security_groups_created.fetch_add(1, Ordering::Relaxed);
        Ok(group)
    }

    async fn authorize_ingress(
        &self,
        security_group_id: &str,
        _region_id: &str,
        port: u16,
    ) -> ApiResult<()> {
        if self.fail_ingress.load(Ordering::Relaxed) {
            return Err(ApiError::Api {
                code: "Forbidden.SecurityGroup".into(),
                message: "ingress authorization rejected".into(),
                request_id: Some(Self::request_id()),
            });
        }
        let mut state = self.lock();
        if !state
            .authorized
            .insert((security_group_id.to_string(), port))
        {
            return Err(ApiError::Api {
                code: "InvalidPermission.Duplicate".into(),
                message: format!("tcp/{port} already authorized"),
                request_id: Some(Self::request_id()),
            });
        }
        Ok(())
    }

    async fn allocate_and_associate_eip(
        &self,
        instance_id: &str,
        _region_id: &str,
        _bandwidth_mbps: u32,
    ) -> ApiResult<EipResult> {
        let delay = *self.eip_delay.lock().expect("mock lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_eip.load(Ordering::Relaxed) {
            return Err(ApiError::Api {
                code: "OperationFailed.Eip".into(),
                message: "eip allocation failed".into(),
                request_id: Some(Self::request_id()),
            });
        }
        let seq = self.eips_allocated.fetch_add(1, Ordering::Relaxed);
        let eip = EipResult {
            eip_address: format!("47.98.0.{}", 10 + seq % 200),
            allocation_id: self.next_id("eip"),
        };
        let mut state = self.lock();
        if let Some(instance) = state.instances.get_mut(instance_id) {
            instance.public_ip = Some(eip.eip_address.clone());
        }
        Ok(eip)
    }

    async fn run_instances(&self, spec: &RunInstancesSpec) -> ApiResult<RunInstancesResult> {
        if self.fail_run_instances.load(Ordering::Relaxed) {
            return Err(ApiError::Api {
                code: "OperationDenied".into(),
                message: "run instances rejected".into(),
                request_id: Some(Self::request_id()),
            });
        }
        let mut state = self.lock();
        let mut instance_ids = Vec::with_capacity(spec.amount as usize);
        for n in 0..spec.amount.max(1) {
            let instance_id = self.next_id("i");
            let host = self.instances_created.fetch_add(1, Ordering::Relaxed) as u64;
            let record = InstanceRecord {
                instance_id: instance_id.clone(),
                instance_name: if n == 0 {
                    spec.instance_name.clone()
                } else {
                    format!("{}-{n}", spec.instance_name)
                },
                status: "Pending".to_string(),
                region_id: spec.region_id.clone(),
                zone_id: spec.zone_id.clone(),
                instance_type: spec.instance_type.clone(),
                image_id: spec.image_id.clone(),
                cpu: None,
                memory_gb: None,
                private_ip: Self::private_ip_for(&state, &spec.vswitch_id, host),
                public_ip: None,
                vpc_id: None,
                vswitch_id: Some(spec.vswitch_id.clone()),
                security_group_ids: vec![spec.security_group_id.clone()],
                creation_time: Utc::now(),
                expired_time: None,
                tags: spec.tags.clone(),
            };
            state.instances.insert(instance_id.clone(), record);
            instance_ids.push(instance_id);
        }
        Ok(RunInstancesResult {
            instance_ids,
            request_id: Self::request_id(),
        })
    }

    async fn describe_instance(&self, instance_id: &str) -> ApiResult<Option<InstanceRecord>> {
        Ok(self.lock().instances.get(instance_id).cloned())
    }

    async fn describe_instances_by_name(
        &self,
        instance_name: &str,
    ) -> ApiResult<Vec<InstanceRecord>> {
        Ok(self
            .lock()
            .instances
            .values()
            .filter(|i| i.instance_name == instance_name)
            .cloned()
            .collect())
    }

    async fn start_instance(&self, instance_id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let instance = state.instances.get_mut(instance_id).ok_or(ApiError::NotFound)?;
        instance.status = "Running".to_string();
        Ok(())
    }

    async fn stop_instance(&self, instance_id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let instance = state.instances.get_mut(instance_id).ok_or(ApiError::NotFound)?;
        instance.status = "Stopped".to_string();
        Ok(())
    }

    async fn reboot_instance(&self, instance_id: &str) -> ApiResult<()> {
        let mut state = self.lock();
        let instance = state.instances.get_mut(instance_id).ok_or(ApiError::NotFound)?;
        instance.status = "Running".to_string();
        Ok(())
    }

    async fn delete_instance(&self, instance_id: &str) -> ApiResult<()> {
        self.lock()
            .instances
            .remove(instance_id)
            .map(|_| ())
            .ok_or(ApiError::NotFound)
    }

    async fn describe_price(&self, spec: &RunInstancesSpec) -> ApiResult<PriceQuote> {
        // Toy but deterministic figures so price plumbing can be asserted
        let per_hour: BigDecimal = "1.75".parse().expect("literal decimal");
        let disk = BigDecimal::from(spec.system_disk_size) / BigDecimal::from(100u32);
        Ok(PriceQuote {
            price_per_hour: Some(per_hour + &disk),
            price_per_month: Some(BigDecimal::from(420u32) + disk * BigDecimal::from(24u32)),
            currency: "CNY".to_string(),
            validity_secs: Some(600),
            request_id: Self::request_id(),
        })
    }
}
