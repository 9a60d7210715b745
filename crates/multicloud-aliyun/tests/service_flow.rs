//! End-to-end flows through the facade, fixed scheduler and the Alibaba
//! Cloud provider over the in-memory vendor API.

use multicloud_aliyun::mock::MockEcsApi;
use multicloud_aliyun::{AliyunConfig, AliyunOps};
use multicloud_api::{CreateInstanceRequest, VmStatus};
use multicloud_core::{ClientRegistry, FixedScheduler, MultiCloudService};
use std::sync::Arc;
use std::time::Duration;

fn config() -> AliyunConfig {
    AliyunConfig {
        enabled: true,
        access_key_id: Some("test-ak".into()),
        access_key_secret: Some("test-sk".into()),
        ..AliyunConfig::default()
    }
}

fn service_with(config: AliyunConfig, api: Arc<MockEcsApi>) -> MultiCloudService {
    let registry = Arc::new(ClientRegistry::new());
    registry
        .register(Arc::new(AliyunOps::new(config, api).into_client()))
        .unwrap();
    let scheduler = Arc::new(FixedScheduler::new(registry.clone()));
    MultiCloudService::new(registry, scheduler)
}

fn request(name: &str) -> CreateInstanceRequest {
    CreateInstanceRequest::new("tenant-1", "user-1", "cn-hangzhou", name, "centos-7.9")
        .with_provider("ALIYUN")
}

#[tokio::test]
async fn happy_path_creates_pending_instance_with_labels_and_network() {
    let api = Arc::new(MockEcsApi::new());
    let service = service_with(config(), api.clone());

    let vm = service
        .create_instance(request("vm-e2e").with_public_ip(20).with_open_ports([22, 8888]))
        .await
        .unwrap();

    assert_eq!(vm.status, VmStatus::Pending);
    assert!(vm.is_success());
    assert_eq!(vm.provider.as_deref(), Some("ALIYUN"));
    assert_eq!(vm.tenant_id.as_deref(), Some("tenant-1"));

    // Ownership labels were injected before the vendor saw the request
    assert_eq!(vm.tags.get("tenantId").map(String::as_str), Some("tenant-1"));
    assert_eq!(vm.tags.get("Owner").map(String::as_str), Some("user-1"));
    assert_eq!(vm.tags.get("createdBy").map(String::as_str), Some("multicloud"));

    // The per-user network sandbox was provisioned alongside
    assert!(vm.metadata::<String>("vpcId").is_some());
    assert!(vm.metadata::<String>("vSwitchId").is_some());
    assert!(vm.metadata::<String>("securityGroupId").is_some());
    assert_eq!(api.vpcs_created(), 1);

    // And the follow-ups landed
    assert!(vm.public_ip.is_some());
    assert_eq!(api.eips_allocated(), 1);
}

#[tokio::test]
async fn missing_provider_hint_fails_before_anything_is_provisioned() {
    let api = Arc::new(MockEcsApi::new());
    let service = service_with(config(), api.clone());

    let mut req = request("vm-nohint");
    req.provider = None;
    let err = service.create_instance(req).await.unwrap_err();

    assert_eq!(err.code(), "PROVIDER_REQUIRED");
    assert_eq!(api.vpcs_created(), 0);
    assert_eq!(api.instances_created(), 0);
}

#[tokio::test]
async fn slow_eip_degrades_to_no_public_ip_without_failing_creation() {
    let api = Arc::new(MockEcsApi::new());
    api.set_eip_delay(Duration::from_millis(500));
    let service = service_with(
        AliyunConfig {
            post_provision_wait_secs: 0,
            ..config()
        },
        api.clone(),
    );

    let vm = service
        .create_instance(request("vm-sloweip").with_public_ip(10))
        .await
        .unwrap();

    assert_eq!(vm.status, VmStatus::Pending);
    assert!(vm.error_message.is_none());
    assert!(vm.public_ip.is_none());
    assert_eq!(api.instances_created(), 1);
}

#[tokio::test]
async fn failing_eip_also_degrades_gracefully() {
    let api = Arc::new(MockEcsApi::new());
    api.set_fail_eip(true);
    let service = service_with(config(), api.clone());

    let vm = service
        .create_instance(request("vm-noeip").with_public_ip(10))
        .await
        .unwrap();
    assert!(vm.is_success());
    assert!(vm.public_ip.is_none());
}

#[tokio::test]
async fn second_creation_by_same_owner_reuses_the_network_triple() {
    let api = Arc::new(MockEcsApi::new());
    let service = service_with(config(), api.clone());

    let first = service.create_instance(request("vm-a")).await.unwrap();
    let second = service.create_instance(request("vm-b")).await.unwrap();

    assert_eq!(api.vpcs_created(), 1);
    assert_eq!(api.vswitches_created(), 1);
    assert_eq!(api.security_groups_created(), 1);
    assert_eq!(
        first.metadata::<String>("vpcId"),
        second.metadata::<String>("vpcId")
    );
    assert_ne!(first.instance_id, second.instance_id);
}

#[tokio::test]
async fn vpc_quota_surfaces_as_network_quota_failure() {
    let api = Arc::new(MockEcsApi::new());
    api.set_quota_on_vpc_create(true);
    let service = service_with(config(), api.clone());

    let err = service
        .create_instance(request("vm-quota"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "QUOTA_EXCEEDED");
    assert!(err.is_network_quota_exceeded());
    assert_eq!(api.instances_created(), 0);
}

#[tokio::test]
async fn full_lifecycle_through_the_facade() {
    let api = Arc::new(MockEcsApi::new());
    let service = service_with(config(), api);

    let vm = service.create_instance(request("vm-life")).await.unwrap();
    let id = vm.instance_id.unwrap();

    assert!(service.start_instance("ALIYUN", &id).await.unwrap());
    let running = service.get_instance("ALIYUN", &id).await.unwrap().unwrap();
    assert_eq!(running.status, VmStatus::Running);

    assert_eq!(
        service
            .find_instance_id_by_name("aliyun", "vm-life")
            .await
            .unwrap()
            .as_deref(),
        Some(id.as_str())
    );

    assert!(service.stop_instance("ALIYUN", &id).await.unwrap());
    assert!(service.delete_instance("ALIYUN", &id).await.unwrap());
    assert!(service.get_instance("ALIYUN", &id).await.unwrap().is_none());
    assert!(!service.delete_instance("ALIYUN", &id).await.unwrap());
}
