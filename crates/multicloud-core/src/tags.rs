//! Tenant/owner label injection.
//!
//! Every created resource carries ownership markers so provisioning logic
//! can later recognize infrastructure it created (the network provisioner
//! keys its VPC lookup on the owner tag).

use multicloud_api::CreateInstanceRequest;
use std::collections::HashMap;

/// Label carrying the tenant id.
pub const TENANT_TAG: &str = "tenantId";

/// Label identifying the end user a resource was provisioned for.
pub const OWNER_TAG: &str = "Owner";

/// Marker label for resources created by this platform.
pub const CREATED_BY_TAG: &str = "createdBy";
pub const CREATED_BY_VALUE: &str = "multicloud";

/// Merge ownership markers into the request's label set.
///
/// Idempotent. The request's own tenant/user ids are the source of truth:
/// a conflicting pre-existing label is overwritten (with a warning), never
/// silently kept. Unrelated caller-supplied labels are left untouched.
pub fn inject(request: &mut CreateInstanceRequest) {
    inject_identity(
        &mut request.tags,
        TENANT_TAG,
        request.tenant_id.trim(),
        "tenant",
    );
    inject_identity(&mut request.tags, OWNER_TAG, request.user_id.trim(), "owner");

    request
        .tags
        .entry(CREATED_BY_TAG.to_string())
        .or_insert_with(|| CREATED_BY_VALUE.to_string());
}

fn inject_identity(tags: &mut HashMap<String, String>, key: &str, value: &str, what: &str) {
    if value.is_empty() {
        return;
    }
    match tags.get(key) {
        None => {
            tags.insert(key.to_string(), value.to_string());
            tracing::debug!(tag = key, value, "injected {what} label");
        }
        Some(existing) if existing.is_empty() => {
            tags.insert(key.to_string(), value.to_string());
        }
        Some(existing) if existing != value => {
            tracing::warn!(
                tag = key,
                existing = %existing,
                requested = value,
                "{what} label conflicts with request, request wins"
            );
            tags.insert(key.to_string(), value.to_string());
        }
        Some(_) => {}
    }
}

/// Tenant id recorded in a label set, if any.
pub fn tenant_id_of(tags: &HashMap<String, String>) -> Option<&str> {
    tags.get(TENANT_TAG).map(String::as_str)
}

/// Owner (end user) id recorded in a label set, if any.
pub fn owner_id_of(tags: &HashMap<String, String>) -> Option<&str> {
    tags.get(OWNER_TAG).map(String::as_str)
}

/// Whether a label set marks a resource as created by this platform.
pub fn is_created_by_us(tags: &HashMap<String, String>) -> bool {
    tags.get(CREATED_BY_TAG).is_some_and(|v| v == CREATED_BY_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateInstanceRequest {
        CreateInstanceRequest::new("t1", "u1", "cn-hangzhou", "vm-1", "centos-7.9")
    }

    #[test]
    fn injects_all_three_markers() {
        let mut req = request();
        inject(&mut req);
        assert_eq!(req.tags.get(TENANT_TAG).map(String::as_str), Some("t1"));
        assert_eq!(req.tags.get(OWNER_TAG).map(String::as_str), Some("u1"));
        assert_eq!(
            req.tags.get(CREATED_BY_TAG).map(String::as_str),
            Some(CREATED_BY_VALUE)
        );
    }

    #[test]
    fn injection_is_idempotent() {
        let mut req = request();
        inject(&mut req);
        let once = req.tags.clone();
        inject(&mut req);
        assert_eq!(req.tags, once);
    }

    #[test]
    fn request_ids_win_over_conflicting_labels() {
        let mut req = request()
            .with_tag(TENANT_TAG, "someone-else")
            .with_tag(OWNER_TAG, "old-owner");
        inject(&mut req);
        assert_eq!(req.tags.get(TENANT_TAG).map(String::as_str), Some("t1"));
        assert_eq!(req.tags.get(OWNER_TAG).map(String::as_str), Some("u1"));
    }

    #[test]
    fn changed_identity_wins_on_reinjection() {
        let mut req = request();
        inject(&mut req);
        req.tenant_id = "t2".to_string();
        inject(&mut req);
        assert_eq!(req.tags.get(TENANT_TAG).map(String::as_str), Some("t2"));
    }

    #[test]
    fn unrelated_labels_survive() {
        let mut req = request().with_tag("env", "staging");
        inject(&mut req);
        assert_eq!(req.tags.get("env").map(String::as_str), Some("staging"));
    }

    #[test]
    fn caller_supplied_created_by_is_kept() {
        let mut req = request().with_tag(CREATED_BY_TAG, "terraform");
        inject(&mut req);
        assert_eq!(
            req.tags.get(CREATED_BY_TAG).map(String::as_str),
            Some("terraform")
        );
        assert!(!is_created_by_us(&req.tags));
    }

    #[test]
    fn extraction_helpers() {
        let mut req = request();
        inject(&mut req);
        assert_eq!(tenant_id_of(&req.tags), Some("t1"));
        assert_eq!(owner_id_of(&req.tags), Some("u1"));
        assert!(is_created_by_us(&req.tags));
        assert_eq!(tenant_id_of(&HashMap::new()), None);
    }
}
