//! Provider client registry.
//!
//! Single source of truth for which vendor backends exist and are usable.
//! Codes are case-insensitive and trimmed; lookups clone the `Arc` out so
//! the lock is never held across vendor I/O.

use multicloud_api::{CloudVmClient, EcsError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

struct Entry {
    client: Arc<dyn CloudVmClient>,
    /// Registration order, breaks priority ties
    seq: u64,
}

/// Concurrent mapping from normalized provider code to client.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(code: &str) -> Result<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(EcsError::validation(
                "PROVIDER_CODE_REQUIRED",
                "provider code must not be blank",
            ));
        }
        Ok(code.to_ascii_uppercase())
    }

    /// Register a client under its own provider code. Overwriting an
    /// existing registration is allowed; the replaced client is returned
    /// and the overwrite is logged.
    pub fn register(
        &self,
        client: Arc<dyn CloudVmClient>,
    ) -> Result<Option<Arc<dyn CloudVmClient>>> {
        let code = client.provider_code().to_string();
        self.register_as(&code, client)
    }

    /// Register a client under an explicit code.
    pub fn register_as(
        &self,
        code: &str,
        client: Arc<dyn CloudVmClient>,
    ) -> Result<Option<Arc<dyn CloudVmClient>>> {
        let code = Self::normalize(code)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut clients = self.clients.write().expect("registry lock poisoned");
        let replaced = clients
            .insert(code.clone(), Entry { client: client.clone(), seq })
            .map(|e| e.client);
        match &replaced {
            Some(old) => tracing::warn!(
                provider = %code,
                old = old.provider_name(),
                new = client.provider_name(),
                "provider client overwritten"
            ),
            None => tracing::info!(
                provider = %code,
                name = client.provider_name(),
                "provider client registered"
            ),
        }
        Ok(replaced)
    }

    /// Remove a registration, returning the prior client if there was one.
    pub fn unregister(&self, code: &str) -> Option<Arc<dyn CloudVmClient>> {
        let code = Self::normalize(code).ok()?;
        let removed = self
            .clients
            .write()
            .expect("registry lock poisoned")
            .remove(&code)
            .map(|e| e.client);
        if removed.is_some() {
            tracing::info!(provider = %code, "provider client unregistered");
        }
        removed
    }

    /// Look up a client, failing with `PROVIDER_NOT_FOUND` (enumerating the
    /// registered codes) when absent.
    pub fn get(&self, code: &str) -> Result<Arc<dyn CloudVmClient>> {
        let normalized = Self::normalize(code)?;
        let clients = self.clients.read().expect("registry lock poisoned");
        match clients.get(&normalized) {
            Some(entry) => Ok(entry.client.clone()),
            None => {
                let mut registered: Vec<String> = clients.keys().cloned().collect();
                registered.sort();
                Err(EcsError::ProviderNotFound {
                    code: normalized,
                    registered,
                })
            }
        }
    }

    /// Non-failing lookup.
    pub fn get_opt(&self, code: &str) -> Option<Arc<dyn CloudVmClient>> {
        let code = Self::normalize(code).ok()?;
        self.clients
            .read()
            .expect("registry lock poisoned")
            .get(&code)
            .map(|e| e.client.clone())
    }

    pub fn is_registered(&self, code: &str) -> bool {
        match Self::normalize(code) {
            Ok(code) => self
                .clients
                .read()
                .expect("registry lock poisoned")
                .contains_key(&code),
            Err(_) => false,
        }
    }

    /// All registered codes, sorted.
    pub fn registered_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self
            .clients
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        codes.sort();
        codes
    }

    /// All registered clients, in no particular order.
    pub fn clients(&self) -> Vec<Arc<dyn CloudVmClient>> {
        self.clients
            .read()
            .expect("registry lock poisoned")
            .values()
            .map(|e| e.client.clone())
            .collect()
    }

    /// Clients reporting themselves available, sorted by ascending
    /// priority; ties fall back to registration order.
    pub fn available_clients(&self) -> Vec<Arc<dyn CloudVmClient>> {
        let mut available: Vec<(i32, u64, Arc<dyn CloudVmClient>)> = self
            .clients
            .read()
            .expect("registry lock poisoned")
            .values()
            .filter(|e| e.client.is_available())
            .map(|e| (e.client.priority(), e.seq, e.client.clone()))
            .collect();
        available.sort_by_key(|(priority, seq, _)| (*priority, *seq));
        available.into_iter().map(|(_, _, c)| c).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.clients.write().expect("registry lock poisoned").clear();
        tracing::info!("provider registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use multicloud_api::{CreateInstanceRequest, PriceInfo, VirtualMachine};

    struct FakeClient {
        code: String,
        available: bool,
        priority: i32,
    }

    impl FakeClient {
        fn new(code: &str) -> Arc<Self> {
            Arc::new(Self {
                code: code.to_string(),
                available: true,
                priority: 100,
            })
        }

        fn with_priority(code: &str, priority: i32) -> Arc<Self> {
            Arc::new(Self {
                code: code.to_string(),
                available: true,
                priority,
            })
        }

        fn unavailable(code: &str) -> Arc<Self> {
            Arc::new(Self {
                code: code.to_string(),
                available: false,
                priority: 100,
            })
        }
    }

    #[async_trait]
    impl CloudVmClient for FakeClient {
        fn provider_code(&self) -> &str {
            &self.code
        }
        fn provider_name(&self) -> &str {
            "fake"
        }
        async fn calculate_price(&self, _: &CreateInstanceRequest) -> Result<PriceInfo> {
            unimplemented!()
        }
        async fn create_instance(&self, _: CreateInstanceRequest) -> Result<VirtualMachine> {
            unimplemented!()
        }
        async fn delete_instance(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn start_instance(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn stop_instance(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn restart_instance(&self, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn get_instance(&self, _: &str) -> Result<Option<VirtualMachine>> {
            unimplemented!()
        }
        async fn find_instance_id_by_name(&self, _: &str) -> Result<Option<String>> {
            unimplemented!()
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[test]
    fn get_is_case_and_whitespace_insensitive() {
        let registry = ClientRegistry::new();
        registry.register(FakeClient::new("aliyun")).unwrap();

        let a = registry.get(" aliyun ").unwrap();
        let b = registry.get("ALIYUN").unwrap();
        let c = registry.get("aliyun").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[test]
    fn register_then_unregister_round_trips() {
        let registry = ClientRegistry::new();
        registry.register(FakeClient::new("ALIYUN")).unwrap();
        let before = registry.registered_codes();

        registry.register(FakeClient::new("AWS")).unwrap();
        let removed = registry.unregister("aws");
        assert!(removed.is_some());

        assert_eq!(registry.registered_codes(), before);
        assert!(registry.unregister("aws").is_none());
    }

    #[test]
    fn overwrite_returns_replaced_client() {
        let registry = ClientRegistry::new();
        let first = FakeClient::new("ALIYUN");
        registry.register(first.clone()).unwrap();

        let replaced = registry.register(FakeClient::new("ALIYUN")).unwrap();
        assert!(replaced.is_some_and(|old| Arc::ptr_eq(
            &old,
            &(first as Arc<dyn CloudVmClient>)
        )));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn blank_code_is_rejected() {
        let registry = ClientRegistry::new();
        let err = registry.register(FakeClient::new("  ")).unwrap_err();
        assert_eq!(err.code(), "PROVIDER_CODE_REQUIRED");
        assert!(!registry.is_registered("   "));
    }

    #[test]
    fn not_found_enumerates_registered_codes() {
        let registry = ClientRegistry::new();
        registry.register(FakeClient::new("ALIYUN")).unwrap();
        registry.register(FakeClient::new("SCC")).unwrap();

        let err = registry.get("TENCENT").unwrap_err();
        assert_eq!(err.code(), "PROVIDER_NOT_FOUND");
        let msg = err.to_string();
        assert!(msg.contains("ALIYUN") && msg.contains("SCC"));
    }

    #[test]
    fn available_clients_sorted_by_priority_then_registration() {
        let registry = ClientRegistry::new();
        registry
            .register(FakeClient::with_priority("SCC", 50))
            .unwrap();
        registry
            .register(FakeClient::with_priority("ALIYUN", 10))
            .unwrap();
        registry
            .register(FakeClient::with_priority("AWS", 50))
            .unwrap();
        registry.register(FakeClient::unavailable("HUAWEI")).unwrap();

        let ordered: Vec<String> = registry
            .available_clients()
            .iter()
            .map(|c| c.provider_code().to_string())
            .collect();
        // SCC registered before AWS, both at priority 50
        assert_eq!(ordered, vec!["ALIYUN", "SCC", "AWS"]);
    }

    #[test]
    fn concurrent_register_and_get() {
        let registry = Arc::new(ClientRegistry::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                let code = format!("P{i}");
                registry.register(FakeClient::new(&code)).unwrap();
                for j in 0..100 {
                    let probe = format!("P{}", j % 8);
                    let _ = registry.get_opt(&probe);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
