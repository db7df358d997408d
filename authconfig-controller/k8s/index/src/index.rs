use ahash::AHashMap as HashMap;
use authconfig_controller_core::{FindKeys, ResourceId};
use authconfig_controller_k8s_api::{labels::Selector, AuthConfig, ResourceExt};
use parking_lot::RwLock;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

pub type SharedIndex = Arc<RwLock<Index>>;

#[derive(Debug, Default)]
pub struct Index {
    selector: Option<Selector>,

    /// The hosts each indexed AuthConfig asks for, keyed by cache key.
    requested: BTreeMap<String, Vec<String>>,

    /// The cache key of the AuthConfig currently serving each host.
    owners: HashMap<String, String>,
}

// === impl Index ===

impl Index {
    pub fn shared(selector: Option<Selector>) -> SharedIndex {
        Arc::new(RwLock::new(Self {
            selector,
            ..Self::default()
        }))
    }

    pub(crate) fn configs_len(&self) -> usize {
        self.requested.len()
    }

    pub(crate) fn hosts_len(&self) -> usize {
        self.owners.len()
    }

    fn update(&mut self, key: String, mut hosts: Vec<String>) {
        hosts.sort();
        hosts.dedup();

        let previous = self.requested.insert(key.clone(), hosts.clone());
        if previous.as_ref() == Some(&hosts) {
            return;
        }

        // Give up any host this AuthConfig no longer asks for.
        for host in previous.into_iter().flatten() {
            if hosts.binary_search(&host).is_err() {
                self.release(&key, host);
            }
        }

        for host in hosts {
            match self.owners.get(&host) {
                Some(owner) if *owner == key => {}
                Some(owner) => {
                    tracing::debug!(%host, %owner, config = %key, "Host already served by another AuthConfig");
                }
                None => {
                    tracing::debug!(%host, config = %key, "Indexed host");
                    self.owners.insert(host, key.clone());
                }
            }
        }
    }

    fn remove(&mut self, key: &str) {
        let Some(hosts) = self.requested.remove(key) else {
            return;
        };
        for host in hosts {
            self.release(key, host);
        }
        tracing::debug!(config = %key, "Removed AuthConfig from index");
    }

    /// Drops `key`'s claim on `host` and hands the host to the next AuthConfig
    /// that requests it.
    fn release(&mut self, key: &str, host: String) {
        if self.owners.get(&host).map(String::as_str) != Some(key) {
            return;
        }
        self.owners.remove(&host);

        let next = self
            .requested
            .iter()
            .find(|(_, hosts)| hosts.binary_search(&host).is_ok())
            .map(|(k, _)| k.clone());
        if let Some(next) = next {
            tracing::debug!(%host, config = %next, "Host reassigned");
            self.owners.insert(host, next);
        }
    }
}

impl FindKeys for Index {
    fn find_keys(&self, id: &str) -> BTreeSet<String> {
        self.requested
            .get(id)
            .into_iter()
            .flatten()
            .filter(|host| self.owners.get(*host).map(String::as_str) == Some(id))
            .cloned()
            .collect()
    }
}

impl kubert::index::IndexNamespacedResource<AuthConfig> for Index {
    fn apply(&mut self, resource: AuthConfig) {
        let Some(namespace) = resource.namespace() else {
            tracing::warn!(name = %resource.name_any(), "Ignoring AuthConfig without a namespace");
            return;
        };
        let key = ResourceId::new(namespace, resource.name_unchecked()).cache_key();

        if let Some(selector) = self.selector.as_ref() {
            if !selector.matches(resource.labels()) {
                tracing::debug!(config = %key, %selector, "AuthConfig not selected");
                self.remove(&key);
                return;
            }
        }

        self.update(key, resource.spec.hosts);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let key = ResourceId::new(namespace, name).cache_key();
        self.remove(&key);
    }

    // Since apply only reindexes a single AuthConfig at a time, there's no
    // need to handle resets specially.
}
