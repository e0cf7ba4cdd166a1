// Check Registry
//
// Two phases: providers write into a `RegistryBuilder` during startup, which is
// then sealed into an immutable `Registry` for the rest of the process lifetime.

use crate::port::{CheckDescriptor, CheckRegistrar};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

type Namespaces = BTreeMap<String, BTreeMap<String, CheckDescriptor>>;

/// Write phase of the registry (startup only)
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    namespaces: Namespaces,
    // check key -> owning namespace; keys are unique across all namespaces
    owners: HashMap<String, String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `namespace`
    ///
    /// Returns false when the key is already held by any namespace. The first
    /// registration wins; the new one is dropped with a warning.
    pub fn register(&mut self, namespace: &str, descriptor: CheckDescriptor) -> bool {
        if let Some(owner) = self.owners.get(descriptor.key()) {
            warn!(
                name = %descriptor.key(),
                namespace = %namespace,
                owner = %owner,
                "Check already exists. Skipping"
            );
            return false;
        }

        debug!(
            name = %descriptor.key(),
            namespace = %namespace,
            "Check registered"
        );
        self.owners
            .insert(descriptor.key().to_string(), namespace.to_string());
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(descriptor.key().to_string(), descriptor);
        true
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// End the write phase
    pub fn seal(self) -> Registry {
        Registry {
            namespaces: self.namespaces,
            owners: self.owners,
        }
    }
}

impl CheckRegistrar for RegistryBuilder {
    fn add_check(&mut self, namespace: &str, descriptor: CheckDescriptor) {
        self.register(namespace, descriptor);
    }
}

/// Read-only registry used after startup
#[derive(Debug)]
pub struct Registry {
    namespaces: Namespaces,
    owners: HashMap<String, String>,
}

impl Registry {
    /// Resolve a check key to its descriptor
    pub fn lookup(&self, key: &str) -> Option<&CheckDescriptor> {
        let namespace = self.owners.get(key)?;
        self.namespaces.get(namespace)?.get(key)
    }

    /// Namespace (provider id) that owns `key`
    pub fn namespace_of(&self, key: &str) -> Option<&str> {
        self.owners.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// All registered check keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.owners.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Check keys grouped by namespace
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.namespaces.iter().map(|(namespace, checks)| {
            (
                namespace.as_str(),
                checks.keys().map(String::as_str).collect(),
            )
        })
    }
}
