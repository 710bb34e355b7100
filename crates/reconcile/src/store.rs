//! Defaults store.
//!
//! The pillar-equivalent key/value store holding stored policy
//! definitions. The store is a process-wide external dependency, so it is
//! modeled as a trait with a single blocking lookup; production callers
//! plug in a real backend, tests plug in a fixed table.

use crate::error::Result;
use serde_yaml::Value;
use std::collections::HashMap;

/// Environment-scoped key/value lookup for stored definitions.
pub trait DefaultsStore: Send + Sync {
    /// Look up a key, optionally in an alternate environment.
    ///
    /// `Ok(None)` means the key has no value; `Err` means the store
    /// itself could not be reached.
    fn lookup(&self, key: &str, environment: Option<&str>) -> Result<Option<Value>>;
}

/// A store with no values. The default for a [`crate::Reconciler`] built
/// without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl DefaultsStore for EmptyStore {
    fn lookup(&self, _key: &str, _environment: Option<&str>) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Fixed in-memory store.
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    base: HashMap<String, Value>,
    environments: HashMap<String, HashMap<String, Value>>,
}

impl StaticStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value in the base environment.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.base.insert(key.into(), value);
        self
    }

    /// Add a value in a named environment.
    pub fn with_env(
        mut self,
        environment: impl Into<String>,
        key: impl Into<String>,
        value: Value,
    ) -> Self {
        self.environments
            .entry(environment.into())
            .or_default()
            .insert(key.into(), value);
        self
    }
}

impl DefaultsStore for StaticStore {
    fn lookup(&self, key: &str, environment: Option<&str>) -> Result<Option<Value>> {
        let table = match environment {
            Some(env) => match self.environments.get(env) {
                Some(table) => table,
                None => return Ok(None),
            },
            None => &self.base,
        };
        Ok(table.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_store_has_no_values() {
        assert!(EmptyStore.lookup("acl", None).unwrap().is_none());
        assert!(EmptyStore.lookup("acl", Some("prod")).unwrap().is_none());
    }

    #[test]
    fn test_static_store_base_lookup() {
        let store = StaticStore::new().with("acl", yaml("f:\n  t:\n    action: accept"));
        assert!(store.lookup("acl", None).unwrap().is_some());
        assert!(store.lookup("other", None).unwrap().is_none());
    }

    #[test]
    fn test_static_store_environments_are_separate() {
        let store = StaticStore::new()
            .with("acl", yaml("base: {}"))
            .with_env("prod", "acl", yaml("prod: {}"));

        let base = store.lookup("acl", None).unwrap().unwrap();
        let prod = store.lookup("acl", Some("prod")).unwrap().unwrap();
        assert_ne!(base, prod);
        assert!(store.lookup("acl", Some("staging")).unwrap().is_none());
    }
}
