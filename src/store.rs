//! YAML-file defaults store.
//!
//! The file plays the role of the environment-scoped key/value store:
//! top-level keys are pillar keys (`acl` by default), values are policy
//! definitions. `--environment prod` resolves to a sibling file named
//! `<stem>.prod.<ext>`.

use reconcile::{DefaultsStore, Error, Result};
use serde_yaml::Value;
use std::path::PathBuf;

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn path_for(&self, environment: Option<&str>) -> PathBuf {
        match environment {
            Some(env) => {
                let stem = self
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("defaults");
                let ext = self
                    .path
                    .extension()
                    .and_then(|s| s.to_str())
                    .unwrap_or("yaml");
                self.path.with_file_name(format!("{stem}.{env}.{ext}"))
            }
            None => self.path.clone(),
        }
    }
}

impl DefaultsStore for FileStore {
    fn lookup(&self, key: &str, environment: Option<&str>) -> Result<Option<Value>> {
        let path = self.path_for(environment);
        let content = std::fs::read_to_string(&path).map_err(|err| {
            Error::retrieval(format!("defaults file {} unreadable: {err}", path.display()))
        })?;
        let document: Value = serde_yaml::from_str(&content).map_err(|err| {
            Error::retrieval(format!(
                "defaults file {} is not valid YAML: {err}",
                path.display()
            ))
        })?;
        Ok(document.as_mapping().and_then(|m| m.get(key)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_from_base_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.yaml");
        std::fs::write(&path, "acl:\n  f:\n    t:\n      action: accept\n").unwrap();

        let store = FileStore::new(&path);
        assert!(store.lookup("acl", None).unwrap().is_some());
        assert!(store.lookup("other", None).unwrap().is_none());
    }

    #[test]
    fn test_environment_resolves_sibling_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.yaml");
        std::fs::write(&path, "acl:\n  base: {}\n").unwrap();
        std::fs::write(dir.path().join("defaults.prod.yaml"), "acl:\n  prod: {}\n").unwrap();

        let store = FileStore::new(&path);
        let base = store.lookup("acl", None).unwrap().unwrap();
        let prod = store.lookup("acl", Some("prod")).unwrap().unwrap();
        assert_ne!(base, prod);
    }

    #[test]
    fn test_missing_file_is_a_retrieval_error() {
        let store = FileStore::new("/nonexistent/defaults.yaml");
        let err = store.lookup("acl", None).unwrap_err();
        assert!(matches!(err, Error::Retrieval { .. }));
    }

    #[test]
    fn test_invalid_yaml_is_a_retrieval_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.yaml");
        std::fs::write(&path, ": not yaml : [\n").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.lookup("acl", None),
            Err(Error::Retrieval { .. })
        ));
    }
}
