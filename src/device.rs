//! File-backed device.
//!
//! Wraps [`InMemoryDevice`] with a running configuration persisted to a
//! file, so committed state survives across invocations. Commit writes
//! the file before the in-memory state flips, keeping the on-disk
//! configuration authoritative.

use anyhow::{Context, Result};
use reconcile::{Device, InMemoryDevice};
use std::path::{Path, PathBuf};

pub struct FileDevice {
    path: PathBuf,
    inner: InMemoryDevice,
    candidate: Option<String>,
}

impl FileDevice {
    /// Open a device backed by a configuration file. A missing file is
    /// an empty running configuration, not an error.
    pub fn open(path: &Path) -> Result<Self> {
        let running = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read device configuration {}", path.display())
                });
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: InMemoryDevice::with_running(running),
            candidate: None,
        })
    }
}

impl Device for FileDevice {
    fn load_candidate(&mut self, config: &str) -> reconcile::Result<()> {
        self.candidate = Some(config.to_string());
        self.inner.load_candidate(config)
    }

    fn compare(&mut self) -> reconcile::Result<String> {
        self.inner.compare()
    }

    fn commit(&mut self) -> reconcile::Result<()> {
        let candidate = self
            .candidate
            .take()
            .ok_or_else(|| reconcile::Error::apply("no candidate configuration to commit"))?;
        std::fs::write(&self.path, &candidate).map_err(|err| {
            reconcile::Error::apply(format!(
                "failed to persist running configuration {}: {err}",
                self.path.display()
            ))
        })?;
        self.inner.commit()
    }

    fn discard(&mut self) -> reconcile::Result<()> {
        self.candidate = None;
        self.inner.discard()
    }
}
