//! Device transport.
//!
//! The [`Device`] trait models the candidate-configuration session of a
//! network OS: stage a candidate, diff it against the running
//! configuration, then commit or discard. Implementations own the
//! all-or-nothing guarantee: a failed commit must leave the running
//! configuration untouched, and a bounded-duration apply must surface a
//! timeout as an error, never a hang.
//!
//! [`InMemoryDevice`] is the reference implementation used in tests and
//! offline runs; real vendor transports live outside this crate.

use crate::error::{Error, Result};
use similar::TextDiff;

/// Candidate-configuration session on one device.
///
/// Call order per reconciliation: [`load_candidate`], [`compare`], then
/// exactly one of [`commit`] or [`discard`].
///
/// [`load_candidate`]: Device::load_candidate
/// [`compare`]: Device::compare
/// [`commit`]: Device::commit
/// [`discard`]: Device::discard
pub trait Device: Send {
    /// Stage a candidate configuration. Validation failures surface here,
    /// before any state-changing interaction.
    fn load_candidate(&mut self, config: &str) -> Result<()>;

    /// Unified diff of the candidate against the running configuration.
    /// Empty means the device already matches.
    fn compare(&mut self) -> Result<String>;

    /// Replace the running configuration with the candidate, atomically.
    fn commit(&mut self) -> Result<()>;

    /// Drop the candidate, leaving the running configuration untouched.
    fn discard(&mut self) -> Result<()>;
}

/// In-memory device holding a running configuration as text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDevice {
    running: String,
    candidate: Option<String>,
}

impl InMemoryDevice {
    /// A device with an empty running configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A device with the given running configuration.
    pub fn with_running(running: impl Into<String>) -> Self {
        Self {
            running: running.into(),
            candidate: None,
        }
    }

    /// The current running configuration.
    pub fn running(&self) -> &str {
        &self.running
    }

    /// Whether a candidate is staged.
    pub fn has_candidate(&self) -> bool {
        self.candidate.is_some()
    }
}

impl Device for InMemoryDevice {
    fn load_candidate(&mut self, config: &str) -> Result<()> {
        self.candidate = Some(config.to_string());
        Ok(())
    }

    fn compare(&mut self) -> Result<String> {
        let candidate = self
            .candidate
            .as_deref()
            .ok_or_else(|| Error::compile("no candidate configuration loaded"))?;
        if candidate == self.running {
            return Ok(String::new());
        }
        let diff = TextDiff::from_lines(self.running.as_str(), candidate);
        Ok(diff.unified_diff().header("running", "candidate").to_string())
    }

    fn commit(&mut self) -> Result<()> {
        let candidate = self
            .candidate
            .take()
            .ok_or_else(|| Error::apply("no candidate configuration to commit"))?;
        self.running = candidate;
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        self.candidate = None;
        Ok(())
    }
}
