//! Service-name resolution.
//!
//! The `source_service`/`destination_service` shortcuts let a definition
//! select well-known ports by name instead of spelling out port and
//! protocol. On Unix the authoritative table is `/etc/services` (IANA port
//! assignments); users can extend it with local entries. The
//! [`ServiceResolver`] trait keeps the table injectable so tests run
//! against a fixed in-memory table.

use crate::error::Result;
use crate::types::ServiceEntry;
use std::collections::HashMap;
use std::path::Path;

/// Resolves a service name to its port/protocol assignments.
///
/// One name may map to several entries (e.g. `domain` is 53/tcp and
/// 53/udp).
pub trait ServiceResolver: Send + Sync {
    /// Look up a service name. `None` means the name is unknown.
    fn resolve(&self, name: &str) -> Option<Vec<ServiceEntry>>;
}

/// Service table parsed from an `/etc/services`-format file.
#[derive(Debug, Clone, Default)]
pub struct EtcServices {
    entries: HashMap<String, Vec<ServiceEntry>>,
}

impl EtcServices {
    /// Parse the system table at `/etc/services`.
    pub fn load() -> Result<Self> {
        Self::from_path(Path::new("/etc/services"))
    }

    /// Parse a table from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse the `name port/protocol [aliases...]` line format.
    ///
    /// Comments (`#` to end of line) and malformed lines are skipped;
    /// aliases resolve to the same entry as the primary name.
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();

        for line in content.lines() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let mut fields = line.split_whitespace();

            let Some(name) = fields.next() else { continue };
            let Some(assignment) = fields.next() else { continue };
            let Some((port, protocol)) = assignment.split_once('/') else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else { continue };

            let entry = ServiceEntry::new(port, protocol);
            table.insert(name, entry.clone());
            for alias in fields {
                table.insert(alias, entry.clone());
            }
        }

        table
    }

    /// Number of distinct names in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, entry: ServiceEntry) {
        let entries = self.entries.entry(name.to_string()).or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
}

impl ServiceResolver for EtcServices {
    fn resolve(&self, name: &str) -> Option<Vec<ServiceEntry>> {
        self.entries.get(name).cloned()
    }
}

/// Fixed in-memory service table.
#[derive(Debug, Clone, Default)]
pub struct StaticServices {
    entries: HashMap<String, Vec<ServiceEntry>>,
}

impl StaticServices {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment for a name.
    pub fn with(mut self, name: impl Into<String>, port: u16, protocol: &str) -> Self {
        self.entries
            .entry(name.into())
            .or_default()
            .push(ServiceEntry::new(port, protocol));
        self
    }
}

impl ServiceResolver for StaticServices {
    fn resolve(&self, name: &str) -> Option<Vec<ServiceEntry>> {
        self.entries.get(name).cloned()
    }
}
