//! Loose input shapes for policy definitions.
//!
//! Definitions arrive as YAML mappings in which most attributes accept
//! either a scalar or a list, and port attributes additionally accept
//! `[start, end]` pairs. These types capture that flexibility once; the
//! normalizer converts them into the canonical model and nothing downstream
//! ever branches on "is it a list" again.
//!
//! ```yaml
//! my-filter:
//!   options:
//!     - inet6
//!   my-term:
//!     source_port: [1234, 1235]
//!     protocol:
//!       - tcp
//!       - udp
//!     source_address: 1.2.3.4
//!     action: reject
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A field that accepts a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Single bare value
    One(T),
    /// List of values, order preserved
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flatten into an ordered sequence.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T: Clone> OneOrMany<T> {
    /// Flatten into an ordered sequence without consuming.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// One element of a port list: a bare port or a `[start, end]` pair.
///
/// A two-element list at the top level of a port field is two single
/// ports; ranges are only expressed as pairs nested inside the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawPort {
    /// One port
    Single(u16),
    /// Inclusive `[start, end]` pair (validated at normalization)
    Range([u16; 2]),
}

/// A port field: scalar port or list of ports/ranges.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPorts {
    /// Single bare port
    One(u16),
    /// List mixing single ports and `[start, end]` pairs
    Many(Vec<RawPort>),
}

impl RawPorts {
    /// Flatten into an ordered sequence of port elements.
    pub fn to_vec(&self) -> Vec<RawPort> {
        match self {
            Self::One(port) => vec![RawPort::Single(*port)],
            Self::Many(ports) => ports.clone(),
        }
    }
}

/// A term definition before canonicalization.
///
/// Known selector fields are typed; everything else lands in `extras` and
/// is passed through to the renderer verbatim (platform-specific
/// attributes such as `counter`, `policer`, or `routing_instance`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawTerm {
    /// Free-form comments
    pub comment: Option<OneOrMany<String>>,
    /// Protocol selectors
    pub protocol: Option<OneOrMany<String>>,
    /// Generic address selectors
    pub address: Option<OneOrMany<String>>,
    /// Source address selectors
    pub source_address: Option<OneOrMany<String>>,
    /// Destination address selectors
    pub destination_address: Option<OneOrMany<String>>,
    /// Generic port selectors
    pub port: Option<RawPorts>,
    /// Source port selectors
    pub source_port: Option<RawPorts>,
    /// Destination port selectors
    pub destination_port: Option<RawPorts>,
    /// Service-name shortcuts for source port/protocol
    pub source_service: Option<OneOrMany<String>>,
    /// Service-name shortcuts for destination port/protocol
    pub destination_service: Option<OneOrMany<String>>,
    /// Actions
    pub action: Option<OneOrMany<String>>,
    /// Platform-specific attributes, passed through unmodified
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl RawTerm {
    /// Deserialize a term body from a YAML value.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        serde_yaml::from_value(value.clone()).map_err(|e| Error::Definition {
            message: format!("term '{name}': {e}"),
        })
    }

    /// Whether no field at all was given.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A filter definition before canonicalization: header options plus an
/// ordered sequence of named term bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFilter {
    /// Header options (`options` key of the mapping)
    pub options: Vec<String>,
    /// Terms in definition order
    pub terms: Vec<(String, RawTerm)>,
}

impl RawFilter {
    /// Parse a filter mapping. Every key except `options` names a term.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let mapping = as_mapping(value, &format!("filter '{name}'"))?;
        let mut filter = Self::default();

        for (key, entry) in mapping {
            let key = key_string(key, &format!("filter '{name}'"))?;
            if key == "options" {
                let options: OneOrMany<String> =
                    serde_yaml::from_value(entry.clone()).map_err(|e| Error::Definition {
                        message: format!("filter '{name}' options: {e}"),
                    })?;
                filter.options = options.into_vec();
            } else {
                filter.terms.push((key.clone(), RawTerm::from_value(&key, entry)?));
            }
        }

        Ok(filter)
    }
}

/// Parse a policy mapping: filter name to filter body, order preserved.
pub fn parse_policy(value: &Value) -> Result<Vec<(String, RawFilter)>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let mapping = as_mapping(value, "policy")?;
    let mut filters = Vec::with_capacity(mapping.len());

    for (key, entry) in mapping {
        let name = key_string(key, "policy")?;
        filters.push((name.clone(), RawFilter::from_value(&name, entry)?));
    }

    Ok(filters)
}

fn as_mapping<'a>(value: &'a Value, what: &str) -> Result<&'a serde_yaml::Mapping> {
    value.as_mapping().ok_or_else(|| Error::Definition {
        message: format!("{what} must be a mapping"),
    })
}

fn key_string(key: &Value, what: &str) -> Result<String> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Definition {
            message: format!("{what} has a non-string key"),
        })
}
