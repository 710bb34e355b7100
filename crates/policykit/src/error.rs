//! Error types for policy validation and canonicalization.
//!
//! Every shape problem in a loose definition surfaces here, before any
//! rendering or device interaction happens. Variants carry enough context
//! to point the user at the offending field.

use thiserror::Error;

/// Errors produced while validating and canonicalizing policy definitions.
#[derive(Debug, Error)]
pub enum Error {
    /// The definition does not have the expected shape (wrong node type,
    /// unexpected value kind, undeserializable field).
    #[error("invalid definition: {message}")]
    Definition {
        /// What was malformed and where
        message: String,
    },

    /// A `source_service`/`destination_service` name has no entry in the
    /// service table.
    #[error("unknown service name: {name}")]
    UnknownService {
        /// The service name that failed to resolve
        name: String,
    },

    /// A `[start, end]` port pair with `start > end`.
    #[error("invalid port range {start}-{end}: start exceeds end")]
    InvalidPortRange {
        /// Range start as given
        start: u16,
        /// Range end as given
        end: u16,
    },

    /// An address selector that does not parse as an IP network.
    #[error("invalid address '{value}': {message}")]
    InvalidAddress {
        /// The address string as given
        value: String,
        /// Parser diagnostic
        message: String,
    },

    /// An action keyword outside the supported set.
    #[error("unknown action '{value}'")]
    UnknownAction {
        /// The action string as given
        value: String,
    },

    /// Two terms with the same name inside one filter.
    #[error("duplicate term '{term}' in filter '{filter}'")]
    DuplicateTerm {
        /// Enclosing filter name
        filter: String,
        /// The duplicated term name
        term: String,
    },

    /// Two filters with the same name inside one policy.
    #[error("duplicate filter '{name}' in policy")]
    DuplicateFilter {
        /// The duplicated filter name
        name: String,
    },

    /// Address-family scoping removed every term of a filter that had terms
    /// defined.
    #[error("filter '{name}' has no terms left after address-family scoping")]
    EmptyFilter {
        /// The filter that ended up empty
        name: String,
    },

    /// An operation that requires a definition body received none.
    #[error("empty definition: {what}")]
    EmptyDefinition {
        /// What was expected
        what: String,
    },

    /// IO error (service table file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy model operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPortRange {
            start: 2000,
            end: 1000,
        };
        assert_eq!(
            err.to_string(),
            "invalid port range 2000-1000: start exceeds end"
        );

        let err = Error::UnknownService {
            name: "bgpd".to_string(),
        };
        assert_eq!(err.to_string(), "unknown service name: bgpd");
    }

    #[test]
    fn test_duplicate_errors_name_both_sides() {
        let err = Error::DuplicateTerm {
            filter: "edge-in".to_string(),
            term: "allow-ssh".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("edge-in"));
        assert!(msg.contains("allow-ssh"));
    }
}
