//! Core types for the vendor-neutral policy model.
//!
//! A [`Policy`] is an ordered set of named [`Filter`]s; a filter is an
//! ordered sequence of [`Term`]s (match/action rules). These types are the
//! canonical form: every selector is an ordered sequence, every port is a
//! [`PortSpec`], every address is a parsed network. Loose input shapes live
//! in [`crate::raw`] and are converted exactly once, at the normalizer
//! boundary.

use crate::error::{Error, Result};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

/// Address family of a single network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Classify a parsed network.
    pub fn of(network: &IpNetwork) -> Self {
        match network {
            IpNetwork::V4(_) => Self::Ipv4,
            IpNetwork::V6(_) => Self::Ipv6,
        }
    }
}

/// Address-family scope of a filter, derived from its header options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyScope {
    /// IPv4 only (`inet` header option)
    Inet,
    /// IPv6 only (`inet6` header option)
    Inet6,
    /// No family restriction
    Mixed,
}

impl FamilyScope {
    /// Whether a term of the given family (if any) is admitted by this scope.
    ///
    /// Terms without address selectors, or with selectors from both
    /// families, have no family and match every scope.
    pub fn admits(&self, family: Option<AddressFamily>) -> bool {
        match (self, family) {
            (Self::Inet, Some(AddressFamily::Ipv6)) => false,
            (Self::Inet6, Some(AddressFamily::Ipv4)) => false,
            _ => true,
        }
    }
}

/// A port selector: a single port or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    /// One port
    Single(u16),
    /// Inclusive range `[start, end]`, `start <= end`
    Range(u16, u16),
}

impl PortSpec {
    /// Build a range selector, validating `start <= end`.
    pub fn range(start: u16, end: u16) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidPortRange { start, end });
        }
        Ok(Self::Range(start, end))
    }

    /// Whether the selector matches a port.
    pub fn contains(&self, port: u16) -> bool {
        match *self {
            Self::Single(p) => p == port,
            Self::Range(start, end) => (start..=end).contains(&port),
        }
    }
}

impl std::fmt::Display for PortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Single(p) => write!(f, "{p}"),
            Self::Range(start, end) => write!(f, "{start}-{end}"),
        }
    }
}

/// Term action keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Permit the traffic
    Accept,
    /// Drop silently
    Deny,
    /// Drop and signal the sender
    Reject,
    /// Reject with a TCP RST
    RejectWithTcpRst,
    /// Fall through to the next term
    Next,
    /// Count only, continue evaluation
    Count,
}

impl Action {
    /// The keyword used in definitions and rendered output.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Deny => "deny",
            Self::Reject => "reject",
            Self::RejectWithTcpRst => "reject-with-tcp-rst",
            Self::Next => "next",
            Self::Count => "count",
        }
    }

    /// Parse an action keyword.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "accept" | "permit" => Ok(Self::Accept),
            "deny" | "drop" => Ok(Self::Deny),
            "reject" => Ok(Self::Reject),
            "reject-with-tcp-rst" => Ok(Self::RejectWithTcpRst),
            "next" => Ok(Self::Next),
            "count" => Ok(Self::Count),
            _ => Err(Error::UnknownAction {
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// One entry of the service-name table: a port with its protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Assigned port
    pub port: u16,
    /// Protocol the assignment applies to (tcp, udp, ...)
    pub protocol: String,
}

impl ServiceEntry {
    /// Create an entry.
    pub fn new(port: u16, protocol: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
        }
    }
}

/// A single match/action rule.
///
/// All selector fields are ordered sequences; empty means "not specified".
/// `extras` carries platform-specific attributes verbatim - the model does
/// not interpret them, the renderer passes them through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Term name, unique within its filter
    pub name: String,
    /// Free-form comments rendered above the match block
    pub comments: Vec<String>,
    /// Protocol selectors (tcp, udp, icmp, ...)
    pub protocols: Vec<String>,
    /// Generic address selectors (match either direction)
    pub addresses: Vec<IpNetwork>,
    /// Source address selectors
    pub source_addresses: Vec<IpNetwork>,
    /// Destination address selectors
    pub destination_addresses: Vec<IpNetwork>,
    /// Generic port selectors
    pub ports: Vec<PortSpec>,
    /// Source port selectors
    pub source_ports: Vec<PortSpec>,
    /// Destination port selectors
    pub destination_ports: Vec<PortSpec>,
    /// Actions, in evaluation order
    pub actions: Vec<Action>,
    /// Platform-specific attributes, passed through to the renderer
    pub extras: Vec<(String, Vec<String>)>,
}

impl Term {
    /// Create an empty term with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comments: Vec::new(),
            protocols: Vec::new(),
            addresses: Vec::new(),
            source_addresses: Vec::new(),
            destination_addresses: Vec::new(),
            ports: Vec::new(),
            source_ports: Vec::new(),
            destination_ports: Vec::new(),
            actions: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// The address family this term is restricted to, if any.
    ///
    /// `None` when the term has no address selectors or mixes both
    /// families - such terms match under every filter scope.
    pub fn family(&self) -> Option<AddressFamily> {
        let mut families = self
            .addresses
            .iter()
            .chain(&self.source_addresses)
            .chain(&self.destination_addresses)
            .map(AddressFamily::of);

        let first = families.next()?;
        if families.all(|f| f == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Whether the term carries any selector or action at all.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
            && self.protocols.is_empty()
            && self.addresses.is_empty()
            && self.source_addresses.is_empty()
            && self.destination_addresses.is_empty()
            && self.ports.is_empty()
            && self.source_ports.is_empty()
            && self.destination_ports.is_empty()
            && self.actions.is_empty()
            && self.extras.is_empty()
    }
}

/// A named, ordered sequence of terms plus header options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Filter name, unique within its policy
    pub name: String,
    /// Header options (family directive, platform-specific flags)
    pub options: Vec<String>,
    /// Terms in evaluation order
    pub terms: Vec<Term>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
            terms: Vec::new(),
        }
    }

    /// Create an empty filter with header options.
    pub fn with_options(name: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            name: name.into(),
            options,
            terms: Vec::new(),
        }
    }

    /// Address-family scope derived from the header options.
    ///
    /// The first family directive wins; no directive means unrestricted.
    pub fn scope(&self) -> FamilyScope {
        for option in &self.options {
            match option.as_str() {
                "inet" => return FamilyScope::Inet,
                "inet6" => return FamilyScope::Inet6,
                "mixed" => return FamilyScope::Mixed,
                _ => {}
            }
        }
        FamilyScope::Mixed
    }

    /// Append a term, enforcing name uniqueness.
    pub fn add_term(&mut self, term: Term) -> Result<()> {
        if self.terms.iter().any(|t| t.name == term.name) {
            return Err(Error::DuplicateTerm {
                filter: self.name.clone(),
                term: term.name,
            });
        }
        self.terms.push(term);
        Ok(())
    }

    /// Look up a term by name.
    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.name == name)
    }
}

/// The full set of filters for a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Filters in definition order
    pub filters: Vec<Filter>,
}

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter, enforcing name uniqueness.
    pub fn add_filter(&mut self, filter: Filter) -> Result<()> {
        if self.filters.iter().any(|f| f.name == filter.name) {
            return Err(Error::DuplicateFilter { name: filter.name });
        }
        self.filters.push(filter);
        Ok(())
    }

    /// Look up a filter by name.
    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Whether the policy has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNetwork {
        s.parse().unwrap()
    }

    #[test]
    fn test_port_spec_range_validation() {
        assert_eq!(PortSpec::range(1000, 2000).unwrap(), PortSpec::Range(1000, 2000));
        assert_eq!(PortSpec::range(80, 80).unwrap(), PortSpec::Range(80, 80));
        assert!(matches!(
            PortSpec::range(2000, 1000),
            Err(Error::InvalidPortRange { start: 2000, end: 1000 })
        ));
    }

    #[test]
    fn test_port_spec_contains_inclusive() {
        let range = PortSpec::range(1000, 2000).unwrap();
        assert!(range.contains(1000));
        assert!(range.contains(1500));
        assert!(range.contains(2000));
        assert!(!range.contains(999));
        assert!(!range.contains(2001));

        let single = PortSpec::Single(22);
        assert!(single.contains(22));
        assert!(!single.contains(23));
    }

    #[test]
    fn test_port_spec_display() {
        assert_eq!(PortSpec::Single(22).to_string(), "22");
        assert_eq!(PortSpec::Range(5678, 5680).to_string(), "5678-5680");
    }

    #[test]
    fn test_action_parse_aliases() {
        assert_eq!(Action::parse("accept").unwrap(), Action::Accept);
        assert_eq!(Action::parse("permit").unwrap(), Action::Accept);
        assert_eq!(Action::parse("drop").unwrap(), Action::Deny);
        assert_eq!(Action::parse("reject").unwrap(), Action::Reject);
        assert!(matches!(
            Action::parse("bounce"),
            Err(Error::UnknownAction { .. })
        ));
    }

    #[test]
    fn test_term_family() {
        let mut term = Term::new("t");
        assert_eq!(term.family(), None);

        term.source_addresses.push(net("10.0.0.0/8"));
        assert_eq!(term.family(), Some(AddressFamily::Ipv4));

        term.destination_addresses.push(net("2001:db8::/32"));
        assert_eq!(term.family(), None);
    }

    #[test]
    fn test_family_scope_admits() {
        assert!(FamilyScope::Inet.admits(Some(AddressFamily::Ipv4)));
        assert!(!FamilyScope::Inet.admits(Some(AddressFamily::Ipv6)));
        assert!(FamilyScope::Inet.admits(None));
        assert!(!FamilyScope::Inet6.admits(Some(AddressFamily::Ipv4)));
        assert!(FamilyScope::Mixed.admits(Some(AddressFamily::Ipv6)));
    }

    #[test]
    fn test_filter_scope_from_options() {
        let filter = Filter::with_options("f", vec!["inet6".to_string()]);
        assert_eq!(filter.scope(), FamilyScope::Inet6);

        let filter = Filter::with_options(
            "f",
            vec!["not-interface-specific".to_string(), "inet".to_string()],
        );
        assert_eq!(filter.scope(), FamilyScope::Inet);

        let filter = Filter::new("f");
        assert_eq!(filter.scope(), FamilyScope::Mixed);
    }

    #[test]
    fn test_filter_rejects_duplicate_terms() {
        let mut filter = Filter::new("edge-in");
        filter.add_term(Term::new("allow-ssh")).unwrap();
        assert!(matches!(
            filter.add_term(Term::new("allow-ssh")),
            Err(Error::DuplicateTerm { .. })
        ));
        assert_eq!(filter.terms.len(), 1);
    }

    #[test]
    fn test_policy_rejects_duplicate_filters() {
        let mut policy = Policy::new();
        policy.add_filter(Filter::new("edge-in")).unwrap();
        assert!(matches!(
            policy.add_filter(Filter::new("edge-in")),
            Err(Error::DuplicateFilter { .. })
        ));
    }

    #[test]
    fn test_policy_lookup_preserves_order() {
        let mut policy = Policy::new();
        policy.add_filter(Filter::new("b")).unwrap();
        policy.add_filter(Filter::new("a")).unwrap();
        assert_eq!(policy.filters[0].name, "b");
        assert!(policy.filter("a").is_some());
        assert!(policy.filter("c").is_none());
    }
}
