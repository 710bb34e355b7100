//! Canonicalization boundary.
//!
//! Converts loose [`crate::raw`] definitions into the canonical
//! [`Term`]/[`Filter`]/[`Policy`] graph: scalars become single-element
//! sequences, port pairs become validated ranges, service shortcuts
//! resolve to port/protocol entries, and address-family scoping drops
//! terms that cannot render under the enclosing filter's family.
//!
//! Everything downstream of this module operates on the canonical form.

use crate::error::{Error, Result};
use crate::raw::{RawFilter, RawPort, RawPorts, RawTerm};
use crate::services::ServiceResolver;
use crate::types::{Action, Filter, Policy, PortSpec, Term};
use ipnetwork::IpNetwork;
use serde_yaml::Value;

/// Canonicalize a single term body.
pub fn term(name: &str, raw: &RawTerm, services: &dyn ServiceResolver) -> Result<Term> {
    let mut term = Term::new(name);

    if let Some(comment) = &raw.comment {
        term.comments = comment.to_vec();
    }
    if let Some(protocol) = &raw.protocol {
        term.protocols = protocol.to_vec();
    }
    if let Some(address) = &raw.address {
        term.addresses = addresses(&address.to_vec())?;
    }
    if let Some(address) = &raw.source_address {
        term.source_addresses = addresses(&address.to_vec())?;
    }
    if let Some(address) = &raw.destination_address {
        term.destination_addresses = addresses(&address.to_vec())?;
    }
    if let Some(port) = &raw.port {
        term.ports = ports(port)?;
    }
    if let Some(port) = &raw.source_port {
        term.source_ports = ports(port)?;
    }
    if let Some(port) = &raw.destination_port {
        term.destination_ports = ports(port)?;
    }

    if let Some(service) = &raw.source_service {
        for name in service.to_vec() {
            let entries = services
                .resolve(&name)
                .ok_or(Error::UnknownService { name })?;
            for entry in entries {
                push_unique(&mut term.source_ports, PortSpec::Single(entry.port));
                push_unique(&mut term.protocols, entry.protocol);
            }
        }
    }
    if let Some(service) = &raw.destination_service {
        for name in service.to_vec() {
            let entries = services
                .resolve(&name)
                .ok_or(Error::UnknownService { name })?;
            for entry in entries {
                push_unique(&mut term.destination_ports, PortSpec::Single(entry.port));
                push_unique(&mut term.protocols, entry.protocol);
            }
        }
    }

    if let Some(action) = &raw.action {
        for value in action.to_vec() {
            term.actions.push(Action::parse(&value)?);
        }
    }

    for (key, value) in &raw.extras {
        term.extras.push((key.clone(), scalar_list(key, value)?));
    }

    Ok(term)
}

/// Canonicalize a filter: normalize its terms and apply family scoping.
///
/// A term restricted to the opposite family of the filter scope is
/// excluded from the result with a warning; it is a deliberate no-op, not
/// an error. A filter whose terms were all excluded is an error - the
/// caller asked for something that cannot render.
pub fn filter(name: &str, raw: &RawFilter, services: &dyn ServiceResolver) -> Result<Filter> {
    let mut filter = Filter::with_options(name, raw.options.clone());
    let scope = filter.scope();

    for (term_name, raw_term) in &raw.terms {
        let term = term(term_name, raw_term, services)?;
        let family = term.family();
        if !scope.admits(family) {
            log::warn!(
                "term '{term_name}' in filter '{name}' is {family:?}-only, excluded by {scope:?} scope"
            );
            continue;
        }
        filter.add_term(term)?;
    }

    if filter.terms.is_empty() && !raw.terms.is_empty() {
        return Err(Error::EmptyFilter {
            name: name.to_string(),
        });
    }

    Ok(filter)
}

/// Canonicalize a whole policy.
pub fn policy(raw_filters: &[(String, RawFilter)], services: &dyn ServiceResolver) -> Result<Policy> {
    let mut policy = Policy::new();
    for (name, raw_filter) in raw_filters {
        policy.add_filter(filter(name, raw_filter, services)?)?;
    }
    Ok(policy)
}

fn addresses(values: &[String]) -> Result<Vec<IpNetwork>> {
    values
        .iter()
        .map(|value| {
            value.parse().map_err(|e| Error::InvalidAddress {
                value: value.clone(),
                message: format!("{e}"),
            })
        })
        .collect()
}

fn ports(raw: &RawPorts) -> Result<Vec<PortSpec>> {
    raw.to_vec()
        .into_iter()
        .map(|port| match port {
            RawPort::Single(p) => Ok(PortSpec::Single(p)),
            RawPort::Range([start, end]) => PortSpec::range(start, end),
        })
        .collect()
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Flatten an extras value into a list of rendered scalars.
fn scalar_list(key: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Sequence(items) => items.iter().map(|item| scalar(key, item)).collect(),
        other => Ok(vec![scalar(key, other)?]),
    }
}

fn scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::Definition {
            message: format!("attribute '{key}' must be a scalar or a list of scalars"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StaticServices;
    use crate::types::AddressFamily;

    fn table() -> StaticServices {
        StaticServices::new()
            .with("ssh", 22, "tcp")
            .with("domain", 53, "tcp")
            .with("domain", 53, "udp")
    }

    fn raw_term(yaml: &str) -> RawTerm {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn raw_filter(yaml: &str) -> RawFilter {
        RawFilter::from_value("f", &serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_normalizes_like_single_element_list() {
        let services = table();
        let from_scalar = term("t", &raw_term("protocol: tcp\naction: accept"), &services).unwrap();
        let from_list = term(
            "t",
            &raw_term("protocol:\n  - tcp\naction:\n  - accept"),
            &services,
        )
        .unwrap();
        assert_eq!(from_scalar, from_list);
    }

    #[test]
    fn test_port_range_validation() {
        let services = table();
        let ok = term("t", &raw_term("source_port:\n  - [1000, 2000]"), &services).unwrap();
        assert_eq!(ok.source_ports, vec![PortSpec::Range(1000, 2000)]);

        let err = term("t", &raw_term("source_port:\n  - [2000, 1000]"), &services).unwrap_err();
        assert!(matches!(err, Error::InvalidPortRange { start: 2000, end: 1000 }));
    }

    #[test]
    fn test_service_shortcut_resolution() {
        let services = table();
        let t = term("t", &raw_term("source_service: domain"), &services).unwrap();
        assert_eq!(t.source_ports, vec![PortSpec::Single(53)]);
        assert_eq!(t.protocols, vec!["tcp", "udp"]);
    }

    #[test]
    fn test_service_shortcut_merges_into_existing_fields() {
        let services = table();
        let t = term(
            "t",
            &raw_term("protocol: tcp\ndestination_service: ssh"),
            &services,
        )
        .unwrap();
        assert_eq!(t.destination_ports, vec![PortSpec::Single(22)]);
        // tcp not duplicated
        assert_eq!(t.protocols, vec!["tcp"]);
    }

    #[test]
    fn test_unresolved_service_is_a_hard_error() {
        let services = table();
        let err = term("t", &raw_term("source_service: bgpd"), &services).unwrap_err();
        assert!(matches!(err, Error::UnknownService { name } if name == "bgpd"));
    }

    #[test]
    fn test_address_parsing_and_family() {
        let services = table();
        let t = term(
            "t",
            &raw_term("source_address: 1.2.3.4\ndestination_address:\n  - 172.17.17.0/24"),
            &services,
        )
        .unwrap();
        assert_eq!(t.family(), Some(AddressFamily::Ipv4));

        let err = term("t", &raw_term("source_address: not-an-ip"), &services).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
    }

    #[test]
    fn test_extras_pass_through() {
        let services = table();
        let t = term(
            "t",
            &raw_term("counter: my-counter\nlogging:\n  - syslog\n  - local"),
            &services,
        )
        .unwrap();
        assert!(t
            .extras
            .contains(&("counter".to_string(), vec!["my-counter".to_string()])));
        assert!(t.extras.contains(&(
            "logging".to_string(),
            vec!["syslog".to_string(), "local".to_string()]
        )));
    }

    #[test]
    fn test_family_scoping_excludes_mismatched_term() {
        let services = table();
        let raw = raw_filter(
            r"
options:
  - inet6
v4-only:
  source_address: 1.2.3.4
  action: reject
any-family:
  protocol: tcp
  action: accept
",
        );
        let f = filter("f", &raw, &services).unwrap();
        assert_eq!(f.terms.len(), 1);
        assert_eq!(f.terms[0].name, "any-family");
    }

    #[test]
    fn test_all_terms_excluded_is_an_error() {
        let services = table();
        let raw = raw_filter(
            r"
options:
  - inet
v6-only:
  source_address: 2001:db8::/32
  action: reject
",
        );
        let err = filter("f", &raw, &services).unwrap_err();
        assert!(matches!(err, Error::EmptyFilter { .. }));
    }

    #[test]
    fn test_mixed_family_term_survives_any_scope() {
        let services = table();
        let raw = raw_filter(
            r"
options:
  - inet
both:
  source_address:
    - 1.2.3.4
    - 2001:db8::1
  action: accept
",
        );
        let f = filter("f", &raw, &services).unwrap();
        assert_eq!(f.terms.len(), 1);
    }

    #[test]
    fn test_policy_duplicate_filter_names_rejected() {
        let services = table();
        let raw = raw_filter("t1:\n  action: accept");
        let filters = vec![("f".to_string(), raw.clone()), ("f".to_string(), raw)];
        let err = policy(&filters, &services).unwrap_err();
        assert!(matches!(err, Error::DuplicateFilter { .. }));
    }
}
