//! Neutral policy-text renderer.
//!
//! Produces the candidate configuration handed to the device transport:
//! one block per filter, revision comments at the top of each block, terms
//! in evaluation order with their selectors in a `from` section and their
//! actions in a `then` section. The format is vendor-neutral and
//! deterministic, so diffs against a running configuration are stable.
//!
//! ```text
//! filter block-icmp {
//!     inet;
//!     /*
//!      ** $Id: netacl_example $
//!      ** $Date: 2017/07/03 $
//!      */
//!     term first-term {
//!         from {
//!             protocol icmp;
//!         }
//!         then {
//!             reject;
//!         }
//!     }
//! }
//! ```

use crate::types::{Filter, Policy, PortSpec, Term};
use ipnetwork::IpNetwork;
use std::fmt::Write;

/// Render a whole policy. Filters appear in definition order.
pub fn policy(policy: &Policy, revision: &[String]) -> String {
    let mut output = String::new();
    for f in &policy.filters {
        filter(&mut output, f, revision);
    }
    output
}

/// Render one filter block.
fn filter(output: &mut String, filter: &Filter, revision: &[String]) {
    writeln!(output, "filter {} {{", filter.name).unwrap();
    for option in &filter.options {
        writeln!(output, "    {option};").unwrap();
    }
    comment_block(output, 1, revision);
    for term in &filter.terms {
        write_term(output, term);
    }
    writeln!(output, "}}").unwrap();
}

/// Render one term: comments, `from` selectors, `then` actions.
fn write_term(output: &mut String, term: &Term) {
    comment_block(output, 1, &term.comments);
    writeln!(output, "    term {} {{", term.name).unwrap();

    if has_selectors(term) {
        writeln!(output, "        from {{").unwrap();
        selector(output, "protocol", &term.protocols);
        networks(output, "address", &term.addresses);
        networks(output, "source-address", &term.source_addresses);
        networks(output, "destination-address", &term.destination_addresses);
        port_selector(output, "port", &term.ports);
        port_selector(output, "source-port", &term.source_ports);
        port_selector(output, "destination-port", &term.destination_ports);
        for (key, values) in &term.extras {
            selector(output, &key.replace('_', "-"), values);
        }
        writeln!(output, "        }}").unwrap();
    }

    if !term.actions.is_empty() {
        writeln!(output, "        then {{").unwrap();
        for action in &term.actions {
            writeln!(output, "            {action};").unwrap();
        }
        writeln!(output, "        }}").unwrap();
    }

    writeln!(output, "    }}").unwrap();
}

fn has_selectors(term: &Term) -> bool {
    !(term.protocols.is_empty()
        && term.addresses.is_empty()
        && term.source_addresses.is_empty()
        && term.destination_addresses.is_empty()
        && term.ports.is_empty()
        && term.source_ports.is_empty()
        && term.destination_ports.is_empty()
        && term.extras.is_empty())
}

/// A `/* ** line */` comment block at the given indent level (4 spaces per
/// level). Empty input renders nothing.
fn comment_block(output: &mut String, level: usize, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let pad = "    ".repeat(level);
    writeln!(output, "{pad}/*").unwrap();
    for line in lines {
        writeln!(output, "{pad} ** {line}").unwrap();
    }
    writeln!(output, "{pad} */").unwrap();
}

fn selector(output: &mut String, keyword: &str, values: &[String]) {
    for value in values {
        writeln!(output, "            {keyword} {value};").unwrap();
    }
}

fn networks(output: &mut String, keyword: &str, values: &[IpNetwork]) {
    for value in values {
        writeln!(output, "            {keyword} {value};").unwrap();
    }
}

fn port_selector(output: &mut String, keyword: &str, values: &[PortSpec]) {
    for value in values {
        writeln!(output, "            {keyword} {value};").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn icmp_reject_filter() -> Policy {
        let mut term = Term::new("first-term");
        term.protocols = vec!["icmp".to_string()];
        term.actions = vec![Action::Reject];

        let mut filter = Filter::new("block-icmp");
        filter.add_term(term).unwrap();

        let mut policy = Policy::new();
        policy.add_filter(filter).unwrap();
        policy
    }

    #[test]
    fn test_render_single_term_filter() {
        let rendered = policy(&icmp_reject_filter(), &[]);
        assert_eq!(
            rendered,
            "\
filter block-icmp {
    term first-term {
        from {
            protocol icmp;
        }
        then {
            reject;
        }
    }
}
"
        );
    }

    #[test]
    fn test_render_revision_comment_block() {
        let revision = vec![
            "$Id: netacl_example $".to_string(),
            "$Date: 2017/07/03 $".to_string(),
        ];
        let rendered = policy(&icmp_reject_filter(), &revision);
        assert!(rendered.contains("    /*\n     ** $Id: netacl_example $\n     ** $Date: 2017/07/03 $\n     */\n"));
        // revision comes before the first term
        assert!(rendered.find("$Id:").unwrap() < rendered.find("term first-term").unwrap());
    }

    #[test]
    fn test_render_filter_options() {
        let mut p = icmp_reject_filter();
        p.filters[0].options = vec!["inet".to_string(), "not-interface-specific".to_string()];
        let rendered = policy(&p, &[]);
        assert!(rendered.contains("filter block-icmp {\n    inet;\n    not-interface-specific;\n"));
    }

    #[test]
    fn test_render_addresses_and_ports() {
        let mut term = Term::new("t");
        term.source_addresses = vec!["10.0.0.0/8".parse().unwrap()];
        term.destination_ports = vec![PortSpec::Single(22), PortSpec::Range(8080, 8090)];
        term.actions = vec![Action::Accept];

        let mut filter = Filter::new("f");
        filter.add_term(term).unwrap();
        let mut p = Policy::new();
        p.add_filter(filter).unwrap();

        let rendered = policy(&p, &[]);
        assert!(rendered.contains("source-address 10.0.0.0/8;"));
        assert!(rendered.contains("destination-port 22;"));
        assert!(rendered.contains("destination-port 8080-8090;"));
    }

    #[test]
    fn test_render_extras_with_kebab_keywords() {
        let mut term = Term::new("t");
        term.extras = vec![(
            "routing_instance".to_string(),
            vec!["internal".to_string()],
        )];

        let mut filter = Filter::new("f");
        filter.add_term(term).unwrap();
        let mut p = Policy::new();
        p.add_filter(filter).unwrap();

        assert!(policy(&p, &[]).contains("routing-instance internal;"));
    }

    #[test]
    fn test_render_action_only_term_has_no_from_block() {
        let mut term = Term::new("catch-all");
        term.actions = vec![Action::Deny];

        let mut filter = Filter::new("f");
        filter.add_term(term).unwrap();
        let mut p = Policy::new();
        p.add_filter(filter).unwrap();

        let rendered = policy(&p, &[]);
        assert!(!rendered.contains("from {"));
        assert!(rendered.contains("then {"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let p = icmp_reject_filter();
        assert_eq!(policy(&p, &[]), policy(&p, &[]));
    }
}
