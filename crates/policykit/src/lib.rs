//! # policykit
//!
//! Vendor-neutral firewall policy model.
//!
//! This crate provides functionality for:
//! - The canonical [`Term`] / [`Filter`] / [`Policy`] object graph
//! - Parsing loose YAML definitions (scalar-or-list fields, `[start, end]`
//!   port pairs, named-service shortcuts)
//! - Canonicalizing definitions once, at the [`normalize`] boundary
//! - Address-family scoping (`inet` / `inet6` filter options)
//! - Revision stamping (`$Id$` / `$Date$` / `$Revision$` comments)
//! - Rendering the neutral candidate configuration handed to a device
//!
//! ## Example
//!
//! ```
//! use policykit::services::StaticServices;
//! use policykit::{RevisionStamp, normalize, raw, render};
//!
//! let definition: serde_yaml::Value = serde_yaml::from_str(
//!     "
//! block-icmp:
//!   first-term:
//!     protocol: icmp
//!     action: reject
//! ",
//! )
//! .unwrap();
//!
//! let services = StaticServices::new();
//! let filters = raw::parse_policy(&definition).unwrap();
//! let policy = normalize::policy(&filters, &services).unwrap();
//!
//! let stamp = RevisionStamp::new("netacl_example");
//! let date = chrono::NaiveDate::from_ymd_opt(2017, 7, 3).unwrap();
//! let config = render::policy(&policy, &stamp.comment_lines(date));
//! assert!(config.contains("term first-term"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod normalize;
pub mod raw;
pub mod render;
pub mod revision;
pub mod services;
pub mod types;

pub use error::{Error, Result};
pub use revision::RevisionStamp;
pub use services::{EtcServices, ServiceResolver, StaticServices};
pub use types::{Action, AddressFamily, FamilyScope, Filter, Policy, PortSpec, ServiceEntry, Term};
