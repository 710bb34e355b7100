//! # reconcile
//!
//! Declarative firewall-policy reconciliation.
//!
//! This crate provides functionality for:
//! - Resolving explicit definitions against a defaults store
//!   (merge-enable and lower-only-merge flags)
//! - Normalizing, stamping, and rendering candidate configurations via
//!   `policykit`
//! - Driving a device transport through compile / diff / commit-or-discard
//! - Reporting every outcome as one uniform result record
//!
//! ## Example
//!
//! ```
//! use reconcile::{InMemoryDevice, Reconciler, StateOptions};
//!
//! let definition: serde_yaml::Value =
//!     serde_yaml::from_str("protocol: icmp\naction: reject").unwrap();
//!
//! let mut reconciler = Reconciler::new(Box::new(InMemoryDevice::new()));
//! let result = reconciler.term(
//!     "netacl_example",
//!     "block-icmp",
//!     "first-term",
//!     &definition,
//!     &StateOptions::default(),
//! );
//!
//! assert_eq!(result.result, Some(true));
//! assert_eq!(result.comment, "Configuration changed!");
//! assert!(result.changes.diff.unwrap().contains("term first-term"));
//! ```
//!
//! ## Collaborators
//!
//! The [`Reconciler`] owns boxed collaborators, each injectable for
//! tests: the [`Device`] transport, the [`DefaultsStore`], the
//! service-name table ([`policykit::ServiceResolver`]), and the
//! [`Clock`] feeding revision dates. Invocations are synchronous and
//! must be serialized per device by the caller; the `&mut self`
//! receivers enforce that within one reconciler.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod device;
pub mod error;
pub mod executor;
pub mod merge;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use device::{Device, InMemoryDevice};
pub use error::{Error, Result};
pub use store::{DefaultsStore, EmptyStore, StaticStore};
pub use types::{Changes, Outcome, ReconcileResult, StateOptions};

use policykit::raw::RawFilter;
use policykit::services::{EtcServices, ServiceResolver, StaticServices};
use policykit::{Policy, RevisionStamp, normalize, raw, render};
use serde_yaml::{Mapping, Value};

/// Reconciles declared policy state against one device.
pub struct Reconciler {
    device: Box<dyn Device>,
    store: Box<dyn DefaultsStore>,
    services: Box<dyn ServiceResolver>,
    clock: Box<dyn Clock>,
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler for a device.
    ///
    /// Uses the system `/etc/services` table (an unreadable table
    /// degrades to an empty one), an empty defaults store, and the wall
    /// clock. Replace any collaborator with the `with_*` builders.
    pub fn new(device: Box<dyn Device>) -> Self {
        let services: Box<dyn ServiceResolver> = match EtcServices::load() {
            Ok(table) => Box::new(table),
            Err(err) => {
                log::debug!("service table unavailable: {err}");
                Box::new(StaticServices::new())
            }
        };
        Self {
            device,
            store: Box::new(EmptyStore),
            services,
            clock: Box::new(SystemClock),
            dry_run: false,
        }
    }

    /// Replace the defaults store.
    pub fn with_store(mut self, store: Box<dyn DefaultsStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the service-name table.
    pub fn with_services(mut self, services: Box<dyn ServiceResolver>) -> Self {
        self.services = services;
        self
    }

    /// Replace the clock feeding revision dates.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Force dry-run for every invocation, even those requesting commit.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Access the device, e.g. to inspect state after a run.
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Reconcile a single term inside a filter.
    ///
    /// `definition` is the term's attribute mapping; an empty definition
    /// falls back to the stored defaults at
    /// `<pillar_key>.<filter_name>.<term_name>`.
    pub fn term(
        &mut self,
        name: &str,
        filter_name: &str,
        term_name: &str,
        definition: &Value,
        opts: &StateOptions,
    ) -> ReconcileResult {
        match self.try_term(name, filter_name, term_name, definition, opts) {
            Ok(result) => result,
            Err(err) => ReconcileResult::failed(name, err.to_string()),
        }
    }

    /// Reconcile a whole filter.
    ///
    /// `terms` is the filter body mapping (term names to attribute
    /// mappings, optionally an `options` key); an empty body falls back
    /// to the stored defaults at `<pillar_key>.<filter_name>`.
    pub fn filter(
        &mut self,
        name: &str,
        filter_name: &str,
        terms: &Value,
        opts: &StateOptions,
    ) -> ReconcileResult {
        match self.try_filter(name, filter_name, terms, opts) {
            Ok(result) => result,
            Err(err) => ReconcileResult::failed(name, err.to_string()),
        }
    }

    /// Reconcile the whole policy.
    ///
    /// `filters` is the policy mapping (filter names to filter bodies);
    /// an empty mapping falls back to the stored defaults at
    /// `<pillar_key>`. An effective policy that is still empty is a
    /// no-op success, never a device interaction.
    pub fn managed(&mut self, name: &str, filters: &Value, opts: &StateOptions) -> ReconcileResult {
        match self.try_managed(name, filters, opts) {
            Ok(result) => result,
            Err(err) => ReconcileResult::failed(name, err.to_string()),
        }
    }

    // =========================================================================
    // Resolution and execution
    // =========================================================================

    fn try_term(
        &mut self,
        name: &str,
        filter_name: &str,
        term_name: &str,
        definition: &Value,
        opts: &StateOptions,
    ) -> Result<ReconcileResult> {
        let explicit_given = !merge::is_empty(definition);
        let mut stored_options: Option<Value> = None;

        let effective = if explicit_given && !opts.merge_defaults {
            definition.clone()
        } else {
            let stored = self.store.lookup(&opts.pillar_key, opts.environment.as_deref())?;
            let stored_filter = stored.as_ref().and_then(|v| merge::get(v, filter_name));
            let stored_term = stored_filter.and_then(|f| merge::get(f, term_name));

            // full merge also adopts the stored filter's header options
            if opts.merge_defaults && !opts.only_lower_merge {
                stored_options = stored_filter
                    .and_then(|f| merge::get(f, "options"))
                    .cloned();
            }

            match (explicit_given, stored_term) {
                (true, Some(stored_term)) => merge::union(definition, stored_term),
                (true, None) => definition.clone(),
                (false, Some(stored_term)) => stored_term.clone(),
                (false, None) => {
                    return Err(Error::retrieval(format!(
                        "no definition provided and defaults key '{}' has no term \
                         '{filter_name}:{term_name}'",
                        opts.pillar_key
                    )));
                }
            }
        };

        let mut body = Mapping::new();
        if !opts.filter_options.is_empty() {
            body.insert(
                Value::String("options".to_string()),
                options_value(&opts.filter_options),
            );
        } else if let Some(options) = stored_options {
            body.insert(Value::String("options".to_string()), options);
        }
        body.insert(Value::String(term_name.to_string()), effective);

        let raw_filter = RawFilter::from_value(filter_name, &Value::Mapping(body))?;
        let filter = normalize::filter(filter_name, &raw_filter, self.services.as_ref())?;
        self.execute(name, single_filter_policy(filter)?, opts)
    }

    fn try_filter(
        &mut self,
        name: &str,
        filter_name: &str,
        terms: &Value,
        opts: &StateOptions,
    ) -> Result<ReconcileResult> {
        let explicit_given = !merge::is_empty(terms);

        let effective = if explicit_given && !opts.merge_defaults {
            terms.clone()
        } else {
            let stored = self.store.lookup(&opts.pillar_key, opts.environment.as_deref())?;
            let stored_filter = stored.as_ref().and_then(|v| merge::get(v, filter_name));

            match (explicit_given, stored_filter) {
                (true, Some(stored_filter)) if opts.only_lower_merge => {
                    merge::merge_filter_terms(terms, stored_filter)
                }
                (true, Some(stored_filter)) => merge::union(terms, stored_filter),
                (true, None) => terms.clone(),
                (false, Some(stored_filter)) => stored_filter.clone(),
                (false, None) => {
                    return Err(Error::retrieval(format!(
                        "no definition provided and defaults key '{}' has no filter \
                         '{filter_name}'",
                        opts.pillar_key
                    )));
                }
            }
        };

        let mut raw_filter = RawFilter::from_value(filter_name, &effective)?;
        if !opts.filter_options.is_empty() {
            raw_filter.options = opts.filter_options.clone();
        }
        let filter = normalize::filter(filter_name, &raw_filter, self.services.as_ref())?;
        self.execute(name, single_filter_policy(filter)?, opts)
    }

    fn try_managed(
        &mut self,
        name: &str,
        filters: &Value,
        opts: &StateOptions,
    ) -> Result<ReconcileResult> {
        let explicit_given = !merge::is_empty(filters);

        let effective = if explicit_given && !opts.merge_defaults {
            filters.clone()
        } else {
            let stored = self
                .store
                .lookup(&opts.pillar_key, opts.environment.as_deref())?
                .unwrap_or(Value::Null);

            match (explicit_given, opts.only_lower_merge) {
                (true, true) => merge::merge_policy_terms(filters, &stored),
                (true, false) => merge::union(filters, &stored),
                (false, _) => stored,
            }
        };

        if merge::is_empty(&effective) {
            return Ok(ReconcileResult::success(
                name,
                "Empty policy: nothing to manage.",
            ));
        }

        let raw_filters = raw::parse_policy(&effective)?;
        let policy = normalize::policy(&raw_filters, self.services.as_ref())?;
        self.execute(name, policy, opts)
    }

    fn execute(
        &mut self,
        name: &str,
        policy: Policy,
        opts: &StateOptions,
    ) -> Result<ReconcileResult> {
        let revision = self.revision_lines(name, opts);
        let config = render::policy(&policy, &revision);
        let test = opts.test || self.dry_run;
        Ok(executor::run(
            self.device.as_mut(),
            name,
            &config,
            test,
            opts.commit,
            opts.debug,
        ))
    }

    fn revision_lines(&self, name: &str, opts: &StateOptions) -> Vec<String> {
        let id = opts
            .revision_id
            .clone()
            .unwrap_or_else(|| name.to_string());
        let mut stamp = RevisionStamp::new(id)
            .with_date(opts.revision_date)
            .with_date_format(opts.revision_date_format.clone());
        if let Some(number) = opts.revision_no {
            stamp = stamp.with_number(number);
        }
        stamp.comment_lines(self.clock.today())
    }
}

fn single_filter_policy(filter: policykit::Filter) -> Result<Policy> {
    let mut policy = Policy::new();
    policy.add_filter(filter)?;
    Ok(policy)
}

fn options_value(options: &[String]) -> Value {
    Value::Sequence(options.iter().map(|o| Value::String(o.clone())).collect())
}
