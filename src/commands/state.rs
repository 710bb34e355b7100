//! The three state operations, wired from CLI arguments.
//!
//! Each command builds a reconciler over the file-backed device (and the
//! YAML defaults store when one was given), reads the definition file,
//! runs the operation, and prints the uniform result record. A failed
//! reconciliation exits non-zero; discarded and no-op runs exit zero.

use crate::cli::{FilterArgs, ManagedArgs, StateFlags, TermArgs};
use crate::device::FileDevice;
use crate::store::FileStore;
use crate::ui;
use anyhow::{Context, Result};
use reconcile::{ReconcileResult, Reconciler, StateOptions};
use serde_yaml::Value;
use std::path::Path;

pub fn term(args: TermArgs) -> Result<()> {
    let definition = load_definition(args.definition.as_deref())?;
    let mut reconciler = build(&args.flags)?;
    let opts = options(&args.flags, args.filter_options);
    let result = reconciler.term(
        &args.name,
        &args.filter_name,
        &args.term_name,
        &definition,
        &opts,
    );
    finish(&result, args.flags.json)
}

pub fn filter(args: FilterArgs) -> Result<()> {
    let definition = load_definition(args.definition.as_deref())?;
    let mut reconciler = build(&args.flags)?;
    let opts = options(&args.flags, args.filter_options);
    let result = reconciler.filter(&args.name, &args.filter_name, &definition, &opts);
    finish(&result, args.flags.json)
}

pub fn managed(args: ManagedArgs) -> Result<()> {
    let definition = load_definition(args.definition.as_deref())?;
    let mut reconciler = build(&args.flags)?;
    let opts = options(&args.flags, Vec::new());
    let result = reconciler.managed(&args.name, &definition, &opts);
    finish(&result, args.flags.json)
}

fn load_definition(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read definition {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML in {}", path.display()))
        }
        None => Ok(Value::Null),
    }
}

fn build(flags: &StateFlags) -> Result<Reconciler> {
    let device = FileDevice::open(&flags.device)?;
    let mut reconciler = Reconciler::new(Box::new(device));
    if let Some(defaults) = &flags.defaults {
        reconciler = reconciler.with_store(Box::new(FileStore::new(defaults)));
    }
    Ok(reconciler)
}

fn options(flags: &StateFlags, filter_options: Vec<String>) -> StateOptions {
    StateOptions {
        pillar_key: flags.pillar_key.clone(),
        environment: flags.environment.clone(),
        merge_defaults: flags.merge_defaults,
        only_lower_merge: flags.only_lower_merge,
        filter_options,
        revision_id: flags.revision_id.clone(),
        revision_no: flags.revision_no,
        revision_date: !flags.no_revision_date,
        revision_date_format: flags.revision_date_format.clone(),
        test: flags.test,
        commit: !flags.no_commit,
        debug: flags.debug,
    }
}

fn finish(result: &ReconcileResult, json: bool) -> Result<()> {
    if json {
        ui::print_json(result)?;
    } else {
        ui::print_result(result);
    }
    if result.result == Some(false) {
        anyhow::bail!("state '{}' failed: {}", result.name, result.comment);
    }
    Ok(())
}
