use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aclctl")]
#[command(version)]
#[command(about = "Declarative firewall-policy management", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile a single term inside a filter
    Term(TermArgs),

    /// Reconcile a whole filter
    Filter(FilterArgs),

    /// Reconcile the whole policy
    Managed(ManagedArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// State Operations
// ============================================================================

#[derive(Args)]
pub struct TermArgs {
    /// Invocation name, used as the default revision id
    pub name: String,

    /// YAML file with the term attributes (falls back to the defaults
    /// store when omitted)
    pub definition: Option<PathBuf>,

    /// Filter the term belongs to
    #[arg(long = "filter")]
    pub filter_name: String,

    /// Term name
    #[arg(long = "term")]
    pub term_name: String,

    /// Filter header option (repeatable, e.g. --filter-option inet6)
    #[arg(long = "filter-option")]
    pub filter_options: Vec<String>,

    #[command(flatten)]
    pub flags: StateFlags,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Invocation name, used as the default revision id
    pub name: String,

    /// YAML file with the filter body (falls back to the defaults store
    /// when omitted)
    pub definition: Option<PathBuf>,

    /// Filter name
    #[arg(long = "filter")]
    pub filter_name: String,

    /// Filter header option (repeatable, overrides options in the
    /// definition)
    #[arg(long = "filter-option")]
    pub filter_options: Vec<String>,

    #[command(flatten)]
    pub flags: StateFlags,
}

#[derive(Args)]
pub struct ManagedArgs {
    /// Invocation name, used as the default revision id
    pub name: String,

    /// YAML file with the whole policy (falls back to the defaults store
    /// when omitted)
    pub definition: Option<PathBuf>,

    #[command(flatten)]
    pub flags: StateFlags,
}

/// Flags shared by every state operation.
#[derive(Args)]
pub struct StateFlags {
    /// Device running-configuration file
    #[arg(long, default_value = "running.conf")]
    pub device: PathBuf,

    /// YAML defaults file holding stored policy definitions
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// Key in the defaults file holding the stored policy
    #[arg(long, default_value = "acl")]
    pub pillar_key: String,

    /// Alternate defaults environment (reads <defaults>.<env>.yaml)
    #[arg(long)]
    pub environment: Option<String>,

    /// Merge the definition with the stored defaults
    #[arg(long)]
    pub merge_defaults: bool,

    /// Merge term attributes only, not filter-level fields
    #[arg(long)]
    pub only_lower_merge: bool,

    /// Revision id for the generated comments (defaults to the
    /// invocation name)
    #[arg(long)]
    pub revision_id: Option<String>,

    /// Revision counter
    #[arg(long)]
    pub revision_no: Option<u64>,

    /// Skip the generation-date comment
    #[arg(long)]
    pub no_revision_date: bool,

    /// strftime format for the date comment
    #[arg(long, default_value = "%Y/%m/%d")]
    pub revision_date_format: String,

    /// Dry run: show the diff, discard the change
    #[arg(long)]
    pub test: bool,

    /// Stage and diff but do not commit
    #[arg(long)]
    pub no_commit: bool,

    /// Include the raw rendered configuration in the output
    #[arg(long)]
    pub debug: bool,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
