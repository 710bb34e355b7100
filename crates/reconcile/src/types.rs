//! Option and result records for reconciliation.
//!
//! Every invocation takes one [`StateOptions`] value with named fields and
//! documented defaults, and returns one [`ReconcileResult`] regardless of
//! outcome. Callers never see a panic or a bare error: failures land in
//! the result record with `result: Some(false)` and the diagnostic in
//! `comment`.

use serde::{Deserialize, Serialize};

/// Options accepted by every reconciliation operation.
///
/// The defaults reproduce a plain "compile and commit" run: defaults-store
/// merging off, revision date stamped as `%Y/%m/%d`, commit enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateOptions {
    /// Key in the defaults store holding the stored policy. Default: `acl`.
    pub pillar_key: String,
    /// Alternate store environment to query. Default: none (base store).
    pub environment: Option<String>,
    /// Merge the explicit definition with the stored defaults.
    /// Default: `false` (explicit definition used verbatim).
    pub merge_defaults: bool,
    /// Restrict merging to term attributes; filter-level fields are not
    /// imported from the store. Requires `merge_defaults`, otherwise
    /// ignored. Default: `false` (merge at every level).
    pub only_lower_merge: bool,
    /// Filter header options for the `term` and `filter` operations.
    /// When empty, options found in the resolved definition apply.
    pub filter_options: Vec<String>,
    /// Revision id embedded in the generated comments.
    /// Default: the invocation name.
    pub revision_id: Option<String>,
    /// Revision counter for the `$Revision$` comment line. Default: none.
    pub revision_no: Option<u64>,
    /// Stamp the generation date. Default: `true`.
    pub revision_date: bool,
    /// strftime format for the date line. Default: `%Y/%m/%d`.
    pub revision_date_format: String,
    /// Dry run: compute and return the diff, discard instead of
    /// committing. Default: `false`.
    pub test: bool,
    /// Commit the configuration when it differs. Default: `true`.
    /// With commit disabled the change is staged, diffed, and discarded.
    pub commit: bool,
    /// Attach the raw rendered configuration under `changes.loaded`.
    /// Default: `false`.
    pub debug: bool,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            pillar_key: "acl".to_string(),
            environment: None,
            merge_defaults: false,
            only_lower_merge: false,
            filter_options: Vec::new(),
            revision_id: None,
            revision_no: None,
            revision_date: true,
            revision_date_format: "%Y/%m/%d".to_string(),
            test: false,
            commit: true,
            debug: false,
        }
    }
}

/// Classified outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The device already matches the definition.
    NoOp,
    /// The configuration was changed and committed.
    Changed,
    /// The change was computed and discarded (test mode or commit
    /// disabled).
    Discarded,
    /// The invocation failed.
    Failed,
}

/// Changes reported by an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    /// Unified diff against the running configuration, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Raw rendered configuration, debug mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded: Option<String>,
}

impl Changes {
    /// Whether neither a diff nor a loaded config was recorded.
    pub fn is_empty(&self) -> bool {
        self.diff.is_none() && self.loaded.is_none()
    }
}

/// The uniform record returned by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// Invocation name, as given by the caller
    pub name: String,
    /// `Some(true)` on success (no-op or committed change), `Some(false)`
    /// on failure, `None` when the change was computed but discarded
    pub result: Option<bool>,
    /// Human-readable summary of what happened
    pub comment: String,
    /// Diff and, in debug mode, the raw loaded configuration
    pub changes: Changes,
}

impl ReconcileResult {
    /// A successful result with no changes recorded.
    pub fn success(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Some(true),
            comment: comment.into(),
            changes: Changes::default(),
        }
    }

    /// A failed result carrying a diagnostic.
    pub fn failed(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Some(false),
            comment: comment.into(),
            changes: Changes::default(),
        }
    }

    /// A discarded result (test mode or commit disabled).
    pub fn discarded(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: None,
            comment: comment.into(),
            changes: Changes::default(),
        }
    }

    /// Attach a diff.
    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.changes.diff = Some(diff.into());
        self
    }

    /// Attach the raw rendered configuration.
    pub fn with_loaded(mut self, loaded: impl Into<String>) -> Self {
        self.changes.loaded = Some(loaded.into());
        self
    }

    /// Classify the outcome.
    pub fn outcome(&self) -> Outcome {
        match self.result {
            Some(false) => Outcome::Failed,
            None => Outcome::Discarded,
            Some(true) if self.changes.diff.is_some() => Outcome::Changed,
            Some(true) => Outcome::NoOp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = StateOptions::default();
        assert_eq!(opts.pillar_key, "acl");
        assert!(!opts.merge_defaults);
        assert!(opts.revision_date);
        assert_eq!(opts.revision_date_format, "%Y/%m/%d");
        assert!(!opts.test);
        assert!(opts.commit);
        assert!(!opts.debug);
    }

    #[test]
    fn test_outcome_classification() {
        let name = "edge01";
        assert_eq!(
            ReconcileResult::success(name, "Already configured.").outcome(),
            Outcome::NoOp
        );
        assert_eq!(
            ReconcileResult::success(name, "Configuration changed!")
                .with_diff("+ filter f {")
                .outcome(),
            Outcome::Changed
        );
        assert_eq!(
            ReconcileResult::discarded(name, "Testing mode: Configuration discarded.").outcome(),
            Outcome::Discarded
        );
        assert_eq!(
            ReconcileResult::failed(name, "apply error: rejected").outcome(),
            Outcome::Failed
        );
    }

    #[test]
    fn test_changes_serialization_skips_absent_fields() {
        let result = ReconcileResult::success("s", "Already configured.");
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("diff"));
        assert!(!json.contains("loaded"));
        // discarded runs serialize result as null
        let json =
            serde_json::to_string(&ReconcileResult::discarded("s", "discarded")).unwrap();
        assert!(json.contains("\"result\":null"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: StateOptions = serde_yaml::from_str("test: true\nmerge_defaults: true").unwrap();
        assert!(opts.test);
        assert!(opts.merge_defaults);
        assert_eq!(opts.pillar_key, "acl");
        assert!(opts.commit);
    }
}
