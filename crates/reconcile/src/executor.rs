//! The compile/diff/commit outcome machine.
//!
//! Drives a [`Device`] through one candidate-configuration session and
//! folds every outcome into a [`ReconcileResult`]: empty diff is a no-op,
//! test mode diffs and discards, commit applies, and any transport
//! failure discards best-effort and surfaces the transport's own
//! diagnostic. No retries; a failed reconciliation is terminal for the
//! invocation.

use crate::device::Device;
use crate::types::ReconcileResult;

/// Stage, diff, and commit or discard one rendered configuration.
pub fn run(
    device: &mut dyn Device,
    name: &str,
    config: &str,
    test: bool,
    commit: bool,
    debug: bool,
) -> ReconcileResult {
    let attach = |result: ReconcileResult| {
        if debug {
            result.with_loaded(config)
        } else {
            result
        }
    };

    if let Err(err) = device.load_candidate(config) {
        return ReconcileResult::failed(name, err.to_string());
    }

    let diff = match device.compare() {
        Ok(diff) => diff,
        Err(err) => {
            discard_best_effort(device);
            return attach(ReconcileResult::failed(name, err.to_string()));
        }
    };

    if diff.is_empty() {
        discard_best_effort(device);
        return attach(ReconcileResult::success(name, "Already configured."));
    }

    if test {
        discard_best_effort(device);
        return attach(
            ReconcileResult::discarded(name, "Testing mode: Configuration discarded.")
                .with_diff(diff),
        );
    }

    if !commit {
        discard_best_effort(device);
        return attach(
            ReconcileResult::discarded(name, "Configuration discarded: enable commit to apply.")
                .with_diff(diff),
        );
    }

    match device.commit() {
        Ok(()) => attach(ReconcileResult::success(name, "Configuration changed!").with_diff(diff)),
        Err(err) => {
            discard_best_effort(device);
            attach(ReconcileResult::failed(name, err.to_string()).with_diff(diff))
        }
    }
}

fn discard_best_effort(device: &mut dyn Device) {
    if let Err(err) = device.discard() {
        log::warn!("failed to discard candidate configuration: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::InMemoryDevice;
    use crate::error::{Error, Result};
    use crate::types::Outcome;

    /// Device that fails at a chosen stage.
    struct FailingDevice {
        inner: InMemoryDevice,
        fail_load: bool,
        fail_commit: bool,
    }

    impl FailingDevice {
        fn new(fail_load: bool, fail_commit: bool) -> Self {
            Self {
                inner: InMemoryDevice::with_running("old\n"),
                fail_load,
                fail_commit,
            }
        }
    }

    impl Device for FailingDevice {
        fn load_candidate(&mut self, config: &str) -> Result<()> {
            if self.fail_load {
                return Err(Error::compile("candidate rejected: syntax error at line 1"));
            }
            self.inner.load_candidate(config)
        }

        fn compare(&mut self) -> Result<String> {
            self.inner.compare()
        }

        fn commit(&mut self) -> Result<()> {
            if self.fail_commit {
                return Err(Error::apply("commit rejected: out of memory"));
            }
            self.inner.commit()
        }

        fn discard(&mut self) -> Result<()> {
            self.inner.discard()
        }
    }

    const CONFIG: &str = "filter f {\n    term t {\n        then {\n            accept;\n        }\n    }\n}\n";

    #[test]
    fn test_no_op_when_already_configured() {
        let mut device = InMemoryDevice::with_running(CONFIG);
        let result = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(result.result, Some(true));
        assert_eq!(result.comment, "Already configured.");
        assert!(result.changes.is_empty());
        assert_eq!(result.outcome(), Outcome::NoOp);
    }

    #[test]
    fn test_commit_applies_and_reports_diff() {
        let mut device = InMemoryDevice::new();
        let result = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(result.result, Some(true));
        assert_eq!(result.comment, "Configuration changed!");
        assert!(result.changes.diff.as_ref().unwrap().contains("+filter f {"));
        assert_eq!(device.running(), CONFIG);
    }

    #[test]
    fn test_test_mode_discards_and_reports_diff() {
        let mut device = InMemoryDevice::new();
        let result = run(&mut device, "s", CONFIG, true, true, false);
        assert_eq!(result.result, None);
        assert_eq!(result.comment, "Testing mode: Configuration discarded.");
        assert!(result.changes.diff.is_some());
        // nothing committed
        assert_eq!(device.running(), "");
        assert!(!device.has_candidate());
    }

    #[test]
    fn test_commit_disabled_discards() {
        let mut device = InMemoryDevice::new();
        let result = run(&mut device, "s", CONFIG, false, false, false);
        assert_eq!(result.result, None);
        assert!(result.comment.contains("enable commit"));
        assert_eq!(device.running(), "");
    }

    #[test]
    fn test_idempotent_second_apply_is_a_no_op() {
        let mut device = InMemoryDevice::new();
        let first = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(first.comment, "Configuration changed!");

        let second = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(second.result, Some(true));
        assert_eq!(second.comment, "Already configured.");
        assert!(second.changes.is_empty());
    }

    #[test]
    fn test_load_failure_surfaces_transport_diagnostic() {
        let mut device = FailingDevice::new(true, false);
        let result = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(result.result, Some(false));
        assert!(result.comment.contains("syntax error at line 1"));
        assert_eq!(device.inner.running(), "old\n");
    }

    #[test]
    fn test_commit_failure_discards_and_surfaces_diagnostic() {
        let mut device = FailingDevice::new(false, true);
        let result = run(&mut device, "s", CONFIG, false, true, false);
        assert_eq!(result.result, Some(false));
        assert!(result.comment.contains("out of memory"));
        // running configuration untouched, candidate dropped
        assert_eq!(device.inner.running(), "old\n");
        assert!(!device.inner.has_candidate());
    }

    #[test]
    fn test_debug_attaches_loaded_config() {
        let mut device = InMemoryDevice::new();
        let result = run(&mut device, "s", CONFIG, true, true, true);
        assert_eq!(result.changes.loaded.as_deref(), Some(CONFIG));

        let mut device = InMemoryDevice::with_running(CONFIG);
        let result = run(&mut device, "s", CONFIG, false, true, true);
        // attached even on no-op
        assert_eq!(result.changes.loaded.as_deref(), Some(CONFIG));
    }
}
