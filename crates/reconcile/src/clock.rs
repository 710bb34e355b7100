//! Injected date source.
//!
//! Revision stamps embed the generation date. Taking the date from a
//! [`Clock`] instead of the wall clock keeps rendered output, and
//! therefore diffs, deterministic under test.

use chrono::NaiveDate;

/// Supplies the date used for revision stamping.
pub trait Clock: Send + Sync {
    /// The current date.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates, local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
