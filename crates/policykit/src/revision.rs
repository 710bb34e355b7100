//! Revision stamping.
//!
//! Generated configurations carry provenance comments (`$Id$`, `$Date$`,
//! `$Revision$`) so an operator reading the device config can trace which
//! declaration produced it. Stamping is purely descriptive: the lines are
//! comments, never match semantics. The date is an input, not wall-clock,
//! so rendered output stays deterministic under test.

use chrono::NaiveDate;

/// Provenance to embed in generated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStamp {
    /// Change identifier, conventionally the invocation name
    pub id: String,
    /// Optional revision counter
    pub number: Option<u64>,
    /// Whether to emit the generation date
    pub date: bool,
    /// strftime format for the date line
    pub date_format: String,
}

impl RevisionStamp {
    /// Stamp with an id, date enabled, default `%Y/%m/%d` format.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: None,
            date: true,
            date_format: "%Y/%m/%d".to_string(),
        }
    }

    /// Set the revision counter.
    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    /// Enable or disable the date line.
    pub fn with_date(mut self, date: bool) -> Self {
        self.date = date;
        self
    }

    /// Set the date format.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Render the comment lines for a given date.
    ///
    /// Deterministic: same stamp + same date = same lines, in a fixed
    /// order (`$Id$`, `$Date$`, `$Revision$`).
    pub fn comment_lines(&self, today: NaiveDate) -> Vec<String> {
        let mut lines = vec![format!("$Id: {} $", self.id)];
        if self.date {
            lines.push(format!("$Date: {} $", today.format(&self.date_format)));
        }
        if let Some(number) = self.number {
            lines.push(format!("$Revision: {number} $"));
        }
        lines
    }
}
