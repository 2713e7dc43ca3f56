//! Batch outcome reporting.
//!
//! Every batch command processes a list of independent items (images, mask
//! archives, per-image documents). Item failures never abort the batch; they
//! are tallied here and printed as a final summary.

use std::fmt;

/// Outcome counters and notable events of one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Short name of the batch (e.g. `coco grapes/train`).
    pub operation: String,
    /// Items written successfully.
    pub succeeded: usize,
    /// Items that hit an I/O or format error.
    pub failed: usize,
    /// Items whose referenced file does not exist.
    pub not_found: usize,
    /// Malformed input rows that were dropped.
    pub skipped_rows: usize,
    /// Boxes dropped for zero or negative extent after clamping.
    pub degenerate_boxes: usize,
    pub issues: Vec<BatchIssue>,
}

impl BatchReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: BatchIssue) {
        self.issues.push(issue);
    }

    /// Total number of items looked at.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.not_found
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == BatchSeverity::Warning)
            .count()
    }

    /// Adds the counters and issues of `other` into `self`.
    pub fn absorb(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.not_found += other.not_found;
        self.skipped_rows += other.skipped_rows;
        self.degenerate_boxes += other.degenerate_boxes;
        self.issues.extend(other.issues);
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.operation)?;
        writeln!(
            f,
            "  {} succeeded, {} failed, {} not found",
            self.succeeded, self.failed, self.not_found
        )?;

        if self.skipped_rows > 0 || self.degenerate_boxes > 0 {
            writeln!(
                f,
                "  {} malformed rows skipped, {} degenerate boxes dropped",
                self.skipped_rows, self.degenerate_boxes
            )?;
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == BatchSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let notes = self.issues.len() - warnings;
        if notes > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", notes)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == BatchSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// A single notable event during a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchIssue {
    pub severity: BatchSeverity,
    pub code: BatchIssueCode,
    pub message: String,
}

impl BatchIssue {
    pub fn warning(code: BatchIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: BatchSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: BatchIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: BatchSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchSeverity {
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatchIssueCode {
    /// A listed image has neither a `.jpg` nor a `.png` file.
    ImageNotFound,
    /// An item failed with an I/O or format error.
    ItemFailed,
    /// Image size could not be read; a default size was used.
    EstimatedDimensions,
    /// No berry count file exists for a document.
    BerryFileNotFound,
    /// The split list was missing or empty; the image directory was used.
    SplitListFallback,
    /// The input directory held no matching files.
    NoInputs,
    /// Another input with the same stem was processed instead.
    DuplicateStem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_counts_and_warnings() {
        let mut report = BatchReport::new("masks");
        report.succeeded = 3;
        report.failed = 1;
        report.add(BatchIssue::warning(
            BatchIssueCode::ItemFailed,
            "bad.npz: mask has no channels",
        ));
        report.add(BatchIssue::info(BatchIssueCode::NoInputs, "note"));

        let text = report.to_string();
        assert!(text.starts_with("masks:\n"));
        assert!(text.contains("3 succeeded, 1 failed, 0 not found"));
        assert!(text.contains("Warnings (1):"));
        assert!(text.contains("  - bad.npz: mask has no channels"));
        assert!(text.contains("Notes (1):"));
        assert!(!text.contains("degenerate"));
    }

    #[test]
    fn absorb_adds_counters() {
        let mut total = BatchReport::new("coco");
        let mut part = BatchReport::new("coco train");
        part.succeeded = 2;
        part.degenerate_boxes = 1;
        part.add(BatchIssue::warning(BatchIssueCode::ImageNotFound, "x"));

        total.absorb(part.clone());
        total.absorb(part);
        assert_eq!(total.succeeded, 4);
        assert_eq!(total.degenerate_boxes, 2);
        assert_eq!(total.issues.len(), 2);
        assert_eq!(total.total(), 4);
    }
}
