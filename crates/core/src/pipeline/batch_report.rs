use std::path::PathBuf;

use crate::shared::artwork_kind::ArtworkKind;

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Success,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Success => write!(f, "success"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What happened to one pointer file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub pointer_path: PathBuf,
    pub succeeded: bool,
    pub message: String,
    /// Kinds written during this run.
    pub generated: Vec<ArtworkKind>,
    /// Requested kinds that already existed on disk.
    pub skipped: Vec<ArtworkKind>,
}

impl FileOutcome {
    pub fn failed(pointer_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            pointer_path: pointer_path.into(),
            succeeded: false,
            message: message.into(),
            generated: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// True when every requested artwork already existed.
    pub fn is_skip(&self) -> bool {
        self.succeeded && self.generated.is_empty()
    }
}

/// Aggregated outcomes of one batch, ordered by pointer path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Set when the batch stopped early on a cancellation request.
    pub cancelled: bool,
}

impl BatchReport {
    /// Builds a report, sorting outcomes by path so reports are reproducible
    /// regardless of traversal or completion order.
    pub fn new(mut outcomes: Vec<FileOutcome>, cancelled: bool) -> Self {
        outcomes.sort_by(|a, b| a.pointer_path.cmp(&b.pointer_path));
        Self {
            outcomes,
            cancelled,
        }
    }

    /// `Success` only if every file succeeded and the batch ran to completion.
    pub fn status(&self) -> BatchStatus {
        if !self.cancelled && self.outcomes.iter().all(|o| o.succeeded) {
            BatchStatus::Success
        } else {
            BatchStatus::Failed
        }
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skip()).count()
    }

    /// Number of artwork images written.
    pub fn generated_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.generated.len()).sum()
    }

    /// One human-readable line per file.
    pub fn log_lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|o| {
                let verdict = if o.succeeded { "ok" } else { "FAILED" };
                format!("{} [{verdict}] {}", o.pointer_path.display(), o.message)
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} pointer files: {} images generated, {} already complete, {} failed",
            self.outcomes.len(),
            self.generated_count(),
            self.skipped_count(),
            self.failed_count()
        );
        if self.cancelled {
            text.push_str(" (cancelled)");
        }
        text
    }
}
