//! Sync results

use std::fmt;

use agmd_fs::NormalizedPath;

use crate::ErrorKind;

/// Where an entry got to during a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Resolving,
    Fetching,
    Composing,
    Written,
    Failed(ErrorKind),
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Resolving => f.write_str("resolving"),
            Self::Fetching => f.write_str("fetching"),
            Self::Composing => f.write_str("composing"),
            Self::Written => f.write_str("written"),
            Self::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}

/// One failure inside an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// The source that failed; `None` for entry-level failures
    pub source: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

/// What a successful entry wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDocument {
    pub file: NormalizedPath,
    /// The composed bytes matched the file on disk, so nothing was written
    pub unchanged: bool,
    /// Module files written under `.agmd/`
    pub module_files: usize,
    /// Set when `.agmd/` was rebuilt or removed
    pub modules_dir: Option<NormalizedPath>,
}

/// Outcome of one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub path: String,
    pub state: EntryState,
    pub failures: Vec<SourceFailure>,
    pub written: Option<WrittenDocument>,
}

impl EntryReport {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: EntryState::Pending,
            failures: Vec::new(),
            written: None,
        }
    }

    pub(crate) fn advance(&mut self, state: EntryState) {
        tracing::debug!(path = %self.path, from = %self.state, to = %state, "Entry state");
        self.state = state;
    }

    pub(crate) fn fail(
        &mut self,
        source: Option<&str>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) {
        let message = message.into();
        tracing::warn!(path = %self.path, source = ?source, kind = %kind, "{}", message);
        self.failures.push(SourceFailure {
            source: source.map(str::to_string),
            kind,
            message,
        });
    }

    /// Move to `Failed` with the first recorded failure's kind.
    pub(crate) fn finish_failed(&mut self) {
        if let Some(kind) = self.failures.first().map(|f| f.kind) {
            self.advance(EntryState::Failed(kind));
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, EntryState::Failed(_))
    }
}

/// Outcome of a whole sync run, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub entries: Vec<EntryReport>,
}

impl SyncReport {
    pub fn written_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Written)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, path: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_state() {
        let mut written = EntryReport::new(".");
        written.advance(EntryState::Written);
        let mut failed = EntryReport::new("docs");
        failed.fail(Some("o/r"), ErrorKind::SourceNotFound, "gone");
        failed.finish_failed();

        let report = SyncReport {
            entries: vec![written, failed],
        };

        assert_eq!(report.written_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(report.has_failures());
        assert_eq!(
            report.entry("docs").unwrap().state,
            EntryState::Failed(ErrorKind::SourceNotFound)
        );
    }

    #[test]
    fn state_display() {
        assert_eq!(
            EntryState::Failed(ErrorKind::SourceUnreachable).to_string(),
            "failed (SourceUnreachable)"
        );
        assert_eq!(EntryState::Written.to_string(), "written");
    }
}
