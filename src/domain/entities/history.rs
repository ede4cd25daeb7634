//! Canvas history log.

/// Ordered record of the image sources composited onto a canvas.
///
/// Entries past the persistence watermark have been pasted but not yet
/// written to the backing log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<String>,
    persisted: usize,
}

impl HistoryLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            persisted: 0,
        }
    }

    /// Creates a log from entries that are already on disk.
    #[must_use]
    pub fn from_persisted(entries: Vec<String>) -> Self {
        let persisted = entries.len();
        Self { entries, persisted }
    }

    /// Parses a log file body, one source reference per line.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        Self::from_persisted(entries)
    }

    /// Appends a source reference in composite order.
    pub fn append(&mut self, source: impl Into<String>) {
        self.entries.push(source.into());
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The most recently appended entry.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Entries appended since the last persistence mark.
    #[must_use]
    pub fn pending(&self) -> &[String] {
        &self.entries[self.persisted..]
    }

    /// Advances the persistence watermark past every current entry.
    pub fn mark_persisted(&mut self) {
        self.persisted = self.entries.len();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
