//! Console transcript: append-only ordered log of classified entries.

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Stdout,
    Stderr,
    System,
}

/// One console line. Immutable once created.
#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Entry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    pub fn stdout(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Stdout, content)
    }

    pub fn stderr(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Stderr, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(EntryKind::System, content)
    }
}

/// Ordered, insertion-order-significant console log. Entries are never
/// reordered or deduplicated; the whole log is dropped only by `clear`.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Most recent stderr entry, scanning from the end of the full log.
    /// Drives the explain-error affordance.
    pub fn last_stderr(&self) -> Option<&Entry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Stderr)
    }

    pub fn has_stderr(&self) -> bool {
        self.last_stderr().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order_and_length() {
        let mut log = Transcript::new();
        for i in 0..20 {
            log.push(Entry::stdout(format!("line {i}")));
        }
        assert_eq!(log.len(), 20);
        let contents: Vec<_> = log.iter().map(|e| e.content.as_str()).collect();
        for (i, c) in contents.iter().enumerate() {
            assert_eq!(*c, format!("line {i}"));
        }
    }

    #[test]
    fn last_stderr_scans_from_the_end() {
        let mut log = Transcript::new();
        log.push(Entry::stdout("out"));
        log.push(Entry::stderr("A"));
        log.push(Entry::system("marker"));
        log.push(Entry::stderr("B"));
        assert_eq!(log.last_stderr().unwrap().content, "B");
    }

    #[test]
    fn last_stderr_none_without_errors() {
        let mut log = Transcript::new();
        log.push(Entry::stdout("out"));
        log.push(Entry::system("marker"));
        assert!(log.last_stderr().is_none());
        assert!(!log.has_stderr());
    }

    #[test]
    fn timestamps_follow_arrival_order() {
        let mut log = Transcript::new();
        log.push(Entry::system("first"));
        log.push(Entry::stdout("second"));
        let stamps: Vec<_> = log.iter().map(|e| e.timestamp).collect();
        assert!(stamps[0] <= stamps[1]);
    }

    #[test]
    fn clear_resets_length() {
        let mut log = Transcript::new();
        log.push(Entry::stdout("a"));
        log.push(Entry::stderr("b"));
        log.clear();
        assert_eq!(log.len(), 0);
        assert!(log.is_empty());
    }
}
