//! The observed collection window, read from the global index.

use crate::errors::LogError;
use crate::store::{AppendLog, IndexEntry, LogRecord, LogState};
use std::num::NonZeroU32;

/// Inclusive span `[start, end]` of Unix seconds covered by a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Result<Self, LogError> {
        if end < start {
            return Err(LogError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn span(&self) -> i64 {
        self.end - self.start
    }

    /// `ceil(span / width) + 1`, so a single-instant window still has one
    /// bucket.
    pub fn bucket_count(&self, width: NonZeroU32) -> usize {
        let width = i64::from(width.get());
        let full = (self.span() + width - 1) / width;
        full as usize + 1
    }

    /// Index of the bucket holding `timestamp`, clamped into
    /// `0..bucket_count`.
    pub fn bucket_of(&self, timestamp: i64, width: NonZeroU32) -> usize {
        let offset = timestamp - self.start;
        if offset <= 0 {
            return 0;
        }
        let index = (offset / i64::from(width.get())) as usize;
        index.min(self.bucket_count(width) - 1)
    }
}

/// Reads the first and last entries of the index without scanning the
/// entries in between.
#[tracing::instrument(skip(index), fields(path = %index.path().display()))]
pub fn resolve_window(index: &AppendLog<IndexEntry>) -> Result<TimeWindow, LogError> {
    let start = match index.first()? {
        LogState::Missing => return Err(LogError::MissingIndex),
        state => state.into_records().pop().ok_or(LogError::EmptyIndex)?,
    };

    let end = match index.latest()? {
        Some(entry) => entry,
        // Tail lines all unreadable; fall back to a full scan.
        None => index
            .read_all()?
            .into_records()
            .pop()
            .ok_or(LogError::EmptyIndex)?,
    };

    let window = TimeWindow::new(start.sequence(), end.sequence())?;
    tracing::debug!(start = window.start, end = window.end, "Collection window resolved");
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn width(secs: u32) -> NonZeroU32 {
        NonZeroU32::new(secs).unwrap()
    }

    fn index_with(dir: &TempDir, content: &str) -> AppendLog<IndexEntry> {
        let path = dir.path().join("last_updated.txt");
        fs::write(&path, content).unwrap();
        AppendLog::open(path)
    }

    #[test]
    fn test_single_entry_window_has_one_bucket() {
        let dir = TempDir::new("window-single").unwrap();
        let window = resolve_window(&index_with(&dir, "1000")).unwrap();

        assert_eq!(window, TimeWindow { start: 1000, end: 1000 });
        assert_eq!(window.bucket_count(width(10)), 1);
    }

    #[test]
    fn test_legacy_index_with_blank_first_line() {
        let dir = TempDir::new("window-legacy").unwrap();
        let window = resolve_window(&index_with(&dir, "\n1000\n1060\n1120\n")).unwrap();
        assert_eq!(window, TimeWindow { start: 1000, end: 1120 });
    }

    #[test]
    fn test_cut_off_last_entry_does_not_shorten_window() {
        let dir = TempDir::new("window-cut").unwrap();
        let index = index_with(&dir, "1700000000\n1700000060\n17000");
        let window = resolve_window(&index).unwrap();
        assert_eq!(window, TimeWindow { start: 1700000000, end: 1700000060 });
    }

    #[test]
    fn test_missing_and_empty_index() {
        let dir = TempDir::new("window-missing").unwrap();
        let missing: AppendLog<IndexEntry> = AppendLog::open(dir.path().join("nope.txt"));
        assert!(matches!(resolve_window(&missing), Err(LogError::MissingIndex)));

        let empty = index_with(&dir, "\n\n");
        assert!(matches!(resolve_window(&empty), Err(LogError::EmptyIndex)));
    }

    #[test]
    fn test_inverted_index_is_rejected() {
        let dir = TempDir::new("window-inverted").unwrap();
        let index = index_with(&dir, "2000\n1000\n");
        assert!(matches!(
            resolve_window(&index),
            Err(LogError::InvertedWindow { start: 2000, end: 1000 })
        ));
    }

    #[test]
    fn test_bucket_count_rounds_up() {
        let window = TimeWindow::new(100, 140).unwrap();
        assert_eq!(window.bucket_count(width(10)), 5);

        let window = TimeWindow::new(100, 145).unwrap();
        assert_eq!(window.bucket_count(width(10)), 6);
    }

    #[test]
    fn test_bucket_of_clamps_both_ends() {
        let window = TimeWindow::new(100, 140).unwrap();
        assert_eq!(window.bucket_of(40, width(10)), 0);
        assert_eq!(window.bucket_of(109, width(10)), 0);
        assert_eq!(window.bucket_of(110, width(10)), 1);
        assert_eq!(window.bucket_of(140, width(10)), 4);
        assert_eq!(window.bucket_of(9999, width(10)), 4);
    }
}
