//! Append-only, line-oriented record logs.
//!
//! [`AppendLog`] stores one encoded record per line and never rewrites
//! earlier lines. Reads report a missing file as [`LogState::Missing`] and
//! skip (and count) lines that fail to decode, so "no data yet" and "corrupt
//! data" stay distinguishable.

mod layout;
mod records;
mod tail;

pub use layout::{Layout, station_order};
pub use records::IndexEntry;

use crate::errors::LogError;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tail::Segments;

/// How many trailing lines [`AppendLog::latest`] inspects for a decodable
/// record before giving up.
const TAIL_LOOKBACK: usize = 8;

/// A record that can live on one line of an [`AppendLog`].
pub trait LogRecord: Sized {
    /// Whether a cut-off encoding can never decode. When it can, an
    /// unterminated trailing line is trusted only if it is the only line in
    /// the file.
    const SELF_DELIMITING: bool = true;

    /// The key the log is ordered by.
    fn sequence(&self) -> i64;

    fn encode(&self) -> Result<String, LogError>;

    fn decode(line: &str) -> Result<Self, Box<dyn Error + Send + Sync>>;
}

/// Records decoded from a log that exists on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LogContents<R> {
    pub records: Vec<R>,
    /// Complete lines that failed to decode.
    pub malformed: usize,
    /// An unterminated trailing line that failed to decode, most likely a
    /// write still in progress.
    pub partial_tail: bool,
}

/// Result of reading an [`AppendLog`].
#[derive(Debug, Clone, PartialEq)]
pub enum LogState<R> {
    /// No file exists yet.
    Missing,
    Present(LogContents<R>),
}

impl<R> LogState<R> {
    pub fn is_missing(&self) -> bool {
        matches!(self, LogState::Missing)
    }

    /// Decoded records, empty for a missing log.
    pub fn records(&self) -> &[R] {
        match self {
            LogState::Missing => &[],
            LogState::Present(contents) => &contents.records,
        }
    }

    pub fn into_records(self) -> Vec<R> {
        match self {
            LogState::Missing => Vec::new(),
            LogState::Present(contents) => contents.records,
        }
    }

    /// Number of malformed lines encountered, 0 for a missing log.
    pub fn malformed(&self) -> usize {
        match self {
            LogState::Missing => 0,
            LogState::Present(contents) => contents.malformed,
        }
    }
}

/// What [`AppendLog::append_if_newer`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was written. `previous` is the sequence of the record it
    /// now follows, if any.
    Appended { previous: Option<i64> },
    /// The stored tail is at least as new; nothing was written.
    Unchanged { stored: i64 },
}

/// An append-only log of `R` records at `path`.
#[derive(Debug, Clone)]
pub struct AppendLog<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: LogRecord> AppendLog<R> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends `record` as one newline-terminated line, creating the file if
    /// needed.
    pub fn append(&self, record: &R) -> Result<(), LogError> {
        let encoded = record.encode()?;
        if encoded.contains('\n') {
            return Err(LogError::MultiLineRecord);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        // Files written by older collectors end without a newline.
        let mut line = String::with_capacity(encoded.len() + 2);
        if !ends_with_newline(&mut file)? {
            line.push('\n');
        }
        line.push_str(&encoded);
        line.push('\n');

        file.write_all(line.as_bytes())?;
        file.flush()?;
        debug!(path = %self.path.display(), sequence = record.sequence(), "Record appended");
        Ok(())
    }

    /// Appends `record` only if its sequence is strictly greater than the
    /// latest stored record's. A missing or empty log always accepts.
    pub fn append_if_newer(&self, record: &R) -> Result<AppendOutcome, LogError> {
        let previous = self.latest()?.map(|r| r.sequence());

        match previous {
            Some(stored) if record.sequence() <= stored => Ok(AppendOutcome::Unchanged { stored }),
            previous => {
                self.append(record)?;
                Ok(AppendOutcome::Appended { previous })
            }
        }
    }

    /// The last decodable record, read from the tail of the file.
    pub fn latest(&self) -> Result<Option<R>, LogError> {
        Ok(self.last(TAIL_LOOKBACK)?.into_records().pop())
    }

    /// Decodes the last `n` non-blank lines.
    pub fn last(&self, n: usize) -> Result<LogState<R>, LogError> {
        self.read_with(|file| tail::read_tail(file, n))
    }

    /// Decodes the first non-blank line.
    pub fn first(&self) -> Result<LogState<R>, LogError> {
        self.read_with(tail::read_head)
    }

    /// Decodes every line, in file order.
    pub fn read_all(&self) -> Result<LogState<R>, LogError> {
        self.read_with(tail::read_all)
    }

    fn read_with(
        &self,
        read: impl FnOnce(&mut File) -> io::Result<Segments>,
    ) -> Result<LogState<R>, LogError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LogState::Missing),
            Err(e) => return Err(e.into()),
        };

        let segments = read(&mut file)?;
        Ok(LogState::Present(self.decode_segments(segments)))
    }

    fn decode_segments(&self, segments: Segments) -> LogContents<R> {
        let mut records = Vec::with_capacity(segments.complete.len() + 1);
        let mut malformed = 0;

        for line in &segments.complete {
            match R::decode(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    malformed += 1;
                    warn!(
                        path = %self.path.display(),
                        line = %excerpt(line),
                        error = %e,
                        "Skipping malformed log line"
                    );
                }
            }
        }

        let trust_fragment = R::SELF_DELIMITING || segments.fragment_is_sole;
        let mut partial_tail = false;
        if let Some(fragment) = segments.fragment {
            match R::decode(&fragment) {
                Ok(record) if trust_fragment => records.push(record),
                Ok(_) => {
                    partial_tail = true;
                    debug!(
                        path = %self.path.display(),
                        line = %excerpt(&fragment),
                        "Ignoring unterminated trailing line that may be cut off"
                    );
                }
                Err(e) => {
                    partial_tail = true;
                    debug!(
                        path = %self.path.display(),
                        error = %e,
                        "Ignoring unterminated trailing line"
                    );
                }
            }
        }

        LogContents {
            records,
            malformed,
            partial_tail,
        }
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn excerpt(line: &str) -> String {
    const MAX: usize = 80;
    match line.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
