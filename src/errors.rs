//! Errors from the storage layer.
use std::{error::Error, fmt::Display};

/// Error from the append-only log interface.
#[derive(Debug)]
pub enum LogError {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// A record could not be serialized to JSON.
    Encode(::serde_json::Error),

    // My own errors from this crate
    /// An encoded record contained a line break and would span two lines.
    MultiLineRecord,
    /// A station id that cannot name a file inside the data directory.
    InvalidStationId(String),
    /// The global index file does not exist yet.
    MissingIndex,
    /// The global index file exists but holds no timestamps.
    EmptyIndex,
    /// The last index entry is older than the first one.
    InvertedWindow { start: i64, end: i64 },
}

impl Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::LogError::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Encode(err) => write!(f, "record encoding error: {}", err),

            MultiLineRecord => write!(f, "encoded record spans more than one line"),
            InvalidStationId(id) => write!(f, "invalid station id: {:?}", id),
            MissingIndex => write!(f, "global index file does not exist"),
            EmptyIndex => write!(f, "global index file holds no timestamps"),
            InvertedWindow { start, end } => {
                write!(f, "index window ends ({}) before it starts ({})", end, start)
            }
        }
    }
}

// Display already carries the wrapped error's message.
impl Error for LogError {}

impl From<::std::io::Error> for LogError {
    fn from(err: ::std::io::Error) -> LogError {
        LogError::IO(err)
    }
}

impl From<::serde_json::Error> for LogError {
    fn from(err: ::serde_json::Error) -> LogError {
        LogError::Encode(err)
    }
}
