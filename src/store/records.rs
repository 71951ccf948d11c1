use super::LogRecord;
use crate::errors::LogError;
use crate::gbfs::StationSnapshot;
use std::error::Error;

impl LogRecord for StationSnapshot {
    fn sequence(&self) -> i64 {
        self.last_reported
    }

    fn encode(&self) -> Result<String, LogError> {
        Ok(serde_json::to_string(self)?)
    }

    fn decode(line: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(serde_json::from_str(line)?)
    }
}

/// One collection-run timestamp in the global index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry(pub i64);

impl LogRecord for IndexEntry {
    // a truncated integer is still an integer
    const SELF_DELIMITING: bool = false;

    fn sequence(&self) -> i64 {
        self.0
    }

    fn encode(&self) -> Result<String, LogError> {
        Ok(self.0.to_string())
    }

    fn decode(line: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(IndexEntry(line.trim().parse()?))
    }
}
