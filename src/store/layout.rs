use super::{AppendLog, IndexEntry};
use crate::errors::LogError;
use crate::gbfs::StationSnapshot;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the collector keeps its files.
///
/// ```text
/// <index_file>                 one timestamp per line
/// <data_dir>/<station_id>.txt  one snapshot per line
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    data_dir: PathBuf,
    index_file: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>, index_file: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            index_file: index_file.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Creates the data directory and the index file's parent.
    pub fn prepare(&self) -> Result<(), LogError> {
        fs::create_dir_all(&self.data_dir)?;
        if let Some(parent) = self.index_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    pub fn index(&self) -> AppendLog<IndexEntry> {
        AppendLog::open(&self.index_file)
    }

    pub fn station_log(&self, station_id: &str) -> Result<AppendLog<StationSnapshot>, LogError> {
        if !is_valid_station_id(station_id) {
            return Err(LogError::InvalidStationId(station_id.to_string()));
        }
        Ok(AppendLog::open(
            self.data_dir.join(format!("{}.txt", station_id)),
        ))
    }

    /// Ids of every station log in the data directory, in [`station_order`].
    /// A missing data directory has no stations.
    pub fn station_ids(&self) -> Result<Vec<String>, LogError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_station_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort_by(|a, b| station_order(a, b));
        Ok(ids)
    }
}

fn is_valid_station_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

/// Numeric ids in numeric order, then everything else lexicographically.
pub fn station_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
