//! Persistence for the station summary file.
//!
//! One `id:value` line per station, no header.

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzers::types::StationAverage;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::path::Path;

const SUMMARY_DELIMITER: u8 = b':';

/// Logs summary rows as pretty-printed JSON.
pub fn print_json(rows: &[StationAverage]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

/// Writes (replacing) the summary file at `path`.
pub fn write_summary(path: &Path, rows: &[StationAverage]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing station summary");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(SUMMARY_DELIMITER)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a summary file written by [`write_summary`].
pub fn read_summary(path: &Path) -> Result<Vec<StationAverage>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(SUMMARY_DELIMITER)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: StationAverage = result?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn row(id: &str, average: f64) -> StationAverage {
        StationAverage {
            station_id: id.to_string(),
            average,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&[row("1", 0.5)]).unwrap();
    }

    #[test]
    fn test_summary_lines_are_id_colon_value() {
        let tmp = TempDir::new("summary-format").unwrap();
        let path = tmp.path().join("average_occupancies.txt");

        write_summary(&path, &[row("3", 0.25), row("17", 0.0)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["3:0.25", "17:0.0"]);
    }

    #[test]
    fn test_read_summary_accepts_handwritten_file() {
        let tmp = TempDir::new("summary-read").unwrap();
        let path = tmp.path().join("average_occupancies.txt");
        fs::write(&path, "1:0.4182\n2:0.05\n").unwrap();

        let rows = read_summary(&path).unwrap();
        assert_eq!(rows, vec![row("1", 0.4182), row("2", 0.05)]);
    }

    #[test]
    fn test_write_summary_replaces_previous_content() {
        let tmp = TempDir::new("summary-replace").unwrap();
        let path = tmp.path().join("average_occupancies.txt");

        write_summary(&path, &[row("1", 0.1), row("2", 0.2)]).unwrap();
        write_summary(&path, &[row("9", 0.9)]).unwrap();

        assert_eq!(read_summary(&path).unwrap(), vec![row("9", 0.9)]);
    }
}
