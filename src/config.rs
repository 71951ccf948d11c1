//! Named settings shared by the CLI commands.
//!
//! Every value has a default, can be set with a flag, and falls back to an
//! environment variable (a `.env` file is loaded before parsing).

use crate::analyzers::analyzer::AnalysisSettings;
use crate::collector::Schedule;
use crate::fetch::RetryPolicy;
use crate::store::Layout;
use clap::Args;
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STATUS_URL: &str = "https://gbfs.bluebikes.com/gbfs/en/station_status.json";
pub const DEFAULT_INFORMATION_URL: &str =
    "https://gbfs.bluebikes.com/gbfs/en/station_information.json";

/// Where data lives and where it comes from.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Directory holding one log file per station
    #[arg(long, env = "BIKESHARE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Global index of collection-run timestamps
    #[arg(long, env = "BIKESHARE_INDEX_FILE", default_value = "last_updated.txt")]
    pub index_file: PathBuf,

    /// GBFS station_status feed
    #[arg(long, env = "BIKESHARE_STATUS_URL", default_value = DEFAULT_STATUS_URL)]
    pub status_url: String,

    /// GBFS station_information feed
    #[arg(long, env = "BIKESHARE_INFORMATION_URL", default_value = DEFAULT_INFORMATION_URL)]
    pub information_url: String,
}

impl SourceArgs {
    pub fn layout(&self) -> Layout {
        Layout::new(&self.data_dir, &self.index_file)
    }
}

/// Collector loop timing.
#[derive(Debug, Clone, Args)]
pub struct CollectArgs {
    /// Poll on wall-clock multiples of this many seconds
    #[arg(short = 'i', long, env = "BIKESHARE_INTERVAL", default_value = "60")]
    pub interval: NonZeroU64,

    /// Number of polling cycles to run (0 = infinite)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub cycles: usize,

    /// Fetch attempts per cycle, including the first
    #[arg(long, env = "BIKESHARE_RETRY_ATTEMPTS", default_value_t = 4)]
    pub retry_attempts: u32,

    /// Delay after the first failed attempt, doubled after each further one
    #[arg(long, default_value_t = 2)]
    pub retry_base_secs: u64,

    /// Upper bound on the delay between attempts
    #[arg(long, default_value_t = 30)]
    pub retry_max_secs: u64,
}

impl CollectArgs {
    pub fn schedule(&self) -> Schedule {
        Schedule::every_secs(self.interval)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            base_delay: Duration::from_secs(self.retry_base_secs),
            max_delay: Duration::from_secs(self.retry_max_secs.max(self.retry_base_secs)),
        }
    }
}

/// Aggregation resolution and output locations.
#[derive(Debug, Clone, Args)]
pub struct AnalysisArgs {
    /// Width of one time bucket in seconds
    #[arg(long, env = "BIKESHARE_BUCKET_WIDTH", default_value = "10")]
    pub bucket_width: NonZeroU32,

    /// Buckets averaged into one hourly window
    #[arg(long, env = "BIKESHARE_HOURLY_BUCKETS", default_value = "360")]
    pub hourly_buckets: NonZeroUsize,

    /// Upper bound on the number of stations processed
    #[arg(long, env = "BIKESHARE_MAX_STATIONS", default_value_t = 218)]
    pub max_stations: usize,

    /// Directory plots are written to
    #[arg(long, env = "BIKESHARE_DIAGRAMS_DIR", default_value = "diagrams")]
    pub diagrams_dir: PathBuf,

    /// `id:value` file of per-station average occupancy
    #[arg(long, env = "BIKESHARE_SUMMARY_FILE", default_value = "average_occupancies.txt")]
    pub summary_file: PathBuf,
}

impl AnalysisArgs {
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            bucket_width: self.bucket_width,
            hourly_buckets: self.hourly_buckets,
            max_stations: self.max_stations,
        }
    }
}
