//! CLI entry point for the bike-share occupancy tool.
//!
//! Provides subcommands for collecting station status into per-station logs
//! and for turning those logs into summary files and plots.

use anyhow::{Context, Result};
use bikeshare_occupancy::analyzers::analyzer::{Analysis, analyze};
use bikeshare_occupancy::collector::Collector;
use bikeshare_occupancy::config::{AnalysisArgs, CollectArgs, SourceArgs};
use bikeshare_occupancy::fetch::{BasicClient, RetryPolicy};
use bikeshare_occupancy::gbfs::StationGeo;
use bikeshare_occupancy::infra::gbfs::GbfsClient;
use bikeshare_occupancy::output::{print_json, read_summary, write_summary};
use bikeshare_occupancy::plots::catalogue::{
    activity_plots, hourly_frames, occupancy_plots, summary_chart,
};
use bikeshare_occupancy::plots::{BitmapRenderer, Renderer, ScatterPlot};
use bikeshare_occupancy::services::StationSource;
use bikeshare_occupancy::window::resolve_window;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_occupancy")]
#[command(about = "Collect bike-share station status and chart occupancy", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll station status on a fixed cadence and append new snapshots
    Collect {
        #[command(flatten)]
        collect: CollectArgs,
    },
    /// Print the collection window recorded in the index
    Window,
    /// Plot stations by how many snapshots they logged
    Activity {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Write the average occupancy summary and plot stations by it
    Occupancy {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Also log the summary rows as JSON
        #[arg(long, default_value_t = false)]
        print: bool,
    },
    /// Draw the bar chart of the summary file
    SummaryChart {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Draw one occupancy frame per hourly window
    Hourly {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_occupancy.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_occupancy.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let source = cli.source;

    match cli.command {
        Commands::Collect { collect } => {
            let collector = Collector::new(station_source(&source)?, source.layout(), collect.retry());

            if let Some(report) = collector.setup().await? {
                info!(
                    appended = report.appended,
                    rejected = report.rejected,
                    "Station files initialized"
                );
            }

            if collect.cycles == 0 {
                info!(interval = collect.interval.get(), "Collecting indefinitely. Press Ctrl+C to stop.");
            } else {
                info!(cycles = collect.cycles, interval = collect.interval.get(), "Starting collection");
            }

            let completed = collector
                .run(collect.schedule(), collect.cycles, shutdown_signal())
                .await?;
            info!(cycles = completed, data_dir = %source.data_dir.display(), "Collection finished");
        }
        Commands::Window => {
            let window = resolve_window(&source.layout().index())?;
            info!(
                start = window.start,
                end = window.end,
                span_secs = window.span(),
                start_local = %local_time(window.start),
                end_local = %local_time(window.end),
                "Collection window"
            );
        }
        Commands::Activity { analysis } => {
            let (result, geo) = load_analysis(&source, &analysis).await?;
            render_all(&analysis, &activity_plots(&result, &geo))?;
        }
        Commands::Occupancy { analysis, print } => {
            let (result, geo) = load_analysis(&source, &analysis).await?;
            let rows = result.averages();

            write_summary(&analysis.summary_file, &rows)?;
            info!(
                stations = rows.len(),
                path = %analysis.summary_file.display(),
                "Summary written"
            );
            if print {
                print_json(&rows)?;
            }

            render_all(&analysis, &occupancy_plots(&result, &geo))?;
        }
        Commands::SummaryChart { analysis } => {
            let rows = read_summary(&analysis.summary_file).with_context(|| {
                format!(
                    "Failed to read summary {}; run `occupancy` first",
                    analysis.summary_file.display()
                )
            })?;
            if rows.is_empty() {
                warn!(path = %analysis.summary_file.display(), "Summary file has no rows");
            }
            BitmapRenderer::new(&analysis.diagrams_dir)?.bars(&summary_chart(&rows))?;
        }
        Commands::Hourly { analysis } => {
            let (result, geo) = load_analysis(&source, &analysis).await?;
            let frames = hourly_frames(&result, &geo);
            info!(frames = frames.len(), "Hourly frames built");
            render_all(&analysis, &frames)?;
        }
    }

    Ok(())
}

fn station_source(source: &SourceArgs) -> Result<GbfsClient<BasicClient>> {
    Ok(GbfsClient::new(
        BasicClient::new()?,
        source.status_url.clone(),
        source.information_url.clone(),
    ))
}

/// Fetches station coordinates and aggregates every station log.
#[tracing::instrument(skip_all, fields(data_dir = %source.data_dir.display()))]
async fn load_analysis(
    source: &SourceArgs,
    analysis: &AnalysisArgs,
) -> Result<(Analysis, Vec<StationGeo>)> {
    let client = station_source(source)?;
    let geo = RetryPolicy::default()
        .run("station information fetch", || client.station_information())
        .await?;
    info!(stations = geo.len(), "Station information loaded");

    let result = analyze(&source.layout(), &geo, analysis.settings())?;
    Ok((result, geo))
}

fn render_all(analysis: &AnalysisArgs, plots: &[ScatterPlot]) -> Result<()> {
    let renderer = BitmapRenderer::new(&analysis.diagrams_dir)?;
    for plot in plots {
        renderer
            .scatter(plot)
            .with_context(|| format!("Failed to render {}", plot.file_name))?;
    }
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn local_time(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.with_timezone(&Local).to_rfc3339())
        .unwrap_or_else(|| unix_secs.to_string())
}
