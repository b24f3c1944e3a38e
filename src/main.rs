use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use goes_sync::config::MirrorConfig;
use goes_sync::crawler;
use goes_sync::noaa::Noaa;
use goes_sync::partition::{TimePartition, TimeWindow};
use goes_sync::pipeline::{MetadataWriter, OutputFormat, Pipeline};
use goes_sync::sync::{sync, DownloadRequest};

#[derive(Parser)]
#[command(name = "goes-sync", version, about = "Mirror GOES products from the public NOAA buckets")]
struct Cli {
    /// TOML file supplying defaults for output root, satellite and region
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one hour partition, or every hour in a --start/--end range
    Download(DownloadArgs),
    /// Process already-mirrored files matching a product and time filter
    Bulk(BulkArgs),
    /// Re-download the current UTC hour partition on a fixed interval
    Watch(WatchArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Product name, e.g. ABI-L1b-RadF or ABI-L2-LSTF
    #[arg(long, default_value = "ABI-L1b-RadF")]
    product: String,

    /// GOES satellite number (16-19); defaults to the configured one
    #[arg(long)]
    satellite: Option<String>,

    /// Year, e.g. 2025; required unless --start/--end are given
    #[arg(long)]
    year: Option<i32>,

    /// Day of year
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=366))]
    day: Option<u32>,

    /// Hour of day, UTC
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
    hour: Option<u32>,

    /// Keep only objects whose start time falls on this minute
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=59))]
    minute: Option<u32>,

    /// ABI band; keeps only objects encoding this channel
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    band: Option<u8>,

    /// Download every matching object instead of the first
    #[arg(long)]
    all: bool,

    /// Download one object by its exact filename
    #[arg(long)]
    file_name: Option<String>,

    /// Range start, format 2025-01-31_15:00
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Range end, inclusive
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Root of the local mirror; defaults to the configured one
    #[arg(long)]
    output: Option<PathBuf>,

    /// Re-download files whose local size already matches
    #[arg(long)]
    overwrite: bool,
}

impl DownloadArgs {
    fn window(&self) -> Result<TimeWindow> {
        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            if self.minute.is_some() {
                warn!("--minute only applies to single-partition downloads, ignoring");
            }
            return Ok(TimeWindow::parse_range(start, end)?);
        }
        let (Some(year), Some(day), Some(hour)) = (self.year, self.day, self.hour) else {
            bail!("either --year/--day/--hour or --start/--end must be given");
        };
        let mut partition = TimePartition::new(year, day, hour);
        if let Some(minute) = self.minute {
            partition = partition.with_minute(minute);
        }
        Ok(TimeWindow::Single(partition))
    }
}

#[derive(Args)]
struct BulkArgs {
    /// GOES satellite number; defaults to the configured one
    #[arg(long)]
    satellite: Option<String>,

    /// Product name to match in directory and file names
    #[arg(long)]
    product: String,

    /// Year to match, or "all"
    #[arg(long, default_value = "all")]
    year: String,

    /// Day of year to match, or "all"
    #[arg(long, default_value = "all")]
    day: String,

    /// Hour to match, or "all"
    #[arg(long, default_value = "all")]
    hour: String,

    /// Minute to match, or "all"
    #[arg(long, default_value = "all")]
    minute: String,

    /// Root of the local mirror to crawl
    #[arg(long)]
    input_dir: PathBuf,

    /// Where derived artifacts go
    #[arg(long)]
    output_dir: PathBuf,

    /// Artifact format to request from the pipeline
    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Regenerate artifacts that already exist
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct WatchArgs {
    /// Product to keep current
    #[arg(long, default_value = "ABI-L2-LSTF")]
    product: String,

    /// GOES satellite number; defaults to the configured one
    #[arg(long)]
    satellite: Option<String>,

    /// Minutes between download passes
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// ABI band; keeps only objects encoding this channel
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    band: Option<u8>,

    /// Download every matching object instead of the first
    #[arg(long)]
    all: bool,

    /// Root of the local mirror; defaults to the configured one
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MirrorConfig::read(path)?,
        None => MirrorConfig::default(),
    };

    match &cli.command {
        Commands::Download(args) => download_command(args, &config).await,
        Commands::Bulk(args) => bulk_command(args, &config),
        Commands::Watch(args) => watch_command(args, &config).await,
    }
}

async fn download_command(args: &DownloadArgs, config: &MirrorConfig) -> Result<()> {
    let request = DownloadRequest {
        product: args.product.clone(),
        satellite: args
            .satellite
            .clone()
            .unwrap_or_else(|| config.satellite.clone()),
        window: args.window()?,
        band: args.band.map(|band| band.to_string()),
        file_name: args.file_name.clone(),
        all_files: args.all,
        output_root: args
            .output
            .clone()
            .unwrap_or_else(|| config.output_root.clone()),
        overwrite: args.overwrite,
    };

    let store = Noaa::as_anon(&config.region).await;
    let report = sync(&store, &request).await?;

    // Mirrored paths go to stdout so they can be piped; logs stay on stderr.
    for path in &report.mirrored {
        println!("{}", path.display());
    }
    if report.is_noop() {
        info!("no objects matched the request");
    }
    if !report.failures.is_empty() {
        for failure in &report.failures {
            error!(
                key = failure.key.as_str(),
                reason = failure.reason.as_str(),
                "failed"
            );
        }
        bail!(
            "{} of {} selected objects failed",
            report.failures.len(),
            report.failures.len() + report.mirrored.len()
        );
    }
    Ok(())
}

fn bulk_command(args: &BulkArgs, config: &MirrorConfig) -> Result<()> {
    let satellite = args
        .satellite
        .clone()
        .unwrap_or_else(|| config.satellite.clone());
    let year = time_component(&args.year, 0);
    let day = time_component(&args.day, 3);
    let hour = time_component(&args.hour, 2);
    let minute = time_component(&args.minute, 2);

    let files = crawler::find_files(
        &args.input_dir,
        &satellite,
        &args.product,
        year.as_deref(),
        day.as_deref(),
        hour.as_deref(),
        minute.as_deref(),
    )?;
    if files.is_empty() {
        info!(
            satellite = satellite.as_str(),
            product = args.product.as_str(),
            "nothing matched the filter"
        );
        return Ok(());
    }

    let total = files.len();
    let mut failed = 0usize;
    for (index, file) in files.iter().enumerate() {
        info!(
            progress = %format!("{}/{}", index + 1, total),
            file = %file.display(),
            "processing"
        );
        if let Err(err) = MetadataWriter.process(
            file,
            &args.input_dir,
            &args.output_dir,
            args.format,
            args.overwrite,
        ) {
            failed += 1;
            error!(file = %file.display(), %err, "processing failed");
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} files failed processing");
    }
    Ok(())
}

/// CLI time components arrive unpadded; "all" means wildcard.
fn time_component(text: &str, width: usize) -> Option<String> {
    if text.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(format!("{:0>width$}", text, width = width))
    }
}

async fn watch_command(args: &WatchArgs, config: &MirrorConfig) -> Result<()> {
    let satellite = args
        .satellite
        .clone()
        .unwrap_or_else(|| config.satellite.clone());
    let output_root = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_root.clone());
    let store = Noaa::as_anon(&config.region).await;

    info!(
        product = args.product.as_str(),
        interval_minutes = args.interval,
        "watch loop started"
    );
    loop {
        let now = chrono::Utc::now().naive_utc();
        let request = DownloadRequest {
            product: args.product.clone(),
            satellite: satellite.clone(),
            window: TimeWindow::Single(TimePartition::from_datetime(&now)),
            band: args.band.map(|band| band.to_string()),
            file_name: None,
            all_files: args.all,
            output_root: output_root.clone(),
            overwrite: false,
        };
        if let Err(err) = sync(&store, &request).await {
            error!(%err, "download pass failed, retrying next tick");
        }
        tokio::time::sleep(Duration::from_secs(args.interval * 60)).await;
    }
}
