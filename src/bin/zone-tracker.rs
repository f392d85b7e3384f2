//! Runs position batches from a feed through the zone tracker and prints
//! zone events to stdout as JSON lines.

use std::io::{self, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zone_transit::batch::BatchProcessor;
use zone_transit::config::{ServiceConfig, TrackerConfig};
use zone_transit::feed::{FeedConfig, HttpFeedClient, ReplaySource};
use zone_transit::region::RegionStore;
use zone_transit::traits::PositionSource;

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> ExitCode {
    let service = ServiceConfig::from_env();
    init_tracing(&service.log_level);

    let regions = match RegionStore::load_file(&service.regions_path) {
        Ok(regions) => regions,
        Err(err) => {
            error!(path = %service.regions_path.display(), error = %err, "failed to load regions");
            return ExitCode::FAILURE;
        }
    };
    let tracker = TrackerConfig::from_env();
    info!(
        regions = regions.len(),
        evaluable = regions.evaluable().count(),
        max_sample_gap_secs = ?tracker.max_sample_gap_secs,
        parallel_regions = tracker.parallel_regions,
        "zone tracker starting"
    );
    let mut processor = BatchProcessor::new(tracker);

    let result = match &service.replay_dir {
        Some(dir) => match ReplaySource::open(dir) {
            Ok(mut source) => {
                info!(dir = %dir.display(), files = source.remaining(), "replaying feed files");
                run(&mut source, &mut processor, &regions, None)
            }
            Err(err) => {
                error!(dir = %dir.display(), error = %err, "failed to open replay directory");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let feed = FeedConfig::from_env();
            info!(url = %feed.url, format = ?feed.format, "polling position feed");
            match HttpFeedClient::new(feed) {
                Ok(mut client) => {
                    let interval = Duration::from_secs(service.poll_interval_secs);
                    run(&mut client, &mut processor, &regions, Some(interval))
                }
                Err(err) => {
                    error!(error = %err, "failed to build feed client");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "failed to write events");
            ExitCode::FAILURE
        }
    }
}

/// Feed batches to the processor until the source runs dry. Fetch errors
/// are logged and retried on the next poll.
fn run(
    source: &mut dyn PositionSource,
    processor: &mut BatchProcessor,
    regions: &RegionStore,
    poll_interval: Option<Duration>,
) -> io::Result<()> {
    let stdout = io::stdout();
    loop {
        match source.fetch_batch() {
            Ok(Some(batch)) => {
                let events = processor.process_batch(&batch, regions);
                let mut out = stdout.lock();
                for event in &events {
                    serde_json::to_writer(&mut out, event)?;
                    out.write_all(b"\n")?;
                }
                out.flush()?;
            }
            Ok(None) => return Ok(()),
            Err(err) => warn!(error = %err, "failed to fetch position batch"),
        }

        if let Some(interval) = poll_interval {
            thread::sleep(interval);
        }
    }
}
