use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roomwatch::{CancelToken, Config, Dispatch, ImageDirSource, NotificationSink, Notifier, Pipeline};

#[derive(Parser)]
#[command(name = "roomwatch")]
#[command(about = "Watch a camera feed for motion and send rate-limited alerts")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    conf: PathBuf,

    /// Directory of frames to replay as the camera feed
    #[arg(long, value_name = "DIR")]
    frames: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save per-frame debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Deliver notifications from a worker thread with a queue of this size
    #[arg(long, value_name = "CAPACITY")]
    queue: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::from_file(&args.conf)
        .with_context(|| format!("Failed to load config {}", args.conf.display()))?;

    let sink = NotificationSink::from_config(&config, |key| std::env::var(key).ok())
        .context("Failed to set up notifications")?;
    info!("Notification sink: {:?}", sink.kind());

    let dispatch = match args.queue {
        Some(capacity) => Dispatch::Queued { capacity },
        None => Dispatch::Blocking,
    };

    let mut source = ImageDirSource::open(&args.frames, config.frame_interval())
        .with_context(|| format!("Failed to open frame source {}", args.frames.display()))?
        .with_resolution(config.resolution);
    info!("Replaying {} frame(s) from {}", source.len(), args.frames.display());

    info!("Warming up...");
    std::thread::sleep(config.camera_warmup()?);

    if let Some(message) = &config.startup_message {
        match sink.announce(message) {
            Ok(Some(id)) => info!("Startup message sent ({})", id.0),
            Ok(None) => {}
            Err(e) => warn!("Failed to send startup message: {}", e),
        }
    }

    let notifier = Notifier::new(sink, dispatch)?;
    let mut pipeline = Pipeline::from_config(&config, notifier)?.with_max_frames(args.max_frames);
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let cancel = CancelToken::new();
    spawn_quit_listener(cancel.clone());

    info!("Up and running (enter q to quit)");
    let result = pipeline.run(&mut source, &cancel);
    pipeline.finish();
    let summary = result?;

    println!("\n=== Surveillance Summary ===");
    println!("Frames processed: {}", summary.frames);
    println!("Occupied frames: {}", summary.occupied_frames);
    println!("Alerts raised: {}", summary.alerts);
    if summary.failed_notifications > 0 {
        println!("Failed notifications: {}", summary.failed_notifications);
    }

    Ok(())
}

/// Cancel the run when `q` is entered on stdin
fn spawn_quit_listener(cancel: CancelToken) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                info!("Quit requested");
                cancel.cancel();
                break;
            }
        }
    });
}
