//! Gesture-RS - Main Entry Point
//!
//! Reads glove frames from a serial device or capture file and prints the
//! recognized gesture for every frame.

use anyhow::{bail, Context};
use clap::Parser;
use crossbeam_channel::select;
use gesture_rs::{
    backend::{AcquisitionBackend, BackendCommand, BackendMessage, DeviceTransport, Transport},
    config::{self, AppConfig},
    logging,
    output::{render_console, render_json},
    pipeline::{build_preprocessor, CentroidClassifier, ClassifierPort, FeaturePreprocessor},
    types::{AcquisitionStatus, FrameUpdate, LabelSet},
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "gesture-rs",
    about = "Real-time sign-language glove gesture interpreter",
    version,
    author
)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device or capture file to read frames from
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Confidence threshold in percent (0-100)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Print one JSON object per frame instead of text
    #[arg(long)]
    json: bool,

    /// Stop after printing this many frames (noise lines are not printed)
    #[arg(long)]
    max_frames: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,

    /// Use the synthetic glove instead of a device
    #[cfg(feature = "mock-glove")]
    #[arg(long)]
    mock: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(device) = &cli.device {
        config.acquisition.device_path = Some(device.clone());
    }
    if let Some(percent) = cli.threshold {
        if !(0.0..=100.0).contains(&percent) {
            bail!("Threshold must be between 0 and 100, got {}", percent);
        }
        config.gate.threshold = percent / 100.0;
    }
    if cli.verbose {
        config.logging.level = "debug,gesture_rs=trace".to_string();
    }

    let _log_guard = logging::init_logging(&config.logging)?;
    tracing::info!("Starting gesture-rs");

    config.validate().context("Invalid configuration")?;

    let classifier = Arc::new(
        CentroidClassifier::from_config(&config.classifier)
            .context("Failed to build classifier")?,
    );
    let labels = classifier.labels().clone();
    let preprocessor: Arc<dyn FeaturePreprocessor> =
        Arc::from(build_preprocessor(&config.preprocessing));
    tracing::info!(
        "Using {} preprocessing, {} labels, threshold {:.0}%",
        config.preprocessing.strategy_name(),
        labels.len(),
        config.gate.threshold * 100.0
    );

    let transport = open_transport(&cli, &config)?;

    let (backend, frontend) =
        AcquisitionBackend::new(&config, transport, preprocessor, classifier)?;
    let backend_handle = std::thread::spawn(move || backend.run());

    frontend.try_send_command(BackendCommand::Start)?;

    let mut frames = 0u64;
    loop {
        select! {
            recv(frontend.updates) -> update => {
                let Ok(update) = update else { break };
                if print_update(&update, &labels, cli.json)? {
                    frames += 1;
                }
                if reached_limit(frames, cli.max_frames) {
                    break;
                }
            }
            recv(frontend.receiver) -> msg => {
                match msg {
                    Ok(BackendMessage::TransportError(error)) => {
                        // Flush what was read before the session ended
                        for update in frontend.drain_updates() {
                            if reached_limit(frames, cli.max_frames) {
                                break;
                            }
                            if print_update(&update, &labels, cli.json)? {
                                frames += 1;
                            }
                        }
                        tracing::info!("Session ended: {}", error);
                        break;
                    }
                    Ok(BackendMessage::Stats(stats)) => {
                        tracing::debug!(
                            "{} frames, {} decided, {} malformed ({:.1}%), {} dropped",
                            stats.frames_total,
                            stats.decided,
                            stats.malformed,
                            stats.malformed_rate(),
                            stats.dropped_updates
                        );
                    }
                    Ok(BackendMessage::Status(status)) => {
                        tracing::debug!("Acquisition status: {}", status);
                        if status == AcquisitionStatus::Stopped {
                            break;
                        }
                    }
                    Ok(BackendMessage::Shutdown) | Err(_) => break,
                }
            }
        }
    }

    frontend.shutdown();
    if backend_handle.join().is_err() {
        bail!("Backend thread panicked");
    }

    tracing::info!("Printed {} frames", frames);
    Ok(())
}

/// Load the config from `path`, or from the default location if it exists
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match config::default_config_path() {
        Some(path) if path.exists() => Ok(AppConfig::load_or_default(path)),
        _ => Ok(AppConfig::default()),
    }
}

fn open_transport(cli: &Cli, config: &AppConfig) -> anyhow::Result<Box<dyn Transport>> {
    #[cfg(feature = "mock-glove")]
    if cli.mock {
        use gesture_rs::backend::MockGloveTransport;
        use std::time::Duration;

        tracing::info!("Using mock glove");
        return Ok(Box::new(
            MockGloveTransport::default()
                .with_noise(8.0)
                .with_corruption_every(40)
                .with_pacing(Duration::from_millis(50)),
        ));
    }
    #[cfg(not(feature = "mock-glove"))]
    let _ = cli;

    match &config.acquisition.device_path {
        Some(path) => Ok(Box::new(DeviceTransport::from_config(
            path,
            &config.acquisition,
        ))),
        None => bail!("No device given; pass --device or set acquisition.device_path"),
    }
}

fn reached_limit(printed: u64, max_frames: Option<u64>) -> bool {
    max_frames.is_some_and(|max| printed >= max)
}

/// Print an update, returning whether anything was written
fn print_update(update: &FrameUpdate, labels: &LabelSet, json: bool) -> anyhow::Result<bool> {
    let line = if json {
        Some(render_json(update, labels)?)
    } else {
        render_console(update, labels)
    };
    match line {
        Some(line) => {
            println!("{}", line);
            Ok(true)
        }
        None => Ok(false),
    }
}
