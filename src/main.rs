//! PurePlate CLI
//!
//! Drives the scan flow from the command line: capture against a
//! simulated (or, with the `camera` feature, native) camera, gallery
//! upload, and the local alert feed.

use clap::{Parser, Subcommand, ValueEnum};
use pureplate::{
    alerts::{AlertStore, FileStore, ReportForm},
    analysis::{MockAnalyzer, Verdict},
    capture::{
        CaptureConfig, DeviceError, FacingMode, FakeDevices, FakeOutcome, FileConfig,
        MediaDevices, VideoFrame,
    },
    controller::{CaptureController, RecordingNavigator},
    metrics::{MetricsRegistry, MetricsSnapshot},
    upload, AnalysisReport, CapturedFrame,
};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pureplate", version, about = "PurePlate food scan demo")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print Prometheus metrics after the command.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the camera, capture a frame and analyse it.
    Scan {
        /// Camera to open (front or back).
        #[arg(long)]
        facing: Option<FacingMode>,
        /// Switch to the other camera before capturing.
        #[arg(long)]
        switch: bool,
        /// Simulate a device failure on the first request.
        #[arg(long, value_enum)]
        fail: Option<SimulatedFailure>,
        /// Write the captured image here.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Use the platform camera instead of the simulated one.
        #[cfg(feature = "camera")]
        #[arg(long)]
        native: bool,
    },
    /// Analyse an image file instead of using the camera.
    Upload { path: PathBuf },
    /// Community alert feed.
    Alerts {
        #[command(subcommand)]
        action: AlertsCommand,
    },
}

#[derive(Subcommand)]
enum AlertsCommand {
    /// List all alerts, newest reports first.
    List,
    /// Submit a report.
    Report {
        #[arg(long)]
        product: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SimulatedFailure {
    PermissionDenied,
    NotFound,
    Busy,
    Overconstrained,
    Unknown,
    EmptyFrame,
    Unsupported,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };

    let (shutdown_tx, shutdown) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_tx.send_replace(true);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    info!("PurePlate v{}", pureplate::VERSION);

    let registry = match MetricsRegistry::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut analyzer = MockAnalyzer::from_config(&config.analysis);
    let mut alerts = AlertStore::open(FileStore::new(&config.storage.data_dir));

    let (code, snapshot) = match cli.command {
        Command::Scan {
            facing,
            switch,
            fail,
            output,
            #[cfg(feature = "camera")]
            native,
        } => {
            let options = ScanOptions {
                facing: facing.unwrap_or(config.capture.facing),
                switch,
                output,
                shutdown: shutdown.clone(),
            };

            #[cfg(feature = "camera")]
            let outcome = if native {
                let devices = pureplate::capture::NativeDevices::new(&config.capture);
                run_scan(devices, &config.capture, &options, &mut analyzer).await
            } else {
                run_scan(simulated(fail), &config.capture, &options, &mut analyzer).await
            };
            #[cfg(not(feature = "camera"))]
            let outcome = run_scan(simulated(fail), &config.capture, &options, &mut analyzer).await;

            let user_alerts = alerts.user_alerts().len();
            match outcome {
                Ok(snapshot) => (ExitCode::SUCCESS, MetricsSnapshot { user_alerts, ..snapshot }),
                Err(snapshot) => (ExitCode::FAILURE, MetricsSnapshot { user_alerts, ..snapshot }),
            }
        }
        Command::Upload { path } => {
            let mut shutdown = shutdown.clone();
            let code = match upload::from_path(&path) {
                Ok(image) => match interruptible(analyzer.analyze_delayed(&image), &mut shutdown)
                    .await
                {
                    Some(report) => {
                        print_report(&image, &report);
                        ExitCode::SUCCESS
                    }
                    None => {
                        info!("Interrupted before the analysis finished");
                        ExitCode::FAILURE
                    }
                },
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            };
            let snapshot = MetricsSnapshot {
                analyses: analyzer.analyses(),
                user_alerts: alerts.user_alerts().len(),
                ..Default::default()
            };
            (code, snapshot)
        }
        Command::Alerts { action } => {
            let code = match action {
                AlertsCommand::List => {
                    for alert in alerts.alerts() {
                        println!(
                            "[{:?}] {} - {} ({})",
                            alert.severity, alert.kind, alert.location, alert.time
                        );
                    }
                    ExitCode::SUCCESS
                }
                AlertsCommand::Report {
                    product,
                    location,
                    description,
                } => {
                    let mut form = ReportForm::new(product, location);
                    if let Some(description) = description {
                        form = form.with_description(description);
                    }
                    match form.submit(&mut alerts) {
                        Ok(alert) => {
                            println!("Report submitted: {} at {}", alert.kind, alert.location);
                            ExitCode::SUCCESS
                        }
                        Err(e) => {
                            eprintln!("Failed to submit report: {}", e);
                            ExitCode::FAILURE
                        }
                    }
                }
            };
            let snapshot = MetricsSnapshot {
                user_alerts: alerts.user_alerts().len(),
                ..Default::default()
            };
            (code, snapshot)
        }
    };

    registry.update(&snapshot);

    if cli.metrics {
        match registry.encode() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }

    code
}

struct ScanOptions {
    facing: FacingMode,
    switch: bool,
    output: Option<PathBuf>,
    /// Flips to `true` on Ctrl-C.
    shutdown: watch::Receiver<bool>,
}

/// Awaits `fut` unless shutdown is requested first, in which case `fut`
/// is dropped unfinished.
///
/// A dropped sender (no Ctrl-C handler) never counts as a shutdown.
async fn interruptible<F: Future>(fut: F, shutdown: &mut watch::Receiver<bool>) -> Option<F::Output> {
    tokio::select! {
        biased;
        Ok(_) = shutdown.wait_for(|&stop| stop) => None,
        out = fut => Some(out),
    }
}

/// Simulated camera, optionally primed with a failure.
fn simulated(fail: Option<SimulatedFailure>) -> FakeDevices {
    let devices = FakeDevices::new().with_resolution(640, 480);
    let reject = |error| devices_with(FakeOutcome::Reject(error));

    match fail {
        None => devices,
        Some(SimulatedFailure::PermissionDenied) => {
            reject(DeviceError::NotAllowed("Permission denied by user".into()))
        }
        Some(SimulatedFailure::NotFound) => {
            reject(DeviceError::NotFound("Requested device not found".into()))
        }
        Some(SimulatedFailure::Busy) => {
            reject(DeviceError::NotReadable("Could not start video source".into()))
        }
        Some(SimulatedFailure::Overconstrained) => reject(DeviceError::Overconstrained {
            constraint: "width".into(),
        }),
        Some(SimulatedFailure::Unknown) => reject(DeviceError::Other {
            name: "TypeError".into(),
            message: "Unexpected failure".into(),
        }),
        Some(SimulatedFailure::EmptyFrame) => devices.with_frame(VideoFrame::empty(0)),
        Some(SimulatedFailure::Unsupported) => FakeDevices::unsupported(),
    }
}

fn devices_with(outcome: FakeOutcome) -> FakeDevices {
    FakeDevices::new()
        .with_resolution(640, 480)
        .with_script([outcome])
}

/// Runs one scan. Returns a metrics snapshot either way.
async fn run_scan<D: MediaDevices>(
    devices: D,
    capture: &CaptureConfig,
    options: &ScanOptions,
    analyzer: &mut MockAnalyzer,
) -> Result<MetricsSnapshot, MetricsSnapshot> {
    let mut controller = CaptureController::new(devices, RecordingNavigator::new(), capture.clone());
    let snapshot = |c: &CaptureController<D, RecordingNavigator>, analyses| {
        MetricsSnapshot::from_components(c.state(), c.holds_stream(), c.stats(), analyses, 0)
    };

    let mut shutdown = options.shutdown.clone();
    macro_rules! bail_if_interrupted {
        ($fut:expr) => {
            match interruptible($fut, &mut shutdown).await {
                Some(out) => out,
                None => {
                    info!("Interrupted, closing camera");
                    controller.cancel();
                    return Err(snapshot(&controller, analyzer.analyses()));
                }
            }
        };
    }

    controller.enter();
    if !controller.camera_supported() {
        warn!("No camera API available on this host");
    }

    let mut opened = bail_if_interrupted!(controller.open_facing(options.facing));
    if opened.is_ok() && options.switch {
        opened = bail_if_interrupted!(controller.switch_camera());
    }
    if let Err(e) = opened {
        report_failure(&e.to_string(), controller.last_error());
        return Err(snapshot(&controller, analyzer.analyses()));
    }

    if let Err(e) = controller.capture() {
        report_failure(&e.to_string(), controller.last_error());
        controller.teardown();
        return Err(snapshot(&controller, analyzer.analyses()));
    }

    let Some(image) = controller.navigator_mut().take_last() else {
        eprintln!("Capture produced no image");
        return Err(snapshot(&controller, analyzer.analyses()));
    };

    if let Some(path) = &options.output {
        if let Err(e) = std::fs::write(path, image.bytes()) {
            eprintln!("Failed to write {}: {}", path.display(), e);
        } else {
            info!(path = %path.display(), "Image saved");
        }
    }

    let report = bail_if_interrupted!(analyzer.analyze_delayed(&image));
    print_report(&image, &report);

    Ok(snapshot(&controller, analyzer.analyses()))
}

fn report_failure(message: &str, error: Option<&pureplate::CameraError>) {
    eprintln!("{}", message);
    if let Some(error) = error {
        let recovery = error.recovery();
        if recovery.offers_gallery() {
            eprintln!("Tip: use `pureplate upload <file>` to analyse a photo instead.");
        } else if recovery.allows_retry() {
            eprintln!("Tip: try again.");
        }
    }
}

fn print_report(image: &CapturedFrame, report: &AnalysisReport) {
    println!("Image: {}x{} ({})", image.width(), image.height(), image.mime_type());
    match &report.verdict {
        Verdict::Clean => println!("✓ Sample appears safe"),
        Verdict::Suspect {
            adulterant,
            confidence,
        } => println!(
            "Possible adulteration: {} {} ({}% confidence)",
            adulterant.icon, adulterant.name, confidence
        ),
    }
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize report: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options(shutdown: watch::Receiver<bool>) -> ScanOptions {
        ScanOptions {
            facing: FacingMode::Back,
            switch: false,
            output: None,
            shutdown,
        }
    }

    #[tokio::test]
    async fn test_interruptible_without_handler_runs_to_completion() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert_eq!(interruptible(async { 5 }, &mut rx).await, Some(5));
    }

    #[tokio::test]
    async fn test_scan_interrupted_before_open_acquires_nothing() {
        let (_tx, rx) = watch::channel(true);
        let mut analyzer = MockAnalyzer::from_seed(1).with_latency(Duration::ZERO);

        let snapshot = run_scan(
            FakeDevices::new(),
            &CaptureConfig::default(),
            &options(rx),
            &mut analyzer,
        )
        .await
        .unwrap_err();

        assert_eq!(snapshot.acquisitions, 0);
        assert!(!snapshot.stream_held);
        assert!(!snapshot.active);
        assert_eq!(analyzer.analyses(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_interrupted_during_analysis() {
        let (tx, rx) = watch::channel(false);
        let mut analyzer = MockAnalyzer::from_seed(1).with_latency(Duration::from_millis(3500));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send_replace(true);
        });

        let snapshot = run_scan(
            FakeDevices::new(),
            &CaptureConfig::default(),
            &options(rx),
            &mut analyzer,
        )
        .await
        .unwrap_err();

        assert_eq!(snapshot.captures, 1);
        assert_eq!(snapshot.releases, 1);
        assert!(!snapshot.stream_held);
        assert_eq!(analyzer.analyses(), 0);
    }
}
