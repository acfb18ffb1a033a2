use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use image::RgbaImage;

use live_blur_core::blurring::domain::blur_result::BlurResult;
use live_blur_core::blurring::domain::blur_settings::Argb;
use live_blur_core::blurring::domain::snapshot_provider::SnapshotProvider;
use live_blur_core::config::BlurConfig;
use live_blur_core::presentation::live_blur_view::LiveBlurView;
use live_blur_core::presentation::render_host::RenderHost;
use live_blur_core::presentation::stale_result_guard::AcceptedFrame;
use live_blur_core::scheduling::domain::tracking_policy::TrackingPolicy;
use live_blur_core::scheduling::infrastructure::ui_context::{ui_context, UiQueue};
use live_blur_core::scheduling::infrastructure::worker_pool::WorkerPool;
use live_blur_core::shared::source_image::SourceImage;

/// Longest the CLI waits for asynchronous results.
const PUMP_TIMEOUT: Duration = Duration::from_secs(60);

/// Blur an image through the live blur scheduler.
#[derive(Parser)]
#[command(name = "live-blur")]
struct Cli {
    /// Input image file.
    input: PathBuf,

    /// Output image file.
    output: PathBuf,

    /// JSON settings file (defaults to live-blur/settings.json in the user
    /// config directory, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blur radius (>= 0).
    #[arg(long, allow_negative_numbers = true)]
    radius: Option<i32>,

    /// Shrink factor applied before blurring (>= 1).
    #[arg(long, allow_negative_numbers = true)]
    down_sampling: Option<i32>,

    /// Overlay tint: #RRGGBB, #AARRGGBB or 0xAARRGGBB.
    #[arg(long)]
    overlay: Option<Argb>,

    /// Write the downsampled buffer instead of the engine's bilinear upscale
    /// back to input size.
    #[arg(long)]
    keep_down_sampling_size: bool,

    /// Blur on the worker pool instead of inline.
    #[arg(long = "async")]
    run_async: bool,

    /// Task tracking policy: multi or single.
    #[arg(long)]
    tracking: Option<TrackingPolicy>,

    /// Number of back-to-back invalidations to issue.
    #[arg(long, default_value = "1")]
    burst: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = resolve_config(&cli)?;
    let settings = config.settings()?;
    let source = load_source(&cli.input)?;

    let (ui, queue) = ui_context();
    let provider = Arc::new(StaticSnapshot(source));
    let host = Arc::new(LoggingHost::default());
    let mut view = LiveBlurView::new(
        &provider,
        Arc::new(WorkerPool::new()),
        ui,
        config.tracking,
        host.clone(),
    );
    view.apply_settings(&settings)?;
    view.set_async(config.run_async);
    view.set_destroy_after_blur(config.destroy_after_blur);
    view.attach();

    for _ in 0..cli.burst {
        view.invalidate();
    }
    pump(&view, &queue, PUMP_TIMEOUT)?;

    let mut rendered = None;
    view.render(|frame| rendered = Some(frame_to_image(frame)));
    view.detach(true);

    let stats = view.stats();
    log::info!(
        "Accepted {} result(s), discarded {}, {} redraw request(s)",
        stats.accepted,
        stats.discarded,
        host.redraws.load(Ordering::Relaxed)
    );

    let image = rendered.ok_or("No blurred frame was produced")??;
    write_image(&cli.output, &image)?;
    log::info!("Output written to {}", cli.output.display());
    Ok(())
}

/// Runs UI jobs on this thread until every async task has been delivered,
/// or fails once `timeout` has passed with tasks still in flight.
fn pump(view: &LiveBlurView, queue: &UiQueue, timeout: Duration) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    while view.in_flight() > 0 {
        let now = Instant::now();
        if now >= deadline {
            return Err(format!(
                "Timed out after {timeout:?} waiting for {} blur task(s)",
                view.in_flight()
            ));
        }
        queue.wait_and_run((deadline - now).min(Duration::from_millis(50)));
    }
    queue.run_pending();
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.burst == 0 {
        return Err("Burst must be at least 1".into());
    }
    Ok(())
}

/// File values first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<BlurConfig, Box<dyn std::error::Error>> {
    let mut config = match (&cli.config, BlurConfig::default_path()) {
        (Some(path), _) => BlurConfig::load(path)?,
        (None, Some(path)) => BlurConfig::load_or_default(&path)?,
        (None, None) => BlurConfig::default(),
    };
    apply_overrides(cli, &mut config);
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut BlurConfig) {
    if let Some(radius) = cli.radius {
        config.radius = radius;
    }
    if let Some(down_sampling) = cli.down_sampling {
        config.down_sampling = down_sampling;
    }
    if let Some(overlay) = cli.overlay {
        config.overlay_color = overlay;
    }
    if let Some(tracking) = cli.tracking {
        config.tracking = tracking;
    }
    config.keep_down_sampling_size |= cli.keep_down_sampling_size;
    config.run_async |= cli.run_async;
}

fn load_source(path: &Path) -> Result<SourceImage, Box<dyn std::error::Error>> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(SourceImage::new(rgba.into_raw(), width, height))
}

fn frame_to_image(frame: &AcceptedFrame) -> Result<RgbaImage, String> {
    let result = frame.result();
    RgbaImage::from_raw(result.width(), result.height(), result.data().to_vec())
        .ok_or_else(|| "Failed to create image from blur result".to_string())
}

fn write_image(path: &Path, image: &RgbaImage) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(path)?;
    Ok(())
}

/// Snapshot provider over an image loaded once from disk.
struct StaticSnapshot(SourceImage);

impl SnapshotProvider for StaticSnapshot {
    fn capture(&self) -> Option<SourceImage> {
        Some(self.0.clone())
    }
}

#[derive(Default)]
struct LoggingHost {
    redraws: AtomicUsize,
}

impl RenderHost for LoggingHost {
    fn request_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::Relaxed);
    }

    fn on_accepted(&self, buffer: &BlurResult, down_sampling: u32) {
        log::debug!(
            "Accepted {}x{} buffer (down-sampling {down_sampling})",
            buffer.width(),
            buffer.height()
        );
    }
}
