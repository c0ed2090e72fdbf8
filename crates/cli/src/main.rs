mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use headcount_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
use headcount_core::counting::domain::count_sink::CountSinks;
use headcount_core::counting::infrastructure::console_count_sink::ConsoleCountSink;
use headcount_core::counting::infrastructure::file_count_sink::FileCountSink;
use headcount_core::detection::domain::object_detector::ObjectDetector;
use headcount_core::detection::domain::person_counter::PersonCounter;
use headcount_core::detection::infrastructure::model_resolver::{self, ModelSource};
use headcount_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use headcount_core::display::domain::frame_display::FrameDisplay;
use headcount_core::display::infrastructure::highgui_display::HighguiDisplay;
use headcount_core::display::infrastructure::null_display::NullDisplay;
use headcount_core::pipeline::count_people_use_case::{CountPeopleUseCase, EndReason};
use headcount_core::pipeline::pipeline_logger::LogPipelineLogger;
use headcount_core::shared::constants::{BUNDLED_MODEL_DIR, PREVIEW_WINDOW_TITLE, YOLO_MODEL_NAME};

use settings::Settings;

/// Real-time people counting from a webcam using a YOLO detector.
#[derive(Parser, Debug)]
#[command(name = "headcount", version)]
struct Cli {
    /// Resolution of the webcam feed [default: 1280 720].
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    webcam_resolution: Option<Vec<u32>>,

    /// Camera device (e.g. /dev/video0) or a recorded video file.
    #[arg(long)]
    camera: Option<String>,

    /// Requested capture frame rate.
    #[arg(long)]
    framerate: Option<u32>,

    /// Seconds between detections [default: 5].
    #[arg(long)]
    interval: Option<f64>,

    /// File that counts are appended to [default: human_count.txt].
    #[arg(long)]
    output: Option<PathBuf>,

    /// YOLO ONNX model file.
    #[arg(long)]
    model: Option<PathBuf>,

    /// URL to download the model from when no local copy exists.
    #[arg(long)]
    model_url: Option<String>,

    /// Detection confidence threshold (0.0-1.0) [default: 0.25].
    #[arg(long)]
    confidence: Option<f32>,

    /// Class index counted as a person [default: 0].
    #[arg(long)]
    person_class: Option<usize>,

    /// Run without the preview window.
    #[arg(long)]
    no_preview: bool,

    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Overlays flags given on the command line onto `settings`.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some([w, h]) = self.webcam_resolution.as_deref() {
            settings.width = *w;
            settings.height = *h;
        }
        if let Some(camera) = &self.camera {
            settings.camera = camera.clone();
        }
        if let Some(fps) = self.framerate {
            settings.framerate = Some(fps);
        }
        if let Some(interval) = self.interval {
            settings.interval_secs = interval;
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(url) = &self.model_url {
            settings.model_url = Some(url.clone());
        }
        if let Some(confidence) = self.confidence {
            settings.confidence = confidence;
        }
        if let Some(class) = self.person_class {
            settings.person_class = class;
        }
        if self.no_preview {
            settings.preview = false;
        }
    }
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
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);
    settings.validate()?;

    if cli.save_config {
        let path = settings.save(cli.config.as_deref())?;
        log::info!("Settings saved to {}", path.display());
    }

    let detector = build_detector(&settings)?;
    let sink = CountSinks::new()
        .with(Box::new(FileCountSink::new(&settings.output)))
        .with(Box::new(ConsoleCountSink::stdout()));
    let display: Box<dyn FrameDisplay> = if settings.preview {
        Box::new(HighguiDisplay::new(PREVIEW_WINDOW_TITLE))
    } else {
        Box::new(NullDisplay)
    };

    let mut use_case = CountPeopleUseCase::new(
        Box::new(FfmpegCamera::new()),
        detector,
        PersonCounter::new(settings.person_class),
        Box::new(sink),
        display,
        settings.interval()?,
    )
    .with_logger(Box::new(LogPipelineLogger::default()));

    log::info!(
        "Counting people every {}s, appending to {}",
        settings.interval_secs,
        settings.output.display()
    );
    let summary = use_case.execute(&settings.capture_request())?;

    match summary.end_reason {
        EndReason::SourceUnavailable => log::info!("No frames captured"),
        reason => log::info!(
            "Stopped ({reason:?}) after {} frames and {} detections",
            summary.frames,
            summary.detections
        ),
    }
    Ok(())
}

fn build_detector(
    settings: &Settings,
) -> Result<Box<dyn ObjectDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let source = ModelSource {
        name: YOLO_MODEL_NAME,
        explicit: settings.model.as_deref(),
        bundled_dir: Some(Path::new(BUNDLED_MODEL_DIR)),
        url: settings.model_url.as_deref(),
    };
    let model_path = model_resolver::resolve(&source, Some(Box::new(download_progress)))?;

    Ok(Box::new(OnnxYoloDetector::new(
        &model_path,
        settings.confidence,
    )?))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
