//! lanekeep CLI: lane detection on image files, steering law queries and
//! dry-run control loops.

use clap::{Args, Parser, Subcommand, ValueEnum};
use lanekeep::control::LaneKeeper;
use lanekeep::detect::{collect_image_paths, detect_lanes_rgb, load_rgb, ImageSequence};
use lanekeep::io::{self, DetectReport, FrameReport};
use lanekeep::steer::RecordingActuator;
use lanekeep::vision::LaneDetectorParams;
use lanekeep::{CameraMode, CameraSide, FrameShape, LaneDetector, LaneLine, SteeringParams};
use log::info;
use std::path::PathBuf;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "lanekeep")]
#[command(about = "Detect lane lines in camera frames and map them to steering commands")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit tracing spans as JSON lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect lane lines in images and print a JSON report.
    Detect(DetectArgs),

    /// Map a lateral offset to a steering command.
    Steer(SteerArgs),

    /// Print or persist the active detector parameters.
    Params(ParamsArgs),

    /// Dry-run the control loop over images with a recording actuator.
    Run(RunArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for CameraSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => CameraSide::Left,
            SideArg::Right => CameraSide::Right,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Parameter file (flat JSON). Defaults to single_camera_config.json or
    /// dual_camera_config.json in the working directory; a missing default
    /// file means built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dual-camera mode: evaluate only this side.
    #[arg(long, value_enum)]
    dual: Option<SideArg>,
}

impl ConfigArgs {
    fn mode(&self) -> CameraMode {
        match self.dual {
            Some(side) => CameraMode::Dual(side.into()),
            None => CameraMode::Single,
        }
    }

    fn load(&self) -> CliResult<LaneDetectorParams> {
        let params = match &self.config {
            Some(path) => io::load_params(path)?,
            None => io::load_params_or_default(io::default_config_path(self.mode()))?,
        };
        Ok(params)
    }
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Image files or directories of images.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct SteerArgs {
    /// Signed lateral offset in pixels; negative means left of the lane centre.
    #[arg(long, allow_negative_numbers = true)]
    offset: f32,

    /// Offset that maps to full deflection.
    #[arg(long, default_value_t = 200.0)]
    max_offset: f32,
}

#[derive(Debug, Clone, Args)]
struct ParamsArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Persist the active parameters to this file.
    #[arg(long)]
    write: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Offset that maps to full deflection.
    #[arg(long, default_value_t = 200.0)]
    max_offset: f32,

    /// Image files or directories of images, processed in order.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Steer(args) => run_steer(&args),
        Commands::Params(args) => run_params(&args),
        Commands::Run(args) => run_loop(&args),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: u8, json: bool) -> CliResult<()> {
    use lanekeep::core::TraceFormat;
    lanekeep::core::init_tracing(if json {
        TraceFormat::Json
    } else {
        TraceFormat::Pretty
    });
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8, json: bool) -> CliResult<()> {
    lanekeep::core::init_with_level(lanekeep::core::level_for_verbosity(verbose))?;
    if json {
        log::warn!("--log-json needs the `tracing` feature; using plain logs");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let params = args.config.load()?;
    let mode = args.config.mode();
    let mut detector = LaneDetector::new(params.clone()).with_mode(mode);

    let mut frames = Vec::new();
    for path in collect_image_paths(&args.images)? {
        let img = load_rgb(&path)?;
        let debug = detect_lanes_rgb(&mut detector, &img)?;
        info!("{}: {} lines", path.display(), debug.lines.len());
        frames.push(FrameReport {
            path: path.display().to_string(),
            width: debug.shape.width,
            height: debug.shape.height,
            segments: debug.segments.len(),
            lines: io::tag_lines(&debug.lines, debug.shape),
        });
    }

    let report = DetectReport {
        mode,
        params,
        frames,
    };
    match &args.out {
        Some(out) => {
            io::write_json(out, &report)?;
            println!("wrote {}", out.display());
        }
        None => print_json(&report)?,
    }
    Ok(())
}

// ── steer ──────────────────────────────────────────────────────────────

fn run_steer(args: &SteerArgs) -> CliResult<()> {
    let command = lanekeep::map_offset_to_command(args.offset, args.max_offset);
    println!("{}", serde_json::to_string(&command)?);
    Ok(())
}

// ── params ─────────────────────────────────────────────────────────────

fn run_params(args: &ParamsArgs) -> CliResult<()> {
    let params = args.config.load()?;
    let detector = LaneDetector::new(params).with_mode(args.config.mode());
    match &args.write {
        Some(path) => {
            io::write_params(path, detector.parameters())?;
            println!("wrote {}", path.display());
        }
        None => print_json(detector.parameters())?,
    }
    Ok(())
}

// ── run ────────────────────────────────────────────────────────────────

/// Offset of the frame centre from the lane centre, taken as the mean x of
/// the lines' bottom endpoints. Negative when the lane centre lies to the
/// right, i.e. the vehicle sits left of it. Zero when nothing was seen.
fn lane_center_offset(lines: &[LaneLine], shape: FrameShape) -> f32 {
    if lines.is_empty() {
        return 0.0;
    }
    let mean_x = lines.iter().map(|l| l.x1 as f32).sum::<f32>() / lines.len() as f32;
    shape.center_x() as f32 - mean_x
}

fn run_loop(args: &RunArgs) -> CliResult<()> {
    if args.config.dual.is_some() {
        return Err("`run` drives a single camera; use `detect --dual` per camera".into());
    }
    let steering = SteeringParams::with_max_offset(args.max_offset);
    steering.validate()?;
    let params = args.config.load()?;
    let mut keeper = LaneKeeper::new(LaneDetector::new(params), lane_center_offset, steering);
    let mut source = ImageSequence::from_inputs(&args.images)?;
    let mut actuator = RecordingActuator::new();

    let mut lines_out = Vec::new();
    let summary = keeper.run(&mut source, &mut actuator, |outcome| {
        lines_out.push(serde_json::to_string(outcome));
    })?;
    for line in lines_out {
        println!("{}", line?);
    }
    info!(
        "{} frames, {} steered, {} actuator calls",
        summary.frames,
        summary.steered,
        actuator.events.len()
    );
    Ok(())
}
