use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use collatz_tree::{
    AngleSpec, Color, FfmpegSink, FfmpegSinkOpts, FrameSink, PngSequenceSink, ResolvedRun,
    RunConfig, TreeSession,
};

#[derive(Parser, Debug)]
#[command(name = "collatz-tree", version, about = "Render the Collatz (3x+1) tree")]
struct Cli {
    /// TOML config file (defaults to `configs/collatz.toml` when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (otherwise `RUST_LOG` decides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the finished tree as a PNG.
    Plot(PlotArgs),
    /// Render the growth of the tree as an MP4 (requires `ffmpeg` on PATH).
    Animate(AnimateArgs),
    /// Print the fixed camera limits as JSON.
    Limits(LimitsArgs),
}

#[derive(Args, Debug)]
struct Overrides {
    /// Exclusive upper bound of the starting integers (starts = 2..n).
    #[arg(long)]
    n: Option<u64>,

    /// Bend angle: radians or text such as `pi/30`.
    #[arg(long, allow_hyphen_values = true)]
    theta: Option<AngleSpec>,

    /// Initial heading: radians or text such as `pi/2`.
    #[arg(long, allow_hyphen_values = true)]
    start_angle: Option<AngleSpec>,

    /// Line color (`#RRGGBB`, `#RRGGBBAA`, or a basic name).
    #[arg(long)]
    color: Option<Color>,

    /// Canvas background color.
    #[arg(long)]
    background: Option<Color>,

    /// Stroke width in pixels.
    #[arg(long)]
    line_width: Option<f64>,

    /// Stroke opacity (0..=1).
    #[arg(long)]
    alpha: Option<f64>,

    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

impl Overrides {
    fn into_config(self) -> RunConfig {
        RunConfig {
            n: self.n,
            theta: self.theta,
            start_angle: self.start_angle,
            color: self.color,
            background: self.background,
            line_width: self.line_width,
            alpha: self.alpha,
            width: self.width,
            height: self.height,
            ..RunConfig::default()
        }
    }
}

#[derive(Args, Debug)]
struct PlotArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Output PNG path.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnimateArgs {
    #[command(flatten)]
    overrides: Overrides,

    /// Output MP4 path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Video frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Capture one frame every N iterations.
    #[arg(long)]
    frame_stride: Option<u64>,

    /// Write numbered PNG frames into this directory instead of encoding an MP4.
    #[arg(long)]
    png_frames: Option<PathBuf>,

    /// Skip writing the final PNG.
    #[arg(long)]
    no_plot: bool,
}

#[derive(Args, Debug)]
struct LimitsArgs {
    #[command(flatten)]
    overrides: Overrides,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file = RunConfig::load(cli.config.as_deref())?;
    match cli.cmd {
        Command::Plot(args) => cmd_plot(file, args),
        Command::Animate(args) => cmd_animate(file, args),
        Command::Limits(args) => cmd_limits(file, args),
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// `--verbose` forces debug; otherwise `RUST_LOG` is used as given, falling back to warn when it
/// is unset, empty, or unparsable.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn resolve(file: RunConfig, overrides: RunConfig) -> anyhow::Result<ResolvedRun> {
    let run = file
        .merge(overrides)
        .resolve()
        .context("invalid run configuration")?;
    tracing::debug!(?run, "resolved configuration");
    Ok(run)
}

fn cmd_plot(file: RunConfig, args: PlotArgs) -> anyhow::Result<()> {
    let overrides = RunConfig {
        save_plot: Some(true),
        save_video: Some(false),
        plot_path: args.out,
        ..args.overrides.into_config()
    };
    let run = resolve(file, overrides)?;
    let session = TreeSession::from_resolved(&run)?;
    let out = session.render_still()?;

    let path = run
        .output
        .plot_path
        .context("plot output path missing (bug)")?;
    out.final_frame.save_png(&path)?;
    eprintln!(
        "wrote {} ({} iterations, {} segments)",
        path.display(),
        out.stats.iterations,
        out.stats.segments_drawn
    );
    Ok(())
}

fn cmd_animate(file: RunConfig, args: AnimateArgs) -> anyhow::Result<()> {
    let overrides = RunConfig {
        save_video: Some(true),
        save_plot: args.no_plot.then_some(false),
        video_path: args.out,
        fps: args.fps,
        frame_stride: args.frame_stride,
        ..args.overrides.into_config()
    };
    let run = resolve(file, overrides)?;
    let session = TreeSession::from_resolved(&run)?;

    let video_path = run
        .output
        .video_path
        .clone()
        .context("video output path missing (bug)")?;
    let mut sink: Box<dyn FrameSink> = match &args.png_frames {
        Some(dir) => Box::new(PngSequenceSink::new(dir)),
        None => {
            let mut opts = FfmpegSinkOpts::new(&video_path);
            opts.bg_rgba = run.style.background.to_array();
            Box::new(FfmpegSink::new(opts))
        }
    };

    let out = session.run(sink.as_mut())?;
    match &args.png_frames {
        Some(dir) => eprintln!("wrote {} frames to {}", out.stats.frames, dir.display()),
        None => eprintln!(
            "wrote {} ({} frames, {:.1}s)",
            video_path.display(),
            out.stats.frames,
            run.output.fps.frames_to_secs(out.stats.frames)
        ),
    }

    if let Some(path) = &run.output.plot_path {
        out.final_frame.save_png(path)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_limits(file: RunConfig, args: LimitsArgs) -> anyhow::Result<()> {
    let run = resolve(file, args.overrides.into_config())?;
    let limits = collatz_tree::plot_limits(&run.params)?;
    let json = serde_json::json!({
        "n": run.params.n,
        "theta": run.params.theta,
        "start_angle": run.params.start_angle,
        "xlim": [limits.x.min, limits.x.max],
        "ylim": [limits.y.min, limits.y.max],
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
