//! Run configuration: a TOML file merged with command-line overrides.
//!
//! Every field is optional in the file. [`RunConfig::merge`] lets a present override win over the
//! file value, and [`RunConfig::resolve`] applies defaults and validates the result.

mod angle;
mod color;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub use angle::AngleSpec;
pub use color::Color;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{CollatzError, CollatzResult};
use crate::render::TreeStyle;
use crate::tree::TreeParams;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "configs/collatz.toml";

const DEFAULT_N: u64 = 50;
const DEFAULT_THETA: &str = "pi/30";
const DEFAULT_START_ANGLE: &str = "pi/2";
const DEFAULT_LINE_WIDTH: f64 = 0.5;
const DEFAULT_ALPHA: f64 = 0.7;
const DEFAULT_FPS: u32 = 10;
const DEFAULT_SIZE: u32 = 1000;
const DEFAULT_PLOT_PATH: &str = "plots/collatz.png";
const DEFAULT_VIDEO_PATH: &str = "videos/collatz.mp4";

/// Raw, partially specified run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Exclusive upper bound of the starting integers.
    pub n: Option<u64>,
    /// Bend angle.
    pub theta: Option<AngleSpec>,
    /// Initial heading.
    pub start_angle: Option<AngleSpec>,
    /// Line color.
    pub color: Option<Color>,
    /// Stroke width in pixels.
    pub line_width: Option<f64>,
    /// Stroke opacity in `0..=1`.
    pub alpha: Option<f64>,
    /// Video frame rate.
    pub fps: Option<u32>,
    /// Capture a video frame every `frame_stride` iterations.
    pub frame_stride: Option<u64>,
    /// Canvas width in pixels.
    pub width: Option<u32>,
    /// Canvas height in pixels.
    pub height: Option<u32>,
    /// Canvas background.
    pub background: Option<Color>,
    /// Write an MP4 animation.
    pub save_video: Option<bool>,
    /// Where the MP4 goes.
    pub video_path: Option<PathBuf>,
    /// Write the final image.
    pub save_plot: Option<bool>,
    /// Where the final PNG goes.
    pub plot_path: Option<PathBuf>,
}

/// What to write and how frames are captured.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPlan {
    /// Raster size.
    pub canvas: Canvas,
    /// Video frame rate.
    pub fps: Fps,
    /// Capture a frame every `frame_stride` iterations.
    pub frame_stride: u64,
    /// Final PNG, if requested.
    pub plot_path: Option<PathBuf>,
    /// MP4 animation, if requested.
    pub video_path: Option<PathBuf>,
}

/// Fully validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    /// Core geometry inputs.
    pub params: TreeParams,
    /// Cosmetic inputs, consumed by the renderer only.
    pub style: TreeStyle,
    /// Output targets.
    pub output: OutputPlan,
}

impl RunConfig {
    /// Parse TOML text.
    pub fn from_toml_str(s: &str) -> CollatzResult<Self> {
        toml::from_str(s).map_err(|e| CollatzError::config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn from_path(path: &Path) -> CollatzResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_toml_str(&text).map_err(|e| {
            CollatzError::config(format!("parse config '{}': {e}", path.display()))
        })
    }

    /// Load `path` when given; otherwise load [`DEFAULT_CONFIG_PATH`] if it exists.
    ///
    /// An explicitly named file that cannot be read is an error; a missing default is not.
    pub fn load(path: Option<&Path>) -> CollatzResult<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_path(default)
                } else {
                    tracing::debug!(path = DEFAULT_CONFIG_PATH, "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay `overrides` on `self`: any field set in `overrides` wins.
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            n: overrides.n.or(self.n),
            theta: overrides.theta.or(self.theta),
            start_angle: overrides.start_angle.or(self.start_angle),
            color: overrides.color.or(self.color),
            line_width: overrides.line_width.or(self.line_width),
            alpha: overrides.alpha.or(self.alpha),
            fps: overrides.fps.or(self.fps),
            frame_stride: overrides.frame_stride.or(self.frame_stride),
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            background: overrides.background.or(self.background),
            save_video: overrides.save_video.or(self.save_video),
            video_path: overrides.video_path.or(self.video_path),
            save_plot: overrides.save_plot.or(self.save_plot),
            plot_path: overrides.plot_path.or(self.plot_path),
        }
    }

    /// Apply defaults, evaluate angles, and validate.
    pub fn resolve(&self) -> CollatzResult<ResolvedRun> {
        let theta = match &self.theta {
            Some(a) => a.radians()?,
            None => AngleSpec::Expr(DEFAULT_THETA.to_owned()).radians()?,
        };
        let start_angle = match &self.start_angle {
            Some(a) => a.radians()?,
            None => AngleSpec::Expr(DEFAULT_START_ANGLE.to_owned()).radians()?,
        };
        let params = TreeParams::new(self.n.unwrap_or(DEFAULT_N), theta, start_angle)?;

        let style = TreeStyle {
            color: self.color.unwrap_or(Color::YELLOW),
            line_width: self.line_width.unwrap_or(DEFAULT_LINE_WIDTH),
            alpha: self.alpha.unwrap_or(DEFAULT_ALPHA),
            background: self.background.unwrap_or(Color::BLACK),
            ..TreeStyle::default()
        };
        style.validate()?;

        let canvas = Canvas {
            width: self.width.unwrap_or(DEFAULT_SIZE),
            height: self.height.unwrap_or(DEFAULT_SIZE),
        };
        canvas.validate()?;

        let frame_stride = self.frame_stride.unwrap_or(1);
        if frame_stride == 0 {
            return Err(CollatzError::validation("frame_stride must be > 0"));
        }

        let video_path = self.save_video.unwrap_or(false).then(|| {
            self.video_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VIDEO_PATH))
        });
        if video_path.is_some()
            && (!canvas.width.is_multiple_of(2) || !canvas.height.is_multiple_of(2))
        {
            return Err(CollatzError::validation(
                "width/height must be even when saving a video (yuv420p output)",
            ));
        }
        let plot_path = self.save_plot.unwrap_or(true).then(|| {
            self.plot_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PLOT_PATH))
        });

        Ok(ResolvedRun {
            params,
            style,
            output: OutputPlan {
                canvas,
                fps: Fps::whole(self.fps.unwrap_or(DEFAULT_FPS))?,
                frame_stride,
                plot_path,
                video_path,
            },
        })
    }
}
