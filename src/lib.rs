//! Collatz tree generator and renderer.
//!
//! Every starting integer in `2..n` is followed through the 3x+1 rule. Each step becomes a unit
//! segment whose heading bends by `-theta` on even values and `+theta` on odd ones, which grows
//! the familiar branching "Collatz tree".
//!
//! - [`SequenceTreeBuilder`] yields the segments of the tree one lockstep iteration at a time.
//! - [`plot_limits`] runs the same iteration without drawing to fix the camera frame.
//! - [`TreeSession`] rasterizes a run with `vello_cpu` and streams frames into a [`FrameSink`]
//!   (for example [`FfmpegSink`] for MP4 output).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Run configuration (TOML + overrides).
pub mod config;
/// Frame sinks.
pub mod encode;
/// Angle expression evaluation.
pub mod expression;
/// CPU rendering.
pub mod render;
/// Run orchestration.
pub mod session;
/// Sequence-to-geometry mapping.
pub mod tree;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul};
pub use crate::foundation::error::{CollatzError, CollatzResult};

pub use crate::config::{AngleSpec, Color, OutputPlan, ResolvedRun, RunConfig};
pub use crate::encode::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, PngSequenceSink, SinkConfig,
};
pub use crate::expression::{ExprError, eval_angle};
pub use crate::render::{FrameRGBA, TreeRasterizer, TreeStyle, Viewport};
pub use crate::session::{RunStats, SessionOutput, TreeSession, TreeSessionOpts};
pub use crate::tree::{
    Interval, Iteration, PlotLimits, Segment, SequenceTreeBuilder, TrackedSequence, TreeExtent,
    TreeParams, collatz_step, measure, next_generation, plot_limits, stopping_time,
};
