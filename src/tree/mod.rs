//! Sequence-to-geometry mapping.
//!
//! Every starting integer is tracked as a [`TrackedSequence`]; [`SequenceTreeBuilder`] steps
//! them all in lockstep and yields one [`Iteration`] of segments per step. [`plot_limits`] runs
//! the same iteration without drawing to obtain a fixed camera frame.

/// Bounding-box pre-pass.
pub mod bounds;
/// Lockstep iteration over tracked sequences.
pub mod builder;
/// The Collatz step function.
pub mod step;

pub use bounds::{Interval, LIMIT_PADDING, PlotLimits, TreeExtent, measure, plot_limits};
pub use builder::{Iteration, Segment, SequenceTreeBuilder, TrackedSequence, TreeParams};
pub use step::{collatz_step, next_generation, stopping_time};
