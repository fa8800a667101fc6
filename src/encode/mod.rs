//! Frame sinks.
//!
//! Sinks consume captured frames in order and are driven by [`TreeSession`](crate::TreeSession).

/// MP4 output through the system `ffmpeg`.
pub mod ffmpeg;
/// Sink trait and simple built-in sinks.
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
