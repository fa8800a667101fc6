use crate::config::ResolvedRun;
use crate::encode::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{CollatzError, CollatzResult};
use crate::render::{FrameRGBA, TreeRasterizer, TreeStyle};
use crate::tree::{PlotLimits, SequenceTreeBuilder, TreeParams, plot_limits};

/// Raster and capture settings for a [`TreeSession`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeSessionOpts {
    /// Output size.
    pub canvas: Canvas,
    /// Frame rate handed to sinks.
    pub fps: Fps,
    /// Capture a frame on every iteration whose index is a multiple of this.
    pub frame_stride: u64,
}

impl Default for TreeSessionOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1000,
                height: 1000,
            },
            fps: Fps { num: 10, den: 1 },
            frame_stride: 1,
        }
    }
}

/// Counters reported after a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Lockstep iterations until convergence.
    pub iterations: u64,
    /// Non-degenerate segments stroked.
    pub segments_drawn: u64,
    /// Frames pushed to the sink (0 for stills).
    pub frames: u64,
}

/// Everything a run produces besides the frames streamed to a sink.
#[derive(Clone, Debug)]
pub struct SessionOutput {
    /// Fixed camera limits from the pre-pass.
    pub limits: PlotLimits,
    /// Canvas after the last iteration.
    pub final_frame: FrameRGBA,
    /// Counters.
    pub stats: RunStats,
}

/// Drives the tree builder, the rasterizer, and an optional frame sink for one run.
///
/// The bounding-box pre-pass runs first so the camera stays fixed; then the origin marker is
/// drawn, the first frame is captured, and each iteration's segments are drawn in order.
#[derive(Clone, Debug)]
pub struct TreeSession {
    params: TreeParams,
    style: TreeStyle,
    opts: TreeSessionOpts,
}

impl TreeSession {
    /// Validate inputs and create a session.
    pub fn new(params: TreeParams, style: TreeStyle, opts: TreeSessionOpts) -> CollatzResult<Self> {
        params.validate()?;
        style.validate()?;
        opts.canvas.validate()?;
        if opts.frame_stride == 0 {
            return Err(CollatzError::validation("frame_stride must be > 0"));
        }
        Ok(Self {
            params,
            style,
            opts,
        })
    }

    /// Session for a resolved configuration.
    pub fn from_resolved(run: &ResolvedRun) -> CollatzResult<Self> {
        Self::new(
            run.params,
            run.style,
            TreeSessionOpts {
                canvas: run.output.canvas,
                fps: run.output.fps,
                frame_stride: run.output.frame_stride,
            },
        )
    }

    /// Geometry inputs.
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Run and stream frames into `sink`.
    ///
    /// The first frame shows only the origin marker; the final state is always captured, even
    /// when the last iteration does not fall on the stride.
    #[tracing::instrument(skip_all, fields(n = self.params.n))]
    pub fn run(&self, sink: &mut dyn FrameSink) -> CollatzResult<SessionOutput> {
        self.drive(Some(sink))
    }

    /// Run without capturing frames; only the final image is produced.
    #[tracing::instrument(skip_all, fields(n = self.params.n))]
    pub fn render_still(&self) -> CollatzResult<SessionOutput> {
        self.drive(None)
    }

    fn drive(&self, mut sink: Option<&mut dyn FrameSink>) -> CollatzResult<SessionOutput> {
        let limits = plot_limits(&self.params)?;
        tracing::debug!(
            xlim = ?limits.xlim(),
            ylim = ?limits.ylim(),
            "plot limits computed"
        );

        let mut raster = TreeRasterizer::new(self.opts.canvas, &limits, self.style)?;
        raster.draw_origin()?;

        let mut frames = 0u64;
        if let Some(sink) = sink.as_deref_mut() {
            sink.begin(SinkConfig {
                width: self.opts.canvas.width,
                height: self.opts.canvas.height,
                fps: self.opts.fps,
            })?;
            sink.push_frame(FrameIndex(frames), &raster.snapshot())?;
            frames += 1;
        }

        let mut builder = SequenceTreeBuilder::new(&self.params)?;
        let mut pending = false;
        while let Some(it) = builder.try_next_iteration()? {
            raster.draw_segments(&it.segments)?;
            pending = true;
            if let Some(sink) = sink.as_deref_mut()
                && it.index.is_multiple_of(self.opts.frame_stride)
            {
                sink.push_frame(FrameIndex(frames), &raster.snapshot())?;
                frames += 1;
                pending = false;
            }
        }

        if let Some(sink) = sink.as_deref_mut() {
            if pending {
                sink.push_frame(FrameIndex(frames), &raster.snapshot())?;
                frames += 1;
            }
            sink.end()?;
        }

        let stats = RunStats {
            iterations: builder.iterations(),
            segments_drawn: raster.segments_drawn(),
            frames,
        };
        tracing::debug!(
            iterations = stats.iterations,
            segments = stats.segments_drawn,
            frames = stats.frames,
            "tree run finished"
        );

        Ok(SessionOutput {
            limits,
            final_frame: raster.snapshot(),
            stats,
        })
    }
}
