use crate::foundation::core::{Point, Rect};
use crate::foundation::error::CollatzResult;
use crate::tree::builder::{SequenceTreeBuilder, TreeParams};

/// Fraction of each axis' extent added as margin on both sides.
pub const LIMIT_PADDING: f64 = 0.05;

/// Closed real interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// Interval spanning `min..=max`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `max - min`.
    pub fn len(self) -> f64 {
        self.max - self.min
    }

    /// `true` when the interval has zero extent.
    pub fn is_empty(self) -> bool {
        self.len() == 0.0
    }

    /// Midpoint.
    pub fn center(self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Inclusive containment test.
    pub fn contains(self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    /// Grow by `frac` of the current extent on each side.
    pub fn padded(self, frac: f64) -> Self {
        let size = self.len();
        Self {
            min: self.min - frac * size,
            max: self.max + frac * size,
        }
    }
}

/// Fixed camera frame for a whole run: `(xlim, ylim)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlotLimits {
    /// Horizontal limits.
    pub x: Interval,
    /// Vertical limits.
    pub y: Interval,
}

impl PlotLimits {
    /// Limits of `extent` with [`LIMIT_PADDING`] on each axis.
    pub fn from_extent(extent: Rect) -> Self {
        Self {
            x: Interval::new(extent.x0, extent.x1).padded(LIMIT_PADDING),
            y: Interval::new(extent.y0, extent.y1).padded(LIMIT_PADDING),
        }
    }

    /// `(xmin, xmax)`.
    pub fn xlim(&self) -> (f64, f64) {
        (self.x.min, self.x.max)
    }

    /// `(ymin, ymax)`.
    pub fn ylim(&self) -> (f64, f64) {
        (self.y.min, self.y.max)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y)
    }
}

/// Result of running a tree to completion without drawing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeExtent {
    /// Tight bounding box of every origin and endpoint.
    pub bounds: Rect,
    /// Number of points folded into `bounds`.
    pub points: u64,
    /// Iterations until convergence.
    pub iterations: u64,
}

impl TreeExtent {
    /// Padded camera limits for this extent.
    pub fn limits(&self) -> PlotLimits {
        PlotLimits::from_extent(self.bounds)
    }
}

/// Drain `builder` and fold every point it ever occupies into a bounding box.
///
/// The starting position of every sequence counts, so the origin is always inside.
pub fn measure(mut builder: SequenceTreeBuilder) -> CollatzResult<TreeExtent> {
    let mut bounds: Option<Rect> = None;
    let mut points = 0u64;
    let mut include = |p: Point| {
        bounds = Some(match bounds {
            Some(r) => r.union_pt(p),
            None => Rect::from_points(p, p),
        });
        points += 1;
    };

    for p in builder.positions() {
        include(p);
    }
    while let Some(it) = builder.try_next_iteration()? {
        for seg in &it.segments {
            include(seg.to);
        }
    }

    let extent = TreeExtent {
        // `from_starts` guarantees at least one sequence.
        bounds: bounds.unwrap_or(Rect::ZERO),
        points,
        iterations: builder.iterations(),
    };
    tracing::debug!(
        points = extent.points,
        iterations = extent.iterations,
        x0 = extent.bounds.x0,
        x1 = extent.bounds.x1,
        y0 = extent.bounds.y0,
        y1 = extent.bounds.y1,
        "tree extent measured"
    );
    Ok(extent)
}

/// Bounding-box pre-pass: axis limits that keep the whole tree in view for `params`.
pub fn plot_limits(params: &TreeParams) -> CollatzResult<PlotLimits> {
    let builder = SequenceTreeBuilder::new(params)?;
    Ok(measure(builder)?.limits())
}
