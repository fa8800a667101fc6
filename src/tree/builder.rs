use std::ops::Range;

use crate::foundation::core::Point;
use crate::foundation::error::{CollatzError, CollatzResult};
use crate::tree::step::{collatz_step, stopping_time};

/// Immutable inputs of one tree run.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeParams {
    /// Exclusive upper bound of the starting integers (`starts = 2..n`).
    pub n: u64,
    /// Bend angle in radians.
    pub theta: f64,
    /// Initial heading in radians.
    pub start_angle: f64,
}

impl TreeParams {
    /// Create validated parameters.
    pub fn new(n: u64, theta: f64, start_angle: f64) -> CollatzResult<Self> {
        let params = Self {
            n,
            theta,
            start_angle,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject an empty start range and non-finite angles.
    pub fn validate(&self) -> CollatzResult<()> {
        if self.n < 3 {
            return Err(CollatzError::validation(format!(
                "n must be >= 3 so that at least one starting integer exists, got {}",
                self.n
            )));
        }
        validate_angles(self.theta, self.start_angle)
    }

    /// Starting integers covered by this run.
    pub fn starts(&self) -> Range<u64> {
        2..self.n
    }
}

fn validate_angles(theta: f64, start_angle: f64) -> CollatzResult<()> {
    if !theta.is_finite() {
        return Err(CollatzError::validation(format!(
            "theta must be finite, got {theta}"
        )));
    }
    if !start_angle.is_finite() {
        return Err(CollatzError::validation(format!(
            "start_angle must be finite, got {start_angle}"
        )));
    }
    Ok(())
}

/// Per-start state advanced once per iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedSequence {
    /// Starting integer this record was created for.
    pub start: u64,
    /// Current value in the sequence.
    pub value: u64,
    /// End of the most recent segment.
    pub position: Point,
    /// Accumulated heading in radians.
    pub heading: f64,
    /// `false` once `value` has reached 1.
    pub active: bool,
}

impl TrackedSequence {
    fn new(start: u64, start_angle: f64) -> Self {
        Self {
            start,
            value: start,
            position: Point::ORIGIN,
            heading: start_angle,
            active: start != 1,
        }
    }

    /// Successor value, or an error when it leaves the `u64` range.
    fn next_value(&self) -> CollatzResult<u64> {
        collatz_step(self.value).ok_or_else(|| {
            CollatzError::validation(format!(
                "sequence starting at {} overflows u64 after value {}",
                self.start, self.value
            ))
        })
    }

    /// Move to `next` and return the `(from, to)` pair of the emitted segment.
    ///
    /// A frozen sequence stays put and yields a zero-length segment.
    fn advance(&mut self, theta: f64, next: u64) -> (Point, Point) {
        let from = self.position;
        if !self.active {
            return (from, from);
        }

        self.heading += if self.value.is_multiple_of(2) {
            -theta
        } else {
            theta
        };
        self.position = Point::new(from.x + self.heading.cos(), from.y + self.heading.sin());
        self.value = next;
        self.active = next != 1;
        (from, self.position)
    }
}

/// One line piece emitted for one tracked sequence at one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Position of the emitting sequence in the builder's ordered container.
    pub index: usize,
    /// Starting integer of the emitting sequence.
    pub start_value: u64,
    /// Segment start.
    pub from: Point,
    /// Segment end.
    pub to: Point,
}

impl Segment {
    /// Euclidean length (1 while the sequence is active, 0 after).
    pub fn length(&self) -> f64 {
        self.from.distance(self.to)
    }

    /// `true` for the zero-length segments of frozen sequences.
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

/// Segments produced by one lockstep iteration, ordered by sequence index.
#[derive(Clone, Debug, PartialEq)]
pub struct Iteration {
    /// 0-based iteration counter shared by every sequence.
    pub index: u64,
    /// One segment per tracked sequence.
    pub segments: Vec<Segment>,
}

impl Iteration {
    /// Segments with non-zero length.
    pub fn visible_segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().filter(|s| !s.is_degenerate())
    }
}

/// Drives every tracked sequence in lockstep until all of them sit at the fixed point.
///
/// The builder is an [`Iterator`] over [`Iteration`]s; it is exhausted exactly when
/// [`SequenceTreeBuilder::is_converged`] becomes `true`.
#[derive(Clone, Debug)]
pub struct SequenceTreeBuilder {
    theta: f64,
    start_angle: f64,
    sequences: Vec<TrackedSequence>,
    iteration: u64,
}

impl SequenceTreeBuilder {
    /// Track every start in `params.starts()`.
    pub fn new(params: &TreeParams) -> CollatzResult<Self> {
        params.validate()?;
        Self::from_starts(params.starts(), params.theta, params.start_angle)
    }

    /// Track an explicit set of starts.
    ///
    /// Starts are sorted and deduplicated so that segment indices follow the starting value.
    /// A start whose trajectory leaves the `u64` range before reaching 1 is rejected.
    pub fn from_starts(
        starts: impl IntoIterator<Item = u64>,
        theta: f64,
        start_angle: f64,
    ) -> CollatzResult<Self> {
        validate_angles(theta, start_angle)?;

        let mut starts: Vec<u64> = starts.into_iter().collect();
        starts.sort_unstable();
        starts.dedup();
        if starts.is_empty() {
            return Err(CollatzError::validation("at least one starting integer is required"));
        }
        if starts[0] == 0 {
            return Err(CollatzError::validation(
                "starting integers must be >= 1 (0 never reaches the fixed point)",
            ));
        }
        if let Some(&bad) = starts.iter().find(|&&s| stopping_time(s).is_none()) {
            return Err(CollatzError::validation(format!(
                "starting integer {bad} overflows u64 before reaching 1"
            )));
        }

        tracing::debug!(
            sequences = starts.len(),
            theta,
            start_angle,
            "sequence tree builder created"
        );

        Ok(Self {
            theta,
            start_angle,
            sequences: starts
                .into_iter()
                .map(|s| TrackedSequence::new(s, start_angle))
                .collect(),
            iteration: 0,
        })
    }

    /// Bend angle in radians.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Initial heading in radians.
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Tracked sequences ordered by starting value.
    pub fn sequences(&self) -> &[TrackedSequence] {
        &self.sequences
    }

    /// Look up the tracked sequence created for `start`.
    pub fn sequence(&self, start: u64) -> Option<&TrackedSequence> {
        self.sequences
            .binary_search_by_key(&start, |s| s.start)
            .ok()
            .map(|i| &self.sequences[i])
    }

    /// Number of iterations emitted so far.
    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    /// `true` once every tracked value equals 1.
    pub fn is_converged(&self) -> bool {
        self.sequences.iter().all(|s| s.value == 1)
    }

    /// Current endpoint of every sequence, in index order.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.sequences.iter().map(|s| s.position)
    }

    /// Advance every sequence by one step.
    ///
    /// Returns `None` once the tree has converged; no segments are emitted after that.
    /// An overflowing step fails the whole iteration and leaves every sequence untouched.
    pub fn try_next_iteration(&mut self) -> CollatzResult<Option<Iteration>> {
        if self.is_converged() {
            return Ok(None);
        }

        let next: Vec<u64> = self
            .sequences
            .iter()
            .map(TrackedSequence::next_value)
            .collect::<CollatzResult<_>>()?;

        let theta = self.theta;
        let segments = self
            .sequences
            .iter_mut()
            .zip(next)
            .enumerate()
            .map(|(index, (seq, next))| {
                let (from, to) = seq.advance(theta, next);
                Segment {
                    index,
                    start_value: seq.start,
                    from,
                    to,
                }
            })
            .collect();

        let it = Iteration {
            index: self.iteration,
            segments,
        };
        self.iteration += 1;
        tracing::trace!(iteration = it.index, "tree iteration");
        Ok(Some(it))
    }

    /// Infallible form of [`Self::try_next_iteration`].
    ///
    /// Builders from [`Self::new`] and [`Self::from_starts`] never overflow; a failed step is
    /// logged and ends the iteration.
    pub fn next_iteration(&mut self) -> Option<Iteration> {
        match self.try_next_iteration() {
            Ok(it) => it,
            Err(err) => {
                tracing::error!(error = %err, "tree iteration failed");
                None
            }
        }
    }
}

impl Iterator for SequenceTreeBuilder {
    type Item = Iteration;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_iteration()
    }
}

impl std::iter::FusedIterator for SequenceTreeBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn params_reject_empty_start_range() {
        assert!(TreeParams::new(0, 0.1, 0.0).is_err());
        assert!(TreeParams::new(2, 0.1, 0.0).is_err());
        assert!(TreeParams::new(3, 0.1, 0.0).is_ok());
        assert_eq!(TreeParams::new(5, 0.1, 0.0).unwrap().starts(), 2..5);
    }

    #[test]
    fn params_reject_non_finite_angles() {
        assert!(TreeParams::new(10, f64::NAN, 0.0).is_err());
        assert!(TreeParams::new(10, 0.1, f64::INFINITY).is_err());
    }

    #[test]
    fn from_starts_rejects_zero_and_empty() {
        assert!(SequenceTreeBuilder::from_starts([], 0.1, 0.0).is_err());
        assert!(SequenceTreeBuilder::from_starts([0, 4], 0.1, 0.0).is_err());
    }

    #[test]
    fn from_starts_rejects_overflowing_trajectories() {
        let err = SequenceTreeBuilder::from_starts([3, u64::MAX], 0.1, 0.0).unwrap_err();
        assert!(err.to_string().contains(&u64::MAX.to_string()));
        assert!(SequenceTreeBuilder::from_starts([6_148_914_691_236_517_207], 0.1, 0.0).is_err());
        // large but safe: even start halves first
        assert!(SequenceTreeBuilder::from_starts([1u64 << 63], 0.1, 0.0).is_ok());
    }

    #[test]
    fn overflowing_step_fails_without_partial_advance() {
        let mut b = SequenceTreeBuilder {
            theta: 0.1,
            start_angle: 0.0,
            sequences: vec![
                TrackedSequence::new(4, 0.0),
                TrackedSequence::new(u64::MAX, 0.0),
            ],
            iteration: 0,
        };
        let before = b.sequences().to_vec();

        assert!(b.try_next_iteration().is_err());
        assert_eq!(b.sequences(), before.as_slice());
        assert_eq!(b.iterations(), 0);
        assert!(!b.is_converged());
        // the iterator ends instead of panicking
        assert!(b.next().is_none());
        assert!(b.next().is_none());
    }

    #[test]
    fn from_starts_orders_and_dedups() {
        let b = SequenceTreeBuilder::from_starts([7, 3, 7, 5], 0.1, 0.0).unwrap();
        let starts: Vec<u64> = b.sequences().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![3, 5, 7]);
        assert_eq!(b.sequence(5).map(|s| s.value), Some(5));
        assert!(b.sequence(4).is_none());
    }

    #[test]
    fn single_start_two_emits_one_segment() {
        let params = TreeParams::new(3, PI / 30.0, PI / 2.0).unwrap();
        let mut b = SequenceTreeBuilder::new(&params).unwrap();
        let it = b.next_iteration().unwrap();
        assert_eq!(it.index, 0);
        assert_eq!(it.segments.len(), 1);

        let seg = it.segments[0];
        let heading = PI / 2.0 - PI / 30.0;
        assert_eq!(seg.from, Point::ORIGIN);
        assert!((seg.to.x - heading.cos()).abs() < 1e-12);
        assert!((seg.to.y - heading.sin()).abs() < 1e-12);
        assert!((seg.length() - 1.0).abs() < 1e-12);

        assert!(b.is_converged());
        assert!(b.next_iteration().is_none());
        assert_eq!(b.iterations(), 1);
    }

    #[test]
    fn start_one_is_frozen_from_the_beginning() {
        let mut b = SequenceTreeBuilder::from_starts([1], 0.3, 0.0).unwrap();
        assert!(!b.sequences()[0].active);
        assert!(b.is_converged());
        assert!(b.next_iteration().is_none());
    }

    #[test]
    fn odd_values_bend_positive() {
        let mut b = SequenceTreeBuilder::from_starts([3], 0.25, 0.0).unwrap();
        let it = b.next_iteration().unwrap();
        assert!((b.sequences()[0].heading - 0.25).abs() < 1e-15);
        assert_eq!(b.sequences()[0].value, 10);
        assert!(it.segments[0].to.y > 0.0);
    }
}
