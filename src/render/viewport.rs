use crate::foundation::core::{Affine, Canvas, Point};
use crate::tree::PlotLimits;

/// World-to-pixel mapping with equal aspect on both axes.
///
/// The world rectangle is centred on the canvas and scaled uniformly so that it fits; world `y`
/// points up, pixel `y` points down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    transform: Affine,
    scale: f64,
}

impl Viewport {
    /// Fit `limits` into `canvas`.
    ///
    /// A zero-extent axis borrows the other axis' extent; when both are zero a unit square is used.
    pub fn fit(limits: &PlotLimits, canvas: Canvas) -> Self {
        let mut w = limits.x.len();
        let mut h = limits.y.len();
        if w <= 0.0 && h <= 0.0 {
            w = 1.0;
            h = 1.0;
        } else if w <= 0.0 {
            w = h;
        } else if h <= 0.0 {
            h = w;
        }

        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let scale = (cw / w).min(ch / h);
        let (cx, cy) = (limits.x.center(), limits.y.center());

        let transform = Affine::new([
            scale,
            0.0,
            0.0,
            -scale,
            0.5 * cw - scale * cx,
            0.5 * ch + scale * cy,
        ]);

        Self { transform, scale }
    }

    /// Pixels per world unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map a world point to pixel space.
    pub fn to_pixel(&self, p: Point) -> Point {
        self.transform * p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Interval;

    fn limits(x: (f64, f64), y: (f64, f64)) -> PlotLimits {
        PlotLimits {
            x: Interval::new(x.0, x.1),
            y: Interval::new(y.0, y.1),
        }
    }

    #[test]
    fn square_limits_fill_square_canvas() {
        let vp = Viewport::fit(
            &limits((-1.0, 1.0), (-1.0, 1.0)),
            Canvas {
                width: 100,
                height: 100,
            },
        );
        assert_eq!(vp.scale(), 50.0);
        assert_eq!(vp.to_pixel(Point::new(0.0, 0.0)), Point::new(50.0, 50.0));
        assert_eq!(vp.to_pixel(Point::new(-1.0, 1.0)), Point::new(0.0, 0.0));
        assert_eq!(vp.to_pixel(Point::new(1.0, -1.0)), Point::new(100.0, 100.0));
    }

    #[test]
    fn wide_limits_are_letterboxed() {
        let vp = Viewport::fit(
            &limits((0.0, 4.0), (0.0, 1.0)),
            Canvas {
                width: 100,
                height: 100,
            },
        );
        assert_eq!(vp.scale(), 25.0);
        let top = vp.to_pixel(Point::new(2.0, 1.0));
        assert!((top.y - 37.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_axis_borrows_other_extent() {
        let vp = Viewport::fit(
            &limits((0.0, 0.0), (0.0, 2.0)),
            Canvas {
                width: 100,
                height: 100,
            },
        );
        assert_eq!(vp.scale(), 50.0);
        assert_eq!(vp.to_pixel(Point::new(0.0, 1.0)), Point::new(50.0, 50.0));

        let vp = Viewport::fit(
            &limits((3.0, 3.0), (3.0, 3.0)),
            Canvas {
                width: 10,
                height: 10,
            },
        );
        assert_eq!(vp.scale(), 10.0);
    }
}
