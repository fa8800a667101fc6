//! CPU rendering of tree segments.

mod composite;
/// `vello_cpu` rasterizer.
pub mod cpu;
/// Rendered frame type and PNG output.
pub mod frame;
/// World-to-pixel mapping.
pub mod viewport;

pub use cpu::TreeRasterizer;
pub use frame::{FrameRGBA, ensure_parent_dir};
pub use viewport::Viewport;

use crate::config::Color;
use crate::foundation::error::{CollatzError, CollatzResult};

/// Cosmetic parameters. The geometry never depends on these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub line_width: f64,
    /// Stroke opacity in `0..=1`, multiplied into the color's own alpha.
    pub alpha: f64,
    /// Canvas clear color.
    pub background: Color,
    /// Diameter of the origin marker in pixels; `0` disables it.
    pub marker_size: f64,
}

impl Default for TreeStyle {
    fn default() -> Self {
        Self {
            color: Color::YELLOW,
            line_width: 0.5,
            alpha: 0.7,
            background: Color::BLACK,
            marker_size: 8.0,
        }
    }
}

impl TreeStyle {
    /// Reject out-of-range cosmetic values.
    pub fn validate(&self) -> CollatzResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(CollatzError::validation(format!(
                "alpha must be within 0..=1, got {}",
                self.alpha
            )));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(CollatzError::validation(format!(
                "line_width must be > 0, got {}",
                self.line_width
            )));
        }
        if !(self.marker_size.is_finite() && self.marker_size >= 0.0) {
            return Err(CollatzError::validation(format!(
                "marker_size must be >= 0, got {}",
                self.marker_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_valid() {
        assert!(TreeStyle::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = |style: TreeStyle| style.validate().is_err();
        assert!(bad(TreeStyle {
            alpha: -0.1,
            ..TreeStyle::default()
        }));
        assert!(bad(TreeStyle {
            alpha: f64::NAN,
            ..TreeStyle::default()
        }));
        assert!(bad(TreeStyle {
            line_width: 0.0,
            ..TreeStyle::default()
        }));
        assert!(bad(TreeStyle {
            marker_size: -1.0,
            ..TreeStyle::default()
        }));
    }
}
