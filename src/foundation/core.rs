use crate::foundation::error::{CollatzError, CollatzResult};

pub use kurbo::{Affine, Point, Rect};

/// 0-based index of a captured frame in an animation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CollatzResult<Self> {
        if den == 0 {
            return Err(CollatzError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CollatzError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn whole(fps: u32) -> CollatzResult<Self> {
        Self::new(fps, 1)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Reject empty canvases and sizes the CPU rasterizer cannot address.
    pub fn validate(self) -> CollatzResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CollatzError::validation("canvas width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(CollatzError::validation(format!(
                "canvas {}x{} exceeds the maximum of {}x{}",
                self.width,
                self.height,
                u16::MAX,
                u16::MAX
            )));
        }
        Ok(())
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Channel bytes in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        let fps = Fps::whole(10).unwrap();
        assert!((fps.frames_to_secs(25) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn canvas_validation_bounds() {
        assert!(Canvas { width: 0, height: 10 }.validate().is_err());
        assert!(Canvas { width: 70_000, height: 10 }.validate().is_err());
        assert!(Canvas { width: 640, height: 480 }.validate().is_ok());
    }

    #[test]
    fn premul_scales_color_channels() {
        let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
        assert_eq!(c.to_array(), [128, 64, 0, 128]);
    }
}
