use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{CollatzError, CollatzResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames coming out of [`TreeRasterizer`](crate::render::TreeRasterizer) are premultiplied;
/// the flag makes that explicit at API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA8 pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    /// Write the frame as a PNG, creating parent directories as needed.
    pub fn save_png(&self, path: &Path) -> CollatzResult<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(CollatzError::render(format!(
                "frame data is {} bytes, expected {expected}",
                self.data.len()
            )));
        }
        ensure_parent_dir(path)?;
        image::save_buffer_with_format(
            path,
            &self.to_straight_rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "wrote png");
        Ok(())
    }
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> CollatzResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, premultiplied: bool) -> FrameRGBA {
        FrameRGBA {
            width: 1,
            height: 1,
            data,
            premultiplied,
        }
    }

    #[test]
    fn unpremultiplies_partial_alpha() {
        let f = frame(vec![64, 0, 0, 128], true);
        assert_eq!(f.to_straight_rgba(), vec![128, 0, 0, 128]);

        let f = frame(vec![64, 0, 0, 128], false);
        assert_eq!(f.to_straight_rgba(), vec![64, 0, 0, 128]);
    }

    #[test]
    fn pixel_is_bounds_checked() {
        let f = frame(vec![1, 2, 3, 4], true);
        assert_eq!(f.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(f.pixel(1, 0), None);
    }

    #[test]
    fn save_rejects_short_buffers() {
        let f = FrameRGBA {
            width: 2,
            height: 2,
            data: vec![0; 4],
            premultiplied: true,
        };
        assert!(f.save_png(Path::new("target/never_written.png")).is_err());
    }
}
