use crate::foundation::error::{CollatzError, CollatzResult};
use crate::foundation::math::mul_div255_u8;

pub(crate) type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            let mut out = [0u8; 4];
            for i in 0..4 {
                out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

/// Composite `src` over `dst`, both premultiplied RGBA8 of equal length.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8]) -> CollatzResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CollatzError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub(crate) fn fill(buf: &mut [u8], px: PremulRgba8) {
    for d in buf.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_respects_alpha_extremes() {
        assert_eq!(over([10, 20, 30, 255], [0, 0, 0, 0]), [10, 20, 30, 255]);
        assert_eq!(over([10, 20, 30, 255], [1, 2, 3, 255]), [1, 2, 3, 255]);
    }

    #[test]
    fn half_alpha_over_opaque_black_keeps_src() {
        assert_eq!(over([0, 0, 0, 255], [128, 128, 0, 128]), [128, 128, 0, 255]);
    }

    #[test]
    fn in_place_checks_lengths() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
        assert!(over_in_place(&mut dst, &[255u8; 8]).is_ok());
        assert_eq!(dst, vec![255u8; 8]);
    }
}
