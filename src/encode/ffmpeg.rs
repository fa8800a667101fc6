use std::io::{Read as _, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CollatzError, CollatzResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::{FrameRGBA, ensure_parent_dir};

/// Where and how [`FfmpegSink`] writes the animation.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// MP4 file to create; an existing file is replaced.
    pub out_path: PathBuf,
    /// Colour that translucent canvas pixels are flattened onto (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Black background, writing to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Encodes the tree animation to H.264 MP4 with the system `ffmpeg`.
///
/// Frames are flattened to opaque RGBA and piped to `ffmpeg` as rawvideo; the process is
/// spawned in `begin` and awaited in `end`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    opaque: Vec<u8>,
}

struct Encoder {
    cfg: SinkConfig,
    child: Child,
    stdin: ChildStdin,
    log: JoinHandle<std::io::Result<Vec<u8>>>,
    next_idx: u64,
    frames: u64,
}

impl FfmpegSink {
    /// Sink for `opts`; nothing is spawned yet.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            opaque: Vec::new(),
        }
    }

    fn encoder_args(&self, cfg: &SinkConfig) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
        ]
        .map(String::from)
        .into();
        args.push("-s".into());
        args.push(format!("{}x{}", cfg.width, cfg.height));
        args.push("-r".into());
        args.push(format!("{}/{}", cfg.fps.num, cfg.fps.den));
        args.extend(
            [
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]
            .map(String::from),
        );
        args.push(self.opts.out_path.to_string_lossy().into_owned());
        args
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> CollatzResult<()> {
        if self.encoder.is_some() {
            return Err(CollatzError::encode("mp4 encoder already running"));
        }
        if cfg.width == 0
            || cfg.height == 0
            || !cfg.width.is_multiple_of(2)
            || !cfg.height.is_multiple_of(2)
        {
            return Err(CollatzError::validation(format!(
                "mp4 canvas must have even, non-zero sides, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(CollatzError::encode(
                "animate needs `ffmpeg` on PATH (use --png-frames to skip encoding)",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            "starting ffmpeg"
        );
        let mut child = Command::new("ffmpeg")
            .args(self.encoder_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CollatzError::encode(format!("could not start ffmpeg: {e}")))?;

        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            return Err(CollatzError::encode("ffmpeg started without piped stdio"));
        };
        // ffmpeg blocks once its stderr pipe fills, so read it concurrently.
        let log = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf)?;
            Ok(buf)
        });

        self.opaque = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.encoder = Some(Encoder {
            cfg,
            child,
            stdin,
            log,
            next_idx: 0,
            frames: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CollatzResult<()> {
        let enc = self
            .encoder
            .as_mut()
            .ok_or_else(|| CollatzError::encode("push_frame before begin"))?;
        if idx.0 < enc.next_idx {
            return Err(CollatzError::encode(format!(
                "frame {} arrived after frame {}",
                idx.0,
                enc.next_idx - 1
            )));
        }
        if (frame.width, frame.height) != (enc.cfg.width, enc.cfg.height) {
            return Err(CollatzError::validation(format!(
                "frame is {}x{} but the video is {}x{}",
                frame.width, frame.height, enc.cfg.width, enc.cfg.height
            )));
        }

        flatten_to_opaque_rgba8(
            &mut self.opaque,
            &frame.data,
            frame.premultiplied,
            self.opts.bg_rgba,
        )?;
        enc.stdin
            .write_all(&self.opaque)
            .map_err(|e| CollatzError::encode(format!("ffmpeg stopped accepting frames: {e}")))?;
        enc.next_idx = idx.0 + 1;
        enc.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> CollatzResult<()> {
        let Encoder {
            mut child,
            stdin,
            log,
            frames,
            ..
        } = self
            .encoder
            .take()
            .ok_or_else(|| CollatzError::encode("end before begin"))?;

        // closing stdin is ffmpeg's end-of-stream
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| CollatzError::encode(format!("waiting for ffmpeg failed: {e}")))?;
        let log = log
            .join()
            .map_err(|_| CollatzError::encode("ffmpeg log reader panicked"))?
            .map_err(|e| CollatzError::encode(format!("reading ffmpeg output failed: {e}")))?;

        if !status.success() {
            return Err(CollatzError::encode(format!(
                "ffmpeg failed ({status}): {}",
                String::from_utf8_lossy(&log).trim()
            )));
        }
        tracing::info!(out = %self.opts.out_path.display(), frames, "wrote mp4");
        Ok(())
    }
}

/// Composite `src` over an opaque `bg`, writing opaque RGBA8 into `dst`.
fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    premultiplied: bool,
    bg: [u8; 4],
) -> CollatzResult<()> {
    if dst.len() != src.len() || !src.len().is_multiple_of(4) {
        return Err(CollatzError::validation(format!(
            "frame has {} bytes, expected {}",
            src.len(),
            dst.len()
        )));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if premultiplied {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(u16::from(bg[c]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// `true` when `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;

    fn frame(w: u32, h: u32) -> FrameRGBA {
        FrameRGBA {
            width: w,
            height: h,
            data: vec![0; (w * h * 4) as usize],
            premultiplied: true,
        }
    }

    #[test]
    fn transparent_pixel_becomes_background() {
        let mut dst = [0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &[0, 0, 0, 0], true, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, [10, 20, 30, 255]);
    }

    #[test]
    fn opaque_pixel_is_kept() {
        let mut dst = [0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &[1, 2, 3, 255], true, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, [1, 2, 3, 255]);
    }

    #[test]
    fn straight_alpha_is_weighted_before_blending() {
        let mut dst = [0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &[255, 0, 0, 128], false, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, [128, 0, 0, 255]);
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let mut dst = [0u8; 8];
        assert!(flatten_to_opaque_rgba8(&mut dst, &[0; 4], true, [0; 4]).is_err());
    }

    #[test]
    fn frames_and_end_require_begin() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unused.mp4"));
        assert!(sink.push_frame(FrameIndex(0), &frame(2, 2)).is_err());
        assert!(sink.end().is_err());
    }

    #[test]
    fn odd_canvas_is_rejected_before_spawning() {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("target/unused.mp4"));
        let cfg = SinkConfig {
            width: 11,
            height: 10,
            fps: Fps::whole(10).unwrap(),
        };
        assert!(sink.begin(cfg).is_err());
        assert!(sink.encoder.is_none());
    }

    #[test]
    fn encoder_args_carry_size_rate_and_output() {
        let sink = FfmpegSink::new(FfmpegSinkOpts::new("videos/tree.mp4"));
        let args = sink.encoder_args(&SinkConfig {
            width: 64,
            height: 32,
            fps: Fps::new(30000, 1001).unwrap(),
        });
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-s") + 1], "64x32");
        assert_eq!(args[pos("-r") + 1], "30000/1001");
        assert!(pos("-r") < pos("-i"));
        assert_eq!(args[pos("-c:v") + 1], "libx264");
        assert_eq!(args.last().map(String::as_str), Some("videos/tree.mp4"));
    }
}
