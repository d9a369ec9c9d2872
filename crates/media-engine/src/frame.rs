//! Single-frame extraction.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::{GrayImage, ImageFormat};

use overblur_common::error::{OverblurError, OverblurResult};

/// Grabs one decoded frame at a timestamp by spawning `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    program: String,
    input: PathBuf,
}

impl FrameExtractor {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self::with_program("ffmpeg", input)
    }

    pub fn with_program(program: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            input: input.into(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Decode the frame at `second` to 8-bit grayscale.
    ///
    /// Seeking happens before `-i` so ffmpeg jumps to the nearest keyframe
    /// instead of decoding from the start.
    pub fn extract(&self, second: f64) -> OverblurResult<GrayImage> {
        let output = Command::new(&self.program)
            .args(["-v", "error", "-ss", &format!("{second:.2}"), "-i"])
            .arg(&self.input)
            .args(["-frames:v", "1", "-f", "image2", "-c:v", "png", "pipe:1"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                OverblurError::probe(second, format!("failed to start {}: {e}", self.program))
            })?;

        if !output.status.success() {
            return Err(OverblurError::probe(
                second,
                format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        if output.stdout.is_empty() {
            return Err(OverblurError::probe(second, "no frame at this position"));
        }

        decode_frame(second, &output.stdout)
    }
}

/// Decode PNG bytes to grayscale.
pub fn decode_frame(second: f64, png: &[u8]) -> OverblurResult<GrayImage> {
    image::load_from_memory_with_format(png, ImageFormat::Png)
        .map(|img| img.into_luma8())
        .map_err(|e| OverblurError::probe(second, format!("undecodable frame: {e}")))
}
