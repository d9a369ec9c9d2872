//! Presence probe backed by real frames.

use std::sync::Arc;

use overblur_detect::Probe;
use overblur_model::occurrence::Location;

use crate::frame::FrameExtractor;
use crate::matcher::TemplateMatcher;

/// Extracts the frame at a timestamp and runs the template matcher on it.
///
/// Extraction failures count as "absent" so one bad frame cannot abort a
/// scan.
#[derive(Debug, Clone)]
pub struct FrameProbe {
    extractor: FrameExtractor,
    matcher: Arc<TemplateMatcher>,
}

impl FrameProbe {
    pub fn new(extractor: FrameExtractor, matcher: Arc<TemplateMatcher>) -> Self {
        Self { extractor, matcher }
    }

    pub fn matcher(&self) -> &TemplateMatcher {
        &self.matcher
    }
}

impl Probe for FrameProbe {
    fn probe(&self, second: f64) -> Option<Location> {
        let frame = match self.extractor.extract(second) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(
                    second,
                    input = %self.extractor.input().display(),
                    error = %e,
                    "Frame unavailable, treating as absent"
                );
                return None;
            }
        };

        let hit = self.matcher.locate(&frame)?;
        tracing::trace!(
            second,
            score = hit.score,
            template = hit.template_index,
            "Template at {}",
            hit.location
        );
        Some(hit.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    fn gradient() -> GrayImage {
        ImageBuffer::from_fn(16, 16, |x, y| Luma([(x * 8 + y * 4) as u8]))
    }

    #[test]
    fn test_extraction_failure_is_absent() {
        let matcher = Arc::new(TemplateMatcher::new(vec![gradient()], 0.9).unwrap());
        let probe = FrameProbe::new(
            FrameExtractor::with_program("overblur-missing-ffmpeg", "in.mp4"),
            matcher,
        );
        assert_eq!(probe.probe(12.0), None);
        assert_eq!(probe.matcher().len(), 1);
        assert_eq!(probe.extractor.input(), std::path::Path::new("in.mp4"));
    }
}
