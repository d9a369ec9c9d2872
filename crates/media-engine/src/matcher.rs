//! Template matching by zero-mean normalized cross-correlation.
//!
//! # Algorithm
//!
//! 1. **Prepare** each template once: grayscale, zero-mean, L2 norm, plus a
//!    downscaled copy whose shorter side stays at least
//!    [`MIN_COARSE_SIDE`] pixels.
//! 2. **Coarse** search: score every position of the downscaled frame
//!    against the downscaled template, using integral images for the
//!    window statistics.
//! 3. **Confirm** the best few coarse candidates at full resolution in a
//!    small neighbourhood and keep the best full-resolution score.
//!
//! A template counts as present when its full-resolution score exceeds the
//! threshold. Templates are tried in order and the first hit wins.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::GrayImage;

use overblur_common::error::{OverblurError, OverblurResult};
use overblur_model::occurrence::Location;

/// Default normalized correlation score a match must exceed.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.9;

/// Shorter template side kept at the coarse level.
pub const MIN_COARSE_SIDE: u32 = 8;

/// Largest downscale factor used for the coarse search.
const MAX_COARSE_FACTOR: u32 = 8;

/// Coarse candidates confirmed at full resolution.
const COARSE_CANDIDATES: usize = 4;

/// Full-resolution search radius around a coarse hit, in coarse pixels.
const SEARCH_RADIUS_FACTORS: usize = 2;

/// A successful match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchHit {
    pub location: Location,
    pub score: f32,
    /// Position of the matching template in the matcher's list.
    pub template_index: usize,
}

/// Matches a set of reference templates against frames.
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    templates: Vec<PreparedTemplate>,
    threshold: f32,
}

impl TemplateMatcher {
    /// Build a matcher from in-memory templates.
    pub fn new(templates: Vec<GrayImage>, threshold: f32) -> OverblurResult<Self> {
        if templates.is_empty() {
            return Err(OverblurError::config("please provide template files"));
        }
        if !(threshold.is_finite() && threshold > 0.0 && threshold <= 1.0) {
            return Err(OverblurError::config(format!(
                "match threshold must be in (0, 1], got {threshold}"
            )));
        }

        let templates = templates
            .into_iter()
            .enumerate()
            .map(|(index, image)| PreparedTemplate::new(&image, index))
            .collect::<OverblurResult<Vec<_>>>()?;
        Ok(Self {
            templates,
            threshold,
        })
    }

    /// Load templates from image files.
    pub fn from_paths(paths: &[PathBuf], threshold: f32) -> OverblurResult<Self> {
        let images = paths
            .iter()
            .map(|path| load_template(path))
            .collect::<OverblurResult<Vec<_>>>()?;
        let matcher = Self::new(images, threshold)?;
        tracing::info!(templates = matcher.len(), threshold, "Loaded templates");
        Ok(matcher)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Find the first template present in `frame`.
    pub fn locate(&self, frame: &GrayImage) -> Option<MatchHit> {
        let full = Plane::from_gray(frame);
        let full_integral = Integral::new(&full);

        for template in &self.templates {
            if template.full.width > full.width || template.full.height > full.height {
                continue;
            }

            let coarse_frame = Plane::from_gray(&downscale(frame, template.factor));
            let coarse_integral = Integral::new(&coarse_frame);
            let candidates = best_positions(&coarse_frame, &coarse_integral, &template.coarse);

            let mut best: Option<(f32, usize, usize)> = None;
            for (cx, cy) in candidates {
                let f = template.factor as usize;
                let radius = SEARCH_RADIUS_FACTORS * f;
                let max_x = full.width - template.full.width;
                let max_y = full.height - template.full.height;
                let (x0, x1) = ((cx * f).saturating_sub(radius), (cx * f + radius).min(max_x));
                let (y0, y1) = ((cy * f).saturating_sub(radius), (cy * f + radius).min(max_y));
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        let score = zncc(&full, &full_integral, &template.full, x, y);
                        if best.map_or(true, |(s, _, _)| score > s) {
                            best = Some((score, x, y));
                        }
                    }
                }
            }

            if let Some((score, x, y)) = best {
                tracing::trace!(template = template.index, score, x, y, "Best match");
                if score > self.threshold {
                    return Some(MatchHit {
                        location: Location::new(
                            x as i32,
                            y as i32,
                            template.full.width as u32,
                            template.full.height as u32,
                        ),
                        score,
                        template_index: template.index,
                    });
                }
            }
        }
        None
    }
}

/// Read an image file as 8-bit grayscale.
pub fn load_template(path: &Path) -> OverblurResult<GrayImage> {
    if !path.exists() {
        return Err(OverblurError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    image::open(path)
        .map(|img| img.into_luma8())
        .map_err(|e| OverblurError::config(format!("invalid template file {}: {e}", path.display())))
}

#[derive(Debug, Clone)]
struct PreparedTemplate {
    index: usize,
    factor: u32,
    full: ZeroMean,
    coarse: ZeroMean,
}

impl PreparedTemplate {
    fn new(image: &GrayImage, index: usize) -> OverblurResult<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OverblurError::config(format!("template #{index} is empty")));
        }
        let factor = coarse_factor(width.min(height));
        let full = ZeroMean::new(&Plane::from_gray(image));
        if full.norm <= f64::EPSILON {
            return Err(OverblurError::config(format!(
                "template #{index} has no contrast and cannot be matched"
            )));
        }
        let coarse = ZeroMean::new(&Plane::from_gray(&downscale(image, factor)));
        Ok(Self {
            index,
            factor,
            full,
            coarse,
        })
    }
}

/// Largest power of two that keeps the shorter side at [`MIN_COARSE_SIDE`].
fn coarse_factor(shorter_side: u32) -> u32 {
    let mut factor = 1;
    while factor < MAX_COARSE_FACTOR && shorter_side / (factor * 2) >= MIN_COARSE_SIDE {
        factor *= 2;
    }
    factor
}

fn downscale(image: &GrayImage, factor: u32) -> GrayImage {
    if factor <= 1 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    imageops::resize(
        image,
        (w / factor).max(1),
        (h / factor).max(1),
        FilterType::Triangle,
    )
}

/// Row-major grayscale samples.
#[derive(Debug, Clone)]
struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    fn from_gray(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        Self {
            width: w as usize,
            height: h as usize,
            data: image.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }
}

/// Zero-mean template samples and their L2 norm.
#[derive(Debug, Clone)]
struct ZeroMean {
    width: usize,
    height: usize,
    data: Vec<f32>,
    norm: f64,
}

impl ZeroMean {
    fn new(plane: &Plane) -> Self {
        let n = plane.data.len().max(1) as f64;
        let mean = plane.data.iter().map(|&v| v as f64).sum::<f64>() / n;
        let data: Vec<f32> = plane.data.iter().map(|&v| (v as f64 - mean) as f32).collect();
        let norm = data.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>().sqrt();
        Self {
            width: plane.width,
            height: plane.height,
            data,
            norm,
        }
    }
}

/// Summed-area tables of values and squared values.
#[derive(Debug)]
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sq: Vec<f64>,
}

impl Integral {
    fn new(plane: &Plane) -> Self {
        let stride = plane.width + 1;
        let mut sum = vec![0.0; stride * (plane.height + 1)];
        let mut sq = vec![0.0; stride * (plane.height + 1)];
        for y in 0..plane.height {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..plane.width {
                let v = plane.data[y * plane.width + x] as f64;
                row_sum += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row_sum;
                sq[i] = sq[i - stride] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    /// Sum and squared sum over the `w × h` window at `(x, y)`.
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let (a, b, c, d) = (y * s + x, y * s + x + w, (y + h) * s + x, (y + h) * s + x + w);
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sq[d] - self.sq[b] - self.sq[c] + self.sq[a],
        )
    }
}

/// Normalized cross-correlation of the template with the window at `(x, y)`.
fn zncc(frame: &Plane, integral: &Integral, template: &ZeroMean, x: usize, y: usize) -> f32 {
    let n = (template.width * template.height) as f64;
    let (sum, sq) = integral.window(x, y, template.width, template.height);
    let variance = sq - sum * sum / n;
    if variance <= f64::EPSILON {
        return 0.0;
    }

    let mut dot = 0.0f64;
    for ty in 0..template.height {
        let frame_row = &frame.data[(y + ty) * frame.width + x..][..template.width];
        let tpl_row = &template.data[ty * template.width..][..template.width];
        dot += frame_row
            .iter()
            .zip(tpl_row)
            .map(|(&f, &t)| f * t)
            .sum::<f32>() as f64;
    }
    (dot / (variance.sqrt() * template.norm)) as f32
}

/// Top coarse positions, spread at least two pixels apart.
fn best_positions(frame: &Plane, integral: &Integral, template: &ZeroMean) -> Vec<(usize, usize)> {
    if template.width > frame.width || template.height > frame.height || template.norm <= 0.0 {
        return Vec::new();
    }

    let mut scored = Vec::with_capacity(
        (frame.width - template.width + 1) * (frame.height - template.height + 1),
    );
    for y in 0..=frame.height - template.height {
        for x in 0..=frame.width - template.width {
            scored.push((zncc(frame, integral, template, x, y), x, y));
        }
    }
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut picked: Vec<(usize, usize)> = Vec::with_capacity(COARSE_CANDIDATES);
    for (_, x, y) in scored {
        if picked
            .iter()
            .all(|&(px, py)| px.abs_diff(x) > 2 || py.abs_diff(y) > 2)
        {
            picked.push((x, y));
            if picked.len() == COARSE_CANDIDATES {
                break;
            }
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    /// Smooth synthetic overlay: a shaded badge with a diagonal stripe.
    fn badge(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            let stripe = if (fx - fy).abs() < 0.2 { 90.0 } else { 0.0 };
            Luma([(40.0 + 120.0 * fx + stripe + 30.0 * (fy * 6.0).sin()) as u8])
        })
    }

    /// Background of soft waves that never resembles the badge.
    fn background(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let v = 128.0 + 50.0 * ((x as f32) / 23.0).sin() * ((y as f32) / 31.0).cos();
            Luma([v as u8])
        })
    }

    fn paste(frame: &mut GrayImage, overlay: &GrayImage, x: u32, y: u32) {
        imageops::replace(frame, overlay, x as i64, y as i64);
    }

    #[test]
    fn test_coarse_factor() {
        assert_eq!(coarse_factor(4), 1);
        assert_eq!(coarse_factor(16), 2);
        assert_eq!(coarse_factor(40), 4);
        assert_eq!(coarse_factor(500), MAX_COARSE_FACTOR);
    }

    #[test]
    fn test_locates_pasted_template() {
        let template = badge(64, 40);
        let mut frame = background(320, 200);
        paste(&mut frame, &template, 173, 37);

        let matcher = TemplateMatcher::new(vec![template], DEFAULT_MATCH_THRESHOLD).unwrap();
        let hit = matcher.locate(&frame).expect("badge should be found");

        assert_eq!(hit.location, Location::new(173, 37, 64, 40));
        assert!(hit.score > 0.99);
        assert_eq!(hit.template_index, 0);
    }

    #[test]
    fn test_absent_template_is_none() {
        let matcher = TemplateMatcher::new(vec![badge(64, 40)], DEFAULT_MATCH_THRESHOLD).unwrap();
        assert!(matcher.locate(&background(320, 200)).is_none());
    }

    #[test]
    fn test_second_template_can_match() {
        let wide = badge(96, 24);
        let small = badge(32, 32);
        let mut frame = background(256, 160);
        paste(&mut frame, &small, 10, 100);

        let matcher = TemplateMatcher::new(vec![wide, small], DEFAULT_MATCH_THRESHOLD).unwrap();
        let hit = matcher.locate(&frame).unwrap();
        assert_eq!(hit.template_index, 1);
        assert_eq!(hit.location, Location::new(10, 100, 32, 32));
    }

    #[test]
    fn test_template_larger_than_frame_is_skipped() {
        let matcher = TemplateMatcher::new(vec![badge(64, 64)], 0.9).unwrap();
        assert!(matcher.locate(&background(32, 32)).is_none());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(TemplateMatcher::new(vec![], 0.9).is_err());
        assert!(TemplateMatcher::new(vec![badge(16, 16)], 1.5).is_err());
        let flat: GrayImage = ImageBuffer::from_pixel(16, 16, Luma([77]));
        assert!(TemplateMatcher::new(vec![flat], 0.9).is_err());
        assert!(TemplateMatcher::from_paths(&[PathBuf::from("/no/such/template.png")], 0.9).is_err());
    }

    #[test]
    fn test_zncc_is_one_on_exact_window() {
        let template = badge(20, 12);
        let mut frame = background(60, 40);
        paste(&mut frame, &template, 5, 9);

        let plane = Plane::from_gray(&frame);
        let integral = Integral::new(&plane);
        let zero_mean = ZeroMean::new(&Plane::from_gray(&template));
        let score = zncc(&plane, &integral, &zero_mean, 5, 9);
        assert!((score - 1.0).abs() < 1e-4);
    }
}
