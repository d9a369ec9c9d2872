//! Detection and blur jobs: the entry points used by the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use overblur_common::error::{OverblurError, OverblurResult};
use overblur_detect::assemble::is_passthrough;
use overblur_detect::{Detection, OccurrenceDetector, ScanConfig};
use overblur_model::segment::Segment;

use crate::frame::FrameExtractor;
use crate::matcher::{TemplateMatcher, DEFAULT_MATCH_THRESHOLD};
use crate::media_info::{probe_media, MediaInfo};
use crate::pipeline::{
    split_prefix, EditPipeline, PipelineOptions, DEFAULT_BOXBLUR, DEFAULT_FFMPEG_PREFIX,
};
use crate::probe::FrameProbe;
use crate::runner::CommandRunner;

/// What to look for, and where.
#[derive(Debug, Clone)]
pub struct DetectJob {
    /// Input video.
    pub input: PathBuf,

    /// Template images; the first one that matches a frame wins.
    pub templates: Vec<PathBuf>,

    /// Normalized correlation score a match must exceed.
    pub threshold: f32,

    /// Coarse step, refinement schedule and optional range.
    pub scan: ScanConfig,
}

impl DetectJob {
    pub fn new(input: impl Into<PathBuf>, templates: Vec<PathBuf>) -> Self {
        Self {
            input: input.into(),
            templates,
            threshold: DEFAULT_MATCH_THRESHOLD,
            scan: ScanConfig::default(),
        }
    }
}

/// How the edit pipeline runs.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// ffmpeg program and leading arguments.
    pub ffmpeg: Vec<String>,

    /// `boxblur` filter parameters.
    pub boxblur: String,

    /// Appended as `-max_muxing_queue_size N` after each input.
    pub max_muxing_queue_size: Option<u32>,

    /// Print commands instead of running them.
    pub dry_run: bool,

    /// Leave the split files behind.
    pub keep_intermediates: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: split_prefix(DEFAULT_FFMPEG_PREFIX),
            boxblur: DEFAULT_BOXBLUR.to_string(),
            max_muxing_queue_size: None,
            dry_run: false,
            keep_intermediates: false,
        }
    }
}

/// A full detect-then-blur run.
#[derive(Debug, Clone)]
pub struct BlurJob {
    pub detect: DetectJob,
    pub output: PathBuf,
    pub render: RenderSettings,
}

/// Result of [`detect_occurrences`].
#[derive(Debug, Clone)]
pub struct DetectReport {
    pub media: MediaInfo,
    pub detection: Detection,
}

/// Result of [`run_blur`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlurOutcome {
    /// Nothing to blur; the output was not written.
    NoOccurrence { evaluations: usize },

    /// The output was written (or, in dry-run mode, its commands printed).
    Edited {
        output: PathBuf,
        segments: Vec<Segment>,
        evaluations: usize,
    },
}

/// Probe the input and find every interval where a template is visible.
pub async fn detect_occurrences(job: &DetectJob) -> OverblurResult<DetectReport> {
    if job.templates.is_empty() {
        return Err(OverblurError::config("please provide template files"));
    }

    let media = probe_media(&job.input)?;
    tracing::info!(
        input = %job.input.display(),
        duration_secs = media.duration_secs,
        codec = %media.video_codec,
        width = media.width,
        height = media.height,
        "Probed input"
    );

    let matcher = Arc::new(TemplateMatcher::from_paths(&job.templates, job.threshold)?);
    let probe = Arc::new(FrameProbe::new(FrameExtractor::new(&job.input), matcher));
    let detection = OccurrenceDetector::new(probe, job.scan.clone())
        .detect(media.duration_secs)
        .await?;

    Ok(DetectReport { media, detection })
}

/// Detect the overlay and blur it out of every interval where it shows.
///
/// This is the main entry point for the `blur` command.
pub async fn run_blur(job: BlurJob) -> OverblurResult<BlurOutcome> {
    if job.output.as_os_str().is_empty() {
        return Err(OverblurError::config("please provide an output file"));
    }
    if same_file(&job.detect.input, &job.output) {
        return Err(OverblurError::config(
            "output file must differ from the input file",
        ));
    }

    let report = detect_occurrences(&job.detect).await?;
    let (segments, evaluations) = match blur_plan(report.detection) {
        Ok(plan) => plan,
        Err(outcome) => return Ok(outcome),
    };

    let work_dir = job
        .output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !job.render.dry_run {
        std::fs::create_dir_all(&work_dir)?;
    }

    let options = PipelineOptions {
        ffmpeg: job.render.ffmpeg.clone(),
        boxblur: job.render.boxblur.clone(),
        video_codec: report.media.video_codec.clone(),
        max_muxing_queue_size: job.render.max_muxing_queue_size,
        work_dir,
    };
    let pipeline = EditPipeline::build(&job.detect.input, &job.output, &segments, &options)?;
    let runner = CommandRunner::new(job.render.dry_run);

    let pipeline = tokio::task::spawn_blocking(move || pipeline.run(&runner).map(|()| pipeline))
        .await
        .map_err(|e| OverblurError::task(e.to_string()))??;

    if !job.render.keep_intermediates {
        let removed = pipeline.cleanup(job.render.dry_run);
        tracing::debug!(removed, "Cleaned up intermediate files");
    }

    tracing::info!(output = %job.output.display(), "All done");
    Ok(BlurOutcome::Edited {
        output: job.output,
        segments,
        evaluations,
    })
}

/// The segments to render, or the outcome when there is nothing to blur.
fn blur_plan(detection: Detection) -> Result<(Vec<Segment>, usize), BlurOutcome> {
    match detection {
        Detection::NoOccurrence { evaluations } => {
            tracing::info!("no template is found in the video");
            Err(BlurOutcome::NoOccurrence { evaluations })
        }
        Detection::Found {
            segments,
            evaluations,
            ..
        } if !is_passthrough(&segments) => Ok((segments, evaluations)),
        Detection::Found { evaluations, .. } => {
            tracing::warn!("Occurrences are too short or carry no location, nothing to blur");
            Err(BlurOutcome::NoOccurrence { evaluations })
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
