//! Detection only: print the segment plan.

use serde::Serialize;

use overblur_common::config::AppConfig;
use overblur_common::timecode::format_hms;
use overblur_detect::assemble::edit_spans;
use overblur_media::detect_occurrences;
use overblur_model::occurrence::Interval;
use overblur_model::segment::{EditSpan, Segment, SegmentKind};

use super::DetectArgs;

#[derive(Serialize)]
struct ScanReport<'a> {
    input: String,
    duration_secs: f64,
    video_codec: &'a str,
    width: u32,
    height: u32,
    evaluations: usize,
    intervals: &'a [Interval],
    segments: &'a [Segment],
    spans: Vec<EditSpan>,
}

pub async fn run(config: &AppConfig, detect: DetectArgs, json: bool) -> anyhow::Result<()> {
    let job = detect.into_job(config)?;
    let report = detect_occurrences(&job).await?;
    let detection = &report.detection;
    let segments = detection.segments().unwrap_or(&[]);

    if json {
        let out = ScanReport {
            input: job.input.display().to_string(),
            duration_secs: report.media.duration_secs,
            video_codec: &report.media.video_codec,
            width: report.media.width,
            height: report.media.height,
            evaluations: detection.evaluations(),
            intervals: detection.intervals(),
            segments,
            spans: edit_spans(segments),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Input: {}", job.input.display());
    println!(
        "  Duration: {:.2}s ({})",
        report.media.duration_secs,
        format_hms(report.media.duration_secs)
    );
    println!(
        "  Codec: {} {}x{}",
        report.media.video_codec, report.media.width, report.media.height
    );
    println!("  Frames checked: {}", detection.evaluations());
    println!();

    if segments.is_empty() {
        println!("no template is found in the video");
        return Ok(());
    }

    println!("Segment plan:");
    for segment in segments {
        let what = match segment.kind {
            SegmentKind::Keep => "keep".to_string(),
            SegmentKind::Change(location) => format!("blur {location}"),
        };
        println!(
            "  {:>8.2} - {:>8.2}  ({} - {})  {what}",
            segment.start,
            segment.end,
            format_hms(segment.start),
            format_hms(segment.end)
        );
    }
    Ok(())
}
