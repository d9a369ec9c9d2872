//! Detect the overlay and blur it out.

use std::path::PathBuf;

use overblur_common::config::AppConfig;
use overblur_media::pipeline::split_prefix;
use overblur_media::{run_blur, BlurJob, BlurOutcome, RenderSettings};

use super::DetectArgs;

/// Flags specific to `blur`.
pub struct BlurArgs {
    pub output: PathBuf,
    pub ffmpeg: Option<String>,
    pub boxblur: Option<String>,
    pub dry_run: bool,
    pub no_clean: bool,
}

pub async fn run(config: &AppConfig, detect: DetectArgs, args: BlurArgs) -> anyhow::Result<()> {
    let render = &config.render;
    let ffmpeg = split_prefix(args.ffmpeg.as_deref().unwrap_or(&render.ffmpeg_command));
    if ffmpeg.is_empty() {
        anyhow::bail!("--ffmpeg must name a program");
    }

    let job = BlurJob {
        detect: detect.into_job(config)?,
        output: args.output,
        render: RenderSettings {
            ffmpeg,
            boxblur: args.boxblur.unwrap_or_else(|| render.boxblur.clone()),
            max_muxing_queue_size: render.max_muxing_queue_size,
            dry_run: args.dry_run,
            keep_intermediates: args.no_clean || render.keep_intermediates,
        },
    };
    let dry_run = job.render.dry_run;
    tracing::debug!(
        input = %job.detect.input.display(),
        output = %job.output.display(),
        templates = job.detect.templates.len(),
        dry_run,
        "Starting blur"
    );

    match run_blur(job).await? {
        BlurOutcome::NoOccurrence { evaluations } => {
            eprintln!("no template is found in the video ({evaluations} frames checked)");
        }
        BlurOutcome::Edited {
            output,
            segments,
            evaluations,
        } => {
            if !dry_run {
                let changed = segments.iter().filter(|s| s.is_change()).count();
                println!(
                    "Blurred {changed} part(s) into {} ({evaluations} frames checked)",
                    output.display()
                );
            }
        }
    }
    Ok(())
}
