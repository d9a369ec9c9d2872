//! Split / filter / concat edit pipeline.
//!
//! A segment plan becomes four kinds of `ffmpeg` invocation:
//!
//! 1. one split that stream-copies every `Keep` span to `part-NN.ts`,
//! 2. one split that stream-copies every `Change` span to `change-NN.ts`,
//! 3. one filter per change that blurs the overlay region into
//!    `changed-NN.ts`,
//! 4. one concat of `part-00.ts|changed-00.ts|…|part-NN.ts` into the output.
//!
//! Only the changed spans are re-encoded.

use std::fmt;
use std::path::{Path, PathBuf};

use overblur_common::error::{OverblurError, OverblurResult};
use overblur_model::occurrence::Location;
use overblur_model::segment::{EditSpan, Segment, SEGMENT_EPSILON};

use crate::runner::CommandRunner;

/// Default `ffmpeg` invocation prefix.
pub const DEFAULT_FFMPEG_PREFIX: &str = "ffmpeg -loglevel warning -y";

/// Default `boxblur` filter parameters.
pub const DEFAULT_BOXBLUR: &str = "20";

/// Knobs for building the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Program and leading arguments of every command.
    pub ffmpeg: Vec<String>,

    /// `boxblur` filter parameters.
    pub boxblur: String,

    /// Codec used when re-encoding changed spans.
    pub video_codec: String,

    /// Appended as `-max_muxing_queue_size N` after each input.
    pub max_muxing_queue_size: Option<u32>,

    /// Where intermediate files are written.
    pub work_dir: PathBuf,
}

impl PipelineOptions {
    pub fn new(video_codec: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: split_prefix(DEFAULT_FFMPEG_PREFIX),
            boxblur: DEFAULT_BOXBLUR.to_string(),
            video_codec: video_codec.into(),
            max_muxing_queue_size: None,
            work_dir: work_dir.into(),
        }
    }
}

/// Split a configured prefix such as `"ffmpeg -loglevel warning -y"` into argv.
pub fn split_prefix(prefix: &str) -> Vec<String> {
    prefix.split_whitespace().map(str::to_string).collect()
}

/// Which part of the pipeline a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    SplitKeep,
    SplitChange,
    Filter,
    Concat,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SplitKeep => "split-keep",
            Self::SplitChange => "split-change",
            Self::Filter => "filter",
            Self::Concat => "concat",
        })
    }
}

/// One command of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCommand {
    pub stage: PipelineStage,
    pub argv: Vec<String>,
}

/// Fully built pipeline for one input/output pair.
#[derive(Debug, Clone)]
pub struct EditPipeline {
    commands: Vec<PlannedCommand>,
    intermediates: Vec<PathBuf>,
    split_times: Vec<f64>,
    output: PathBuf,
}

impl EditPipeline {
    /// Build every command for `segments`.
    ///
    /// Zero-length spans produce no file. A plan without any non-empty
    /// `Change` is rejected: there is nothing to edit.
    pub fn build(
        input: &Path,
        output: &Path,
        segments: &[Segment],
        options: &PipelineOptions,
    ) -> OverblurResult<Self> {
        if options.ffmpeg.is_empty() {
            return Err(OverblurError::config("ffmpeg command must not be empty"));
        }

        let input_args = with_input(options, &path_arg(input));
        let mut keep = input_args.clone();
        let mut change = input_args;
        let bare_len = keep.len();
        let mut filters = Vec::new();
        let mut merge_list = Vec::new();
        let mut intermediates = Vec::new();
        let mut split_times = Vec::new();

        let last = segments.len().saturating_sub(1);
        for (position, segment) in segments.iter().enumerate() {
            if segment.duration() <= SEGMENT_EPSILON {
                tracing::debug!(index = segment.index, "Skipping empty segment");
                continue;
            }
            match segment.edit_span() {
                EditSpan::Copy { start, duration } => {
                    let part = options.work_dir.join(format!("part-{:02}.ts", segment.index));
                    keep.extend(["-ss".to_string(), format!("{start:.2}")]);
                    if position != last {
                        keep.extend(["-t".to_string(), format!("{duration:.2}")]);
                    }
                    keep.extend(["-codec".to_string(), "copy".to_string(), path_arg(&part)]);
                    merge_list.push(path_arg(&part));
                    intermediates.push(part);
                }
                EditSpan::Filter {
                    start,
                    duration,
                    location,
                } => {
                    let cut = options.work_dir.join(format!("change-{:02}.ts", segment.index));
                    let changed = options
                        .work_dir
                        .join(format!("changed-{:02}.ts", segment.index));
                    change.extend([
                        "-ss".to_string(),
                        format!("{start:.2}"),
                        "-t".to_string(),
                        format!("{duration:.2}"),
                        "-codec".to_string(),
                        "copy".to_string(),
                        path_arg(&cut),
                    ]);
                    filters.push(filter_command(options, &cut, &changed, location));
                    merge_list.push(path_arg(&changed));
                    split_times.extend([segment.start, segment.end]);
                    intermediates.extend([cut, changed]);
                }
            }
        }

        if filters.is_empty() {
            return Err(OverblurError::pipeline(
                "segment plan contains nothing to change",
            ));
        }

        let mut commands = Vec::with_capacity(filters.len() + 3);
        if keep.len() > bare_len {
            commands.push(PlannedCommand {
                stage: PipelineStage::SplitKeep,
                argv: keep,
            });
        }
        commands.push(PlannedCommand {
            stage: PipelineStage::SplitChange,
            argv: change,
        });
        commands.extend(filters);

        let mut concat = with_input(options, &format!("concat:{}", merge_list.join("|")));
        concat.extend(["-c".to_string(), "copy".to_string(), path_arg(output)]);
        commands.push(PlannedCommand {
            stage: PipelineStage::Concat,
            argv: concat,
        });

        Ok(Self {
            commands,
            intermediates,
            split_times,
            output: output.to_path_buf(),
        })
    }

    pub fn commands(&self) -> &[PlannedCommand] {
        &self.commands
    }

    pub fn intermediates(&self) -> &[PathBuf] {
        &self.intermediates
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Run every command in order. The first failure aborts the run and
    /// leaves partial outputs in place.
    pub fn run(&self, runner: &CommandRunner) -> OverblurResult<()> {
        let times: Vec<String> = self.split_times.iter().map(|t| format!("{t:.2}")).collect();
        tracing::info!(
            dry_run = runner.is_dry_run(),
            "Splitting video at time: [{}]",
            times.join(" ")
        );

        for command in &self.commands {
            match command.stage {
                PipelineStage::Filter => tracing::info!("Applying blur filter"),
                PipelineStage::Concat => {
                    tracing::info!(output = %self.output.display(), "Merging videos")
                }
                _ => {}
            }
            runner.run(&command.stage.to_string(), &command.argv)?;
        }
        Ok(())
    }

    /// Remove intermediate files. Failures are logged and swallowed.
    ///
    /// Returns the number of files removed.
    pub fn cleanup(&self, dry_run: bool) -> usize {
        let mut removed = 0;
        for path in &self.intermediates {
            tracing::debug!(path = %path.display(), "Removing intermediate file");
            if dry_run {
                continue;
            }
            match std::fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    let err = OverblurError::cleanup(path, e.to_string());
                    tracing::warn!(error = %err, "Failed to remove intermediate file");
                }
            }
        }
        removed
    }
}

fn filter_command(
    options: &PipelineOptions,
    cut: &Path,
    changed: &Path,
    location: Location,
) -> PlannedCommand {
    let Location {
        x,
        y,
        width,
        height,
    } = location;
    let graph = format!(
        "[0:v]crop={width}:{height}:{x}:{y},boxblur={}[fg]; [0:v][fg]overlay={x}:{y}[v]",
        options.boxblur
    );

    let mut argv = with_input(options, &path_arg(cut));
    argv.extend([
        "-filter_complex".to_string(),
        graph,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
        "-c:v".to_string(),
        options.video_codec.clone(),
        "-c:a".to_string(),
        "copy".to_string(),
        path_arg(changed),
    ]);
    PlannedCommand {
        stage: PipelineStage::Filter,
        argv,
    }
}

/// `<ffmpeg…> -i <input> [-max_muxing_queue_size N]`
fn with_input(options: &PipelineOptions, input: &str) -> Vec<String> {
    let mut argv = options.ffmpeg.clone();
    argv.extend(["-i".to_string(), input.to_string()]);
    if let Some(size) = options.max_muxing_queue_size {
        argv.extend(["-max_muxing_queue_size".to_string(), size.to_string()]);
    }
    argv
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
