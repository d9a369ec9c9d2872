pub mod blur;
pub mod check;
pub mod config;
pub mod scan;

use std::path::PathBuf;

use clap::Args;

use overblur_common::config::AppConfig;
use overblur_common::timecode::TimeRange;
use overblur_detect::ScanConfig;
use overblur_media::DetectJob;

/// Options shared by every command that runs a detection.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Input video
    #[arg(short, long, visible_alias = "in")]
    pub input: PathBuf,

    /// Template image (repeatable)
    #[arg(short = 't', long = "template", required = true)]
    pub templates: Vec<PathBuf>,

    /// Step of the first scan in seconds
    #[arg(long)]
    pub step: Option<f64>,

    /// Time range of the first scan, e.g. 00:10:00-00:20:00 or 600-
    #[arg(long)]
    pub range: Option<String>,

    /// Match threshold in (0, 1]
    #[arg(long)]
    pub threshold: Option<f32>,
}

impl DetectArgs {
    /// Merge command-line flags over the loaded configuration.
    pub fn into_job(self, config: &AppConfig) -> anyhow::Result<DetectJob> {
        let range = self.range.as_deref().map(TimeRange::parse).transpose()?;
        Ok(DetectJob {
            input: self.input,
            templates: self.templates,
            threshold: self.threshold.unwrap_or(config.scan.match_threshold),
            scan: ScanConfig {
                coarse_step: self.step.unwrap_or(config.scan.coarse_step_secs),
                refine_steps: config.scan.refine_steps.clone(),
                range,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(range: Option<&str>) -> DetectArgs {
        DetectArgs {
            input: PathBuf::from("in.mp4"),
            templates: vec![PathBuf::from("logo.png")],
            step: None,
            range: range.map(str::to_string),
            threshold: Some(0.8),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let job = args(Some("00:01:00-")).into_job(&AppConfig::default()).unwrap();
        assert_eq!(job.threshold, 0.8);
        assert_eq!(job.scan.coarse_step, 20.0);
        assert_eq!(job.scan.refine_steps, vec![2.0, 0.5, 0.1]);
        assert_eq!(job.scan.range, Some(TimeRange::new(Some(60.0), None)));
    }

    #[test]
    fn test_bad_range_is_rejected() {
        assert!(args(Some("sixty")).into_job(&AppConfig::default()).is_err());
        assert!(args(None).into_job(&AppConfig::default()).unwrap().scan.range.is_none());
    }
}
