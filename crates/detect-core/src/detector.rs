//! Coarse-to-fine occurrence detection.
//!
//! 1. **Coarse** multi-mode scan over the (optionally restricted) timeline.
//! 2. **Refine** each coarse interval, in order, with the step schedule.
//! 3. **Normalize** the refined intervals and **assemble** the segment plan.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use overblur_common::error::{OverblurError, OverblurResult};
use overblur_common::timecode::{format_hms, TimeRange};
use overblur_model::occurrence::Interval;
use overblur_model::segment::Segment;

use crate::assemble::{assemble, normalize};
use crate::probe::Probe;
use crate::refine::{BoundaryRefiner, DEFAULT_REFINE_STEPS};
use crate::scan::{scan, ScanMode};
use crate::series::generate;

/// Default step of the coarse pass in seconds.
pub const DEFAULT_COARSE_STEP: f64 = 20.0;

/// Parameters of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Step of the coarse pass in seconds.
    pub coarse_step: f64,

    /// Strictly descending refinement schedule in seconds.
    pub refine_steps: Vec<f64>,

    /// Restricts the coarse pass. Refinement may still reach outside it.
    pub range: Option<TimeRange>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            coarse_step: DEFAULT_COARSE_STEP,
            refine_steps: DEFAULT_REFINE_STEPS.to_vec(),
            range: None,
        }
    }
}

impl ScanConfig {
    /// Check the configuration against the media duration and return the
    /// concrete coarse window `[from, to]`.
    pub fn validate(&self, duration: f64) -> OverblurResult<(f64, f64)> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(OverblurError::config(format!(
                "media duration must be positive, got {duration}"
            )));
        }
        if !self.coarse_step.is_finite() || self.coarse_step <= 0.0 {
            return Err(OverblurError::config(format!(
                "coarse step must be positive, got {}",
                self.coarse_step
            )));
        }
        if self.refine_steps.is_empty() {
            return Err(OverblurError::config("refinement schedule is empty"));
        }
        if let Some(bad) = self
            .refine_steps
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(OverblurError::config(format!(
                "refinement steps must be positive, got {bad}"
            )));
        }
        if self.refine_steps.windows(2).any(|w| w[1] >= w[0]) {
            return Err(OverblurError::config(format!(
                "refinement schedule must be strictly descending, got {:?}",
                self.refine_steps
            )));
        }

        self.range.unwrap_or_default().resolve(duration)
    }
}

/// Outcome of a detection run.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// The template never showed up; the output equals the input.
    NoOccurrence { evaluations: usize },

    /// At least one interval was found.
    Found {
        intervals: Vec<Interval>,
        segments: Vec<Segment>,
        evaluations: usize,
    },
}

impl Detection {
    pub fn evaluations(&self) -> usize {
        match self {
            Self::NoOccurrence { evaluations } | Self::Found { evaluations, .. } => *evaluations,
        }
    }

    /// Segment plan, or `None` when there is nothing to edit.
    pub fn segments(&self) -> Option<&[Segment]> {
        match self {
            Self::NoOccurrence { .. } => None,
            Self::Found { segments, .. } => Some(segments),
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        match self {
            Self::NoOccurrence { .. } => &[],
            Self::Found { intervals, .. } => intervals,
        }
    }
}

/// Drives the coarse pass, refinement and assembly over one probe.
pub struct OccurrenceDetector<P: ?Sized> {
    probe: Arc<P>,
    config: ScanConfig,
}

impl<P> OccurrenceDetector<P>
where
    P: Probe + ?Sized + 'static,
{
    pub fn new(probe: Arc<P>, config: ScanConfig) -> Self {
        Self { probe, config }
    }

    /// Find every interval where the template is present in `[0, duration]`.
    pub async fn detect(&self, duration: f64) -> OverblurResult<Detection> {
        let (from, to) = self.config.validate(duration)?;
        let started = Instant::now();
        let step = self.config.coarse_step;

        tracing::info!(
            step,
            from,
            to,
            "Scanning template every {step:.1}s from {from:.1} ({}) to {to:.1} ({})",
            format_hms(from),
            format_hms(to),
        );
        let series = generate(from, to, step);
        let coarse = scan(Arc::clone(&self.probe), &series, ScanMode::Multi).await?;
        let mut evaluations = coarse.evaluations;

        if coarse.intervals.is_empty() {
            tracing::info!(evaluations, "No template found in the scanned range");
            return Ok(Detection::NoOccurrence { evaluations });
        }
        tracing::info!(parts = coarse.intervals.len(), "Coarse pass found parts");

        let refiner = BoundaryRefiner::new(self.config.refine_steps.clone(), (0.0, duration));
        let mut refined = Vec::with_capacity(coarse.intervals.len());
        for (part, interval) in coarse.intervals.into_iter().enumerate() {
            let result = refiner
                .refine(Arc::clone(&self.probe), part, interval, step)
                .await?;
            evaluations += result.evaluations;
            refined.push(result.interval);
        }

        let intervals = normalize(refined, duration);
        let segments = assemble(&intervals, duration);

        let split_times: Vec<String> = intervals
            .iter()
            .flat_map(|i| [i.start.second, i.end.second])
            .map(|t| format!("{t:.2}"))
            .collect();
        tracing::info!(
            parts = intervals.len(),
            evaluations,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Split times: {}",
            split_times.join(" ")
        );

        Ok(Detection::Found {
            intervals,
            segments,
            evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(ScanConfig::default().validate(100.0).unwrap(), (0.0, 100.0));
    }

    #[test]
    fn test_rejects_bad_steps() {
        let cases = [
            ScanConfig {
                coarse_step: 0.0,
                ..Default::default()
            },
            ScanConfig {
                refine_steps: vec![],
                ..Default::default()
            },
            ScanConfig {
                refine_steps: vec![2.0, -0.5],
                ..Default::default()
            },
            ScanConfig {
                refine_steps: vec![0.5, 2.0, 0.1],
                ..Default::default()
            },
            ScanConfig {
                refine_steps: vec![2.0, 2.0],
                ..Default::default()
            },
        ];
        for config in cases {
            let err = config.validate(100.0).unwrap_err();
            assert!(matches!(err, OverblurError::Config { .. }), "{config:?}");
        }
    }

    #[test]
    fn test_rejects_bad_range_and_duration() {
        let over = ScanConfig {
            range: Some(TimeRange::new(Some(10.0), Some(150.0))),
            ..Default::default()
        };
        assert!(over.validate(100.0).is_err());
        assert!(ScanConfig::default().validate(0.0).is_err());
        assert!(ScanConfig::default().validate(f64::NAN).is_err());

        let window = ScanConfig {
            range: Some(TimeRange::new(Some(10.0), None)),
            ..Default::default()
        };
        assert_eq!(window.validate(100.0).unwrap(), (10.0, 100.0));
    }

    #[test]
    fn test_detection_accessors() {
        let none = Detection::NoOccurrence { evaluations: 6 };
        assert_eq!(none.evaluations(), 6);
        assert!(none.segments().is_none());
        assert!(none.intervals().is_empty());
    }
}
