//! Boundary refinement with a descending step schedule.
//!
//! A coarse pass only knows each boundary to within one coarse step. Each
//! refinement pass re-probes the band `[start - previous, start]` (forward)
//! and `[end, end + previous]` (backward) at the next, smaller step, then
//! moves the boundaries to the first hits. After the last pass a boundary
//! is known to within the last step of the schedule.
//!
//! The interior of the interval is already known to be present, so the two
//! bands are handed to the scan engine as explicit halves. This keeps the
//! start edge in the forward sweep and the end edge in the backward sweep
//! however long the interval is.

use std::sync::Arc;

use overblur_common::error::OverblurResult;
use overblur_common::timecode::format_hms;
use overblur_model::occurrence::{Interval, ScanSide};

use crate::probe::Probe;
use crate::scan::{scan_halves, ScanMode};
use crate::series::generate;

/// Default refinement schedule in seconds.
pub const DEFAULT_REFINE_STEPS: [f64; 3] = [2.0, 0.5, 0.1];

/// A refined interval and the predicate evaluations it cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refined {
    pub interval: Interval,
    pub evaluations: usize,
}

/// Sharpens coarse intervals, one after another.
#[derive(Debug, Clone)]
pub struct BoundaryRefiner {
    steps: Vec<f64>,
    /// Probing never leaves this `[lower, upper]` domain.
    domain: (f64, f64),
}

impl BoundaryRefiner {
    pub fn new(steps: Vec<f64>, domain: (f64, f64)) -> Self {
        Self { steps, domain }
    }

    /// Refine one coarse interval found with `coarse_step`.
    ///
    /// A side whose band yields no match keeps its boundary and is not
    /// probed again.
    pub async fn refine<P>(
        &self,
        probe: Arc<P>,
        part: usize,
        coarse: Interval,
        coarse_step: f64,
    ) -> OverblurResult<Refined>
    where
        P: Probe + ?Sized + 'static,
    {
        let (lower, upper) = self.domain;
        let mut start = coarse.start;
        let mut end = coarse.end;
        let mut start_open = true;
        let mut end_open = true;
        let mut previous = coarse_step;
        let mut evaluations = 0;

        for &step in &self.steps {
            if !start_open && !end_open {
                break;
            }

            let head = if start_open {
                band_before(start.second, (start.second - lower).min(previous), step)
            } else {
                Vec::new()
            };
            let tail = if end_open {
                band_after(end.second, (upper - end.second).min(previous), step)
            } else {
                Vec::new()
            };

            let from = head.first().copied().unwrap_or(start.second);
            let to = tail.last().copied().unwrap_or(end.second);
            tracing::info!(
                part,
                step,
                from,
                to,
                "part#{part}: scanning every {step:.1}s from {from:.1} ({}) to {to:.1} ({})",
                format_hms(from),
                format_hms(to),
            );

            let result = scan_halves(Arc::clone(&probe), head, tail, ScanMode::Single).await?;
            evaluations += result.evaluations;

            if start_open {
                match result.found_by(ScanSide::Forward) {
                    Some(found) => start = found,
                    None => {
                        tracing::warn!(
                            part,
                            step,
                            second = start.second,
                            "Start boundary lost, keeping previous"
                        );
                        start_open = false;
                    }
                }
            }
            if end_open {
                match result.found_by(ScanSide::Backward) {
                    Some(found) => end = found,
                    None => {
                        tracing::warn!(
                            part,
                            step,
                            second = end.second,
                            "End boundary lost, keeping previous"
                        );
                        end_open = false;
                    }
                }
            }
            previous = step;
        }

        let interval = Interval::new(start, end).unwrap_or(coarse);
        tracing::debug!(part, %interval, evaluations, "Refined interval");
        Ok(Refined {
            interval,
            evaluations,
        })
    }
}

impl Default for BoundaryRefiner {
    fn default() -> Self {
        Self::new(DEFAULT_REFINE_STEPS.to_vec(), (0.0, f64::MAX))
    }
}

/// Ascending samples `anchor - k*step, …, anchor` reaching back at most `reach`.
fn band_before(anchor: f64, reach: f64, step: f64) -> Vec<f64> {
    generate(0.0, reach.max(0.0), step)
        .into_iter()
        .rev()
        .map(|offset| anchor - offset)
        .collect()
}

/// Ascending samples `anchor, …, anchor + k*step` reaching forward at most `reach`.
fn band_after(anchor: f64, reach: f64, step: f64) -> Vec<f64> {
    generate(0.0, reach.max(0.0), step)
        .into_iter()
        .map(|offset| anchor + offset)
        .collect()
}
