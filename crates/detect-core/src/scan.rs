//! Dual-direction scan engine.
//!
//! # Algorithm
//!
//! 1. **Split** the ascending sample series at `len / 2`.
//! 2. **Sweep** both halves concurrently on blocking threads: the forward
//!    task walks the first half in ascending order, the backward task walks
//!    the second half in descending order. Each task probes one sample at a
//!    time, so at most two predicate evaluations are ever in flight.
//! 3. **Join** both tasks.
//! 4. **Merge** single-threaded: boundaries in single mode, ordered
//!    intervals in multi mode.
//!
//! Sweeping from both ends toward the middle lets a single-boundary search
//! stop each task at the first hit of its half: the forward task finds the
//! earliest appearance, the backward task the latest.

use std::sync::Arc;
use std::time::Instant;

use overblur_common::error::{OverblurError, OverblurResult};
use overblur_model::occurrence::{Interval, ScanResult, ScanSide, TimePoint};

use crate::edge::{EdgeEvent, EdgeState, EdgeTracker};
use crate::probe::Probe;

/// What a scan collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Each task stops at the first match of its half.
    Single,
    /// Each task walks its whole half and records every present run.
    Multi,
}

/// Scan an ascending series, splitting it at its midpoint.
pub async fn scan<P>(probe: Arc<P>, series: &[f64], mode: ScanMode) -> OverblurResult<ScanResult>
where
    P: Probe + ?Sized + 'static,
{
    let half = series.len() / 2;
    scan_halves(probe, series[..half].to_vec(), series[half..].to_vec(), mode).await
}

/// Scan two explicit ascending halves.
///
/// `forward` is walked first-to-last, `backward` last-to-first. Every
/// sample of `forward` must precede every sample of `backward`. In multi
/// mode the halves are also assumed to be adjacent, so a run that is still
/// open at the end of both sweeps is stitched into one interval.
pub async fn scan_halves<P>(
    probe: Arc<P>,
    forward: Vec<f64>,
    backward: Vec<f64>,
    mode: ScanMode,
) -> OverblurResult<ScanResult>
where
    P: Probe + ?Sized + 'static,
{
    let started = Instant::now();
    let samples = forward.len() + backward.len();

    let forward_probe = Arc::clone(&probe);
    let forward_task = tokio::task::spawn_blocking(move || {
        sweep(
            &*forward_probe,
            forward.into_iter(),
            ScanSide::Forward,
            mode,
        )
    });
    let backward_task = tokio::task::spawn_blocking(move || {
        sweep(
            &*probe,
            backward.into_iter().rev(),
            ScanSide::Backward,
            mode,
        )
    });

    let (forward, backward) = tokio::join!(forward_task, backward_task);
    let forward = forward.map_err(|e| OverblurError::task(format!("forward sweep: {e}")))?;
    let backward = backward.map_err(|e| OverblurError::task(format!("backward sweep: {e}")))?;

    let result = merge(forward, backward, mode);
    tracing::debug!(
        mode = ?mode,
        samples,
        evaluations = result.evaluations,
        intervals = result.intervals.len(),
        substituted = ?result.substituted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Scan finished"
    );
    Ok(result)
}

/// What one task brings back to the join.
#[derive(Debug, Default)]
struct SweepOutcome {
    /// First match in sweep order.
    boundary: Option<TimePoint>,
    /// Present runs in sweep order.
    runs: Vec<Interval>,
    /// Tracker state after the last probed sample.
    final_state: EdgeState,
    evaluations: usize,
}

fn sweep<P>(
    probe: &P,
    samples: impl Iterator<Item = f64>,
    side: ScanSide,
    mode: ScanMode,
) -> SweepOutcome
where
    P: Probe + ?Sized,
{
    let mut outcome = SweepOutcome::default();
    let mut tracker = EdgeTracker::new();

    for second in samples {
        let location = probe.probe(second);
        outcome.evaluations += 1;
        tracing::trace!(side = ?side, second, present = location.is_some(), "Probed");

        let point = TimePoint::new(second, location);
        let event = tracker.observe(point.is_present());
        if point.is_present() && outcome.boundary.is_none() {
            outcome.boundary = Some(point);
        }
        if mode == ScanMode::Single && point.is_present() {
            break;
        }

        match event {
            EdgeEvent::Opened => outcome.runs.push(Interval::point(point)),
            EdgeEvent::Extended => {
                if let Some(run) = outcome.runs.last_mut() {
                    *run = match side {
                        ScanSide::Forward => Interval {
                            start: run.start,
                            end: point,
                        },
                        ScanSide::Backward => Interval {
                            start: point,
                            end: run.end,
                        },
                    };
                }
            }
            EdgeEvent::Closed | EdgeEvent::Stayed => {}
        }
    }

    outcome.final_state = tracker.state();
    outcome
}

fn merge(forward: SweepOutcome, backward: SweepOutcome, mode: ScanMode) -> ScanResult {
    let evaluations = forward.evaluations + backward.evaluations;
    let (forward_boundary, backward_boundary, substituted) =
        match (forward.boundary, backward.boundary) {
            (Some(f), Some(b)) => (Some(f), Some(b), None),
            (None, Some(b)) => (Some(b), Some(b), Some(ScanSide::Forward)),
            (Some(f), None) => (Some(f), Some(f), Some(ScanSide::Backward)),
            (None, None) => (None, None, None),
        };

    let intervals = match mode {
        ScanMode::Single => forward_boundary
            .zip(backward_boundary)
            .and_then(|(start, end)| Interval::new(start, end))
            .into_iter()
            .collect(),
        ScanMode::Multi => {
            let straddles = forward.final_state == EdgeState::Inside
                && backward.final_state == EdgeState::Inside;
            let mut intervals = forward.runs;
            let mut tail: Vec<Interval> = backward.runs.into_iter().rev().collect();

            if straddles && !tail.is_empty() {
                if let Some(last) = intervals.last_mut() {
                    let joined = tail.remove(0);
                    *last = Interval {
                        start: last.start,
                        end: joined.end,
                    };
                }
            }
            intervals.extend(tail);
            intervals
        }
    };

    ScanResult {
        forward_boundary,
        backward_boundary,
        intervals,
        substituted,
        evaluations,
    }
}
