use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use overblur_common::timecode::TimeRange;
use overblur_detect::assemble::is_passthrough;
use overblur_detect::scan::scan;
use overblur_detect::series::generate;
use overblur_detect::{Detection, OccurrenceDetector, Probe, ScanConfig, ScanMode};
use overblur_model::occurrence::Location;
use overblur_model::segment::{covers_timeline, SegmentKind, SEGMENT_EPSILON};

const OVERLAY: Location = Location {
    x: 1600,
    y: 40,
    width: 240,
    height: 90,
};

/// Synthetic predicate that counts its evaluations.
struct Synthetic {
    spans: Vec<(f64, f64)>,
    calls: AtomicUsize,
}

impl Synthetic {
    fn new(spans: &[(f64, f64)]) -> Arc<Self> {
        Arc::new(Self {
            spans: spans.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl Probe for Synthetic {
    fn probe(&self, second: f64) -> Option<Location> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.spans
            .iter()
            .any(|(a, b)| (*a..=*b).contains(&second))
            .then_some(OVERLAY)
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 0.1 + 1e-9,
        "expected {expected} ± 0.1, got {actual}"
    );
}

#[tokio::test]
async fn single_overlay_yields_keep_change_keep() {
    let probe = Synthetic::new(&[(40.0, 45.0)]);
    let detector = OccurrenceDetector::new(Arc::clone(&probe), ScanConfig::default());

    let detection = detector.detect(100.0).await.unwrap();
    let segments = detection.segments().expect("overlay should be found");

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].kind, SegmentKind::Keep);
    assert_close(segments[0].start, 0.0);
    assert_close(segments[0].end, 40.0);
    assert_eq!(segments[1].kind, SegmentKind::Change(OVERLAY));
    assert_close(segments[1].start, 40.0);
    assert_close(segments[1].end, 45.0);
    assert_eq!(segments[2].kind, SegmentKind::Keep);
    assert_close(segments[2].start, 45.0);
    assert_eq!(segments[2].end, 100.0);
    assert!(covers_timeline(segments, 100.0));

    assert_eq!(detection.evaluations(), probe.calls.load(Ordering::SeqCst));
}

#[tokio::test]
async fn flash_shorter_than_last_step_plans_no_edit() {
    let probe = Synthetic::new(&[(40.0, 40.05)]);
    let detector = OccurrenceDetector::new(Arc::clone(&probe), ScanConfig::default());

    let detection = detector.detect(100.0).await.unwrap();
    let segments = detection.segments().expect("flash should be found");

    let change = segments
        .iter()
        .find(|s| s.is_change())
        .expect("flash should be planned as a change");
    assert_close(change.start, 40.0);
    assert!(change.duration() <= SEGMENT_EPSILON);
    assert!(covers_timeline(segments, 100.0));
    assert!(is_passthrough(segments));
}

#[tokio::test]
async fn coarse_interval_brackets_ground_truth() {
    let probe = Synthetic::new(&[(40.0, 45.0)]);
    let coarse = scan(probe, &generate(0.0, 100.0, 20.0), ScanMode::Multi)
        .await
        .unwrap();

    assert_eq!(coarse.intervals.len(), 1);
    let interval = coarse.intervals[0];
    assert!((interval.start.second - 40.0).abs() <= 20.0);
    assert!((interval.end.second - 45.0).abs() <= 20.0);
}

#[tokio::test]
async fn two_overlays_across_both_halves() {
    let probe = Synthetic::new(&[(12.0, 27.0), (55.0, 85.0)]);
    let detection = OccurrenceDetector::new(probe, ScanConfig::default())
        .detect(120.0)
        .await
        .unwrap();

    let intervals = detection.intervals();
    assert_eq!(intervals.len(), 2);
    assert_close(intervals[0].start.second, 12.0);
    assert_close(intervals[0].end.second, 27.0);
    assert_close(intervals[1].start.second, 55.0);
    assert_close(intervals[1].end.second, 85.0);

    let segments = detection.segments().unwrap();
    assert_eq!(segments.len(), 5);
    assert!(covers_timeline(segments, 120.0));
    assert_eq!(
        segments.iter().filter(|s| s.is_change()).count(),
        intervals.len()
    );
}

#[tokio::test]
async fn never_present_is_no_occurrence() {
    let probe = Synthetic::new(&[]);
    let detection = OccurrenceDetector::new(Arc::clone(&probe), ScanConfig::default())
        .detect(100.0)
        .await
        .unwrap();

    assert_eq!(detection, Detection::NoOccurrence { evaluations: 6 });
    assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn range_restriction_limits_coarse_pass() {
    let probe = Synthetic::new(&[(40.0, 45.0)]);
    let config = ScanConfig {
        range: Some(TimeRange::new(Some(50.0), None)),
        ..Default::default()
    };
    let detection = OccurrenceDetector::new(probe, config)
        .detect(100.0)
        .await
        .unwrap();

    // 50, 70, 90
    assert_eq!(detection, Detection::NoOccurrence { evaluations: 3 });
}

#[tokio::test]
async fn invalid_config_probes_nothing() {
    let probe = Synthetic::new(&[(40.0, 45.0)]);
    let config = ScanConfig {
        range: Some(TimeRange::new(Some(60.0), Some(30.0))),
        ..Default::default()
    };
    let err = OccurrenceDetector::new(Arc::clone(&probe), config)
        .detect(100.0)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("invalid time range"));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn detector_accepts_trait_objects() {
    let probe: Arc<dyn Probe> = Synthetic::new(&[(40.0, 45.0)]);
    let detection = OccurrenceDetector::new(probe, ScanConfig::default())
        .detect(100.0)
        .await
        .unwrap();
    assert_eq!(detection.intervals().len(), 1);
}
