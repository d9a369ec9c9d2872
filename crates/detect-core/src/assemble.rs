//! Interval-to-segment assembly.
//!
//! Turns the refined, ordered intervals into the cut list consumed by the
//! edit pipeline: `Keep_0, Change_0, Keep_1, Change_1, …, Keep_n`,
//! contiguous over `[0, duration]`.

use overblur_model::occurrence::Interval;
use overblur_model::segment::{EditSpan, Segment, SEGMENT_EPSILON};

/// Sort, clip to `[0, duration]` and coalesce overlapping intervals.
///
/// A flaky predicate can make two refined neighbours touch or cross; the
/// merged interval keeps the earlier start (and its location).
pub fn normalize(mut intervals: Vec<Interval>, duration: f64) -> Vec<Interval> {
    intervals.retain(|i| i.end.second >= 0.0 && i.start.second <= duration);
    intervals.sort_by(|a, b| a.start.second.total_cmp(&b.start.second));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for mut interval in intervals {
        interval.start.second = interval.start.second.max(0.0);
        interval.end.second = interval.end.second.min(duration);

        match merged.last_mut() {
            Some(last) if last.overlaps(&interval) => {
                if interval.end.second > last.end.second {
                    last.end = interval.end;
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Build the gap-free segment plan for ascending, non-overlapping intervals.
///
/// An interval without any location cannot be filtered and is folded into
/// the surrounding `Keep`. With no intervals the plan is a single
/// `Keep[0, duration]`.
pub fn assemble(intervals: &[Interval], duration: f64) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(intervals.len() * 2 + 1);
    let mut cursor = 0.0_f64;
    let mut index = 0;

    for interval in intervals {
        let Some(location) = interval.location() else {
            tracing::warn!(%interval, "Interval has no location, keeping it unchanged");
            continue;
        };
        let start = interval.start.second.max(cursor);
        let end = interval.end.second.max(start);

        segments.push(Segment::keep(index, cursor, start));
        segments.push(Segment::change(index, start, end, location));
        cursor = end;
        index += 1;
    }
    segments.push(Segment::keep(index, cursor, duration.max(cursor)));
    segments
}

/// The per-segment instructions, in concat order.
pub fn edit_spans(segments: &[Segment]) -> Vec<EditSpan> {
    segments.iter().map(Segment::edit_span).collect()
}

/// Whether the plan leaves the input untouched: no `Change` spans any time.
pub fn is_passthrough(segments: &[Segment]) -> bool {
    !segments
        .iter()
        .any(|s| s.is_change() && s.duration() > SEGMENT_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overblur_model::occurrence::{Location, TimePoint};
    use overblur_model::segment::{covers_timeline, SegmentKind};
    use proptest::prelude::*;

    fn loc() -> Location {
        Location::new(1, 2, 30, 40)
    }

    fn span(a: f64, b: f64) -> Interval {
        Interval::new(TimePoint::present(a, loc()), TimePoint::present(b, loc())).unwrap()
    }

    #[test]
    fn test_single_interval_plan() {
        let plan = assemble(&[span(40.0, 45.0)], 100.0);
        assert_eq!(
            plan,
            vec![
                Segment::keep(0, 0.0, 40.0),
                Segment::change(0, 40.0, 45.0, loc()),
                Segment::keep(1, 45.0, 100.0),
            ]
        );
        assert!(covers_timeline(&plan, 100.0));
        assert!(!is_passthrough(&plan));
    }

    #[test]
    fn test_no_intervals_is_single_keep() {
        let plan = assemble(&[], 100.0);
        assert_eq!(plan, vec![Segment::keep(0, 0.0, 100.0)]);
        assert!(is_passthrough(&plan));
    }

    #[test]
    fn test_zero_width_change_is_passthrough() {
        let plan = assemble(&[span(40.0, 40.0)], 100.0);
        assert_eq!(plan[1], Segment::change(0, 40.0, 40.0, loc()));
        assert!(covers_timeline(&plan, 100.0));
        assert!(is_passthrough(&plan));
    }

    #[test]
    fn test_interval_at_timeline_start_keeps_empty_leading_keep() {
        let plan = assemble(&[span(0.0, 5.0), span(90.0, 100.0)], 100.0);
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0], Segment::keep(0, 0.0, 0.0));
        assert_eq!(plan[4], Segment::keep(2, 100.0, 100.0));
        assert!(covers_timeline(&plan, 100.0));
    }

    #[test]
    fn test_interval_without_location_is_kept() {
        let bare = Interval::new(TimePoint::new(10.0, None), TimePoint::new(20.0, None)).unwrap();
        let plan = assemble(&[bare, span(50.0, 60.0)], 100.0);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0], Segment::keep(0, 0.0, 50.0));
    }

    #[test]
    fn test_edit_spans_follow_plan_order() {
        let plan = assemble(&[span(40.0, 45.0)], 100.0);
        let spans = edit_spans(&plan);
        assert_eq!(
            spans[1],
            EditSpan::Filter {
                start: 40.0,
                duration: 5.0,
                location: loc()
            }
        );
        assert_eq!(
            spans[2],
            EditSpan::Copy {
                start: 45.0,
                duration: 55.0
            }
        );
    }

    #[test]
    fn test_normalize_sorts_merges_and_clips() {
        let out = normalize(
            vec![
                span(50.0, 60.0),
                span(-5.0, 3.0),
                span(55.0, 70.0),
                span(95.0, 130.0),
                span(200.0, 210.0),
            ],
            100.0,
        );
        let secs: Vec<_> = out
            .iter()
            .map(|i| (i.start.second, i.end.second))
            .collect();
        assert_eq!(secs, vec![(0.0, 3.0), (50.0, 70.0), (95.0, 100.0)]);
    }

    fn disjoint_intervals() -> impl Strategy<Value = (Vec<Interval>, f64)> {
        (1.0f64..10_000.0, prop::collection::vec(0.0f64..1.0, 0..24)).prop_map(
            |(duration, mut cuts)| {
                cuts.sort_by(f64::total_cmp);
                let intervals = cuts
                    .chunks_exact(2)
                    .map(|pair| span(pair[0] * duration, pair[1] * duration))
                    .collect();
                (intervals, duration)
            },
        )
    }

    proptest! {
        #[test]
        fn plan_is_contiguous_and_alternating((intervals, duration) in disjoint_intervals()) {
            let plan = assemble(&intervals, duration);

            prop_assert!(covers_timeline(&plan, duration));
            prop_assert_eq!(plan.len(), intervals.len() * 2 + 1);
            for (i, segment) in plan.iter().enumerate() {
                prop_assert_eq!(segment.index, i / 2);
                prop_assert_eq!(segment.is_change(), i % 2 == 1);
                if let SegmentKind::Change(location) = segment.kind {
                    prop_assert_eq!(location, loc());
                }
            }
        }

        #[test]
        fn normalize_output_is_disjoint((intervals, duration) in disjoint_intervals()) {
            let mut shuffled = intervals.clone();
            shuffled.reverse();
            let out = normalize(shuffled, duration);
            prop_assert!(out.windows(2).all(|w| w[0].end.second <= w[1].start.second));
        }
    }
}
