//! Segment plans: the contiguous `Keep` / `Change` cut list.

use serde::{Deserialize, Serialize};

use crate::occurrence::Location;

/// Tolerance used when checking that segment edges meet.
pub const SEGMENT_EPSILON: f64 = 1e-6;

/// What happens to a span of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Stream-copied unchanged.
    Keep,
    /// Re-encoded with the region at `Location` filtered.
    Change(Location),
}

/// One entry of the segment plan.
///
/// `index` is the pair number: the plan reads
/// `Keep_0, Change_0, Keep_1, Change_1, …, Keep_n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    #[serde(flatten)]
    pub kind: SegmentKind,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn keep(index: usize, start: f64, end: f64) -> Self {
        Self {
            index,
            kind: SegmentKind::Keep,
            start,
            end,
        }
    }

    pub fn change(index: usize, start: f64, end: f64, location: Location) -> Self {
        Self {
            index,
            kind: SegmentKind::Change(location),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_change(&self) -> bool {
        matches!(self.kind, SegmentKind::Change(_))
    }

    /// Location to filter; always present on `Change` segments.
    pub fn location(&self) -> Option<Location> {
        match self.kind {
            SegmentKind::Keep => None,
            SegmentKind::Change(location) => Some(location),
        }
    }

    /// The instruction handed to the edit pipeline for this segment.
    pub fn edit_span(&self) -> EditSpan {
        match self.kind {
            SegmentKind::Keep => EditSpan::Copy {
                start: self.start,
                duration: self.duration(),
            },
            SegmentKind::Change(location) => EditSpan::Filter {
                start: self.start,
                duration: self.duration(),
                location,
            },
        }
    }
}

/// Per-segment instruction for the split/filter/concat pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditSpan {
    /// Zero re-encode stream copy.
    Copy { start: f64, duration: f64 },
    /// Re-encode with `location` spatially filtered.
    Filter {
        start: f64,
        duration: f64,
        location: Location,
    },
}

/// Whether `segments` tile `[0, duration]` in order with no gap or overlap.
pub fn covers_timeline(segments: &[Segment], duration: f64) -> bool {
    let Some(first) = segments.first() else {
        return false;
    };
    let Some(last) = segments.last() else {
        return false;
    };
    if first.start.abs() > SEGMENT_EPSILON || (last.end - duration).abs() > SEGMENT_EPSILON {
        return false;
    }
    segments.iter().all(|s| s.start <= s.end + SEGMENT_EPSILON)
        && segments
            .windows(2)
            .all(|pair| (pair[0].end - pair[1].start).abs() <= SEGMENT_EPSILON)
}
