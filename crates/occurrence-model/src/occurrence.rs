//! Template occurrences in time and space.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bounding box of a matched template instance, in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Template width.
    pub width: u32,
    /// Template height.
    pub height: u32,
}

impl Location {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

/// Outcome of one predicate evaluation at a given second.
///
/// `location` is `None` when the template was absent (or the frame could
/// not be read), which keeps "absent" distinct from a match at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub second: f64,
    pub location: Option<Location>,
}

impl TimePoint {
    pub fn new(second: f64, location: Option<Location>) -> Self {
        Self { second, location }
    }

    /// A time point where the template was seen.
    pub fn present(second: f64, location: Location) -> Self {
        Self::new(second, Some(location))
    }

    pub fn is_present(&self) -> bool {
        self.location.is_some()
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{:.2}s@({},{})", self.second, loc.x, loc.y),
            None => write!(f, "{:.2}s@(none)", self.second),
        }
    }
}

/// One maximal span where the template is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: TimePoint,
    pub end: TimePoint,
}

impl Interval {
    /// Build an interval, rejecting a reversed pair.
    pub fn new(start: TimePoint, end: TimePoint) -> Option<Self> {
        (start.second <= end.second).then_some(Self { start, end })
    }

    /// A zero-width interval at a single sample.
    pub fn point(at: TimePoint) -> Self {
        Self { start: at, end: at }
    }

    pub fn duration(&self) -> f64 {
        self.end.second - self.start.second
    }

    /// Region to filter: the start's location, falling back to the end's.
    pub fn location(&self) -> Option<Location> {
        self.start.location.or(self.end.location)
    }

    /// Whether two intervals share at least one instant.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start.second <= other.end.second && other.start.second <= self.end.second
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}

/// Which of the two concurrent scan tasks a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSide {
    /// Scans the first half in ascending order.
    Forward,
    /// Scans the second half in descending order.
    Backward,
}

/// Merged output of one dual-direction scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// First match seen by the forward task (single mode).
    pub forward_boundary: Option<TimePoint>,

    /// First match seen by the backward task (single mode).
    pub backward_boundary: Option<TimePoint>,

    /// Ascending, non-overlapping present spans.
    pub intervals: Vec<Interval>,

    /// Side whose boundary was filled in from the other side because it
    /// found nothing itself.
    pub substituted: Option<ScanSide>,

    /// Number of predicate evaluations spent.
    pub evaluations: usize,
}

impl ScanResult {
    /// Boundary actually found by `side`, ignoring any substitution.
    pub fn found_by(&self, side: ScanSide) -> Option<TimePoint> {
        if self.substituted == Some(side) {
            return None;
        }
        match side {
            ScanSide::Forward => self.forward_boundary,
            ScanSide::Backward => self.backward_boundary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
