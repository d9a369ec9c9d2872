//! Timecode parsing and formatting.
//!
//! Scan windows are expressed in seconds internally; users type either
//! plain seconds (`"95.5"`) or wall-clock style offsets (`"00:01:35"`).

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{OverblurError, OverblurResult};

/// Format a second offset as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_hms(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

/// Parse `hh:mm:ss[.fff]` or a plain number of seconds.
pub fn parse_timestamp(raw: &str) -> OverblurResult<f64> {
    let raw = raw.trim();
    if raw.contains(':') {
        let time = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|e| OverblurError::config(format!("invalid timestamp '{raw}': {e}")))?;
        let whole = time.num_seconds_from_midnight() as f64;
        return Ok(whole + time.nanosecond() as f64 / 1e9);
    }

    let secs = raw
        .parse::<f64>()
        .map_err(|e| OverblurError::config(format!("invalid timestamp '{raw}': {e}")))?;
    if !secs.is_finite() {
        return Err(OverblurError::config(format!(
            "invalid timestamp '{raw}': not a finite number"
        )));
    }
    Ok(secs)
}

/// A user-supplied restriction of the coarse pass, either side optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<f64>,
    pub to: Option<f64>,
}

impl TimeRange {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        Self { from, to }
    }

    /// Parse `a-b`, where either side may be empty (`"-00:10:00"`, `"30-"`).
    pub fn parse(raw: &str) -> OverblurResult<Self> {
        let (from, to) = raw.trim().split_once('-').ok_or_else(|| {
            OverblurError::config(format!(
                "invalid time range '{raw}': expected hh:mm:ss-hh:mm:ss or sec-sec"
            ))
        })?;
        let side = |s: &str| -> OverblurResult<Option<f64>> {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                parse_timestamp(s).map(Some)
            }
        };
        Ok(Self {
            from: side(from)?,
            to: side(to)?,
        })
    }

    /// Resolve against the media duration, returning a concrete `[from, to]`.
    pub fn resolve(&self, duration: f64) -> OverblurResult<(f64, f64)> {
        let from = self.from.unwrap_or(0.0);
        let to = self.to.unwrap_or(duration);
        if from < 0.0 || from > to {
            return Err(OverblurError::config(format!(
                "invalid time range {from:.2}-{to:.2}"
            )));
        }
        if to > duration {
            return Err(OverblurError::config(format!(
                "time range is over video duration {} ({})",
                duration as u64,
                format_hms(duration)
            )));
        }
        Ok((from, to))
    }
}
