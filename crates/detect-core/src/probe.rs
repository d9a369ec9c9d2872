//! The predicate port consumed by the scan engine.

use overblur_model::occurrence::Location;

/// Point-wise "is the template present at `second`?" check.
///
/// Implementations are expected to be slow (a decode per call) and must be
/// fail-open: any I/O or decode failure is reported as `None`, never as an
/// error. The scan engine calls `probe` from two threads at once with
/// different timestamps.
pub trait Probe: Send + Sync {
    fn probe(&self, second: f64) -> Option<Location>;
}

impl<F> Probe for F
where
    F: Fn(f64) -> Option<Location> + Send + Sync,
{
    fn probe(&self, second: f64) -> Option<Location> {
        self(second)
    }
}
