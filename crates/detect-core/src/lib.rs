//! overblur Detect Core: the temporal occurrence detector
//!
//! Finds every maximal time interval in which a costly point-wise
//! predicate ("is the template on screen at second `t`?") holds:
//! - **Series:** ascending sample timestamps for a window and step
//! - **Scan:** two concurrent tasks sweep the halves of a series toward
//!   each other, collecting boundaries or whole intervals
//! - **Refine:** coarse boundaries are sharpened with a descending step schedule
//! - **Assemble:** refined intervals become a gap-free `Keep` / `Change` plan
//!
//! Apart from the [`Probe`] port and the two blocking scan tasks this crate
//! is pure computation. All inputs are data; all outputs are data.

pub mod assemble;
pub mod detector;
pub mod edge;
pub mod probe;
pub mod refine;
pub mod scan;
pub mod series;

pub use detector::{Detection, OccurrenceDetector, ScanConfig};
pub use probe::Probe;
pub use scan::ScanMode;
