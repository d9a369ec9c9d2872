//! overblur Occurrence Model
//!
//! Defines the data contracts shared by the scan core and the media layer:
//! - **Occurrences:** where (`Location`) and when (`TimePoint`, `Interval`)
//!   a template was seen
//! - **Segments:** the ordered, gap-free `Keep` / `Change` plan that drives
//!   the split/filter/concat pipeline
//!
//! Times are seconds from the start of the media. Locations are pixels in
//! source-frame coordinates.

pub mod occurrence;
pub mod segment;

pub use occurrence::*;
pub use segment::*;
