//! overblur Media Engine
//!
//! Everything that touches real media, built around the `ffmpeg` and
//! `ffprobe` binaries:
//!
//! ```text
//! input.mp4 ──┬── ffprobe ─────────── duration, codec
//!             │
//!             ├── ffmpeg -ss t ────── frame ── TemplateMatcher ── Probe
//!             │                                                    │
//!             │                              overblur-detect ◄─────┘
//!             │                                     │
//!             │                               segment plan
//!             │                                     ▼
//!             └── split (copy) ── crop+boxblur+overlay ── concat ── output
//! ```

pub mod frame;
pub mod job;
pub mod matcher;
pub mod media_info;
pub mod pipeline;
pub mod probe;
pub mod runner;

pub use job::*;
