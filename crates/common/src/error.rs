//! Error types shared across overblur crates.

use std::path::PathBuf;

/// Top-level error type for overblur operations.
///
/// Probe failures never reach callers of the scan engine: a frame that
/// cannot be extracted or decoded counts as "template absent". The
/// `Probe` variant only travels inside the media layer up to that point.
#[derive(Debug, thiserror::Error)]
pub enum OverblurError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Probe error at {second:.2}s: {message}")]
    Probe { second: f64, message: String },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    #[error("Cleanup error for {path}: {message}")]
    Cleanup { path: PathBuf, message: String },

    #[error("Scan task failed: {message}")]
    Task { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using OverblurError.
pub type OverblurResult<T> = Result<T, OverblurError>;

impl OverblurError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn probe(second: f64, msg: impl Into<String>) -> Self {
        Self::Probe {
            second,
            message: msg.into(),
        }
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            message: msg.into(),
        }
    }

    pub fn cleanup(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Cleanup {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task {
            message: msg.into(),
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Probe and cleanup failures are absorbed where they happen; everything
    /// else propagates up to the command and terminates it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Probe { .. } | Self::Cleanup { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_and_cleanup_are_not_fatal() {
        assert!(!OverblurError::probe(1.5, "decode failed").is_fatal());
        assert!(!OverblurError::cleanup("part-00.ts", "busy").is_fatal());
        assert!(OverblurError::config("no templates").is_fatal());
        assert!(OverblurError::pipeline("ffmpeg exited 1").is_fatal());
    }

    #[test]
    fn test_probe_message_includes_second() {
        let err = OverblurError::probe(12.345, "no frame");
        assert_eq!(err.to_string(), "Probe error at 12.35s: no frame");
    }
}
