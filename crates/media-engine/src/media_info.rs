//! Media inspection through `ffprobe`.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use overblur_common::error::{OverblurError, OverblurResult};

/// What the scan and the pipeline need to know about the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Codec name of the (last) video stream, reused when re-encoding.
    pub video_codec: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
    codec_type: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Run `ffprobe` on `path`.
pub fn probe_media(path: &Path) -> OverblurResult<MediaInfo> {
    if !path.exists() {
        return Err(OverblurError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| OverblurError::config(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(OverblurError::config(format!(
            "ffprobe failed on {} ({})",
            path.display(),
            output.status
        )));
    }

    let info = parse_ffprobe_json(&output.stdout)?;
    tracing::debug!(?info, "ffprobe result");
    Ok(info)
}

fn parse_ffprobe_json(raw: &[u8]) -> OverblurResult<MediaInfo> {
    let parsed: FfprobeOutput = serde_json::from_slice(raw)?;

    let video = parsed
        .streams
        .iter()
        .rev()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| OverblurError::config("unknown video codec: no video stream"))?;
    let video_codec = video
        .codec_name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| OverblurError::config("unknown video codec"))?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| OverblurError::config("media duration is missing or invalid"))?;

    Ok(MediaInfo {
        duration_secs,
        video_codec,
        width: video.width,
        height: video.height,
    })
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080},
            {"index": 1, "codec_name": "aac", "codec_type": "audio"}
        ],
        "format": {"format_name": "mpegts", "duration": "5423.120000", "size": "1000"}
    }"#;

    #[test]
    fn test_parse_ffprobe_json() {
        let info = parse_ffprobe_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            info,
            MediaInfo {
                duration_secs: 5423.12,
                video_codec: "h264".to_string(),
                width: 1920,
                height: 1080,
            }
        );
    }

    #[test]
    fn test_missing_video_stream_is_config_error() {
        let raw = r#"{"streams":[{"codec_name":"aac","codec_type":"audio"}],"format":{"duration":"10"}}"#;
        let err = parse_ffprobe_json(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, OverblurError::Config { .. }));
    }

    #[test]
    fn test_missing_duration_is_config_error() {
        let raw = r#"{"streams":[{"codec_name":"hevc","codec_type":"video"}],"format":{}}"#;
        assert!(parse_ffprobe_json(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_probe_media_missing_file() {
        let err = probe_media(Path::new("/definitely/not/here.mp4")).unwrap_err();
        assert!(matches!(err, OverblurError::FileNotFound { .. }));
    }
}
