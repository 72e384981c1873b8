//! Duration and stream metadata from ffprobe.

use std::path::Path;

use serde::Deserialize;

use crate::error::ToolError;
use crate::tools::{self, Tool, Toolchain};

/// Duration recorded when a clip cannot be probed, and for static images.
pub const DEFAULT_DURATION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub index: u32,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub bit_rate: Option<u64>,
}

impl StreamInfo {
    /// An h264/hevc track long enough to be the motion part of a Live Photo.
    pub fn looks_like_motion_clip(&self) -> bool {
        matches!(self.codec.as_str(), "h264" | "hevc")
            && self.duration > 0.5
            && self.width > 0
            && self.height > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub frame_rate: String,
    pub duration: Option<f64>,
}

impl VideoProperties {
    pub fn has_plausible_dimensions(&self) -> bool {
        (1..10_000).contains(&self.width) && (1..10_000).contains(&self.height)
    }
}

/// Container duration in seconds.
pub fn probe_duration(toolchain: &Toolchain, path: &Path) -> Result<f64, ToolError> {
    let output = tools::run(
        Tool::Ffprobe,
        toolchain
            .command(Tool::Ffprobe)
            .args(["-v", "quiet", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path),
    )?;

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(stdout: &str) -> Result<f64, ToolError> {
    let value = stdout.trim();
    if value.is_empty() || value == "N/A" {
        return Err(ToolError::Unavailable {
            tool: Tool::Ffprobe.name().to_string(),
        });
    }

    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(ToolError::Unparseable {
            tool: Tool::Ffprobe.name().to_string(),
            output: value.to_string(),
        }),
    }
}

/// Substitute [`DEFAULT_DURATION`] for a failed probe, logging why.
pub fn duration_or_default(path: &Path, result: Result<f64, ToolError>) -> f64 {
    match result {
        Ok(seconds) => seconds,
        Err(e) => {
            tracing::warn!(
                "Could not read duration of {} ({}), using {}s",
                path.display(),
                e,
                DEFAULT_DURATION
            );
            DEFAULT_DURATION
        }
    }
}

/// One decimal place, the precision stored in the manifest. Exact ties go to
/// the even digit, so `2.25` becomes `2.2`.
pub fn round_duration(seconds: f64) -> f64 {
    format!("{seconds:.1}").parse().unwrap_or(seconds)
}

/// Video streams of `path`, in container order.
pub fn probe_video_streams(toolchain: &Toolchain, path: &Path) -> Result<Vec<StreamInfo>, ToolError> {
    let output = tools::run(
        Tool::Ffprobe,
        toolchain
            .command(Tool::Ffprobe)
            .args(["-v", "quiet", "-show_entries"])
            .arg("stream=index,codec_type,codec_name,width,height,duration,bit_rate")
            .args(["-of", "csv=p=0"])
            .arg(path),
    )?;

    Ok(parse_stream_rows(&String::from_utf8_lossy(&output.stdout)))
}

// ffprobe emits csv columns in its own field order:
// index,codec_name,codec_type,width,height,duration,bit_rate
fn parse_stream_rows(stdout: &str) -> Vec<StreamInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.trim().split(',').collect();
            if fields.len() < 6 || fields[2] != "video" {
                return None;
            }
            Some(StreamInfo {
                index: fields[0].parse().ok()?,
                codec: fields[1].to_string(),
                width: fields[3].parse().unwrap_or(0),
                height: fields[4].parse().unwrap_or(0),
                duration: fields[5].parse().unwrap_or(0.0),
                bit_rate: fields.get(6).and_then(|b| b.parse().ok()),
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Properties of the first video stream of `path`.
pub fn probe_video_properties(
    toolchain: &Toolchain,
    path: &Path,
) -> Result<VideoProperties, ToolError> {
    let output = tools::run(
        Tool::Ffprobe,
        toolchain
            .command(Tool::Ffprobe)
            .args(["-v", "quiet", "-print_format", "json"])
            .args(["-show_format", "-show_streams"])
            .arg(path),
    )?;

    parse_video_properties(&String::from_utf8_lossy(&output.stdout))
}

fn parse_video_properties(stdout: &str) -> Result<VideoProperties, ToolError> {
    let report: ProbeReport =
        serde_json::from_str(stdout).map_err(|_| ToolError::Unparseable {
            tool: Tool::Ffprobe.name().to_string(),
            output: stdout.chars().take(200).collect(),
        })?;

    let stream = report
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ToolError::Unavailable {
            tool: Tool::Ffprobe.name().to_string(),
        })?;

    Ok(VideoProperties {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec: stream.codec_name.unwrap_or_default(),
        frame_rate: stream.r_frame_rate.unwrap_or_default(),
        duration: report
            .format
            .and_then(|f| f.duration)
            .and_then(|d| parse_duration(&d).ok()),
    })
}
