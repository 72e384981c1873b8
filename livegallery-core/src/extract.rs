//! Pulling the motion clip and the still image out of a Live Photo container.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ToolError;
use crate::probe;
use crate::tools::{self, Tool, Toolchain};

pub const CONTAINER_EXTENSIONS: [&str; 2] = ["heic", "heif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMethod {
    /// `exiftool -b -EmbeddedVideoFile`
    EmbeddedVideoFile,
    /// `exiftool -b -EmbeddedVideo`
    EmbeddedVideo,
    /// ffmpeg stream copy of the first track that looks like a motion clip.
    StreamCopy,
    /// ffmpeg copy of whatever video ffmpeg picks, audio dropped.
    DirectCopy,
}

impl ExtractMethod {
    /// Methods that only succeed when a clip is really embedded.
    pub const EMBEDDED: [ExtractMethod; 2] =
        [ExtractMethod::EmbeddedVideoFile, ExtractMethod::EmbeddedVideo];

    pub const ALL: [ExtractMethod; 4] = [
        ExtractMethod::EmbeddedVideoFile,
        ExtractMethod::EmbeddedVideo,
        ExtractMethod::StreamCopy,
        ExtractMethod::DirectCopy,
    ];

    pub fn tool(self) -> Tool {
        match self {
            ExtractMethod::EmbeddedVideoFile | ExtractMethod::EmbeddedVideo => Tool::Exiftool,
            ExtractMethod::StreamCopy | ExtractMethod::DirectCopy => Tool::Ffmpeg,
        }
    }
}

impl fmt::Display for ExtractMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractMethod::EmbeddedVideoFile => "exiftool EmbeddedVideoFile",
            ExtractMethod::EmbeddedVideo => "exiftool EmbeddedVideo",
            ExtractMethod::StreamCopy => "ffmpeg stream mapping",
            ExtractMethod::DirectCopy => "ffmpeg direct copy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub path: PathBuf,
    pub method: ExtractMethod,
    pub bytes: u64,
}

/// `.heic` / `.heif`, any case.
pub fn is_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CONTAINER_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Try `methods` in order and keep the first non-empty clip at `output`.
///
/// `Ok(None)` means no method produced a clip: the input is a static image.
/// Tool failures inside a method only move on to the next method; the error
/// case is reserved for failing to write `output`.
pub fn extract_motion_video(
    toolchain: &Toolchain,
    input: &Path,
    output: &Path,
    methods: &[ExtractMethod],
) -> Result<Option<Extracted>, ToolError> {
    for &method in methods {
        tracing::debug!("Trying {} on {}", method, input.display());

        let produced = match method {
            ExtractMethod::EmbeddedVideoFile => {
                exiftool_payload(toolchain, input, output, "-EmbeddedVideoFile")?
            }
            ExtractMethod::EmbeddedVideo => {
                exiftool_payload(toolchain, input, output, "-EmbeddedVideo")?
            }
            ExtractMethod::StreamCopy => stream_copy(toolchain, input, output),
            ExtractMethod::DirectCopy => direct_copy(toolchain, input, output),
        };

        if let Some(bytes) = produced {
            tracing::info!(
                "Extracted {} ({} bytes) from {} using {}",
                output.display(),
                bytes,
                input.display(),
                method
            );
            return Ok(Some(Extracted {
                path: output.to_path_buf(),
                method,
                bytes,
            }));
        }
    }

    tracing::info!("No motion video in {}", input.display());
    Ok(None)
}

fn exiftool_payload(
    toolchain: &Toolchain,
    input: &Path,
    output: &Path,
    tag: &str,
) -> Result<Option<u64>, ToolError> {
    let result = tools::run(
        Tool::Exiftool,
        toolchain.command(Tool::Exiftool).args(["-b", tag]).arg(input),
    );

    let payload = match result {
        Ok(out) if !out.stdout.is_empty() => out.stdout,
        Ok(_) => return Ok(None),
        Err(e) => {
            tracing::debug!("{} {} failed: {}", Tool::Exiftool, tag, e);
            return Ok(None);
        }
    };

    write_payload(output, &payload)?;
    Ok(Some(payload.len() as u64))
}

fn write_payload(output: &Path, payload: &[u8]) -> Result<(), ToolError> {
    ensure_parent(output)?;
    fs::write(output, payload).map_err(|source| ToolError::Io {
        path: output.to_path_buf(),
        source,
    })
}

fn ensure_parent(output: &Path) -> Result<(), ToolError> {
    match output.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| ToolError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// Encode the primary image of `input` as a JPEG at `output`
/// (`ffmpeg -i <input> -vframes 1 -q:v 2`). Returns the bytes written.
pub fn extract_still(toolchain: &Toolchain, input: &Path, output: &Path) -> Result<u64, ToolError> {
    ensure_parent(output)?;
    let bytes = run_ffmpeg(
        output,
        toolchain
            .command(Tool::Ffmpeg)
            .arg("-i")
            .arg(input)
            .args(["-vframes", "1", "-q:v", "2"]),
    )?;
    tracing::info!(
        "Extracted still {} ({} bytes) from {}",
        output.display(),
        bytes,
        input.display()
    );
    Ok(bytes)
}

fn stream_copy(toolchain: &Toolchain, input: &Path, output: &Path) -> Option<u64> {
    let streams = match probe::probe_video_streams(toolchain, input) {
        Ok(streams) => streams,
        Err(e) => {
            tracing::debug!("Stream listing failed for {}: {}", input.display(), e);
            return None;
        }
    };
    for stream in &streams {
        tracing::debug!(
            "Stream {}: {} {}x{} ({}s)",
            stream.index,
            stream.codec,
            stream.width,
            stream.height,
            stream.duration
        );
    }

    let stream = streams.iter().find(|s| s.looks_like_motion_clip())?;
    let map = format!("0:{}", stream.index);
    run_ffmpeg_copy(
        output,
        toolchain
            .command(Tool::Ffmpeg)
            .arg("-i")
            .arg(input)
            .args(["-map", map.as_str(), "-c", "copy"]),
    )
}

fn direct_copy(toolchain: &Toolchain, input: &Path, output: &Path) -> Option<u64> {
    run_ffmpeg_copy(
        output,
        toolchain
            .command(Tool::Ffmpeg)
            .arg("-i")
            .arg(input)
            .args(["-vcodec", "copy", "-an"]),
    )
}

fn run_ffmpeg_copy(output: &Path, cmd: &mut Command) -> Option<u64> {
    cmd.args(["-avoid_negative_ts", "make_zero"]);
    match run_ffmpeg(output, cmd) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!("ffmpeg copy failed: {}", e);
            None
        }
    }
}

/// Run ffmpeg writing `output`. A failed run or an empty result leaves no
/// file behind.
fn run_ffmpeg(output: &Path, cmd: &mut Command) -> Result<u64, ToolError> {
    cmd.arg("-y").arg(output);

    if let Err(e) = tools::run(Tool::Ffmpeg, cmd) {
        let _ = fs::remove_file(output);
        return Err(e);
    }

    match fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        _ => {
            let _ = fs::remove_file(output);
            Err(ToolError::EmptyOutput {
                tool: Tool::Ffmpeg.name().to_string(),
                path: output.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_container_extensions() {
        assert!(is_container(Path::new("IMG_0001.HEIC")));
        assert!(is_container(Path::new("photo.heif")));
        assert!(!is_container(Path::new("photo.jpg")));
        assert!(!is_container(Path::new("heic")));
    }

    #[test]
    fn method_tools() {
        assert!(ExtractMethod::EMBEDDED.iter().all(|m| m.tool() == Tool::Exiftool));
        assert_eq!(ExtractMethod::ALL[2].tool(), Tool::Ffmpeg);
    }

    #[cfg(unix)]
    #[test]
    fn empty_exiftool_output_means_static_image() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = Toolchain {
            exiftool: "true".into(),
            ..Toolchain::default()
        };
        let out = dir.path().join("videos/clip.mov");
        let result = extract_motion_video(
            &toolchain,
            Path::new("still.heic"),
            &out,
            &ExtractMethod::EMBEDDED,
        )
        .unwrap();
        assert!(result.is_none());
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn falls_through_to_second_exiftool_tag() {
        let dir = tempfile::tempdir().unwrap();
        let exiftool = crate::tools::testing::script(
            dir.path(),
            "exiftool",
            r#"if [ "$2" = "-EmbeddedVideo" ]; then printf 'MOVDATA'; fi"#,
        );
        let toolchain = Toolchain {
            exiftool: exiftool.into(),
            ..Toolchain::default()
        };
        let out = dir.path().join("videos/clip.mov");
        let extracted = extract_motion_video(
            &toolchain,
            Path::new("live.heic"),
            &out,
            &ExtractMethod::EMBEDDED,
        )
        .unwrap()
        .unwrap();
        assert_eq!(extracted.method, ExtractMethod::EmbeddedVideo);
        assert_eq!(extracted.bytes, 7);
        assert_eq!(fs::read(&out).unwrap(), b"MOVDATA");
    }

    #[cfg(unix)]
    mod ffmpeg {
        use super::*;
        use crate::tools::testing::script;

        const WRITES_OUTPUT: &str = r#"echo "$@" >> "$(dirname "$0")/ffmpeg.log"
for last; do :; done
printf 'FFDATA' > "$last""#;

        const FAILS_MIDWAY: &str = r#"echo "$@" >> "$(dirname "$0")/ffmpeg.log"
for last; do :; done
printf 'partial' > "$last"
exit 1"#;

        const STILL_AND_CLIP: &str =
            r"printf '0,hevc,video,4032,3024,N/A,N/A\n1,h264,video,1440,1920,2.9,800\n'";
        const STILL_ONLY: &str = r"printf '0,hevc,video,4032,3024,N/A,N/A\n'";

        fn toolchain(dir: &Path, ffprobe: &str, ffmpeg: &str) -> Toolchain {
            Toolchain {
                exiftool: "true".into(),
                ffprobe: script(dir, "ffprobe", ffprobe).into(),
                ffmpeg: script(dir, "ffmpeg", ffmpeg).into(),
            }
        }

        fn ffmpeg_calls(dir: &Path) -> Vec<String> {
            fs::read_to_string(dir.join("ffmpeg.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        #[test]
        fn stream_copy_maps_the_motion_track() {
            let dir = tempfile::tempdir().unwrap();
            let toolchain = toolchain(dir.path(), STILL_AND_CLIP, WRITES_OUTPUT);
            let out = dir.path().join("o.mov");

            let extracted =
                extract_motion_video(&toolchain, Path::new("x.heic"), &out, &ExtractMethod::ALL)
                    .unwrap()
                    .unwrap();
            assert_eq!(extracted.method, ExtractMethod::StreamCopy);
            assert_eq!(extracted.bytes, 6);

            let calls = ffmpeg_calls(dir.path());
            assert_eq!(calls.len(), 1);
            assert_eq!(
                calls[0],
                format!(
                    "-i x.heic -map 0:1 -c copy -avoid_negative_ts make_zero -y {}",
                    out.display()
                )
            );
        }

        #[test]
        fn direct_copy_when_no_track_looks_like_motion() {
            let dir = tempfile::tempdir().unwrap();
            let toolchain = toolchain(dir.path(), STILL_ONLY, WRITES_OUTPUT);
            let out = dir.path().join("o.mov");

            let extracted =
                extract_motion_video(&toolchain, Path::new("x.heic"), &out, &ExtractMethod::ALL)
                    .unwrap()
                    .unwrap();
            assert_eq!(extracted.method, ExtractMethod::DirectCopy);
            assert_eq!(fs::read(&out).unwrap(), b"FFDATA");

            let calls = ffmpeg_calls(dir.path());
            assert_eq!(calls.len(), 1);
            assert!(calls[0].starts_with("-i x.heic -vcodec copy -an -avoid_negative_ts make_zero -y "));
        }

        #[test]
        fn failed_ffmpeg_runs_leave_no_output() {
            let dir = tempfile::tempdir().unwrap();
            let toolchain = toolchain(dir.path(), STILL_AND_CLIP, FAILS_MIDWAY);
            let out = dir.path().join("o.mov");

            let result =
                extract_motion_video(&toolchain, Path::new("x.heic"), &out, &ExtractMethod::ALL)
                    .unwrap();
            assert!(result.is_none());
            assert!(!out.exists());
            assert_eq!(ffmpeg_calls(dir.path()).len(), 2);
        }

        #[test]
        fn still_is_written_as_jpeg() {
            let dir = tempfile::tempdir().unwrap();
            let toolchain = toolchain(dir.path(), STILL_ONLY, WRITES_OUTPUT);
            let out = dir.path().join("images/ocean.jpg");

            let bytes = extract_still(&toolchain, Path::new("x.heic"), &out).unwrap();
            assert_eq!(bytes, 6);
            assert_eq!(fs::read(&out).unwrap(), b"FFDATA");
            assert_eq!(
                ffmpeg_calls(dir.path()),
                [format!("-i x.heic -vframes 1 -q:v 2 -y {}", out.display())]
            );
        }

        #[test]
        fn still_failures_are_reported() {
            let dir = tempfile::tempdir().unwrap();
            let failing = toolchain(dir.path(), STILL_ONLY, FAILS_MIDWAY);
            let out = dir.path().join("ocean.jpg");
            assert!(matches!(
                extract_still(&failing, Path::new("x.heic"), &out),
                Err(ToolError::NonZeroExit { .. })
            ));
            assert!(!out.exists());

            let silent = Toolchain {
                ffmpeg: "true".into(),
                ..Toolchain::default()
            };
            assert!(matches!(
                extract_still(&silent, Path::new("x.heic"), &out),
                Err(ToolError::EmptyOutput { .. })
            ));
        }
    }
}
