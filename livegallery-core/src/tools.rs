//! External media tools, invoked as blocking subprocesses.

use std::ffi::OsString;
use std::fmt;
use std::process::{Command, Output, Stdio};

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Exiftool,
    Ffprobe,
    Ffmpeg,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Exiftool => "exiftool",
            Tool::Ffprobe => "ffprobe",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(self) -> &'static str {
        match self {
            Tool::Exiftool => "-ver",
            Tool::Ffprobe | Tool::Ffmpeg => "-version",
        }
    }

    /// Homebrew formula that ships the tool.
    pub fn package(self) -> &'static str {
        match self {
            Tool::Exiftool => "exiftool",
            Tool::Ffprobe | Tool::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Program paths for the external tools. Bare names resolve through `PATH`.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub exiftool: OsString,
    pub ffprobe: OsString,
    pub ffmpeg: OsString,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            exiftool: Tool::Exiftool.name().into(),
            ffprobe: Tool::Ffprobe.name().into(),
            ffmpeg: Tool::Ffmpeg.name().into(),
        }
    }
}

impl Toolchain {
    pub fn program(&self, tool: Tool) -> &OsString {
        match tool {
            Tool::Exiftool => &self.exiftool,
            Tool::Ffprobe => &self.ffprobe,
            Tool::Ffmpeg => &self.ffmpeg,
        }
    }

    pub fn command(&self, tool: Tool) -> Command {
        Command::new(self.program(tool))
    }

    /// Run each tool's version probe once. Tools that fail to start or exit
    /// non-zero are reported together in [`ToolError::Missing`].
    pub fn check_available(&self, tools: &[Tool]) -> Result<(), ToolError> {
        let missing: Vec<String> = tools
            .iter()
            .filter(|&&tool| !self.is_available(tool))
            .map(|tool| tool.name().to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::Missing(missing))
        }
    }

    fn is_available(&self, tool: Tool) -> bool {
        let status = self
            .command(tool)
            .arg(tool.version_arg())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::debug!("{} version probe exited with {}", tool, status);
                false
            }
            Err(e) => {
                tracing::debug!("{} not runnable: {}", tool, e);
                false
            }
        }
    }
}

/// Run `cmd` to completion with captured output; non-zero exit is an error.
pub fn run(tool: Tool, cmd: &mut Command) -> Result<Output, ToolError> {
    tracing::debug!("Running: {:?}", cmd);

    let output = cmd.output().map_err(|source| ToolError::Spawn {
        tool: tool.name().to_string(),
        source,
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!("{} failed with {}: {}", tool, output.status, stderr);
        return Err(ToolError::NonZeroExit {
            tool: tool.name().to_string(),
            status: output.status,
            stderr,
        });
    }

    Ok(output)
}
