use std::path::Path;

use serde::{Deserialize, Serialize};

const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];

/// Human readable byte count. Each unit rolls over at exactly 1024.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return if unit == "bytes" {
                format!("{bytes} bytes")
            } else {
                format!("{value:.1} {unit}")
            };
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

/// The `size` object of a gallery item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemSize {
    pub bytes: u64,
    pub formatted: String,
}

impl ItemSize {
    pub fn from_bytes(bytes: u64) -> Self {
        Self {
            bytes,
            formatted: format_size(bytes),
        }
    }

    /// Size of the file at `path`; an unreadable file counts as empty.
    pub fn of(path: &Path) -> Self {
        match path.metadata() {
            Ok(meta) => Self::from_bytes(meta.len()),
            Err(e) => {
                tracing::warn!("Could not stat {}: {}", path.display(), e);
                Self::from_bytes(0)
            }
        }
    }
}
