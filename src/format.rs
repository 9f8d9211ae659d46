//! Recognised container formats.
//!
//! Inputs are screened by extension before FFmpeg sees them, so an
//! unrecognised file fails with
//! [`FrameScanError::UnsupportedFormat`] instead of a decode attempt.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::error::FrameScanError;

/// A container format accepted as pipeline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    /// MPEG-4 Part 14 (`.mp4`).
    Mp4,
    /// Audio Video Interleave (`.avi`).
    Avi,
    /// QuickTime (`.mov`).
    Mov,
    /// Matroska (`.mkv`).
    Mkv,
}

impl ContainerFormat {
    /// Every accepted format.
    pub const ALL: [ContainerFormat; 4] = [
        ContainerFormat::Mp4,
        ContainerFormat::Avi,
        ContainerFormat::Mov,
        ContainerFormat::Mkv,
    ];

    /// Look up a format by extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension
            .trim_start_matches('.')
            .to_ascii_lowercase()
            .as_str()
        {
            "mp4" => Some(ContainerFormat::Mp4),
            "avi" => Some(ContainerFormat::Avi),
            "mov" => Some(ContainerFormat::Mov),
            "mkv" => Some(ContainerFormat::Mkv),
            _ => None,
        }
    }

    /// Determine the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// [`FrameScanError::UnsupportedFormat`] when the extension is missing or
    /// not one of `.mp4`, `.avi`, `.mov`, `.mkv`.
    pub fn from_path(path: &Path) -> Result<Self, FrameScanError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or_default();

        Self::from_extension(extension).ok_or_else(|| FrameScanError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.to_string(),
        })
    }

    /// Canonical lowercase extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Avi => "avi",
            ContainerFormat::Mov => "mov",
            ContainerFormat::Mkv => "mkv",
        }
    }
}

impl Display for ContainerFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}
