//! Error types for the `framescan` crate.
//!
//! [`FrameScanError`] is returned by every fallible operation. Opening,
//! format and decode failures are fatal to the current run; the video
//! resource is always released before one of them reaches the caller.

use std::{io::Error as IoError, path::PathBuf};

use csv::Error as CsvError;
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `framescan` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameScanError {
    /// The video file is unreadable or not a container FFmpeg can parse.
    #[error("Failed to open video at {path}: {reason}")]
    Open {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file extension is not one of the recognised containers.
    ///
    /// Raised before any decode attempt.
    #[error("Unsupported video format {extension:?} for {path}")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Extension as found on the path (empty when there is none).
        extension: String,
    },

    /// A frame could not be read or decoded mid-stream.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// The container opened but carries no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A sampling stride of zero was requested.
    #[error("Sample stride must be greater than zero")]
    InvalidStride,

    /// A pipeline option is outside its accepted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// Report text could not be parsed back into rows.
    #[error("Malformed report at line {line}: {reason}")]
    ReportParse {
        /// 1-based line number (or record number for JSON).
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] JsonError),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),
}

impl From<FfmpegError> for FrameScanError {
    fn from(error: FfmpegError) -> Self {
        FrameScanError::Ffmpeg(error.to_string())
    }
}
