//! FFmpeg log level control.
//!
//! FFmpeg writes its own diagnostics to stderr independently of the `log`
//! facade used by this crate. Decoding damaged or unusual files can make it
//! very chatty, so the level is exposed here without requiring callers to
//! depend on `ffmpeg-next` themselves.
//!
//! ```no_run
//! use framescan::FfmpegLogLevel;
//!
//! framescan::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use ffmpeg_next::util::log::Level;

/// FFmpeg internal log verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Unrecoverable conditions about to abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    /// Parse a level name as accepted on the command line.
    ///
    /// Matching is case-insensitive; `warn` is accepted for `warning`.
    pub fn from_name(name: &str) -> Option<Self> {
        let level = match name.to_ascii_lowercase().as_str() {
            "quiet" => FfmpegLogLevel::Quiet,
            "panic" => FfmpegLogLevel::Panic,
            "fatal" => FfmpegLogLevel::Fatal,
            "error" => FfmpegLogLevel::Error,
            "warning" | "warn" => FfmpegLogLevel::Warning,
            "info" => FfmpegLogLevel::Info,
            "verbose" => FfmpegLogLevel::Verbose,
            "debug" => FfmpegLogLevel::Debug,
            "trace" => FfmpegLogLevel::Trace,
            _ => return None,
        };
        Some(level)
    }

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

/// Set FFmpeg's own stderr verbosity.
///
/// Rust-side `log` output is unaffected; configure that through the logger
/// installed by the application (the `framescan` binary uses `env_logger`).
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}
