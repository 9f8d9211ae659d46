//! Video sources.
//!
//! A [`FrameSource`] is an open, sequentially readable video. The pipeline
//! only ever walks it forward: [`advance`](FrameSource::advance) decodes the
//! next frame and reports its index, and
//! [`current_image`](FrameSource::current_image) converts that frame to RGB
//! when the caller actually wants the pixels. Frames that are skipped are
//! decoded but never converted.
//!
//! [`VideoFile`] is the FFmpeg-backed implementation. Every handle is
//! released exactly once: [`close`](FrameSource::close) is idempotent and
//! dropping an unclosed handle closes it.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;
use tempfile::TempPath;

use crate::{
    conversion::{frame_to_rgb_buffer, rational_to_fps},
    error::FrameScanError,
    format::ContainerFormat,
    metadata::VideoMetadata,
};

/// An open video that can be decoded front to back.
pub trait FrameSource {
    /// Metadata read when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Decode the next frame and return its index, or `None` at end of stream.
    ///
    /// Indices start at 0 and increase by one per decoded frame.
    fn advance(&mut self) -> Result<Option<u64>, FrameScanError>;

    /// Convert the frame produced by the last successful
    /// [`advance`](FrameSource::advance) into an RGB8 image.
    fn current_image(&mut self) -> Result<RgbImage, FrameScanError>;

    /// Decode and convert the next frame.
    fn next_frame(&mut self) -> Result<Option<(u64, RgbImage)>, FrameScanError> {
        match self.advance()? {
            Some(index) => Ok(Some((index, self.current_image()?))),
            None => Ok(None),
        }
    }

    /// Release the decoder and any temporary storage.
    ///
    /// Calling this more than once has no further effect.
    fn close(&mut self);

    /// Whether [`close`](FrameSource::close) has run.
    fn is_closed(&self) -> bool;
}

struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    /// Scaler plus the source size it was built for.
    scaler: Option<(ScalingContext, (u32, u32))>,
    decoded: VideoFrame,
    rgb: VideoFrame,
    eof_sent: bool,
    exhausted: bool,
}

/// A video file decoded through FFmpeg.
///
/// # Example
///
/// ```no_run
/// use framescan::{FrameSource, VideoFile};
///
/// let mut video = VideoFile::open("input.mp4")?;
/// while let Some((index, image)) = video.next_frame()? {
///     if index % 30 == 0 {
///         image.save(format!("frame_{index:06}.png"))?;
///     }
/// }
/// video.close();
/// # Ok::<(), framescan::FrameScanError>(())
/// ```
pub struct VideoFile {
    path: PathBuf,
    metadata: VideoMetadata,
    state: Option<DecodeState>,
    /// Spooled copy of an in-memory input, deleted on close.
    spool: Option<TempPath>,
    next_index: u64,
    has_current: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("closed", &self.state.is_none())
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// The extension is checked before anything else; FFmpeg is only
    /// initialised for recognised containers.
    ///
    /// # Errors
    ///
    /// - [`FrameScanError::UnsupportedFormat`] for an unrecognised extension.
    /// - [`FrameScanError::Open`] if FFmpeg cannot parse the file.
    /// - [`FrameScanError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameScanError> {
        let path = path.as_ref();
        ContainerFormat::from_path(path)?;
        Self::open_unchecked(path, None)
    }

    /// Open a video held in memory.
    ///
    /// The bytes are spooled to a temporary file with the given extension,
    /// which is removed again when the handle is closed or dropped.
    ///
    /// # Errors
    ///
    /// As for [`open`](VideoFile::open), plus [`FrameScanError::Io`] if the
    /// temporary file cannot be written.
    pub fn open_bytes(bytes: &[u8], extension: &str) -> Result<Self, FrameScanError> {
        let format = ContainerFormat::from_extension(extension).ok_or_else(|| {
            FrameScanError::UnsupportedFormat {
                path: PathBuf::from("<memory>"),
                extension: extension.trim_start_matches('.').to_string(),
            }
        })?;

        let mut spool = tempfile::Builder::new()
            .prefix("framescan-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?;
        spool.write_all(bytes)?;
        spool.flush()?;
        let spool = spool.into_temp_path();

        log::debug!(
            "Spooled {} in-memory bytes to {}",
            bytes.len(),
            spool.display()
        );

        let path = spool.to_path_buf();
        Self::open_unchecked(&path, Some(spool))
    }

    fn open_unchecked(path: &Path, spool: Option<TempPath>) -> Result<Self, FrameScanError> {
        let path_buf = path.to_path_buf();
        log::debug!("Opening video: {}", path_buf.display());

        ffmpeg_next::init().map_err(|error| FrameScanError::Open {
            path: path_buf.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(path).map_err(|error| FrameScanError::Open {
            path: path_buf.clone(),
            reason: error.to_string(),
        })?;

        let (stream_index, decoder, frames_per_second, stream_frames) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FrameScanError::NoVideoStream)?;

            let decoder_context =
                CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                    FrameScanError::Open {
                        path: path_buf.clone(),
                        reason: format!("Failed to read video codec parameters: {error}"),
                    }
                })?;
            let decoder =
                decoder_context
                    .decoder()
                    .video()
                    .map_err(|error| FrameScanError::Open {
                        path: path_buf.clone(),
                        reason: format!("Failed to create video decoder: {error}"),
                    })?;

            let mut frames_per_second = rational_to_fps(stream.avg_frame_rate());
            if frames_per_second == 0.0 {
                frames_per_second = rational_to_fps(stream.rate());
            }

            (stream.index(), decoder, frames_per_second, stream.frames())
        };

        let container_micros = input.duration();
        let container_duration = if container_micros > 0 {
            Duration::from_micros(container_micros as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = if stream_frames > 0 {
            stream_frames as u64
        } else {
            (container_duration.as_secs_f64() * frames_per_second) as u64
        };

        if frames_per_second == 0.0 {
            log::warn!(
                "{} declares no frame rate; durations will be reported as zero",
                path_buf.display()
            );
        }

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            format: input.format().name().to_string(),
        };

        log::info!(
            "Opened video: {} (format={}, {}x{}, {:.2} fps, {} frames, codec={})",
            path_buf.display(),
            metadata.format,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            path: path_buf,
            metadata,
            state: Some(DecodeState {
                input,
                decoder,
                stream_index,
                scaler: None,
                decoded: VideoFrame::empty(),
                rgb: VideoFrame::empty(),
                eof_sent: false,
                exhausted: false,
            }),
            spool,
            next_index: 0,
            has_current: false,
        })
    }

    /// Path the handle was opened from (the spool file for in-memory input).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn closed_handle() -> FrameScanError {
    FrameScanError::Decode("video handle is closed".to_string())
}

impl FrameSource for VideoFile {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn advance(&mut self) -> Result<Option<u64>, FrameScanError> {
        let state = self.state.as_mut().ok_or_else(closed_handle)?;
        if state.exhausted {
            return Ok(None);
        }

        loop {
            if state.decoder.receive_frame(&mut state.decoded).is_ok() {
                let index = self.next_index;
                self.next_index += 1;
                self.has_current = true;
                return Ok(Some(index));
            }

            if state.eof_sent {
                state.exhausted = true;
                self.has_current = false;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut state.input) {
                Ok(()) => {
                    if packet.stream() == state.stream_index {
                        state.decoder.send_packet(&packet).map_err(|error| {
                            FrameScanError::Decode(format!(
                                "packet after frame {} rejected: {error}",
                                self.next_index
                            ))
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    state
                        .decoder
                        .send_eof()
                        .map_err(|error| FrameScanError::Decode(error.to_string()))?;
                    state.eof_sent = true;
                }
                Err(error) => {
                    return Err(FrameScanError::Decode(format!(
                        "read failed after frame {}: {error}",
                        self.next_index
                    )));
                }
            }
        }
    }

    fn current_image(&mut self) -> Result<RgbImage, FrameScanError> {
        let state = self.state.as_mut().ok_or_else(closed_handle)?;
        if !self.has_current {
            return Err(FrameScanError::Decode(
                "no decoded frame to convert".to_string(),
            ));
        }

        let width = state.decoded.width();
        let height = state.decoded.height();

        // Rebuild the scaler if the stream changes resolution mid-way.
        if state
            .scaler
            .as_ref()
            .is_none_or(|(_, size)| *size != (width, height))
        {
            let scaler = ScalingContext::get(
                state.decoded.format(),
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            state.scaler = Some((scaler, (width, height)));
        }
        if let Some((scaler, _)) = state.scaler.as_mut() {
            scaler.run(&state.decoded, &mut state.rgb)?;
        }

        let buffer = frame_to_rgb_buffer(&state.rgb, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            FrameScanError::Decode(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn close(&mut self) {
        if self.state.take().is_none() {
            return;
        }
        self.has_current = false;

        if let Some(spool) = self.spool.take() {
            if let Err(error) = spool.close() {
                log::warn!("Failed to remove spooled video: {error}");
            }
        }

        log::info!(
            "Released video {} after {} decoded frames",
            self.path.display(),
            self.next_index
        );
    }

    fn is_closed(&self) -> bool {
        self.state.is_none()
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        self.close();
    }
}
