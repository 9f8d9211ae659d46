//! Shared test helpers: writes small real videos with FFmpeg.

use std::path::Path;

use ffmpeg_next::codec::Id;
use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Packet, Rational};

/// Gray level of frame `index` in videos written by [`encode_gray_video`].
pub fn gray_level(index: u64) -> u8 {
    (index * 10).min(250) as u8
}

/// Encode `frames` flat gray frames as MPEG-4 Part 2 into `path`.
///
/// Frame `i` is filled with [`gray_level`]`(i)`, so decoded content can be
/// matched back to its position. The container follows the extension.
pub fn encode_gray_video(path: &Path, width: u32, height: u32, frames: u64, fps: i32) {
    ffmpeg_next::init().expect("FFmpeg init");

    let mut output = ffmpeg_next::format::output(path).expect("open output");
    let codec = ffmpeg_next::encoder::find(Id::MPEG4).expect("MPEG-4 encoder available");

    let mut stream = output.add_stream(codec).expect("add stream");
    let stream_index = stream.index();

    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .expect("codec context")
        .encoder()
        .video()
        .expect("video encoder");
    encoder.set_width(width);
    encoder.set_height(height);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(Rational::new(1, fps));
    encoder.set_frame_rate(Some(Rational::new(fps, 1)));

    let mut encoder = encoder.open_as(codec).expect("open encoder");
    stream.set_parameters(&encoder);
    output.write_header().expect("write header");

    let mut scaler = ScalingContext::get(
        Pixel::RGB24,
        width,
        height,
        Pixel::YUV420P,
        width,
        height,
        ScalingFlags::BILINEAR,
    )
    .expect("scaler");

    let row_len = width as usize * 3;
    for index in 0..frames {
        let mut rgb = VideoFrame::new(Pixel::RGB24, width, height);
        let stride = rgb.stride(0);
        let data = rgb.data_mut(0);
        for y in 0..height as usize {
            data[y * stride..y * stride + row_len].fill(gray_level(index));
        }

        let mut yuv = VideoFrame::empty();
        scaler.run(&rgb, &mut yuv).expect("scale");
        yuv.set_pts(Some(index as i64));

        encoder.send_frame(&yuv).expect("send frame");
        write_packets(&mut encoder, &mut output, stream_index, fps);
    }

    encoder.send_eof().expect("send eof");
    write_packets(&mut encoder, &mut output, stream_index, fps);
    output.write_trailer().expect("write trailer");
}

fn write_packets(
    encoder: &mut ffmpeg_next::encoder::video::Encoder,
    output: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    fps: i32,
) {
    let time_base = output.stream(stream_index).expect("stream").time_base();
    let mut packet = Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(Rational::new(1, fps), time_base);
        packet.write_interleaved(output).expect("write packet");
    }
}
