use ffmpeg_next::util::frame::audio::Audio as AudioFrame;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::ChannelLayout;

use super::ffmpeg_mapping;
use crate::codec::domain::format_negotiation::SampleBuffer;
use crate::shared::frame::Frame;
use crate::shared::media_format::PixelFormat;

/// Copies a tightly packed domain frame into a stride-aligned ffmpeg frame.
pub fn to_video_frame(frame: &Frame) -> VideoFrame {
    let mut out = VideoFrame::new(
        ffmpeg_mapping::pixel(frame.format()),
        frame.width(),
        frame.height(),
    );
    for (index, (plane, row_len)) in frame.planes().into_iter().enumerate() {
        let stride = out.stride(index);
        let dst = out.data_mut(index);
        for (row, src) in plane.chunks_exact(row_len).enumerate() {
            let start = row * stride;
            dst[start..start + row_len].copy_from_slice(src);
        }
    }
    out.set_pts(Some(frame.pts()));
    out
}

/// Copies a stride-aligned ffmpeg frame back into a tightly packed domain frame.
pub fn from_video_frame(frame: &VideoFrame, format: PixelFormat) -> Frame {
    let (width, height) = (frame.width(), frame.height());
    let mut data = Vec::with_capacity(format.buffer_size(width, height));
    for (index, (row_len, rows)) in format.plane_sizes(width, height).into_iter().enumerate() {
        let stride = frame.stride(index);
        let src = frame.data(index);
        for row in 0..rows {
            let start = row * stride;
            data.extend_from_slice(&src[start..start + row_len]);
        }
    }
    Frame::new(data, width, height, format, frame.pts().unwrap_or(0))
}

/// Builds an encoder-ready audio frame from an already converted sample buffer.
pub fn to_audio_frame(buffer: &SampleBuffer, layout: ChannelLayout, rate: u32, pts: i64) -> AudioFrame {
    let mut frame = AudioFrame::new(
        ffmpeg_mapping::sample(buffer.format),
        buffer.samples_per_channel,
        layout,
    );
    frame.set_rate(rate);
    frame.set_pts(Some(pts));
    for (index, plane) in buffer.planes.iter().enumerate() {
        frame.data_mut(index)[..plane.len()].copy_from_slice(plane);
    }
    frame
}
