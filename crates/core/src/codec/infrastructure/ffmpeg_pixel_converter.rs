use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use super::{ffmpeg_frames, ffmpeg_mapping};
use crate::codec::domain::codec_backend::PixelConverter;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;
use crate::shared::media_format::PixelFormat;

/// Same-size pixel layout conversion through swscale.
pub struct FfmpegPixelConverter {
    scaler: Scaler,
    target: PixelFormat,
}

// Safety: the converter is owned by one render job and only used from the
// thread running that job.
unsafe impl Send for FfmpegPixelConverter {}

impl FfmpegPixelConverter {
    pub fn new(
        source: PixelFormat,
        target: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let scaler = Scaler::get(
            ffmpeg_mapping::pixel(source),
            width,
            height,
            ffmpeg_mapping::pixel(target),
            width,
            height,
            Flags::BICUBIC,
        )
        .map_err(|e| {
            RenderError::encode(format!(
                "no conversion from {} to {}: {e}",
                source.name(),
                target.name()
            ))
        })?;
        Ok(Self { scaler, target })
    }
}

impl PixelConverter for FfmpegPixelConverter {
    fn convert(&mut self, frame: &Frame) -> Result<Frame, RenderError> {
        let input = ffmpeg_frames::to_video_frame(frame);
        let mut output = VideoFrame::empty();
        self.scaler
            .run(&input, &mut output)
            .map_err(|e| RenderError::encode(format!("pixel conversion: {e}")))?;
        let mut converted = ffmpeg_frames::from_video_frame(&output, self.target)
            .with_forced_key_frame(frame.force_key_frame());
        converted.set_pts(frame.pts());
        Ok(converted)
    }
}
