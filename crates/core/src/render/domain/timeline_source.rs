use crate::shared::audio_chunk::AudioChunk;
use crate::shared::frame::Frame;
use crate::shared::media_format::PixelFormat;
use crate::shared::render_properties::RenderProperties;
use crate::shared::time::Pts;

/// One clip (or empty stretch) on a track, as a half-open `[start, end)` range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipSpan {
    pub start: Pts,
    pub end: Pts,
    /// True for empty placeholder regions between real clips.
    pub gap: bool,
}

impl ClipSpan {
    pub fn clip(start: Pts, end: Pts) -> Self {
        Self {
            start,
            end,
            gap: false,
        }
    }

    pub fn gap(start: Pts, end: Pts) -> Self {
        Self {
            start,
            end,
            gap: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackLayout {
    pub enabled: bool,
    pub clips: Vec<ClipSpan>,
}

impl TrackLayout {
    pub fn new(clips: Vec<ClipSpan>) -> Self {
        Self {
            enabled: true,
            clips,
        }
    }
}

/// The composed timeline of one sequence, pulled by presentation position.
///
/// Video and audio keep independent cursors; `seek` moves both.
pub trait TimelineSource: Send {
    fn name(&self) -> &str;

    /// Length in video frames.
    fn length(&self) -> Pts;

    fn properties(&self) -> RenderProperties;

    fn seek(&mut self, position: Pts);

    /// The next composed picture at the requested resolution, without any
    /// on-screen overlay. `None` past the end of the timeline.
    fn next_video_frame(&mut self, width: u32, height: u32) -> Option<Frame>;

    /// The next run of composed audio. `None` past the end of the timeline.
    fn next_audio_chunk(&mut self, sample_rate: u32, channels: u16) -> Option<AudioChunk>;

    /// Layout delivered by `next_video_frame`.
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgb24
    }

    /// Clip layout of every track, for cut detection.
    fn tracks(&self) -> Vec<TrackLayout>;

    /// An independent copy positioned at the start, for one render job.
    fn fork(&self) -> Box<dyn TimelineSource>;
}
