//! Backend, sink and timeline doubles shared by the render tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::codec::domain::capability::CodecSupport;
use crate::codec::domain::codec::CodecId;
use crate::codec::domain::codec_backend::{
    AudioStreamConfig, CodecBackend, ContainerSink, ContainerSpec, EncodeOutcome,
    EncoderCapabilities, PixelConverter, VideoStreamConfig,
};
use crate::codec::domain::format_negotiation::SampleBuffer;
use crate::render::domain::timeline_source::{TimelineSource, TrackLayout};
use crate::shared::audio_chunk::AudioChunk;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;
use crate::shared::media_format::{PixelFormat, SampleFormat};
use crate::shared::render_properties::RenderProperties;
use crate::shared::time::{pts_to_seconds, Pts};

#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    VideoStream {
        pixel_format: PixelFormat,
        codec_tag: Option<u32>,
    },
    AudioStream {
        sample_rate: u32,
        sample_format: SampleFormat,
    },
    Header,
    Video {
        pts: Pts,
        format: PixelFormat,
    },
    Audio {
        samples_per_channel: usize,
        format: SampleFormat,
    },
    Finish,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    pub capabilities: EncoderCapabilities,
    /// Reported by `add_audio_stream`; 0 means any size.
    pub audio_frame_size: usize,
    /// 1-based index of the encode call that fails.
    pub fail_encode_at: Option<usize>,
    /// Leading video frames the encoder keeps for look-ahead.
    pub buffered_video_frames: usize,
    pub unsupported: Vec<(String, CodecId)>,
    pub events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl StubBackend {
    pub fn new(audio_frame_size: usize) -> Self {
        Self {
            capabilities: EncoderCapabilities {
                pixel_formats: vec![PixelFormat::Rgb24, PixelFormat::Yuv420p],
                ..Default::default()
            },
            audio_frame_size,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn video_frames(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Video { .. }))
            .count()
    }

    pub fn audio_frames(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Audio { .. }))
            .count()
    }
}

impl CodecBackend for StubBackend {
    fn query_codec(&self, container: &str, codec: CodecId) -> CodecSupport {
        if self
            .unsupported
            .iter()
            .any(|(c, id)| c == container && *id == codec)
        {
            CodecSupport::Unsupported
        } else {
            CodecSupport::Supported
        }
    }

    fn encoder_capabilities(&self, _codec: CodecId) -> Option<EncoderCapabilities> {
        Some(self.capabilities.clone())
    }

    fn create_container(
        &self,
        _spec: &ContainerSpec,
        path: &Path,
    ) -> Result<Box<dyn ContainerSink>, RenderError> {
        std::fs::write(path, b"partial")?;
        Ok(Box::new(StubSink {
            frame_size: self.audio_frame_size,
            fail_encode_at: self.fail_encode_at,
            buffered_video_frames: self.buffered_video_frames,
            encode_calls: 0,
            video_calls: 0,
            events: self.events.clone(),
        }))
    }

    fn pixel_converter(
        &self,
        _source: PixelFormat,
        target: PixelFormat,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn PixelConverter>, RenderError> {
        Ok(Box::new(StubConverter { target }))
    }
}

struct StubSink {
    frame_size: usize,
    fail_encode_at: Option<usize>,
    buffered_video_frames: usize,
    encode_calls: usize,
    video_calls: usize,
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl StubSink {
    fn record(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn count_encode(&mut self) -> Result<(), RenderError> {
        self.encode_calls += 1;
        if self.fail_encode_at == Some(self.encode_calls) {
            return Err(RenderError::encode("stub write failed"));
        }
        Ok(())
    }
}

impl ContainerSink for StubSink {
    fn add_video_stream(&mut self, config: &VideoStreamConfig<'_>) -> Result<(), RenderError> {
        self.record(SinkEvent::VideoStream {
            pixel_format: config.pixel_format,
            codec_tag: config.codec_tag,
        });
        Ok(())
    }

    fn add_audio_stream(&mut self, config: &AudioStreamConfig<'_>) -> Result<usize, RenderError> {
        self.record(SinkEvent::AudioStream {
            sample_rate: config.sample_rate,
            sample_format: config.sample_format,
        });
        Ok(self.frame_size)
    }

    fn write_header(&mut self) -> Result<(), RenderError> {
        self.record(SinkEvent::Header);
        Ok(())
    }

    fn encode_video(&mut self, frame: &Frame) -> Result<EncodeOutcome, RenderError> {
        self.count_encode()?;
        self.video_calls += 1;
        self.record(SinkEvent::Video {
            pts: frame.pts(),
            format: frame.format(),
        });
        if self.video_calls <= self.buffered_video_frames {
            return Ok(EncodeOutcome::Buffered);
        }
        Ok(EncodeOutcome::Written {
            packets: 1,
            key_frame: frame.force_key_frame(),
        })
    }

    fn encode_audio(&mut self, samples: &SampleBuffer) -> Result<EncodeOutcome, RenderError> {
        self.count_encode()?;
        self.record(SinkEvent::Audio {
            samples_per_channel: samples.samples_per_channel,
            format: samples.format,
        });
        Ok(EncodeOutcome::Written {
            packets: 1,
            key_frame: true,
        })
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        self.record(SinkEvent::Finish);
        Ok(())
    }
}

struct StubConverter {
    target: PixelFormat,
}

impl PixelConverter for StubConverter {
    fn convert(&mut self, frame: &Frame) -> Result<Frame, RenderError> {
        let (w, h) = (frame.width(), frame.height());
        Ok(Frame::new(
            vec![0; self.target.buffer_size(w, h)],
            w,
            h,
            self.target,
            frame.pts(),
        )
        .with_forced_key_frame(frame.force_key_frame()))
    }
}

/// A timeline of black frames and a constant tone.
#[derive(Clone)]
pub struct StubSource {
    pub name: String,
    pub length: Pts,
    pub properties: RenderProperties,
    /// Frames the timeline actually yields; `length` when unset.
    pub video_frames: Option<Pts>,
    /// Samples per channel in each audio chunk.
    pub chunk_size: usize,
    pub tracks: Vec<TrackLayout>,
    video_position: Pts,
    audio_remaining: usize,
}

impl StubSource {
    pub fn new(name: &str, length: Pts, properties: RenderProperties) -> Self {
        let mut source = Self {
            name: name.to_string(),
            length,
            properties,
            video_frames: None,
            chunk_size: 500,
            tracks: Vec::new(),
            video_position: 0,
            audio_remaining: 0,
        };
        source.seek(0);
        source
    }

    pub fn small(length: Pts) -> Self {
        Self::new(
            "sequence",
            length,
            RenderProperties {
                width: 160,
                height: 120,
                sample_rate: 8_000,
                ..RenderProperties::default()
            },
        )
    }
}

impl TimelineSource for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> Pts {
        self.length
    }

    fn properties(&self) -> RenderProperties {
        self.properties
    }

    fn seek(&mut self, position: Pts) {
        self.video_position = position;
        let seconds = pts_to_seconds(self.length - position, self.properties.frame_rate);
        self.audio_remaining = (seconds * self.properties.sample_rate as f64).round() as usize;
    }

    fn next_video_frame(&mut self, width: u32, height: u32) -> Option<Frame> {
        if self.video_position >= self.video_frames.unwrap_or(self.length) {
            return None;
        }
        let frame = Frame::blank(width, height, self.video_position);
        self.video_position += 1;
        Some(frame)
    }

    fn next_audio_chunk(&mut self, _sample_rate: u32, channels: u16) -> Option<AudioChunk> {
        if self.audio_remaining == 0 {
            return None;
        }
        let n = self.chunk_size.min(self.audio_remaining);
        self.audio_remaining -= n;
        Some(AudioChunk::new(vec![1_000; n * channels as usize], channels))
    }

    fn tracks(&self) -> Vec<TrackLayout> {
        self.tracks.clone()
    }

    fn fork(&self) -> Box<dyn TimelineSource> {
        let mut copy = self.clone();
        copy.seek(0);
        Box::new(copy)
    }
}
