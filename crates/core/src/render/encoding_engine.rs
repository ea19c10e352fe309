use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::codec::domain::codec::{Codec, MediaKind};
use crate::codec::domain::codec_backend::{
    AudioStreamConfig, CodecBackend, ContainerSink, EncodeOutcome, PixelConverter,
    VideoStreamConfig,
};
use crate::codec::domain::format_negotiation::{
    convert_samples, negotiate_pixel_format, negotiate_sample_format,
};
use crate::codec::domain::output_format::OutputFormat;
use crate::render::domain::audio_packer::AudioPacker;
use crate::render::domain::timeline_source::TimelineSource;
use crate::shared::constants::FALLBACK_AUDIO_FRAME_SIZE;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;
use crate::shared::media_format::{PixelFormat, SampleFormat};
use crate::shared::render_properties::RenderProperties;
use crate::shared::time::{pts_to_seconds, seconds_to_pts, Pts, Rational, StreamClock};

/// Per-run knobs that come from user settings rather than the render configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineSettings {
    /// Caps the rendered range to this many seconds.
    pub max_render_length: Option<f64>,
    /// Codec tag (FourCC) forced onto the video stream.
    pub codec_tag: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Opened,
    Encoding,
    Flushing,
    Closed,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Opened => "opened",
            Self::Encoding => "encoding",
            Self::Flushing => "flushing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Encoded units out of the units a job will encode, polled from other threads.
#[derive(Debug, Default)]
pub struct RenderProgress {
    done: AtomicU64,
    total: AtomicU64,
}

impl RenderProgress {
    pub fn reset(&self, total: u64) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn advance(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Between 0 and 1; 0 before the job knows its size.
    pub fn fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.done() as f64 / total as f64).min(1.0),
        }
    }
}

/// What one finished run produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodeReport {
    pub video_frames: u64,
    pub audio_frames: u64,
    pub video_seconds: f64,
    pub audio_seconds: f64,
    pub packets: usize,
}

struct VideoLane {
    clock: StreamClock,
    width: u32,
    height: u32,
    source_format: PixelFormat,
    converter: Option<Box<dyn PixelConverter>>,
    last: Option<Frame>,
    exhausted: bool,
}

impl VideoLane {
    /// The next source picture; past the end of the timeline the last one
    /// repeats, or black when there never was one.
    fn next_frame(&mut self, source: &mut dyn TimelineSource) -> Frame {
        if !self.exhausted {
            match source.next_video_frame(self.width, self.height) {
                Some(frame) => {
                    self.last = Some(frame.clone());
                    return frame;
                }
                None => {
                    log::debug!("Timeline video ended; repeating last frame");
                    self.exhausted = true;
                }
            }
        }
        match &self.last {
            Some(frame) => frame.clone().with_forced_key_frame(false),
            None => Frame::new(
                vec![0; self.source_format.buffer_size(self.width, self.height)],
                self.width,
                self.height,
                self.source_format,
                0,
            ),
        }
    }
}

struct AudioLane {
    clock: StreamClock,
    packer: AudioPacker,
    channels: u16,
    format: SampleFormat,
}

/// Pulls one sequence range through the codec backend into one output file.
///
/// Single-use: `Idle → Opened → Encoding → Flushing → Closed`, or `Failed`
/// from any state after `Idle`. A failed run removes the partial file.
pub struct EncodingEngine<'a> {
    backend: &'a dyn CodecBackend,
    settings: EngineSettings,
    state: EngineState,
    progress: Arc<RenderProgress>,
}

impl<'a> EncodingEngine<'a> {
    pub fn new(backend: &'a dyn CodecBackend, settings: EngineSettings) -> Self {
        Self {
            backend,
            settings,
            state: EngineState::Idle,
            progress: Arc::new(RenderProgress::default()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<RenderProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn progress(&self) -> Arc<RenderProgress> {
        self.progress.clone()
    }

    pub fn run(
        &mut self,
        format: &OutputFormat,
        output: &Path,
        range: Range<Pts>,
        source: &mut dyn TimelineSource,
        cancel: &AtomicBool,
    ) -> Result<EncodeReport, RenderError> {
        if self.state != EngineState::Idle {
            return Err(RenderError::InvalidState {
                state: self.state.to_string(),
            });
        }
        if !format.store_video() && !format.store_audio() {
            return Err(RenderError::NothingToRender);
        }
        let properties = source.properties();
        properties.validate()?;
        let range = self.clamp_range(range, properties.frame_rate);
        if range.is_empty() {
            return Err(RenderError::EmptyRange {
                start: range.start,
                end: range.end,
                length: source.length(),
            });
        }

        let mut created = false;
        let result = self.encode(format, output, range, &properties, source, cancel, &mut created);
        match result {
            Ok(report) => {
                self.state = EngineState::Closed;
                log::info!(
                    "Wrote {} ({} video frames, {} audio frames, {} packets)",
                    output.display(),
                    report.video_frames,
                    report.audio_frames,
                    report.packets
                );
                Ok(report)
            }
            Err(e) => {
                self.state = EngineState::Failed;
                if created {
                    remove_partial(output);
                }
                Err(e)
            }
        }
    }

    fn clamp_range(&self, range: Range<Pts>, frame_rate: Rational) -> Range<Pts> {
        match self.settings.max_render_length {
            Some(seconds) => {
                let end = range.end.min(range.start + seconds_to_pts(seconds, frame_rate));
                if end < range.end {
                    log::info!("Render limited to {seconds} s ({} frames)", end - range.start);
                }
                range.start..end
            }
            None => range,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn encode(
        &mut self,
        format: &OutputFormat,
        output: &Path,
        range: Range<Pts>,
        properties: &RenderProperties,
        source: &mut dyn TimelineSource,
        cancel: &AtomicBool,
        created: &mut bool,
    ) -> Result<EncodeReport, RenderError> {
        let mut sink = self.backend.create_container(&format.context(), output)?;
        *created = true;

        let mut video = match format.store_video() {
            true => Some(self.open_video(
                sink.as_mut(),
                format.video_codec(),
                properties,
                source.pixel_format(),
            )?),
            false => None,
        };
        let mut audio = match format.store_audio() {
            true => Some(self.open_audio(sink.as_mut(), format.audio_codec(), properties)?),
            false => None,
        };
        sink.write_header()?;
        self.state = EngineState::Opened;

        let end_seconds = pts_to_seconds(range.end - range.start, properties.frame_rate);
        self.progress
            .reset(total_units(end_seconds, video.as_ref(), audio.as_ref()));
        source.seek(range.start);
        self.state = EngineState::Encoding;

        let mut report = EncodeReport::default();
        loop {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Render of {} cancelled", output.display());
                return Err(RenderError::Cancelled);
            }
            let video_done = video
                .as_ref()
                .map_or(true, |v| v.clock.seconds() >= end_seconds);
            let audio_done = audio
                .as_ref()
                .map_or(true, |a| a.clock.seconds() >= end_seconds);
            if video_done && audio_done {
                break;
            }

            let audio_behind = match (&video, &audio) {
                (Some(v), Some(a)) => a.clock.seconds() < v.clock.seconds(),
                _ => true,
            };
            let outcome = match (&mut video, &mut audio) {
                (_, Some(lane)) if !audio_done && (video_done || audio_behind) => {
                    encode_audio_unit(sink.as_mut(), lane, source)?
                }
                (Some(lane), _) => encode_video_unit(sink.as_mut(), lane, source)?,
                (None, _) => unreachable!("video lane checked by video_done"),
            };
            if let EncodeOutcome::Written { packets, .. } = outcome {
                report.packets += packets;
            }
            self.progress.advance();
        }

        self.state = EngineState::Flushing;
        sink.finish()?;

        if let Some(lane) = &video {
            report.video_frames = lane.clock.units();
            report.video_seconds = lane.clock.seconds();
        }
        if let Some(lane) = &audio {
            report.audio_frames = lane.clock.units();
            report.audio_seconds = lane.clock.seconds();
        }
        Ok(report)
    }

    fn open_video(
        &self,
        sink: &mut dyn ContainerSink,
        codec: &Codec,
        properties: &RenderProperties,
        source_format: PixelFormat,
    ) -> Result<VideoLane, RenderError> {
        let capabilities = self
            .backend
            .encoder_capabilities(codec.id())
            .ok_or_else(|| {
                RenderError::encoder_open(MediaKind::Video, format!("no encoder for {}", codec.id()))
            })?;
        let negotiated = negotiate_pixel_format(source_format, &capabilities.pixel_formats);
        let converter = if negotiated.needs_conversion() {
            log::debug!(
                "Converting {} to {} for {}",
                negotiated.source.name(),
                negotiated.target.name(),
                codec.id()
            );
            let converter = self
                .backend
                .pixel_converter(
                    negotiated.source,
                    negotiated.target,
                    properties.width,
                    properties.height,
                )
                .map_err(|e| RenderError::encoder_open(MediaKind::Video, e.to_string()))?;
            Some(converter)
        } else {
            None
        };

        sink.add_video_stream(&VideoStreamConfig {
            codec,
            width: properties.width,
            height: properties.height,
            frame_rate: properties.frame_rate,
            pixel_format: negotiated.target,
            codec_tag: self.settings.codec_tag,
        })?;
        log::info!(
            "Video: {codec}, {}x{} @ {} fps",
            properties.width,
            properties.height,
            properties.frame_rate
        );

        Ok(VideoLane {
            clock: StreamClock::new(properties.frame_duration()),
            width: properties.width,
            height: properties.height,
            source_format,
            converter,
            last: None,
            exhausted: false,
        })
    }

    fn open_audio(
        &self,
        sink: &mut dyn ContainerSink,
        codec: &Codec,
        properties: &RenderProperties,
    ) -> Result<AudioLane, RenderError> {
        let capabilities = self
            .backend
            .encoder_capabilities(codec.id())
            .ok_or_else(|| {
                RenderError::encoder_open(MediaKind::Audio, format!("no encoder for {}", codec.id()))
            })?;
        let rate = properties.sample_rate;
        if !capabilities.sample_rates.is_empty() && !capabilities.sample_rates.contains(&rate) {
            return Err(RenderError::encoder_open(
                MediaKind::Audio,
                format!("sample rate {rate} rejected"),
            ));
        }
        let negotiated = negotiate_sample_format(SampleFormat::S16, &capabilities.sample_formats);

        let frame_size = sink.add_audio_stream(&AudioStreamConfig {
            codec,
            sample_rate: rate,
            channels: properties.channels,
            sample_format: negotiated.target,
        })?;
        let frame_size = match frame_size {
            0 => FALLBACK_AUDIO_FRAME_SIZE,
            n => n,
        };
        log::info!(
            "Audio: {codec}, {rate} Hz, {} channels, {} samples per frame ({})",
            properties.channels,
            frame_size,
            negotiated.target.name()
        );

        Ok(AudioLane {
            clock: StreamClock::new(Rational::new(frame_size as i32, rate as i32)),
            packer: AudioPacker::new(frame_size, rate, properties.channels),
            channels: properties.channels,
            format: negotiated.target,
        })
    }
}

fn encode_video_unit(
    sink: &mut dyn ContainerSink,
    lane: &mut VideoLane,
    source: &mut dyn TimelineSource,
) -> Result<EncodeOutcome, RenderError> {
    let mut frame = lane.next_frame(source);
    frame.set_pts(lane.clock.units() as Pts);
    if let Some(converter) = lane.converter.as_mut() {
        frame = converter.convert(&frame)?;
    }
    let outcome = sink.encode_video(&frame)?;
    if outcome == EncodeOutcome::Buffered {
        log::trace!("Video frame {} buffered by encoder", frame.pts());
    }
    lane.clock.advance();
    Ok(outcome)
}

fn encode_audio_unit(
    sink: &mut dyn ContainerSink,
    lane: &mut AudioLane,
    source: &mut dyn TimelineSource,
) -> Result<EncodeOutcome, RenderError> {
    let samples = lane.packer.fill(source);
    let buffer = convert_samples(&samples, lane.channels, lane.format);
    let outcome = sink.encode_audio(&buffer)?;
    lane.clock.advance();
    Ok(outcome)
}

fn total_units(end_seconds: f64, video: Option<&VideoLane>, audio: Option<&AudioLane>) -> u64 {
    video.map_or(0, |v| v.clock.units_to_reach(end_seconds))
        + audio.map_or(0, |a| a.clock.units_to_reach(end_seconds))
}

fn remove_partial(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => log::info!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial output {}: {e}", output.display()),
    }
}
