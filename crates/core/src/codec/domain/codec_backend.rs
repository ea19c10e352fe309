use std::path::Path;

use super::capability::CodecSupport;
use super::codec::{Codec, CodecId};
use super::format_negotiation::SampleBuffer;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;
use crate::shared::media_format::{PixelFormat, SampleFormat};
use crate::shared::time::Rational;

/// What a backend needs to open an output container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    pub format_name: String,
    pub video_codec: CodecId,
    pub audio_codec: CodecId,
}

/// Formats and rates an encoder advertises. Empty lists mean "anything".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderCapabilities {
    pub pixel_formats: Vec<PixelFormat>,
    pub sample_formats: Vec<SampleFormat>,
    pub sample_rates: Vec<u32>,
}

pub struct VideoStreamConfig<'a> {
    pub codec: &'a Codec,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub pixel_format: PixelFormat,
    /// Overrides the container's codec tag (FourCC).
    pub codec_tag: Option<u32>,
}

pub struct AudioStreamConfig<'a> {
    pub codec: &'a Codec,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

/// Result of handing one unit to an encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The encoder kept the input for look-ahead; nothing was written.
    Buffered,
    Written { packets: usize, key_frame: bool },
}

/// An open output file with its encoders.
///
/// Dropping the sink releases every backend resource it holds, whether or
/// not `finish` ran.
pub trait ContainerSink: Send {
    fn add_video_stream(&mut self, config: &VideoStreamConfig<'_>) -> Result<(), RenderError>;

    /// Returns the samples per channel the encoder requires per frame; 0 when any size works.
    fn add_audio_stream(&mut self, config: &AudioStreamConfig<'_>) -> Result<usize, RenderError>;

    fn write_header(&mut self) -> Result<(), RenderError>;

    fn encode_video(&mut self, frame: &Frame) -> Result<EncodeOutcome, RenderError>;

    fn encode_audio(&mut self, samples: &SampleBuffer) -> Result<EncodeOutcome, RenderError>;

    /// Drains every encoder and writes the trailer. A failing stream does
    /// not keep the others from being drained.
    fn finish(&mut self) -> Result<(), RenderError>;
}

pub trait PixelConverter: Send {
    fn convert(&mut self, frame: &Frame) -> Result<Frame, RenderError>;
}

/// The codec library as seen by the render subsystem.
pub trait CodecBackend: Send + Sync {
    /// Whether `codec` can be stored in the container named `container`.
    fn query_codec(&self, container: &str, codec: CodecId) -> CodecSupport;

    /// `None` when the library has no encoder for `codec`.
    fn encoder_capabilities(&self, codec: CodecId) -> Option<EncoderCapabilities>;

    fn create_container(
        &self,
        spec: &ContainerSpec,
        path: &Path,
    ) -> Result<Box<dyn ContainerSink>, RenderError>;

    fn pixel_converter(
        &self,
        source: PixelFormat,
        target: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn PixelConverter>, RenderError>;
}
