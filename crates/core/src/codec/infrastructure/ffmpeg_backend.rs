use std::ffi::CString;
use std::os::raw::c_int;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::ffmpeg_container::FfmpegContainer;
use super::ffmpeg_mapping;
use super::ffmpeg_pixel_converter::FfmpegPixelConverter;
use crate::codec::domain::capability::CodecSupport;
use crate::codec::domain::codec::CodecId;
use crate::codec::domain::codec_backend::{
    CodecBackend, ContainerSink, ContainerSpec, EncoderCapabilities, PixelConverter,
};
use crate::shared::error::RenderError;
use crate::shared::media_format::PixelFormat;

/// `FF_COMPLIANCE_NORMAL`
const STRICT_NORMAL: c_int = 0;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();
static OPEN_LOCK: Mutex<()> = Mutex::new(());

/// Runs an encoder open under the process-wide lock. Encoding and writing
/// need no lock.
pub(crate) fn with_open_lock<T>(open: impl FnOnce() -> T) -> T {
    let _guard = OPEN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    open()
}

/// The codec backend on top of the ffmpeg libraries.
pub struct FfmpegBackend {
    _private: (),
}

impl FfmpegBackend {
    /// Initializes ffmpeg once per process.
    pub fn new() -> Result<Self, RenderError> {
        INIT.get_or_init(|| ffmpeg_next::init().map_err(|e| e.to_string()))
            .clone()
            .map_err(|message| RenderError::BackendUnavailable { message })?;
        Ok(Self { _private: () })
    }
}

impl CodecBackend for FfmpegBackend {
    fn query_codec(&self, container: &str, codec: CodecId) -> CodecSupport {
        let Ok(name) = CString::new(container) else {
            return CodecSupport::Unsupported;
        };
        let result = unsafe {
            let format = ffmpeg_next::ffi::av_guess_format(
                name.as_ptr(),
                std::ptr::null(),
                std::ptr::null(),
            );
            if format.is_null() {
                return CodecSupport::Unsupported;
            }
            ffmpeg_next::ffi::avformat_query_codec(
                format,
                ffmpeg_mapping::codec_id(codec).into(),
                STRICT_NORMAL,
            )
        };
        CodecSupport::from_query_result(result)
    }

    fn encoder_capabilities(&self, codec: CodecId) -> Option<EncoderCapabilities> {
        let encoder = ffmpeg_next::encoder::find(ffmpeg_mapping::codec_id(codec))?;
        let mut capabilities = EncoderCapabilities::default();
        if let Ok(video) = encoder.video() {
            if let Some(formats) = video.formats() {
                capabilities.pixel_formats = formats.filter_map(ffmpeg_mapping::pixel_format).collect();
            }
        } else if let Ok(audio) = encoder.audio() {
            if let Some(formats) = audio.formats() {
                capabilities.sample_formats =
                    formats.filter_map(ffmpeg_mapping::sample_format).collect();
            }
            if let Some(rates) = audio.rates() {
                capabilities.sample_rates = rates.filter(|r| *r > 0).map(|r| r as u32).collect();
            }
        }
        Some(capabilities)
    }

    fn create_container(
        &self,
        spec: &ContainerSpec,
        path: &Path,
    ) -> Result<Box<dyn ContainerSink>, RenderError> {
        Ok(Box::new(FfmpegContainer::create(spec, path)?))
    }

    fn pixel_converter(
        &self,
        source: PixelFormat,
        target: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn PixelConverter>, RenderError> {
        Ok(Box::new(FfmpegPixelConverter::new(
            source, target, width, height,
        )?))
    }
}
