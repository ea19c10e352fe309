use super::capability::CodecSupport;
use super::catalog::CodecCatalog;
use super::codec::{Codec, CodecId, MediaKind};
use super::codec_backend::{CodecBackend, ContainerSpec};
use crate::shared::error::RenderError;

/// A container type with its allowed extensions and current codec choice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    short_name: String,
    long_name: String,
    extensions: Vec<String>,
    default_video_codec: CodecId,
    default_audio_codec: CodecId,
    video_codec: Codec,
    audio_codec: Codec,
}

impl OutputFormat {
    /// The first extension is the preferred one.
    pub fn new(
        short_name: &str,
        long_name: &str,
        extensions: &[&str],
        default_video_codec: CodecId,
        default_audio_codec: CodecId,
    ) -> Self {
        debug_assert!(!extensions.is_empty(), "format {short_name} has no extension");
        Self {
            short_name: short_name.to_string(),
            long_name: long_name.to_string(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            default_video_codec,
            default_audio_codec,
            video_codec: Codec::none(MediaKind::Video),
            audio_codec: Codec::none(MediaKind::Audio),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn preferred_extension(&self) -> &str {
        &self.extensions[0]
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn default_video_codec(&self) -> CodecId {
        self.default_video_codec
    }

    pub fn default_audio_codec(&self) -> CodecId {
        self.default_audio_codec
    }

    pub fn video_codec(&self) -> &Codec {
        &self.video_codec
    }

    pub fn audio_codec(&self) -> &Codec {
        &self.audio_codec
    }

    pub fn video_codec_mut(&mut self) -> &mut Codec {
        &mut self.video_codec
    }

    pub fn audio_codec_mut(&mut self) -> &mut Codec {
        &mut self.audio_codec
    }

    pub fn store_video(&self) -> bool {
        !self.video_codec.is_none()
    }

    pub fn store_audio(&self) -> bool {
        !self.audio_codec.is_none()
    }

    /// Replaces the video codec without a compatibility check.
    pub fn set_video_codec(&mut self, codec: Codec) {
        assert_eq!(codec.kind(), MediaKind::Video, "not a video codec");
        self.video_codec = codec;
    }

    /// Replaces the audio codec without a compatibility check.
    pub fn set_audio_codec(&mut self, codec: Codec) {
        assert_eq!(codec.kind(), MediaKind::Audio, "not an audio codec");
        self.audio_codec = codec;
    }

    /// Resets both codecs to fresh copies of this format's defaults.
    pub fn apply_default_codecs(&mut self, catalog: &CodecCatalog) {
        self.video_codec = catalog
            .video_codec(self.default_video_codec)
            .unwrap_or_else(|| Codec::none(MediaKind::Video));
        self.audio_codec = catalog
            .audio_codec(self.default_audio_codec)
            .unwrap_or_else(|| Codec::none(MediaKind::Audio));
    }

    /// Three-valued verdict on storing `codec` in this container. The "none"
    /// codec is always supported.
    pub fn check_codec(&self, backend: &dyn CodecBackend, codec: CodecId) -> CodecSupport {
        if codec.is_none() {
            return CodecSupport::Supported;
        }
        let support = backend.query_codec(&self.short_name, codec);
        log::debug!("Codec {codec} in {}: {support}", self.short_name);
        support
    }

    pub fn select_video_codec(
        &mut self,
        codec: CodecId,
        catalog: &CodecCatalog,
        backend: &dyn CodecBackend,
        confirm_uncertain: bool,
    ) -> Result<(), RenderError> {
        self.gate(codec, backend, confirm_uncertain)?;
        self.video_codec = catalog
            .video_codec(codec)
            .ok_or_else(|| RenderError::UnknownCodec {
                name: codec.short_name().to_string(),
            })?;
        Ok(())
    }

    pub fn select_audio_codec(
        &mut self,
        codec: CodecId,
        catalog: &CodecCatalog,
        backend: &dyn CodecBackend,
        confirm_uncertain: bool,
    ) -> Result<(), RenderError> {
        self.gate(codec, backend, confirm_uncertain)?;
        self.audio_codec = catalog
            .audio_codec(codec)
            .ok_or_else(|| RenderError::UnknownCodec {
                name: codec.short_name().to_string(),
            })?;
        Ok(())
    }

    fn gate(
        &self,
        codec: CodecId,
        backend: &dyn CodecBackend,
        confirm_uncertain: bool,
    ) -> Result<(), RenderError> {
        match self.check_codec(backend, codec) {
            CodecSupport::Supported => Ok(()),
            CodecSupport::Uncertain if confirm_uncertain => {
                log::info!(
                    "Using {codec} in {} without a guarantee it is supported",
                    self.short_name
                );
                Ok(())
            }
            CodecSupport::Uncertain => Err(RenderError::UncertainCodecForContainer {
                codec: codec.short_name().to_string(),
                container: self.short_name.clone(),
            }),
            CodecSupport::Unsupported => Err(RenderError::UnsupportedCodecForContainer {
                codec: codec.short_name().to_string(),
                container: self.short_name.clone(),
            }),
        }
    }

    /// Backend description of the container with the selected codecs.
    pub fn context(&self) -> ContainerSpec {
        ContainerSpec {
            format_name: self.short_name.clone(),
            video_codec: self.video_codec.id(),
            audio_codec: self.audio_codec.id(),
        }
    }
}
