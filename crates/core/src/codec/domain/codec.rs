use super::encoder_config::EncoderConfig;
use super::parameter::{CodecParameter, ParameterId};
use crate::shared::error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        })
    }
}

/// Encoder identities the catalog knows about. `None` means "no stream".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    None,
    Mpeg2Video,
    Mpeg1Video,
    DvVideo,
    H264,
    Mjpeg,
    Mpeg4,
    MsMpeg4V3,
    RawVideo,
    Theora,
    Vp8,
    PcmS16Le,
    Mp2,
    Mp3,
    Aac,
    Ac3,
    Vorbis,
    Flac,
}

impl CodecId {
    pub const ALL: &[CodecId] = &[
        CodecId::None,
        CodecId::Mpeg2Video,
        CodecId::Mpeg1Video,
        CodecId::DvVideo,
        CodecId::H264,
        CodecId::Mjpeg,
        CodecId::Mpeg4,
        CodecId::MsMpeg4V3,
        CodecId::RawVideo,
        CodecId::Theora,
        CodecId::Vp8,
        CodecId::PcmS16Le,
        CodecId::Mp2,
        CodecId::Mp3,
        CodecId::Aac,
        CodecId::Ac3,
        CodecId::Vorbis,
        CodecId::Flac,
    ];

    /// Stream kind this codec produces; `None` for the "no codec" id.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            Self::None => None,
            Self::Mpeg2Video
            | Self::Mpeg1Video
            | Self::DvVideo
            | Self::H264
            | Self::Mjpeg
            | Self::Mpeg4
            | Self::MsMpeg4V3
            | Self::RawVideo
            | Self::Theora
            | Self::Vp8 => Some(MediaKind::Video),
            Self::PcmS16Le
            | Self::Mp2
            | Self::Mp3
            | Self::Aac
            | Self::Ac3
            | Self::Vorbis
            | Self::Flac => Some(MediaKind::Audio),
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg1Video => "mpeg1video",
            Self::DvVideo => "dvvideo",
            Self::H264 => "h264",
            Self::Mjpeg => "mjpeg",
            Self::Mpeg4 => "mpeg4",
            Self::MsMpeg4V3 => "msmpeg4v3",
            Self::RawVideo => "rawvideo",
            Self::Theora => "theora",
            Self::Vp8 => "vp8",
            Self::PcmS16Le => "pcm_s16le",
            Self::Mp2 => "mp2",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Ac3 => "ac3",
            Self::Vorbis => "vorbis",
            Self::Flac => "flac",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mpeg2Video => "MPEG-2 video",
            Self::Mpeg1Video => "MPEG-1 video",
            Self::DvVideo => "DV",
            Self::H264 => "H.264 / AVC",
            Self::Mjpeg => "Motion JPEG",
            Self::Mpeg4 => "MPEG-4 part 2",
            Self::MsMpeg4V3 => "MS MPEG-4 v3",
            Self::RawVideo => "Raw video",
            Self::Theora => "Theora",
            Self::Vp8 => "VP8",
            Self::PcmS16Le => "PCM signed 16-bit",
            Self::Mp2 => "MPEG audio layer 2",
            Self::Mp3 => "MPEG audio layer 3",
            Self::Aac => "AAC",
            Self::Ac3 => "AC-3",
            Self::Vorbis => "Vorbis",
            Self::Flac => "FLAC",
        }
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.short_name().eq_ignore_ascii_case(name))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for CodecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.short_name())
    }
}

/// An encoder choice for one stream kind plus its ordered parameters.
///
/// Equality is structural: same id and same parameter values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Codec {
    kind: MediaKind,
    id: CodecId,
    parameters: Vec<CodecParameter>,
}

impl Codec {
    pub fn new(kind: MediaKind, id: CodecId) -> Self {
        debug_assert!(
            id.kind().map_or(true, |k| k == kind),
            "codec {id} does not produce {kind}"
        );
        Self {
            kind,
            id,
            parameters: Vec::new(),
        }
    }

    pub fn none(kind: MediaKind) -> Self {
        Self::new(kind, CodecId::None)
    }

    /// Appends a copy of `parameter`; order of addition is the order of application.
    pub fn add_parameter(mut self, parameter: &CodecParameter) -> Self {
        self.parameters.push(parameter.clone());
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn id(&self) -> CodecId {
        self.id
    }

    pub fn is_none(&self) -> bool {
        self.id.is_none()
    }

    pub fn parameters(&self) -> &[CodecParameter] {
        &self.parameters
    }

    pub fn parameter(&self, id: ParameterId) -> Option<&CodecParameter> {
        self.parameters.iter().find(|p| p.id() == id)
    }

    pub fn parameter_mut(&mut self, id: ParameterId) -> Option<&mut CodecParameter> {
        self.parameters.iter_mut().find(|p| p.id() == id)
    }

    /// Validated parameter update.
    pub fn set_parameter_value(&mut self, id: ParameterId, value: i32) -> Result<(), RenderError> {
        let codec = self.id.short_name().to_string();
        self.parameter_mut(id)
            .ok_or(RenderError::ParameterNotFound {
                codec,
                parameter: id,
            })?
            .try_set_value(value)
    }

    /// Applies every parameter, in declaration order.
    pub fn apply(&self, config: &mut dyn EncoderConfig) {
        for parameter in &self.parameters {
            parameter.apply(config);
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id.display_name())?;
        for p in &self.parameters {
            write!(f, " {}={}", p.id().short_name(), p.value())?;
        }
        Ok(())
    }
}
