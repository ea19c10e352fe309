use super::codec::{Codec, CodecId, MediaKind};
use super::output_format::OutputFormat;
use super::parameter::{CodecParameter, MacroBlockDecision, ParameterId};
use crate::shared::constants::DEFAULT_CONTAINER;

const VIDEO_BIT_RATE_MIN: i32 = 500;
const VIDEO_BIT_RATE_MAX: i32 = 4_000_000;
const AUDIO_BIT_RATE_MIN: i32 = 8_000;
const AUDIO_BIT_RATE_MAX: i32 = 320_000;

/// The known codecs and output formats.
///
/// Built once at startup and passed around by reference. Every lookup
/// hands out a clone, so editing a job's codec never touches the catalog.
#[derive(Clone, Debug)]
pub struct CodecCatalog {
    video_codecs: Vec<Codec>,
    audio_codecs: Vec<Codec>,
    formats: Vec<OutputFormat>,
}

impl CodecCatalog {
    pub fn standard() -> Self {
        let video_codecs = standard_video_codecs();
        let audio_codecs = standard_audio_codecs();
        let mut catalog = Self {
            video_codecs,
            audio_codecs,
            formats: Vec::new(),
        };
        let formats = standard_formats()
            .into_iter()
            .map(|mut format| {
                format.apply_default_codecs(&catalog);
                format
            })
            .collect();
        catalog.formats = formats;
        catalog
    }

    pub fn video_codec(&self, id: CodecId) -> Option<Codec> {
        self.video_codecs.iter().find(|c| c.id() == id).cloned()
    }

    pub fn audio_codec(&self, id: CodecId) -> Option<Codec> {
        self.audio_codecs.iter().find(|c| c.id() == id).cloned()
    }

    pub fn video_codecs(&self) -> &[Codec] {
        &self.video_codecs
    }

    pub fn audio_codecs(&self) -> &[Codec] {
        &self.audio_codecs
    }

    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    /// Case-insensitive lookup by container short name.
    pub fn format(&self, short_name: &str) -> Option<OutputFormat> {
        self.formats
            .iter()
            .find(|f| f.short_name().eq_ignore_ascii_case(short_name))
            .cloned()
    }

    pub fn format_by_extension(&self, extension: &str) -> Option<OutputFormat> {
        self.formats
            .iter()
            .find(|f| f.accepts_extension(extension))
            .cloned()
    }

    pub fn default_format(&self) -> OutputFormat {
        self.format(DEFAULT_CONTAINER)
            .expect("default container is part of the standard catalog")
    }
}

fn video_bit_rate() -> CodecParameter {
    CodecParameter::int(
        ParameterId::BitRate,
        VIDEO_BIT_RATE_MIN,
        VIDEO_BIT_RATE_MAX,
        VIDEO_BIT_RATE_MAX,
    )
    .enabled()
}

fn audio_bit_rate(default: i32) -> CodecParameter {
    CodecParameter::int(
        ParameterId::AudioBitRate,
        AUDIO_BIT_RATE_MIN,
        AUDIO_BIT_RATE_MAX,
        default,
    )
    .enabled()
}

fn standard_video_codecs() -> Vec<Codec> {
    let video = |id| Codec::new(MediaKind::Video, id);
    vec![
        Codec::none(MediaKind::Video),
        video(CodecId::Mpeg2Video)
            .add_parameter(&video_bit_rate())
            .add_parameter(&CodecParameter::int(ParameterId::BFrames, 0, 16, 0).enabled()),
        video(CodecId::Mpeg1Video)
            .add_parameter(&video_bit_rate())
            .add_parameter(
                &CodecParameter::enumerated(
                    ParameterId::MacroBlockDecision,
                    MacroBlockDecision::options(),
                    MacroBlockDecision::RateDistortion as i32,
                )
                .enabled(),
            ),
        video(CodecId::DvVideo).add_parameter(&video_bit_rate()),
        video(CodecId::H264).add_parameter(&video_bit_rate()),
        video(CodecId::Mjpeg).add_parameter(&video_bit_rate()),
        video(CodecId::Mpeg4)
            .add_parameter(&video_bit_rate())
            .add_parameter(
                &CodecParameter::int(ParameterId::BitRateTolerance, 0, 8_000_000, 4_000_000)
                    .enabled(),
            )
            .add_parameter(&CodecParameter::int(ParameterId::GopSize, 0, 300, 12).enabled())
            .add_parameter(&CodecParameter::int(ParameterId::BFrames, 0, 16, 0).enabled()),
        video(CodecId::MsMpeg4V3).add_parameter(&video_bit_rate()),
        video(CodecId::RawVideo).add_parameter(&video_bit_rate()),
        video(CodecId::Theora).add_parameter(&video_bit_rate()),
        video(CodecId::Vp8).add_parameter(&video_bit_rate()),
    ]
}

fn standard_audio_codecs() -> Vec<Codec> {
    let audio = |id| Codec::new(MediaKind::Audio, id);
    vec![
        Codec::none(MediaKind::Audio),
        audio(CodecId::PcmS16Le),
        audio(CodecId::Mp2).add_parameter(&audio_bit_rate(192_000)),
        audio(CodecId::Mp3).add_parameter(&audio_bit_rate(128_000)),
        audio(CodecId::Aac).add_parameter(&audio_bit_rate(128_000)),
        audio(CodecId::Ac3).add_parameter(&audio_bit_rate(192_000)),
        audio(CodecId::Vorbis).add_parameter(&audio_bit_rate(128_000)),
        audio(CodecId::Flac),
    ]
}

fn standard_formats() -> Vec<OutputFormat> {
    use CodecId as C;
    vec![
        OutputFormat::new("avi", "AVI (Audio Video Interleaved)", &["avi"], C::Mpeg4, C::Mp2),
        OutputFormat::new("mp4", "MP4 (MPEG-4 Part 14)", &["mp4", "m4v"], C::H264, C::Aac),
        OutputFormat::new("mov", "QuickTime / MOV", &["mov"], C::H264, C::Aac),
        OutputFormat::new("matroska", "Matroska", &["mkv"], C::H264, C::Ac3),
        OutputFormat::new("ogg", "Ogg", &["ogg", "ogv"], C::Theora, C::Vorbis),
        OutputFormat::new("mpeg", "MPEG-1 Systems / MPEG program stream", &["mpg", "mpeg"], C::Mpeg1Video, C::Mp2),
        OutputFormat::new("webm", "WebM", &["webm"], C::Vp8, C::Vorbis),
        OutputFormat::new("dv", "DV (Digital Video)", &["dv"], C::DvVideo, C::PcmS16Le),
        OutputFormat::new("wav", "WAV / WAVE (Waveform Audio)", &["wav"], C::None, C::PcmS16Le),
        OutputFormat::new("mp3", "MP3 (MPEG audio layer 3)", &["mp3"], C::None, C::Mp3),
        OutputFormat::new("flac", "Raw FLAC", &["flac"], C::None, C::Flac),
    ]
}
