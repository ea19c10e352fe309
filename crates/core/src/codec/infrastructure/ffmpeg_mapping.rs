use ffmpeg_next::codec::Id;
use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::{Pixel, Sample};
use ffmpeg_next::ChannelLayout;

use crate::codec::domain::codec::CodecId;
use crate::shared::media_format::{PixelFormat, SampleFormat};
use crate::shared::time::Rational;

pub fn codec_id(id: CodecId) -> Id {
    match id {
        CodecId::None => Id::None,
        CodecId::Mpeg2Video => Id::MPEG2VIDEO,
        CodecId::Mpeg1Video => Id::MPEG1VIDEO,
        CodecId::DvVideo => Id::DVVIDEO,
        CodecId::H264 => Id::H264,
        CodecId::Mjpeg => Id::MJPEG,
        CodecId::Mpeg4 => Id::MPEG4,
        CodecId::MsMpeg4V3 => Id::MSMPEG4V3,
        CodecId::RawVideo => Id::RAWVIDEO,
        CodecId::Theora => Id::THEORA,
        CodecId::Vp8 => Id::VP8,
        CodecId::PcmS16Le => Id::PCM_S16LE,
        CodecId::Mp2 => Id::MP2,
        CodecId::Mp3 => Id::MP3,
        CodecId::Aac => Id::AAC,
        CodecId::Ac3 => Id::AC3,
        CodecId::Vorbis => Id::VORBIS,
        CodecId::Flac => Id::FLAC,
    }
}

pub fn pixel(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuvj420p => Pixel::YUVJ420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
    }
}

/// `None` for layouts the render path does not handle.
pub fn pixel_format(pixel: Pixel) -> Option<PixelFormat> {
    match pixel {
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUVJ420P => Some(PixelFormat::Yuvj420p),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        _ => None,
    }
}

pub fn sample(format: SampleFormat) -> Sample {
    match format {
        SampleFormat::S16 => Sample::I16(SampleType::Packed),
        SampleFormat::S16Planar => Sample::I16(SampleType::Planar),
        SampleFormat::S32 => Sample::I32(SampleType::Packed),
        SampleFormat::S32Planar => Sample::I32(SampleType::Planar),
        SampleFormat::F32 => Sample::F32(SampleType::Packed),
        SampleFormat::F32Planar => Sample::F32(SampleType::Planar),
    }
}

pub fn sample_format(sample: Sample) -> Option<SampleFormat> {
    match sample {
        Sample::I16(SampleType::Packed) => Some(SampleFormat::S16),
        Sample::I16(SampleType::Planar) => Some(SampleFormat::S16Planar),
        Sample::I32(SampleType::Packed) => Some(SampleFormat::S32),
        Sample::I32(SampleType::Planar) => Some(SampleFormat::S32Planar),
        Sample::F32(SampleType::Packed) => Some(SampleFormat::F32),
        Sample::F32(SampleType::Planar) => Some(SampleFormat::F32Planar),
        _ => None,
    }
}

pub fn rational(value: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational(value.num, value.den)
}

/// Standard speaker layout for a channel count.
pub fn channel_layout(channels: u16) -> Option<ChannelLayout> {
    match channels {
        1 => Some(ChannelLayout::MONO),
        2 => Some(ChannelLayout::STEREO),
        3 => Some(ChannelLayout::SURROUND),
        4 => Some(ChannelLayout::QUAD),
        5 => Some(ChannelLayout::_5POINT0),
        6 => Some(ChannelLayout::_5POINT1),
        7 => Some(ChannelLayout::_6POINT1),
        8 => Some(ChannelLayout::_7POINT1),
        _ => None,
    }
}
