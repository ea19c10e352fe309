use std::path::{Path, PathBuf};

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::util::error::EAGAIN;
use ffmpeg_next::{encoder, picture, ChannelLayout, Dictionary, Packet, Rational};

use super::ffmpeg_backend::with_open_lock;
use super::ffmpeg_encoder_config::{AudioEncoderConfig, VideoEncoderConfig};
use super::{ffmpeg_frames, ffmpeg_mapping};
use crate::codec::domain::codec::MediaKind;
use crate::codec::domain::codec_backend::{
    AudioStreamConfig, ContainerSink, ContainerSpec, EncodeOutcome, VideoStreamConfig,
};
use crate::codec::domain::format_negotiation::SampleBuffer;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;

struct VideoStream {
    index: usize,
    encoder: encoder::video::Encoder,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    next_pts: i64,
}

struct AudioStream {
    index: usize,
    encoder: encoder::audio::Encoder,
    layout: ChannelLayout,
    rate: u32,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    next_pts: i64,
}

/// One output file being written through ffmpeg-next.
///
/// Streams are added first, then the header is written, then frames are
/// encoded in any interleaving. Packets go through `write_interleaved` so
/// the muxer orders them by timestamp.
pub struct FfmpegContainer {
    path: PathBuf,
    octx: Output,
    global_header: bool,
    video: Option<VideoStream>,
    audio: Option<AudioStream>,
    header_written: bool,
    finished: bool,
}

// Safety: a container is owned by one render job and only used from the
// thread running that job. The raw pointers inside ffmpeg types are not
// shared across threads.
unsafe impl Send for FfmpegContainer {}

impl FfmpegContainer {
    pub fn create(spec: &ContainerSpec, path: &Path) -> Result<Self, RenderError> {
        let octx = ffmpeg_next::format::output_as(path, &spec.format_name).map_err(|e| {
            RenderError::encode(format!(
                "can not create {} as '{}': {e}",
                path.display(),
                spec.format_name
            ))
        })?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);
        Ok(Self {
            path: path.to_path_buf(),
            octx,
            global_header,
            video: None,
            audio: None,
            header_written: false,
            finished: false,
        })
    }

    fn find_encoder(
        &self,
        kind: MediaKind,
        id: ffmpeg_next::codec::Id,
    ) -> Result<ffmpeg_next::Codec, RenderError> {
        encoder::find(id).ok_or_else(|| {
            RenderError::encoder_open(kind, format!("no {id:?} encoder in this ffmpeg build"))
        })
    }
}

impl ContainerSink for FfmpegContainer {
    fn add_video_stream(&mut self, config: &VideoStreamConfig<'_>) -> Result<(), RenderError> {
        let open_error = |e: ffmpeg_next::Error| RenderError::encoder_open(MediaKind::Video, e.to_string());
        let codec = self.find_encoder(
            MediaKind::Video,
            ffmpeg_mapping::codec_id(config.codec.id()),
        )?;

        let mut ost = self.octx.add_stream(Some(codec)).map_err(open_error)?;
        let index = ost.index();

        let mut encoder_ctx = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(open_error)?;

        let time_base = ffmpeg_mapping::rational(config.frame_rate.invert());
        encoder_ctx.set_width(config.width);
        encoder_ctx.set_height(config.height);
        encoder_ctx.set_format(ffmpeg_mapping::pixel(config.pixel_format));
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_mapping::rational(config.frame_rate)));
        config.codec.apply(&mut VideoEncoderConfig(&mut encoder_ctx));

        if self.global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = with_open_lock(|| encoder_ctx.open_with(Dictionary::new())).map_err(open_error)?;
        ost.set_parameters(&encoder);
        if let Some(tag) = config.codec_tag {
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = tag;
            }
        }

        log::debug!(
            "Video stream {index}: {} {}x{} @ {}",
            config.codec.id(),
            config.width,
            config.height,
            config.frame_rate
        );
        self.video = Some(VideoStream {
            index,
            encoder,
            encoder_time_base: time_base,
            stream_time_base: time_base,
            next_pts: 0,
        });
        Ok(())
    }

    fn add_audio_stream(&mut self, config: &AudioStreamConfig<'_>) -> Result<usize, RenderError> {
        let open_error = |e: ffmpeg_next::Error| RenderError::encoder_open(MediaKind::Audio, e.to_string());
        let codec = self.find_encoder(
            MediaKind::Audio,
            ffmpeg_mapping::codec_id(config.codec.id()),
        )?;
        let layout = ffmpeg_mapping::channel_layout(config.channels).ok_or_else(|| {
            RenderError::encoder_open(
                MediaKind::Audio,
                format!("no speaker layout for {} channels", config.channels),
            )
        })?;

        let mut ost = self.octx.add_stream(Some(codec)).map_err(open_error)?;
        let index = ost.index();

        let mut encoder_ctx = CodecContext::new_with_codec(codec)
            .encoder()
            .audio()
            .map_err(open_error)?;

        let time_base = Rational(1, config.sample_rate as i32);
        encoder_ctx.set_rate(config.sample_rate as i32);
        encoder_ctx.set_channel_layout(layout);
        encoder_ctx.set_format(ffmpeg_mapping::sample(config.sample_format));
        encoder_ctx.set_time_base(time_base);
        config.codec.apply(&mut AudioEncoderConfig(&mut encoder_ctx));

        if self.global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = with_open_lock(|| encoder_ctx.open_as(codec)).map_err(open_error)?;
        ost.set_parameters(&encoder);
        let frame_size = encoder.frame_size() as usize;

        log::debug!(
            "Audio stream {index}: {} {} Hz x{} frame size {frame_size}",
            config.codec.id(),
            config.sample_rate,
            config.channels
        );
        self.audio = Some(AudioStream {
            index,
            encoder,
            layout,
            rate: config.sample_rate,
            encoder_time_base: time_base,
            stream_time_base: time_base,
            next_pts: 0,
        });
        Ok(frame_size)
    }

    fn write_header(&mut self) -> Result<(), RenderError> {
        self.octx
            .write_header()
            .map_err(|e| RenderError::encode(format!("write header: {e}")))?;
        self.header_written = true;
        // The muxer may pick its own stream time bases while writing the header.
        if let Some(video) = self.video.as_mut() {
            if let Some(stream) = self.octx.stream(video.index) {
                video.stream_time_base = stream.time_base();
            }
        }
        if let Some(audio) = self.audio.as_mut() {
            if let Some(stream) = self.octx.stream(audio.index) {
                audio.stream_time_base = stream.time_base();
            }
        }
        Ok(())
    }

    fn encode_video(&mut self, frame: &Frame) -> Result<EncodeOutcome, RenderError> {
        let video = self
            .video
            .as_mut()
            .ok_or_else(|| RenderError::encode("no video stream"))?;
        let mut picture = ffmpeg_frames::to_video_frame(frame);
        picture.set_pts(Some(video.next_pts));
        if frame.force_key_frame() {
            picture.set_kind(picture::Type::I);
        }
        video
            .encoder
            .send_frame(&picture)
            .map_err(|e| RenderError::encode(format!("encode video frame: {e}")))?;
        video.next_pts += 1;
        drain(
            &mut video.encoder,
            &mut self.octx,
            video.index,
            video.encoder_time_base,
            video.stream_time_base,
        )
    }

    fn encode_audio(&mut self, samples: &SampleBuffer) -> Result<EncodeOutcome, RenderError> {
        let audio = self
            .audio
            .as_mut()
            .ok_or_else(|| RenderError::encode("no audio stream"))?;
        let frame = ffmpeg_frames::to_audio_frame(samples, audio.layout, audio.rate, audio.next_pts);
        audio
            .encoder
            .send_frame(&frame)
            .map_err(|e| RenderError::encode(format!("encode audio frame: {e}")))?;
        audio.next_pts += samples.samples_per_channel as i64;
        drain(
            &mut audio.encoder,
            &mut self.octx,
            audio.index,
            audio.encoder_time_base,
            audio.stream_time_base,
        )
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        if self.finished || !self.header_written {
            return Ok(());
        }
        self.finished = true;
        let mut first_error = None;

        if let Some(video) = self.video.as_mut() {
            if let Err(e) = flush(
                &mut video.encoder,
                &mut self.octx,
                video.index,
                video.encoder_time_base,
                video.stream_time_base,
            ) {
                log::warn!("Flushing video encoder failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = flush(
                &mut audio.encoder,
                &mut self.octx,
                audio.index,
                audio.encoder_time_base,
                audio.stream_time_base,
            ) {
                log::warn!("Flushing audio encoder failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        if let Err(e) = self.octx.write_trailer() {
            first_error.get_or_insert(RenderError::encode(format!("write trailer: {e}")));
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                log::debug!("Closed {}", self.path.display());
                Ok(())
            }
        }
    }
}

fn drain(
    encoder: &mut encoder::Encoder,
    octx: &mut Output,
    index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
) -> Result<EncodeOutcome, RenderError> {
    let mut packets = 0;
    let mut key_frame = false;
    let mut encoded = Packet::empty();
    while packet_ready(encoder.receive_packet(&mut encoded))? {
        key_frame |= encoded.is_key();
        encoded.set_stream(index);
        encoded.rescale_ts(encoder_time_base, stream_time_base);
        encoded
            .write_interleaved(octx)
            .map_err(|e| RenderError::encode(format!("write packet: {e}")))?;
        packets += 1;
    }
    Ok(if packets == 0 {
        EncodeOutcome::Buffered
    } else {
        EncodeOutcome::Written { packets, key_frame }
    })
}

/// `true` when a packet was received. Running dry (`EAGAIN`, or end of
/// stream after a flush) ends the drain; any other error fails the job.
fn packet_ready(result: Result<(), ffmpeg_next::Error>) -> Result<bool, RenderError> {
    match result {
        Ok(()) => Ok(true),
        Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => Ok(false),
        Err(ffmpeg_next::Error::Eof) => Ok(false),
        Err(e) => Err(RenderError::encode(format!("receive packet: {e}"))),
    }
}

fn flush(
    encoder: &mut encoder::Encoder,
    octx: &mut Output,
    index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
) -> Result<(), RenderError> {
    encoder
        .send_eof()
        .map_err(|e| RenderError::encode(format!("flush encoder: {e}")))?;
    drain(encoder, octx, index, encoder_time_base, stream_time_base)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::domain::catalog::CodecCatalog;
    use crate::codec::domain::codec::CodecId;
    use crate::codec::domain::format_negotiation::convert_samples;
    use crate::shared::media_format::{PixelFormat, SampleFormat};
    use crate::shared::time::Rational as DomainRational;

    fn spec(format: &str) -> ContainerSpec {
        ContainerSpec {
            format_name: format.to_string(),
            video_codec: CodecId::Mpeg4,
            audio_codec: CodecId::Mp2,
        }
    }

    fn yuv_frame(pts: i64) -> Frame {
        let size = PixelFormat::Yuv420p.buffer_size(160, 120);
        Frame::new(vec![128; size], 160, 120, PixelFormat::Yuv420p, pts)
    }

    fn open(path: &Path, format: &str) -> (FfmpegContainer, usize) {
        ffmpeg_next::init().unwrap();
        let catalog = CodecCatalog::standard();
        let video = catalog.video_codec(CodecId::Mpeg4).unwrap();
        let audio = catalog.audio_codec(CodecId::Mp2).unwrap();
        let mut container = FfmpegContainer::create(&spec(format), path).unwrap();
        container
            .add_video_stream(&VideoStreamConfig {
                codec: &video,
                width: 160,
                height: 120,
                frame_rate: DomainRational::new(25, 1),
                pixel_format: PixelFormat::Yuv420p,
                codec_tag: None,
            })
            .unwrap();
        let frame_size = container
            .add_audio_stream(&AudioStreamConfig {
                codec: &audio,
                sample_rate: 44_100,
                channels: 2,
                sample_format: SampleFormat::S16,
            })
            .unwrap();
        container.write_header().unwrap();
        (container, frame_size)
    }

    #[test]
    fn test_writes_interleaved_avi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.avi");
        let (mut container, frame_size) = open(&path, "avi");
        assert_eq!(frame_size, 1152);

        let silence = convert_samples(&vec![0; frame_size * 2], 2, SampleFormat::S16);
        for i in 0..10 {
            container.encode_video(&yuv_frame(i)).unwrap();
            container.encode_audio(&silence).unwrap();
        }
        container.finish().unwrap();

        let ictx = ffmpeg_next::format::input(&path).unwrap();
        assert_eq!(ictx.nb_streams(), 2);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_forced_key_frame_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mkv");
        let (mut container, _) = open(&path, "matroska");
        let outcome = container
            .encode_video(&yuv_frame(0).with_forced_key_frame(true))
            .unwrap();
        if let EncodeOutcome::Written { key_frame, .. } = outcome {
            assert!(key_frame);
        }
        container.finish().unwrap();
    }

    #[test]
    fn test_codec_tag_override_lands_in_file() {
        ffmpeg_next::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagged.avi");
        let video = CodecCatalog::standard()
            .video_codec(CodecId::Mpeg4)
            .unwrap();
        let mut container = FfmpegContainer::create(
            &ContainerSpec {
                format_name: "avi".to_string(),
                video_codec: CodecId::Mpeg4,
                audio_codec: CodecId::None,
            },
            &path,
        )
        .unwrap();
        let tag = u32::from_le_bytes(*b"XVID");
        container
            .add_video_stream(&VideoStreamConfig {
                codec: &video,
                width: 160,
                height: 120,
                frame_rate: DomainRational::new(25, 1),
                pixel_format: PixelFormat::Yuv420p,
                codec_tag: Some(tag),
            })
            .unwrap();
        container.write_header().unwrap();
        container.encode_video(&yuv_frame(0)).unwrap();
        container.finish().unwrap();

        let ictx = ffmpeg_next::format::input(&path).unwrap();
        let stream = ictx.stream(0).unwrap();
        let stored = unsafe { (*stream.parameters().as_ptr()).codec_tag };
        assert_eq!(stored, tag);
    }

    #[test]
    fn test_unknown_container_name_fails() {
        ffmpeg_next::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegContainer::create(&spec("no-such-muxer"), &dir.path().join("x.bin"));
        assert!(matches!(result, Err(RenderError::EncodeOrWriteError { .. })));
    }

    #[test]
    fn test_rejected_sample_rate_is_open_error() {
        ffmpeg_next::init().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let audio = CodecCatalog::standard().audio_codec(CodecId::Mp2).unwrap();
        let mut container =
            FfmpegContainer::create(&spec("avi"), &dir.path().join("bad.avi")).unwrap();
        let err = container
            .add_audio_stream(&AudioStreamConfig {
                codec: &audio,
                sample_rate: 12_345,
                channels: 2,
                sample_format: SampleFormat::S16,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::EncoderOpenError {
                stream: MediaKind::Audio,
                ..
            }
        ));
    }

    #[test]
    fn test_packet_ready_ends_on_eagain_and_eof() {
        assert!(packet_ready(Ok(())).unwrap());
        assert!(!packet_ready(Err(ffmpeg_next::Error::Other { errno: EAGAIN })).unwrap());
        assert!(!packet_ready(Err(ffmpeg_next::Error::Eof)).unwrap());
    }

    #[test]
    fn test_packet_ready_fails_on_encoder_error() {
        let err = packet_ready(Err(ffmpeg_next::Error::InvalidData)).unwrap_err();
        assert!(matches!(err, RenderError::EncodeOrWriteError { .. }));
        let err = packet_ready(Err(ffmpeg_next::Error::Other {
            errno: ffmpeg_next::util::error::EINVAL,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("receive packet"));
    }

    #[test]
    fn test_finish_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.avi");
        let (mut container, _) = open(&path, "avi");
        container.encode_video(&yuv_frame(0)).unwrap();
        container.finish().unwrap();
        assert!(container.finish().is_ok());
    }
}
