use crate::shared::media_format::{PixelFormat, SampleFormat};

/// Outcome of matching what the timeline delivers against what an encoder accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Negotiated<F> {
    pub source: F,
    pub target: F,
}

impl<F: PartialEq> Negotiated<F> {
    pub fn needs_conversion(&self) -> bool {
        self.source != self.target
    }
}

/// Picks the encoder pixel format for a source layout.
///
/// An encoder that advertises nothing is assumed to take YUV 4:2:0. The
/// source layout wins when accepted, then YUV 4:2:0, then the encoder's
/// first preference.
pub fn negotiate_pixel_format(
    source: PixelFormat,
    supported: &[PixelFormat],
) -> Negotiated<PixelFormat> {
    let target = pick(source, supported, PixelFormat::Yuv420p);
    Negotiated { source, target }
}

/// Picks the encoder sample format; timeline audio is always interleaved S16.
pub fn negotiate_sample_format(
    source: SampleFormat,
    supported: &[SampleFormat],
) -> Negotiated<SampleFormat> {
    let target = pick(source, supported, SampleFormat::S16);
    Negotiated { source, target }
}

fn pick<F: Copy + PartialEq>(source: F, supported: &[F], preferred: F) -> F {
    if supported.is_empty() {
        return preferred;
    }
    if supported.contains(&source) {
        return source;
    }
    if supported.contains(&preferred) {
        return preferred;
    }
    supported[0]
}

/// One encoder-ready audio frame, laid out in the encoder's sample format.
///
/// Packed formats use a single plane; planar formats one plane per channel.
/// Samples are native-endian.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    pub format: SampleFormat,
    pub channels: u16,
    pub samples_per_channel: usize,
    pub planes: Vec<Vec<u8>>,
}

/// Converts interleaved S16 samples into `format`.
pub fn convert_samples(interleaved: &[i16], channels: u16, format: SampleFormat) -> SampleBuffer {
    let channel_count = channels as usize;
    let samples_per_channel = interleaved.len() / channel_count.max(1);
    let encode = |s: i16| -> Vec<u8> {
        match format {
            SampleFormat::S16 | SampleFormat::S16Planar => s.to_ne_bytes().to_vec(),
            SampleFormat::S32 | SampleFormat::S32Planar => {
                (i32::from(s) << 16).to_ne_bytes().to_vec()
            }
            SampleFormat::F32 | SampleFormat::F32Planar => {
                (f32::from(s) / 32768.0).to_ne_bytes().to_vec()
            }
        }
    };

    let planes = if format.is_planar() {
        (0..channel_count)
            .map(|c| {
                interleaved
                    .iter()
                    .skip(c)
                    .step_by(channel_count)
                    .flat_map(|s| encode(*s))
                    .collect()
            })
            .collect()
    } else {
        vec![interleaved.iter().flat_map(|s| encode(*s)).collect()]
    };

    SampleBuffer {
        format,
        channels,
        samples_per_channel,
        planes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], PixelFormat::Yuv420p, true)]
    #[case(&[PixelFormat::Rgb24, PixelFormat::Yuv420p], PixelFormat::Rgb24, false)]
    #[case(&[PixelFormat::Yuv422p, PixelFormat::Yuv420p], PixelFormat::Yuv420p, true)]
    #[case(&[PixelFormat::Yuvj420p, PixelFormat::Yuv444p], PixelFormat::Yuvj420p, true)]
    fn test_negotiate_pixel_format(
        #[case] supported: &[PixelFormat],
        #[case] expected: PixelFormat,
        #[case] converts: bool,
    ) {
        let negotiated = negotiate_pixel_format(PixelFormat::Rgb24, supported);
        assert_eq!(negotiated.target, expected);
        assert_eq!(negotiated.needs_conversion(), converts);
    }

    #[test]
    fn test_empty_list_without_rgb_source() {
        let negotiated = negotiate_pixel_format(PixelFormat::Yuv420p, &[]);
        assert!(!negotiated.needs_conversion());
    }

    #[rstest]
    #[case(&[SampleFormat::S16], SampleFormat::S16)]
    #[case(&[SampleFormat::F32Planar], SampleFormat::F32Planar)]
    #[case(&[SampleFormat::S16Planar, SampleFormat::F32Planar], SampleFormat::S16Planar)]
    #[case(&[], SampleFormat::S16)]
    fn test_negotiate_sample_format(#[case] supported: &[SampleFormat], #[case] expected: SampleFormat) {
        assert_eq!(
            negotiate_sample_format(SampleFormat::S16, supported).target,
            expected
        );
    }

    #[test]
    fn test_convert_to_packed_s16_keeps_interleave() {
        let buffer = convert_samples(&[1, -1, 2, -2], 2, SampleFormat::S16);
        assert_eq!(buffer.samples_per_channel, 2);
        assert_eq!(buffer.planes.len(), 1);
        let expected: Vec<u8> = [1i16, -1, 2, -2]
            .iter()
            .flat_map(|s| s.to_ne_bytes())
            .collect();
        assert_eq!(buffer.planes[0], expected);
    }

    #[test]
    fn test_convert_to_planar_float_splits_channels() {
        let buffer = convert_samples(&[16384, -32768, 0, 0], 2, SampleFormat::F32Planar);
        assert_eq!(buffer.planes.len(), 2);
        let left: Vec<f32> = buffer.planes[0]
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let right: Vec<f32> = buffer.planes[1]
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(left, vec![0.5, 0.0]);
        assert_eq!(right, vec![-1.0, 0.0]);
    }
}
