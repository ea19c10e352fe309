use serde::{Deserialize, Serialize};

/// Pixel layouts the render path knows how to produce or convert into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb24,
    Rgba,
    Yuv420p,
    Yuvj420p,
    Yuv422p,
    Yuv444p,
}

impl PixelFormat {
    /// Number of interleaved bytes per pixel for packed formats, `None` for planar ones.
    pub fn packed_channels(&self) -> Option<usize> {
        match self {
            Self::Rgb24 => Some(3),
            Self::Rgba => Some(4),
            _ => None,
        }
    }

    /// `(width, height)` of every plane for a picture of the given size.
    pub fn plane_sizes(&self, width: u32, height: u32) -> Vec<(usize, usize)> {
        let (w, h) = (width as usize, height as usize);
        match self {
            Self::Rgb24 => vec![(w * 3, h)],
            Self::Rgba => vec![(w * 4, h)],
            Self::Yuv420p | Self::Yuvj420p => {
                let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
                vec![(w, h), (cw, ch), (cw, ch)]
            }
            Self::Yuv422p => {
                let cw = w.div_ceil(2);
                vec![(w, h), (cw, h), (cw, h)]
            }
            Self::Yuv444p => vec![(w, h), (w, h), (w, h)],
        }
    }

    /// Total tightly packed byte size of a picture in this format.
    pub fn buffer_size(&self, width: u32, height: u32) -> usize {
        self.plane_sizes(width, height)
            .iter()
            .map(|(row, rows)| row * rows)
            .sum()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
            Self::Yuv420p => "yuv420p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
        }
    }
}

/// Audio sample layouts encoders may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    S16,
    S16Planar,
    S32,
    S32Planar,
    F32,
    F32Planar,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::S16 | Self::S16Planar => 2,
            Self::S32 | Self::S32Planar | Self::F32 | Self::F32Planar => 4,
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, Self::S16Planar | Self::S32Planar | Self::F32Planar)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::S16 => "s16",
            Self::S16Planar => "s16p",
            Self::S32 => "s32",
            Self::S32Planar => "s32p",
            Self::F32 => "flt",
            Self::F32Planar => "fltp",
        }
    }
}
