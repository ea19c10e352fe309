use ndarray::{ArrayView3, ArrayViewMut3};

use super::media_format::PixelFormat;
use super::time::Pts;

/// A single composed video picture, tightly packed plane after plane.
///
/// Timeline sources deliver RGB; the backend converts to the encoder's
/// native layout before encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    pts: Pts,
    force_key_frame: bool,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, pts: Pts) -> Self {
        debug_assert_eq!(
            data.len(),
            format.buffer_size(width, height),
            "data length must equal the buffer size of the pixel format"
        );
        Self {
            data,
            width,
            height,
            format,
            pts,
            force_key_frame: false,
        }
    }

    /// An all-black RGB picture.
    pub fn blank(width: u32, height: u32, pts: Pts) -> Self {
        let format = PixelFormat::Rgb24;
        Self::new(
            vec![0u8; format.buffer_size(width, height)],
            width,
            height,
            format,
            pts,
        )
    }

    pub fn with_forced_key_frame(mut self, force: bool) -> Self {
        self.force_key_frame = force;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pts(&self) -> Pts {
        self.pts
    }

    pub fn set_pts(&mut self, pts: Pts) {
        self.pts = pts;
    }

    pub fn force_key_frame(&self) -> bool {
        self.force_key_frame
    }

    /// Byte ranges of each plane inside `data()`, with the row length in bytes.
    pub fn planes(&self) -> Vec<(&[u8], usize)> {
        let mut offset = 0;
        self.format
            .plane_sizes(self.width, self.height)
            .into_iter()
            .map(|(row, rows)| {
                let plane = &self.data[offset..offset + row * rows];
                offset += row * rows;
                (plane, row)
            })
            .collect()
    }

    /// `(height, width, channels)` view of a packed picture; `None` for planar formats.
    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        let shape = self.packed_shape()?;
        ArrayView3::from_shape(shape, &self.data).ok()
    }

    pub fn as_ndarray_mut(&mut self) -> Option<ArrayViewMut3<'_, u8>> {
        let shape = self.packed_shape()?;
        ArrayViewMut3::from_shape(shape, &mut self.data).ok()
    }

    fn packed_shape(&self) -> Option<(usize, usize, usize)> {
        let channels = self.format.packed_channels()?;
        Some((self.height as usize, self.width as usize, channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, PixelFormat::Rgb24, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(frame.pts(), 5);
        assert!(!frame.force_key_frame());
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_blank_is_black_rgb() {
        let frame = Frame::blank(4, 2, 0);
        assert_eq!(frame.data().len(), 24);
        assert!(frame.data().iter().all(|b| *b == 0));
    }

    #[test]
    #[should_panic(expected = "data length must equal the buffer size of the pixel format")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, PixelFormat::Rgb24, 0);
    }

    #[test]
    fn test_planes_split_yuv420() {
        let frame = Frame::new(vec![0u8; 24], 4, 4, PixelFormat::Yuv420p, 0);
        let planes = frame.planes();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0].0.len(), 16);
        assert_eq!(planes[0].1, 4);
        assert_eq!(planes[1].0.len(), 4);
        assert_eq!(planes[2].1, 2);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 2, 2, PixelFormat::Rgb24, 0);
        let arr = frame.as_ndarray().unwrap();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::blank(2, 2, 0);
        frame.as_ndarray_mut().unwrap()[[0, 1, 2]] = 128;
        assert_eq!(frame.as_ndarray().unwrap()[[0, 1, 2]], 128);
    }

    #[test]
    fn test_planar_has_no_ndarray_view() {
        let frame = Frame::new(vec![0u8; 6], 2, 2, PixelFormat::Yuv420p, 0);
        assert!(frame.as_ndarray().is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::blank(2, 2, 0).with_forced_key_frame(true);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 9;
        assert_eq!(frame.data()[0], 0);
        assert!(cloned.force_key_frame());
    }
}
