use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single still-image frame: contiguous bytes in row-major order,
/// one or three channels.
///
/// Owned exclusively by the pipeline invocation that produced it; format
/// conversion happens at I/O boundaries only.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies out the pixels under `region`, preserving channel count.
    ///
    /// Returns `None` for a degenerate region or one that is not fully
    /// contained in this frame.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        if region.width <= 0 || region.height <= 0 {
            return None;
        }
        if !region.in_bounds(self.width, self.height) {
            return None;
        }

        let (x, y) = (region.x as usize, region.y as usize);
        let (w, h) = (region.width as usize, region.height as usize);
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;

        let mut out = Vec::with_capacity(w * h * ch);
        for row in y..y + h {
            let start = row * stride + x * ch;
            out.extend_from_slice(&self.data[start..start + w * ch]);
        }
        Some(Frame::new(out, w as u32, h as u32, self.channels))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_grayscale());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_crop_grayscale() {
        // 4x4 single-channel with a distinct 2x2 block at (1,1)
        let mut data = vec![0u8; 16];
        for (row, col) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            data[row * 4 + col] = 200;
        }
        let frame = Frame::new(data, 4, 4, 1);
        let cropped = frame.crop(&Region::new(1, 1, 2, 2)).unwrap();
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.data(), &[200, 200, 200, 200]);
    }

    #[test]
    fn test_crop_preserves_channels() {
        let frame = Frame::new(vec![7u8; 4 * 4 * 3], 4, 4, 3);
        let cropped = frame.crop(&Region::new(0, 0, 2, 3)).unwrap();
        assert_eq!(cropped.channels(), 3);
        assert_eq!(cropped.data().len(), 2 * 3 * 3);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1);
        assert!(frame.crop(&Region::new(2, 2, 3, 3)).is_none());
        assert!(frame.crop(&Region::new(-1, 0, 2, 2)).is_none());
    }

    #[test]
    fn test_crop_rejects_degenerate() {
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1);
        assert!(frame.crop(&Region::new(0, 0, 0, 2)).is_none());
        assert!(frame.crop(&Region::new(0, 0, 2, 0)).is_none());
    }

    #[test]
    fn test_crop_full_frame_is_identity() {
        let data: Vec<u8> = (0..16).collect();
        let frame = Frame::new(data.clone(), 4, 4, 1);
        let cropped = frame.crop(&Region::new(0, 0, 4, 4)).unwrap();
        assert_eq!(cropped.data(), &data[..]);
    }
}
