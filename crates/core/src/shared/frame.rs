use ndarray::ArrayView3;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens at the capture and display boundaries;
/// everything in between treats the buffer as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
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
            index,
        }
    }

    /// A black RGB frame for fakes in tests.
    #[cfg(test)]
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        Self::new(
            vec![0u8; width as usize * height as usize * 3],
            width,
            height,
            3,
            index,
        )
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

    /// Sequential position of the frame in its capture stream.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `[height, width, channels]` view over the pixel buffer.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels into a new buffer with the R and B channels swapped.
    pub fn to_bgr(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.channels >= 3 {
            for px in out.chunks_exact_mut(self.channels as usize) {
                px.swap(0, 2);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_blank_is_black_rgb() {
        let frame = Frame::blank(4, 3, 0);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data().len(), 4 * 3 * 3);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 2]], 0);
    }

    #[test]
    fn test_to_bgr_swaps_red_and_blue() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 3, 0);
        assert_eq!(frame.to_bgr(), vec![30, 20, 10, 60, 50, 40]);
        // source untouched
        assert_eq!(frame.data()[0], 10);
    }
}
