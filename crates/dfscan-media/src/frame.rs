//! Decoded video frames.

use image::RgbImage;
use ndarray::Array3;

use crate::error::{MediaError, MediaResult};

/// 0-based position of a frame in decode order.
pub type FrameIndex = u64;

/// A decoded RGB frame, laid out as height x width x 3 with values in 0..=255.
///
/// Frames carry no identity beyond their decode index and are normally
/// dropped right after scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: FrameIndex,
    pixels: Array3<u8>,
}

impl Frame {
    /// Wrap an existing pixel array. The last axis must have exactly 3 channels.
    pub fn new(index: FrameIndex, pixels: Array3<u8>) -> MediaResult<Self> {
        let (height, width, channels) = pixels.dim();
        if channels != 3 {
            return Err(MediaError::invalid_frame(format!(
                "expected 3 channels, got {}",
                channels
            )));
        }
        if height == 0 || width == 0 {
            return Err(MediaError::invalid_frame("frame has zero area"));
        }
        Ok(Self { index, pixels })
    }

    /// Build a frame from packed `rgb24` bytes.
    pub fn from_rgb24(index: FrameIndex, width: u32, height: u32, data: Vec<u8>) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::invalid_frame(format!(
                "expected {} bytes for {}x{} rgb24, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), data)
            .map_err(|e| MediaError::invalid_frame(e.to_string()))?;
        Self::new(index, pixels)
    }

    /// Uniformly filled frame. Mostly useful for synthetic sources.
    pub fn solid(index: FrameIndex, width: u32, height: u32, rgb: [u8; 3]) -> MediaResult<Self> {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::from_rgb24(index, width, height, data)
    }

    pub fn from_rgb_image(index: FrameIndex, image: &RgbImage) -> MediaResult<Self> {
        Self::from_rgb24(index, image.width(), image.height(), image.as_raw().clone())
    }

    /// Convert to an `image` buffer for models that consume `RgbImage`.
    pub fn to_rgb_image(&self) -> MediaResult<RgbImage> {
        let data: Vec<u8> = self.pixels.iter().copied().collect();
        RgbImage::from_raw(self.width(), self.height(), data)
            .ok_or_else(|| MediaError::invalid_frame("pixel buffer does not match dimensions"))
    }

    pub fn index(&self) -> FrameIndex {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// Mean value over all channels, in 0.0..=255.0.
    pub fn mean_intensity(&self) -> f64 {
        let sum: u64 = self.pixels.iter().map(|&v| v as u64).sum();
        sum as f64 / self.pixels.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb24_layout() {
        // 2x1 image: red pixel, then blue pixel
        let frame = Frame::from_rgb24(7, 2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap();
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.pixels()[[0, 0, 0]], 255);
        assert_eq!(frame.pixels()[[0, 1, 2]], 255);
        assert_eq!(frame.pixels()[[0, 1, 0]], 0);
    }

    #[test]
    fn test_from_rgb24_rejects_wrong_size() {
        let err = Frame::from_rgb24(0, 4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, MediaError::InvalidFrame(_)));
    }

    #[test]
    fn test_new_rejects_wrong_channels() {
        let pixels = Array3::<u8>::zeros((2, 2, 4));
        assert!(Frame::new(0, pixels).is_err());
    }

    #[test]
    fn test_image_roundtrip_preserves_pixels() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));

        let frame = Frame::from_rgb_image(0, &img).unwrap();
        assert_eq!(frame.pixels()[[1, 2, 1]], 20);

        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_solid_mean_intensity() {
        let frame = Frame::solid(0, 4, 4, [30, 60, 90]).unwrap();
        assert!((frame.mean_intensity() - 60.0).abs() < 1e-9);
    }
}
