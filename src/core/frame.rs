//! # Frame Representation
//!
//! A captured camera image as tightly packed RGB8 bytes. Pixel data sits
//! behind an `Arc` so the render loop, the frame buffer and an in-flight
//! analysis can all hold the same image without copying it.

use std::{sync::Arc, time::Instant};

use image::RgbImage;

use crate::error::{TutorError, TutorResult};

pub use tutor_scale::presets::Size;

/// Bytes per RGB8 pixel.
pub const RGB_CHANNELS: usize = 3;

/// One captured frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB8 pixel data, row-major, no padding
    pub data: Arc<Vec<u8>>,
    /// Frame dimensions in pixels
    pub size: Size,
    /// Monotonic capture sequence number assigned by the source
    pub sequence: u64,
    /// When the source produced the frame
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap raw RGB8 bytes, checking the length against the dimensions.
    pub fn new(data: Vec<u8>, size: Size, sequence: u64) -> TutorResult<Self> {
        let expected = Self::byte_len(size);
        if size.w == 0 || size.h == 0 {
            return Err(TutorError::capture(format!(
                "frame has empty dimensions {}x{}",
                size.w, size.h
            )));
        }
        if data.len() != expected {
            return Err(TutorError::capture(format!(
                "frame buffer holds {} bytes, {}x{} RGB needs {}",
                data.len(),
                size.w,
                size.h,
                expected
            )));
        }
        Ok(Self {
            data: Arc::new(data),
            size,
            sequence,
            captured_at: Instant::now(),
        })
    }

    /// Build a frame from a decoded `image` buffer.
    pub fn from_rgb_image(image: RgbImage, sequence: u64) -> TutorResult<Self> {
        let size = Size {
            w: image.width(),
            h: image.height(),
        };
        Self::new(image.into_raw(), size, sequence)
    }

    /// Copy the pixels into an `image` buffer for encoding or drawing.
    pub fn to_rgb_image(&self) -> TutorResult<RgbImage> {
        RgbImage::from_raw(self.size.w, self.size.h, self.data.as_ref().clone())
            .ok_or_else(|| TutorError::encoding("frame bytes do not match its dimensions"))
    }

    /// Byte length of an RGB8 buffer of the given size.
    pub fn byte_len(size: Size) -> usize {
        (size.w as usize) * (size.h as usize) * RGB_CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_length_checked() {
        let size = Size { w: 4, h: 2 };
        assert!(Frame::new(vec![0; 24], size, 0).is_ok());
        let err = Frame::new(vec![0; 23], size, 0).unwrap_err();
        assert_eq!(err.category(), "capture");
    }

    #[test]
    fn test_empty_dimensions_rejected() {
        assert!(Frame::new(Vec::new(), Size { w: 0, h: 10 }, 0).is_err());
    }

    #[test]
    fn test_image_conversion_keeps_pixels() {
        let image = RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(image, 7).unwrap();
        assert_eq!(frame.size, Size { w: 3, h: 2 });
        assert_eq!(frame.sequence, 7);

        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(2, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_clone_shares_pixels() {
        let frame = Frame::new(vec![1; 12], Size { w: 2, h: 2 }, 0).unwrap();
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.data, &copy.data));
    }
}
