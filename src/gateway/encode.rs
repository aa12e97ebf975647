//! Frame encoding for model input.
//!
//! Frames are clamped to a maximum long side with `tutor-scale`, then
//! JPEG-encoded and wrapped in a base64 data URI, the form the
//! OpenAI-compatible `image_url` content part expects.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use fast_image_resize::Resizer;
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};
use tutor_scale::{cpu::scale_rgb_cpu, presets::build_plan};

use crate::{
    core::{Frame, Size},
    error::{TutorError, TutorResult},
};

/// JPEG encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Longest side after downscaling; never upscales
    pub max_side: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            quality: 75,
            max_side: 1280,
        }
    }
}

/// A frame ready to attach to a model request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    /// Dimensions of the encoded image, after downscaling
    pub size: Size,
    /// JPEG payload size before base64
    pub jpeg_bytes: usize,
}

/// Downscale and JPEG-encode `frame`.
pub fn encode_frame(frame: &Frame, options: &ImageOptions) -> TutorResult<EncodedImage> {
    let plan = build_plan(frame.size, options.max_side);

    let scaled: Vec<u8>;
    let pixels: &[u8] = if plan.is_identity() {
        frame.data.as_slice()
    } else {
        let mut out = vec![0u8; plan.out_len()];
        scale_rgb_cpu(&mut Resizer::new(), &frame.data, &plan, &mut out)?;
        scaled = out;
        &scaled
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, options.quality.clamp(1, 100))
        .encode(pixels, plan.out.w, plan.out.h, ExtendedColorType::Rgb8)
        .map_err(|e| TutorError::encoding(e.to_string()).with_operation("jpeg_encode"))?;

    let jpeg_bytes = jpeg.len();
    Ok(EncodedImage {
        data_uri: format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)),
        size: plan.out,
        jpeg_bytes,
    })
}
