// SPDX-License-Identifier: MIT
//! # tutor-scale: Frame Downscaling for Vision-Language Model Input
//!
//! Camera frames of a workbook page are usually larger than a vision-language
//! model needs. Sending them at full size costs upload time and tokens without
//! improving problem detection, so frames are clamped to a maximum long side
//! before JPEG encoding.
//!
//! ## Key Components
//!
//! - [`presets`]: Scaling plan computation (longest-side clamp, never upscales)
//! - [`cpu`]: RGB8 scaling built on `fast_image_resize`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use tutor_scale::{cpu::scale_rgb_cpu, presets::{build_plan, Size}};
//!
//! let input = Size { w: 1920, h: 1080 };
//! let plan = build_plan(input, 1280);
//! assert_eq!((plan.out.w, plan.out.h), (1280, 720));
//!
//! let src = vec![0u8; (input.w * input.h * 3) as usize];
//! let mut resizer = fast_image_resize::Resizer::new();
//! let mut out = vec![0u8; plan.out_len()];
//! scale_rgb_cpu(&mut resizer, &src, &plan, &mut out).unwrap();
//! ```

pub mod cpu;
pub mod presets;
