// SPDX-License-Identifier: MIT
//! # Scaling Plan Computation
//!
//! A plan clamps the longest side of a frame to a maximum and derives the
//! other side proportionally. Frames already within the limit are left at
//! their original size.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Computed output parameters for one scaling operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Longest-side limit the plan was built for
    pub max_long_side: u32,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the output equals the input and no resize is needed.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }

    /// Byte length of a tightly packed RGB8 output buffer.
    pub fn out_len(&self) -> usize {
        (self.out.w as usize) * (self.out.h as usize) * 3
    }
}

/// Compute a scaling plan that fits `input` within `max_long_side`.
///
/// A `max_long_side` of zero disables scaling.
pub fn build_plan(input: Size, max_long_side: u32) -> ScalePlan {
    let out = if max_long_side == 0 {
        input
    } else {
        let (w, h) = fit_preserve(input, max_long_side);
        Size { w, h }
    };
    ScalePlan {
        input,
        max_long_side,
        out,
    }
}

/// Fit image within max_long on its longest dimension, preserving aspect ratio.
/// Never upscales.
fn fit_preserve(input: Size, max_long: u32) -> (u32, u32) {
    let (w, h) = (input.w as f64, input.h as f64);
    let long = w.max(h).max(1.0);
    let s = (max_long as f64 / long).min(1.0);
    (
        ((w * s).round() as u32).max(1),
        ((h * s).round() as u32).max(1),
    )
}
