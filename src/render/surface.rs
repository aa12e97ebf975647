//! # Drawing Surface
//!
//! The drawing surface is an external collaborator. Its operations are pure
//! transforms: each takes `&self` and returns a new surface, or an error for
//! geometry it cannot draw. [`apply_plan`] runs a command list and drops any
//! command the surface rejects without stopping the rest.

use serde::Serialize;

use crate::{
    core::Size,
    error::{TutorError, TutorResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const DIVIDER_GRAY: Self = Self::rgb(64, 64, 64);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Text {
        text: String,
        at: Point,
        font_size: u32,
        color: Color,
    },
    /// `at` is the bottom-left corner of the mark
    Checkmark {
        at: Point,
        size: u32,
        color: Color,
        thickness: u32,
    },
    /// Full-height vertical line at `x`
    Divider { x: u32, color: Color },
}

impl DrawCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "draw_text",
            Self::Checkmark { .. } => "draw_checkmark",
            Self::Divider { .. } => "draw_divider",
        }
    }

    /// Execute against `surface`.
    pub fn apply<S: DrawingSurface>(&self, surface: &S) -> TutorResult<S> {
        match self {
            Self::Text {
                text,
                at,
                font_size,
                color,
            } => surface.draw_text(text, *at, *font_size, *color),
            Self::Checkmark {
                at,
                size,
                color,
                thickness,
            } => surface.draw_checkmark(*at, *size, *color, *thickness),
            Self::Divider { x, color } => surface.draw_divider(*x, *color),
        }
    }
}

/// Something draw commands can be applied to.
pub trait DrawingSurface: Sized {
    fn size(&self) -> Size;

    fn draw_text(&self, text: &str, at: Point, font_size: u32, color: Color) -> TutorResult<Self>;

    fn draw_checkmark(
        &self,
        at: Point,
        size: u32,
        color: Color,
        thickness: u32,
    ) -> TutorResult<Self>;

    fn draw_divider(&self, x: u32, color: Color) -> TutorResult<Self>;
}

/// Apply `commands` in order, dropping any the surface rejects.
///
/// Returns the final surface and the number of dropped commands.
pub fn apply_plan<S: DrawingSurface>(surface: S, commands: &[DrawCommand]) -> (S, usize) {
    let mut dropped = 0;
    let surface = commands.iter().fold(surface, |surface, command| {
        match command.apply(&surface) {
            Ok(next) => next,
            Err(e) => {
                log::debug!("dropping {}: {}", command.name(), e);
                dropped += 1;
                surface
            }
        }
    });
    (surface, dropped)
}

/// Surface that records accepted commands instead of drawing them.
///
/// It enforces the same geometry rules a bitmap surface would: anchors
/// inside the frame, non-empty text, positive sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    fn check_point(&self, command: &str, at: Point) -> TutorResult<()> {
        if at.x >= self.size.w || at.y >= self.size.h {
            return Err(TutorError::render_geometry(
                command,
                format!(
                    "({}, {}) outside {}x{} frame",
                    at.x, at.y, self.size.w, self.size.h
                ),
            ));
        }
        Ok(())
    }

    fn with(&self, command: DrawCommand) -> Self {
        let mut next = self.clone();
        next.commands.push(command);
        next
    }
}

impl DrawingSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn draw_text(&self, text: &str, at: Point, font_size: u32, color: Color) -> TutorResult<Self> {
        self.check_point("draw_text", at)?;
        if text.trim().is_empty() || font_size == 0 {
            return Err(TutorError::render_geometry(
                "draw_text",
                "empty text or zero font size",
            ));
        }
        Ok(self.with(DrawCommand::Text {
            text: text.to_string(),
            at,
            font_size,
            color,
        }))
    }

    fn draw_checkmark(
        &self,
        at: Point,
        size: u32,
        color: Color,
        thickness: u32,
    ) -> TutorResult<Self> {
        self.check_point("draw_checkmark", at)?;
        if size == 0 || thickness == 0 {
            return Err(TutorError::render_geometry(
                "draw_checkmark",
                "zero size or thickness",
            ));
        }
        Ok(self.with(DrawCommand::Checkmark {
            at,
            size,
            color,
            thickness,
        }))
    }

    fn draw_divider(&self, x: u32, color: Color) -> TutorResult<Self> {
        self.check_point("draw_divider", Point { x, y: 0 })?;
        Ok(self.with(DrawCommand::Divider { x, color }))
    }
}
