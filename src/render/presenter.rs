//! Display side of the render loop.
//!
//! A [`Presenter`] shows a frame with its overlay. Window management is not
//! part of this crate; [`LogPresenter`] stands in for a display by running
//! the overlay through a [`RecordingSurface`] and logging whenever the
//! projected content changes.

use crate::{core::Frame, error::TutorResult};

use super::surface::{DrawCommand, RecordingSurface, apply_plan};

pub trait Presenter: Send {
    /// Show `frame` with `commands` drawn over it.
    fn present(&mut self, frame: &Frame, commands: &[DrawCommand]) -> TutorResult<()>;

    /// Release the display.
    fn close(&mut self) -> TutorResult<()>;
}

#[derive(Debug, Default)]
pub struct LogPresenter {
    last: Vec<DrawCommand>,
    presented: u64,
    changes: u64,
    closed: bool,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// How many times the projected overlay changed.
    pub fn changes(&self) -> u64 {
        self.changes
    }

    /// Overlay most recently shown.
    pub fn last_overlay(&self) -> &[DrawCommand] {
        &self.last
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, frame: &Frame, commands: &[DrawCommand]) -> TutorResult<()> {
        let (surface, dropped) = apply_plan(RecordingSurface::new(frame.size), commands);
        if dropped > 0 {
            log::debug!("frame {}: dropped {} draw commands", frame.sequence, dropped);
        }
        if surface.commands() != self.last.as_slice() {
            match serde_json::to_string(surface.commands()) {
                Ok(json) => log::info!("projection changed at frame {}: {}", frame.sequence, json),
                Err(_) => log::info!("projection changed at frame {}", frame.sequence),
            }
            self.last = surface.commands().to_vec();
            self.changes += 1;
        }
        self.presented += 1;
        Ok(())
    }

    fn close(&mut self) -> TutorResult<()> {
        if !self.closed {
            log::info!("display closed after {} frames", self.presented);
            self.closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::Size,
        render::surface::{Color, Point},
    };

    #[test]
    fn test_tracks_last_overlay() {
        let frame = Frame::new(vec![0; 300], Size { w: 10, h: 10 }, 1).unwrap();
        let mut presenter = LogPresenter::new();
        let commands = vec![
            DrawCommand::Divider { x: 9, color: Color::DIVIDER_GRAY },
            DrawCommand::Text {
                text: "out".into(),
                at: Point { x: 20, y: 0 },
                font_size: 10,
                color: Color::WHITE,
            },
        ];
        presenter.present(&frame, &commands).unwrap();
        presenter.present(&frame, &[]).unwrap();
        assert_eq!(presenter.presented(), 2);
        assert_eq!(presenter.changes(), 2);
        assert!(presenter.last_overlay().is_empty());

        presenter.present(&frame, &commands).unwrap();
        assert_eq!(presenter.last_overlay(), &commands[..1]);
        presenter.close().unwrap();
    }
}
