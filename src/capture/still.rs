//! # Still-Image Capture Source
//!
//! Replays photographs of a desk from a directory, in file-name order, as
//! if a camera were looking at them. Each image is held for a configurable
//! number of frames so the scene stays still long enough to be analysed.
//! This lets the whole pipeline run without a camera driver.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::source::CaptureSource;
use crate::{
    core::{Frame, Size},
    error::{TutorError, TutorResult},
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

pub struct StillImageSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    frames_per_image: u32,
    looping: bool,
    /// Index of the next file to load
    next: usize,
    held: u32,
    current: Option<Frame>,
    sequence: u64,
    size: Option<Size>,
}

impl StillImageSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            frames_per_image: 1,
            looping: false,
            next: 0,
            held: 0,
            current: None,
            sequence: 0,
            size: None,
        }
    }

    /// Repeat each image for `frames` reads.
    pub fn with_frames_per_image(mut self, frames: u32) -> Self {
        self.frames_per_image = frames.max(1);
        self
    }

    /// Start over after the last image instead of ending.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn load(&mut self, path: &Path) -> TutorResult<Frame> {
        let image = image::open(path)
            .map_err(|e| {
                TutorError::encoding(format!("cannot decode {}: {}", path.display(), e))
                    .with_operation("load_image")
            })?
            .to_rgb8();
        let frame = Frame::from_rgb_image(image, self.sequence)?;
        self.size = Some(frame.size);
        Ok(frame)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl CaptureSource for StillImageSource {
    async fn initialize(&mut self) -> TutorResult<()> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            TutorError::io("read_dir", e).with_path(self.dir.display().to_string())
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(TutorError::capture(format!(
                "no images found in {}",
                self.dir.display()
            )));
        }
        log::info!("replaying {} images from {}", files.len(), self.dir.display());
        self.files = files;
        self.next = 0;
        self.held = 0;
        self.current = None;
        Ok(())
    }

    async fn read_frame(&mut self) -> TutorResult<Frame> {
        if self.files.is_empty() {
            return Err(TutorError::capture("source not initialized"));
        }

        let needs_next = match &self.current {
            None => true,
            Some(_) => self.held >= self.frames_per_image,
        };
        if needs_next {
            if self.next >= self.files.len() {
                if !self.looping {
                    return Err(TutorError::capture("end of image sequence"));
                }
                self.next = 0;
            }
            // An unreadable file is skipped on the following read.
            let path = self.files[self.next].clone();
            self.next += 1;
            self.current = None;
            self.held = 0;
            self.current = Some(self.load(&path)?);
        }

        self.held += 1;
        self.sequence += 1;
        let mut frame = self
            .current
            .clone()
            .ok_or_else(|| TutorError::capture("no frame loaded"))?;
        frame.sequence = self.sequence;
        frame.captured_at = std::time::Instant::now();
        Ok(frame)
    }

    fn input_size(&self) -> Option<Size> {
        self.size
    }

    async fn release(&mut self) -> TutorResult<()> {
        self.current = None;
        Ok(())
    }
}
