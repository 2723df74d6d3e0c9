//! Image-directory source (feature: ingest-images).
//!
//! Replays the PNG/JPEG files of a local directory in name order, converted
//! to luma and resized to the configured frame size. The source reports
//! unhealthy once the directory is exhausted.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;

use super::{FrameSource, SourceConfig, SourceStats};
use crate::frame::Frame;

pub struct ImageDirSource {
    config: SourceConfig,
    files: Vec<PathBuf>,
    cursor: usize,
    frames_captured: u64,
    frames_dropped: u64,
}

impl ImageDirSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.url);
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        Ok(Self {
            config,
            files: Vec::new(),
            cursor: 0,
            frames_captured: 0,
            frames_dropped: 0,
        })
    }
}

fn is_image(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png") | Some("jpg") | Some("jpeg")
    )
}

impl FrameSource for ImageDirSource {
    fn name(&self) -> &'static str {
        "images"
    }

    fn connect(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.config.url)
            .with_context(|| format!("failed to list {}", self.config.url))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no png/jpeg images in {}", self.config.url));
        }
        log::info!(
            "ImageDirSource: connected to {} ({} images)",
            self.config.url,
            files.len()
        );
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.cursor).cloned() else {
            return Ok(None);
        };
        self.cursor += 1;
        self.frames_captured += 1;

        let decoded = match image::open(&path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                self.frames_dropped += 1;
                log::warn!("ImageDirSource: skipping {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        let (w, h) = (self.config.width, self.config.height);
        let luma = if decoded.width() != w || decoded.height() != h {
            image::imageops::resize(&decoded, w, h, FilterType::Triangle)
        } else {
            decoded
        };
        let frame = Frame::new(luma.into_raw(), w, h, self.frames_captured)?;
        Ok(Some(if self.config.flip {
            frame.rotated_180()
        } else {
            frame
        }))
    }

    fn is_healthy(&self) -> bool {
        self.cursor < self.files.len()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            frames_dropped: self.frames_dropped,
            url: self.config.url.clone(),
        }
    }
}
