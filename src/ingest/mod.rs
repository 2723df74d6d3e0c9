//! Frame ingestion sources.
//!
//! - `stub://...` synthetic scene (always available)
//! - local image directories (feature: ingest-images)
//!
//! A source may return `Ok(None)` for a cycle with no frame (dropped or not
//! decodable). Callers skip that cycle; it is not an error.

mod fps;
#[cfg(feature = "ingest-images")]
pub mod images;
pub mod synthetic;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::frame::Frame;

pub use fps::FpsMeter;
#[cfg(feature = "ingest-images")]
pub use images::ImageDirSource;
pub use synthetic::SyntheticSource;

/// Configuration shared by all sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `stub://<name>` or a local directory path.
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Pacing for the run loop (frames per second).
    pub target_fps: u32,
    /// Camera mounted upside down.
    pub flip: bool,
    /// Seed for synthetic scenes.
    pub seed: u64,
    /// Fraction of synthetic frames to drop.
    pub drop_rate: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://scene".to_string(),
            width: 640,
            height: 480,
            target_fps: 20,
            flip: false,
            seed: 0,
            drop_rate: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub url: String,
}

pub trait FrameSource: Send {
    fn name(&self) -> &'static str;

    fn connect(&mut self) -> Result<()>;

    /// Next frame, or `None` when nothing arrived this cycle.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Open the source named by `config.url`.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.url.trim().is_empty() {
        return Err(anyhow!("source url is empty"));
    }
    if config.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(config.clone())));
    }
    if config.url.contains("://") {
        return Err(anyhow!(
            "unsupported source url {} (only stub:// and local directories)",
            config.url
        ));
    }
    #[cfg(feature = "ingest-images")]
    {
        Ok(Box::new(ImageDirSource::new(config.clone())?))
    }
    #[cfg(not(feature = "ingest-images"))]
    {
        Err(anyhow!(
            "directory ingestion requires the ingest-images feature"
        ))
    }
}
