use std::collections::HashMap;

use anyhow::{anyhow, Result};

use crate::frame::{Annotations, Frame};
use crate::geometry::BoundingBox;

use super::backend::Detector;

/// Named detectors with one active default.
///
/// The active detector is what a pursuit session calls when it needs a full
/// detection; switching targets (faces to markers, say) is a `set_default`.
pub struct DetectorRegistry {
    detectors: HashMap<String, Box<dyn Detector>>,
    default_name: Option<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a detector under its own name. The first registered becomes the default.
    pub fn register<D: Detector + 'static>(&mut self, detector: D) {
        let name = detector.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.detectors.insert(name, Box::new(detector));
    }

    /// Set default detector by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.detectors.contains_key(name) {
            return Err(anyhow!("detector '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered detectors, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.detectors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run a named detector. Unknown names are a miss.
    pub fn detect_with(
        &mut self,
        name: &str,
        frame: &Frame,
        previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox> {
        match self.detectors.get_mut(name) {
            Some(detector) => detector.detect(frame, previous, annotations),
            None => {
                log::warn!("detector '{}' not registered", name);
                None
            }
        }
    }

    /// Run the default detector. An empty registry is a miss.
    pub fn detect_default(
        &mut self,
        frame: &Frame,
        previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox> {
        let name = self.default_name.clone()?;
        self.detect_with(&name, frame, previous, annotations)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
