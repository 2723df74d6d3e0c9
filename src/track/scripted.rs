use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::geometry::BoundingBox;

use super::tracker::{TrackerReading, VisualTracker};

#[derive(Clone, Copy, Debug)]
enum Fallback {
    Reading(TrackerReading),
    /// Report the last `init` box back with this score.
    Follow(f32),
    Fail,
}

/// Tracker that replays a fixed script of readings.
///
/// After the script runs out it falls back to a fixed reading, to echoing the
/// last `init` box, or to failing, depending on the constructor.
pub struct ScriptedTracker {
    script: VecDeque<Result<TrackerReading>>,
    fallback: Fallback,
    anchor: Option<BoundingBox>,
    inits: Arc<AtomicUsize>,
}

impl ScriptedTracker {
    fn with_fallback(script: Vec<Result<TrackerReading>>, fallback: Fallback) -> Self {
        Self {
            script: script.into(),
            fallback,
            anchor: None,
            inits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Play `script`, then report the target missing forever.
    pub fn from_script(script: Vec<Result<TrackerReading>>) -> Self {
        Self::with_fallback(script, Fallback::Reading(TrackerReading::missing()))
    }

    pub fn repeating(reading: TrackerReading) -> Self {
        Self::with_fallback(Vec::new(), Fallback::Reading(reading))
    }

    /// Always hand back the box it was initialized with.
    pub fn following(score: f32) -> Self {
        Self::with_fallback(Vec::new(), Fallback::Follow(score))
    }

    pub fn failing() -> Self {
        Self::with_fallback(Vec::new(), Fallback::Fail)
    }

    /// Shared count of `init()` calls.
    pub fn init_counter(&self) -> Arc<AtomicUsize> {
        self.inits.clone()
    }
}

impl VisualTracker for ScriptedTracker {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.anchor = Some(bbox);
        Ok(())
    }

    fn update(&mut self, _frame: &Frame) -> Result<TrackerReading> {
        if let Some(step) = self.script.pop_front() {
            return step;
        }
        match self.fallback {
            Fallback::Reading(reading) => Ok(reading),
            Fallback::Follow(score) => Ok(self
                .anchor
                .map(|bbox| TrackerReading::located(bbox, score))
                .unwrap_or_else(TrackerReading::missing)),
            Fallback::Fail => Err(anyhow!("scripted tracker failure")),
        }
    }
}
