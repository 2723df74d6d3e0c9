use anyhow::Result;

use crate::frame::Frame;
use crate::geometry::BoundingBox;

/// What a visual tracker reports for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerReading {
    pub ok: bool,
    pub bbox: BoundingBox,
    pub score: f32,
}

impl TrackerReading {
    pub fn located(bbox: BoundingBox, score: f32) -> Self {
        Self {
            ok: true,
            bbox,
            score,
        }
    }

    pub fn missing() -> Self {
        Self {
            ok: false,
            bbox: BoundingBox::new(0, 0, 0, 0),
            score: 0.0,
        }
    }
}

/// Short-horizon single-object tracker (correlation filter, ViT tracker, ...).
///
/// Errors from either call are treated by `TrackerState` as a lost reading.
pub trait VisualTracker: Send {
    fn name(&self) -> &'static str;

    /// Start following `bbox` on `frame`.
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()>;

    /// Locate the target on the next frame.
    fn update(&mut self, frame: &Frame) -> Result<TrackerReading>;
}

impl<T: VisualTracker + ?Sized> VisualTracker for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()> {
        (**self).init(frame, bbox)
    }

    fn update(&mut self, frame: &Frame) -> Result<TrackerReading> {
        (**self).update(frame)
    }
}
