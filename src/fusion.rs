//! Detect-or-track fusion.
//!
//! One call per frame turns a tracker session and an expensive detector into a
//! single box. The tracker is trusted while `TrackerState` says so; otherwise
//! the detector runs and its result re-seeds the tracker.

use crate::frame::Frame;
use crate::geometry::BoundingBox;
use crate::track::{TrackerState, VisualTracker};

/// Resolve the target box for one frame.
///
/// `detect` is only invoked when the tracker cannot be trusted this frame. A
/// fresh detection re-initializes the tracker and the tracker is queried once
/// more, so the returned box comes from the tracker's own output whenever it
/// accepts the new anchor.
pub fn resolve<T, F>(
    frame: Option<&Frame>,
    tracker: Option<&mut TrackerState<T>>,
    detect: F,
) -> Option<BoundingBox>
where
    T: VisualTracker,
    F: FnOnce() -> Option<BoundingBox>,
{
    let frame = frame?;

    let Some(state) = tracker else {
        return detect();
    };

    let update = state.update(frame);
    if update.skip_full_detection {
        return update.bbox;
    }

    match detect() {
        Some(detected) => {
            state.init(frame, detected);
            let requery = state.update(frame);
            Some(requery.bbox.unwrap_or(detected))
        }
        None => update.bbox,
    }
}

/// `resolve` without a tracker: plain per-frame detection.
pub fn resolve_untracked<F>(frame: Option<&Frame>, detect: F) -> Option<BoundingBox>
where
    F: FnOnce() -> Option<BoundingBox>,
{
    frame?;
    detect()
}
