use crate::geometry::NormalizedPose;

/// Where the target was last seen, and when (in frames).
///
/// Owned by the control loop, not by the tracker session; it outlives brief
/// losses so the controllers can keep turning toward the last known side.
#[derive(Clone, Debug)]
pub struct PursuitMemory {
    window_frames: u64,
    last_seen: Option<(NormalizedPose, u64)>,
}

impl PursuitMemory {
    pub fn new(window_frames: u64) -> Self {
        Self {
            window_frames,
            last_seen: None,
        }
    }

    /// Record this frame's pose. An absent pose leaves the memory untouched.
    pub fn observe(&mut self, frame: u64, pose: Option<NormalizedPose>) {
        if let Some(pose) = pose {
            self.last_seen = Some((pose, frame));
        }
    }

    /// The last pose, if it was seen within the window ending at `frame`.
    pub fn recent(&self, frame: u64) -> Option<NormalizedPose> {
        match self.last_seen {
            Some((pose, at)) if frame <= at.saturating_add(self.window_frames) => Some(pose),
            _ => None,
        }
    }

    pub fn last_seen(&self) -> Option<NormalizedPose> {
        self.last_seen.map(|(pose, _)| pose)
    }

    pub fn last_seen_frame(&self) -> Option<u64> {
        self.last_seen.map(|(_, at)| at)
    }

    pub fn window_frames(&self) -> u64 {
        self.window_frames
    }

    pub fn forget(&mut self) {
        self.last_seen = None;
    }
}
