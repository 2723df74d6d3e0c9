use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::geometry::BoundingBox;

use super::tracker::{TrackerReading, VisualTracker};

const DEFAULT_REINIT_INTERVAL_FRAMES: u64 = 30;
const DEFAULT_MAX_FRAMES_WITHOUT_OBJECT: u64 = 40;
const DEFAULT_MIN_ACCEPTED_SCORE: f32 = 0.6;
const DEFAULT_DIVERGENCE_FRACTION: f32 = 0.75;

/// Timing and acceptance knobs for `TrackerState`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Force a full re-detection this many frames after the last one.
    pub reinit_interval_frames: u64,
    /// Give up after this many frames without an accepted reading.
    pub max_frames_without_object: u64,
    /// Tracker scores below this are not trusted.
    pub min_accepted_score: f32,
    /// Boxes wider or taller than this fraction of the frame count as divergence.
    pub divergence_fraction: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reinit_interval_frames: DEFAULT_REINIT_INTERVAL_FRAMES,
            max_frames_without_object: DEFAULT_MAX_FRAMES_WITHOUT_OBJECT,
            min_accepted_score: DEFAULT_MIN_ACCEPTED_SCORE,
            divergence_fraction: DEFAULT_DIVERGENCE_FRACTION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackPhase {
    Idle,
    Tracking,
}

/// Why the last `update()` came out the way it did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackComment {
    /// Reading accepted with this score.
    Confidence(f32),
    /// Tracker lost the target or scored it too low.
    Missing,
    /// Tracker box grew past the divergence fraction.
    Diverged,
    /// Periodic forced re-detection is due.
    ScheduledReinit,
    /// Too long without an accepted reading; back to idle.
    Lost,
}

impl TrackComment {
    /// Only an accepted reading lets the caller skip full detection.
    pub fn allows_skip(&self) -> bool {
        matches!(self, TrackComment::Confidence(_))
    }
}

impl fmt::Display for TrackComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackComment::Confidence(score) => write!(f, "confidence: {:.2}", score),
            TrackComment::Missing => f.write_str("missing"),
            TrackComment::Diverged => f.write_str("diverged"),
            TrackComment::ScheduledReinit => f.write_str("scheduled reinit due"),
            TrackComment::Lost => f.write_str("lost"),
        }
    }
}

/// Result of one `TrackerState::update()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerUpdate {
    /// The tracker is trusted this frame; full detection can be skipped.
    pub skip_full_detection: bool,
    /// Accepted tracker box, if any.
    pub bbox: Option<BoundingBox>,
}

/// One visual tracker plus the frame-count bookkeeping that decides when to
/// trust it.
///
/// Timeouts are counted in frames, not wall-clock time, so behavior does not
/// depend on frame rate.
pub struct TrackerState<T> {
    tracker: T,
    config: TrackerConfig,
    phase: TrackPhase,
    frame_count: u64,
    last_seen_frame: u64,
    last_reinit_frame: u64,
    last_comment: Option<TrackComment>,
}

impl<T: VisualTracker> TrackerState<T> {
    pub fn new(tracker: T, config: TrackerConfig) -> Self {
        Self {
            tracker,
            config,
            phase: TrackPhase::Idle,
            frame_count: 0,
            last_seen_frame: 0,
            last_reinit_frame: 0,
            last_comment: None,
        }
    }

    /// Start (or restart) tracking `bbox`. Both anchors move to the current frame.
    pub fn init(&mut self, frame: &Frame, bbox: BoundingBox) {
        if let Err(e) = self.tracker.init(frame, bbox) {
            log::warn!("tracker {} failed to initialize: {:#}", self.tracker.name(), e);
        }
        self.phase = TrackPhase::Tracking;
        self.last_seen_frame = self.frame_count;
        self.last_reinit_frame = self.frame_count;
        log::debug!(
            "tracker init at frame {} with {:?}",
            self.frame_count,
            bbox
        );
    }

    /// Advance one frame and decide whether the tracker can be trusted.
    pub fn update(&mut self, frame: &Frame) -> TrackerUpdate {
        self.frame_count += 1;

        if self.phase == TrackPhase::Idle {
            return TrackerUpdate {
                skip_full_detection: false,
                bbox: None,
            };
        }

        let reading = match self.tracker.update(frame) {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("tracker {} update failed: {:#}", self.tracker.name(), e);
                TrackerReading::missing()
            }
        };

        let mut bbox = None;
        let mut comment = TrackComment::Missing;
        if reading.ok && reading.score >= self.config.min_accepted_score {
            if reading.bbox.exceeds_fraction_of(
                self.config.divergence_fraction,
                frame.width,
                frame.height,
            ) {
                comment = TrackComment::Diverged;
            } else {
                bbox = Some(reading.bbox);
                self.last_seen_frame = self.frame_count;
                comment = TrackComment::Confidence(reading.score);
            }
        }

        let reinit_due = self
            .last_reinit_frame
            .saturating_add(self.config.reinit_interval_frames);
        if self.frame_count >= reinit_due {
            self.last_reinit_frame = self.frame_count;
            comment = TrackComment::ScheduledReinit;
            log::debug!("scheduled reinit due at frame {}", self.frame_count);
        }

        let give_up_after = self
            .last_seen_frame
            .saturating_add(self.config.max_frames_without_object);
        if self.frame_count > give_up_after {
            self.phase = TrackPhase::Idle;
            comment = TrackComment::Lost;
            log::info!(
                "track lost at frame {} (last seen {})",
                self.frame_count,
                self.last_seen_frame
            );
        }

        log::trace!("frame {}: {}", self.frame_count, comment);
        self.last_comment = Some(comment);
        TrackerUpdate {
            skip_full_detection: comment.allows_skip(),
            bbox,
        }
    }

    pub fn phase(&self) -> TrackPhase {
        self.phase
    }

    pub fn is_tracking(&self) -> bool {
        self.phase == TrackPhase::Tracking
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_seen_frame(&self) -> u64 {
        self.last_seen_frame
    }

    pub fn last_reinit_frame(&self) -> u64 {
        self.last_reinit_frame
    }

    pub fn last_comment(&self) -> Option<TrackComment> {
        self.last_comment
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }
}
