//! Pursuit session: one detector registry, one tracker, one controller.
//!
//! `step()` is the per-frame resolve-and-steer entry point. The session owns
//! all mutable pursuit state; nothing is process-global.

use anyhow::{anyhow, Result};

use crate::config::PursuitConfig;
use crate::control::{ActuatorCommand, Controller, PursuitMemory, PursuitStatus};
use crate::detect::{
    BlobBackend, CascadeDetector, DetectionFilter, DetectorRegistry, MarkerDetector,
    ObjectDetector,
};
use crate::frame::{Annotation, Annotations, Frame};
use crate::fusion;
use crate::geometry::{BoundingBox, NormalizedPose};
use crate::track::{TrackComment, TrackerState, VisualTracker, WindowTracker};

pub type SessionTracker = TrackerState<Box<dyn VisualTracker>>;

/// Everything decided for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub bbox: Option<BoundingBox>,
    pub pose: Option<NormalizedPose>,
    pub command: ActuatorCommand,
    pub status: PursuitStatus,
    /// Tracker diagnostic for this frame, when a tracker is attached.
    pub comment: Option<TrackComment>,
}

impl StepOutcome {
    /// Status text in the `CHASING (confidence: 0.91)` form.
    pub fn status_text(&self) -> String {
        match self.comment {
            Some(comment) => format!("{} ({})", self.status, comment),
            None => self.status.to_string(),
        }
    }
}

pub struct PursuitSession {
    detectors: DetectorRegistry,
    tracker: Option<SessionTracker>,
    controller: Controller,
    memory: PursuitMemory,
    tilt_correction: f32,
    previous: Option<BoundingBox>,
    engaged: bool,
    annotations: Annotations,
    frames: u64,
}

impl PursuitSession {
    /// Build a session with the built-in pixel back-ends.
    pub fn new(config: &PursuitConfig) -> Result<Self> {
        config.validate()?;
        let d = &config.detector;

        let mut detectors = DetectorRegistry::new();
        let filter = DetectionFilter {
            valid_classes: d.valid_classes.clone(),
            min_confidence: d.min_confidence,
            only_these_ids: None,
        };
        detectors.register(
            ObjectDetector::new(BlobBackend::new(d.luma_threshold)).with_filter(filter),
        );
        detectors.register(
            MarkerDetector::new(BlobBackend::new(d.luma_threshold).with_markers(true))
                .only_these_ids(d.marker_ids.clone()),
        );
        detectors.register(
            CascadeDetector::new(BlobBackend::new(d.luma_threshold))
                .nearest_to_previous(d.nearest_to_previous),
        );
        detectors.set_default(d.kind.as_str())?;

        let tracker = if config.tracker_enabled {
            let window: Box<dyn VisualTracker> = Box::new(
                WindowTracker::new(d.luma_threshold)
                    .with_search_margin(config.tracker_search_margin),
            );
            Some(TrackerState::new(window, config.tracker))
        } else {
            None
        };

        let controller = Controller::new(config.pursuit.law, &config.pursuit.laws);
        log::info!(
            "pursuit session: detector={} tracker={} law={:?}",
            d.kind.as_str(),
            if tracker.is_some() { "window" } else { "off" },
            config.pursuit.law
        );

        Ok(Self::with_parts(
            detectors,
            tracker,
            controller,
            PursuitMemory::new(config.pursuit.seek_window_frames),
            config.pursuit.tilt_correction,
        ))
    }

    /// Assemble a session from already-built parts.
    pub fn with_parts(
        detectors: DetectorRegistry,
        tracker: Option<SessionTracker>,
        controller: Controller,
        memory: PursuitMemory,
        tilt_correction: f32,
    ) -> Self {
        Self {
            detectors,
            tracker,
            controller,
            memory,
            tilt_correction,
            previous: None,
            engaged: true,
            annotations: Annotations::disabled(),
            frames: 0,
        }
    }

    /// Collect overlay annotations from now on.
    pub fn record_annotations(mut self) -> Self {
        self.annotations = Annotations::new();
        self
    }

    /// Resolve the target on `frame` and pick a command.
    ///
    /// An absent frame is a no-op and returns `None`.
    pub fn step(&mut self, frame: Option<&Frame>) -> Option<StepOutcome> {
        let frame = frame?;
        self.frames += 1;

        let Self {
            detectors,
            tracker,
            previous,
            annotations,
            ..
        } = self;
        let hint = *previous;
        let detect = || detectors.detect_default(frame, hint, annotations);
        let bbox = match tracker.as_mut() {
            Some(state) => fusion::resolve(Some(frame), Some(state), detect),
            None => fusion::resolve_untracked(Some(frame), detect),
        };
        let comment = tracker.as_ref().and_then(|state| state.last_comment());

        let pose = NormalizedPose::from_optional(
            bbox.as_ref(),
            frame.width,
            frame.height,
            self.tilt_correction,
        );
        self.memory.observe(self.frames, pose);
        let recent = self.memory.recent(self.frames);
        let (command, status) = if self.engaged {
            self.controller.steer(pose.as_ref(), recent.as_ref())
        } else {
            (
                ActuatorCommand::stop_for(self.controller.platform()),
                PursuitStatus::Disengaged,
            )
        };

        if bbox.is_some() {
            self.previous = bbox;
        } else if recent.is_none() {
            self.previous = None;
        }

        let outcome = StepOutcome {
            bbox,
            pose,
            command,
            status,
            comment,
        };
        if let (Some(bbox), Some(comment)) = (bbox, comment) {
            self.annotations.push(Annotation::Track {
                bbox,
                comment: comment.to_string(),
            });
        }
        self.annotations.push(Annotation::Status(outcome.status_text()));
        log::trace!("step {}: {:?}", self.frames, outcome);
        Some(outcome)
    }

    /// Seed the tracker from an operator-chosen box.
    pub fn select_target(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()> {
        let state = self
            .tracker
            .as_mut()
            .ok_or_else(|| anyhow!("cannot select a target with tracking disabled"))?;
        let bbox = bbox.clamp_to(frame.width, frame.height);
        if bbox.area() == 0 {
            return Err(anyhow!("selected box lies outside the frame"));
        }
        state.init(frame, bbox);
        self.previous = Some(bbox);
        log::info!("target selected manually: {:?}", bbox);
        Ok(())
    }

    /// Engage or disengage pursuit.
    ///
    /// A disengaged session keeps detecting, tracking and remembering the
    /// target but only ever emits stop (ground) or hover (air).
    pub fn set_chasing(&mut self, engaged: bool) {
        if self.engaged != engaged {
            log::info!("pursuit {}", if engaged { "engaged" } else { "disengaged" });
        }
        self.engaged = engaged;
    }

    pub fn is_chasing(&self) -> bool {
        self.engaged
    }

    pub fn tracker(&self) -> Option<&SessionTracker> {
        self.tracker.as_ref()
    }

    pub fn memory(&self) -> &PursuitMemory {
        &self.memory
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Frames processed so far (absent frames excluded).
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Take the annotations recorded since the last call.
    pub fn take_annotations(&mut self) -> Vec<Annotation> {
        self.annotations.drain()
    }
}
