//! Pursuit Kernel
//!
//! Closed-loop "see it, stay on it, steer toward it" control for wheeled and
//! quadrotor robots.
//!
//! # Architecture
//!
//! Each frame flows through one pipeline:
//!
//! 1. **Detect or track**: a cheap visual tracker is trusted while it reports
//!    confident, sane boxes; otherwise a full detector runs and re-seeds it.
//! 2. **Normalize**: the pixel box becomes a frame-independent pose.
//! 3. **Steer**: a control law maps the pose (or its absence plus the last
//!    sighting) to a pre-clamped actuator command.
//!
//! Timeouts inside the pipeline count frames, not seconds, so a run is
//! reproducible regardless of frame rate.
//!
//! # Module Structure
//!
//! - `geometry`: BoundingBox and NormalizedPose
//! - `frame`: luma frames and the annotation side channel
//! - `detect`: detector families, back-ends and the detector registry
//! - `track`: visual trackers and `TrackerState`
//! - `fusion`: per-frame detect-or-track resolution
//! - `control`: arcade drive and the ground/air pursuit laws
//! - `actuate`: simulated car and copter drivers
//! - `ingest`: frame sources
//! - `session`: the resolve-and-steer session object
//! - `config`: file + environment configuration

pub mod actuate;
pub mod config;
pub mod control;
pub mod detect;
pub mod frame;
pub mod fusion;
pub mod geometry;
pub mod ingest;
pub mod session;
pub mod track;

pub use actuate::{ActuatorDriver, SimulatedCar, SimulatedCopter};
pub use config::PursuitConfig;
pub use control::{ActuatorCommand, ArcadeCommand, Controller, PursuitStatus, RcCommand};
pub use detect::{Detector, DetectorRegistry};
pub use frame::{Annotation, Annotations, Frame};
pub use fusion::resolve;
pub use geometry::{BoundingBox, NormalizedPose};
pub use ingest::{open_source, FrameSource, SourceConfig};
pub use session::{PursuitSession, StepOutcome};
pub use track::{TrackComment, TrackerConfig, TrackerState, VisualTracker};
