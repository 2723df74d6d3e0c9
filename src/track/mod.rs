//! Short-horizon tracking and the bookkeeping that decides when to trust it.

mod scripted;
mod state;
mod tracker;
mod window;

pub use scripted::ScriptedTracker;
pub use state::{TrackComment, TrackPhase, TrackerConfig, TrackerState, TrackerUpdate};
pub use tracker::{TrackerReading, VisualTracker};
pub use window::WindowTracker;
