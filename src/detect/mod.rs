mod adapters;
mod backend;
pub mod backends;
mod registry;
mod result;
pub mod select;

pub use adapters::{CascadeDetector, MarkerDetector, ObjectDetector};
pub use backend::{CandidateSource, Detector};
pub use backends::{BlobBackend, ScriptedBackend};
pub use registry::DetectorRegistry;
pub use result::{Candidate, DetectionFilter, MarkerInfo};
