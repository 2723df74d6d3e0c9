use anyhow::Result;

use crate::detect::result::Candidate;
use crate::frame::{Annotations, Frame};
use crate::geometry::BoundingBox;

/// Raw detection back-end (cascade classifier, marker decoder, learned model).
///
/// Back-ends enumerate every candidate they see; choosing one is the adapter's job.
/// A back-end may fail; adapters turn that into "nothing detected".
pub trait CandidateSource: Send {
    /// Back-end identifier.
    fn name(&self) -> &'static str;

    /// All candidates on this frame, unfiltered.
    fn candidates(&mut self, frame: &Frame) -> Result<Vec<Candidate>>;
}

impl<S: CandidateSource + ?Sized> CandidateSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn candidates(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        (**self).candidates(frame)
    }
}

/// The single detection capability the fusion layer depends on.
///
/// Implementations never fail: a back-end error is a miss for this frame.
pub trait Detector: Send {
    fn name(&self) -> &str;

    /// Best target on `frame`, if any.
    ///
    /// `previous` is the target's last known box; detectors that do not track
    /// identity ignore it. All raw candidates may be pushed to `annotations`.
    fn detect(
        &mut self,
        frame: &Frame,
        previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox>;
}
