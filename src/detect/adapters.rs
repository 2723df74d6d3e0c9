//! Detector families over a raw `CandidateSource`.
//!
//! Each adapter enumerates the back-end's candidates, annotates all of them,
//! and returns the one its selection rule prefers.

use crate::detect::backend::{CandidateSource, Detector};
use crate::detect::result::{Candidate, DetectionFilter};
use crate::detect::select;
use crate::frame::{Annotation, Annotations, Frame};
use crate::geometry::BoundingBox;

/// Learned object detector: class and confidence filters, widest wins.
pub struct ObjectDetector<S> {
    source: S,
    filter: DetectionFilter,
}

impl<S: CandidateSource> ObjectDetector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: DetectionFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: DetectionFilter) -> Self {
        // marker ids are meaningless for class detectors
        self.filter = DetectionFilter {
            only_these_ids: None,
            ..filter
        };
        self
    }
}

impl<S: CandidateSource> Detector for ObjectDetector<S> {
    fn name(&self) -> &str {
        "object"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        _previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox> {
        let candidates = enumerate(&mut self.source, frame);
        let chosen = select::widest(&candidates, &self.filter).map(|c| c.bbox);
        annotate(&candidates, chosen, annotations);
        chosen
    }
}

/// Fiducial marker detector: optional id allowlist, biggest `max(w, h)` wins.
pub struct MarkerDetector<S> {
    source: S,
    filter: DetectionFilter,
}

impl<S: CandidateSource> MarkerDetector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: DetectionFilter::default(),
        }
    }

    pub fn only_these_ids(mut self, ids: Option<Vec<u32>>) -> Self {
        self.filter.only_these_ids = ids;
        self
    }
}

impl<S: CandidateSource> Detector for MarkerDetector<S> {
    fn name(&self) -> &str {
        "marker"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        _previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox> {
        let candidates: Vec<Candidate> = enumerate(&mut self.source, frame)
            .into_iter()
            .filter(|c| c.marker.is_some())
            .collect();
        for candidate in &candidates {
            if let Some(marker) = &candidate.marker {
                annotations.push(Annotation::Marker {
                    corners: marker.corners,
                    id: marker.id,
                });
            }
        }
        select::biggest_marker(&candidates, &self.filter).map(|c| c.bbox)
    }
}

/// Cascade-style detector (faces and the like).
///
/// With a previous box available and `nearest_to_previous` enabled, the candidate
/// closest to it wins; otherwise the widest.
pub struct CascadeDetector<S> {
    source: S,
    nearest_to_previous: bool,
}

impl<S: CandidateSource> CascadeDetector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            nearest_to_previous: true,
        }
    }

    pub fn nearest_to_previous(mut self, enabled: bool) -> Self {
        self.nearest_to_previous = enabled;
        self
    }
}

impl<S: CandidateSource> Detector for CascadeDetector<S> {
    fn name(&self) -> &str {
        "cascade"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        previous: Option<BoundingBox>,
        annotations: &mut Annotations,
    ) -> Option<BoundingBox> {
        let candidates = enumerate(&mut self.source, frame);
        let any = DetectionFilter::default();
        let chosen = match previous {
            Some(prev) if self.nearest_to_previous => select::nearest_to(&candidates, &any, &prev),
            _ => select::widest(&candidates, &any),
        }
        .map(|c| c.bbox);
        annotate(&candidates, chosen, annotations);
        chosen
    }
}

fn enumerate<S: CandidateSource>(source: &mut S, frame: &Frame) -> Vec<Candidate> {
    match source.candidates(frame) {
        Ok(candidates) => {
            log::trace!("{}: {} raw candidates", source.name(), candidates.len());
            candidates
        }
        Err(e) => {
            log::warn!("detector back-end {} failed: {:#}", source.name(), e);
            Vec::new()
        }
    }
}

fn annotate(candidates: &[Candidate], chosen: Option<BoundingBox>, annotations: &mut Annotations) {
    let mut marked = false;
    for candidate in candidates {
        let accepted = !marked && Some(candidate.bbox) == chosen;
        marked |= accepted;
        annotations.push(Annotation::Candidate {
            bbox: candidate.bbox,
            label: candidate.caption(),
            accepted,
        });
    }
}
