use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// One raw detection reported by a back-end, before any filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    /// Class name, for back-ends that classify.
    pub label: Option<String>,
    /// Confidence in `0..=1`, for back-ends that score.
    pub confidence: Option<f32>,
    /// Fiducial identity and outline, for marker back-ends.
    pub marker: Option<MarkerInfo>,
}

impl Candidate {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            label: None,
            confidence: None,
            marker: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach marker info; the box becomes the bounding rectangle of the corners.
    pub fn with_marker(mut self, marker: MarkerInfo) -> Self {
        if let Some(rect) = BoundingBox::from_corners(&marker.corners) {
            self.bbox = rect;
        }
        self.marker = Some(marker);
        self
    }

    /// Overlay caption.
    pub fn caption(&self) -> String {
        match (&self.marker, &self.label, self.confidence) {
            (Some(marker), _, _) => format!("id {}", marker.id),
            (None, Some(label), Some(conf)) => format!("{} @ conf={:.2}", label, conf),
            (None, Some(label), None) => label.clone(),
            (None, None, Some(conf)) => format!("conf={:.2}", conf),
            (None, None, None) => String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerInfo {
    pub id: u32,
    pub corners: [(f32, f32); 4],
}

/// Eligibility rules applied before choosing the best candidate.
///
/// Every `None` field means "no restriction".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFilter {
    pub valid_classes: Option<Vec<String>>,
    pub min_confidence: Option<f32>,
    pub only_these_ids: Option<Vec<u32>>,
}

impl DetectionFilter {
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn marker_ids(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.only_these_ids = Some(ids.into_iter().collect());
        self
    }

    /// Whether `candidate` survives the filter.
    ///
    /// A class restriction rejects unlabeled candidates; a confidence floor
    /// rejects unscored ones; an id restriction rejects non-markers.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        if let Some(classes) = &self.valid_classes {
            match &candidate.label {
                Some(label) if classes.iter().any(|c| c == label) => {}
                _ => return false,
            }
        }
        if let Some(min_confidence) = self.min_confidence {
            match candidate.confidence {
                Some(conf) if conf >= min_confidence => {}
                _ => return false,
            }
        }
        if let Some(ids) = &self.only_these_ids {
            match &candidate.marker {
                Some(marker) if ids.contains(&marker.id) => {}
                _ => return false,
            }
        }
        true
    }
}
