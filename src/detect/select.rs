//! Choosing one candidate out of many.
//!
//! All selectors break ties by keeping the first candidate encountered.

use crate::detect::result::{Candidate, DetectionFilter};
use crate::geometry::BoundingBox;

/// Widest surviving candidate.
pub fn widest<'a>(candidates: &'a [Candidate], filter: &DetectionFilter) -> Option<&'a Candidate> {
    best_by(candidates, filter, |c| c.bbox.w as i64)
}

/// Marker with the largest `max(w, h)` of its corner bounding rectangle.
pub fn biggest_marker<'a>(
    candidates: &'a [Candidate],
    filter: &DetectionFilter,
) -> Option<&'a Candidate> {
    best_by(candidates, filter, |c| c.bbox.w.max(c.bbox.h) as i64)
}

/// Candidate whose center is closest (L1) to `previous`.
pub fn nearest_to<'a>(
    candidates: &'a [Candidate],
    filter: &DetectionFilter,
    previous: &BoundingBox,
) -> Option<&'a Candidate> {
    let mut best: Option<(&Candidate, f32)> = None;
    for candidate in candidates.iter().filter(|c| filter.accepts(c)) {
        let distance = candidate.bbox.center_l1_distance(previous);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(c, _)| c)
}

fn best_by<'a, F>(
    candidates: &'a [Candidate],
    filter: &DetectionFilter,
    key: F,
) -> Option<&'a Candidate>
where
    F: Fn(&Candidate) -> i64,
{
    let mut best: Option<(&Candidate, i64)> = None;
    for candidate in candidates.iter().filter(|c| filter.accepts(c)) {
        let score = key(candidate);
        match best {
            Some((_, s)) if s >= score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(c, _)| c)
}
