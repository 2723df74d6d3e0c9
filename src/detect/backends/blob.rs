use anyhow::Result;

use crate::detect::backend::CandidateSource;
use crate::detect::result::{Candidate, MarkerInfo};
use crate::frame::Frame;
use crate::geometry::BoundingBox;

/// Luma bucket width used to derive marker ids from blob brightness.
const MARKER_ID_BUCKET: u32 = 16;

/// Bright-blob back-end.
///
/// Finds 4-connected regions at or above `threshold` and reports each one as a
/// candidate. Regions brighter than `target_luma` on average are labelled
/// `"target"`, the rest `"blob"`. Confidence is the fill ratio of the region's
/// bounding box. With `report_markers` enabled every region also carries a
/// marker outline whose id encodes its mean brightness (intensity-coded
/// markers in synthetic scenes).
pub struct BlobBackend {
    threshold: u8,
    target_luma: u8,
    min_area: u32,
    report_markers: bool,
    visited: Vec<bool>,
    stack: Vec<(i32, i32)>,
}

impl BlobBackend {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            target_luma: 200,
            min_area: 16,
            report_markers: false,
            visited: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn with_min_area(mut self, min_area: u32) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_markers(mut self, enabled: bool) -> Self {
        self.report_markers = enabled;
        self
    }

    fn flood(&mut self, frame: &Frame, seed: (i32, i32)) -> Region {
        let width = frame.width as i32;
        let mut region = Region::new(seed);
        self.stack.clear();
        self.stack.push(seed);
        self.visited[(seed.1 * width + seed.0) as usize] = true;

        while let Some((x, y)) = self.stack.pop() {
            let luma = frame.luma(x, y).unwrap_or(0);
            region.add(x, y, luma);
            for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                let Some(value) = frame.luma(nx, ny) else {
                    continue;
                };
                let idx = (ny * width + nx) as usize;
                if value >= self.threshold && !self.visited[idx] {
                    self.visited[idx] = true;
                    self.stack.push((nx, ny));
                }
            }
        }
        region
    }
}

impl CandidateSource for BlobBackend {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn candidates(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        let len = frame.pixels().len();
        self.visited.clear();
        self.visited.resize(len, false);

        let width = frame.width as i32;
        let mut out = Vec::new();
        for (idx, &value) in frame.pixels().iter().enumerate() {
            if value < self.threshold || self.visited[idx] {
                continue;
            }
            let seed = (idx as i32 % width, idx as i32 / width);
            let region = self.flood(frame, seed);
            if region.pixels < self.min_area as u64 {
                continue;
            }
            out.push(region.into_candidate(self.target_luma, self.report_markers));
        }
        Ok(out)
    }
}

struct Region {
    min: (i32, i32),
    max: (i32, i32),
    pixels: u64,
    luma_sum: u64,
}

impl Region {
    fn new(seed: (i32, i32)) -> Self {
        Self {
            min: seed,
            max: seed,
            pixels: 0,
            luma_sum: 0,
        }
    }

    fn add(&mut self, x: i32, y: i32, luma: u8) {
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
        self.pixels += 1;
        self.luma_sum += luma as u64;
    }

    fn into_candidate(self, target_luma: u8, report_markers: bool) -> Candidate {
        let bbox = BoundingBox::new(
            self.min.0,
            self.min.1,
            self.max.0 - self.min.0 + 1,
            self.max.1 - self.min.1 + 1,
        );
        let mean = (self.luma_sum / self.pixels.max(1)) as u32;
        let fill = self.pixels as f32 / bbox.area().max(1) as f32;
        let label = if mean >= target_luma as u32 {
            "target"
        } else {
            "blob"
        };
        let candidate = Candidate::new(bbox)
            .with_label(label)
            .with_confidence(fill.min(1.0));
        if !report_markers {
            return candidate;
        }
        let (x0, y0) = (self.min.0 as f32, self.min.1 as f32);
        let (x1, y1) = (self.max.0 as f32, self.max.1 as f32);
        candidate.with_marker(MarkerInfo {
            id: mean / MARKER_ID_BUCKET,
            corners: [(x0, y0), (x1, y0), (x1, y1), (x0, y1)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_squares(squares: &[(i32, i32, i32, u8)]) -> Frame {
        let (w, h) = (120u32, 80u32);
        let mut data = vec![10u8; (w * h) as usize];
        for &(sx, sy, side, luma) in squares {
            for y in sy..sy + side {
                for x in sx..sx + side {
                    data[(y as u32 * w + x as u32) as usize] = luma;
                }
            }
        }
        Frame::new(data, w, h, 1).unwrap()
    }

    #[test]
    fn finds_each_bright_region() {
        let frame = frame_with_squares(&[(5, 5, 10, 240), (60, 30, 20, 150)]);
        let mut backend = BlobBackend::new(100);
        let found = backend.candidates(&frame).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].bbox, BoundingBox::new(5, 5, 10, 10));
        assert_eq!(found[0].label.as_deref(), Some("target"));
        assert_eq!(found[1].bbox, BoundingBox::new(60, 30, 20, 20));
        assert_eq!(found[1].label.as_deref(), Some("blob"));
        assert_eq!(found[1].confidence, Some(1.0));
    }

    #[test]
    fn drops_specks_below_min_area() {
        let frame = frame_with_squares(&[(5, 5, 2, 240), (40, 40, 8, 240)]);
        let mut backend = BlobBackend::new(100).with_min_area(10);
        let found = backend.candidates(&frame).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox.x, 40);
    }

    #[test]
    fn marker_ids_encode_brightness() {
        let frame = frame_with_squares(&[(5, 5, 10, 240)]);
        let mut backend = BlobBackend::new(100).with_markers(true);
        let found = backend.candidates(&frame).unwrap();
        let marker = found[0].marker.unwrap();
        assert_eq!(marker.id, 240 / MARKER_ID_BUCKET);
        assert_eq!(found[0].bbox, BoundingBox::new(5, 5, 10, 10));
    }
}
