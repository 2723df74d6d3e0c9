use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::geometry::BoundingBox;

use super::tracker::{TrackerReading, VisualTracker};

/// Bright-region tracker over a local search window.
///
/// Each update looks for pixels at or above `threshold` in the previous box
/// grown by `search_margin` box sizes on every side, recenters the box on their
/// centroid, and scores the result by how much of the new box is bright.
pub struct WindowTracker {
    threshold: u8,
    search_margin: f32,
    current: Option<BoundingBox>,
}

impl WindowTracker {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            search_margin: 1.0,
            current: None,
        }
    }

    pub fn with_search_margin(mut self, margin: f32) -> Self {
        self.search_margin = margin.max(0.0);
        self
    }

    fn search_window(&self, bbox: &BoundingBox, frame: &Frame) -> BoundingBox {
        let dx = (bbox.w as f32 * self.search_margin).round() as i32;
        let dy = (bbox.h as f32 * self.search_margin).round() as i32;
        BoundingBox::new(
            bbox.x.saturating_sub(dx),
            bbox.y.saturating_sub(dy),
            bbox.w.saturating_add(dx.saturating_mul(2)),
            bbox.h.saturating_add(dy.saturating_mul(2)),
        )
        .clamp_to(frame.width, frame.height)
    }
}

impl VisualTracker for WindowTracker {
    fn name(&self) -> &'static str {
        "window"
    }

    fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<()> {
        if bbox.w == 0 || bbox.h == 0 {
            return Err(anyhow!("cannot track an empty box {:?}", bbox));
        }
        self.current = Some(bbox);
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<TrackerReading> {
        let bbox = self
            .current
            .ok_or_else(|| anyhow!("window tracker updated before init"))?;
        let window = self.search_window(&bbox, frame);

        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
        for y in window.y..window.bottom() {
            for x in window.x..window.right() {
                if frame.luma(x, y).map_or(false, |v| v >= self.threshold) {
                    sum_x += x as u64;
                    sum_y += y as u64;
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Ok(TrackerReading::missing());
        }

        let cx = (sum_x as f32 / count as f32).round() as i32;
        let cy = (sum_y as f32 / count as f32).round() as i32;
        let moved = BoundingBox::new(cx - bbox.w / 2, cy - bbox.h / 2, bbox.w, bbox.h);
        let area = moved.area().max(1) as f32;
        let score = (frame.count_at_least(&moved, self.threshold) as f32 / area).min(1.0);

        self.current = Some(moved);
        Ok(TrackerReading::located(moved, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_square(x: usize, y: usize, side: usize) -> Frame {
        let (w, h) = (64usize, 48usize);
        let mut data = vec![0u8; w * h];
        for row in y..y + side {
            for col in x..x + side {
                data[row * w + col] = 255;
            }
        }
        Frame::new(data, w as u32, h as u32, 1).unwrap()
    }

    #[test]
    fn follows_a_moving_square() {
        let mut tracker = WindowTracker::new(128);
        tracker
            .init(&frame_with_square(10, 10, 8), BoundingBox::new(10, 10, 8, 8))
            .unwrap();
        let reading = tracker.update(&frame_with_square(14, 12, 8)).unwrap();
        assert!(reading.ok);
        assert_eq!(reading.bbox.w, 8);
        assert!((reading.bbox.x - 14).abs() <= 1);
        assert!((reading.bbox.y - 12).abs() <= 1);
        assert!(reading.score > 0.7);
    }

    #[test]
    fn target_outside_window_is_missing() {
        let mut tracker = WindowTracker::new(128);
        tracker
            .init(&frame_with_square(2, 2, 4), BoundingBox::new(2, 2, 4, 4))
            .unwrap();
        let reading = tracker.update(&frame_with_square(50, 36, 4)).unwrap();
        assert!(!reading.ok);
    }

    #[test]
    fn box_far_outside_the_pixel_range_reads_missing() {
        let mut tracker = WindowTracker::new(128).with_search_margin(2.0);
        let frame = frame_with_square(10, 10, 8);
        tracker
            .init(&frame, BoundingBox::new(i32::MAX - 5, i32::MAX - 5, 10, 10))
            .unwrap();
        assert!(!tracker.update(&frame).unwrap().ok);
    }

    #[test]
    fn update_before_init_is_an_error() {
        let mut tracker = WindowTracker::new(128);
        assert!(tracker.update(&Frame::filled(8, 8, 0)).is_err());
        assert!(tracker
            .init(&Frame::filled(8, 8, 0), BoundingBox::new(0, 0, 0, 3))
            .is_err());
    }
}
