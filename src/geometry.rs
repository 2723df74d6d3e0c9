//! Pixel boxes and the frame-independent pose derived from them.
//!
//! Detectors and trackers report `BoundingBox` values in pixel space. They are
//! free to report boxes that spill past the frame edge; everything in this module
//! clamps instead of failing. Controllers only ever see `NormalizedPose`.

use serde::{Deserialize, Serialize};

/// Half-range of the normalized x/y axes.
pub const POSE_HALF_RANGE: f32 = 50.0;

/// Upper bound of `NormalizedPose::size`.
pub const POSE_MAX_SIZE: f32 = 100.0;

/// Axis-aligned pixel rectangle, `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    /// Negative sizes are folded to zero.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Bounding rectangle of a polygon, inclusive of the extreme pixels.
    pub fn from_corners(corners: &[(f32, f32)]) -> Option<Self> {
        let first = corners.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(px, py) in &corners[1..] {
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
        }
        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        let w = (max_x.floor() as i32).saturating_sub(x).saturating_add(1);
        let h = (max_y.floor() as i32).saturating_sub(y).saturating_add(1);
        Some(Self::new(x, y, w, h))
    }

    /// Saturates at `i32::MAX` for boxes reported near the edge of the pixel range.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }

    /// Manhattan distance between the two box centers.
    pub fn center_l1_distance(&self, other: &BoundingBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).abs() + (ay - by).abs()
    }

    /// Intersection with the `width x height` frame rectangle.
    ///
    /// A box entirely outside the frame collapses to a zero-sized box on the
    /// nearest edge.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let fw = i32::try_from(width).unwrap_or(i32::MAX);
        let fh = i32::try_from(height).unwrap_or(i32::MAX);
        let x0 = self.x.clamp(0, fw);
        let y0 = self.y.clamp(0, fh);
        let x1 = self.right().clamp(0, fw);
        let y1 = self.bottom().clamp(0, fh);
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// True when the box spans more than `fraction` of the frame width or height.
    pub fn exceeds_fraction_of(&self, fraction: f32, width: u32, height: u32) -> bool {
        self.w as f32 > fraction * width as f32 || self.h as f32 > fraction * height as f32
    }
}

/// Target position relative to the frame center plus its apparent size.
///
/// - `x` in `[-50, 50]`, positive to the right of center
/// - `y` in `[-50, 50]`, positive above center
/// - `size` in `[0, 100]`, the larger of the width/height fractions times 100
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPose {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl NormalizedPose {
    /// Derive a pose from a pixel box.
    ///
    /// `tilt_correction` is subtracted from `y`; cameras on forward-tilted mounts
    /// (a quadrotor pitching into forward flight) see targets slightly low.
    pub fn from_bbox(bbox: &BoundingBox, width: u32, height: u32, tilt_correction: f32) -> Self {
        if width == 0 || height == 0 {
            return Self {
                x: 0.0,
                y: 0.0,
                size: 0.0,
            };
        }
        let clamped = bbox.clamp_to(width, height);
        let (cx, cy) = clamped.center();
        let fw = width as f32;
        let fh = height as f32;

        let x = 100.0 * (cx / fw - 0.5);
        let y = -100.0 * (cy / fh - 0.5) - tilt_correction;
        let size = 100.0 * (clamped.w as f32 / fw).max(clamped.h as f32 / fh);

        Self {
            x: x.clamp(-POSE_HALF_RANGE, POSE_HALF_RANGE),
            y: y.clamp(-POSE_HALF_RANGE, POSE_HALF_RANGE),
            size: size.clamp(0.0, POSE_MAX_SIZE),
        }
    }

    /// `None` in, `None` out.
    pub fn from_optional(
        bbox: Option<&BoundingBox>,
        width: u32,
        height: u32,
        tilt_correction: f32,
    ) -> Option<Self> {
        bbox.map(|b| Self::from_bbox(b, width, height, tilt_correction))
    }

    /// Which half of the frame the target sits in (`-1.0` left, `1.0` right).
    pub fn side(&self) -> f32 {
        if self.x < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}
