//! Frame container and the annotation side channel.
//!
//! - `Frame`: single-channel (luma) pixel buffer, immutable for one control cycle.
//! - `Annotations`: overlay commands produced while deciding, kept apart from the
//!   pixels so decision logic never depends on a renderer.

use anyhow::{anyhow, Result};

use crate::geometry::BoundingBox;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// Row-major 8-bit luma frame.
///
/// Pixel data is private; consumers read it through `pixels()` or `luma()` and
/// cannot mutate it during a cycle.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Sequence number assigned by the source (1-based).
    pub sequence: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} luma bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    /// Uniform frame, mostly useful for tests and simulated trackers.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
            sequence: 0,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Same frame turned upside down (camera mounted inverted).
    pub fn rotated_180(mut self) -> Self {
        self.data.reverse();
        self
    }

    /// Luma at `(x, y)`, `None` outside the frame.
    pub fn luma(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Count of pixels at or above `threshold` inside `bbox` (clamped to the frame).
    pub fn count_at_least(&self, bbox: &BoundingBox, threshold: u8) -> u64 {
        let area = bbox.clamp_to(self.width, self.height);
        let mut count = 0u64;
        for y in area.y..area.bottom() {
            let row = y as usize * self.width as usize;
            for x in area.x..area.right() {
                if self.data[row + x as usize] >= threshold {
                    count += 1;
                }
            }
        }
        count
    }
}

// ----------------------------------------------------------------------------
// Annotations
// ----------------------------------------------------------------------------

/// One overlay command.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    /// Raw detector candidate. `accepted` marks the one that was returned.
    Candidate {
        bbox: BoundingBox,
        label: String,
        accepted: bool,
    },
    /// Fiducial marker outline with its id.
    Marker { corners: [(f32, f32); 4], id: u32 },
    /// Tracker output with its diagnostic comment.
    Track { bbox: BoundingBox, comment: String },
    /// Free text at the bottom of the frame.
    Status(String),
}

/// Collects annotations for the current cycle.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    items: Vec<Annotation>,
    disabled: bool,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that discards everything pushed into it.
    pub fn disabled() -> Self {
        Self {
            items: Vec::new(),
            disabled: true,
        }
    }

    pub fn push(&mut self, annotation: Annotation) {
        if !self.disabled {
            self.items.push(annotation);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take this cycle's annotations, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Annotation> {
        std::mem::take(&mut self.items)
    }
}
