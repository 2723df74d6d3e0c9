//! Synthetic scene source (`stub://`).
//!
//! Renders a dark noisy background with one bright square drifting along a
//! Lissajous path. The square is periodically occluded and frames are dropped
//! at a configurable rate, so the whole detect/track/steer loop can be
//! exercised without a camera.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameSource, SourceConfig, SourceStats};
use crate::frame::Frame;
use crate::geometry::BoundingBox;

pub const TARGET_LUMA: u8 = 240;
const BACKGROUND_MAX_LUMA: u8 = 40;
const OCCLUSION_PERIOD: u64 = 120;
const OCCLUSION_FRAMES: u64 = 15;

pub struct SyntheticSource {
    config: SourceConfig,
    rng: StdRng,
    frames_captured: u64,
    frames_dropped: u64,
    target: Option<BoundingBox>,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            frames_captured: 0,
            frames_dropped: 0,
            target: None,
        }
    }

    /// Where the square was drawn on the last frame, if it was visible.
    pub fn target_box(&self) -> Option<BoundingBox> {
        self.target
    }

    fn target_at(&self, t: u64) -> Option<BoundingBox> {
        if t % OCCLUSION_PERIOD >= OCCLUSION_PERIOD - OCCLUSION_FRAMES {
            return None;
        }
        let w = self.config.width as f32;
        let h = self.config.height as f32;
        let side = (w.min(h) / 8.0).max(4.0) as i32;
        let phase = t as f32;
        let cx = w / 2.0 + 0.35 * w * (phase * 0.031).sin();
        let cy = h / 2.0 + 0.25 * h * (phase * 0.047).sin();
        Some(BoundingBox::new(
            cx as i32 - side / 2,
            cy as i32 - side / 2,
            side,
            side,
        ))
    }

    fn render(&mut self, target: Option<BoundingBox>) -> Result<Frame> {
        let (w, h) = (self.config.width, self.config.height);
        let mut pixels: Vec<u8> = (0..w as usize * h as usize)
            .map(|_| self.rng.gen_range(0..=BACKGROUND_MAX_LUMA))
            .collect();
        if let Some(bbox) = target {
            let area = bbox.clamp_to(w, h);
            for y in area.y..area.bottom() {
                let row = y as usize * w as usize;
                for x in area.x..area.right() {
                    pixels[row + x as usize] = TARGET_LUMA;
                }
            }
        }
        Frame::new(pixels, w, h, self.frames_captured)
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {} (synthetic)", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.frames_captured += 1;
        let t = self.frames_captured;

        if self.config.drop_rate > 0.0 && self.rng.gen::<f32>() < self.config.drop_rate {
            self.frames_dropped += 1;
            self.target = None;
            log::trace!("SyntheticSource: dropped frame {}", t);
            return Ok(None);
        }

        let target = self.target_at(t);
        self.target = target;
        let frame = self.render(target)?;
        Ok(Some(if self.config.flip {
            frame.rotated_180()
        } else {
            frame
        }))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            frames_dropped: self.frames_dropped,
            url: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            url: "stub://scene".to_string(),
            width: 160,
            height: 120,
            seed: 7,
            ..SourceConfig::default()
        }
    }

    #[test]
    fn draws_the_target_where_it_says() {
        let mut source = SyntheticSource::new(config());
        source.connect().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        let bbox = source.target_box().unwrap();
        let bright = frame.count_at_least(&bbox, TARGET_LUMA);
        assert_eq!(bright as i64, bbox.clamp_to(160, 120).area());
    }

    #[test]
    fn target_is_occluded_periodically() {
        let mut source = SyntheticSource::new(config());
        let mut hidden = 0;
        for _ in 0..OCCLUSION_PERIOD {
            source.next_frame().unwrap();
            if source.target_box().is_none() {
                hidden += 1;
            }
        }
        assert_eq!(hidden, OCCLUSION_FRAMES);
    }

    #[test]
    fn same_seed_same_frames() {
        let mut a = SyntheticSource::new(config());
        let mut b = SyntheticSource::new(config());
        let fa = a.next_frame().unwrap().unwrap();
        let fb = b.next_frame().unwrap().unwrap();
        assert_eq!(fa.pixels(), fb.pixels());
    }

    #[test]
    fn drops_frames_at_requested_rate() {
        let mut source = SyntheticSource::new(SourceConfig {
            drop_rate: 1.0,
            ..config()
        });
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_dropped, 1);
    }
}
