use std::time::Instant;

const FPS_WINDOW_SECONDS: f64 = 5.0;

/// Exponentially windowed frames-per-second estimate.
///
/// Each tick decays the previous estimate by the elapsed fraction of a 5 s
/// window and adds one window's worth of frame credit.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    recent_fps: f64,
    last_tick: Option<Instant>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self {
            recent_fps: 0.0,
            last_tick: None,
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        let dt = elapsed / FPS_WINDOW_SECONDS;
        self.recent_fps = self.recent_fps / (1.0 + dt) + 1.0 / FPS_WINDOW_SECONDS;
        self.last_tick = Some(now);
    }

    pub fn fps(&self) -> f64 {
        self.recent_fps
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn converges_toward_tick_rate() {
        let mut meter = FpsMeter::new();
        let start = Instant::now();
        for i in 0..2000u64 {
            meter.tick_at(start + Duration::from_millis(i * 50));
        }
        assert!((meter.fps() - 20.0).abs() < 1.0, "fps {}", meter.fps());
    }

    #[test]
    fn decays_when_frames_stop() {
        let mut meter = FpsMeter::new();
        let start = Instant::now();
        for i in 0..500u64 {
            meter.tick_at(start + Duration::from_millis(i * 100));
        }
        let steady = meter.fps();
        meter.tick_at(start + Duration::from_secs(120));
        assert!(meter.fps() < steady / 2.0);
    }
}
