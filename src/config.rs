use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::actuate::MotorDirections;
use crate::control::{ControlLaw, LawSettings, Platform};
use crate::ingest::SourceConfig;
use crate::track::TrackerConfig;

const DEFAULT_SEEK_WINDOW_FRAMES: u64 = 40;
const DEFAULT_LUMA_THRESHOLD: u8 = 160;
const DEFAULT_SEARCH_MARGIN: f32 = 1.0;

#[derive(Debug, Deserialize, Default)]
struct PursuitConfigFile {
    source: Option<SourceConfigFile>,
    tracker: Option<TrackerConfigFile>,
    detector: Option<DetectorConfigFile>,
    pursuit: Option<PursuitSectionFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
    flip: Option<bool>,
    seed: Option<u64>,
    drop_rate: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    enabled: Option<bool>,
    search_margin: Option<f32>,
    reinit_interval_frames: Option<u64>,
    max_frames_without_object: Option<u64>,
    min_accepted_score: Option<f32>,
    divergence_fraction: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    kind: Option<String>,
    valid_classes: Option<Vec<String>>,
    min_confidence: Option<f32>,
    marker_ids: Option<Vec<u32>>,
    nearest_to_previous: Option<bool>,
    luma_threshold: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct PursuitSectionFile {
    platform: Option<String>,
    law: Option<String>,
    seek_window_frames: Option<u64>,
    tilt_correction: Option<f32>,
    motor_directions: Option<[i8; 2]>,
    laws: Option<LawSettings>,
}

/// Which detector family drives full detections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorKind {
    Object,
    Marker,
    Cascade,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Object => "object",
            DetectorKind::Marker => "marker",
            DetectorKind::Cascade => "cascade",
        }
    }
}

impl FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "object" | "yolo" => Ok(DetectorKind::Object),
            "marker" | "apriltag" => Ok(DetectorKind::Marker),
            "cascade" | "face" => Ok(DetectorKind::Cascade),
            other => Err(anyhow!("unknown detector kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    pub valid_classes: Option<Vec<String>>,
    pub min_confidence: Option<f32>,
    pub marker_ids: Option<Vec<u32>>,
    pub nearest_to_previous: bool,
    /// Luma threshold for the built-in blob back-end and window tracker.
    pub luma_threshold: u8,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Object,
            valid_classes: None,
            min_confidence: None,
            marker_ids: None,
            nearest_to_previous: true,
            luma_threshold: DEFAULT_LUMA_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PursuitSettings {
    pub platform: Platform,
    pub law: ControlLaw,
    /// How long (in frames) a lost target is still chased toward its last side.
    pub seek_window_frames: u64,
    pub tilt_correction: f32,
    pub motor_directions: MotorDirections,
    pub laws: LawSettings,
}

impl Default for PursuitSettings {
    fn default() -> Self {
        Self {
            platform: Platform::Ground,
            law: ControlLaw::default_for(Platform::Ground),
            seek_window_frames: DEFAULT_SEEK_WINDOW_FRAMES,
            tilt_correction: 0.0,
            motor_directions: MotorDirections::default(),
            laws: LawSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PursuitConfig {
    pub source: SourceConfig,
    pub tracker_enabled: bool,
    /// Window tracker search area, in box sizes on each side.
    pub tracker_search_margin: f32,
    pub tracker: TrackerConfig,
    pub detector: DetectorSettings,
    pub pursuit: PursuitSettings,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            tracker_enabled: true,
            tracker_search_margin: DEFAULT_SEARCH_MARGIN,
            tracker: TrackerConfig::default(),
            detector: DetectorSettings::default(),
            pursuit: PursuitSettings::default(),
        }
    }
}

impl PursuitConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PURSUIT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like `load()`, with an explicit config file instead of `PURSUIT_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PursuitConfigFile) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(source) = file.source {
            let s = &mut cfg.source;
            if let Some(url) = source.url {
                s.url = url;
            }
            s.width = source.width.unwrap_or(s.width);
            s.height = source.height.unwrap_or(s.height);
            s.target_fps = source.target_fps.unwrap_or(s.target_fps);
            s.flip = source.flip.unwrap_or(s.flip);
            s.seed = source.seed.unwrap_or(s.seed);
            s.drop_rate = source.drop_rate.unwrap_or(s.drop_rate);
        }

        if let Some(tracker) = file.tracker {
            cfg.tracker_enabled = tracker.enabled.unwrap_or(true);
            cfg.tracker_search_margin = tracker.search_margin.unwrap_or(cfg.tracker_search_margin);
            let t = &mut cfg.tracker;
            t.reinit_interval_frames = tracker
                .reinit_interval_frames
                .unwrap_or(t.reinit_interval_frames);
            t.max_frames_without_object = tracker
                .max_frames_without_object
                .unwrap_or(t.max_frames_without_object);
            t.min_accepted_score = tracker.min_accepted_score.unwrap_or(t.min_accepted_score);
            t.divergence_fraction = tracker
                .divergence_fraction
                .unwrap_or(t.divergence_fraction);
        }

        if let Some(detector) = file.detector {
            let d = &mut cfg.detector;
            if let Some(kind) = detector.kind {
                d.kind = kind.parse()?;
            }
            d.valid_classes = detector.valid_classes;
            d.min_confidence = detector.min_confidence;
            d.marker_ids = detector.marker_ids;
            d.nearest_to_previous = detector
                .nearest_to_previous
                .unwrap_or(d.nearest_to_previous);
            d.luma_threshold = detector.luma_threshold.unwrap_or(d.luma_threshold);
        }

        if let Some(pursuit) = file.pursuit {
            let p = &mut cfg.pursuit;
            if let Some(platform) = pursuit.platform {
                p.platform = platform.parse()?;
            }
            p.law = match pursuit.law {
                Some(law) => law.parse()?,
                None => ControlLaw::default_for(p.platform),
            };
            p.seek_window_frames = pursuit
                .seek_window_frames
                .unwrap_or(p.seek_window_frames);
            p.tilt_correction = pursuit.tilt_correction.unwrap_or(p.tilt_correction);
            if let Some([left, right]) = pursuit.motor_directions {
                p.motor_directions = MotorDirections { left, right };
            }
            if let Some(laws) = pursuit.laws {
                p.laws = laws;
            }
        }

        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PURSUIT_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        let law_override = match std::env::var("PURSUIT_CONTROL_LAW") {
            Ok(law) if !law.trim().is_empty() => Some(law.parse::<ControlLaw>()?),
            _ => None,
        };
        if let Ok(platform) = std::env::var("PURSUIT_PLATFORM") {
            if !platform.trim().is_empty() {
                self.set_platform(platform.parse()?);
            }
        }
        if let Some(law) = law_override {
            self.pursuit.law = law;
        }
        if let Ok(kind) = std::env::var("PURSUIT_DETECTOR") {
            if !kind.trim().is_empty() {
                self.detector.kind = kind.parse()?;
            }
        }
        if let Ok(interval) = std::env::var("PURSUIT_REINIT_INTERVAL") {
            self.tracker.reinit_interval_frames = interval.trim().parse().map_err(|_| {
                anyhow!("PURSUIT_REINIT_INTERVAL must be an integer number of frames")
            })?;
        }
        if let Ok(frames) = std::env::var("PURSUIT_MAX_FRAMES_WITHOUT_OBJECT") {
            self.tracker.max_frames_without_object = frames.trim().parse().map_err(|_| {
                anyhow!("PURSUIT_MAX_FRAMES_WITHOUT_OBJECT must be an integer number of frames")
            })?;
        }
        if let Ok(score) = std::env::var("PURSUIT_MIN_TRACK_SCORE") {
            self.tracker.min_accepted_score = score
                .trim()
                .parse()
                .map_err(|_| anyhow!("PURSUIT_MIN_TRACK_SCORE must be a number"))?;
        }
        if let Ok(classes) = std::env::var("PURSUIT_VALID_CLASSES") {
            let parsed = split_csv(&classes);
            if !parsed.is_empty() {
                self.detector.valid_classes = Some(parsed);
            }
        }
        if let Ok(ids) = std::env::var("PURSUIT_MARKER_IDS") {
            let parsed = split_csv(&ids)
                .iter()
                .map(|id| {
                    id.parse::<u32>()
                        .map_err(|_| anyhow!("PURSUIT_MARKER_IDS entry '{}' is not an id", id))
                })
                .collect::<Result<Vec<_>>>()?;
            if !parsed.is_empty() {
                self.detector.marker_ids = Some(parsed);
            }
        }
        Ok(())
    }

    /// Switch platform, picking that platform's default law if the current
    /// one cannot drive it.
    pub fn set_platform(&mut self, platform: Platform) {
        self.pursuit.platform = platform;
        if self.pursuit.law.platform() != platform {
            self.pursuit.law = ControlLaw::default_for(platform);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.source;
        if s.width == 0 || s.height == 0 {
            return Err(anyhow!("source dimensions must be nonzero"));
        }
        if s.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&s.drop_rate) {
            return Err(anyhow!("source drop_rate must be within [0, 1]"));
        }

        let t = &self.tracker;
        if t.reinit_interval_frames == 0 {
            return Err(anyhow!("tracker reinit interval must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&t.min_accepted_score) {
            return Err(anyhow!("tracker min_accepted_score must be within [0, 1]"));
        }
        if !(t.divergence_fraction > 0.0 && t.divergence_fraction <= 1.0) {
            return Err(anyhow!("tracker divergence_fraction must be within (0, 1]"));
        }
        if !(self.tracker_search_margin.is_finite() && self.tracker_search_margin >= 0.0) {
            return Err(anyhow!("tracker search_margin must be a non-negative number"));
        }

        if let Some(confidence) = self.detector.min_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(anyhow!("detector min_confidence must be within [0, 1]"));
            }
        }

        let p = &self.pursuit;
        if p.law.platform() != p.platform {
            return Err(anyhow!(
                "control law {:?} does not drive a {:?} platform",
                p.law,
                p.platform
            ));
        }
        if p.laws.proportional.target_size <= 0.0 || p.laws.bang_bang.target_size <= 0.0 {
            return Err(anyhow!("target_size must be greater than zero"));
        }
        p.motor_directions.validate()?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PursuitConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = PursuitConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.pursuit.law, ControlLaw::Chase);
        assert!(cfg.tracker_enabled);
    }

    #[test]
    fn mismatched_law_is_rejected() {
        let mut cfg = PursuitConfig::default();
        cfg.pursuit.law = ControlLaw::BangBang;
        assert!(cfg.validate().is_err());
        cfg.set_platform(Platform::Air);
        assert_eq!(cfg.pursuit.law, ControlLaw::BangBang);
        cfg.validate().unwrap();
    }

    #[test]
    fn platform_switch_picks_default_law() {
        let mut cfg = PursuitConfig::default();
        cfg.set_platform(Platform::Air);
        assert_eq!(cfg.pursuit.law, ControlLaw::Proportional);
    }

    #[test]
    fn negative_search_margin_is_rejected() {
        let mut cfg = PursuitConfig::default();
        cfg.tracker_search_margin = -0.5;
        assert!(cfg.validate().is_err());
        cfg.tracker_search_margin = 0.0;
        cfg.validate().unwrap();
    }

    #[test]
    fn csv_split_drops_blanks() {
        assert_eq!(split_csv(" person, ,sports ball,"), vec!["person", "sports ball"]);
    }
}
