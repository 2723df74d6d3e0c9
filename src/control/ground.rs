use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedPose;

use super::drive::ArcadeCommand;
use super::PursuitStatus;

/// Three-band steering: turn toward targets outside the center band, drive
/// straight inside it, and explore slowly when nothing is visible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandLaw {
    /// Half-width of the center band in pose units.
    pub band: f32,
    pub turn_speed: f32,
    /// Forward speed while turning toward an off-center target.
    pub creep_speed: f32,
    /// Forward speed inside the center band.
    pub cruise_speed: f32,
    /// Lost-target behavior. `None` stops the base.
    pub explore: Option<ArcadeCommand>,
}

impl Default for BandLaw {
    fn default() -> Self {
        Self {
            // 440/640 and 200/640 of a VGA frame
            band: 18.75,
            turn_speed: 0.15,
            creep_speed: 0.1,
            cruise_speed: 0.3,
            explore: Some(ArcadeCommand::new(-0.1, 0.15)),
        }
    }
}

impl BandLaw {
    pub fn steer(
        &self,
        pose: Option<&NormalizedPose>,
        recent: Option<&NormalizedPose>,
    ) -> (ArcadeCommand, PursuitStatus) {
        if let Some(pose) = pose {
            let command = if pose.x > self.band {
                ArcadeCommand::new(self.creep_speed, self.turn_speed)
            } else if pose.x < -self.band {
                ArcadeCommand::new(self.creep_speed, -self.turn_speed)
            } else {
                ArcadeCommand::new(self.cruise_speed, 0.0)
            };
            return (command.saturate(), PursuitStatus::Chasing);
        }

        match self.explore {
            Some(explore) => {
                // bias the exploratory turn toward where the target was last seen
                let side = recent.map_or(1.0, |p| p.side());
                let command = ArcadeCommand::new(explore.forward, side * explore.turn.abs());
                (command.saturate(), PursuitStatus::Seeking)
            }
            None => (ArcadeCommand::STOP, PursuitStatus::Idle),
        }
    }
}

/// Full-speed chase: drive at the target until it looks big enough, turn hard
/// when it drifts off center, and keep turning toward the last known side for
/// a short while after losing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseLaw {
    /// Stop approaching once `pose.size` reaches this.
    pub approach_size: f32,
    pub approach_speed: f32,
    /// Turn when `|pose.x|` exceeds this.
    pub turn_threshold: f32,
    pub turn_speed: f32,
    pub seek_forward: f32,
    pub seek_turn: f32,
}

impl Default for ChaseLaw {
    fn default() -> Self {
        Self {
            approach_size: 30.0,
            approach_speed: 1.0,
            turn_threshold: 15.0,
            turn_speed: 0.75,
            seek_forward: 0.2,
            seek_turn: 0.7,
        }
    }
}

impl ChaseLaw {
    pub fn steer(
        &self,
        pose: Option<&NormalizedPose>,
        recent: Option<&NormalizedPose>,
    ) -> (ArcadeCommand, PursuitStatus) {
        if let Some(pose) = pose {
            let forward = if pose.size < self.approach_size {
                self.approach_speed
            } else {
                0.0
            };
            let turn = if pose.x > self.turn_threshold {
                self.turn_speed
            } else if pose.x < -self.turn_threshold {
                -self.turn_speed
            } else {
                0.0
            };
            return (
                ArcadeCommand::new(forward, turn).saturate(),
                PursuitStatus::Chasing,
            );
        }

        match recent {
            Some(last) => (
                ArcadeCommand::new(self.seek_forward, last.side() * self.seek_turn).saturate(),
                PursuitStatus::Seeking,
            ),
            None => (ArcadeCommand::STOP, PursuitStatus::Idle),
        }
    }
}
