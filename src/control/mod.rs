//! Pursuit control: normalized target pose in, pre-clamped actuator command out.
//!
//! Every law is a pure function of the current pose and the most recent sighting
//! (supplied by `PursuitMemory`); nothing here holds per-frame state.

mod air;
mod drive;
mod ground;
mod memory;

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedPose;

pub use air::{BangBangLaw, ProportionalLaw, RcCommand, RcLimits, SeekBehavior};
pub use drive::{arcade_drive, ArcadeCommand, WheelSpeeds};
pub use ground::{BandLaw, ChaseLaw};
pub use memory::PursuitMemory;

/// What the controller is doing this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuitStatus {
    Chasing,
    Seeking,
    Idle,
    /// Operator has disengaged pursuit; the target is still resolved.
    Disengaged,
}

impl fmt::Display for PursuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PursuitStatus::Chasing => "CHASING",
            PursuitStatus::Seeking => "SEEKING",
            PursuitStatus::Idle => "IDLE",
            PursuitStatus::Disengaged => "NOT CHASING",
        })
    }
}

/// Command for whichever platform is attached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum ActuatorCommand {
    Ground(ArcadeCommand),
    Air(RcCommand),
}

impl ActuatorCommand {
    /// Stop (ground) or hover (air).
    pub fn stop_for(platform: Platform) -> Self {
        match platform {
            Platform::Ground => ActuatorCommand::Ground(ArcadeCommand::STOP),
            Platform::Air => ActuatorCommand::Air(RcCommand::HOVER),
        }
    }

    pub fn is_stop(&self) -> bool {
        match self {
            ActuatorCommand::Ground(cmd) => cmd.is_stop(),
            ActuatorCommand::Air(cmd) => cmd.is_hover(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ground,
    Air,
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ground" | "car" => Ok(Platform::Ground),
            "air" | "copter" => Ok(Platform::Air),
            other => Err(anyhow!("unknown platform '{}'", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlLaw {
    Band,
    Chase,
    Proportional,
    BangBang,
}

impl ControlLaw {
    pub fn platform(&self) -> Platform {
        match self {
            ControlLaw::Band | ControlLaw::Chase => Platform::Ground,
            ControlLaw::Proportional | ControlLaw::BangBang => Platform::Air,
        }
    }

    /// Law used when only the platform is configured.
    pub fn default_for(platform: Platform) -> Self {
        match platform {
            Platform::Ground => ControlLaw::Chase,
            Platform::Air => ControlLaw::Proportional,
        }
    }
}

impl FromStr for ControlLaw {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "band" => Ok(ControlLaw::Band),
            "chase" => Ok(ControlLaw::Chase),
            "proportional" | "pid" => Ok(ControlLaw::Proportional),
            "bang_bang" | "bang" => Ok(ControlLaw::BangBang),
            other => Err(anyhow!("unknown control law '{}'", other)),
        }
    }
}

/// Tunables for every law; only the selected one is used.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LawSettings {
    pub band: BandLaw,
    pub chase: ChaseLaw,
    pub proportional: ProportionalLaw,
    pub bang_bang: BangBangLaw,
    pub seek: SeekBehavior,
    pub limits: RcLimits,
}

/// The selected control law, ready to steer.
#[derive(Clone, Debug, PartialEq)]
pub enum Controller {
    Band(BandLaw),
    Chase(ChaseLaw),
    Proportional {
        law: ProportionalLaw,
        seek: SeekBehavior,
        limits: RcLimits,
    },
    BangBang {
        law: BangBangLaw,
        seek: SeekBehavior,
        limits: RcLimits,
    },
}

impl Controller {
    pub fn new(law: ControlLaw, settings: &LawSettings) -> Self {
        match law {
            ControlLaw::Band => Controller::Band(settings.band.clone()),
            ControlLaw::Chase => Controller::Chase(settings.chase.clone()),
            ControlLaw::Proportional => Controller::Proportional {
                law: settings.proportional.clone(),
                seek: settings.seek.clone(),
                limits: settings.limits,
            },
            ControlLaw::BangBang => Controller::BangBang {
                law: settings.bang_bang.clone(),
                seek: settings.seek.clone(),
                limits: settings.limits,
            },
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Controller::Band(_) | Controller::Chase(_) => Platform::Ground,
            Controller::Proportional { .. } | Controller::BangBang { .. } => Platform::Air,
        }
    }

    /// Map this frame's pose (or its absence) to a command.
    ///
    /// `recent` is the last sighting still inside the memory window; it only
    /// matters when `pose` is absent.
    pub fn steer(
        &self,
        pose: Option<&NormalizedPose>,
        recent: Option<&NormalizedPose>,
    ) -> (ActuatorCommand, PursuitStatus) {
        match self {
            Controller::Band(law) => {
                let (cmd, status) = law.steer(pose, recent);
                (ActuatorCommand::Ground(cmd), status)
            }
            Controller::Chase(law) => {
                let (cmd, status) = law.steer(pose, recent);
                (ActuatorCommand::Ground(cmd), status)
            }
            Controller::Proportional { law, seek, limits } => {
                air_steer(pose, recent, seek, limits, |p| law.steer(p, limits))
            }
            Controller::BangBang { law, seek, limits } => {
                air_steer(pose, recent, seek, limits, |p| law.steer(p, limits))
            }
        }
    }
}

fn air_steer<F>(
    pose: Option<&NormalizedPose>,
    recent: Option<&NormalizedPose>,
    seek: &SeekBehavior,
    limits: &RcLimits,
    chase: F,
) -> (ActuatorCommand, PursuitStatus)
where
    F: FnOnce(&NormalizedPose) -> RcCommand,
{
    match (pose, recent) {
        (Some(p), _) => (ActuatorCommand::Air(chase(p)), PursuitStatus::Chasing),
        (None, Some(_)) => (
            ActuatorCommand::Air(seek.steer(recent, limits)),
            PursuitStatus::Seeking,
        ),
        (None, None) => (ActuatorCommand::Air(RcCommand::HOVER), PursuitStatus::Idle),
    }
}
