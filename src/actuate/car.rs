use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::control::{arcade_drive, ActuatorCommand, ArcadeCommand, Platform, WheelSpeeds};

use super::ActuatorDriver;

/// PWM duty for a stopped ESC.
pub const ZERO_THROTTLE: u32 = 75_000;
/// PWM duty for full forward.
pub const FULL_FORWARD: u32 = 100_000;

/// Duty cycle for a motor setpoint in `[-1, 1]` (clamped).
pub fn duty_cycle(setpoint: f32) -> u32 {
    let setpoint = if setpoint.is_finite() {
        setpoint.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let span = (FULL_FORWARD - ZERO_THROTTLE) as f32;
    (0.5 + ZERO_THROTTLE as f32 + span * setpoint) as u32
}

/// Mounting sign of the left and right motors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorDirections {
    pub left: i8,
    pub right: i8,
}

impl Default for MotorDirections {
    fn default() -> Self {
        Self { left: 1, right: 1 }
    }
}

impl MotorDirections {
    pub fn validate(&self) -> Result<()> {
        if self.left == 0 || self.right == 0 {
            return Err(anyhow!(
                "motor directions must be nonzero, got ({}, {})",
                self.left,
                self.right
            ));
        }
        Ok(())
    }
}

/// Differential-drive car with simulated PWM outputs.
pub struct SimulatedCar {
    directions: MotorDirections,
    started: bool,
    speeds: WheelSpeeds,
    duty: (u32, u32),
}

impl SimulatedCar {
    pub fn new(directions: MotorDirections) -> Result<Self> {
        directions.validate()?;
        Ok(Self {
            directions: MotorDirections {
                left: directions.left.signum(),
                right: directions.right.signum(),
            },
            started: false,
            speeds: WheelSpeeds::default(),
            duty: (ZERO_THROTTLE, ZERO_THROTTLE),
        })
    }

    fn ensure_started(&self) -> Result<()> {
        if !self.started {
            bail!("start() must be called first");
        }
        Ok(())
    }

    pub fn set_left_motor(&mut self, speed: f32) -> Result<()> {
        self.ensure_started()?;
        self.speeds.left = speed.clamp(-1.0, 1.0);
        self.duty.0 = duty_cycle(self.speeds.left * self.directions.left as f32);
        Ok(())
    }

    pub fn set_right_motor(&mut self, speed: f32) -> Result<()> {
        self.ensure_started()?;
        self.speeds.right = speed.clamp(-1.0, 1.0);
        self.duty.1 = duty_cycle(self.speeds.right * self.directions.right as f32);
        Ok(())
    }

    pub fn set_arcade_drive(&mut self, command: ArcadeCommand) -> Result<()> {
        let speeds = arcade_drive(command);
        self.set_left_motor(speeds.left)?;
        self.set_right_motor(speeds.right)
    }

    pub fn wheel_speeds(&self) -> WheelSpeeds {
        self.speeds
    }

    /// Current (left, right) PWM duty.
    pub fn duty(&self) -> (u32, u32) {
        self.duty
    }
}

impl ActuatorDriver for SimulatedCar {
    fn name(&self) -> &'static str {
        "sim-car"
    }

    fn platform(&self) -> Platform {
        Platform::Ground
    }

    fn start(&mut self) -> Result<()> {
        if self.started {
            bail!("car already started");
        }
        self.started = true;
        log::info!(
            "sim-car: started (motor directions {}, {})",
            self.directions.left,
            self.directions.right
        );
        Ok(())
    }

    fn apply(&mut self, command: &ActuatorCommand) -> Result<()> {
        match command {
            ActuatorCommand::Ground(cmd) => self.set_arcade_drive(*cmd),
            ActuatorCommand::Air(_) => Err(anyhow!("sim-car cannot apply an air command")),
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.set_left_motor(0.0)?;
        self.set_right_motor(0.0)
    }

    fn describe(&self) -> String {
        format!(
            "mtr%: {} {}",
            (100.0 * self.speeds.left) as i32,
            (100.0 * self.speeds.right) as i32
        )
    }
}
