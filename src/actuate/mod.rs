//! Actuator drivers.
//!
//! Drivers receive already-clamped commands from the control layer and clamp
//! again on their own side. Using a driver before `start()` is a programming
//! error and fails loudly.

mod car;
mod copter;

use anyhow::Result;

use crate::config::PursuitSettings;
use crate::control::{ActuatorCommand, Platform};

pub use car::{duty_cycle, MotorDirections, SimulatedCar, FULL_FORWARD, ZERO_THROTTLE};
pub use copter::SimulatedCopter;

pub trait ActuatorDriver: Send {
    fn name(&self) -> &'static str;

    fn platform(&self) -> Platform;

    /// Bring the platform to a state where it accepts commands.
    fn start(&mut self) -> Result<()>;

    fn apply(&mut self, command: &ActuatorCommand) -> Result<()>;

    /// Zero every axis. The platform stays started.
    fn stop(&mut self) -> Result<()>;

    /// Leave the platform safe at the end of a run.
    fn shutdown(&mut self) -> Result<()> {
        self.stop()
    }

    /// One-line state summary for the status display.
    fn describe(&self) -> String;
}

/// Simulated driver for the configured platform.
///
/// The copter clamps with the same `RcLimits` the air laws steer with.
pub fn simulated_driver(settings: &PursuitSettings) -> Result<Box<dyn ActuatorDriver>> {
    match settings.platform {
        Platform::Ground => Ok(Box::new(SimulatedCar::new(settings.motor_directions)?)),
        Platform::Air => Ok(Box::new(
            SimulatedCopter::new().with_limits(settings.laws.limits),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlLaw, RcCommand, RcLimits};

    #[test]
    fn copter_driver_uses_configured_limits() {
        let mut settings = PursuitSettings {
            platform: Platform::Air,
            law: ControlLaw::Proportional,
            ..PursuitSettings::default()
        };
        settings.laws.limits = RcLimits {
            roll: 80.0,
            ..RcLimits::default()
        };
        let mut driver = simulated_driver(&settings).unwrap();
        assert_eq!(driver.platform(), Platform::Air);
        driver.start().unwrap();
        driver
            .apply(&ActuatorCommand::Air(RcCommand {
                roll: 75,
                ..RcCommand::HOVER
            }))
            .unwrap();
        assert_eq!(driver.describe(), "flying rc: 75 0 0 0");
    }

    #[test]
    fn car_driver_takes_motor_directions() {
        let mut settings = PursuitSettings::default();
        settings.motor_directions = MotorDirections { left: 0, right: 1 };
        assert!(simulated_driver(&settings).is_err());
        settings.motor_directions = MotorDirections::default();
        assert_eq!(simulated_driver(&settings).unwrap().platform(), Platform::Ground);
    }
}
