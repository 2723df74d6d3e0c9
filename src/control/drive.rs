use serde::{Deserialize, Serialize};

/// Forward/turn request for a differential-drive base.
///
/// Both values nominally in `[-1, 1]`; positive `turn` is a right turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcadeCommand {
    pub forward: f32,
    pub turn: f32,
}

impl ArcadeCommand {
    pub const STOP: ArcadeCommand = ArcadeCommand {
        forward: 0.0,
        turn: 0.0,
    };

    pub fn new(forward: f32, turn: f32) -> Self {
        Self { forward, turn }
    }

    /// Clamp into the drivable envelope.
    ///
    /// Turning has priority: forward speed is limited to `1 - |turn|`, so a full
    /// turn request zeroes forward motion. NaN inputs become zero.
    pub fn saturate(&self) -> ArcadeCommand {
        let turn = finite_or_zero(self.turn).clamp(-1.0, 1.0);
        let max_forward = 1.0 - turn.abs();
        let forward = finite_or_zero(self.forward).clamp(-max_forward, max_forward);
        ArcadeCommand { forward, turn }
    }

    pub fn is_stop(&self) -> bool {
        self.forward == 0.0 && self.turn == 0.0
    }
}

/// Per-wheel duty in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub left: f32,
    pub right: f32,
}

/// Mix a forward/turn request into left/right wheel speeds.
pub fn arcade_drive(command: ArcadeCommand) -> WheelSpeeds {
    let ArcadeCommand { forward, turn } = command.saturate();
    WheelSpeeds {
        left: forward + turn,
        right: forward - turn,
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_speeds_stay_in_range() {
        let forwards = [-10.0, -1.0, -0.5, 0.0, 0.3, 1.0, 7.5, f32::NAN];
        for step in 0..=40 {
            let turn = -1.0 + step as f32 * 0.05;
            for &forward in &forwards {
                let speeds = arcade_drive(ArcadeCommand::new(forward, turn));
                assert!(
                    (-1.0..=1.0).contains(&speeds.left) && (-1.0..=1.0).contains(&speeds.right),
                    "forward {} turn {} -> {:?}",
                    forward,
                    turn,
                    speeds
                );
            }
        }
    }

    #[test]
    fn full_turn_spins_in_place() {
        let speeds = arcade_drive(ArcadeCommand::new(1.0, 1.0));
        assert_eq!(speeds, WheelSpeeds { left: 1.0, right: -1.0 });
    }

    #[test]
    fn turn_request_is_clamped() {
        let cmd = ArcadeCommand::new(0.5, -3.0).saturate();
        assert_eq!(cmd, ArcadeCommand::new(0.0, -1.0));
    }

    #[test]
    fn partial_turn_limits_forward() {
        let cmd = ArcadeCommand::new(1.0, 0.25).saturate();
        assert!((cmd.forward - 0.75).abs() < 1e-6);
        let speeds = arcade_drive(cmd);
        assert!((speeds.left - 1.0).abs() < 1e-6);
        assert!((speeds.right - 0.5).abs() < 1e-6);
    }
}
