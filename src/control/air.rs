use serde::{Deserialize, Serialize};

use crate::geometry::NormalizedPose;

/// Four-axis RC command in the flight controller's units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RcCommand {
    pub roll: i32,
    pub forward: i32,
    pub vertical: i32,
    pub yaw: i32,
}

impl RcCommand {
    pub const HOVER: RcCommand = RcCommand {
        roll: 0,
        forward: 0,
        vertical: 0,
        yaw: 0,
    };

    pub fn is_hover(&self) -> bool {
        *self == Self::HOVER
    }
}

/// Per-axis magnitude limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcLimits {
    pub roll: f32,
    pub forward: f32,
    pub vertical: f32,
    pub yaw: f32,
}

impl Default for RcLimits {
    fn default() -> Self {
        Self {
            roll: 50.0,
            forward: 100.0,
            vertical: 50.0,
            yaw: 100.0,
        }
    }
}

impl RcLimits {
    /// Clamp each axis and truncate toward zero. NaN becomes zero.
    pub fn command(&self, roll: f32, forward: f32, vertical: f32, yaw: f32) -> RcCommand {
        RcCommand {
            roll: clamp_axis(roll, self.roll),
            forward: clamp_axis(forward, self.forward),
            vertical: clamp_axis(vertical, self.vertical),
            yaw: clamp_axis(yaw, self.yaw),
        }
    }

    pub fn clamp(&self, command: RcCommand) -> RcCommand {
        self.command(
            command.roll as f32,
            command.forward as f32,
            command.vertical as f32,
            command.yaw as f32,
        )
    }
}

fn clamp_axis(value: f32, limit: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let limit = limit.abs();
    value.clamp(-limit, limit) as i32
}

// ----------------------------------------------------------------------------
// Proportional
// ----------------------------------------------------------------------------

/// Proportional follow law.
///
/// Yaw and roll share one gain on `pose.x`. Forward speed follows the inverse
/// size error `1/size - 1/target_size`, capped while the target is far off
/// center, and doubled when retreating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProportionalLaw {
    pub turn_gain: f32,
    pub climb_gain: f32,
    pub forward_gain: f32,
    /// `pose.size` at which the vehicle holds distance.
    pub target_size: f32,
    /// Forward speed when the target is tiny (below 1% of `target_size`).
    pub max_forward: f32,
    /// Off-center threshold on `|pose.x|` beyond which forward speed is capped.
    pub misaligned_x: f32,
    pub misaligned_forward_cap: f32,
    pub retreat_factor: f32,
}

impl Default for ProportionalLaw {
    fn default() -> Self {
        Self {
            turn_gain: 0.9,
            climb_gain: 1.5,
            forward_gain: 600.0,
            target_size: 20.0,
            max_forward: 100.0,
            misaligned_x: 25.0,
            misaligned_forward_cap: 25.0,
            retreat_factor: 2.0,
        }
    }
}

impl ProportionalLaw {
    /// Unclamped forward speed for a target of apparent `size`.
    pub fn forward_speed(&self, size: f32) -> f32 {
        if size < 0.01 * self.target_size {
            self.max_forward
        } else {
            self.forward_gain * (1.0 / size - 1.0 / self.target_size)
        }
    }

    pub fn steer(&self, pose: &NormalizedPose, limits: &RcLimits) -> RcCommand {
        let turn = pose.x * self.turn_gain;
        let vertical = pose.y * self.climb_gain;

        let mut forward = self.forward_speed(pose.size);
        if pose.x.abs() > self.misaligned_x {
            forward = forward.min(self.misaligned_forward_cap);
        }
        if forward < 0.0 {
            forward *= self.retreat_factor;
        }

        limits.command(turn, forward, vertical, turn)
    }
}

// ----------------------------------------------------------------------------
// Bang-bang
// ----------------------------------------------------------------------------

/// Coarse law: each axis at a fixed speed outside its deadband, zero inside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BangBangLaw {
    pub x_deadband: f32,
    pub y_deadband: f32,
    /// Approach below `near_fraction * target_size`, retreat above `far_fraction * target_size`.
    pub near_fraction: f32,
    pub far_fraction: f32,
    pub target_size: f32,
    pub turn_speed: f32,
    pub vertical_speed: f32,
    pub forward_speed: f32,
}

impl Default for BangBangLaw {
    fn default() -> Self {
        Self {
            x_deadband: 25.0,
            y_deadband: 25.0,
            near_fraction: 0.5,
            far_fraction: 1.5,
            target_size: 20.0,
            turn_speed: 40.0,
            vertical_speed: 50.0,
            forward_speed: 90.0,
        }
    }
}

impl BangBangLaw {
    pub fn steer(&self, pose: &NormalizedPose, limits: &RcLimits) -> RcCommand {
        let turn = bang(pose.x, self.x_deadband, self.turn_speed);
        let vertical = bang(pose.y, self.y_deadband, self.vertical_speed);
        let forward = if pose.size < self.near_fraction * self.target_size {
            self.forward_speed
        } else if pose.size > self.far_fraction * self.target_size {
            -self.forward_speed
        } else {
            0.0
        };
        limits.command(turn, forward, vertical, turn)
    }
}

fn bang(error: f32, deadband: f32, speed: f32) -> f32 {
    if error > deadband {
        speed
    } else if error < -deadband {
        -speed
    } else {
        0.0
    }
}

// ----------------------------------------------------------------------------
// Seek
// ----------------------------------------------------------------------------

/// Slow yaw toward the last known side while the target is briefly lost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekBehavior {
    pub yaw_speed: f32,
    pub forward_speed: f32,
}

impl Default for SeekBehavior {
    fn default() -> Self {
        Self {
            yaw_speed: 50.0,
            forward_speed: 10.0,
        }
    }
}

impl SeekBehavior {
    /// Hover when there is no recent sighting.
    pub fn steer(&self, recent: Option<&NormalizedPose>, limits: &RcLimits) -> RcCommand {
        match recent {
            Some(last) => {
                limits.command(0.0, self.forward_speed, 0.0, last.side() * self.yaw_speed)
            }
            None => RcCommand::HOVER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32, y: f32, size: f32) -> NormalizedPose {
        NormalizedPose { x, y, size }
    }

    #[test]
    fn forward_speed_follows_inverse_size() {
        let law = ProportionalLaw {
            forward_gain: 6.0,
            ..ProportionalLaw::default()
        };
        assert!((law.forward_speed(10.0) - 0.3).abs() < 1e-6);
        assert!(law.forward_speed(30.0) < 0.0);
        assert_eq!(law.forward_speed(0.1), law.max_forward);
    }

    #[test]
    fn smaller_targets_never_approach_slower() {
        let law = ProportionalLaw::default();
        let mut previous = f32::INFINITY;
        for step in 1..=100 {
            let speed = law.forward_speed(step as f32);
            assert!(speed <= previous, "size {} sped up", step);
            previous = speed;
        }
    }

    #[test]
    fn yaw_and_roll_are_coupled_and_clamped() {
        let limits = RcLimits::default();
        let cmd = ProportionalLaw::default().steer(&pose(50.0, -50.0, 20.0), &limits);
        assert_eq!(cmd.yaw, 45);
        assert_eq!(cmd.roll, 45);
        assert_eq!(cmd.vertical, -50);
        assert_eq!(cmd.forward, 0);

        let wide = ProportionalLaw {
            turn_gain: 5.0,
            ..ProportionalLaw::default()
        };
        let cmd = wide.steer(&pose(40.0, 0.0, 20.0), &limits);
        assert_eq!(cmd.roll, 50);
        assert_eq!(cmd.yaw, 100);
    }

    #[test]
    fn misaligned_target_caps_forward() {
        let cmd = ProportionalLaw::default().steer(&pose(30.0, 0.0, 5.0), &RcLimits::default());
        assert_eq!(cmd.forward, 25);
    }

    #[test]
    fn retreat_is_doubled() {
        let law = ProportionalLaw::default();
        let cmd = law.steer(&pose(0.0, 0.0, 40.0), &RcLimits::default());
        // 600 * (1/40 - 1/20) = -15, doubled
        assert_eq!(cmd.forward, -30);
    }

    #[test]
    fn bang_bang_respects_deadbands() {
        let law = BangBangLaw::default();
        let limits = RcLimits::default();
        assert_eq!(law.steer(&pose(10.0, -10.0, 20.0), &limits), RcCommand::HOVER);

        let cmd = law.steer(&pose(30.0, -30.0, 5.0), &limits);
        assert_eq!(cmd.yaw, 40);
        assert_eq!(cmd.roll, 40);
        assert_eq!(cmd.vertical, -50);
        assert_eq!(cmd.forward, 90);

        assert_eq!(law.steer(&pose(0.0, 0.0, 35.0), &limits).forward, -90);
    }

    #[test]
    fn seek_yaws_toward_last_side() {
        let seek = SeekBehavior::default();
        let limits = RcLimits::default();
        let left = seek.steer(Some(&pose(-3.0, 0.0, 10.0)), &limits);
        assert_eq!(left.yaw, -50);
        assert_eq!(left.forward, 10);
        assert_eq!(seek.steer(Some(&pose(3.0, 0.0, 10.0)), &limits).yaw, 50);
        assert!(seek.steer(None, &limits).is_hover());
    }
}
