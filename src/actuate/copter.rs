use anyhow::{anyhow, bail, Result};

use crate::control::{ActuatorCommand, Platform, RcCommand, RcLimits};

use super::ActuatorDriver;

/// Quadrotor with a simulated flight controller.
///
/// RC commands are only forwarded while flying; a landed copter ignores them.
/// The command log only records changes.
pub struct SimulatedCopter {
    limits: RcLimits,
    connected: bool,
    flying: bool,
    last_sent: RcCommand,
    sent_changes: u64,
}

impl SimulatedCopter {
    pub fn new() -> Self {
        Self {
            limits: RcLimits::default(),
            connected: false,
            flying: false,
            last_sent: RcCommand::HOVER,
            sent_changes: 0,
        }
    }

    pub fn with_limits(mut self, limits: RcLimits) -> Self {
        self.limits = limits;
        self
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.connected {
            bail!("start() must be called first");
        }
        Ok(())
    }

    pub fn takeoff(&mut self) -> Result<()> {
        self.ensure_connected()?;
        if !self.flying {
            self.flying = true;
            log::info!("sim-copter: takeoff");
        }
        Ok(())
    }

    pub fn land(&mut self) -> Result<()> {
        self.ensure_connected()?;
        if self.flying {
            self.send_rc(RcCommand::HOVER)?;
            self.flying = false;
            log::info!("sim-copter: landed");
        }
        Ok(())
    }

    pub fn send_rc(&mut self, command: RcCommand) -> Result<()> {
        self.ensure_connected()?;
        if !self.flying {
            log::debug!("sim-copter: not flying, ignoring {:?}", command);
            return Ok(());
        }
        let command = self.limits.clamp(command);
        if command != self.last_sent {
            log::info!(
                "sim-copter: rc roll={} fwd={} vert={} yaw={}",
                command.roll,
                command.forward,
                command.vertical,
                command.yaw
            );
            self.last_sent = command;
            self.sent_changes += 1;
        }
        Ok(())
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    pub fn last_sent(&self) -> RcCommand {
        self.last_sent
    }

    /// Number of distinct commands forwarded so far.
    pub fn sent_changes(&self) -> u64 {
        self.sent_changes
    }
}

impl Default for SimulatedCopter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorDriver for SimulatedCopter {
    fn name(&self) -> &'static str {
        "sim-copter"
    }

    fn platform(&self) -> Platform {
        Platform::Air
    }

    fn start(&mut self) -> Result<()> {
        if self.connected {
            bail!("copter already started");
        }
        self.connected = true;
        log::info!("sim-copter: connected (synthetic)");
        self.takeoff()
    }

    fn apply(&mut self, command: &ActuatorCommand) -> Result<()> {
        match command {
            ActuatorCommand::Air(cmd) => self.send_rc(*cmd),
            ActuatorCommand::Ground(_) => Err(anyhow!("sim-copter cannot apply a ground command")),
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.send_rc(RcCommand::HOVER)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.land()
    }

    fn describe(&self) -> String {
        let c = self.last_sent;
        format!(
            "{} rc: {} {} {} {}",
            if self.flying { "flying" } else { "landed" },
            c.roll,
            c.forward,
            c.vertical,
            c.yaw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc(yaw: i32) -> RcCommand {
        RcCommand {
            yaw,
            ..RcCommand::HOVER
        }
    }

    #[test]
    fn requires_start() {
        let mut copter = SimulatedCopter::new();
        assert!(copter.apply(&ActuatorCommand::Air(rc(10))).is_err());
        assert!(copter.takeoff().is_err());
    }

    #[test]
    fn only_changes_are_forwarded() {
        let mut copter = SimulatedCopter::new();
        copter.start().unwrap();
        assert!(copter.is_flying());
        copter.apply(&ActuatorCommand::Air(rc(10))).unwrap();
        copter.apply(&ActuatorCommand::Air(rc(10))).unwrap();
        copter.apply(&ActuatorCommand::Air(rc(-10))).unwrap();
        assert_eq!(copter.sent_changes(), 2);
        assert_eq!(copter.last_sent(), rc(-10));
    }

    #[test]
    fn landed_copter_ignores_commands() {
        let mut copter = SimulatedCopter::new();
        copter.start().unwrap();
        copter.shutdown().unwrap();
        assert!(!copter.is_flying());
        copter.apply(&ActuatorCommand::Air(rc(30))).unwrap();
        assert_eq!(copter.last_sent(), RcCommand::HOVER);
    }

    #[test]
    fn commands_are_clamped() {
        let mut copter = SimulatedCopter::new();
        copter.start().unwrap();
        copter.send_rc(rc(500)).unwrap();
        assert_eq!(copter.last_sent().yaw, 100);
    }
}
