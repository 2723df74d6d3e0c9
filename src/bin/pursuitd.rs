//! pursuitd - pursuit control daemon
//!
//! This daemon:
//! 1. Loads configuration (file from PURSUIT_CONFIG or --config, then env)
//! 2. Opens the frame source and starts the (simulated) actuator
//! 3. Runs detect-or-track + pursuit control once per frame
//! 4. Stops the actuator on Ctrl-C, frame limit, or source exhaustion

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pursuit_kernel::actuate::simulated_driver;
use pursuit_kernel::config::DetectorKind;
use pursuit_kernel::control::{ActuatorCommand, ControlLaw, Platform, PursuitStatus};
use pursuit_kernel::ingest::FpsMeter;
use pursuit_kernel::{
    open_source, BoundingBox, Frame, PursuitConfig, PursuitSession, StepOutcome,
};

#[path = "../ui.rs"]
mod ui;

const HEALTH_LOG_INTERVAL: u64 = 100;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "PURSUIT_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    frames: Option<u64>,

    /// Platform override (ground|air).
    #[arg(long)]
    platform: Option<String>,

    /// Control law override (band|chase|proportional|bang_bang).
    #[arg(long)]
    law: Option<String>,

    /// Detector override (object|marker|cascade).
    #[arg(long)]
    detector: Option<String>,

    /// Seed the tracker on the first frame with x,y,w,h.
    #[arg(long, value_name = "X,Y,W,H")]
    select: Option<String>,

    /// Run as fast as frames arrive instead of pacing to target_fps.
    #[arg(long)]
    no_pace: bool,

    /// Detect and track only; the actuator is held stopped.
    #[arg(long)]
    disengaged: bool,

    /// Status display on stderr (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    status: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();

    ui::stage("load configuration");
    let mut cfg = PursuitConfig::load_from(args.config.as_deref())?;
    if let Some(platform) = &args.platform {
        cfg.set_platform(platform.parse::<Platform>()?);
    }
    if let Some(law) = &args.law {
        cfg.pursuit.law = law.parse::<ControlLaw>()?;
    }
    if let Some(kind) = &args.detector {
        cfg.detector.kind = kind.parse::<DetectorKind>()?;
    }
    cfg.validate()?;
    let selection = args.select.as_deref().map(parse_box).transpose()?;

    ui::stage("open frame source");
    let mut source = open_source(&cfg.source)?;
    source.connect()?;

    let mut session = PursuitSession::new(&cfg)?;
    session.set_chasing(!args.disengaged);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    // nothing fallible may sit between start() and the shutdown below
    ui::stage("start actuator");
    let mut driver = simulated_driver(&cfg.pursuit)?;
    driver.start()?;

    let pace = if args.no_pace {
        None
    } else {
        Some(Duration::from_secs_f64(1.0 / cfg.source.target_fps as f64))
    };

    log::info!(
        "pursuitd running: source={} platform={:?} law={:?} driver={}",
        cfg.source.url,
        cfg.pursuit.platform,
        cfg.pursuit.law,
        driver.name()
    );

    let mut status_line = ui::StatusLine::new(ui::UiMode::parse(Some(&args.status)), is_tty);
    let mut fps = FpsMeter::new();
    let mut tally = Tally::default();
    let mut selection = selection;
    let mut cycles = 0u64;

    let result = loop {
        if stop.load(Ordering::SeqCst) {
            log::info!("shutdown signal received");
            break Ok(());
        }
        if args.frames.map_or(false, |limit| cycles >= limit) {
            break Ok(());
        }
        if !source.is_healthy() {
            log::info!("source {} exhausted", cfg.source.url);
            break Ok(());
        }
        let cycle_start = Instant::now();
        cycles += 1;

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame acquisition failed: {:#}", e);
                None
            }
        };
        fps.tick();

        if let Err(e) = apply_selection(&mut session, frame.as_ref(), &mut selection) {
            break Err(e);
        }

        match session.step(frame.as_ref()) {
            Some(outcome) => {
                if let Err(e) = driver.apply(&outcome.command) {
                    break Err(e);
                }
                tally.record(&outcome);
                status_line.update(
                    &outcome.status.to_string(),
                    &format!(
                        "{} | {} | {:.1} fps",
                        describe_outcome(&outcome),
                        driver.describe(),
                        fps.fps()
                    ),
                );
            }
            None => tally.gaps += 1,
        }

        if cycles % HEALTH_LOG_INTERVAL == 0 {
            let stats = source.stats();
            log::info!(
                "health: cycles={} captured={} dropped={} fps={:.1} chasing={} seeking={} idle={}",
                cycles,
                stats.frames_captured,
                stats.frames_dropped,
                fps.fps(),
                tally.chasing,
                tally.seeking,
                tally.idle
            );
        }

        if let Some(interval) = pace {
            let spent = cycle_start.elapsed();
            if spent < interval {
                std::thread::sleep(interval - spent);
            }
        }
    };

    if let Err(e) = driver.shutdown() {
        log::error!("actuator shutdown failed: {:#}", e);
    }
    status_line.finish(&format!(
        "{} cycles, {} chasing, {} seeking, {} idle, {} disengaged, {} without frame",
        cycles, tally.chasing, tally.seeking, tally.idle, tally.disengaged, tally.gaps
    ));
    result
}

#[derive(Default)]
struct Tally {
    chasing: u64,
    seeking: u64,
    idle: u64,
    disengaged: u64,
    gaps: u64,
}

impl Tally {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome.status {
            PursuitStatus::Chasing => self.chasing += 1,
            PursuitStatus::Seeking => self.seeking += 1,
            PursuitStatus::Idle => self.idle += 1,
            PursuitStatus::Disengaged => self.disengaged += 1,
        }
    }
}

/// Seed the tracker with the pending `--select` box on the first real frame.
///
/// A cycle without a frame leaves the selection pending.
fn apply_selection(
    session: &mut PursuitSession,
    frame: Option<&Frame>,
    selection: &mut Option<BoundingBox>,
) -> Result<()> {
    let Some(frame) = frame else {
        return Ok(());
    };
    match selection.take() {
        Some(bbox) => session.select_target(frame, bbox),
        None => Ok(()),
    }
}

fn describe_outcome(outcome: &StepOutcome) -> String {
    let pose = match outcome.pose {
        Some(p) => format!("x={:+.0} y={:+.0} size={:.0}", p.x, p.y, p.size),
        None => "no target".to_string(),
    };
    let command = match outcome.command {
        ActuatorCommand::Ground(c) => format!("fwd={:+.2} turn={:+.2}", c.forward, c.turn),
        ActuatorCommand::Air(c) => format!(
            "rc={} {} {} {}",
            c.roll, c.forward, c.vertical, c.yaw
        ),
    };
    match outcome.comment {
        Some(comment) => format!("{pose} | {command} | {comment}"),
        None => format!("{pose} | {command}"),
    }
}

fn parse_box(value: &str) -> Result<BoundingBox> {
    let parts = value
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<i32>()
                .map_err(|_| anyhow!("--select expects X,Y,W,H integers, got '{}'", value))
        })
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(BoundingBox::new(*x, *y, *w, *h)),
        _ => Err(anyhow!("--select expects X,Y,W,H, got '{}'", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_box_parsing() {
        assert_eq!(parse_box("1, 2,3,4").unwrap(), BoundingBox::new(1, 2, 3, 4));
        assert!(parse_box("1,2,3").is_err());
        assert!(parse_box("a,b,c,d").is_err());
    }

    #[test]
    fn selection_survives_a_missing_frame() {
        let mut session = PursuitSession::new(&PursuitConfig::default()).unwrap();
        let mut selection = Some(BoundingBox::new(100, 100, 40, 40));

        apply_selection(&mut session, None, &mut selection).unwrap();
        assert_eq!(selection, Some(BoundingBox::new(100, 100, 40, 40)));
        assert!(!session.tracker().map_or(false, |t| t.is_tracking()));

        let frame = Frame::filled(640, 480, 0);
        apply_selection(&mut session, Some(&frame), &mut selection).unwrap();
        assert!(selection.is_none());
        assert!(session.tracker().map_or(false, |t| t.is_tracking()));
    }
}
