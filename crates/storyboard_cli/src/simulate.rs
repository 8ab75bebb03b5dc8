//! `storyboard simulate`: one follower on a manual clock.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use damping::{DampedFollower, FollowerConfig, FrameScheduler, ManualScheduler, ticks_to_converge};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::SimulateArgs;

/// One value handed to the update callback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Emission {
    pub time_ms: f64,
    pub value: f64,
}

/// Outcome of a simulated run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub from: f64,
    pub to: f64,
    pub config: FollowerConfig,
    pub frame_ms: f64,
    pub frames: usize,
    /// Frames the decay formula predicts, snap included.
    pub estimated_frames: Option<u64>,
    pub settled: bool,
    pub final_value: f64,
    pub emissions: Vec<Emission>,
}

/// Builds the follower config: file first, then flag overrides.
pub fn resolve_config(args: &SimulateArgs) -> Result<FollowerConfig> {
    let mut config = match &args.config {
        Some(path) => FollowerConfig::from_file(path)
            .with_context(|| format!("loading follower config {}", path.display()))?,
        None => FollowerConfig::default(),
    };
    if let Some(tau) = args.tau {
        config = config.with_tau(tau);
    }
    if let Some(epsilon) = args.epsilon {
        config = config.with_epsilon(epsilon);
    }
    if let Some(fps) = args.fps {
        config = config.with_fps(fps);
    }
    config.validate().context("invalid follower config")?;
    Ok(config)
}

/// Drives a follower from `args.from` to `args.to` until the scheduler
/// goes idle or `args.max_frames` is reached.
pub fn simulate(args: &SimulateArgs) -> Result<SimulationReport> {
    if !args.frame_ms.is_finite() || args.frame_ms <= 0.0 {
        bail!("--frame-ms must be positive, got {}", args.frame_ms);
    }
    let config = resolve_config(args)?;

    let scheduler = Rc::new(ManualScheduler::new());
    let emissions = Rc::new(RefCell::new(Vec::new()));

    let clock = Rc::clone(&scheduler);
    let sink = Rc::clone(&emissions);
    let follower = DampedFollower::new(
        args.from,
        move |value| {
            sink.borrow_mut().push(Emission {
                time_ms: clock.now(),
                value,
            });
        },
        config,
        scheduler.clone(),
    );

    follower.set_target(args.to);
    let frames = scheduler.run_until_idle(args.frame_ms, args.max_frames);
    let settled = scheduler.is_idle();
    let final_value = follower.value();
    drop(follower);

    if settled {
        debug!(simulate.frames = frames, simulate.value = final_value, "Follower settled");
    } else {
        info!(simulate.frames = frames, "Frame limit reached before settling");
    }

    let emissions = emissions.take();
    Ok(SimulationReport {
        from: args.from,
        to: args.to,
        config,
        frame_ms: args.frame_ms,
        frames,
        estimated_frames: ticks_to_converge(
            args.to - args.from,
            config.epsilon,
            config.tau,
            args.frame_ms / 1000.0,
        ),
        settled,
        final_value,
        emissions,
    })
}

/// Human-readable report.
pub fn render_text(report: &SimulationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} -> {}  (tau {}s, epsilon {}, fps {}, frame {}ms)",
        report.from,
        report.to,
        report.config.tau,
        report.config.epsilon,
        report.config.fps,
        report.frame_ms
    );
    for emission in &report.emissions {
        let _ = writeln!(out, "{:>9.1} ms  {:>12.4}", emission.time_ms, emission.value);
    }
    let status = if report.settled { "settled" } else { "not settled" };
    let _ = writeln!(
        out,
        "{status} after {} frames, {} emissions, final value {}",
        report.frames,
        report.emissions.len(),
        report.final_value
    );
    if let Some(estimate) = report.estimated_frames {
        let _ = writeln!(out, "estimated {estimate} frames");
    }
    out
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let report = simulate(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
