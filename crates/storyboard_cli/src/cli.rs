//! Command-line interface for the `storyboard` binary.
//!
//! # Examples
//!
//! ```bash
//! # Trace a follower from 0 to 100 at 60 Hz
//! storyboard simulate --to 100 --tau 0.1
//!
//! # Same run with tuning from a file, emitted as JSON
//! storyboard simulate --to 100 --config follower.toml --json
//!
//! # Resolve every item of a storyboard file against a 1280x800 viewport
//! storyboard inspect story.toml --viewport 1280x800
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storyboard::Size;

/// Damped followers and storyboard files.
#[derive(Parser, Debug, Clone)]
#[command(name = "storyboard", author, version, about)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a damped follower against a simulated clock and print what it emits
    Simulate(SimulateArgs),

    /// Load a storyboard file and print how its items resolve
    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Starting value
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub from: f64,

    /// Target value
    #[arg(long, allow_negative_numbers = true)]
    pub to: f64,

    /// Follower config file (JSON or TOML); flags below override it
    #[arg(long, short = 'c', env = "STORYBOARD_FOLLOWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Decay time constant in seconds
    #[arg(long)]
    pub tau: Option<f64>,

    /// Snap threshold
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Maximum emissions per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Simulated time between animation frames, in milliseconds
    #[arg(long, default_value_t = 16.0)]
    pub frame_ms: f64,

    /// Give up after this many frames
    #[arg(long, default_value_t = 10_000)]
    pub max_frames: usize,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Storyboard file (.json, .toml, or .yaml with the `yaml` feature)
    pub file: PathBuf,

    /// Viewport size used to resolve percentages, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800", value_parser = parse_size)]
    pub viewport: Size,

    /// Height given to frames whose height is `auto`
    #[arg(long, default_value_t = 800.0)]
    pub auto_height: f64,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Parses `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<Size, String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| format!("invalid dimension '{part}' in '{s}'"))
    };
    Ok(Size::new(parse(width)?, parse(height)?))
}
