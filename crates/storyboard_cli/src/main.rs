#![forbid(unsafe_code)]

//! # Storyboard CLI
//!
//! Offline tooling for damped followers and storyboard files.
//!
//! ## Usage
//!
//! ```bash
//! storyboard simulate --to 100 --tau 0.1      # Trace a follower
//! storyboard inspect story.toml               # Resolve a storyboard
//! RUST_LOG=damping=trace storyboard simulate --to 5
//! ```

mod cli;
mod inspect;
mod simulate;

use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Simulate(args) => simulate::run(args),
        Command::Inspect(args) => inspect::run(args),
    }
}
