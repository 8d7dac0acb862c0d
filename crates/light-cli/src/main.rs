// crates/light-cli/src/main.rs
//
// CLI entrypoint for the Light farm developer tools.
//
// `light schedule` prints the halving emission table; `light simulate`
// replays a scripted staking scenario against an in-memory chain.

mod commands;
mod output;
mod runner;
mod scenario;

use clap::{Parser, Subcommand};
use commands::schedule::ScheduleCmd;
use commands::simulate::SimulateCmd;

#[derive(Parser, Debug)]
#[command(
    name = "light",
    version = "0.1.0",
    about = "Light farm CLI: emission schedules and staking scenario replay"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the halving schedule and range emission for a pool kind.
    Schedule(ScheduleCmd),

    /// Replay a scenario file and report balances, positions, pools and areas.
    Simulate(SimulateCmd),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    match &cli.command {
        Commands::Schedule(cmd) => commands::schedule::run(cmd)?,
        Commands::Simulate(cmd) => commands::simulate::run(cmd)?,
    }

    Ok(())
}
