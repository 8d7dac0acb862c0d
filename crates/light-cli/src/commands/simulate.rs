// crates/light-cli/src/commands/simulate.rs
//
// `light simulate` replays a scenario file and prints the resulting farm state.

use clap::Args;

use crate::output::{format_json, print_section, OutputFormat};
use crate::runner::{self, Report};
use crate::scenario::Scenario;

#[derive(Debug, Args)]
pub struct SimulateCmd {
    /// Scenario file (TOML).
    #[arg(long)]
    pub scenario: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Run the simulate subcommand.
pub fn run(cmd: &SimulateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&cmd.scenario)?;
    let report = runner::run(&scenario)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("Block:            {}", report.final_block);
    println!("Reward supply:    {}", report.reward_supply);
    println!("Reward owner:     {}", report.reward_owner);
    println!("Area fee balance: {}", report.area_fee_balance);
    println!();
    print_section("Steps", &report.steps);
    println!();
    print_section("Accounts", &report.accounts);
    println!();
    print_section("Positions", &report.positions);
    println!();
    print_section("Pools", &report.pools);
    println!();
    print_section("Areas", &report.areas);

    println!();
    println!("Events");
    for event in &report.events {
        println!("  {}", format_json_line(event));
    }
}

fn format_json_line<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}
