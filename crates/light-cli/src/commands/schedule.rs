// crates/light-cli/src/commands/schedule.rs
//
// `light schedule` prints the halving table for one pool kind, plus the
// emission over a block range.

use clap::{Args, ValueEnum};
use light_core::serde_amount;
use light_core::types::{Amount, BlockHeight};
use light_economics::{EmissionConfig, Light, PoolKind, RewardSchedule};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_json, print_section, OutputFormat};
use crate::scenario::load_emission_config;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Master,
    Slave,
}

impl From<KindArg> for PoolKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Master => PoolKind::Master,
            KindArg::Slave => PoolKind::Slave,
        }
    }
}

#[derive(Debug, Args)]
pub struct ScheduleCmd {
    /// Emission config file, or a scenario file with a `[farm]` table.
    #[arg(long)]
    pub config: Option<String>,

    /// Global reward per block, overriding the config file.
    #[arg(long, value_parser = serde_amount::parse)]
    pub reward_per_block: Option<Amount>,

    #[arg(long)]
    pub start_block: Option<BlockHeight>,

    #[arg(long)]
    pub halving_interval: Option<u64>,

    #[arg(long, value_enum, default_value_t = KindArg::Master)]
    pub kind: KindArg,

    /// Range start for the emission total (inclusive).
    #[arg(long)]
    pub from: Option<BlockHeight>,

    /// Range end for the emission total (exclusive).
    #[arg(long)]
    pub to: Option<BlockHeight>,

    /// Maximum number of halving segments to list.
    #[arg(long, default_value_t = 16)]
    pub limit: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize, Tabled)]
pub struct SegmentRow {
    pub segment: usize,
    pub from_block: BlockHeight,
    pub reward_per_block: Amount,
    #[tabled(rename = "LIGHT / block")]
    pub light_per_block: String,
}

#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub kind: PoolKind,
    pub segments: Vec<SegmentRow>,
    pub range: Option<RangeTotal>,
}

#[derive(Debug, Serialize)]
pub struct RangeTotal {
    pub from: BlockHeight,
    pub to: BlockHeight,
    pub kind_total: Amount,
    /// Pre-split emission from `start_block` up to `to`.
    pub cumulative: Amount,
}

/// Run the schedule subcommand.
pub fn run(cmd: &ScheduleCmd) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(cmd)?;
    let report = build(&config, cmd);

    match cmd.format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            print_section(&format!("Halving schedule ({} pools)", report.kind), &report.segments);
            if let Some(range) = &report.range {
                println!();
                println!(
                    "Blocks [{}, {}): {} ({})",
                    range.from,
                    range.to,
                    range.kind_total,
                    Light::from_units(range.kind_total)
                );
                println!(
                    "Cumulative emission to block {}: {} ({})",
                    range.to,
                    range.cumulative,
                    Light::from_units(range.cumulative)
                );
            }
        }
    }
    Ok(())
}

fn resolve_config(cmd: &ScheduleCmd) -> Result<EmissionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cmd.config {
        Some(path) => load_emission_config(path)?,
        None => EmissionConfig::default(),
    };
    if let Some(rate) = cmd.reward_per_block {
        config.reward_per_block = rate;
    }
    if let Some(start) = cmd.start_block {
        config.start_block = start;
    }
    if let Some(interval) = cmd.halving_interval {
        config.halving_interval = interval;
    }
    config.validate()?;
    Ok(config)
}

fn build(config: &EmissionConfig, cmd: &ScheduleCmd) -> ScheduleReport {
    let schedule = RewardSchedule::from_config(config);
    let kind = PoolKind::from(cmd.kind);
    let segments = schedule
        .halving_boundaries(kind, cmd.limit)
        .into_iter()
        .enumerate()
        .map(|(segment, (from_block, rate))| SegmentRow {
            segment,
            from_block,
            reward_per_block: rate,
            light_per_block: Light::from_units(rate).to_string(),
        })
        .collect();

    let range = match (cmd.from, cmd.to) {
        (None, None) => None,
        (from, to) => {
            let from = from.unwrap_or(config.start_block);
            let to = to.unwrap_or(from);
            Some(RangeTotal {
                from,
                to,
                kind_total: schedule.block_rewards(from, to, kind),
                cumulative: schedule.cumulative_emission(to),
            })
        }
    };

    ScheduleReport {
        kind,
        segments,
        range,
    }
}
