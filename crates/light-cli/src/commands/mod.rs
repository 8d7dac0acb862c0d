// crates/light-cli/src/commands/mod.rs
//
// Command module declarations for the Light CLI.

pub mod schedule;
pub mod simulate;
