// crates/light-cli/src/output.rs
//
// Output formatting utilities for the Light CLI.
// Supports table and JSON output modes.

use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print a titled table, or a note when there is nothing to show.
pub fn print_section<T: Tabled>(title: &str, rows: &[T]) {
    println!("{}", title);
    if rows.is_empty() {
        println!("  (none)");
    } else {
        println!("{}", format_table(rows));
    }
    println!();
}
