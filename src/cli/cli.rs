use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Runs a scenario of operations against an in-memory file tree")]
pub struct Cli {
    /// YAML scenario to run; the built-in demo sequence runs when omitted
    pub scenario: Option<PathBuf>,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Check every tree invariant after each step and stop at the first violation
    #[clap(long)]
    pub verify: bool,
}
