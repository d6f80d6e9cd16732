use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Scenario file to run; the demo sequence runs when absent.
    pub scenario: Option<PathBuf>,
    pub verify: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            scenario: cli.scenario,
            verify: cli.verify,
        }
    }
}
