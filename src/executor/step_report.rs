use std::fmt;

use colored::Colorize;

use crate::tree::{StatusCode, TreeError};

/// Outcome of one executed step, as printed by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub code: StatusCode,
    pub detail: Option<String>,
    pub output: Option<String>,
}

impl StepReport {
    pub fn new<T>(step: impl ToString, result: &Result<T, TreeError>) -> Self {
        Self {
            step: step.to_string(),
            code: StatusCode::of(result),
            detail: result.as_ref().err().map(ToString::to_string),
            output: None,
        }
    }

    pub fn success(step: impl ToString) -> Self {
        Self {
            step: step.to_string(),
            code: StatusCode::Success,
            detail: None,
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = if self.code.is_success() {
            self.code.to_string().green()
        } else {
            self.code.to_string().red()
        };
        write!(f, "{}: {}", self.step.bold(), code)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        if let Some(output) = &self.output {
            write!(f, "\n{}", output.trim_end_matches('\n'))?;
        }
        Ok(())
    }
}
