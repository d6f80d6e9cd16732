mod executor;
mod step_report;

pub use executor::{ExecutionError, Executor};
pub use step_report::StepReport;
