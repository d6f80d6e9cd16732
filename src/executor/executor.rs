use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::checker::{Checker, Violation};
use crate::executor::StepReport;
use crate::scenario::{Scenario, Step};
use crate::tree::{FileTree, StatusCode, TreeError};

/// Runs scenario steps against a single [`FileTree`].
pub struct Executor {
    tree: FileTree,
    verify: bool,
}

impl Executor {
    /// With `verify` set, the checker runs after every step and the first
    /// violation stops execution.
    pub fn new(verify: bool) -> Self {
        Self {
            tree: FileTree::new(),
            verify,
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Runs every step of `scenario` in order, collecting one report per step.
    pub fn execute(&mut self, scenario: &Scenario) -> Result<Vec<StepReport>, ExecutionError> {
        scenario
            .steps()
            .iter()
            .map(|step| self.execute_step(step))
            .collect()
    }

    pub fn execute_step(&mut self, step: &Step) -> Result<StepReport, ExecutionError> {
        debug!("Executing step '{step}' on path {:?}", step.path());
        let report = self.run(step);
        debug!("Step '{}' finished with {}", report.step, report.code);

        if self.verify {
            Checker::check(&self.tree).context(VerificationSnafu {
                step: step.to_string(),
            })?;
        }
        Ok(report)
    }

    fn run(&mut self, step: &Step) -> StepReport {
        let tree = &mut self.tree;
        match step {
            Step::Init => StepReport::new(step, &tree.init()),
            Step::Destroy => StepReport::new(step, &tree.destroy()),
            Step::Print => match tree.to_listing() {
                Some(listing) => StepReport::success(step).with_output(listing),
                None => {
                    let result: Result<(), TreeError> = Err(TreeError::InitializationError);
                    StepReport::new(step, &result)
                }
            },
            Step::MakeDirectory(path) => StepReport::new(step, &tree.insert_directory(path)),
            Step::Touch { path, contents } => {
                StepReport::new(step, &tree.insert_file(path, contents.clone()))
            }
            Step::RemoveDirectory(path) => StepReport::new(step, &tree.remove_directory(path)),
            Step::RemoveFile(path) => StepReport::new(step, &tree.remove_file(path)),
            Step::Stat(path) => {
                let result = tree.stat(path);
                let report = StepReport::new(step, &result);
                match result {
                    Ok(stat) => report.with_output(stat.to_string()),
                    Err(_) => report,
                }
            }
            Step::Cat(path) => {
                let result = tree.get_file_contents(path);
                let report = StepReport::new(step, &result);
                match result {
                    Ok(contents) => report.with_output(String::from_utf8_lossy(contents)),
                    Err(_) => report,
                }
            }
            Step::Write { path, contents } => {
                let result = tree.replace_file_contents(path, contents.clone());
                let report = StepReport::new(step, &result);
                match result {
                    Ok(previous) => report.with_output(format!(
                        "replaced {} bytes with {} bytes",
                        previous.len(),
                        contents.len()
                    )),
                    Err(_) => report,
                }
            }
            Step::Exists(path) => {
                let found = if tree.contains_directory(path) {
                    "directory"
                } else if tree.contains_file(path) {
                    "file"
                } else {
                    "absent"
                };
                StepReport::success(step).with_output(found)
            }
        }
    }

    /// Destroys the tree if the scenario left it initialized.
    pub fn finish(mut self) -> FileTree {
        if self.tree.is_initialized() {
            info!("Scenario left the tree initialized, destroying it");
            let result = self.tree.destroy();
            debug!("Implicit destroy finished with {}", StatusCode::of(&result));
        }
        self.tree
    }
}

#[derive(Debug, Snafu)]
pub enum ExecutionError {
    #[snafu(display("Tree invariants broken after step '{}'", step))]
    VerificationError { step: String, source: Violation },
}
