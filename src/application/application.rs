use ftree::executor::{ExecutionError, Executor};
use ftree::scenario::{Scenario, ScenarioLoadError};
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let scenario = match &app_config.scenario {
            Some(path) => Scenario::read(path).await.context(ScenarioSnafu)?,
            None => {
                info!("No scenario given, running the demo sequence");
                Scenario::demo()
            }
        };
        debug!("Loaded scenario with {} steps", scenario.steps().len());

        let mut executor = Executor::new(app_config.verify);
        let reports = executor
            .execute(&scenario)
            .context(ScenarioExecutionSnafu)?;
        for report in &reports {
            println!("{report}");
        }

        let tree = executor.finish();
        info!("Scenario finished, {} nodes left", tree.node_count());
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the scenario"))]
    ScenarioError { source: ScenarioLoadError },
    #[snafu(display("Critical failure encountered during scenario execution"))]
    ScenarioExecutionError { source: ExecutionError },
}
