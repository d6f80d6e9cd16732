//! YAML scenarios: sequences of tree operations run by the driver.
//!
//! ```yaml
//! steps:
//!   - init
//!   - mkdir: a/b
//!   - touch: { path: a/b/note, contents: "hello" }
//!   - print
//!   - destroy
//! ```

mod scenario;
mod step;

pub use scenario::{Scenario, ScenarioLoadError};
pub use step::Step;
