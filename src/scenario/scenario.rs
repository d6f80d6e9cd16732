use std::borrow::Cow;
use std::path::Path;
use std::string::FromUtf8Error;

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::scenario::Step;

/// An ordered list of tree operations for the driver to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scenario {
    steps: Vec<Step>,
}

impl Scenario {
    pub async fn read(path: &Path) -> Result<Self, ScenarioLoadError> {
        debug!("Reading scenario file: {}", path.display());
        let file_path = path.display().to_string();
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: file_path.clone(),
        })?;
        debug!("Successfully read scenario file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu { file_path })?;
        contents.as_str().try_into()
    }

    /// The fixed sequence the driver runs when no scenario is given.
    pub fn demo() -> Self {
        Self {
            steps: vec![
                Step::Init,
                Step::MakeDirectory("a/b/c/d".into()),
                Step::RemoveDirectory("a/b/c".into()),
                Step::MakeDirectory("a/e".into()),
                Step::MakeDirectory("a/f".into()),
                Step::Print,
                Step::Destroy,
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn parse_steps_from_yaml(
        top_level: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Vec<Step>, ScenarioLoadError> {
        let Some(steps) = top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed("steps"))))
        else {
            debug!("Scenario has no steps section");
            return Ok(Vec::new());
        };

        steps
            .as_sequence()
            .context(StepsNotSequenceSnafu)?
            .iter()
            .enumerate()
            .map(|(index, item)| Step::from_yaml(index, item))
            .collect()
    }
}

impl TryFrom<&str> for Scenario {
    type Error = ScenarioLoadError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(MalformedScenarioSnafu)?;
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let steps = Self::parse_steps_from_yaml(top_level)?;
        Ok(Scenario { steps })
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ScenarioLoadError {
    #[snafu(display("Failed to read the scenario file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The scenario file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to parse the scenario file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted scenario file"))]
    MalformedScenario,
    #[snafu(display("Top level of the scenario should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Steps section should be a sequence"))]
    StepsNotSequence,
    #[snafu(display("Step {} is malformed", index))]
    MalformedStep { index: usize },
    #[snafu(display("Step {} has unknown name '{}'", index, name))]
    UnknownStep { index: usize, name: String },
    #[snafu(display("Step {} is missing its path", index))]
    MissingPath { index: usize },
    #[snafu(display("Step {} has malformed path '{}'", index, path))]
    InvalidPath { index: usize, path: String },
    #[snafu(display("Step {} is missing its contents", index))]
    MissingContents { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn scenario_parses_every_step_form() {
        let yaml = r#"
steps:
  - init
  - mkdir: a/b
  - touch: a/b/empty
  - touch:
      path: a/b/note
      contents: "hello"
  - write: { path: a/b/note, contents: "bye" }
  - stat: a/b
  - cat: a/b/note
  - exists: a/b/note
  - rm: a/b/note
  - rmdir: a/b
  - print
  - destroy
"#;
        let scenario: Scenario = yaml.try_into().expect("Scenario should parse");

        assert_eq!(
            scenario.steps(),
            [
                Step::Init,
                Step::MakeDirectory("a/b".into()),
                Step::Touch {
                    path: "a/b/empty".into(),
                    contents: Vec::new()
                },
                Step::Touch {
                    path: "a/b/note".into(),
                    contents: b"hello".to_vec()
                },
                Step::Write {
                    path: "a/b/note".into(),
                    contents: b"bye".to_vec()
                },
                Step::Stat("a/b".into()),
                Step::Cat("a/b/note".into()),
                Step::Exists("a/b/note".into()),
                Step::RemoveFile("a/b/note".into()),
                Step::RemoveDirectory("a/b".into()),
                Step::Print,
                Step::Destroy,
            ]
        );
    }

    #[test]
    fn scenario_returns_error_on_invalid_yaml() {
        let result: Result<Scenario, _> = "steps: [unclosed".try_into();
        assert!(matches!(result, Err(ScenarioLoadError::ParseError { .. })));
    }

    #[test]
    fn scenario_returns_error_on_empty_file() {
        let result: Result<Scenario, _> = "".try_into();
        assert!(matches!(result, Err(ScenarioLoadError::MalformedScenario)));
    }

    #[test]
    fn scenario_returns_error_when_top_level_is_not_map() {
        let result: Result<Scenario, _> = "- init\n- print".try_into();
        assert!(matches!(result, Err(ScenarioLoadError::TopLevelNotMap)));
    }

    #[test]
    fn scenario_returns_error_when_steps_is_not_sequence() {
        let result: Result<Scenario, _> = "steps:\n  mkdir: a".try_into();
        assert!(matches!(result, Err(ScenarioLoadError::StepsNotSequence)));
    }

    #[test]
    fn scenario_handles_missing_steps_section() {
        let result: Result<Scenario, _> = "other: value".try_into();
        assert!(result.expect("Scenario should parse").steps().is_empty());
    }

    #[rstest]
    #[case("steps:\n  - explode", 0)]
    #[case("steps:\n  - init\n  - chmod: a", 1)]
    fn scenario_rejects_unknown_steps(#[case] yaml: &str, #[case] expected_index: usize) {
        let result: Result<Scenario, _> = yaml.try_into();
        assert!(matches!(
            result,
            Err(ScenarioLoadError::UnknownStep { index, .. }) if index == expected_index
        ));
    }

    #[rstest]
    #[case("steps:\n  - mkdir: a//b")]
    #[case("steps:\n  - rm: /a")]
    #[case("steps:\n  - touch: a/")]
    fn scenario_rejects_malformed_paths(#[case] yaml: &str) {
        let result: Result<Scenario, _> = yaml.try_into();
        assert!(matches!(result, Err(ScenarioLoadError::InvalidPath { .. })));
    }

    #[rstest]
    #[case("steps:\n  - mkdir: [a]", "missing path")]
    #[case("steps:\n  - write: a/b", "missing contents")]
    #[case("steps:\n  - { mkdir: a, rmdir: a }", "two names")]
    #[case("steps:\n  - touch: { path: a/b, mode: 7 }", "unknown field")]
    fn scenario_rejects_malformed_arguments(#[case] yaml: &str, #[case] description: &str) {
        let result: Result<Scenario, _> = yaml.try_into();
        assert!(
            matches!(
                result,
                Err(ScenarioLoadError::MissingPath { .. }
                    | ScenarioLoadError::MissingContents { .. }
                    | ScenarioLoadError::MalformedStep { .. })
            ),
            "Expected a step error for {description}, got {result:?}"
        );
    }

    #[test]
    fn demo_scenario_matches_driver_sequence() {
        let demo = Scenario::demo();
        assert_eq!(demo.steps().first(), Some(&Step::Init));
        assert_eq!(demo.steps().last(), Some(&Step::Destroy));
        assert_eq!(demo.steps().len(), 7);
    }

    #[compio::test]
    async fn scenario_reads_from_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "steps:\n  - init\n  - mkdir: a").expect("Failed to write to temp file");

        let scenario = Scenario::read(file.path())
            .await
            .expect("Failed to read scenario");

        assert_eq!(
            scenario.steps(),
            [Step::Init, Step::MakeDirectory("a".into())]
        );
    }

    #[compio::test]
    async fn scenario_returns_error_on_nonexistent_file() {
        let result = Scenario::read(Path::new("nonexistent-scenario.yaml")).await;
        assert!(matches!(result, Err(ScenarioLoadError::ReadError { .. })));
    }

    #[compio::test]
    async fn scenario_returns_error_on_invalid_utf8() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(&[0xff, 0xfe, 0x00])
            .expect("Failed to write to temp file");

        let result = Scenario::read(file.path()).await;
        assert!(matches!(result, Err(ScenarioLoadError::EncodingError { .. })));
    }
}
