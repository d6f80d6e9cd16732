use derive_more::Display;
use hashlink::LinkedHashMap;
use saphyr::Yaml;
use snafu::prelude::*;

use crate::node::path;
use crate::scenario::scenario::{
    InvalidPathSnafu, MalformedStepSnafu, MissingContentsSnafu, MissingPathSnafu,
    ScenarioLoadError, UnknownStepSnafu,
};

/// One tree operation of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Step {
    #[display("init")]
    Init,
    #[display("destroy")]
    Destroy,
    #[display("print")]
    Print,
    #[display("mkdir {_0}")]
    MakeDirectory(String),
    #[display("touch {path}")]
    Touch { path: String, contents: Vec<u8> },
    #[display("rmdir {_0}")]
    RemoveDirectory(String),
    #[display("rm {_0}")]
    RemoveFile(String),
    #[display("stat {_0}")]
    Stat(String),
    #[display("cat {_0}")]
    Cat(String),
    #[display("write {path}")]
    Write { path: String, contents: Vec<u8> },
    #[display("exists {_0}")]
    Exists(String),
}

impl Step {
    /// Parses the step at position `index` of the `steps` sequence.
    ///
    /// A step is either a bare name (`init`, `destroy`, `print`) or a
    /// single-entry mapping from the step name to its argument.
    pub fn from_yaml(index: usize, item: &Yaml) -> Result<Self, ScenarioLoadError> {
        if let Some(name) = item.as_str() {
            return match name {
                "init" => Ok(Step::Init),
                "destroy" => Ok(Step::Destroy),
                "print" => Ok(Step::Print),
                other => UnknownStepSnafu { index, name: other }.fail(),
            };
        }

        let mapping = item.as_mapping().context(MalformedStepSnafu { index })?;
        let mut entries = mapping.iter();
        let (Some((key, argument)), None) = (entries.next(), entries.next()) else {
            return MalformedStepSnafu { index }.fail();
        };
        let name = key.as_str().context(MalformedStepSnafu { index })?;

        match name {
            "mkdir" => Ok(Step::MakeDirectory(Self::path_argument(index, argument)?)),
            "rmdir" => Ok(Step::RemoveDirectory(Self::path_argument(index, argument)?)),
            "rm" => Ok(Step::RemoveFile(Self::path_argument(index, argument)?)),
            "stat" => Ok(Step::Stat(Self::path_argument(index, argument)?)),
            "cat" => Ok(Step::Cat(Self::path_argument(index, argument)?)),
            "exists" => Ok(Step::Exists(Self::path_argument(index, argument)?)),
            "touch" => {
                let (path, contents) = Self::file_argument(index, argument, false)?;
                Ok(Step::Touch { path, contents })
            }
            "write" => {
                let (path, contents) = Self::file_argument(index, argument, true)?;
                Ok(Step::Write { path, contents })
            }
            other => UnknownStepSnafu { index, name: other }.fail(),
        }
    }

    fn path_argument(index: usize, argument: &Yaml) -> Result<String, ScenarioLoadError> {
        let path = argument.as_str().context(MissingPathSnafu { index })?;
        ensure!(path::is_well_formed(path), InvalidPathSnafu { index, path });
        Ok(path.to_string())
    }

    /// Either a bare path (empty contents) or a `{path, contents}` mapping.
    fn file_argument(
        index: usize,
        argument: &Yaml,
        contents_required: bool,
    ) -> Result<(String, Vec<u8>), ScenarioLoadError> {
        if argument.as_str().is_some() {
            ensure!(!contents_required, MissingContentsSnafu { index });
            return Ok((Self::path_argument(index, argument)?, Vec::new()));
        }

        let fields = argument.as_mapping().context(MalformedStepSnafu { index })?;
        Self::file_fields(index, fields, contents_required)
    }

    fn file_fields(
        index: usize,
        fields: &LinkedHashMap<Yaml, Yaml>,
        contents_required: bool,
    ) -> Result<(String, Vec<u8>), ScenarioLoadError> {
        let mut path = None;
        let mut contents = None;
        for (key, value) in fields.iter() {
            match key.as_str() {
                Some("path") => path = Some(Self::path_argument(index, value)?),
                Some("contents") => {
                    let text = value.as_str().context(MalformedStepSnafu { index })?;
                    contents = Some(text.as_bytes().to_vec());
                }
                _ => return MalformedStepSnafu { index }.fail(),
            }
        }

        let path = path.context(MissingPathSnafu { index })?;
        let contents = match contents {
            Some(contents) => contents,
            None => {
                ensure!(!contents_required, MissingContentsSnafu { index });
                Vec::new()
            }
        };
        Ok((path, contents))
    }

    /// The path this step operates on, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Step::Init | Step::Destroy | Step::Print => None,
            Step::MakeDirectory(path)
            | Step::RemoveDirectory(path)
            | Step::RemoveFile(path)
            | Step::Stat(path)
            | Step::Cat(path)
            | Step::Exists(path)
            | Step::Touch { path, .. }
            | Step::Write { path, .. } => Some(path),
        }
    }
}
