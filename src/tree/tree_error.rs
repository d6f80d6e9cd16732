use std::collections::TryReserveError;

use derive_more::Display;
use snafu::Snafu;

/// Recoverable failures of tree operations. The tree is left unchanged by
/// every one of them.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TreeError {
    #[snafu(display("The file tree is not in the lifecycle state this operation requires"))]
    InitializationError,
    #[snafu(display("'{}' is already in the tree", path))]
    AlreadyInTree { path: String },
    #[snafu(display("'{}' does not exist in the tree", path))]
    NoSuchPath { path: String },
    #[snafu(display("'{}' is not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("'{}' is not a file", path))]
    NotAFile { path: String },
    #[snafu(display("'{}' conflicts with the tree's single root", path))]
    ConflictingPath { path: String },
    #[snafu(display("'{}' cannot be linked as a child of '{}'", child, parent))]
    ParentChildError { parent: String, child: String },
    #[snafu(display("Failed to allocate memory for the tree"))]
    MemoryError { source: TryReserveError },
}

impl TreeError {
    pub fn code(&self) -> StatusCode {
        match self {
            TreeError::InitializationError => StatusCode::InitializationError,
            TreeError::AlreadyInTree { .. } => StatusCode::AlreadyInTree,
            TreeError::NoSuchPath { .. } => StatusCode::NoSuchPath,
            TreeError::NotADirectory { .. } => StatusCode::NotADirectory,
            TreeError::NotAFile { .. } => StatusCode::NotAFile,
            TreeError::ConflictingPath { .. } => StatusCode::ConflictingPath,
            TreeError::ParentChildError { .. } => StatusCode::ParentChildError,
            TreeError::MemoryError { .. } => StatusCode::MemoryError,
        }
    }
}

/// The closed set of operation outcomes, `Success` included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StatusCode {
    #[display("SUCCESS")]
    Success,
    #[display("INITIALIZATION_ERROR")]
    InitializationError,
    #[display("ALREADY_IN_TREE")]
    AlreadyInTree,
    #[display("NO_SUCH_PATH")]
    NoSuchPath,
    #[display("NOT_A_DIRECTORY")]
    NotADirectory,
    #[display("NOT_A_FILE")]
    NotAFile,
    #[display("CONFLICTING_PATH")]
    ConflictingPath,
    #[display("PARENT_CHILD_ERROR")]
    ParentChildError,
    #[display("MEMORY_ERROR")]
    MemoryError,
}

impl StatusCode {
    pub fn of<T>(result: &Result<T, TreeError>) -> Self {
        match result {
            Ok(_) => StatusCode::Success,
            Err(error) => error.code(),
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}
