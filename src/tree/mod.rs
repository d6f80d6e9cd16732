//! The file tree service: path resolution, atomic path insertion, subtree
//! removal, file content access and the pre-order listing.

mod file_tree;
mod preorder;
mod stat;
pub(crate) mod tree_error;

pub use file_tree::FileTree;
pub use preorder::Preorder;
pub use stat::Stat;
pub use tree_error::{StatusCode, TreeError};
