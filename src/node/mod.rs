//! Directory and file nodes.
//!
//! Nodes live in a [`NodeArena`] and refer to each other through [`NodeId`]s.
//! A directory owns its children through two sorted id collections; the
//! parent link of a child is a plain id and owns nothing.

mod node;
mod node_arena;
pub mod path;

pub use node::{Node, NodeId, NodeKind};
pub use node_arena::NodeArena;
pub use path::is_well_formed;

pub(crate) use node::Payload;
