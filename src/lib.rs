//! An in-memory, single-rooted hierarchy of directories and files addressed
//! by `/`-separated paths, with an independent invariant checker and a
//! scenario driver.

#![allow(clippy::enum_variant_names)]
#![allow(clippy::module_inception)]

pub mod checker;
pub mod executor;
pub mod node;
pub mod scenario;
pub mod tree;
