//! Independent invariant checks over a file tree's state.

mod checker;

pub use checker::{Checker, Violation};
