use crate::node::{NodeArena, NodeId};

/// Pre-order walk: a directory, then its files, then each child directory's
/// own walk in path order.
///
/// Files are leaves, so stacking a directory's files above its
/// subdirectories yields them right after the directory itself.
pub struct Preorder<'a> {
    arena: &'a NodeArena,
    pending: Vec<NodeId>,
}

impl<'a> Preorder<'a> {
    pub(crate) fn new(arena: &'a NodeArena, root: Option<NodeId>) -> Self {
        Self {
            arena,
            pending: root.into_iter().collect(),
        }
    }
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.pending.pop()?;
        let node = self.arena.node(id);
        self.pending.extend(node.directories().iter().rev());
        self.pending.extend(node.files().iter().rev());
        Some(id)
    }
}
