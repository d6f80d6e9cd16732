use snafu::prelude::*;
use tracing::warn;

use crate::node::path;
use crate::node::{Node, NodeId, NodeKind, Payload};
use crate::tree::TreeError;
use crate::tree::tree_error::{AlreadyInTreeSnafu, MemorySnafu, ParentChildSnafu};

/// Slot storage for nodes.
///
/// Freed slots are recycled, so an id must not be used after the node it
/// names has been destroyed.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    live: usize,
    #[cfg(test)]
    reservations_left: Option<usize>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently allocated, attached or not.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// # Panics
    ///
    /// Panics if `id` does not name a live node.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("{id} does not name a live node"),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` does not name a live node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("{id} does not name a live node"),
        }
    }

    /// Creates a detached, childless directory whose path is `name` placed
    /// below `parent`. The parent itself is not modified.
    pub fn create_directory(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let payload = Payload::Directory {
            directories: Vec::new(),
            files: Vec::new(),
        };
        self.create(name, parent, payload)
    }

    /// Creates a detached file holding `content`. The parent itself is not
    /// modified.
    pub fn create_file(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        content: Vec<u8>,
    ) -> Result<NodeId, TreeError> {
        self.create(name, parent, Payload::File { content })
    }

    fn create(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        payload: Payload,
    ) -> Result<NodeId, TreeError> {
        self.take_reservation()?;
        let parent_path = parent.map(|parent| self.node(parent).path());
        let path = path::join(parent_path, name).context(MemorySnafu)?;

        let node = Node {
            path,
            parent: None,
            payload,
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.try_reserve(1).context(MemorySnafu)?;
                self.slots.push(Some(node));
                NodeId::new(self.slots.len() - 1)
            }
        };
        self.live += 1;
        Ok(id)
    }

    /// Frees `id` and everything below it, returning how many nodes were
    /// freed. File contents are dropped with their nodes.
    ///
    /// The node must already be detached from its parent.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        let mut pending = vec![id];
        let mut freed = 0;

        while let Some(id) = pending.pop() {
            let Some(node) = self.slots.get_mut(id.index()).and_then(Option::take) else {
                warn!("Skipping {id} during destroy: it is not a live node");
                continue;
            };
            if let Payload::Directory { directories, files } = node.payload {
                pending.extend(directories);
                pending.extend(files);
            }
            self.free.push(id);
            self.live -= 1;
            freed += 1;
        }

        freed
    }

    /// Binary search for `path` among the children of `parent` of the given
    /// kind: `Ok(index)` when present, `Err(insertion_index)` otherwise.
    pub fn search_children(
        &self,
        parent: NodeId,
        kind: NodeKind,
        path: &str,
    ) -> Result<usize, usize> {
        self.node(parent)
            .children(kind)
            .binary_search_by(|child| self.node(*child).path().cmp(path))
    }

    pub fn has_child_directory(&self, parent: NodeId, path: &str) -> Result<usize, usize> {
        self.search_children(parent, NodeKind::Directory, path)
    }

    pub fn has_child_file(&self, parent: NodeId, path: &str) -> Result<usize, usize> {
        self.search_children(parent, NodeKind::File, path)
    }

    /// Inserts `child` into the sorted collection of `parent` matching its
    /// kind and points the child's back-reference at `parent`.
    pub fn link_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let (kind, index) = {
            let parent_node = self.node(parent);
            let child_node = self.node(child);
            ensure!(
                parent_node.is_directory()
                    && path::is_immediate_child(parent_node.path(), child_node.path()),
                ParentChildSnafu {
                    parent: parent_node.path(),
                    child: child_node.path(),
                }
            );

            let kind = child_node.kind();
            let other = match kind {
                NodeKind::Directory => NodeKind::File,
                NodeKind::File => NodeKind::Directory,
            };
            ensure!(
                self.search_children(parent, other, child_node.path()).is_err(),
                AlreadyInTreeSnafu {
                    path: child_node.path()
                }
            );
            match self.search_children(parent, kind, child_node.path()) {
                Ok(_) => {
                    return AlreadyInTreeSnafu {
                        path: child_node.path(),
                    }
                    .fail();
                }
                Err(index) => (kind, index),
            }
        };

        self.take_reservation()?;
        let Some(children) = self.node_mut(parent).children_mut(kind) else {
            unreachable!("parent was checked to be a directory");
        };
        children.try_reserve(1).context(MemorySnafu)?;
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Removes `child` from `parent` without destroying it. The caller owns
    /// the detached subtree afterwards.
    pub fn unlink_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let (kind, index) = {
            let child_node = self.node(child);
            let kind = child_node.kind();
            match self.search_children(parent, kind, child_node.path()) {
                Ok(index) if self.node(parent).children(kind)[index] == child => (kind, index),
                _ => {
                    return ParentChildSnafu {
                        parent: self.node(parent).path(),
                        child: child_node.path(),
                    }
                    .fail();
                }
            }
        };

        if let Some(children) = self.node_mut(parent).children_mut(kind) {
            children.remove(index);
        }
        self.node_mut(child).parent = None;
        Ok(())
    }

    /// Swaps the content of file `id`, handing back the previous buffer.
    /// Returns `None` (and changes nothing) for directories.
    pub fn replace_contents(&mut self, id: NodeId, content: Vec<u8>) -> Option<Vec<u8>> {
        match &mut self.node_mut(id).payload {
            Payload::File { content: current } => Some(std::mem::replace(current, content)),
            Payload::Directory { .. } => None,
        }
    }

    /// Lets the next `reservations` node creations and links succeed; every
    /// one after that fails with [`TreeError::MemoryError`].
    #[cfg(test)]
    pub(crate) fn limit_reservations(&mut self, reservations: usize) {
        self.reservations_left = Some(reservations);
    }

    #[cfg(test)]
    fn take_reservation(&mut self) -> Result<(), TreeError> {
        match &mut self.reservations_left {
            Some(0) => {
                let exhausted = Vec::<u8>::new()
                    .try_reserve(usize::MAX)
                    .expect_err("Reserving usize::MAX bytes cannot succeed");
                Err(exhausted).context(MemorySnafu)
            }
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    #[cfg(not(test))]
    fn take_reservation(&mut self) -> Result<(), TreeError> {
        Ok(())
    }
}
