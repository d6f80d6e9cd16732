use snafu::prelude::*;
use tracing::{debug, warn};

use crate::node::path::{self, SEPARATOR};
use crate::node::{Node, NodeArena, NodeId, NodeKind};
use crate::tree::Preorder;
use crate::tree::Stat;
use crate::tree::TreeError;
use crate::tree::tree_error::{
    AlreadyInTreeSnafu, ConflictingPathSnafu, InitializationSnafu, NoSuchPathSnafu,
    NotADirectorySnafu, NotAFileSnafu,
};

/// Kind of the last node of an inserted path.
enum Leaf {
    Directory,
    File(Vec<u8>),
}

/// Nodes created by one insertion that are not yet attached to the tree.
#[derive(Default)]
struct Chain {
    first: Option<NodeId>,
    last: Option<NodeId>,
    len: usize,
}

/// A single-rooted hierarchy of directories and files addressed by
/// `/`-separated paths.
///
/// The tree starts uninitialized; [`FileTree::init`] opens it and
/// [`FileTree::destroy`] frees every node and closes it again. Paths handed
/// to the operations must be well formed (see [`path::is_well_formed`]);
/// malformed paths are a caller bug and panic.
#[derive(Debug, Default)]
pub struct FileTree {
    arena: NodeArena,
    root: Option<NodeId>,
    count: usize,
    initialized: bool,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) -> Result<(), TreeError> {
        ensure!(!self.initialized, InitializationSnafu);
        self.initialized = true;
        self.root = None;
        self.count = 0;
        debug!("Initialized file tree");
        self.verify();
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), TreeError> {
        ensure!(self.initialized, InitializationSnafu);
        if let Some(root) = self.root.take() {
            let freed = self.arena.destroy(root);
            self.count -= freed;
            debug!("Destroyed file tree, freed {freed} nodes");
        }
        self.arena = NodeArena::new();
        self.initialized = false;
        self.verify();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.count
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder::new(&self.arena, self.root)
    }

    /// Finds the deepest node whose path is `path` or one of its ancestors.
    ///
    /// A file is returned as soon as it is reached: nothing lives below it.
    pub fn traverse(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root?;
        if !path::is_prefix_of(self.arena.node(current).path(), path) {
            return None;
        }

        loop {
            let node = self.arena.node(current);
            if node.path() == path || node.is_file() {
                return Some(current);
            }
            let Some(next) = path::next_step(node.path(), path) else {
                return Some(current);
            };
            let child = match self.arena.has_child_directory(current, next) {
                Ok(index) => node.directories()[index],
                Err(_) => match self.arena.has_child_file(current, next) {
                    Ok(index) => node.files()[index],
                    Err(_) => return Some(current),
                },
            };
            current = child;
        }
    }

    fn find_exact(&self, path: &str) -> Option<&Node> {
        self.traverse(path)
            .map(|id| self.arena.node(id))
            .filter(|node| node.path() == path)
    }

    pub fn insert_directory(&mut self, path: &str) -> Result<(), TreeError> {
        self.insert(path, Leaf::Directory)
    }

    /// Inserts a file at `path`, creating missing ancestor directories. The
    /// tree takes ownership of `content`.
    pub fn insert_file(
        &mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), TreeError> {
        self.insert(path, Leaf::File(content.into()))
    }

    fn insert(&mut self, path: &str, leaf: Leaf) -> Result<(), TreeError> {
        ensure!(self.initialized, InitializationSnafu);
        path::assert_well_formed(path);

        let anchor = self.traverse(path);
        let result = self.insert_rest_of_path(path, anchor, leaf);
        self.verify();
        result
    }

    /// Creates the part of `path` below `anchor` as one detached chain and
    /// attaches it only once every node of it exists. Any failure frees the
    /// chain and leaves the tree as it was.
    fn insert_rest_of_path(
        &mut self,
        path: &str,
        anchor: Option<NodeId>,
        leaf: Leaf,
    ) -> Result<(), TreeError> {
        let rest = match anchor {
            Some(anchor) => {
                let node = self.arena.node(anchor);
                debug_assert!(path::is_prefix_of(node.path(), path));
                ensure!(node.path() != path, AlreadyInTreeSnafu { path });
                ensure!(
                    node.is_directory(),
                    NotADirectorySnafu { path: node.path() }
                );
                path::suffix_after(node.path(), path)
            }
            None => {
                ensure!(self.root.is_none(), ConflictingPathSnafu { path });
                ensure!(
                    matches!(leaf, Leaf::Directory) || path.contains(SEPARATOR),
                    ConflictingPathSnafu { path }
                );
                path
            }
        };

        let mut chain = Chain::default();
        if let Err(error) = self.grow_chain(&mut chain, anchor, rest, leaf) {
            self.discard_chain(&chain, path);
            return Err(error);
        }
        let Some(first) = chain.first else {
            return Ok(());
        };

        match anchor {
            None => self.root = Some(first),
            Some(anchor) => {
                if let Err(error) = self.arena.link_child(anchor, first) {
                    self.discard_chain(&chain, path);
                    return Err(error);
                }
            }
        }
        self.count += chain.len;
        debug!("Inserted '{path}' with {} new nodes", chain.len);
        Ok(())
    }

    fn grow_chain(
        &mut self,
        chain: &mut Chain,
        anchor: Option<NodeId>,
        rest: &str,
        leaf: Leaf,
    ) -> Result<(), TreeError> {
        let (directories, name) = match rest.rsplit_once(SEPARATOR) {
            Some((directories, name)) => (Some(directories), name),
            None => (None, rest),
        };

        for segment in directories.into_iter().flat_map(|dirs| dirs.split(SEPARATOR)) {
            let id = self
                .arena
                .create_directory(segment, chain.last.or(anchor))?;
            self.extend_chain(chain, id)?;
        }

        let id = match leaf {
            Leaf::Directory => self.arena.create_directory(name, chain.last.or(anchor))?,
            Leaf::File(content) => self
                .arena
                .create_file(name, chain.last.or(anchor), content)?,
        };
        self.extend_chain(chain, id)
    }

    fn extend_chain(&mut self, chain: &mut Chain, id: NodeId) -> Result<(), TreeError> {
        match chain.last {
            None => chain.first = Some(id),
            Some(last) => {
                if let Err(error) = self.arena.link_child(last, id) {
                    self.arena.destroy(id);
                    return Err(error);
                }
            }
        }
        chain.last = Some(id);
        chain.len += 1;
        Ok(())
    }

    fn discard_chain(&mut self, chain: &Chain, path: &str) {
        if let Some(first) = chain.first {
            let freed = self.arena.destroy(first);
            warn!("Rolled back insertion of '{path}', discarded {freed} new nodes");
        }
    }

    pub fn remove_directory(&mut self, path: &str) -> Result<(), TreeError> {
        self.remove_path(path, NodeKind::Directory)
    }

    pub fn remove_file(&mut self, path: &str) -> Result<(), TreeError> {
        self.remove_path(path, NodeKind::File)
    }

    fn remove_path(&mut self, path: &str, kind: NodeKind) -> Result<(), TreeError> {
        ensure!(self.initialized, InitializationSnafu);
        path::assert_well_formed(path);

        let id = self.traverse(path).context(NoSuchPathSnafu { path })?;
        let node = self.arena.node(id);
        ensure!(node.path() == path, NoSuchPathSnafu { path });
        match (kind, node.kind()) {
            (NodeKind::Directory, NodeKind::File) => return NotADirectorySnafu { path }.fail(),
            (NodeKind::File, NodeKind::Directory) => return NotAFileSnafu { path }.fail(),
            _ => {}
        }

        match node.parent() {
            Some(parent) => self.arena.unlink_child(parent, id)?,
            None => self.root = None,
        }
        let freed = self.arena.destroy(id);
        self.count -= freed;
        debug!("Removed {kind} '{path}', freed {freed} nodes");
        self.verify();
        Ok(())
    }

    pub fn contains_directory(&self, path: &str) -> bool {
        self.contains(path, NodeKind::Directory)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.contains(path, NodeKind::File)
    }

    fn contains(&self, path: &str, kind: NodeKind) -> bool {
        if !self.initialized {
            return false;
        }
        path::assert_well_formed(path);
        self.find_exact(path).is_some_and(|node| node.kind() == kind)
    }

    fn exact_file(&self, path: &str) -> Result<NodeId, TreeError> {
        ensure!(self.initialized, InitializationSnafu);
        path::assert_well_formed(path);

        let id = self.traverse(path).context(NoSuchPathSnafu { path })?;
        let node = self.arena.node(id);
        ensure!(node.path() == path, NoSuchPathSnafu { path });
        ensure!(node.is_file(), NotAFileSnafu { path });
        Ok(id)
    }

    pub fn get_file_contents(&self, path: &str) -> Result<&[u8], TreeError> {
        let id = self.exact_file(path)?;
        self.arena
            .node(id)
            .contents()
            .context(NotAFileSnafu { path })
    }

    /// Stores `content` in the file at `path` and hands back the previous
    /// content.
    pub fn replace_file_contents(
        &mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<Vec<u8>, TreeError> {
        let id = self.exact_file(path)?;
        let previous = self
            .arena
            .replace_contents(id, content.into())
            .context(NotAFileSnafu { path })?;
        debug!("Replaced contents of '{path}'");
        self.verify();
        Ok(previous)
    }

    pub fn stat(&self, path: &str) -> Result<Stat, TreeError> {
        ensure!(self.initialized, InitializationSnafu);
        path::assert_well_formed(path);

        let node = self.find_exact(path).context(NoSuchPathSnafu { path })?;
        Ok(match node.file_length() {
            Some(length) => Stat::File { length },
            None => Stat::Directory,
        })
    }

    /// Every path in the tree, one per line, in pre-order. `None` while the
    /// tree is uninitialized.
    pub fn to_listing(&self) -> Option<String> {
        if !self.initialized {
            return None;
        }

        let length: usize = self
            .preorder()
            .map(|id| self.arena.node(id).path().len() + 1)
            .sum();
        let mut listing = String::with_capacity(length);
        for id in self.preorder() {
            listing.push_str(self.arena.node(id).path());
            listing.push('\n');
        }
        Some(listing)
    }

    #[cfg(debug_assertions)]
    fn verify(&self) {
        if let Err(violation) = crate::checker::Checker::check(self) {
            tracing::error!("File tree invariant violated: {violation}");
            panic!("file tree invariant violated: {violation}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn verify(&self) {}
}
