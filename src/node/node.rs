use derive_more::Display;

/// Index of a node inside a [`NodeArena`](super::NodeArena).
///
/// Ids are plain indices: holding one does not keep the node alive, which is
/// what makes it usable as a parent back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("#{_0}")]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    #[display("directory")]
    Directory,
    #[display("file")]
    File,
}

#[derive(Debug)]
pub(crate) enum Payload {
    Directory {
        directories: Vec<NodeId>,
        files: Vec<NodeId>,
    },
    File {
        content: Vec<u8>,
    },
}

/// A directory or file entry.
///
/// Directories keep their children in two collections, one per kind, each
/// sorted by path.
#[derive(Debug)]
pub struct Node {
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) payload: Payload,
}

impl Node {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::Directory { .. } => NodeKind::Directory,
            Payload::File { .. } => NodeKind::File,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    /// Child directories in path order; empty for files.
    pub fn directories(&self) -> &[NodeId] {
        self.children(NodeKind::Directory)
    }

    /// Child files in path order; empty for files.
    pub fn files(&self) -> &[NodeId] {
        self.children(NodeKind::File)
    }

    pub fn children(&self, kind: NodeKind) -> &[NodeId] {
        match (&self.payload, kind) {
            (Payload::Directory { directories, .. }, NodeKind::Directory) => directories.as_slice(),
            (Payload::Directory { files, .. }, NodeKind::File) => files.as_slice(),
            (Payload::File { .. }, _) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self, kind: NodeKind) -> Option<&mut Vec<NodeId>> {
        match (&mut self.payload, kind) {
            (Payload::Directory { directories, .. }, NodeKind::Directory) => Some(directories),
            (Payload::Directory { files, .. }, NodeKind::File) => Some(files),
            (Payload::File { .. }, _) => None,
        }
    }

    pub fn contents(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::File { content } => Some(content.as_slice()),
            Payload::Directory { .. } => None,
        }
    }

    pub fn file_length(&self) -> Option<usize> {
        self.contents().map(<[u8]>::len)
    }
}
