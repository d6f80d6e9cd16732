use std::collections::HashSet;

use snafu::prelude::*;

use crate::node::path;
use crate::node::{Node, NodeArena, NodeId, NodeKind};
use crate::tree::FileTree;

/// First broken invariant found by the [`Checker`].
#[derive(Debug, Snafu)]
pub enum Violation {
    #[snafu(display("Not initialized, but count is {}", count))]
    UninitializedWithNodes { count: usize },
    #[snafu(display("Not initialized, but a root is present"))]
    UninitializedWithRoot,
    #[snafu(display("Initialized with a root, but count is 0"))]
    RootWithoutCount,
    #[snafu(display("Initialized without a root, but count is {}", count))]
    CountWithoutRoot { count: usize },
    #[snafu(display("Root '{}' has a parent", path))]
    RootHasParent { path: String },
    #[snafu(display("{} does not name a live node", id))]
    DanglingNode { id: NodeId },
    #[snafu(display("{} is reachable more than once", id))]
    Cycle { id: NodeId },
    #[snafu(display("{} has an empty path", id))]
    EmptyPath { id: NodeId },
    #[snafu(display("'{}' is not a prefix of its child '{}'", parent, child))]
    NotAPrefix { parent: String, child: String },
    #[snafu(display("'{}' is more than one segment below its parent '{}'", child, parent))]
    NotImmediateChild { parent: String, child: String },
    #[snafu(display("'{}' is a {} stored among the {} children of '{}'", child, actual, expected, parent))]
    WrongCollection {
        parent: String,
        child: String,
        expected: NodeKind,
        actual: NodeKind,
    },
    #[snafu(display("'{}' is listed under '{}' but points at another parent", child, parent))]
    BrokenBackReference { parent: String, child: String },
    #[snafu(display("'{}' appears twice among the {} children of '{}'", child, kind, parent))]
    DuplicateChild {
        parent: String,
        child: String,
        kind: NodeKind,
    },
    #[snafu(display("The {} children of '{}' are out of order: '{}' before '{}'", kind, parent, previous, next))]
    Unsorted {
        parent: String,
        kind: NodeKind,
        previous: String,
        next: String,
    },
    #[snafu(display("Visited {} nodes, but count is {}", visited, count))]
    CountMismatch { visited: usize, count: usize },
}

/// Read-only validator for a [`FileTree`].
///
/// Checks run in a fixed order and stop at the first violation.
pub struct Checker;

impl Checker {
    pub fn check(tree: &FileTree) -> Result<(), Violation> {
        Self::check_state(
            tree.is_initialized(),
            tree.root(),
            tree.node_count(),
            tree.arena(),
        )
    }

    pub fn check_state(
        initialized: bool,
        root: Option<NodeId>,
        count: usize,
        arena: &NodeArena,
    ) -> Result<(), Violation> {
        Self::check_global(initialized, root, count)?;

        let visited = Self::check_structure(root, arena)?;
        ensure!(
            visited == count || (count == 0 && visited == 1),
            CountMismatchSnafu { visited, count }
        );
        Ok(())
    }

    fn check_global(
        initialized: bool,
        root: Option<NodeId>,
        count: usize,
    ) -> Result<(), Violation> {
        if !initialized {
            ensure!(count == 0, UninitializedWithNodesSnafu { count });
            ensure!(root.is_none(), UninitializedWithRootSnafu);
        } else if root.is_some() {
            ensure!(count > 0, RootWithoutCountSnafu);
        } else {
            ensure!(count == 0, CountWithoutRootSnafu { count });
        }
        Ok(())
    }

    /// Pre-order walk from `root`, returning the number of nodes visited.
    fn check_structure(root: Option<NodeId>, arena: &NodeArena) -> Result<usize, Violation> {
        let Some(root) = root else {
            return Ok(0);
        };
        let root_node = arena.get(root).context(DanglingNodeSnafu { id: root })?;
        ensure!(
            root_node.parent().is_none(),
            RootHasParentSnafu {
                path: root_node.path()
            }
        );

        let mut pending = vec![root];
        let mut seen = HashSet::new();
        while let Some(id) = pending.pop() {
            ensure!(seen.insert(id), CycleSnafu { id });
            let node = arena.get(id).context(DanglingNodeSnafu { id })?;
            ensure!(!node.path().is_empty(), EmptyPathSnafu { id });

            if let Some(parent) = node.parent() {
                Self::check_link(arena, parent, node)?;
            }
            for kind in [NodeKind::Directory, NodeKind::File] {
                Self::check_children(arena, id, node, kind)?;
                pending.extend(node.children(kind).iter().rev());
            }
        }
        Ok(seen.len())
    }

    /// Verifies that `node` sits exactly one segment below `parent`.
    fn check_link(arena: &NodeArena, parent: NodeId, node: &Node) -> Result<(), Violation> {
        let parent_node = arena.get(parent).context(DanglingNodeSnafu { id: parent })?;
        let parent_path = parent_node.path();
        let child_path = node.path();

        ensure!(
            path::is_prefix_of(parent_path, child_path) && parent_path != child_path,
            NotAPrefixSnafu {
                parent: parent_path,
                child: child_path
            }
        );
        ensure!(
            path::is_immediate_child(parent_path, child_path),
            NotImmediateChildSnafu {
                parent: parent_path,
                child: child_path
            }
        );
        Ok(())
    }

    /// Checks one child collection of `node`: every entry is live, has the
    /// right kind, points back at `node`, and entries are strictly sorted.
    ///
    /// Nodes are only reached through these collections, and a strictly
    /// sorted collection is one where the linking search finds every entry,
    /// so this also covers finding each child under its parent.
    fn check_children(
        arena: &NodeArena,
        id: NodeId,
        node: &Node,
        kind: NodeKind,
    ) -> Result<(), Violation> {
        let mut previous: Option<&Node> = None;
        for &child_id in node.children(kind) {
            let child = arena
                .get(child_id)
                .context(DanglingNodeSnafu { id: child_id })?;
            ensure!(
                child.kind() == kind,
                WrongCollectionSnafu {
                    parent: node.path(),
                    child: child.path(),
                    expected: kind,
                    actual: child.kind(),
                }
            );
            ensure!(
                child.parent() == Some(id),
                BrokenBackReferenceSnafu {
                    parent: node.path(),
                    child: child.path(),
                }
            );

            if let Some(previous) = previous {
                ensure!(
                    previous.path() != child.path(),
                    DuplicateChildSnafu {
                        parent: node.path(),
                        child: child.path(),
                        kind,
                    }
                );
                ensure!(
                    previous.path() < child.path(),
                    UnsortedSnafu {
                        parent: node.path(),
                        kind,
                        previous: previous.path(),
                        next: child.path(),
                    }
                );
            }
            previous = Some(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Payload;
    use rstest::*;

    /// `a` with directories `a/b`, `a/d` and file `a/c`.
    struct Sample {
        arena: NodeArena,
        root: NodeId,
        b: NodeId,
        c: NodeId,
        d: NodeId,
    }

    #[fixture]
    fn sample() -> Sample {
        let mut arena = NodeArena::new();
        let root = arena.create_directory("a", None).unwrap();
        let b = arena.create_directory("b", Some(root)).unwrap();
        let c = arena.create_file("c", Some(root), b"c".to_vec()).unwrap();
        let d = arena.create_directory("d", Some(root)).unwrap();
        for child in [b, c, d] {
            arena.link_child(root, child).unwrap();
        }
        Sample {
            arena,
            root,
            b,
            c,
            d,
        }
    }

    fn directories_mut(arena: &mut NodeArena, id: NodeId) -> &mut Vec<NodeId> {
        match &mut arena.node_mut(id).payload {
            Payload::Directory { directories, .. } => directories,
            Payload::File { .. } => panic!("Expected a directory"),
        }
    }

    #[rstest]
    fn well_formed_sample_passes(sample: Sample) {
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn empty_states_pass() {
        let arena = NodeArena::new();
        assert!(Checker::check_state(false, None, 0, &arena).is_ok());
        assert!(Checker::check_state(true, None, 0, &arena).is_ok());
        assert!(Checker::check(&FileTree::new()).is_ok());
    }

    #[rstest]
    #[case(false, None, 3)]
    #[case(false, Some(()), 0)]
    #[case(true, Some(()), 0)]
    #[case(true, None, 2)]
    fn global_state_violations(
        sample: Sample,
        #[case] initialized: bool,
        #[case] with_root: Option<()>,
        #[case] count: usize,
    ) {
        let root = with_root.map(|_| sample.root);
        let result = Checker::check_state(initialized, root, count, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::UninitializedWithNodes { .. }
                | Violation::UninitializedWithRoot
                | Violation::RootWithoutCount
                | Violation::CountWithoutRoot { .. })
        ));
    }

    #[rstest]
    fn count_mismatch_is_reported(sample: Sample) {
        let result = Checker::check_state(true, Some(sample.root), 7, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::CountMismatch {
                visited: 4,
                count: 7
            })
        ));
    }

    #[rstest]
    fn root_with_parent_is_reported(mut sample: Sample) {
        sample.arena.node_mut(sample.root).parent = Some(sample.b);
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::RootHasParent { .. })));
    }

    #[rstest]
    fn wrong_path_prefix_is_reported(mut sample: Sample) {
        sample.arena.node_mut(sample.d).path = "x/d".into();
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::NotAPrefix { .. } | Violation::Unsorted { .. })
        ));
    }

    #[rstest]
    fn grandchild_path_is_reported(mut sample: Sample) {
        sample.arena.node_mut(sample.d).path = "a/d/e".into();
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::NotImmediateChild { .. })));
    }

    #[rstest]
    fn unsorted_children_are_reported(mut sample: Sample) {
        directories_mut(&mut sample.arena, sample.root).swap(0, 1);
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::Unsorted { .. })));
    }

    #[rstest]
    fn duplicate_children_are_reported(mut sample: Sample) {
        sample.arena.node_mut(sample.d).path = "a/b".into();
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::DuplicateChild { .. })));
    }

    #[rstest]
    fn dangling_child_is_reported(mut sample: Sample) {
        let stale = sample.d;
        directories_mut(&mut sample.arena, sample.root).retain(|id| *id != stale);
        sample.arena.destroy(stale);
        directories_mut(&mut sample.arena, sample.root).push(stale);

        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::DanglingNode { id }) if id == stale));
    }

    #[rstest]
    fn file_in_directory_collection_is_reported(mut sample: Sample) {
        let file = sample.c;
        directories_mut(&mut sample.arena, sample.root).push(file);
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::WrongCollection {
                expected: NodeKind::Directory,
                actual: NodeKind::File,
                ..
            })
        ));
    }

    #[rstest]
    fn broken_back_reference_is_reported(mut sample: Sample) {
        sample.arena.node_mut(sample.c).parent = Some(sample.b);
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(result, Err(Violation::BrokenBackReference { .. })));
    }

    #[rstest]
    fn child_listed_under_wrong_parent_is_reported(mut sample: Sample) {
        let child = sample.arena.create_directory("x", Some(sample.b)).unwrap();
        sample.arena.link_child(sample.b, child).unwrap();
        directories_mut(&mut sample.arena, sample.b).clear();
        directories_mut(&mut sample.arena, sample.d).push(child);
        sample.arena.node_mut(child).parent = Some(sample.d);

        let result = Checker::check_state(true, Some(sample.root), 5, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::NotAPrefix { parent, child }) if parent == "a/d" && child == "a/b/x"
        ));
    }

    #[rstest]
    fn cycle_is_reported(mut sample: Sample) {
        let root = sample.root;
        directories_mut(&mut sample.arena, sample.b).push(root);
        let result = Checker::check_state(true, Some(sample.root), 4, &sample.arena);
        assert!(matches!(
            result,
            Err(Violation::BrokenBackReference { .. } | Violation::Cycle { .. })
        ));
    }

    #[test]
    fn tree_service_state_passes_after_mutations() {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        tree.insert_file("a/b/c/d", "x").unwrap();
        tree.insert_directory("a/e").unwrap();
        tree.remove_directory("a/b/c").unwrap();

        assert!(Checker::check(&tree).is_ok());
    }
}
