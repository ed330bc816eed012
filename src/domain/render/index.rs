use std::fmt;

use generational_arena::{Arena, Index};

use crate::domain::entities::Node;

/// Stable identity of a node within one renderer.
///
/// Assigned once when the tree is indexed and never handed to another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (idx, generation) = self.0.into_raw_parts();
        write!(f, "{idx}v{generation}")
    }
}

/// Structural view of one tree node: borrowed data plus its place in the tree.
#[derive(Debug)]
pub struct Slot<'a> {
    pub node: &'a Node,
    pub parent: Option<NodeId>,
    /// Full child list, regardless of expand state
    pub children: Vec<NodeId>,
    pub depth: usize,
}

/// Read-only index from [`NodeId`] to borrowed tree nodes.
#[derive(Debug)]
pub struct ViewIndex<'a> {
    arena: Arena<Slot<'a>>,
    root: NodeId,
}

impl<'a> ViewIndex<'a> {
    /// Index every node of `tree`. A parent is indexed before its children
    /// and siblings receive consecutive ids.
    pub fn new(tree: &'a Node) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(Slot {
            node: tree,
            parent: None,
            children: Vec::new(),
            depth: 0,
        }));

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some((node, depth)) = arena.get(id.0).map(|s| (s.node, s.depth)) else {
                continue;
            };
            let ids: Vec<NodeId> = node
                .children
                .iter()
                .map(|child| {
                    NodeId(arena.insert(Slot {
                        node: child,
                        parent: Some(id),
                        children: Vec::new(),
                        depth: depth + 1,
                    }))
                })
                .collect();
            // reverse so the first child is indexed first
            stack.extend(ids.iter().rev().copied());
            if let Some(slot) = arena.get_mut(id.0) {
                slot.children = ids;
            }
        }

        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Slot<'a>> {
        self.arena.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena.iter().map(|(idx, _)| NodeId(idx))
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(|s| s.parent), move |&p| {
            self.get(p).and_then(|s| s.parent)
        })
    }

    /// Resolve a path of child names starting below the root.
    ///
    /// When a category and a resource share a name, the category wins; the
    /// resource stays reachable through [`Slot::children`].
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(self.root, |id, name| {
            let mut named = self
                .get(id)?
                .children
                .iter()
                .copied()
                .filter(|&c| self.get(c).is_some_and(|s| s.node.name == name.as_ref()));
            let first = named.next()?;
            let is_category = |c: NodeId| self.get(c).is_some_and(|s| !s.node.is_resource());
            if is_category(first) {
                return Some(first);
            }
            Some(named.find(|&c| is_category(c)).unwrap_or(first))
        })
    }
}
