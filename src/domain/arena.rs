use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Node, ResourceUrl};
use crate::domain::error::{DomainError, DomainResult};

/// Payload of a node while the tree is under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Root or hierarchy level; deduplicated by lookup key under its parent.
    Category { name: String },
    /// One input row; never deduplicated.
    Resource {
        name: String,
        tooltip: Option<String>,
        url: ResourceUrl,
    },
}

impl NodeData {
    pub fn name(&self) -> &str {
        match self {
            NodeData::Category { name } | NodeData::Resource { name, .. } => name,
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, NodeData::Category { .. })
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

/// Mutable tree used by a single build.
///
/// Category lookup is keyed by `(parent, key)` so the same name may appear
/// under different parents. The arena and its lookup table are dropped once
/// the tree is frozen into a [`Node`].
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Index,
    categories: HashMap<(Index, String), Index>,
}

impl TreeArena {
    pub fn new(root_name: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data: NodeData::Category {
                name: root_name.to_string(),
            },
            parent: None,
            children: Vec::new(),
        });
        Self {
            arena,
            root,
            categories: HashMap::new(),
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Index) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        node_idx
    }

    /// Look up the category `key` under `parent`, creating it with `name`
    /// on first sight. Later calls with the same key return the first node
    /// and keep its original display name.
    #[instrument(level = "trace", skip(self))]
    pub fn category(&mut self, parent: Index, key: &str, name: &str) -> Index {
        if let Some(&idx) = self.categories.get(&(parent, key.to_string())) {
            return idx;
        }
        let idx = self.insert_node(
            NodeData::Category {
                name: name.to_string(),
            },
            parent,
        );
        self.categories.insert((parent, key.to_string()), idx);
        idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Remove every non-root category whose children are all gone.
    ///
    /// Post-order guarantees a parent is inspected after its children have
    /// been pruned, so emptiness cascades upward. Returns the number of
    /// removed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn prune(&mut self) -> usize {
        let order: Vec<Index> = self.iter_postorder().map(|(idx, _)| idx).collect();
        let mut removed = 0;
        for idx in order {
            if idx == self.root {
                continue;
            }
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            if !node.data.is_category() || !node.children.is_empty() {
                continue;
            }
            let parent = node.parent;
            self.arena.remove(idx);
            if let Some(parent) = parent.and_then(|p| self.arena.get_mut(p)) {
                parent.children.retain(|&c| c != idx);
            }
            self.categories.retain(|_, v| *v != idx);
            removed += 1;
        }
        removed
    }

    /// Convert into the immutable snapshot handed to callers.
    #[instrument(level = "debug", skip(self))]
    pub fn freeze(&self) -> DomainResult<Node> {
        self.freeze_node(self.root)
    }

    fn freeze_node(&self, idx: Index) -> DomainResult<Node> {
        let node = self
            .get_node(idx)
            .ok_or_else(|| DomainError::Invariant(format!("dangling arena index {idx:?}")))?;
        let mut out = match &node.data {
            NodeData::Category { name } => Node::category(name.clone()),
            NodeData::Resource { name, tooltip, url } => {
                Node::resource(name.clone(), tooltip.clone(), url.clone())
            }
        };
        out.children = node
            .children
            .iter()
            .map(|&child| self.freeze_node(child))
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(out)
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str) -> NodeData {
        NodeData::Resource {
            name: name.to_string(),
            tooltip: None,
            url: ResourceUrl::Unavailable,
        }
    }

    #[test]
    fn given_same_key_when_category_requested_twice_then_returns_existing() {
        let mut tree = TreeArena::new("root");
        let root = tree.root();

        let first = tree.category(root, "finance", "Finance");
        let second = tree.category(root, "finance", "FINANCE");

        assert_eq!(first, second);
        assert_eq!(tree.get_node(first).unwrap().data.name(), "Finance");
        assert_eq!(tree.get_node(root).unwrap().children.len(), 1);
    }

    #[test]
    fn given_same_key_under_different_parents_then_creates_distinct_nodes() {
        let mut tree = TreeArena::new("root");
        let root = tree.root();
        let a = tree.category(root, "a", "A");
        let b = tree.category(root, "b", "B");

        assert_ne!(tree.category(a, "x", "X"), tree.category(b, "x", "X"));
    }

    //      root
    //      /  \
    //     a    b
    //     |    |
    //     c    r
    #[test]
    fn given_empty_category_chain_when_pruned_then_removes_whole_chain() {
        let mut tree = TreeArena::new("root");
        let root = tree.root();
        let a = tree.category(root, "a", "a");
        tree.category(a, "c", "c");
        let b = tree.category(root, "b", "b");
        tree.insert_node(resource("r"), b);

        let removed = tree.prune();
        let frozen = tree.freeze().unwrap();

        assert_eq!(removed, 2);
        assert_eq!(frozen.children.len(), 1);
        assert_eq!(frozen.children[0].name, "b");
        assert_eq!(tree.category(root, "a", "a2"), tree.category(root, "a", "a3"));
    }

    #[test]
    fn given_only_root_when_pruned_then_root_survives() {
        let mut tree = TreeArena::new("root");
        assert_eq!(tree.prune(), 0);
        let frozen = tree.freeze().unwrap();
        assert_eq!(frozen.name, "root");
        assert!(frozen.children.is_empty());
    }

    #[test]
    fn given_tree_when_iterating_postorder_then_children_before_parent() {
        let mut tree = TreeArena::new("root");
        let root = tree.root();
        let a = tree.category(root, "a", "a");
        tree.insert_node(resource("r1"), a);
        tree.insert_node(resource("r2"), root);

        let names: Vec<_> = tree
            .iter_postorder()
            .map(|(_, n)| n.data.name().to_string())
            .collect();

        assert_eq!(names, vec!["r1", "a", "r2", "root"]);
    }
}
