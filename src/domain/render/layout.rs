//! Pure layered tree layout: (tree, presentation state) -> positioned frame.

use std::collections::HashMap;

use crate::domain::render::index::{NodeId, ViewIndex};

/// Screen position. `x` runs along depth, `y` along siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fixed distances between neighbours on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    /// Between adjacent leaves of the visible tree
    pub sibling: f64,
    /// Between depth levels
    pub level: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            sibling: 30.0,
            level: 240.0,
        }
    }
}

/// Expand/collapse flag and last drawn position of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PresentationState {
    pub expanded: bool,
    /// Position checkpointed after the most recent layout that showed the node
    pub previous: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedNode {
    pub id: NodeId,
    pub depth: usize,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

/// Visible nodes (pre-order) and the edges between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

impl Frame {
    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.position)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn positions(&self) -> HashMap<NodeId, Point> {
        self.nodes.iter().map(|n| (n.id, n.position)).collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Largest depth-axis coordinate.
    pub fn depth_extent(&self) -> Option<f64> {
        self.nodes.iter().map(|n| n.position.x).reduce(f64::max)
    }

    /// Smallest and largest sibling-axis coordinate.
    pub fn breadth_bounds(&self) -> Option<(f64, f64)> {
        self.nodes.iter().map(|n| n.position.y).fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}

fn is_expanded(states: &HashMap<NodeId, PresentationState>, id: NodeId) -> bool {
    states.get(&id).is_some_and(|s| s.expanded)
}

/// Lay out the visible part of the tree.
///
/// The visible set is the root plus every descendant reachable through
/// expanded ancestors. Visible leaves take consecutive slots `sibling`
/// apart, a parent sits midway between its first and last visible child,
/// and the whole frame is shifted so the root sits at breadth 0.
pub fn layout(
    index: &ViewIndex<'_>,
    states: &HashMap<NodeId, PresentationState>,
    spacing: &Spacing,
) -> Frame {
    let mut frame = Frame::default();
    let mut next_leaf = 0usize;
    let root_breadth = place(
        index,
        states,
        spacing,
        index.root(),
        &mut next_leaf,
        &mut frame,
    );
    for node in &mut frame.nodes {
        node.position.y -= root_breadth;
    }
    frame
}

fn place(
    index: &ViewIndex<'_>,
    states: &HashMap<NodeId, PresentationState>,
    spacing: &Spacing,
    id: NodeId,
    next_leaf: &mut usize,
    frame: &mut Frame,
) -> f64 {
    let Some(slot) = index.get(id) else {
        return 0.0;
    };
    let at = frame.nodes.len();
    frame.nodes.push(PositionedNode {
        id,
        depth: slot.depth,
        position: Point::default(),
    });

    let visible: &[NodeId] = if is_expanded(states, id) {
        &slot.children
    } else {
        &[]
    };

    let breadth = if visible.is_empty() {
        let b = *next_leaf as f64 * spacing.sibling;
        *next_leaf += 1;
        b
    } else {
        let mut first = None;
        let mut last = 0.0;
        for &child in visible {
            frame.edges.push(Edge {
                source: id,
                target: child,
            });
            let b = place(index, states, spacing, child, next_leaf, frame);
            first.get_or_insert(b);
            last = b;
        }
        (first.unwrap_or(last) + last) / 2.0
    };

    frame.nodes[at].position = Point::new(slot.depth as f64 * spacing.level, breadth);
    breadth
}
