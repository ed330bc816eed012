//! Enter/update/exit motion derived by diffing two frames.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::render::index::{NodeId, ViewIndex};
use crate::domain::render::layout::{Frame, Point, PresentationState};
use crate::domain::render::viewport::ViewBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Newly visible
    Enter,
    /// Visible before and after
    Update,
    /// No longer visible
    Exit,
}

/// Straight connector between a parent and a child position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    /// Zero-length segment, used for edges growing out of or shrinking into a point.
    pub fn at(p: Point) -> Self {
        Self { start: p, end: p }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMotion {
    pub id: NodeId,
    pub phase: Phase,
    pub from: Point,
    pub to: Point,
}

/// Edges are identified by their target node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMotion {
    pub source: NodeId,
    pub target: NodeId,
    pub phase: Phase,
    pub from: Segment,
    pub to: Segment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub duration: Duration,
    pub nodes: Vec<NodeMotion>,
    pub edges: Vec<EdgeMotion>,
    /// Auto-fit view box to animate to
    pub viewport: ViewBox,
}

impl Transition {
    pub fn node(&self, id: NodeId) -> Option<&NodeMotion> {
        self.nodes.iter().find(|m| m.id == id)
    }

    pub fn edge(&self, target: NodeId) -> Option<&EdgeMotion> {
        self.edges.iter().find(|m| m.target == target)
    }

    pub fn count(&self, phase: Phase) -> usize {
        self.nodes.iter().filter(|m| m.phase == phase).count()
    }
}

/// Compute the motion from `previous` to `next`.
///
/// `saved` must still hold the checkpoints of `previous`. Entering items
/// start at the recorded position of their nearest ancestor that was visible
/// in `previous`; exiting items end at the new position of their nearest
/// ancestor that is visible in `next`. When no such ancestor exists (first
/// draw) the origin is used.
pub fn diff(
    index: &ViewIndex<'_>,
    previous: &Frame,
    next: &Frame,
    saved: &HashMap<NodeId, PresentationState>,
    duration: Duration,
    viewport: ViewBox,
) -> Transition {
    let before = previous.positions();
    let after = next.positions();

    let recorded = |id: NodeId| -> Point {
        saved
            .get(&id)
            .and_then(|s| s.previous)
            .or_else(|| before.get(&id).copied())
            .unwrap_or_default()
    };
    let enter_origin = |id: NodeId| -> Point {
        index
            .ancestors(id)
            .find(|a| before.contains_key(a))
            .map(recorded)
            .unwrap_or_default()
    };
    let exit_target = |id: NodeId| -> Point {
        index
            .ancestors(id)
            .find_map(|a| after.get(&a).copied())
            .unwrap_or_default()
    };

    let mut nodes = Vec::with_capacity(next.nodes.len());
    for n in &next.nodes {
        let (phase, from) = if before.contains_key(&n.id) {
            (Phase::Update, recorded(n.id))
        } else {
            (Phase::Enter, enter_origin(n.id))
        };
        nodes.push(NodeMotion {
            id: n.id,
            phase,
            from,
            to: n.position,
        });
    }
    for n in previous.nodes.iter().filter(|n| !after.contains_key(&n.id)) {
        nodes.push(NodeMotion {
            id: n.id,
            phase: Phase::Exit,
            from: recorded(n.id),
            to: exit_target(n.id),
        });
    }

    let mut edges = Vec::with_capacity(next.edges.len());
    for e in &next.edges {
        let to = Segment {
            start: after.get(&e.source).copied().unwrap_or_default(),
            end: after.get(&e.target).copied().unwrap_or_default(),
        };
        let (phase, from) = if before.contains_key(&e.target) {
            (
                Phase::Update,
                Segment {
                    start: recorded(e.source),
                    end: recorded(e.target),
                },
            )
        } else {
            (Phase::Enter, Segment::at(enter_origin(e.target)))
        };
        edges.push(EdgeMotion {
            source: e.source,
            target: e.target,
            phase,
            from,
            to,
        });
    }
    for e in previous.edges.iter().filter(|e| !after.contains_key(&e.target)) {
        edges.push(EdgeMotion {
            source: e.source,
            target: e.target,
            phase: Phase::Exit,
            from: Segment {
                start: recorded(e.source),
                end: recorded(e.target),
            },
            to: Segment::at(exit_target(e.target)),
        });
    }

    Transition {
        duration,
        nodes,
        edges,
        viewport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Node, ResourceUrl};
    use crate::domain::render::layout::{layout, Spacing};
    use crate::domain::render::viewport::ViewBox;

    fn sample() -> Node {
        let mut root = Node::category("root");
        let mut a = Node::category("A");
        a.children.push(Node::resource("r1", None, ResourceUrl::Unavailable));
        a.children.push(Node::resource("r2", None, ResourceUrl::Unavailable));
        root.children.push(a);
        root.children.push(Node::resource("r3", None, ResourceUrl::Unavailable));
        root
    }

    fn states(index: &ViewIndex<'_>, expanded: bool) -> HashMap<NodeId, PresentationState> {
        index
            .ids()
            .map(|id| {
                (
                    id,
                    PresentationState {
                        expanded,
                        previous: None,
                    },
                )
            })
            .collect()
    }

    fn checkpoint(saved: &mut HashMap<NodeId, PresentationState>, frame: &Frame) {
        for n in &frame.nodes {
            if let Some(s) = saved.get_mut(&n.id) {
                s.previous = Some(n.position);
            }
        }
    }

    fn fit(frame: &Frame) -> ViewBox {
        ViewBox::fit(frame, &Spacing::default(), 960.0)
    }

    #[test]
    fn given_first_draw_when_diffing_then_everything_enters_from_origin() {
        let tree = sample();
        let index = ViewIndex::new(&tree);
        let saved = states(&index, true);
        let next = layout(&index, &saved, &Spacing::default());

        let t = diff(
            &index,
            &Frame::default(),
            &next,
            &saved,
            Duration::from_millis(250),
            fit(&next),
        );

        assert_eq!(t.count(Phase::Enter), 5);
        assert_eq!(t.count(Phase::Exit), 0);
        assert!(t.nodes.iter().all(|m| m.from == Point::default()));
        assert!(t.edges.iter().all(|e| e.phase == Phase::Enter));
        assert_eq!(t.edges.len(), 4);
    }

    #[test]
    fn given_collapse_when_diffing_then_children_exit_into_parent() {
        let tree = sample();
        let index = ViewIndex::new(&tree);
        let mut saved = states(&index, true);
        let spacing = Spacing::default();
        let before = layout(&index, &saved, &spacing);
        checkpoint(&mut saved, &before);

        let a = index.find(&["A"]).unwrap();
        saved.get_mut(&a).unwrap().expanded = false;
        let after = layout(&index, &saved, &spacing);
        let t = diff(&index, &before, &after, &saved, Duration::ZERO, fit(&after));

        let a_now = after.position(a).unwrap();
        let r1 = index.find(&["A", "r1"]).unwrap();
        let exit = t.node(r1).unwrap();
        assert_eq!(exit.phase, Phase::Exit);
        assert_eq!(exit.from, before.position(r1).unwrap());
        assert_eq!(exit.to, a_now);
        let edge = t.edge(r1).unwrap();
        assert_eq!(edge.phase, Phase::Exit);
        assert_eq!(edge.to, Segment::at(a_now));
        assert_eq!(t.count(Phase::Update), 3);
    }

    #[test]
    fn given_expand_when_diffing_then_children_enter_from_parent_checkpoint() {
        let tree = sample();
        let index = ViewIndex::new(&tree);
        let mut saved = states(&index, true);
        let spacing = Spacing::default();
        let a = index.find(&["A"]).unwrap();
        saved.get_mut(&a).unwrap().expanded = false;
        let before = layout(&index, &saved, &spacing);
        checkpoint(&mut saved, &before);

        saved.get_mut(&a).unwrap().expanded = true;
        let after = layout(&index, &saved, &spacing);
        let t = diff(&index, &before, &after, &saved, Duration::ZERO, fit(&after));

        let a_before = before.position(a).unwrap();
        let r2 = index.find(&["A", "r2"]).unwrap();
        let enter = t.node(r2).unwrap();
        assert_eq!(enter.phase, Phase::Enter);
        assert_eq!(enter.from, a_before);
        assert_eq!(enter.to, after.position(r2).unwrap());
        assert_eq!(t.edge(r2).unwrap().from, Segment::at(a_before));
        assert_eq!(t.count(Phase::Enter), 2);
    }
}
