//! Interactive renderer: expand/collapse state machine over a built tree.
//!
//! The tree is borrowed and never mutated. Per-node presentation state lives
//! in a side map keyed by [`NodeId`]; each state change runs the pure
//! [`layout`] and diffs the result against the previous frame to produce a
//! [`Transition`]. Positions are checkpointed before a call returns, so the
//! next transition always reads a consistent snapshot.

pub mod index;
pub mod layout;
pub mod transition;
pub mod viewport;

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::domain::entities::Node;

pub use index::{NodeId, Slot, ViewIndex};
pub use layout::{layout, Edge, Frame, Point, PositionedNode, PresentationState, Spacing};
pub use transition::{EdgeMotion, NodeMotion, Phase, Segment, Transition};
pub use viewport::{UserTransform, ViewBox, Viewport};

/// Per-node state as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Children hidden, still retained
    Collapsed,
    /// Children visible and laid out
    Expanded,
    /// No children; terminal
    Leaf,
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Depth-axis extent of the view box
    pub width: f64,
    pub spacing: Spacing,
    pub duration: Duration,
    /// Non-root nodes at this depth or deeper start collapsed
    pub collapse_depth: usize,
    /// Drop the user's pan/zoom when a toggle re-fits the view
    pub reset_zoom_on_toggle: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Horizontal gap between pointer and tooltip
    pub tooltip_offset: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let width = 960.0;
        Self {
            width,
            spacing: Spacing {
                sibling: 30.0,
                level: width / 4.0,
            },
            duration: Duration::from_millis(250),
            collapse_depth: 1,
            reset_zoom_on_toggle: true,
            min_zoom: 0.1,
            max_zoom: 8.0,
            tooltip_offset: 10.0,
        }
    }
}

/// Result of a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// A non-leaf node switched state and the view was re-laid out.
    Toggled {
        state: NodeState,
        transition: Transition,
    },
    /// A leaf with a usable URL was clicked; state is unchanged.
    OpenResource { href: String },
    /// Leaf without a URL, or a node that is not currently visible.
    Ignored,
}

/// Floating hover panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub position: Point,
}

pub struct Renderer<'a> {
    index: ViewIndex<'a>,
    states: HashMap<NodeId, PresentationState>,
    frame: Frame,
    viewport: Viewport,
    config: RenderConfig,
}

impl<'a> Renderer<'a> {
    /// Index `tree` and apply the initial expand state. Nothing is laid out
    /// until [`Renderer::draw`] is called.
    pub fn new(tree: &'a Node, config: RenderConfig) -> Self {
        let index = ViewIndex::new(tree);
        let root = index.root();
        let states = index
            .ids()
            .filter_map(|id| index.get(id).map(|slot| (id, slot)))
            .map(|(id, slot)| {
                let expanded = id == root || slot.depth < config.collapse_depth;
                (
                    id,
                    PresentationState {
                        expanded,
                        previous: None,
                    },
                )
            })
            .collect();
        let viewport = Viewport {
            fit: ViewBox::fit(&Frame::default(), &config.spacing, config.width),
            user: UserTransform::default(),
        };
        Self {
            index,
            states,
            frame: Frame::default(),
            viewport,
            config,
        }
    }

    /// Lay out the current state and animate from the last drawn frame.
    pub fn draw(&mut self) -> Transition {
        self.relayout()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn click(&mut self, id: NodeId) -> ClickOutcome {
        if !self.frame.contains(id) {
            return ClickOutcome::Ignored;
        }
        match self.state(id) {
            Some(NodeState::Leaf) => {
                let href = self
                    .node(id)
                    .and_then(|n| n.url.as_ref())
                    .and_then(|u| u.domain())
                    .map(|d| format!("https://{d}"));
                match href {
                    Some(href) => ClickOutcome::OpenResource { href },
                    None => ClickOutcome::Ignored,
                }
            }
            Some(_) => {
                let Some(state) = self.states.get_mut(&id) else {
                    return ClickOutcome::Ignored;
                };
                state.expanded = !state.expanded;
                if self.config.reset_zoom_on_toggle {
                    self.viewport.user = UserTransform::default();
                }
                let transition = self.relayout();
                let state = self.state(id).unwrap_or(NodeState::Leaf);
                debug!(?state, "toggled");
                ClickOutcome::Toggled { state, transition }
            }
            None => ClickOutcome::Ignored,
        }
    }

    /// Tooltip for a visible node under the pointer. Holds no state; the
    /// caller hides the panel on pointer-out.
    pub fn hover(&self, id: NodeId, pointer: Point) -> Option<Tooltip> {
        if !self.frame.contains(id) {
            return None;
        }
        let node = self.node(id)?;
        Some(Tooltip {
            text: node.hover_text().to_string(),
            position: Point::new(pointer.x + self.config.tooltip_offset, pointer.y),
        })
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.user.pan(dx, dy);
    }

    pub fn zoom(&mut self, factor: f64, focus: Point) {
        let (min, max) = (self.config.min_zoom, self.config.max_zoom);
        self.viewport.user.zoom(factor, focus, min, max);
    }

    pub fn root(&self) -> NodeId {
        self.index.root()
    }

    pub fn node(&self, id: NodeId) -> Option<&'a Node> {
        self.index.get(id).map(|s| s.node)
    }

    /// Full child list, independent of expand state.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.index.get(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.index.get(id).and_then(|s| s.parent)
    }

    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.index.get(id).map(|s| s.depth)
    }

    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        self.index.find(path)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        let slot = self.index.get(id)?;
        if slot.children.is_empty() {
            return Some(NodeState::Leaf);
        }
        let expanded = self.states.get(&id).is_some_and(|s| s.expanded);
        Some(if expanded {
            NodeState::Expanded
        } else {
            NodeState::Collapsed
        })
    }

    pub fn presentation(&self, id: NodeId) -> Option<&PresentationState> {
        self.states.get(&id)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.frame.contains(id)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn relayout(&mut self) -> Transition {
        let next = layout(&self.index, &self.states, &self.config.spacing);
        let fit = ViewBox::fit(&next, &self.config.spacing, self.config.width);
        let transition = transition::diff(
            &self.index,
            &self.frame,
            &next,
            &self.states,
            self.config.duration,
            fit,
        );
        for n in &next.nodes {
            if let Some(state) = self.states.get_mut(&n.id) {
                state.previous = Some(n.position);
            }
        }
        debug!(
            visible = next.nodes.len(),
            entering = transition.count(Phase::Enter),
            exiting = transition.count(Phase::Exit),
            "relayout"
        );
        self.frame = next;
        self.viewport.fit = fit;
        transition
    }
}
