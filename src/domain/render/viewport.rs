//! Auto-fit view box and the user's independent pan/zoom transform.

use crate::domain::render::layout::{Frame, Point, Spacing};

/// Region of layout space the canvas shows, in `[min_x, min_y, width, height]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Fit the visible nodes of `frame` with two sibling slots of margin
    /// above and below. The depth axis starts a third of a level before the
    /// root and spans at least `width`, growing so the deepest visible node
    /// keeps a third of a level for its label.
    pub fn fit(frame: &Frame, spacing: &Spacing, width: f64) -> Self {
        let (top, bottom) = frame.breadth_bounds().unwrap_or((0.0, 0.0));
        let deepest = frame.depth_extent().unwrap_or(0.0);
        Self {
            min_x: -spacing.level / 3.0,
            min_y: top - spacing.sibling * 2.0,
            width: width.max(deepest + spacing.level * 2.0 / 3.0),
            height: bottom - top + spacing.sibling * 4.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x
            && p.x <= self.min_x + self.width
            && p.y >= self.min_y
            && p.y <= self.min_y + self.height
    }
}

/// Pan/zoom applied by the user on top of the auto-fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserTransform {
    pub scale: f64,
    pub translate: Point,
}

impl Default for UserTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::default(),
        }
    }
}

impl UserTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate.x += dx;
        self.translate.y += dy;
    }

    /// Scale by `factor` keeping `focus` fixed on screen.
    pub fn zoom(&mut self, factor: f64, focus: Point, min: f64, max: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let scale = (self.scale * factor).clamp(min, max);
        let ratio = scale / self.scale;
        self.translate = Point::new(
            focus.x - (focus.x - self.translate.x) * ratio,
            focus.y - (focus.y - self.translate.y) * ratio,
        );
        self.scale = scale;
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.translate.x,
            p.y * self.scale + self.translate.y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub fit: ViewBox,
    pub user: UserTransform,
}
