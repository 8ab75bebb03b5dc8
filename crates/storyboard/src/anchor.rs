//! Geometry and the anchor abstraction.

use std::cell::Cell;
use std::fmt;
use std::rc::Weak;

use serde::{Deserialize, Serialize};

/// A point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    pub fn offset_by(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A square of side `side`.
    pub const fn square(side: f64) -> Self {
        Self::new(side, side)
    }
}

/// Axis-aligned bounding box in viewport pixels, as reported by
/// `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    pub const fn origin(&self) -> Coords {
        Coords::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The same box moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Something on screen whose position can be queried.
///
/// Implementors are owned elsewhere; projectors only keep an
/// [`AnchorHandle`].
pub trait Anchor {
    /// Current bounding box in viewport coordinates.
    fn bounding_box(&self) -> Rect;
}

/// Non-owning reference to an anchor.
pub type AnchorHandle = Weak<dyn Anchor>;

/// An anchor whose box is set directly. Useful for tests and for hosts
/// that compute layout themselves.
#[derive(Debug, Default)]
pub struct RectAnchor {
    rect: Cell<Rect>,
}

impl RectAnchor {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect: Cell::new(rect),
        }
    }

    pub fn set_rect(&self, rect: Rect) {
        self.rect.set(rect);
    }

    /// Moves the box by `(dx, dy)`; what scrolling does to a page element.
    pub fn translate(&self, dx: f64, dy: f64) {
        self.rect.set(self.rect.get().translated(dx, dy));
    }

    pub fn rect(&self) -> Rect {
        self.rect.get()
    }
}

impl Anchor for RectAnchor {
    fn bounding_box(&self) -> Rect {
        self.rect.get()
    }
}
