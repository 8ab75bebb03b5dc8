#![forbid(unsafe_code)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

//! # Storyboard
//!
//! Scroll-linked overlay positioning.
//!
//! A storyboard is a stack of frames. Each frame holds items; each item
//! places a small reference marker inside its frame and, once the host has
//! laid that marker out, projects the marker's screen position into a
//! fixed overlay layer. The projection is refreshed on every scroll and
//! resize, optionally smoothed with an exponentially damped follower per
//! axis.
//!
//! - [`align`]: CSS-like placements and their per-axis resolution
//! - [`CoordinateProjector`]: tracks an [`Anchor`] and publishes [`Coords`]
//! - [`Positioned`]: two-phase item (resolve now, attach once the anchor exists)
//! - [`Storyboard`]: frame documents loaded from JSON/TOML
//! - [`ScrollReporter`]: frame-synchronized scroll progress callbacks
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use damping::ManualScheduler;
//! use storyboard::{Anchor, Rect, RectAnchor, Storyboard, ViewportEvent, ViewportEvents};
//!
//! let board = Storyboard::from_toml(r#"
//! [[frames]]
//! height = "100%"
//!
//! [[frames.items]]
//! element = "title"
//! easing_lag = 0.1
//! align = { center = true }
//! "#).unwrap();
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let events = Rc::new(ViewportEvents::new());
//! let marker = Rc::new(RectAnchor::new(Rect::new(400.0, 300.0, 0.0, 0.0)));
//! let anchor: Rc<dyn Anchor> = marker.clone();
//!
//! let mut items = board.positioned();
//! items[0].attach(Rc::downgrade(&anchor), scheduler.clone(), events.clone());
//!
//! // The page scrolls by 120px; the overlay eases after it.
//! marker.translate(0.0, -120.0);
//! events.dispatch(ViewportEvent::Scroll);
//! scheduler.run_until_idle(16.0, 10_000);
//!
//! assert_eq!(items[0].coords().map(|c| c.y), Some(180.0));
//! ```

pub mod align;
mod anchor;
mod frame;
mod positioned;
mod projector;
mod scroll;
mod viewport;
#[cfg(feature = "web")]
mod web;

pub use align::{
    AxisAlign, Length, LengthParseError, Placement, ResolvedPlacement, resolve_marker,
    resolve_overlay,
};
pub use anchor::{Anchor, AnchorHandle, Coords, Rect, RectAnchor, Size};
pub use frame::{
    DebugOptions, FrameHeight, FrameItem, Storyboard, StoryboardFrame, StoryboardLoadError,
    StoryboardSaveError, StoryboardValidationError,
};
pub use positioned::{DEBUG_MARKER_SIZE, Positioned};
pub use projector::{
    CoordinateProjector, DEFAULT_SMOOTHING_EPSILON, DEFAULT_SMOOTHING_FPS, ProjectorOptions,
    SubscriptionId,
};
pub use scroll::{ScrollInfo, ScrollReporter, ScrollSource};
pub use viewport::{ListenerId, ViewportEvent, ViewportEvents};
#[cfg(feature = "web")]
pub use web::{BrowserScheduler, ElementAnchor, ElementScrollSource, WindowViewport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::align::{Length, Placement};
    pub use crate::anchor::{Anchor, Coords, Rect, Size};
    pub use crate::frame::{FrameItem, Storyboard, StoryboardFrame};
    pub use crate::positioned::Positioned;
    pub use crate::projector::{CoordinateProjector, ProjectorOptions};
    pub use crate::scroll::{ScrollInfo, ScrollReporter, ScrollSource};
    pub use crate::viewport::{ViewportEvent, ViewportEvents};
}
