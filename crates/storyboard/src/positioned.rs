//! Two-phase positioned items.
//!
//! A [`Positioned`] starts out knowing only how it wants to be placed. The
//! host lays out the reference marker, then calls
//! [`attach`](Positioned::attach) with the marker as anchor; only then is a
//! [`CoordinateProjector`] created.

use std::fmt;
use std::rc::Rc;

use damping::FrameScheduler;
use tracing::debug;

use crate::align::{ResolvedPlacement, resolve_marker, resolve_overlay};
use crate::anchor::{AnchorHandle, Coords, Size};
use crate::frame::FrameItem;
use crate::projector::{CoordinateProjector, ProjectorOptions};
use crate::viewport::ViewportEvents;

/// Side of the dot drawn for reference markers in debug mode, in pixels.
pub const DEBUG_MARKER_SIZE: f64 = 3.0;

/// A storyboard item and, once attached, its projector.
pub struct Positioned {
    key: String,
    item: FrameItem,
    marker: ResolvedPlacement,
    overlay: ResolvedPlacement,
    projector: Option<CoordinateProjector>,
}

impl Positioned {
    /// Resolves `item`'s placements. Nothing is tracked yet.
    pub fn new(key: impl Into<String>, item: &FrameItem) -> Self {
        Self {
            key: key.into(),
            item: item.clone(),
            marker: resolve_marker(&item.align),
            overlay: resolve_overlay(&item.anchor),
            projector: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn item(&self) -> &FrameItem {
        &self.item
    }

    pub fn element(&self) -> Option<&str> {
        self.item.element.as_deref()
    }

    /// Marker placement inside the frame.
    pub fn marker(&self) -> ResolvedPlacement {
        self.marker
    }

    /// Overlay self-alignment around the projected point.
    pub fn overlay(&self) -> ResolvedPlacement {
        self.overlay
    }

    /// Projector settings derived from the item.
    pub fn projector_options(&self) -> ProjectorOptions {
        ProjectorOptions::default()
            .with_overlay(self.item.anchor)
            .with_smoothing_lag(self.item.easing_lag.unwrap_or(0.0))
    }

    /// Offset of the reference marker inside a frame of size `frame`. The
    /// marker is a point, or a [`DEBUG_MARKER_SIZE`] dot when `debug` is set.
    pub fn marker_offset(&self, frame: Size, debug: bool) -> Coords {
        let own = if debug {
            Size::square(DEBUG_MARKER_SIZE)
        } else {
            Size::ZERO
        };
        self.marker.offset(frame, own)
    }

    /// Starts projecting `anchor`, replacing any earlier projector.
    pub fn attach(
        &mut self,
        anchor: AnchorHandle,
        scheduler: Rc<dyn FrameScheduler>,
        events: Rc<ViewportEvents>,
    ) -> &CoordinateProjector {
        if let Some(old) = self.projector.take() {
            old.teardown();
        }
        debug!(positioned.key = %self.key, "Attaching positioned item");
        self.projector.insert(CoordinateProjector::new(
            anchor,
            self.projector_options(),
            scheduler,
            events,
        ))
    }

    /// Tears down the projector. Returns whether one was attached.
    pub fn detach(&mut self) -> bool {
        match self.projector.take() {
            Some(projector) => {
                projector.teardown();
                debug!(positioned.key = %self.key, "Detached positioned item");
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.projector.is_some()
    }

    pub fn projector(&self) -> Option<&CoordinateProjector> {
        self.projector.as_ref()
    }

    /// Projected coordinates, once attached.
    pub fn coords(&self) -> Option<Coords> {
        self.projector.as_ref().map(CoordinateProjector::coords)
    }

    /// Where an overlay of size `own` goes, once attached.
    pub fn overlay_position(&self, own: Size) -> Option<Coords> {
        self.projector.as_ref().map(|p| p.overlay_position(own))
    }
}

impl fmt::Debug for Positioned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Positioned")
            .field("key", &self.key)
            .field("marker", &self.marker)
            .field("overlay", &self.overlay)
            .field("projector", &self.projector)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{AxisAlign, Length, Placement};
    use crate::anchor::{Anchor, Rect, RectAnchor};
    use crate::viewport::ViewportEvent;
    use damping::ManualScheduler;

    fn item() -> FrameItem {
        FrameItem::new()
            .with_element("caption")
            .with_align(Placement::centered().with_left(Length::Px(10.0)))
            .with_anchor(Placement::centered())
    }

    #[test]
    fn test_new_is_unattached() {
        let positioned = Positioned::new("0-0", &item());
        assert_eq!(positioned.key(), "0-0");
        assert_eq!(positioned.element(), Some("caption"));
        assert!(!positioned.is_attached());
        assert_eq!(positioned.coords(), None);
        assert_eq!(positioned.marker().x, AxisAlign::Start(Length::Px(10.0)));
        assert_eq!(positioned.marker().y, AxisAlign::Center);
    }

    #[test]
    fn test_marker_offset() {
        let positioned = Positioned::new("0-0", &item());
        let frame = Size::new(800.0, 600.0);
        assert_eq!(positioned.marker_offset(frame, false), Coords::new(10.0, 300.0));
        assert_eq!(positioned.marker_offset(frame, true), Coords::new(10.0, 298.5));
    }

    #[test]
    fn test_attach_and_detach() {
        let scheduler = Rc::new(ManualScheduler::new());
        let events = Rc::new(ViewportEvents::new());
        let anchor = Rc::new(RectAnchor::new(Rect::new(10.0, 300.0, 0.0, 0.0)));
        let handle: Rc<dyn Anchor> = anchor.clone();

        let mut positioned = Positioned::new("1-0", &item());
        let coords = positioned
            .attach(Rc::downgrade(&handle), scheduler.clone(), Rc::clone(&events))
            .coords();
        assert_eq!(coords, Coords::new(10.0, 300.0));
        assert_eq!(
            positioned.overlay_position(Size::new(100.0, 20.0)),
            Some(Coords::new(-40.0, 290.0))
        );

        anchor.translate(0.0, -100.0);
        events.dispatch(ViewportEvent::Scroll);
        assert_eq!(positioned.coords(), Some(Coords::new(10.0, 200.0)));

        assert!(positioned.detach());
        assert!(!positioned.detach());
        assert_eq!(events.listener_count(), 0);
    }

    #[test]
    fn test_reattach_replaces_projector() {
        let scheduler = Rc::new(ManualScheduler::new());
        let events = Rc::new(ViewportEvents::new());
        let first: Rc<dyn Anchor> = Rc::new(RectAnchor::new(Rect::new(1.0, 1.0, 0.0, 0.0)));
        let second: Rc<dyn Anchor> = Rc::new(RectAnchor::new(Rect::new(2.0, 2.0, 0.0, 0.0)));

        let mut positioned = Positioned::new("0-0", &item().with_easing_lag(0.1));
        positioned.attach(Rc::downgrade(&first), scheduler.clone(), Rc::clone(&events));
        positioned.attach(Rc::downgrade(&second), scheduler.clone(), Rc::clone(&events));

        assert_eq!(events.listener_count(), 1);
        assert_eq!(positioned.coords(), Some(Coords::new(2.0, 2.0)));
        assert!(positioned.projector().is_some_and(CoordinateProjector::is_smoothed));
    }
}
