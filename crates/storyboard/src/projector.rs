//! Re-projects an anchor's screen position into an overlay layer.
//!
//! A [`CoordinateProjector`] watches one anchor through a non-owning handle.
//! Whenever the viewport scrolls or resizes it re-reads the anchor's
//! bounding box and publishes the new top-left corner, either directly or
//! through one [`DampedFollower`] per axis when smoothing is enabled.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use damping::{DampedFollower, FollowerConfig, FrameHandle, FrameScheduler};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::align::{Placement, ResolvedPlacement, resolve_overlay};
use crate::anchor::{AnchorHandle, Coords, Size};
use crate::viewport::{ListenerId, ViewportEvents};

/// Epsilon used by smoothing followers, in pixels.
pub const DEFAULT_SMOOTHING_EPSILON: f64 = 0.5;
/// Emission rate of smoothing followers.
pub const DEFAULT_SMOOTHING_FPS: u32 = 120;

/// Projector settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorOptions {
    /// Overlay self-alignment around the projected point.
    pub overlay: Placement,
    /// Smoothing time constant in seconds. Zero (or NaN) disables
    /// smoothing; a negative lag still goes through followers, which then
    /// land on the anchor at the first tick.
    pub smoothing_lag: f64,
    pub epsilon: f64,
    pub fps: u32,
}

impl Default for ProjectorOptions {
    fn default() -> Self {
        Self {
            overlay: Placement::default(),
            smoothing_lag: 0.0,
            epsilon: DEFAULT_SMOOTHING_EPSILON,
            fps: DEFAULT_SMOOTHING_FPS,
        }
    }
}

impl ProjectorOptions {
    pub fn with_overlay(mut self, overlay: Placement) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_smoothing_lag(mut self, lag: f64) -> Self {
        self.smoothing_lag = lag;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothing_lag != 0.0 && !self.smoothing_lag.is_nan()
    }

    /// Follower settings for one smoothed axis.
    pub fn follower_config(&self) -> FollowerConfig {
        FollowerConfig::default()
            .with_tau(self.smoothing_lag)
            .with_epsilon(self.epsilon)
            .with_fps(self.fps)
    }
}

/// Identifies a coordinate subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type CoordsListener = Rc<dyn Fn(Coords)>;

struct AxisFollowers {
    x: DampedFollower,
    y: DampedFollower,
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Per-frame coalescing of axis updates in smoothed mode.
struct AxisBatch {
    scheduler: Rc<dyn FrameScheduler>,
    /// Scheduler time of each axis' latest update.
    updated_at: Cell<[Option<f64>; 2]>,
    /// Coordinates changed but subscribers have not seen them yet.
    dirty: Cell<bool>,
    /// Fallback notification for when the other axis never reports.
    flush: Cell<Option<FrameHandle>>,
}

impl AxisBatch {
    fn cancel_flush(&self) {
        if let Some(handle) = self.flush.take() {
            self.scheduler.cancel_frame(handle);
        }
    }
}

struct ProjectorShared {
    anchor: RefCell<Option<AnchorHandle>>,
    coords: Cell<Coords>,
    followers: RefCell<Option<AxisFollowers>>,
    batch: Option<AxisBatch>,
    subscribers: RefCell<Vec<(SubscriptionId, CoordsListener)>>,
    next_subscription: Cell<u64>,
    torn_down: Cell<bool>,
}

impl ProjectorShared {
    fn on_anchor_moved(&self) {
        if self.torn_down.get() {
            return;
        }

        let anchor = self.anchor.borrow().as_ref().and_then(Weak::upgrade);
        let Some(anchor) = anchor else {
            warn!("Projector anchor is gone; ignoring viewport change");
            return;
        };
        let origin = anchor.bounding_box().origin();
        drop(anchor);

        let smoothed = {
            let followers = self.followers.borrow();
            if let Some(followers) = followers.as_ref() {
                followers.x.set_target(origin.x);
                followers.y.set_target(origin.y);
                true
            } else {
                false
            }
        };

        if smoothed {
            trace!(projector.target_x = origin.x, projector.target_y = origin.y, "Projector retargeted");
        } else {
            self.coords.set(origin);
            self.notify();
        }
    }

    /// Records one axis and notifies once both axes of the frame are in.
    ///
    /// Both followers tick in the same frame, so the first axis to report
    /// waits for the second one when it is still moving. A flush frame
    /// covers the case where the second axis ticks without emitting.
    fn on_axis_update(self: &Rc<Self>, axis: Axis, value: f64) {
        if self.torn_down.get() {
            return;
        }
        let mut coords = self.coords.get();
        match axis {
            Axis::X => coords.x = value,
            Axis::Y => coords.y = value,
        }
        self.coords.set(coords);

        let Some(batch) = &self.batch else {
            self.notify();
            return;
        };

        let now = batch.scheduler.now();
        let mut updated_at = batch.updated_at.get();
        updated_at[axis.index()] = Some(now);
        batch.updated_at.set(updated_at);

        let other = axis.other();
        let other_moving = self.followers.borrow().as_ref().is_some_and(|f| match other {
            Axis::X => f.x.is_scheduled(),
            Axis::Y => f.y.is_scheduled(),
        });
        let other_reported = updated_at[other.index()].is_some_and(|at| at.to_bits() == now.to_bits());

        if other_moving && !other_reported {
            batch.dirty.set(true);
            if batch.flush.get().is_none() {
                let weak = Rc::downgrade(self);
                let handle = batch.scheduler.request_frame(Box::new(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.flush();
                    }
                }));
                batch.flush.set(Some(handle));
            }
            return;
        }

        batch.dirty.set(false);
        batch.cancel_flush();
        self.notify();
    }

    fn flush(&self) {
        let Some(batch) = &self.batch else {
            return;
        };
        batch.flush.set(None);
        if batch.dirty.replace(false) && !self.torn_down.get() {
            trace!("Projector flushed a lone axis update");
            self.notify();
        }
    }

    fn notify(&self) {
        let coords = self.coords.get();
        let listeners: Vec<CoordsListener> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(coords);
        }
    }
}

/// Tracks an anchor and publishes its projected coordinates.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use damping::ManualScheduler;
/// use storyboard::{
///     Anchor, CoordinateProjector, Coords, ProjectorOptions, Rect, RectAnchor,
///     ViewportEvent, ViewportEvents,
/// };
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let events = Rc::new(ViewportEvents::new());
/// let anchor = Rc::new(RectAnchor::new(Rect::new(40.0, 300.0, 3.0, 3.0)));
/// let handle: Rc<dyn Anchor> = anchor.clone();
///
/// let projector = CoordinateProjector::new(
///     Rc::downgrade(&handle),
///     ProjectorOptions::default(),
///     scheduler,
///     events.clone(),
/// );
/// assert_eq!(projector.coords(), Coords::new(40.0, 300.0));
///
/// anchor.translate(0.0, -120.0);
/// events.dispatch(ViewportEvent::Scroll);
/// assert_eq!(projector.coords(), Coords::new(40.0, 180.0));
/// ```
pub struct CoordinateProjector {
    shared: Rc<ProjectorShared>,
    events: Rc<ViewportEvents>,
    listener: Cell<Option<ListenerId>>,
    options: ProjectorOptions,
    overlay: ResolvedPlacement,
}

impl CoordinateProjector {
    /// Starts tracking `anchor`. The initial coordinates are the anchor's
    /// current top-left corner.
    pub fn new(
        anchor: AnchorHandle,
        options: ProjectorOptions,
        scheduler: Rc<dyn FrameScheduler>,
        events: Rc<ViewportEvents>,
    ) -> Self {
        let initial = anchor.upgrade().map_or_else(
            || {
                warn!("Projector created for an anchor that is already gone");
                Coords::ORIGIN
            },
            |anchor| anchor.bounding_box().origin(),
        );

        let batch = options.is_smoothed().then(|| AxisBatch {
            scheduler: Rc::clone(&scheduler),
            updated_at: Cell::new([None, None]),
            dirty: Cell::new(false),
            flush: Cell::new(None),
        });
        let shared = Rc::new(ProjectorShared {
            anchor: RefCell::new(Some(anchor)),
            coords: Cell::new(initial),
            followers: RefCell::new(None),
            batch,
            subscribers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            torn_down: Cell::new(false),
        });

        if options.is_smoothed() {
            let config = options.follower_config();
            let followers = AxisFollowers {
                x: axis_follower(&shared, Axis::X, initial.x, config, Rc::clone(&scheduler)),
                y: axis_follower(&shared, Axis::Y, initial.y, config, scheduler),
            };
            *shared.followers.borrow_mut() = Some(followers);
        }

        let weak = Rc::downgrade(&shared);
        let listener = events.subscribe(move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.on_anchor_moved();
            }
        });

        debug!(
            projector.x = initial.x,
            projector.y = initial.y,
            projector.smoothing_lag = options.smoothing_lag,
            "Projector attached"
        );

        Self {
            shared,
            events,
            listener: Cell::new(Some(listener)),
            options,
            overlay: resolve_overlay(&options.overlay),
        }
    }

    /// Re-reads the anchor's box. Called on every scroll/resize; hosts may
    /// also call it after layout changes the viewport did not report.
    pub fn on_anchor_moved(&self) {
        self.shared.on_anchor_moved();
    }

    /// Latest projected coordinates.
    pub fn coords(&self) -> Coords {
        self.shared.coords.get()
    }

    /// Where an overlay of size `own` goes, given its self-alignment around
    /// the projected point.
    pub fn overlay_position(&self, own: Size) -> Coords {
        self.coords().offset_by(self.overlay.offset(Size::ZERO, own))
    }

    /// Registers a render consumer, called with every coordinate change.
    pub fn subscribe(&self, listener: impl Fn(Coords) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.get());
        self.shared.next_subscription.set(id.0 + 1);
        self.shared
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.shared.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        before != subscribers.len()
    }

    /// Stops observing the viewport, stops and drops the followers, and
    /// releases the anchor. Later events and in-flight follower ticks are
    /// ignored. Safe to call more than once, including from a subscriber.
    pub fn teardown(&self) {
        if self.shared.torn_down.replace(true) {
            return;
        }
        if let Some(listener) = self.listener.take() {
            self.events.unsubscribe(listener);
        }
        let followers = self.shared.followers.borrow_mut().take();
        if let Some(followers) = followers {
            followers.x.stop();
            followers.y.stop();
        }
        if let Some(batch) = &self.shared.batch {
            batch.cancel_flush();
        }
        self.shared.anchor.borrow_mut().take();
        self.shared.subscribers.borrow_mut().clear();
        debug!("Projector torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.get()
    }

    pub fn is_smoothed(&self) -> bool {
        self.shared.followers.borrow().is_some()
    }

    /// Whether any axis follower still has a tick pending.
    pub fn is_settling(&self) -> bool {
        self.shared
            .followers
            .borrow()
            .as_ref()
            .is_some_and(|f| f.x.is_scheduled() || f.y.is_scheduled())
    }

    /// Whether the anchor is still alive and held.
    pub fn has_anchor(&self) -> bool {
        self.shared
            .anchor
            .borrow()
            .as_ref()
            .is_some_and(|anchor| anchor.strong_count() > 0)
    }

    pub fn options(&self) -> &ProjectorOptions {
        &self.options
    }

    pub fn overlay(&self) -> ResolvedPlacement {
        self.overlay
    }
}

fn axis_follower(
    shared: &Rc<ProjectorShared>,
    axis: Axis,
    initial: f64,
    config: FollowerConfig,
    scheduler: Rc<dyn FrameScheduler>,
) -> DampedFollower {
    let weak = Rc::downgrade(shared);
    DampedFollower::new(
        initial,
        move |value| {
            if let Some(shared) = weak.upgrade() {
                shared.on_axis_update(axis, value);
            }
        },
        config,
        scheduler,
    )
}

impl Drop for CoordinateProjector {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for CoordinateProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateProjector")
            .field("coords", &self.coords())
            .field("smoothed", &self.is_smoothed())
            .field("torn_down", &self.is_torn_down())
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{Anchor, Rect, RectAnchor};
    use crate::viewport::ViewportEvent;
    use damping::ManualScheduler;

    struct Fixture {
        scheduler: Rc<ManualScheduler>,
        events: Rc<ViewportEvents>,
        anchor: Rc<RectAnchor>,
        handle: Rc<dyn Anchor>,
    }

    fn fixture(rect: Rect) -> Fixture {
        let anchor = Rc::new(RectAnchor::new(rect));
        let handle: Rc<dyn Anchor> = anchor.clone();
        Fixture {
            scheduler: Rc::new(ManualScheduler::new()),
            events: Rc::new(ViewportEvents::new()),
            anchor,
            handle,
        }
    }

    impl Fixture {
        fn projector(&self, options: ProjectorOptions) -> CoordinateProjector {
            CoordinateProjector::new(
                Rc::downgrade(&self.handle),
                options,
                self.scheduler.clone(),
                Rc::clone(&self.events),
            )
        }
    }

    #[test]
    fn test_initial_coords_from_anchor() {
        let fx = fixture(Rect::new(12.0, 34.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default());
        assert_eq!(projector.coords(), Coords::new(12.0, 34.0));
        assert!(!projector.is_smoothed());
        assert_eq!(fx.events.listener_count(), 1);
    }

    #[test]
    fn test_unsmoothed_updates_both_axes_at_once() {
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        projector.subscribe(move |c| sink.borrow_mut().push(c));

        fx.anchor.set_rect(Rect::new(5.0, -80.0, 3.0, 3.0));
        fx.events.dispatch(ViewportEvent::Resize);

        assert_eq!(*seen.borrow(), vec![Coords::new(5.0, -80.0)]);
        assert_eq!(fx.scheduler.pending_frames(), 0);
    }

    #[test]
    fn test_smoothed_follows_through_followers() {
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default().with_smoothing_lag(0.1));
        assert!(projector.is_smoothed());

        fx.anchor.translate(0.0, 200.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        assert_eq!(projector.coords(), Coords::ORIGIN, "no jump before the first tick");
        assert_eq!(fx.scheduler.pending_frames(), 2);

        fx.scheduler.step(16.0);
        let first = projector.coords();
        assert!(first.y > 0.0 && first.y < 200.0);

        fx.scheduler.run_until_idle(8.0, 10_000);
        assert_eq!(projector.coords(), Coords::new(0.0, 200.0));
        assert!(!projector.is_settling());
    }

    #[test]
    fn test_teardown_stops_everything() {
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default().with_smoothing_lag(0.1));
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        projector.subscribe(move |_| c.set(c.get() + 1));

        fx.anchor.translate(100.0, 100.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        projector.teardown();

        assert_eq!(fx.events.listener_count(), 0);
        assert_eq!(fx.scheduler.pending_frames(), 0);
        assert!(!projector.has_anchor());

        fx.events.dispatch(ViewportEvent::Scroll);
        fx.scheduler.run_until_idle(16.0, 100);
        assert_eq!(calls.get(), 0);
        assert!(fx.scheduler.is_idle());

        projector.teardown();
    }

    #[test]
    fn test_drop_unsubscribes() {
        let fx = fixture(Rect::default());
        let projector = fx.projector(ProjectorOptions::default().with_smoothing_lag(0.05));
        assert_eq!(fx.events.listener_count(), 1);
        drop(projector);
        assert_eq!(fx.events.listener_count(), 0);
        assert_eq!(fx.scheduler.pending_frames(), 0);
    }

    #[test]
    fn test_dead_anchor_is_ignored() {
        let fx = fixture(Rect::new(7.0, 8.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default());
        let Fixture { anchor, handle, events, .. } = fx;
        drop(anchor);
        drop(handle);

        events.dispatch(ViewportEvent::Scroll);
        assert_eq!(projector.coords(), Coords::new(7.0, 8.0));
        assert!(!projector.has_anchor());
    }

    #[test]
    fn test_overlay_position() {
        let fx = fixture(Rect::new(100.0, 100.0, 3.0, 3.0));
        let options = ProjectorOptions::default().with_overlay(Placement::centered());
        let projector = fx.projector(options);
        assert_eq!(
            projector.overlay_position(Size::new(40.0, 20.0)),
            Coords::new(80.0, 90.0)
        );
    }

    #[test]
    fn test_teardown_from_subscriber() {
        let fx = fixture(Rect::default());
        let projector = Rc::new(fx.projector(ProjectorOptions::default().with_smoothing_lag(0.1)));
        let weak = Rc::downgrade(&projector);
        projector.subscribe(move |_| {
            if let Some(projector) = weak.upgrade() {
                projector.teardown();
            }
        });

        fx.anchor.translate(0.0, 50.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        fx.scheduler.step(16.0);

        assert!(projector.is_torn_down());
        fx.scheduler.run_until_idle(16.0, 100);
        assert!(fx.scheduler.is_idle());
    }

    #[test]
    fn test_smoothing_enabled_by_any_nonzero_lag() {
        assert!(!ProjectorOptions::default().is_smoothed());
        assert!(!ProjectorOptions::default().with_smoothing_lag(f64::NAN).is_smoothed());
        assert!(ProjectorOptions::default().with_smoothing_lag(0.2).is_smoothed());
        assert!(ProjectorOptions::default().with_smoothing_lag(-0.1).is_smoothed());
    }

    #[test]
    fn test_options_are_kept() {
        let fx = fixture(Rect::default());
        let options = ProjectorOptions::default().with_smoothing_lag(0.25).with_fps(60);
        let projector = fx.projector(options);
        assert_eq!(projector.options(), &options);
        assert_eq!(projector.options().follower_config().tau, 0.25);
        assert!(projector.options().is_smoothed());
    }

    #[test]
    fn test_negative_lag_lands_on_first_tick() {
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default().with_smoothing_lag(-0.1));
        assert!(projector.is_smoothed());

        fx.anchor.translate(0.0, 10.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        assert_eq!(projector.coords(), Coords::ORIGIN);
        assert_eq!(fx.scheduler.pending_frames(), 2);

        fx.scheduler.step(16.0);
        assert_eq!(projector.coords(), Coords::new(0.0, 10.0));

        fx.scheduler.run_until_idle(16.0, 100);
        assert_eq!(projector.coords(), Coords::new(0.0, 10.0));
        assert!(!projector.is_settling());
        assert!(fx.scheduler.is_idle());
    }

    #[test]
    fn test_diagonal_move_notifies_whole_points() {
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let projector = fx.projector(ProjectorOptions::default().with_smoothing_lag(0.1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        projector.subscribe(move |c| sink.borrow_mut().push(c));

        fx.anchor.translate(100.0, 100.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        let frames = fx.scheduler.run_until_idle(16.0, 10_000);

        let seen = seen.borrow();
        assert_eq!(seen.len(), frames, "one notification per frame");
        for coords in seen.iter() {
            assert_eq!(coords.x, coords.y, "half-updated point {coords:?}");
        }
        assert_eq!(seen.last(), Some(&Coords::new(100.0, 100.0)));
        assert!(fx.scheduler.is_idle());
    }

    #[test]
    fn test_parked_axis_does_not_hold_back_the_other() {
        // At 30 fps the y follower parks its emissions while x starts moving.
        let fx = fixture(Rect::new(0.0, 0.0, 3.0, 3.0));
        let options = ProjectorOptions::default().with_smoothing_lag(0.1).with_fps(30);
        let projector = fx.projector(options);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        projector.subscribe(move |c| sink.borrow_mut().push(c));

        fx.anchor.translate(0.0, 100.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        fx.scheduler.step(20.0);
        fx.scheduler.step(20.0);
        assert_eq!(seen.borrow().len(), 1);

        fx.anchor.translate(100.0, 0.0);
        fx.events.dispatch(ViewportEvent::Scroll);
        fx.scheduler.step(20.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].x > 0.0);
        assert!(seen[1].y > seen[0].y);
        assert_eq!(projector.coords(), seen[1]);
    }
}
