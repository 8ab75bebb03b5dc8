//! Scroll position reporting.
//!
//! A [`ScrollReporter`] watches one scrollable source. On every scroll event
//! it requests an animation frame, reads `scroll_top` inside that frame and
//! hands a [`ScrollInfo`] to each registered callback. Several scroll events
//! before the frame runs share that one read.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use damping::{FrameHandle, FrameScheduler};
use serde::Serialize;
use tracing::{debug, trace};

use crate::viewport::{ListenerId, ViewportEvent, ViewportEvents};

/// Something that scrolls vertically.
pub trait ScrollSource {
    /// Pixels scrolled from the top.
    fn scroll_top(&self) -> f64;
    /// Height of the visible part.
    fn client_height(&self) -> f64;
    /// Height of the full content.
    fn scroll_height(&self) -> f64;
}

/// Scroll position snapshot handed to callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollInfo {
    /// Pixels scrolled from the top.
    pub px_top: f64,
    /// `px_top` in units of the visible height.
    pub viewable_ratio: f64,
    /// Fraction of the scrollable range covered, `0..=1` in normal use.
    pub progress_ratio: f64,
}

impl ScrollInfo {
    /// Computes ratios; a non-positive denominator gives 0.
    pub fn compute(px_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            px_top,
            viewable_ratio: ratio(px_top, client_height),
            progress_ratio: ratio(px_top, scroll_height - client_height),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

type ScrollCallback = Rc<dyn Fn(ScrollInfo)>;

struct Registration {
    source: Weak<dyn ScrollSource>,
    events: Rc<ViewportEvents>,
    listener: ListenerId,
}

struct ReporterInner {
    scheduler: Rc<dyn FrameScheduler>,
    registration: RefCell<Option<Registration>>,
    px_top: Cell<f64>,
    callbacks: RefCell<Vec<(String, ScrollCallback)>>,
    pending_frame: Cell<Option<FrameHandle>>,
}

impl ReporterInner {
    fn source(&self) -> Option<Rc<dyn ScrollSource>> {
        self.registration
            .borrow()
            .as_ref()
            .and_then(|registration| registration.source.upgrade())
    }

    fn on_scroll(self: &Rc<Self>) {
        if self.pending_frame.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let handle = self.scheduler.request_frame(Box::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.read_frame();
            }
        }));
        self.pending_frame.set(Some(handle));
    }

    fn read_frame(&self) {
        self.pending_frame.set(None);
        let Some(source) = self.source() else {
            trace!("Scroll source gone before frame; skipping");
            return;
        };
        self.px_top.set(source.scroll_top());
        drop(source);

        let callbacks: Vec<ScrollCallback> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(self.scroll_info());
        }
    }

    fn scroll_info(&self) -> ScrollInfo {
        let (client_height, scroll_height) = self
            .source()
            .map_or((0.0, 0.0), |source| (source.client_height(), source.scroll_height()));
        ScrollInfo::compute(self.px_top.get(), client_height, scroll_height)
    }

    fn unregister(&self) -> bool {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        let registration = self.registration.borrow_mut().take();
        match registration {
            Some(registration) => {
                registration.events.unsubscribe(registration.listener);
                true
            }
            None => false,
        }
    }
}

/// Reports scroll position of a registered source to keyed callbacks.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use damping::ManualScheduler;
/// use storyboard::{ScrollReporter, ScrollSource, ViewportEvent, ViewportEvents};
///
/// struct Page(Cell<f64>);
/// impl ScrollSource for Page {
///     fn scroll_top(&self) -> f64 { self.0.get() }
///     fn client_height(&self) -> f64 { 500.0 }
///     fn scroll_height(&self) -> f64 { 1500.0 }
/// }
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let events = Rc::new(ViewportEvents::new());
/// let page = Rc::new(Page(Cell::new(0.0)));
/// let source: Rc<dyn ScrollSource> = page.clone();
///
/// let reporter = ScrollReporter::new(scheduler.clone());
/// reporter.register(Rc::downgrade(&source), events.clone());
///
/// let progress = Rc::new(Cell::new(0.0));
/// let sink = Rc::clone(&progress);
/// reporter.add_callback("progress", move |info| sink.set(info.progress_ratio));
///
/// page.0.set(250.0);
/// events.dispatch(ViewportEvent::Scroll);
/// scheduler.step(16.0);
/// assert_eq!(progress.get(), 0.25);
/// ```
pub struct ScrollReporter {
    inner: Rc<ReporterInner>,
}

impl ScrollReporter {
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            inner: Rc::new(ReporterInner {
                scheduler,
                registration: RefCell::new(None),
                px_top: Cell::new(0.0),
                callbacks: RefCell::new(Vec::new()),
                pending_frame: Cell::new(None),
            }),
        }
    }

    /// Starts listening to scroll events for `source`, replacing any
    /// earlier registration.
    pub fn register(&self, source: Weak<dyn ScrollSource>, events: Rc<ViewportEvents>) {
        self.inner.unregister();

        let weak = Rc::downgrade(&self.inner);
        let listener = events.subscribe(move |event| {
            if event != ViewportEvent::Scroll {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.on_scroll();
            }
        });

        *self.inner.registration.borrow_mut() = Some(Registration {
            source,
            events,
            listener,
        });
        debug!("Scroll reporter registered");
    }

    /// Stops listening and drops any pending read. Returns whether a source
    /// was registered.
    pub fn unregister(&self) -> bool {
        let was_registered = self.inner.unregister();
        if was_registered {
            debug!("Scroll reporter unregistered");
        }
        was_registered
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registration.borrow().is_some()
    }

    /// Adds `callback` under `key`. An existing callback with the same key
    /// is replaced in place.
    pub fn add_callback(&self, key: impl Into<String>, callback: impl Fn(ScrollInfo) + 'static) {
        let key = key.into();
        let callback: ScrollCallback = Rc::new(callback);
        let mut callbacks = self.inner.callbacks.borrow_mut();
        if let Some(slot) = callbacks.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = callback;
        } else {
            callbacks.push((key, callback));
        }
    }

    /// Removes the callback under `key`. Returns whether one existed.
    pub fn remove_callback(&self, key: &str) -> bool {
        let mut callbacks = self.inner.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(k, _)| k != key);
        before != callbacks.len()
    }

    pub fn callback_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Current snapshot. `px_top` is the value read in the latest frame.
    pub fn scroll_info(&self) -> ScrollInfo {
        self.inner.scroll_info()
    }
}

impl Drop for ScrollReporter {
    fn drop(&mut self) {
        self.inner.unregister();
    }
}

impl fmt::Debug for ScrollReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollReporter")
            .field("registered", &self.is_registered())
            .field("px_top", &self.inner.px_top.get())
            .field("callbacks", &self.callback_count())
            .finish_non_exhaustive()
    }
}
