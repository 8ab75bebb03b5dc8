//! DOM bindings: element anchors, element scroll sources, and window
//! scroll/resize forwarding.

use std::fmt;
use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, Event, Window};

use crate::anchor::{Anchor, Rect};
use crate::scroll::ScrollSource;
use crate::viewport::{ViewportEvent, ViewportEvents};

pub use damping::BrowserScheduler;

/// A DOM element used as an anchor.
#[derive(Debug, Clone)]
pub struct ElementAnchor {
    element: Element,
}

impl ElementAnchor {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl Anchor for ElementAnchor {
    fn bounding_box(&self) -> Rect {
        let rect = self.element.get_bounding_client_rect();
        Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
    }
}

/// A scrollable element, or the document's scrolling element.
#[derive(Debug, Clone)]
pub struct ElementScrollSource {
    element: Element,
}

impl ElementScrollSource {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// The document's scrolling element (usually `<html>`).
    pub fn document(window: &Window) -> Option<Self> {
        let element = window.document()?.scrolling_element()?;
        Some(Self::new(element))
    }
}

impl ScrollSource for ElementScrollSource {
    fn scroll_top(&self) -> f64 {
        f64::from(self.element.scroll_top())
    }

    fn client_height(&self) -> f64 {
        f64::from(self.element.client_height())
    }

    fn scroll_height(&self) -> f64 {
        f64::from(self.element.scroll_height())
    }
}

type EventClosure = Closure<dyn FnMut(Event)>;

/// Forwards the window's `scroll` and `resize` events into a
/// [`ViewportEvents`] hub. Listeners are removed on drop.
pub struct WindowViewport {
    window: Window,
    events: Rc<ViewportEvents>,
    listeners: Vec<(&'static str, EventClosure)>,
}

impl WindowViewport {
    /// Binds to the global `window`. Returns `None` outside a window context.
    pub fn attach(events: Rc<ViewportEvents>) -> Option<Self> {
        let window = web_sys::window()?;
        let mut listeners = Vec::with_capacity(2);

        for (name, kind) in [("scroll", ViewportEvent::Scroll), ("resize", ViewportEvent::Resize)] {
            let hub = Rc::clone(&events);
            let closure = Closure::wrap(Box::new(move |_event: Event| {
                hub.dispatch(kind);
            }) as Box<dyn FnMut(Event)>);

            match window.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                Ok(()) => listeners.push((name, closure)),
                Err(error) => warn!(event = name, error = ?error, "addEventListener failed"),
            }
        }

        Some(Self {
            window,
            events,
            listeners,
        })
    }

    pub fn events(&self) -> &Rc<ViewportEvents> {
        &self.events
    }
}

impl Drop for WindowViewport {
    fn drop(&mut self) {
        for (name, closure) in self.listeners.drain(..) {
            if let Err(error) = self
                .window
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            {
                warn!(event = name, error = ?error, "removeEventListener failed");
            }
        }
    }
}

impl fmt::Debug for WindowViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowViewport")
            .field("listeners", &self.listeners.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
