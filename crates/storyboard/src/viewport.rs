//! Scroll and resize notification hub.
//!
//! Hosts forward the window's `scroll` and `resize` events into a shared
//! [`ViewportEvents`]; projectors and scroll reporters subscribe to it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Kind of viewport change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportEvent {
    Scroll,
    Resize,
}

impl fmt::Display for ViewportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scroll => f.write_str("scroll"),
            Self::Resize => f.write_str("resize"),
        }
    }
}

/// Identifies a subscription for [`ViewportEvents::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(ViewportEvent)>;

/// Single-threaded event hub for viewport changes.
#[derive(Default)]
pub struct ViewportEvents {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

impl ViewportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every dispatched event.
    pub fn subscribe(&self, listener: impl Fn(ViewportEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    /// Calls every listener with `event`.
    ///
    /// Listeners may subscribe or unsubscribe while being called. A listener
    /// removed during dispatch is not called afterwards; one added during
    /// dispatch first hears the next event.
    pub fn dispatch(&self, event: ViewportEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = self.listeners.borrow().clone();
        trace!(viewport.event = %event, viewport.listeners = snapshot.len(), "Dispatching viewport event");
        for (id, listener) in snapshot {
            if self.is_subscribed(id) {
                listener(event);
            }
        }
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(listener_id, _)| *listener_id == id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl fmt::Debug for ViewportEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
