//! Browser scheduler backed by `requestAnimationFrame` and `setTimeout`.
//!
//! Rust callbacks are kept in maps keyed by handle id; the JS side only gets
//! a one-shot trampoline that looks the callback up when it fires. Cancelling
//! removes the Rust callback first, so a trampoline that still fires finds
//! nothing to run.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

use crate::scheduler::{FrameCallback, FrameHandle, FrameScheduler, TimerCallback, TimerHandle};

type Pending<C> = Rc<RefCell<HashMap<u64, (i32, C)>>>;

/// [`FrameScheduler`] for the browser main thread.
pub struct BrowserScheduler {
    window: Window,
    frames: Pending<FrameCallback>,
    timers: Pending<TimerCallback>,
    next_id: Cell<u64>,
}

impl BrowserScheduler {
    /// Binds to the global `window`. Returns `None` outside a window context
    /// (for example in a worker).
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        Some(Self {
            window,
            frames: Rc::new(RefCell::new(HashMap::new())),
            timers: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(0),
        })
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl fmt::Debug for BrowserScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserScheduler")
            .field("pending_frames", &self.frames.borrow().len())
            .field("pending_timers", &self.timers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl FrameScheduler for BrowserScheduler {
    fn now(&self) -> f64 {
        self.window.performance().map_or(0.0, |performance| performance.now())
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id();
        let frames = Rc::clone(&self.frames);
        let trampoline = Closure::once_into_js(move |timestamp: f64| {
            let entry = frames.borrow_mut().remove(&id);
            if let Some((_, callback)) = entry {
                callback(timestamp);
            }
        });

        match self.window.request_animation_frame(trampoline.unchecked_ref()) {
            Ok(raf_id) => {
                self.frames.borrow_mut().insert(id, (raf_id, callback));
            }
            Err(error) => warn!(error = ?error, "requestAnimationFrame failed"),
        }
        FrameHandle(id)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let entry = self.frames.borrow_mut().remove(&handle.0);
        if let Some((raf_id, _)) = entry {
            if let Err(error) = self.window.cancel_animation_frame(raf_id) {
                warn!(error = ?error, "cancelAnimationFrame failed");
            }
        }
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id();
        let timers = Rc::clone(&self.timers);
        let trampoline = Closure::once_into_js(move || {
            let entry = timers.borrow_mut().remove(&id);
            if let Some((_, callback)) = entry {
                callback();
            }
        });

        #[allow(clippy::cast_possible_truncation)]
        let delay = delay_ms.max(0.0).ceil().min(f64::from(i32::MAX)) as i32;
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(trampoline.unchecked_ref(), delay)
        {
            Ok(timeout_id) => {
                self.timers.borrow_mut().insert(id, (timeout_id, callback));
            }
            Err(error) => warn!(error = ?error, "setTimeout failed"),
        }
        TimerHandle(id)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let entry = self.timers.borrow_mut().remove(&handle.0);
        if let Some((timeout_id, _)) = entry {
            self.window.clear_timeout_with_handle(timeout_id);
        }
    }
}
