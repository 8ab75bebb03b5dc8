//! The frame-scheduling capability followers run on.
//!
//! A [`FrameScheduler`] is the only I/O boundary of this crate: it hands out
//! the current high-resolution time, runs callbacks before the next repaint,
//! and runs one-shot timers. Everything is single-threaded and cooperative,
//! so schedulers are shared as `Rc<dyn FrameScheduler>`.
//!
//! Use [`ManualScheduler`](crate::ManualScheduler) in tests and in hosts that
//! pump their own frame loop, and `BrowserScheduler` (feature `web`) in the
//! browser.

use std::fmt;

/// Callback run on an animation frame. Receives the frame timestamp in ms.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Callback run when a timer elapses.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Handle to a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Handle to an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Host-provided timing primitives.
///
/// Implementations must tolerate cancelling handles that already fired or
/// were never issued; both are no-ops.
pub trait FrameScheduler {
    /// Current high-resolution timestamp in milliseconds.
    fn now(&self) -> f64;

    /// Runs `callback` before the next repaint.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Prevents a requested frame callback from running.
    fn cancel_frame(&self, handle: FrameHandle);

    /// Runs `callback` once after `delay_ms` milliseconds.
    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle;

    /// Prevents an armed timer from firing.
    fn clear_timeout(&self, handle: TimerHandle);
}
