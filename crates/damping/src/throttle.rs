//! Trailing-edge rate limiting for emitted values.
//!
//! A [`Throttle`] forwards values to a sink at most once per interval. Values
//! arriving inside the cooldown window are parked; when the window closes the
//! most recent parked value is emitted, so the sink always ends up with the
//! latest value once calls stop.
//!
//! The bookkeeping lives in [`ThrottleState`], a plain record with explicit
//! transition functions. [`Throttle`] only glues it to a
//! [`FrameScheduler`](crate::FrameScheduler) timer and the sink.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::scheduler::{FrameScheduler, TimerHandle};

/// What to do with a trailing emission that repeats the last emitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingPolicy {
    /// Always emit the parked value when the window closes.
    Always,
    /// Drop the trailing emission if it is bit-identical to the last
    /// emitted value.
    #[default]
    SkipUnchanged,
}

/// Outcome of [`ThrottleState::on_call`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallAction {
    /// The window is open: emit now. Carries a timer to clear, if one was
    /// armed for an earlier parked value.
    EmitNow {
        /// Timer made redundant by this emission.
        stale_timer: Option<TimerHandle>,
    },
    /// The value was parked and a timer must be armed for `delay_ms`.
    Arm {
        /// Remaining time until the window closes.
        delay_ms: f64,
        /// Token the timer must present when it fires.
        token: u64,
    },
    /// The value was parked behind an already armed timer.
    Wait,
}

/// Rate limiter bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThrottleState {
    /// Timestamp (ms) of the last emission.
    pub last_emit: Option<f64>,
    /// Last value handed to the sink.
    pub last_value: Option<f64>,
    /// Latest value waiting for the window to close.
    pub pending: Option<f64>,
    /// Timer armed for the trailing emission.
    pub pending_timer: Option<TimerHandle>,
    timer_token: u64,
}

impl ThrottleState {
    /// Registers a call with `value` at time `now`.
    pub fn on_call(&mut self, now: f64, interval_ms: f64, value: f64) -> CallAction {
        let remaining = self
            .last_emit
            .map_or(0.0, |last| interval_ms - (now - last));

        if remaining <= 0.0 {
            self.pending = None;
            CallAction::EmitNow {
                stale_timer: self.pending_timer.take(),
            }
        } else {
            self.pending = Some(value);
            if self.pending_timer.is_some() {
                CallAction::Wait
            } else {
                self.timer_token += 1;
                CallAction::Arm {
                    delay_ms: remaining,
                    token: self.timer_token,
                }
            }
        }
    }

    /// Records the handle of the timer armed after [`CallAction::Arm`].
    pub fn armed(&mut self, handle: TimerHandle) {
        self.pending_timer = Some(handle);
    }

    /// The trailing timer with `token` fired. Returns the value to emit, if
    /// any.
    pub fn on_timer(&mut self, token: u64, policy: TrailingPolicy) -> Option<f64> {
        if self.pending_timer.is_none() || token != self.timer_token {
            return None;
        }
        self.pending_timer = None;
        let value = self.pending.take()?;
        match policy {
            TrailingPolicy::SkipUnchanged
                if self.last_value.is_some_and(|last| last.to_bits() == value.to_bits()) =>
            {
                None
            }
            _ => Some(value),
        }
    }

    /// Records an emission of `value` at `now`.
    pub fn record_emit(&mut self, now: f64, value: f64) {
        self.last_emit = Some(now);
        self.last_value = Some(value);
    }

    /// Drops the parked value. Returns the timer to clear, if any.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.pending = None;
        self.timer_token += 1;
        self.pending_timer.take()
    }
}

/// Sink receiving throttled values.
pub type EmitFn = Box<dyn FnMut(f64)>;

struct ThrottleInner {
    scheduler: Rc<dyn FrameScheduler>,
    interval_ms: f64,
    policy: TrailingPolicy,
    state: RefCell<ThrottleState>,
    sink: RefCell<EmitFn>,
}

impl ThrottleInner {
    fn emit(&self, now: f64, value: f64) {
        self.state.borrow_mut().record_emit(now, value);
        trace!(throttle.value = value, throttle.now = now, "Throttle emit");
        // The state borrow is released, so the sink may cancel us.
        (self.sink.borrow_mut())(value);
    }

    fn fire_trailing(&self, token: u64) {
        let value = self.state.borrow_mut().on_timer(token, self.policy);
        if let Some(value) = value {
            self.emit(self.scheduler.now(), value);
        }
    }
}

/// Rate-limited, trailing-edge forwarding of `f64` values.
///
/// The sink must not call [`Throttle::call`] on the same throttle.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use damping::{ManualScheduler, Throttle, TrailingPolicy};
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
///
/// let throttle = Throttle::new(
///     scheduler.clone(),
///     100.0,
///     TrailingPolicy::Always,
///     Box::new(move |v| sink.borrow_mut().push(v)),
/// );
///
/// throttle.call(1.0); // emitted immediately
/// throttle.call(2.0); // parked
/// throttle.call(3.0); // replaces 2.0
/// scheduler.advance(100.0);
///
/// assert_eq!(*seen.borrow(), vec![1.0, 3.0]);
/// ```
pub struct Throttle {
    inner: Rc<ThrottleInner>,
}

impl Throttle {
    /// Creates a throttle forwarding to `sink` at most once per `interval_ms`.
    pub fn new(
        scheduler: Rc<dyn FrameScheduler>,
        interval_ms: f64,
        policy: TrailingPolicy,
        sink: EmitFn,
    ) -> Self {
        Self {
            inner: Rc::new(ThrottleInner {
                scheduler,
                interval_ms: interval_ms.max(0.0),
                policy,
                state: RefCell::new(ThrottleState::default()),
                sink: RefCell::new(sink),
            }),
        }
    }

    /// Offers `value` to the sink.
    pub fn call(&self, value: f64) {
        let inner = &self.inner;
        let now = inner.scheduler.now();
        let action = inner
            .state
            .borrow_mut()
            .on_call(now, inner.interval_ms, value);

        match action {
            CallAction::EmitNow { stale_timer } => {
                if let Some(handle) = stale_timer {
                    inner.scheduler.clear_timeout(handle);
                }
                inner.emit(now, value);
            }
            CallAction::Arm { delay_ms, token } => {
                let weak: Weak<ThrottleInner> = Rc::downgrade(inner);
                let handle = inner.scheduler.set_timeout(
                    delay_ms,
                    Box::new(move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.fire_trailing(token);
                        }
                    }),
                );
                inner.state.borrow_mut().armed(handle);
                trace!(throttle.delay_ms = delay_ms, throttle.value = value, "Throttle parked value");
            }
            CallAction::Wait => {}
        }
    }

    /// Drops any parked value and its timer. Nothing is emitted.
    pub fn cancel(&self) {
        let timer = self.inner.state.borrow_mut().cancel();
        if let Some(handle) = timer {
            self.inner.scheduler.clear_timeout(handle);
        }
    }

    /// Whether a trailing emission is armed.
    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().pending_timer.is_some()
    }

    /// Minimum spacing between emissions in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.inner.interval_ms
    }

    /// Snapshot of the bookkeeping.
    pub fn state(&self) -> ThrottleState {
        self.inner.state.borrow().clone()
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval_ms", &self.inner.interval_ms)
            .field("policy", &self.inner.policy)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Drop for Throttle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualScheduler;

    fn recording(
        interval_ms: f64,
        policy: TrailingPolicy,
    ) -> (Rc<ManualScheduler>, Throttle, Rc<RefCell<Vec<(f64, f64)>>>) {
        let scheduler = Rc::new(ManualScheduler::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink_log = Rc::clone(&log);
        let clock = Rc::clone(&scheduler);
        let throttle = Throttle::new(
            scheduler.clone(),
            interval_ms,
            policy,
            Box::new(move |v| sink_log.borrow_mut().push((clock.now(), v))),
        );
        (scheduler, throttle, log)
    }

    #[test]
    fn test_state_first_call_emits() {
        let mut state = ThrottleState::default();
        assert_eq!(
            state.on_call(0.0, 16.0, 1.0),
            CallAction::EmitNow { stale_timer: None }
        );
    }

    #[test]
    fn test_state_parks_inside_window() {
        let mut state = ThrottleState::default();
        state.record_emit(0.0, 1.0);
        assert_eq!(
            state.on_call(6.0, 16.0, 2.0),
            CallAction::Arm {
                delay_ms: 10.0,
                token: 1
            }
        );
        state.armed(TimerHandle(7));
        assert_eq!(state.on_call(8.0, 16.0, 3.0), CallAction::Wait);
        assert_eq!(state.pending, Some(3.0));
        assert_eq!(state.on_timer(1, TrailingPolicy::Always), Some(3.0));
        assert_eq!(state.pending_timer, None);
    }

    #[test]
    fn test_state_stale_token_ignored() {
        let mut state = ThrottleState::default();
        state.record_emit(0.0, 1.0);
        let CallAction::Arm { token, .. } = state.on_call(1.0, 16.0, 2.0) else {
            panic!("expected a timer to be armed");
        };
        state.armed(TimerHandle(1));
        state.cancel();
        assert_eq!(state.on_timer(token, TrailingPolicy::Always), None);
    }

    #[test]
    fn test_skip_unchanged_policy() {
        let mut state = ThrottleState::default();
        state.record_emit(0.0, 5.0);
        let CallAction::Arm { token, .. } = state.on_call(1.0, 16.0, 5.0) else {
            panic!("expected a timer to be armed");
        };
        state.armed(TimerHandle(1));
        assert_eq!(state.on_timer(token, TrailingPolicy::SkipUnchanged), None);
    }

    #[test]
    fn test_trailing_fires_at_window_boundary() {
        let (scheduler, throttle, log) = recording(16.0, TrailingPolicy::Always);
        throttle.call(1.0);
        scheduler.advance(4.0);
        throttle.call(2.0);
        scheduler.advance(4.0);
        throttle.call(3.0);
        scheduler.advance(20.0);
        assert_eq!(*log.borrow(), vec![(0.0, 1.0), (16.0, 3.0)]);
    }

    #[test]
    fn test_call_after_window_reopens_emits_immediately() {
        let (scheduler, throttle, log) = recording(10.0, TrailingPolicy::Always);
        throttle.call(1.0);
        scheduler.advance(5.0);
        throttle.call(2.0);
        assert!(throttle.is_pending());
        throttle.cancel();
        scheduler.advance(10.0);
        throttle.call(3.0);
        assert_eq!(*log.borrow(), vec![(0.0, 1.0), (15.0, 3.0)]);
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_cancel_drops_parked_value() {
        let (scheduler, throttle, log) = recording(16.0, TrailingPolicy::Always);
        throttle.call(1.0);
        throttle.call(2.0);
        throttle.cancel();
        scheduler.advance(100.0);
        assert_eq!(*log.borrow(), vec![(0.0, 1.0)]);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_state_snapshot_tracks_parked_value() {
        let (scheduler, throttle, _log) = recording(16.0, TrailingPolicy::Always);
        assert_eq!(throttle.state(), ThrottleState::default());

        throttle.call(1.0);
        scheduler.advance(4.0);
        throttle.call(2.0);
        let state = throttle.state();
        assert_eq!(state.last_emit, Some(0.0));
        assert_eq!(state.last_value, Some(1.0));
        assert_eq!(state.pending, Some(2.0));
        assert!(state.pending_timer.is_some());

        scheduler.advance(20.0);
        let state = throttle.state();
        assert_eq!(state.last_emit, Some(16.0));
        assert_eq!(state.last_value, Some(2.0));
        assert_eq!(state.pending, None);
        assert_eq!(state.pending_timer, None);
    }

    #[test]
    fn test_drop_clears_timer() {
        let (scheduler, throttle, _log) = recording(16.0, TrailingPolicy::Always);
        throttle.call(1.0);
        throttle.call(2.0);
        assert_eq!(scheduler.pending_timers(), 1);
        drop(throttle);
        assert_eq!(scheduler.pending_timers(), 0);
    }
}
