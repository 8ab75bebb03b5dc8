//! Exponentially damped value follower.
//!
//! A [`DampedFollower`] owns a value and a target. Each animation frame it
//! moves the value toward the target by `1 - e^(-dt/tau)` of the remaining
//! distance and offers the result to a rate-limited callback. Once the
//! remaining distance is within `epsilon` the value snaps to the target and
//! the follower stops requesting frames until the next
//! [`set_target`](DampedFollower::set_target).
//!
//! ```text
//!            set_target               |diff| > epsilon
//!   Idle ───────────────► Converging ◄────────────────┐
//!    ▲                        │                       │
//!    │   |diff| <= epsilon    │ tick                  │
//!    └────────────────────────┴───────────────────────┘
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::config::FollowerConfig;
use crate::decay::{decay_alpha, elapsed_seconds};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::throttle::Throttle;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FollowerState {
    value: f64,
    target: f64,
    /// Pending tick. `Some` exactly while the follower is converging.
    frame: Option<FrameHandle>,
    last_tick_time: Option<f64>,
    /// Bumped on every activation and on stop; ticks from an older
    /// generation are ignored.
    generation: u64,
}

struct FollowerInner {
    scheduler: Rc<dyn FrameScheduler>,
    config: FollowerConfig,
    state: RefCell<FollowerState>,
    throttle: Throttle,
}

impl FollowerInner {
    fn request_tick(self: &Rc<Self>, generation: u64) -> FrameHandle {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.scheduler.request_frame(Box::new(move |now| {
            if let Some(inner) = weak.upgrade() {
                inner.tick(generation, now);
            }
        }))
    }

    fn tick(self: &Rc<Self>, generation: u64, now: f64) {
        let value = {
            let mut state = self.state.borrow_mut();
            if state.generation != generation || state.frame.is_none() {
                trace!(follower.generation = generation, "Stale follower tick ignored");
                return;
            }

            let last = state.last_tick_time.unwrap_or(now);
            let dt = elapsed_seconds(now, last);
            state.last_tick_time = Some(now);

            let diff = state.target - state.value;
            if diff.abs() <= self.config.epsilon {
                state.value = state.target;
                state.frame = None;
                debug!(follower.value = state.value, "Follower converged");
            } else {
                state.value += diff * decay_alpha(dt, self.config.tau);
                // Reschedule before emitting so a stop() from the callback
                // cancels this frame.
                state.frame = Some(self.request_tick(generation));
                trace!(follower.value = state.value, follower.target = state.target, follower.dt = dt, "Follower tick");
            }
            state.value
        };

        self.throttle.call(value);
    }
}

/// Smoothly follows a target value, emitting through a rate-limited callback.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use damping::{DampedFollower, FollowerConfig, ManualScheduler};
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let emitted = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&emitted);
///
/// let follower = DampedFollower::new(
///     0.0,
///     move |v| sink.borrow_mut().push(v),
///     FollowerConfig::default().with_tau(0.1),
///     scheduler.clone(),
/// );
///
/// follower.set_target(100.0);
/// scheduler.run_until_idle(16.0, 1_000);
///
/// assert_eq!(follower.value(), 100.0);
/// assert_eq!(emitted.borrow().last(), Some(&100.0));
/// assert!(!follower.is_scheduled());
/// ```
pub struct DampedFollower {
    inner: Rc<FollowerInner>,
}

impl DampedFollower {
    /// Creates an idle follower at `initial`. Nothing is scheduled until the
    /// first [`set_target`](Self::set_target).
    pub fn new(
        initial: f64,
        on_update: impl FnMut(f64) + 'static,
        config: FollowerConfig,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Self {
        let throttle = Throttle::new(
            Rc::clone(&scheduler),
            config.emit_interval_ms(),
            config.trailing,
            Box::new(on_update),
        );
        Self {
            inner: Rc::new(FollowerInner {
                scheduler,
                config,
                state: RefCell::new(FollowerState {
                    value: initial,
                    target: initial,
                    frame: None,
                    last_tick_time: None,
                    generation: 0,
                }),
                throttle,
            }),
        }
    }

    /// Sets a new target, starting the animation if the follower is idle.
    ///
    /// Setting the current value still runs one tick, which snaps and emits.
    pub fn set_target(&self, target: f64) {
        let inner = &self.inner;
        let mut state = inner.state.borrow_mut();
        state.target = target;
        if state.frame.is_some() {
            return;
        }

        state.last_tick_time = Some(inner.scheduler.now());
        state.generation += 1;
        let generation = state.generation;
        state.frame = Some(inner.request_tick(generation));
        debug!(follower.value = state.value, follower.target = target, "Follower scheduled");
    }

    /// Cancels the pending tick and any parked emission.
    ///
    /// Safe to call when idle and from inside the update callback. A later
    /// [`set_target`](Self::set_target) starts over.
    pub fn stop(&self) {
        let frame = {
            let mut state = self.inner.state.borrow_mut();
            state.generation += 1;
            state.last_tick_time = None;
            state.frame.take()
        };
        if let Some(handle) = frame {
            self.inner.scheduler.cancel_frame(handle);
            debug!(follower.frame = %handle, "Follower stopped");
        }
        self.inner.throttle.cancel();
    }

    /// Current damped value.
    pub fn value(&self) -> f64 {
        self.inner.state.borrow().value
    }

    /// Value being followed.
    pub fn target(&self) -> f64 {
        self.inner.state.borrow().target
    }

    /// Whether a tick is pending.
    pub fn is_scheduled(&self) -> bool {
        self.inner.state.borrow().frame.is_some()
    }

    /// Whether a trailing emission is waiting for its window.
    pub fn has_pending_emission(&self) -> bool {
        self.inner.throttle.is_pending()
    }

    /// Tuning this follower was built with.
    pub fn config(&self) -> &FollowerConfig {
        &self.inner.config
    }
}

impl fmt::Debug for DampedFollower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("DampedFollower")
            .field("value", &state.value)
            .field("target", &state.target)
            .field("scheduled", &state.frame.is_some())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Drop for DampedFollower {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A follower that remembers its latest emission.
///
/// Handy when the consumer polls instead of reacting to callbacks.
///
/// ```rust
/// use std::rc::Rc;
/// use damping::{FollowedValue, FollowerConfig, ManualScheduler};
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let followed = FollowedValue::new(10.0, FollowerConfig::default(), scheduler.clone());
///
/// followed.set_target(20.0);
/// scheduler.step(16.0);
/// assert!(followed.current() > 10.0 && followed.current() < 20.0);
/// ```
pub struct FollowedValue {
    follower: DampedFollower,
    current: Rc<Cell<f64>>,
}

impl FollowedValue {
    /// Creates an idle followed value at `initial`.
    pub fn new(initial: f64, config: FollowerConfig, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let current = Rc::new(Cell::new(initial));
        let sink = Rc::clone(&current);
        Self {
            follower: DampedFollower::new(initial, move |v| sink.set(v), config, scheduler),
            current,
        }
    }

    /// Sets a new target.
    pub fn set_target(&self, target: f64) {
        self.follower.set_target(target);
    }

    /// Latest emitted value.
    pub fn current(&self) -> f64 {
        self.current.get()
    }

    /// The underlying follower.
    pub fn follower(&self) -> &DampedFollower {
        &self.follower
    }
}

impl fmt::Debug for FollowedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowedValue")
            .field("current", &self.current.get())
            .field("follower", &self.follower)
            .finish()
    }
}
