//! Deterministic scheduler driven by explicit clock advances.
//!
//! [`ManualScheduler`] never looks at a real clock. Time moves only when the
//! owner calls [`advance`](ManualScheduler::advance) or
//! [`advance_to`](ManualScheduler::advance_to), and animation frames run only
//! on [`run_frame`](ManualScheduler::run_frame). That makes follower behaviour
//! reproducible in tests and lets native hosts feed their own vsync
//! timestamps in.

use std::cell::RefCell;
use std::fmt;
use std::mem;

use tracing::trace;

use crate::scheduler::{FrameCallback, FrameHandle, FrameScheduler, TimerCallback, TimerHandle};

/// Counters collected while driving a [`ManualScheduler`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Number of [`ManualScheduler::run_frame`] calls.
    pub frames_run: usize,
    /// Frame callbacks requested.
    pub frames_requested: usize,
    /// Frame callbacks that actually ran.
    pub frame_callbacks_run: usize,
    /// Frame callbacks cancelled before running.
    pub frames_cancelled: usize,
    /// Timers armed.
    pub timers_armed: usize,
    /// Timers that fired.
    pub timers_fired: usize,
    /// Timers cleared before firing.
    pub timers_cleared: usize,
}

struct PendingTimer {
    handle: TimerHandle,
    due: f64,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    now: f64,
    next_id: u64,
    frames: Vec<(FrameHandle, FrameCallback)>,
    /// Handles of the batch currently being run that have not run yet.
    in_flight: Vec<FrameHandle>,
    timers: Vec<PendingTimer>,
    stats: SchedulerStats,
}

impl ManualState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Removes and returns the earliest timer due at or before `limit`.
    fn pop_due_timer(&mut self, limit: f64) -> Option<PendingTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)))
            .map(|(index, _)| index)?;
        Some(self.timers.remove(index))
    }
}

/// A [`FrameScheduler`] whose clock only moves when told to.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use damping::{FrameScheduler, ManualScheduler};
///
/// let scheduler = ManualScheduler::new();
/// let seen = Rc::new(Cell::new(None));
///
/// let seen_in_frame = Rc::clone(&seen);
/// scheduler.request_frame(Box::new(move |now| seen_in_frame.set(Some(now))));
///
/// scheduler.step(16.0);
/// assert_eq!(seen.get(), Some(16.0));
/// ```
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    /// Creates a scheduler whose clock starts at `0.0` ms.
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Creates a scheduler whose clock starts at `now_ms`.
    pub fn starting_at(now_ms: f64) -> Self {
        Self {
            state: RefCell::new(ManualState {
                now: now_ms,
                ..ManualState::default()
            }),
        }
    }

    /// Moves the clock forward by `delta_ms`, firing every timer that comes
    /// due on the way. Returns the number of timers fired.
    pub fn advance(&self, delta_ms: f64) -> usize {
        let target = self.state.borrow().now + delta_ms.max(0.0);
        self.advance_to(target)
    }

    /// Moves the clock to `now_ms` (never backwards), firing due timers in
    /// due-time order with the clock set to each timer's due time.
    pub fn advance_to(&self, now_ms: f64) -> usize {
        let mut fired = 0;
        loop {
            let timer = {
                let mut state = self.state.borrow_mut();
                let Some(timer) = state.pop_due_timer(now_ms) else {
                    state.now = state.now.max(now_ms);
                    break;
                };
                state.now = state.now.max(timer.due);
                state.stats.timers_fired += 1;
                timer
            };
            trace!(scheduler.timer = %timer.handle, scheduler.due = timer.due, "Timer fired");
            (timer.callback)();
            fired += 1;
        }
        fired
    }

    /// Runs every frame callback requested before this call.
    ///
    /// Callbacks requested while the frame runs are deferred to the next
    /// frame. Returns the number of callbacks that ran.
    pub fn run_frame(&self) -> usize {
        let (now, batch) = {
            let mut state = self.state.borrow_mut();
            state.stats.frames_run += 1;
            let batch = mem::take(&mut state.frames);
            state.in_flight = batch.iter().map(|(handle, _)| *handle).collect();
            (state.now, batch)
        };

        let mut ran = 0;
        for (handle, callback) in batch {
            let still_live = {
                let mut state = self.state.borrow_mut();
                match state.in_flight.iter().position(|h| *h == handle) {
                    Some(index) => {
                        state.in_flight.swap_remove(index);
                        state.stats.frame_callbacks_run += 1;
                        true
                    }
                    None => false,
                }
            };
            if still_live {
                trace!(scheduler.frame = %handle, scheduler.now = now, "Frame callback");
                callback(now);
                ran += 1;
            }
        }
        self.state.borrow_mut().in_flight.clear();
        ran
    }

    /// Advances the clock by `delta_ms`, then runs one frame.
    ///
    /// This models one display refresh. Returns the number of frame
    /// callbacks that ran.
    pub fn step(&self, delta_ms: f64) -> usize {
        self.advance(delta_ms);
        self.run_frame()
    }

    /// Steps `frame_ms` at a time until nothing is pending or `max_steps` is
    /// reached. Returns the number of steps taken.
    pub fn run_until_idle(&self, frame_ms: f64, max_steps: usize) -> usize {
        let mut steps = 0;
        while !self.is_idle() && steps < max_steps {
            self.step(frame_ms);
            steps += 1;
        }
        steps
    }

    /// Whether no frame callbacks and no timers are pending.
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.frames.is_empty() && state.timers.is_empty()
    }

    /// Number of frame callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Number of armed timers.
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Due time of the earliest armed timer, if any.
    pub fn next_timer_due(&self) -> Option<f64> {
        self.state
            .borrow()
            .timers
            .iter()
            .map(|timer| timer.due)
            .min_by(f64::total_cmp)
    }

    /// Snapshot of the counters collected so far.
    pub fn stats(&self) -> SchedulerStats {
        self.state.borrow().stats.clone()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending_frames", &state.frames.len())
            .field("pending_timers", &state.timers.len())
            .field("stats", &state.stats)
            .finish()
    }
}

impl FrameScheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        let handle = FrameHandle(state.next_id());
        state.frames.push((handle, callback));
        state.stats.frames_requested += 1;
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.frames.iter().position(|(h, _)| *h == handle) {
            // Dropping the callback releases whatever it captured.
            drop(state.frames.remove(index));
            state.stats.frames_cancelled += 1;
        } else if let Some(index) = state.in_flight.iter().position(|h| *h == handle) {
            state.in_flight.swap_remove(index);
            state.stats.frames_cancelled += 1;
        }
    }

    fn set_timeout(&self, delay_ms: f64, callback: TimerCallback) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = TimerHandle(state.next_id());
        let due = state.now + delay_ms.max(0.0);
        state.timers.push(PendingTimer {
            handle,
            due,
            callback,
        });
        state.stats.timers_armed += 1;
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.timers.iter().position(|t| t.handle == handle) {
            drop(state.timers.remove(index));
            state.stats.timers_cleared += 1;
        }
    }
}
