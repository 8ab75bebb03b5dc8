#![forbid(unsafe_code)]
// Allow these clippy lints for animation/math code readability
#![allow(clippy::must_use_candidate)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::float_cmp)]

//! # Damping
//!
//! Exponentially damped value followers for animation loops.
//!
//! Damping provides:
//! - **DampedFollower**: moves a value toward a target on every animation
//!   frame using frame-rate independent exponential decay, snapping once it
//!   is within `epsilon`
//! - **Throttle**: trailing-edge rate limiting so callbacks run at a bounded
//!   rate no matter how fast frames arrive
//! - **FrameScheduler**: the injected "run before next repaint" capability,
//!   with a deterministic [`ManualScheduler`] and a browser-backed scheduler
//!   behind the `web` feature
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use damping::{DampedFollower, FollowerConfig, ManualScheduler};
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let latest = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&latest);
//!
//! let follower = DampedFollower::new(
//!     0.0,
//!     move |v| sink.set(v),
//!     FollowerConfig::default(),
//!     scheduler.clone(),
//! );
//!
//! follower.set_target(250.0);
//!
//! // Drive ~60 frames per second until nothing is left to do.
//! scheduler.run_until_idle(16.0, 10_000);
//! assert_eq!(latest.get(), 250.0);
//! ```
//!
//! ## Choosing `tau`
//!
//! `tau` is the time constant in seconds: after `tau` the follower has
//! covered ~63% of the distance, after `3 * tau` ~95%. Values around
//! `0.05..0.2` feel responsive for scroll-linked motion.

mod config;
mod decay;
mod follower;
mod manual;
mod scheduler;
mod throttle;
#[cfg(feature = "web")]
mod web;

pub use config::{
    ConfigLoadError, ConfigValidationError, DEFAULT_EPSILON, DEFAULT_FPS, DEFAULT_TAU,
    FollowerConfig,
};
pub use decay::{MIN_TAU, damp, decay_alpha, elapsed_seconds, frame_interval_ms, ticks_to_converge};
pub use follower::{DampedFollower, FollowedValue};
pub use manual::{ManualScheduler, SchedulerStats};
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler, TimerCallback, TimerHandle};
pub use throttle::{CallAction, EmitFn, Throttle, ThrottleState, TrailingPolicy};
#[cfg(feature = "web")]
pub use web::BrowserScheduler;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::FollowerConfig;
    pub use crate::follower::{DampedFollower, FollowedValue};
    pub use crate::manual::ManualScheduler;
    pub use crate::scheduler::{FrameHandle, FrameScheduler, TimerHandle};
    pub use crate::throttle::{Throttle, TrailingPolicy};
}
