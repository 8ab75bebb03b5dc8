//! Exponential decay math shared by the follower and its callers.
//!
//! Each step moves a value toward its target by a fraction of the remaining
//! distance:
//!
//! ```text
//! alpha = 1 - e^(-dt / tau)
//! value = value + (target - value) * alpha
//! ```
//!
//! After `tau` seconds roughly 63% of the distance has been covered no matter
//! how the elapsed time was sliced into frames, which is what makes the
//! follower frame-rate independent.

/// Lower bound applied to `tau` before dividing by it.
///
/// A zero or negative time constant therefore behaves as "snap instantly".
pub const MIN_TAU: f64 = 1e-6;

/// Fraction of the remaining distance to cover after `dt_secs` seconds.
///
/// # Example
///
/// ```rust
/// use damping::decay_alpha;
///
/// // One time constant covers ~63% of the distance.
/// let alpha = decay_alpha(0.1, 0.1);
/// assert!((alpha - 0.632).abs() < 1e-3);
///
/// // A degenerate time constant snaps.
/// assert!(decay_alpha(0.016, 0.0) > 0.999_999);
/// ```
#[inline]
pub fn decay_alpha(dt_secs: f64, tau_secs: f64) -> f64 {
    1.0 - (-dt_secs / tau_secs.max(MIN_TAU)).exp()
}

/// Seconds elapsed between two millisecond timestamps, clamped to zero.
///
/// A clock that runs backwards yields `0.0` rather than a negative step.
#[inline]
pub fn elapsed_seconds(now_ms: f64, last_ms: f64) -> f64 {
    ((now_ms - last_ms) / 1000.0).max(0.0)
}

/// Minimum spacing in milliseconds between emissions at `fps` per second.
///
/// # Example
///
/// ```rust
/// use damping::frame_interval_ms;
///
/// assert!((frame_interval_ms(60) - 16.666).abs() < 1e-2);
/// ```
#[inline]
pub fn frame_interval_ms(fps: u32) -> f64 {
    1000.0 / f64::from(fps)
}

/// Advances `value` one step toward `target`.
#[inline]
pub fn damp(value: f64, target: f64, dt_secs: f64, tau_secs: f64) -> f64 {
    value + (target - value) * decay_alpha(dt_secs, tau_secs)
}

/// Upper bound on the number of fixed-size ticks needed before the remaining
/// distance falls within `epsilon`, including the final snapping tick.
///
/// Returns `1` when `distance` is already within `epsilon` and `None` when the
/// step cannot make progress (`dt_secs <= 0`).
pub fn ticks_to_converge(distance: f64, epsilon: f64, tau_secs: f64, dt_secs: f64) -> Option<u64> {
    let distance = distance.abs();
    if distance <= epsilon {
        return Some(1);
    }
    if dt_secs <= 0.0 || epsilon <= 0.0 {
        return None;
    }
    let per_tick = dt_secs / tau_secs.max(MIN_TAU);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let advancing = ((distance / epsilon).ln() / per_tick).ceil() as u64;
    Some(advancing + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_alpha_zero_dt_is_zero() {
        assert!(approx_eq(decay_alpha(0.0, 0.1), 0.0));
    }

    #[test]
    fn test_alpha_one_tau() {
        assert!(approx_eq(decay_alpha(0.1, 0.1), 1.0 - (-1.0f64).exp()));
    }

    #[test]
    fn test_negative_tau_snaps() {
        assert!(decay_alpha(0.016, -3.0) > 1.0 - TOLERANCE);
    }

    #[test]
    fn test_elapsed_clamps_regression() {
        assert!(approx_eq(elapsed_seconds(100.0, 116.0), 0.0));
        assert!(approx_eq(elapsed_seconds(116.0, 100.0), 0.016));
    }

    #[test]
    fn test_damp_is_frame_rate_independent() {
        let coarse = damp(0.0, 100.0, 0.032, 0.1);
        let fine = damp(damp(0.0, 100.0, 0.016, 0.1), 100.0, 0.016, 0.1);
        assert!((coarse - fine).abs() < 1e-9, "coarse={coarse} fine={fine}");
    }

    #[test]
    fn test_ticks_to_converge_matches_scenario() {
        // 100 -> 0.5 at 16ms with tau 0.1: 34 advancing ticks plus the snap.
        assert_eq!(ticks_to_converge(100.0, 0.5, 0.1, 0.016), Some(35));
        assert_eq!(ticks_to_converge(0.25, 0.5, 0.1, 0.016), Some(1));
        assert_eq!(ticks_to_converge(10.0, 0.5, 0.1, 0.0), None);
    }
}
