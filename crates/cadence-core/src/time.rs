//! Simulation-time tolerances.
//!
//! Horizons are compared with an absolute tolerance; local steps use a
//! relative one so that accumulated rounding in `t + dt + dt + ...`
//! never produces an extra sliver step in front of a horizon.

/// Absolute tolerance for comparing simulation times.
pub const TIME_TOLERANCE: f64 = 1e-10;

/// Relative tolerance on the final local step of a cluster.
///
/// A remaining gap of at most `dt * (1 + STEP_TOLERANCE)` is closed
/// by one clamped step.
pub const STEP_TOLERANCE: f64 = 1e-9;

/// Whether two simulation times agree within [`TIME_TOLERANCE`].
pub fn times_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOLERANCE
}

/// Whether `time` has reached `horizon` within [`TIME_TOLERANCE`].
pub fn horizon_reached(time: f64, horizon: f64) -> bool {
    time >= horizon - TIME_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_match_absorbs_rounding() {
        let t = 0.1 + 0.2;
        assert!(times_match(t, 0.3));
        assert!(!times_match(0.3, 0.3001));
    }

    #[test]
    fn horizon_reached_is_inclusive() {
        assert!(horizon_reached(1.0, 1.0));
        assert!(horizon_reached(1.0 - 1e-12, 1.0));
        assert!(!horizon_reached(0.99, 1.0));
    }
}
