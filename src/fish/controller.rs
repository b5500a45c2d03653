//! Proportional-derivative controller for the marker position

use serde::{Deserialize, Serialize};

/// Controller gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdGains {
    pub kp: f64,
    pub kd: f64,
}

/// PD controller whose only state is the previous normalized error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdController {
    previous_error: f64,
}

impl PdController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Forget the derivative history
    pub fn reset(&mut self) {
        self.previous_error = 0.0;
    }

    /// One control step.
    ///
    /// The error is `target_mid_y - reference_top_y` normalized by the band
    /// height (left in pixels for a zero height). Positive means the marker
    /// sits below the reference.
    pub fn step(
        &mut self,
        target_mid_y: i64,
        reference_top_y: i64,
        region_height: u32,
        gains: PdGains,
    ) -> f64 {
        let raw_error = (target_mid_y - reference_top_y) as f64;
        let normalized = if region_height > 0 {
            raw_error / f64::from(region_height)
        } else {
            raw_error
        };
        let derivative = normalized - self.previous_error;
        self.previous_error = normalized;

        let output = gains.kp * normalized + gains.kd * derivative;
        tracing::debug!(
            "[PD] error={}px ({:.3} normalized), derivative={:.3}, output={:.3}",
            raw_error,
            normalized,
            derivative,
            output
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAINS: PdGains = PdGains { kp: 0.1, kd: 0.5 };

    #[test]
    fn test_fresh_error_holds() {
        let mut pd = PdController::new();
        let output = pd.step(60, 50, 100, GAINS);
        assert!((output - 0.06).abs() < 1e-12);
        assert!(output > 0.0);
        assert!((pd.previous_error() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_shrinking_error_releases() {
        let mut pd = PdController::new();
        pd.step(80, 50, 100, PdGains { kp: 0.0, kd: 0.0 });
        assert!((pd.previous_error() - 0.3).abs() < 1e-12);

        let output = pd.step(60, 50, 100, GAINS);
        assert!((output - -0.09).abs() < 1e-12);
        assert!(output <= 0.0);
    }

    #[test]
    fn test_constant_error_converges_to_proportional_term() {
        let mut pd = PdController::new();
        pd.step(70, 50, 100, GAINS);
        let output = pd.step(70, 50, 100, GAINS);
        assert!((output - 0.1 * 0.2).abs() < 1e-12);
        let again = pd.step(70, 50, 100, GAINS);
        assert_eq!(output.to_bits(), again.to_bits());
    }

    #[test]
    fn test_zero_height_keeps_pixels() {
        let mut pd = PdController::new();
        let output = pd.step(7, 5, 0, PdGains { kp: 1.0, kd: 0.0 });
        assert_eq!(output, 2.0);
        assert_eq!(pd.previous_error(), 2.0);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut pd = PdController::new();
        pd.step(90, 50, 100, GAINS);
        pd.reset();
        assert_eq!(pd, PdController::new());
    }

    #[test]
    fn test_step_is_deterministic() {
        let mut a = PdController::new();
        let mut b = PdController::new();
        for (mid, top) in [(10, 3), (40, 3), (2, 9)] {
            assert_eq!(a.step(mid, top, 57, GAINS).to_bits(), b.step(mid, top, 57, GAINS).to_bits());
        }
    }
}
