//! Dose boundary between policies and engines.

use tracing::warn;

/// Clamps a policy dose to [0, 1]; non-finite doses become 0.
///
/// Every orchestrator passes policy output through here before it reaches
/// the fitness model or the toxicity accumulator.
pub fn sanitize_dose(dose: f64, policy: &str, step: usize) -> f64 {
    if !dose.is_finite() {
        warn!("{} returned non-finite dose {} at step {}; using 0", policy, dose, step);
        return 0.0;
    }
    if !(0.0..=1.0).contains(&dose) {
        let clamped = dose.clamp(0.0, 1.0);
        warn!("{} returned dose {} at step {}; clamped to {}", policy, dose, step, clamped);
        return clamped;
    }
    dose
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_dose() {
        assert_eq!(sanitize_dose(0.4, "test", 0), 0.4);
        assert_eq!(sanitize_dose(1.7, "test", 0), 1.0);
        assert_eq!(sanitize_dose(-0.2, "test", 0), 0.0);
        assert_eq!(sanitize_dose(f64::NAN, "test", 0), 0.0);
        assert_eq!(sanitize_dose(f64::INFINITY, "test", 0), 0.0);
    }

    proptest! {
        #[test]
        fn test_sanitized_dose_in_range(dose in proptest::num::f64::ANY) {
            let out = sanitize_dose(dose, "test", 0);
            prop_assert!((0.0..=1.0).contains(&out));
            if (0.0..=1.0).contains(&dose) {
                prop_assert_eq!(out, dose);
            }
        }
    }
}
