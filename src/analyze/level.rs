//! Signal level measurement and the transient flag.

/// Computes the root mean square of a sample chunk.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_of_squares: f32 = samples.iter().map(|&sample| sample * sample).sum();

    (sum_of_squares / samples.len() as f32).sqrt()
}

/// Flags a sudden level spike between two consecutive frames.
///
/// Below `min_rms` the previous frame counts as silence, so the ratio test would explode; the
/// spike test against `2 * min_rms` covers the rise-from-silence case instead. The flag is
/// advisory and does not gate note changes.
pub fn is_transient(current_rms: f32, previous_rms: f32, threshold_ratio: f32, min_rms: f32) -> bool {
    if previous_rms < min_rms {
        return current_rms > min_rms * 2.0;
    }

    current_rms / previous_rms > threshold_ratio
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_1_SQRT_2, PI};

    #[test]
    fn test_rms_silence() {
        assert_eq!(rms(&vec![0.0; 128]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_dc() {
        assert_relative_eq!(rms(&vec![1.0; 128]), 1.0);
    }

    #[test]
    fn test_rms_sine() {
        // Ten full cycles, 48 samples each.
        let sine: Vec<f32> = (0..480).map(|i| (2.0 * PI * 1000.0 * i as f32 / 48_000.0).sin()).collect();

        assert!((rms(&sine) - FRAC_1_SQRT_2).abs() < 0.02);
    }

    #[test]
    fn test_transient_detection() {
        // Steady state.
        assert!(!is_transient(0.5, 0.5, 2.0, 0.01));

        // Spike.
        assert!(is_transient(0.5, 0.1, 2.0, 0.01));

        // Small change.
        assert!(!is_transient(0.15, 0.1, 2.0, 0.01));

        // Rise from silence.
        assert!(is_transient(0.05, 0.001, 2.0, 0.01));
        assert!(is_transient(0.1, 0.0, 2.0, 0.01));

        // Noise floor wiggle stays quiet.
        assert!(!is_transient(0.005, 0.004, 2.0, 0.01));

        // Loud but slow swell.
        assert!(!is_transient(0.35, 0.3, 2.0, 0.01));
    }
}
