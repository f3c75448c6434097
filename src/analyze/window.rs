//! Window tables for spectral analysis.

use std::f32::consts::PI;

/// Generates a Blackman-Harris window of the given size.
///
/// The four-term window trades main lobe width for roughly -92 dB sidelobes, which keeps string
/// overtones from leaking across the spectrum before harmonic subtraction runs. Precompute once
/// at startup; the trig is too expensive for the per-frame path.
pub fn blackman_harris(size: usize) -> Vec<f32> {
    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;

    let denominator = (size - 1) as f32;

    (0..size)
        .map(|n| {
            let phase = 2.0 * PI * n as f32 / denominator;

            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos()
        })
        .collect()
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_length() {
        assert_eq!(blackman_harris(128).len(), 128);
    }

    #[test]
    fn test_bounds() {
        let window = blackman_harris(512);

        assert!(window.iter().all(|&w| (0.0..=1.0).contains(&w)));
    }

    #[test]
    fn test_shape() {
        // Odd size puts a sample exactly at the peak.
        let window = blackman_harris(129);

        assert_relative_eq!(window[64], 1.0, epsilon = 1e-6);

        // Endpoints sit at the coefficient residue, near but not exactly zero.
        assert!(window[0] > 0.0 && window[0] < 1e-4);
        assert_relative_eq!(window[0], window[128], epsilon = 1e-6);
    }
}
