//! Fundamental detection by iterative harmonic subtraction.

use crate::core::config::EngineConfig;

/// Peels up to `max_notes` fundamentals off a whitened spectrum, strongest first.
///
/// Each round takes the strongest remaining bin above the rumble floor, reports its frequency,
/// and zeroes a small window around the bin and around its integer harmonics so overtones are
/// never reported as independent fundamentals. The spectrum is consumed destructively; the
/// caller rebuilds it every frame.
pub fn pick_fundamentals(spectrum: &mut [f32], config: &EngineConfig) -> Vec<f32> {
    let bin_hz = config.bin_hz();
    let start_bin = (config.freq_floor_hz / bin_hz) as usize + 1;

    let mut detected = Vec::with_capacity(config.max_notes);

    for _ in 0..config.max_notes {
        // Strongest remaining bin; ties resolve to the lowest index.
        let mut peak_bin = 0;
        let mut peak_magnitude = -1.0f32;

        for (bin, &magnitude) in spectrum.iter().enumerate().skip(start_bin) {
            if magnitude > peak_magnitude {
                peak_magnitude = magnitude;
                peak_bin = bin;
            }
        }

        if peak_magnitude < config.min_peak_threshold {
            break;
        }

        detected.push(peak_bin as f32 * bin_hz);

        suppress(spectrum, peak_bin, config.fundamental_kill_radius);

        for order in 2..=config.num_harmonics {
            let harmonic_bin = peak_bin * order;

            if harmonic_bin < spectrum.len() {
                suppress(spectrum, harmonic_bin, config.harmonic_kill_radius);
            }
        }
    }

    detected
}

/// Zeroes the bins within `radius` of `center`, clipped to the spectrum bounds.
///
/// Suppression must zero rather than attenuate, so a bin can never be re-selected as a
/// different fundamental within the same frame.
fn suppress(spectrum: &mut [f32], center: usize, radius: usize) {
    let low = center.saturating_sub(radius);
    let high = (center + radius + 1).min(spectrum.len());

    spectrum[low..high].fill(0.0);
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::spectrum::whiten;
    use pretty_assertions::assert_eq;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn bin_for(frequency: f32, config: &EngineConfig) -> usize {
        (frequency / config.bin_hz()).round() as usize
    }

    #[test]
    fn test_empty_spectrum_detects_nothing() {
        let config = config();
        let mut spectrum = vec![0.0; config.num_bins()];

        assert_eq!(pick_fundamentals(&mut spectrum, &config), Vec::<f32>::new());
    }

    #[test]
    fn test_everything_below_threshold_detects_nothing() {
        let config = config();
        let mut spectrum = vec![0.04; config.num_bins()];

        assert!(pick_fundamentals(&mut spectrum, &config).is_empty());
    }

    #[test]
    fn test_single_peak() {
        let config = config();
        let mut spectrum = vec![0.0; config.num_bins()];
        spectrum[bin_for(440.0, &config)] = 1.0;

        let detected = pick_fundamentals(&mut spectrum, &config);

        assert_eq!(detected.len(), 1);
        assert!((detected[0] - 440.0).abs() < config.bin_hz());
    }

    #[test]
    fn test_two_note_chord_folds_harmonics() {
        let config = EngineConfig {
            min_peak_threshold: 0.10,
            ..EngineConfig::default()
        };
        let bin_hz = config.bin_hz();

        let e2 = 82.4;
        let a2 = 110.0;

        let mut spectrum = vec![0.0; config.num_bins()];
        let e2_bin = bin_for(e2, &config);
        spectrum[e2_bin] = 1.0;
        spectrum[e2_bin * 2] = 0.5;
        spectrum[e2_bin * 3] = 0.3;

        let a2_bin = bin_for(a2, &config);
        spectrum[a2_bin] = 0.8;
        spectrum[a2_bin * 2] = 0.4;

        whiten(&mut spectrum);
        let detected = pick_fundamentals(&mut spectrum, &config);

        // Both fundamentals resolve within a bin.
        assert!(detected.iter().any(|f| (f - e2).abs() < bin_hz));
        assert!(detected.iter().any(|f| (f - a2).abs() < bin_hz));

        // Neither second harmonic survives as an independent note.
        assert!(!detected.iter().any(|f| (f - e2 * 2.0).abs() < bin_hz));
        assert!(!detected.iter().any(|f| (f - a2 * 2.0).abs() < bin_hz));
    }

    #[test]
    fn test_caps_at_max_notes() {
        let config = config();
        let mut spectrum = vec![0.0; config.num_bins()];

        // Eight strong peaks, placed clear of each other's harmonic kill zones.
        for bin in [101, 151, 211, 263, 331, 389, 449, 499] {
            spectrum[bin] = 1.0;
        }

        let detected = pick_fundamentals(&mut spectrum, &config);

        assert_eq!(detected.len(), config.max_notes);
    }

    #[test]
    fn test_equal_peaks_resolve_to_the_lowest_bin() {
        let config = config();
        let mut spectrum = vec![0.0; config.num_bins()];
        spectrum[50] = 0.9;
        spectrum[71] = 0.9;

        let detected = pick_fundamentals(&mut spectrum, &config);

        assert_eq!(detected, vec![50.0 * config.bin_hz(), 71.0 * config.bin_hz()]);
    }

    #[test]
    fn test_detected_frequencies_respect_the_floor() {
        let config = config();
        let mut spectrum = vec![1.0; config.num_bins()];

        let detected = pick_fundamentals(&mut spectrum, &config);

        for frequency in detected {
            assert!(frequency >= config.freq_floor_hz);
        }
    }
}
