//! Engine tuning constants.

use crate::core::base::Void;

/// Every tuning constant of the pipeline, fixed at startup.
///
/// Defaults are chosen empirically for an electric guitar plugged into a 48 kHz interface. The
/// 512/2048 window and padding pair gives a bin spacing of about 23.4 Hz, which is coarse but
/// sufficient once harmonic subtraction folds overtones into their fundamentals.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Audio sample rate (Hz).
    pub sample_rate: u32,
    /// Requested audio callback block size (samples); the device may choose its own.
    pub buffer_size: usize,
    /// Ring buffer capacity (samples); several callback blocks.
    pub ring_buffer_size: usize,
    /// Samples per analysis window.
    pub analysis_window: usize,
    /// Zero-padded FFT size; a power of two, at least `analysis_window`.
    pub padded_size: usize,
    /// Most simultaneous notes reported per frame.
    pub max_notes: usize,
    /// Whitened magnitude floor below which peak picking stops.
    pub min_peak_threshold: f32,
    /// Highest harmonic order suppressed around each picked fundamental.
    pub num_harmonics: usize,
    /// Suppression radius around a picked fundamental (bins).
    pub fundamental_kill_radius: usize,
    /// Suppression radius around a harmonic (bins); wider, strings stretch.
    pub harmonic_kill_radius: usize,
    /// RMS below this is treated as silence and skips the spectral stage.
    pub silence_rms: f32,
    /// Consecutive missing frames before a note off is sent.
    pub frames_to_kill: u32,
    /// Peaks at or below this frequency are ignored (DC offset and rumble).
    pub freq_floor_hz: f32,
    /// Velocity for every note on.
    pub default_velocity: u8,
    /// RMS floor for the transient detector.
    pub min_rms: f32,
    /// RMS ratio over the previous frame that flags a transient.
    pub transient_ratio: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 128,
            ring_buffer_size: 4096,
            analysis_window: 512,
            padded_size: 2048,
            max_notes: 6,
            min_peak_threshold: 0.05,
            num_harmonics: 5,
            fundamental_kill_radius: 2,
            harmonic_kill_radius: 3,
            silence_rms: 0.002,
            frames_to_kill: 3,
            freq_floor_hz: 60.0,
            default_velocity: 100,
            min_rms: 0.01,
            transient_ratio: 2.0,
        }
    }
}

impl EngineConfig {
    /// Returns the FFT bin spacing (Hz).
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate as f32 / self.padded_size as f32
    }

    /// Returns the number of one-sided spectrum bins.
    pub fn num_bins(&self) -> usize {
        self.padded_size / 2 + 1
    }

    /// Fails fast on inconsistent sizing; programmer error, not a runtime condition.
    pub fn validate(&self) -> Void {
        if self.analysis_window < 2 {
            return Err(anyhow::Error::msg("Analysis window must be at least 2 samples."));
        }

        if self.analysis_window > self.ring_buffer_size {
            return Err(anyhow::Error::msg("Analysis window cannot exceed the ring buffer capacity."));
        }

        if self.padded_size < self.analysis_window {
            return Err(anyhow::Error::msg("Padded FFT size cannot be smaller than the analysis window."));
        }

        if !self.padded_size.is_power_of_two() {
            return Err(anyhow::Error::msg("Padded FFT size must be a power of two."));
        }

        if self.default_velocity == 0 || self.default_velocity > 127 {
            return Err(anyhow::Error::msg("Note on velocity must be within [1, 127]."));
        }

        if self.frames_to_kill == 0 {
            return Err(anyhow::Error::msg("Frames to kill must be at least 1."));
        }

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_bin_spacing() {
        let config = EngineConfig::default();

        assert_eq!(config.bin_hz(), 48_000.0 / 2048.0);
        assert_eq!(config.num_bins(), 1025);
    }

    #[test]
    fn test_rejects_window_larger_than_ring() {
        let config = EngineConfig {
            ring_buffer_size: 256,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_power_of_two_padding() {
        let config = EngineConfig {
            padded_size: 2000,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_padding_smaller_than_window() {
        let config = EngineConfig {
            analysis_window: 512,
            padded_size: 256,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }
}
