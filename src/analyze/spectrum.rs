//! The spectrum pipeline: window and zero-pad, FFT, magnitude, whitening.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::core::base::Res;

/// Computes whitened magnitude spectra over zero-padded analysis windows.
///
/// All working storage is allocated once here; [`analyze`](Self::analyze) runs allocation-free
/// so it can sit on the hot path of the analysis loop.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    padded: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Plans the FFT and preallocates the working buffers for the given padded size.
    pub fn new(padded_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(padded_size);

        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            padded: vec![Complex::new(0.0, 0.0); padded_size],
            scratch,
            magnitudes: vec![0.0; padded_size / 2 + 1],
        }
    }

    /// Returns the number of one-sided spectrum bins.
    pub fn num_bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Windows and zero-pads the snapshot, then returns the whitened magnitude spectrum.
    ///
    /// The returned slice is the analyzer's own scratch; the peak picker consumes it
    /// destructively, and it is rebuilt on the next call.
    pub fn analyze(&mut self, snapshot: &[f32], window: &[f32]) -> Res<&mut [f32]> {
        if snapshot.len() != window.len() {
            return Err(anyhow::Error::msg(format!(
                "Snapshot length {} does not match window length {}.",
                snapshot.len(),
                window.len()
            )));
        }

        if snapshot.len() > self.padded.len() {
            return Err(anyhow::Error::msg(format!(
                "Snapshot length {} exceeds the padded FFT size {}.",
                snapshot.len(),
                self.padded.len()
            )));
        }

        // Window into the head of the padded buffer; the tail stays zero.
        for (slot, (&sample, &coefficient)) in self.padded.iter_mut().zip(snapshot.iter().zip(window.iter())) {
            *slot = Complex::new(sample * coefficient, 0.0);
        }

        for slot in self.padded.iter_mut().skip(snapshot.len()) {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.padded, &mut self.scratch);

        // One-sided spectrum; the input is real, so the upper half is redundant.
        for (bin, magnitude) in self.magnitudes.iter_mut().enumerate() {
            *magnitude = self.padded[bin].norm();
        }

        whiten(&mut self.magnitudes);

        Ok(&mut self.magnitudes)
    }
}

/// Normalizes a magnitude spectrum by its peak, in place.
///
/// A spectrum with no energy above the epsilon is left untouched rather than divided toward
/// infinity.
pub fn whiten(spectrum: &mut [f32]) {
    let max = spectrum.iter().copied().fold(0.0f32, f32::max);

    if max > 1e-9 {
        for magnitude in spectrum.iter_mut() {
            *magnitude /= max;
        }
    }
}

// Tests.
