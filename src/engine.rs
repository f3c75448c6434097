//! The analysis driver: snapshots the ring, runs the spectral pipeline, drives the tracker.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use crate::{
    analyze::{detect, level, spectrum::SpectrumAnalyzer, window},
    core::{
        base::{NoteSink, Res, Void},
        config::EngineConfig,
        ring_buffer::RingBuffer,
    },
    midi::tracker::NoteTracker,
};

/// Pause between analysis iterations; bounds CPU while keeping the update rate in the hundreds
/// of hertz, far above note-onset tolerance.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// What a single analysis iteration saw; for observability and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// RMS of the analyzed snapshot.
    pub rms: f32,
    /// Whether the level spiked relative to the previous frame.
    pub transient: bool,
    /// Detected fundamentals in Hz, strongest first; empty when silence-gated.
    pub detected: Vec<f32>,
}

/// The realtime analysis engine.
///
/// The audio callback writes into [`ring`](Self::ring); [`tick`](Self::tick) pulls the most
/// recent window through the level gate, spectrum pipeline and peak picker, and feeds the note
/// tracker. [`run`](Self::run) loops `tick` until a shutdown flag flips.
pub struct Engine {
    config: EngineConfig,
    ring: Arc<RingBuffer>,
    window: Vec<f32>,
    analyzer: SpectrumAnalyzer,
    tracker: NoteTracker,
    snapshot: Vec<f32>,
    previous_rms: f32,
}

impl Engine {
    /// Validates the configuration and allocates every buffer the hot path needs.
    pub fn new(config: EngineConfig) -> Res<Self> {
        config.validate()?;

        let ring = Arc::new(RingBuffer::new(config.ring_buffer_size));
        let window = window::blackman_harris(config.analysis_window);
        let analyzer = SpectrumAnalyzer::new(config.padded_size);
        let tracker = NoteTracker::new(config.frames_to_kill, config.default_velocity, config.freq_floor_hz);
        let snapshot = vec![0.0; config.analysis_window];

        Ok(Self {
            config,
            ring,
            window,
            analyzer,
            tracker,
            snapshot,
            previous_rms: 0.0,
        })
    }

    /// Returns the sample ring the capture callback writes into.
    pub fn ring(&self) -> Arc<RingBuffer> {
        self.ring.clone()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one analysis iteration against the current ring contents.
    pub fn tick(&mut self, sink: &mut impl NoteSink) -> Res<FrameReport> {
        self.ring.snapshot_into(&mut self.snapshot)?;

        let rms = level::rms(&self.snapshot);
        let transient = level::is_transient(rms, self.previous_rms, self.config.transient_ratio, self.config.min_rms);
        self.previous_rms = rms;

        // Silence: skip the spectral stage entirely and let the debounce run notes out.
        if rms < self.config.silence_rms {
            self.tracker.update(&[], sink);

            return Ok(FrameReport {
                rms,
                transient,
                detected: Vec::new(),
            });
        }

        let spectrum = self.analyzer.analyze(&self.snapshot, &self.window)?;
        let detected = detect::pick_fundamentals(spectrum, &self.config);

        self.tracker.update(&detected, sink);

        Ok(FrameReport { rms, transient, detected })
    }

    /// Loops [`tick`](Self::tick) until `shutdown` flips.
    ///
    /// A failed iteration is logged and treated as a missed frame, which the tracker's debounce
    /// absorbs. Callers stop the capture stream after this returns, then flush with
    /// [`all_notes_off`](Self::all_notes_off).
    pub fn run(&mut self, sink: &mut impl NoteSink, shutdown: &AtomicBool) -> Void {
        while !shutdown.load(Ordering::Relaxed) {
            match self.tick(sink) {
                Ok(report) => {
                    if !report.detected.is_empty() {
                        debug!("rms {:.4}, {} note(s)", report.rms, report.detected.len());
                    }
                }
                Err(err) => {
                    warn!("Analysis frame discarded: {}", err);
                    self.tracker.update(&[], sink);
                }
            }

            thread::sleep(TICK_INTERVAL);
        }

        Ok(())
    }

    /// Releases every sounding note; the last thing to happen before the port closes.
    pub fn all_notes_off(&mut self, sink: &mut impl NoteSink) {
        self.tracker.all_notes_off(sink);
    }
}

// Tests.
