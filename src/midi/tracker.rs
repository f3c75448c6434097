//! Maps detected frequencies to MIDI notes and decides when they start and stop.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::core::base::NoteSink;

/// Converts a frequency in Hz to the nearest MIDI note number, clamped to the MIDI range.
pub fn midi_note_number(frequency: f32) -> u8 {
    let note = 69.0 + 12.0 * (frequency / 440.0).log2();

    note.round().clamp(0.0, 127.0) as u8
}

/// Tracks which notes are sounding and debounces their release.
///
/// The peak picker is noisy at the grain of single frames. Note ons are sent immediately so
/// attacks stay tight; note offs only fire after a note has been missing for `frames_to_kill`
/// consecutive frames, so sustain survives transient dropouts.
pub struct NoteTracker {
    frames_to_kill: u32,
    velocity: u8,
    freq_floor_hz: f32,

    /// Notes with a note on sent and no note off yet.
    active: HashSet<u8>,

    /// Consecutive frames each active note has been missing. Keys are always active notes.
    missing: HashMap<u8, u32>,
}

impl NoteTracker {
    /// Creates a tracker with the given debounce length, note on velocity, and frequency floor.
    pub fn new(frames_to_kill: u32, velocity: u8, freq_floor_hz: f32) -> Self {
        Self {
            frames_to_kill,
            velocity,
            freq_floor_hz,
            active: HashSet::new(),
            missing: HashMap::new(),
        }
    }

    /// Returns the currently sounding notes in ascending order.
    pub fn active_notes(&self) -> Vec<u8> {
        let mut notes: Vec<u8> = self.active.iter().copied().collect();
        notes.sort_unstable();

        notes
    }

    /// Feeds one frame of detected frequencies and emits the resulting note messages.
    ///
    /// Send failures are logged and the message dropped; tracker state advances regardless, so
    /// a transport that comes back sees a consistent picture.
    pub fn update(&mut self, frequencies: &[f32], sink: &mut impl NoteSink) {
        // Convert to note numbers, collapsing duplicates while keeping detection order.
        let mut incoming: Vec<u8> = Vec::with_capacity(frequencies.len());

        for &frequency in frequencies {
            if frequency <= self.freq_floor_hz {
                continue;
            }

            let note = midi_note_number(frequency);

            if !incoming.contains(&note) {
                incoming.push(note);
            }
        }

        // Arrivals: note on is immediate, and a reappearing note stops fading.
        for &note in &incoming {
            if self.active.insert(note) {
                if let Err(err) = sink.note_on(note, self.velocity) {
                    warn!("Dropped note on {}: {}", note, err);
                }
            }

            self.missing.remove(&note);
        }

        // Departures: count the miss, and release once it has persisted long enough.
        let mut expired = Vec::new();

        for &note in self.active.iter() {
            if incoming.contains(&note) {
                continue;
            }

            let misses = self.missing.entry(note).or_insert(0);
            *misses += 1;

            if *misses >= self.frames_to_kill {
                expired.push(note);
            }
        }

        expired.sort_unstable();

        for note in expired {
            if let Err(err) = sink.note_off(note) {
                warn!("Dropped note off {}: {}", note, err);
            }

            self.active.remove(&note);
            self.missing.remove(&note);
        }
    }

    /// Releases every sounding note; called once on shutdown.
    pub fn all_notes_off(&mut self, sink: &mut impl NoteSink) {
        let mut notes: Vec<u8> = self.active.drain().collect();
        notes.sort_unstable();

        for note in notes {
            if let Err(err) = sink.note_off(note) {
                warn!("Dropped note off {}: {}", note, err);
            }
        }

        self.missing.clear();
    }
}

// Tests.
