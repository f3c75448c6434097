//! A realtime polyphonic pitch-to-MIDI engine for electric guitar.
//!
//! A capture device feeds mono samples into a lock-free ring; an analysis loop windows and
//! zero-pads the most recent samples, whitens the FFT magnitude spectrum, peels up to six
//! fundamentals by iterative harmonic subtraction, and drives a debounced note tracker that
//! emits NoteOn/NoteOff through any [`NoteSink`].
//!
//! # Examples
//!
//! ```
//! use fretlib::core::base::NoteMessage;
//! use fretlib::midi::tracker::NoteTracker;
//!
//! let mut tracker = NoteTracker::new(3, 100, 60.0);
//! let mut log: Vec<NoteMessage> = Vec::new();
//!
//! // A4 and E2 sound together; both notes start immediately.
//! tracker.update(&[440.0, 82.4], &mut log);
//! assert_eq!(log, vec![NoteMessage::On(69, 100), NoteMessage::On(40, 100)]);
//!
//! // E2 drops out; its release is debounced across three frames.
//! for _ in 0..3 {
//!     tracker.update(&[440.0], &mut log);
//! }
//! assert_eq!(log.last(), Some(&NoteMessage::Off(40)));
//! ```
//!
//! [`NoteSink`]: crate::core::base::NoteSink

#![warn(rustdoc::broken_intra_doc_links, rust_2018_idioms, clippy::all)]

pub mod analyze;
pub mod core;
pub mod engine;
pub mod midi;

#[cfg(feature = "listen")]
pub mod listen;
