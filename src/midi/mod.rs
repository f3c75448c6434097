//! Note tracking and the MIDI transport.

pub mod tracker;

#[cfg(feature = "midi")]
pub mod output;
