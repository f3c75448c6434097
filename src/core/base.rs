//! Base types and traits.

// Helpers.

/// Global result type.
pub type Res<T> = anyhow::Result<T>;

/// Global error type.
pub type Err = anyhow::Error;

/// Global void type.
pub type Void = Res<()>;

// Traits.

/// A trait for anything that accepts note messages (usually a MIDI port).
///
/// The engine only ever talks to the transport through this seam, so tests can substitute a
/// recording sink and a missing port can be replaced with a disabled one.
pub trait NoteSink {
    /// Starts sounding the given MIDI note number.
    fn note_on(&mut self, note: u8, velocity: u8) -> Void;

    /// Stops sounding the given MIDI note number.
    fn note_off(&mut self, note: u8) -> Void;
}

// Types.

/// A single note message emitted by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMessage {
    /// A note on with its velocity.
    On(u8, u8),
    /// A note off.
    Off(u8),
}

/// A recording sink; useful for tests and dry runs.
impl NoteSink for Vec<NoteMessage> {
    fn note_on(&mut self, note: u8, velocity: u8) -> Void {
        self.push(NoteMessage::On(note, velocity));
        Ok(())
    }

    fn note_off(&mut self, note: u8) -> Void {
        self.push(NoteMessage::Off(note));
        Ok(())
    }
}
