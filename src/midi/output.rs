//! The MIDI transport: a [`NoteSink`] backed by a system MIDI output port.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

use crate::core::base::{NoteSink, Void};

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;

/// A note sink writing to a MIDI output port on channel 0.
///
/// Opening is best effort: when no usable port exists the sink runs disabled and silently drops
/// messages, so the engine keeps tracking and a later restart with a port resumes cleanly.
pub struct MidiOutputSink {
    connection: Option<MidiOutputConnection>,
}

impl MidiOutputSink {
    /// Opens a port whose name contains `preferred_port`, falling back to the first available
    /// port, else a disabled sink.
    pub fn open(preferred_port: &str) -> Self {
        let output = match MidiOutput::new("fretmidi") {
            Ok(output) => output,
            Err(err) => {
                warn!("Could not create a MIDI output: {}; notes will be dropped.", err);
                return Self::disabled();
            }
        };

        let ports = output.ports();

        let port = ports
            .iter()
            .find(|port| output.port_name(port).map(|name| name.contains(preferred_port)).unwrap_or(false))
            .or_else(|| ports.first());

        let Some(port) = port else {
            warn!("No MIDI output ports available; notes will be dropped.");
            return Self::disabled();
        };

        let name = output.port_name(port).unwrap_or_else(|_| "<unknown>".to_owned());

        match output.connect(port, "fretmidi-out") {
            Ok(connection) => {
                info!("MIDI port opened: {}", name);
                Self { connection: Some(connection) }
            }
            Err(err) => {
                warn!("Could not connect to MIDI port {}: {}; notes will be dropped.", name, err);
                Self::disabled()
            }
        }
    }

    /// A sink that drops every message.
    pub fn disabled() -> Self {
        Self { connection: None }
    }

    /// Whether a port is actually connected.
    pub fn is_enabled(&self) -> bool {
        self.connection.is_some()
    }

    /// Closes the port, if one was opened.
    pub fn close(mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

impl NoteSink for MidiOutputSink {
    fn note_on(&mut self, note: u8, velocity: u8) -> Void {
        if let Some(connection) = self.connection.as_mut() {
            connection
                .send(&[NOTE_ON, note, velocity])
                .map_err(|err| anyhow::Error::msg(format!("MIDI send failed: {}", err)))?;
        }

        Ok(())
    }

    fn note_off(&mut self, note: u8) -> Void {
        if let Some(connection) = self.connection.as_mut() {
            connection
                .send(&[NOTE_OFF, note, 0])
                .map_err(|err| anyhow::Error::msg(format!("MIDI send failed: {}", err)))?;
        }

        Ok(())
    }
}

// Tests.
