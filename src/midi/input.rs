//! MIDI input port handling
//!
//! Enumerates ports, opens the first one whose name matches a substring
//! pattern, and forwards parsed events over a channel drained non-blockingly
//! by the translator loop.

use anyhow::{anyhow, bail, Result};
use midir::{MidiInput, MidiInputConnection};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::MidiEvent;

const CLIENT_NAME: &str = "joypuppet";
const EVENT_QUEUE: usize = 256;

/// List available MIDI input port names
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;

    let mut port_names = Vec::new();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// An open MIDI input port delivering parsed events
pub struct MidiInputStream {
    /// Keeps the port open; dropping it closes the connection
    _conn: MidiInputConnection<()>,
    rx: mpsc::Receiver<MidiEvent>,
    port_name: String,
}

impl MidiInputStream {
    /// Open the first input port whose name contains `pattern`
    /// (case-insensitive).
    pub fn connect(pattern: &str) -> Result<Self> {
        let midi_in = MidiInput::new(CLIENT_NAME)?;

        let wanted = pattern.to_lowercase();
        let mut matched = None;
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if name.to_lowercase().contains(&wanted) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    matched = Some((port, name));
                    break;
                }
            }
        }

        let Some((port, port_name)) = matched else {
            bail!("no MIDI input port matching \"{}\" found", pattern);
        };

        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let conn = midi_in
            .connect(
                &port,
                CLIENT_NAME,
                move |_timestamp, data, _| {
                    if let Some(event) = MidiEvent::parse(data) {
                        if tx.try_send(event).is_err() {
                            warn!("MIDI event queue full, dropping event");
                        }
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("failed to open MIDI input port '{}': {}", port_name, e))?;

        Ok(Self {
            _conn: conn,
            rx,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Non-blocking poll for the next event
    pub fn try_next(&mut self) -> Option<MidiEvent> {
        self.rx.try_recv().ok()
    }
}
