//! src/ingest/link.rs
//!
//! Connections to the sensor device and the shared outbound write path.
//!
//! A [`Link`] splits one connection into a read half, owned exclusively by the
//! reader thread, and an optional write half that gets installed into the
//! [`CommandWriter`] so the render loop can send level commands.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::SerialSettings;
use crate::error::{CommandError, LinkError};

/// An open connection, split into halves.
pub struct Link {
    pub reader: Box<dyn Read + Send>,
    pub writer: Option<Box<dyn Write + Send>>,
    /// Human-readable description for logs and the info panel.
    pub description: String,
}

/// Something that can (re)open a [`Link`]. Called by the reader thread whenever
/// it has no open connection.
pub trait Connect: Send {
    fn connect(&mut self) -> Result<Link, LinkError>;
}

/// Opens a real serial port with fixed settings.
pub struct SerialConnect {
    settings: SerialSettings,
}

impl SerialConnect {
    pub fn new(settings: SerialSettings) -> Self {
        Self { settings }
    }
}

impl Connect for SerialConnect {
    fn connect(&mut self) -> Result<Link, LinkError> {
        let s = &self.settings;
        debug!(port = %s.port, baud = s.baud_rate, "Opening serial port");
        let port = serialport::new(&s.port, s.baud_rate)
            .data_bits(s.data_bits)
            .parity(s.parity)
            .stop_bits(s.stop_bits)
            .timeout(s.timeout)
            .open()?;
        let writer = port.try_clone()?;
        info!(port = %s.port, baud = s.baud_rate, "Serial port opened");
        Ok(Link {
            reader: Box::new(port),
            writer: Some(Box::new(writer)),
            description: format!("{} @ {} baud", s.port, s.baud_rate),
        })
    }
}

/// Mutex-guarded slot holding the write half of the current link, if any.
///
/// Cloning yields another handle to the same slot.
#[derive(Clone, Default)]
pub struct CommandWriter {
    slot: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl CommandWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, writer: Option<Box<dyn Write + Send>>) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = writer;
    }

    pub(crate) fn clear(&self) {
        self.install(None);
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Write one command byte. Writes are serialized by the slot mutex.
    pub fn send(&self, byte: u8) -> Result<(), CommandError> {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        let writer = slot.as_mut().ok_or(CommandError::NotConnected)?;
        writer.write_all(&[byte])?;
        writer.flush()?;
        debug!(command = %(byte as char), "Command sent");
        Ok(())
    }
}
