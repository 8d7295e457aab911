//! Backend boundary: platform MIDI transports behind one trait.
//!
//! The engine never talks to a driver directly. Everything below the
//! [`MidiBackend`] trait runs driver-side; everything above synchronizes
//! only at the registry and queue boundaries, so a backend is free to use
//! one callback thread per port or one shared thread for all of them.

#[cfg(feature = "hardware")]
mod hardware;
mod mock;

#[cfg(feature = "hardware")]
pub use hardware::MidirBackend;
pub use mock::MockBackend;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which way a port carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

/// A port as the backend reports it during one enumeration pass.
///
/// The index is only meaningful against the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPort {
    pub index: usize,
    pub name: String,
    /// True when the backend knows the port is software-only. Best effort;
    /// hardware backends that cannot tell report false.
    pub is_virtual: bool,
}

/// Raw buffer handler registered when an input opens.
///
/// Called from a backend-owned thread with the buffer's timestamp
/// (microseconds on the backend's monotonic clock) and its raw bytes. A
/// buffer is not a message boundary: messages may span buffers and one
/// buffer may hold several messages.
pub type RawInputCallback = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// A platform MIDI transport.
pub trait MidiBackend: Send + Sync {
    /// Short transport name for diagnostics ("alsa", "coremidi", "winmm",
    /// "jack", "mock").
    fn name(&self) -> &str;

    /// Current ports for one direction, in backend order.
    fn enumerate(&self, direction: PortDirection) -> Result<Vec<RawPort>>;

    /// Opens an input port and registers its buffer callback.
    fn open_input(
        &self,
        port: &RawPort,
        callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>>;

    /// Opens an output port for writing.
    fn open_output(&self, port: &RawPort) -> Result<Box<dyn OutputConnection>>;

    /// Creates a software-only input port other applications can connect to.
    fn open_virtual_input(
        &self,
        name: &str,
        callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>>;

    /// Creates a software-only output port other applications can read from.
    fn open_virtual_output(&self, name: &str) -> Result<Box<dyn OutputConnection>>;

    /// Whether this backend can create virtual ports at all.
    fn supports_virtual_ports(&self) -> bool;
}

/// An open input subscription.
pub trait InputConnection: Send {
    /// Tears the subscription down. Must not return until the backend
    /// guarantees the callback will never fire again, including callbacks
    /// already in flight on the driver thread.
    fn close(self: Box<Self>);
}

/// An open output port.
pub trait OutputConnection: Send {
    /// Writes one encoded message.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Releases the port.
    fn close(self: Box<Self>);
}
