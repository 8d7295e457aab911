//! Error types for MIDI engine operations.

use thiserror::Error;

/// Errors surfaced by engine, port, and subscription operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The platform MIDI subsystem could not be initialized or reached.
    #[error("MIDI backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A port could not be opened: it vanished, is held exclusively
    /// elsewhere, or the descriptor is stale.
    #[error("failed to open MIDI port: {0}")]
    PortOpen(String),

    /// The operation needs an open port but the handle is no longer valid.
    #[error("MIDI port is closed")]
    PortClosed,

    /// The current platform backend cannot perform the operation.
    #[error("unsupported on this platform: {0}")]
    UnsupportedOnPlatform(String),

    /// An outbound message failed validation before encoding.
    #[error("invalid MIDI event: {0}")]
    InvalidEvent(#[from] midimux_msg::InvalidEvent),

    /// Inbound bytes did not form a valid MIDI message.
    #[error("malformed MIDI data: {0}")]
    Malformed(#[from] midimux_msg::MalformedMessage),

    /// A write to an open output failed. `written` counts the messages of
    /// the batch that reached the backend before the failure.
    #[error("write failed after {written} message(s): {reason}")]
    Write { written: usize, reason: String },
}

#[cfg(feature = "hardware")]
impl From<midir::InitError> for Error {
    fn from(err: midir::InitError) -> Self {
        Error::BackendUnavailable(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(err: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::PortOpen(err.to_string())
    }
}

#[cfg(feature = "hardware")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(err: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::PortOpen(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
