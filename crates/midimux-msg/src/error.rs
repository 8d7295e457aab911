//! Codec error types.

use thiserror::Error;

/// Reasons a message is rejected at encode time.
///
/// Encoding validates before emitting anything; a rejected message leaves the
/// output untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidEvent {
    #[error("channel {0} out of range 0-15")]
    Channel(u8),

    #[error("{what} {value:#04x} exceeds 7-bit range")]
    Data { what: &'static str, value: u8 },

    #[error("{what} {value} exceeds 14-bit range")]
    Wide { what: &'static str, value: u16 },

    #[error("sysex payload byte {0:#04x} has the status bit set")]
    SysExPayload(u8),
}

/// Reasons raw bytes fail to parse as a MIDI message.
///
/// [`StreamDecoder`](crate::StreamDecoder) recovers from these by discarding
/// the offending bytes and counting the loss; the strict single-message parse
/// [`MidiMessage::from_bytes`](crate::MidiMessage::from_bytes) returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    #[error("empty input")]
    Empty,

    #[error("status {status:#04x} expects {expected} data byte(s), got {got}")]
    Truncated {
        status: u8,
        expected: usize,
        got: usize,
    },

    #[error("data byte {0:#04x} with no status to apply it to")]
    OrphanData(u8),

    #[error("undefined status byte {0:#04x}")]
    UndefinedStatus(u8),

    #[error("sysex terminator with no sysex in progress")]
    StrayTerminator,

    #[error("sysex interrupted by status byte {0:#04x}")]
    InterruptedSysEx(u8),

    #[error("sysex missing its 0xF7 terminator")]
    UnterminatedSysEx,

    #[error("{0} trailing byte(s) after a complete message")]
    TrailingBytes(usize),
}
