//! MIDI 1.0 wire-format types and codec.
//!
//! [`MidiMessage`] models channel voice, system common, system realtime and
//! sysex messages; encoding validates ranges before emitting anything, and
//! [`MidiMessage::from_bytes`] is its strict inverse. [`StreamDecoder`]
//! handles real byte streams: running status, messages and sysex split
//! across buffers, interleaved realtime, and recovery from malformed input.
//!
//! This crate is I/O-free; the `midimux` engine crate drives it from
//! platform callbacks.

mod decode;
pub mod error;
mod message;

pub use decode::StreamDecoder;
pub use error::{InvalidEvent, MalformedMessage};
pub use message::MidiMessage;
