//! Cross-platform MIDI input/output engine.
//!
//! midimux opens hardware and virtual MIDI ports, fans decoded input from
//! any number of ports out to any number of subscribers, and batches
//! outbound writes. Raw buffers from driver threads run through a per-port
//! stream decoder (running status, messages split across buffers, sysex);
//! subscribers get whole [`MidiEvent`]s on dispatcher-owned worker threads,
//! in per-port arrival order, never on a driver thread.
//!
//! # Quick Start
//!
//! ```ignore
//! use midimux::{MidiEngine, MidiMessage, PortFilter};
//!
//! let engine = MidiEngine::builder().client_name("sampler").build()?;
//!
//! // Open every input and print what arrives.
//! let inputs = engine.open_inputs_matching("")?;
//! engine.subscribe(PortFilter::All, |event| {
//!     println!("{} @{}us {:?}", event.port, event.timestamp_us, event.message);
//! });
//!
//! // Drive a synth on the first output.
//! let outs = engine.list_outputs()?;
//! let synth = engine.open_output(&outs[0])?;
//! synth.send(&MidiMessage::note_on(0, 60, 100))?;
//! # Ok::<(), midimux::Error>(())
//! ```
//!
//! Feature flags: `hardware` (midir transport, on by default) and `jack`
//! (JACK instead of ALSA on Linux). With `hardware` off, the engine still
//! builds against a supplied backend such as [`MockBackend`].

pub mod backend;
mod config;
mod dispatcher;
mod engine;
pub mod error;
mod event;
mod input;
mod output;
mod registry;
mod stats;

#[cfg(feature = "hardware")]
pub use backend::MidirBackend;
pub use backend::{MidiBackend, MockBackend, PortDirection};
pub use config::{Ignore, OverflowPolicy};
pub use dispatcher::{PortFilter, SubscriptionId};
pub use engine::{MidiEngine, MidiEngineBuilder};
pub use error::{Error, Result};
pub use event::{MidiEvent, PortId};
pub use input::InputPort;
pub use output::OutputPort;
pub use registry::PortDesc;
pub use stats::{ChannelStats, EngineStats, SubscriberStats};

// Wire-format types come from the codec crate but are part of this API.
pub use midimux_msg::{InvalidEvent, MalformedMessage, MidiMessage, StreamDecoder};
