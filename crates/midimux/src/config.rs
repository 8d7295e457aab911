//! Engine configuration values.

use midimux_msg::MidiMessage;
use serde::{Deserialize, Serialize};

/// What to do when a subscriber queue is full.
///
/// Either way the engine counts the loss and never blocks the thread that
/// received the hardware event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued event to make room. The stream stays fresh,
    /// which is what live control data wants.
    #[default]
    DropOldest,
    /// Discard the incoming event and keep the backlog.
    DropNewest,
}

/// Inbound message categories to filter out before delivery.
///
/// Everything is kept by default. Filtered messages are counted per channel
/// but never reach subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    /// Drop system exclusive messages.
    pub sysex: bool,
    /// Drop timing clock and time code quarter frames.
    pub time: bool,
    /// Drop active sensing keep-alives.
    pub active_sense: bool,
}

impl Ignore {
    pub(crate) fn keeps(&self, message: &MidiMessage) -> bool {
        match message {
            MidiMessage::SysEx { .. } => !self.sysex,
            MidiMessage::TimingClock | MidiMessage::TimeCodeQuarterFrame { .. } => !self.time,
            MidiMessage::ActiveSensing => !self.active_sense,
            _ => true,
        }
    }
}
