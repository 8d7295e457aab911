//! Event and port identity types.

use midimux_msg::MidiMessage;
use serde::{Deserialize, Serialize};

/// Engine-assigned identifier for one opened port.
///
/// Ids are allocated from a per-engine counter and never reused, so an id
/// held after its port closed can never alias a port opened later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(u64);

impl PortId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port{}", self.0)
    }
}

/// One decoded MIDI message tagged with its source port and arrival time.
///
/// `timestamp_us` is in microseconds on the backend's monotonic clock and
/// marks the arrival of the message's first byte, so a sysex that trickled
/// in across several buffers is stamped with when it started. Timestamps
/// are comparable within one port, not across ports or engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    pub port: PortId,
    pub timestamp_us: u64,
    pub message: MidiMessage,
}

impl MidiEvent {
    #[inline]
    pub fn new(port: PortId, timestamp_us: u64, message: MidiMessage) -> Self {
        Self {
            port,
            timestamp_us,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_id_display() {
        assert_eq!(PortId::new(7).to_string(), "port7");
    }

    #[test]
    fn test_event_carries_source_port() {
        let event = MidiEvent::new(PortId::new(3), 1_500, MidiMessage::note_on(0, 64, 90));
        assert_eq!(event.port, PortId::new(3));
        assert_eq!(event.timestamp_us, 1_500);
        assert!(event.message.is_note_on());
    }
}
