//! Streaming decoder for raw MIDI byte buffers.

use crate::message::{channel_voice_data_len, realtime, MidiMessage};

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;

/// A channel voice or system common message still waiting for data bytes.
/// May span buffer boundaries.
#[derive(Debug, Clone, Copy)]
struct Pending {
    status: u8,
    need: usize,
    got: usize,
    data: [u8; 2],
    timestamp: u64,
}

impl Pending {
    fn channel_voice(status: u8, timestamp: u64) -> Self {
        Self {
            status,
            need: channel_voice_data_len(status),
            got: 0,
            data: [0; 2],
            timestamp,
        }
    }

    fn system_common(status: u8, need: usize, timestamp: u64) -> Self {
        Self {
            status,
            need,
            got: 0,
            data: [0; 2],
            timestamp,
        }
    }
}

/// Decodes a raw MIDI byte stream into [`MidiMessage`] values.
///
/// One decoder per input stream. All cross-buffer state lives here: running
/// status, a partially received message, and the sysex reassembly buffer.
/// Two streams must never share a decoder, or their running status would
/// bleed into each other.
///
/// `feed` hands each completed message to the sink together with a
/// timestamp: the timestamp of the buffer the message started in. System
/// realtime bytes are surfaced the moment they are seen, even from inside
/// another message or a sysex, and leave the rest of the state untouched.
///
/// Malformed input (truncated messages, data bytes with no status to apply
/// them to, undefined status bytes, broken sysex framing) is discarded and
/// counted; decoding continues with the next byte.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    running_status: Option<u8>,
    pending: Option<Pending>,
    in_sysex: bool,
    sysex_started_at: u64,
    // Reassembly arena: grows to fit the largest sysex seen, cleared after
    // each message, capacity retained.
    sysex_buf: Vec<u8>,
    malformed: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative count of malformed byte sequences discarded by this
    /// decoder.
    #[inline]
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// True while a message (sysex or otherwise) is waiting for more bytes.
    #[inline]
    pub fn mid_message(&self) -> bool {
        self.in_sysex || self.pending.is_some()
    }

    /// Discards partial state and running status. The malformed counter is
    /// kept.
    pub fn reset(&mut self) {
        self.running_status = None;
        self.pending = None;
        self.in_sysex = false;
        self.sysex_buf.clear();
    }

    /// Decodes one raw buffer, invoking `sink(timestamp, message)` for every
    /// completed message.
    pub fn feed(&mut self, timestamp: u64, bytes: &[u8], mut sink: impl FnMut(u64, MidiMessage)) {
        for &byte in bytes {
            self.step(timestamp, byte, &mut sink);
        }
    }

    fn step(&mut self, timestamp: u64, byte: u8, sink: &mut impl FnMut(u64, MidiMessage)) {
        // Realtime first: it may interleave anywhere and never disturbs
        // running status, a pending message, or an open sysex.
        if byte >= 0xF8 {
            match realtime(byte) {
                Some(msg) => sink(timestamp, msg),
                None => self.malformed += 1, // undefined 0xF9 / 0xFD
            }
            return;
        }

        if self.in_sysex {
            if byte == SYSEX_END {
                let data = self.sysex_buf.as_slice().to_vec();
                self.sysex_buf.clear();
                self.in_sysex = false;
                sink(self.sysex_started_at, MidiMessage::SysEx { data });
            } else if byte < 0x80 {
                self.sysex_buf.push(byte);
            } else {
                // A non-realtime status aborts the sysex; the new status is
                // then processed on its own.
                self.malformed += 1;
                self.sysex_buf.clear();
                self.in_sysex = false;
                self.on_status(timestamp, byte, sink);
            }
            return;
        }

        if byte >= 0x80 {
            self.on_status(timestamp, byte, sink);
        } else {
            self.on_data(timestamp, byte, sink);
        }
    }

    fn on_status(&mut self, timestamp: u64, status: u8, sink: &mut impl FnMut(u64, MidiMessage)) {
        // A fresh status while data bytes are still outstanding abandons the
        // partial message.
        if self.pending.take().is_some() {
            self.malformed += 1;
        }
        match status {
            0x80..=0xEF => {
                self.pending = Some(Pending::channel_voice(status, timestamp));
            }
            // Everything from here down is system common, which clears
            // running status.
            SYSEX_START => {
                self.in_sysex = true;
                self.sysex_started_at = timestamp;
                self.running_status = None;
            }
            0xF1 | 0xF3 => {
                self.pending = Some(Pending::system_common(status, 1, timestamp));
                self.running_status = None;
            }
            0xF2 => {
                self.pending = Some(Pending::system_common(status, 2, timestamp));
                self.running_status = None;
            }
            0xF6 => {
                sink(timestamp, MidiMessage::TuneRequest);
                self.running_status = None;
            }
            _ => {
                // Undefined 0xF4/0xF5, or a terminator with no open sysex.
                self.malformed += 1;
                self.running_status = None;
            }
        }
    }

    fn on_data(&mut self, timestamp: u64, byte: u8, sink: &mut impl FnMut(u64, MidiMessage)) {
        let mut pending = match self.pending.take() {
            Some(p) => p,
            None => match self.running_status {
                // Running status: a bare data byte restarts the last
                // completed channel voice message.
                Some(status) => Pending::channel_voice(status, timestamp),
                None => {
                    self.malformed += 1;
                    return;
                }
            },
        };
        pending.data[pending.got] = byte;
        pending.got += 1;
        if pending.got == pending.need {
            self.complete(pending, sink);
        } else {
            self.pending = Some(pending);
        }
    }

    fn complete(&mut self, pending: Pending, sink: &mut impl FnMut(u64, MidiMessage)) {
        let Pending {
            status,
            data,
            timestamp,
            ..
        } = pending;
        let channel = status & 0x0F;
        let msg = match status & 0xF0 {
            0x80 => MidiMessage::NoteOff {
                channel,
                note: data[0],
                velocity: data[1],
            },
            0x90 => MidiMessage::NoteOn {
                channel,
                note: data[0],
                velocity: data[1],
            },
            0xA0 => MidiMessage::PolyAftertouch {
                channel,
                note: data[0],
                pressure: data[1],
            },
            0xB0 => MidiMessage::ControlChange {
                channel,
                controller: data[0],
                value: data[1],
            },
            0xC0 => MidiMessage::ProgramChange {
                channel,
                program: data[0],
            },
            0xD0 => MidiMessage::ChannelAftertouch {
                channel,
                pressure: data[0],
            },
            0xE0 => MidiMessage::PitchBend {
                channel,
                value: ((data[1] as u16) << 7) | data[0] as u16,
            },
            _ => match status {
                0xF1 => MidiMessage::TimeCodeQuarterFrame { value: data[0] },
                0xF2 => MidiMessage::SongPosition {
                    beats: ((data[1] as u16) << 7) | data[0] as u16,
                },
                0xF3 => MidiMessage::SongSelect { song: data[0] },
                // Pendings are only ever created for channel voice and
                // 0xF1-0xF3.
                _ => return,
            },
        };
        if status < 0xF0 {
            self.running_status = Some(status);
        }
        sink(timestamp, msg);
    }
}
