//! Structured MIDI 1.0 messages with validating encode and strict decode.

use serde::{Deserialize, Serialize};

use crate::error::{InvalidEvent, MalformedMessage};

/// A single MIDI 1.0 message.
///
/// Channel voice messages carry their channel (0-15) alongside 7-bit data
/// fields; `PitchBend` and `SongPosition` carry the combined 14-bit value.
/// `SysEx` owns its payload exclusively, without the 0xF0/0xF7 framing bytes.
///
/// Fields are stored as given; range checks happen at encode time, so a
/// message built with out-of-range values is representable but will not
/// serialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// 14-bit bend value, 0x2000 = center.
    PitchBend { channel: u8, value: u16 },
    /// Payload only; the 0xF0/0xF7 delimiters are added on encode and
    /// stripped on decode.
    SysEx { data: Vec<u8> },
    TimeCodeQuarterFrame { value: u8 },
    /// 14-bit position in MIDI beats (sixteenth notes).
    SongPosition { beats: u16 },
    SongSelect { song: u8 },
    TuneRequest,
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,
}

impl MidiMessage {
    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOn {
            channel,
            note,
            velocity,
        }
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::NoteOff {
            channel,
            note,
            velocity,
        }
    }

    #[inline]
    pub fn poly_aftertouch(channel: u8, note: u8, pressure: u8) -> Self {
        Self::PolyAftertouch {
            channel,
            note,
            pressure,
        }
    }

    #[inline]
    pub fn control_change(channel: u8, controller: u8, value: u8) -> Self {
        Self::ControlChange {
            channel,
            controller,
            value,
        }
    }

    #[inline]
    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::ProgramChange { channel, program }
    }

    #[inline]
    pub fn channel_aftertouch(channel: u8, pressure: u8) -> Self {
        Self::ChannelAftertouch { channel, pressure }
    }

    #[inline]
    pub fn pitch_bend(channel: u8, value: u16) -> Self {
        Self::PitchBend { channel, value }
    }

    #[inline]
    pub fn sysex(data: impl Into<Vec<u8>>) -> Self {
        Self::SysEx { data: data.into() }
    }

    /// Channel for channel voice messages, `None` for system messages.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        match self {
            Self::NoteOff { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::PolyAftertouch { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelAftertouch { channel, .. }
            | Self::PitchBend { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn { velocity, .. } if *velocity > 0)
    }

    /// True for NoteOff and for NoteOn with velocity 0, which the wire format
    /// allows as a note-off under running status.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self,
            Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self {
            Self::NoteOn { note, .. }
            | Self::NoteOff { note, .. }
            | Self::PolyAftertouch { note, .. } => Some(*note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => Some(*velocity),
            _ => None,
        }
    }

    /// System realtime messages may interleave anywhere in a byte stream,
    /// including inside another message.
    #[inline]
    pub fn is_realtime(&self) -> bool {
        matches!(
            self,
            Self::TimingClock
                | Self::Start
                | Self::Continue
                | Self::Stop
                | Self::ActiveSensing
                | Self::SystemReset
        )
    }

    #[inline]
    pub fn is_system(&self) -> bool {
        self.channel().is_none()
    }

    /// Leading status byte on the wire. Out-of-range channels are masked to
    /// the low nibble here; encoding rejects them instead.
    pub fn status_byte(&self) -> u8 {
        match self {
            Self::NoteOff { channel, .. } => 0x80 | (channel & 0x0F),
            Self::NoteOn { channel, .. } => 0x90 | (channel & 0x0F),
            Self::PolyAftertouch { channel, .. } => 0xA0 | (channel & 0x0F),
            Self::ControlChange { channel, .. } => 0xB0 | (channel & 0x0F),
            Self::ProgramChange { channel, .. } => 0xC0 | (channel & 0x0F),
            Self::ChannelAftertouch { channel, .. } => 0xD0 | (channel & 0x0F),
            Self::PitchBend { channel, .. } => 0xE0 | (channel & 0x0F),
            Self::SysEx { .. } => 0xF0,
            Self::TimeCodeQuarterFrame { .. } => 0xF1,
            Self::SongPosition { .. } => 0xF2,
            Self::SongSelect { .. } => 0xF3,
            Self::TuneRequest => 0xF6,
            Self::TimingClock => 0xF8,
            Self::Start => 0xFA,
            Self::Continue => 0xFB,
            Self::Stop => 0xFC,
            Self::ActiveSensing => 0xFE,
            Self::SystemReset => 0xFF,
        }
    }

    /// Encoded length in bytes, including status and sysex framing.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::NoteOff { .. }
            | Self::NoteOn { .. }
            | Self::PolyAftertouch { .. }
            | Self::ControlChange { .. }
            | Self::PitchBend { .. }
            | Self::SongPosition { .. } => 3,
            Self::ProgramChange { .. }
            | Self::ChannelAftertouch { .. }
            | Self::TimeCodeQuarterFrame { .. }
            | Self::SongSelect { .. } => 2,
            Self::SysEx { data } => data.len() + 2,
            Self::TuneRequest
            | Self::TimingClock
            | Self::Start
            | Self::Continue
            | Self::Stop
            | Self::ActiveSensing
            | Self::SystemReset => 1,
        }
    }

    /// Checks every field against its wire range without encoding.
    pub fn validate(&self) -> Result<(), InvalidEvent> {
        match self {
            Self::NoteOff { channel, note, velocity }
            | Self::NoteOn { channel, note, velocity } => {
                check_channel(*channel)?;
                check_data("note", *note)?;
                check_data("velocity", *velocity)
            }
            Self::PolyAftertouch { channel, note, pressure } => {
                check_channel(*channel)?;
                check_data("note", *note)?;
                check_data("pressure", *pressure)
            }
            Self::ControlChange { channel, controller, value } => {
                check_channel(*channel)?;
                check_data("controller", *controller)?;
                check_data("value", *value)
            }
            Self::ProgramChange { channel, program } => {
                check_channel(*channel)?;
                check_data("program", *program)
            }
            Self::ChannelAftertouch { channel, pressure } => {
                check_channel(*channel)?;
                check_data("pressure", *pressure)
            }
            Self::PitchBend { channel, value } => {
                check_channel(*channel)?;
                check_wide("pitch bend value", *value)
            }
            Self::SysEx { data } => {
                match data.iter().find(|b| **b & 0x80 != 0) {
                    Some(byte) => Err(InvalidEvent::SysExPayload(*byte)),
                    None => Ok(()),
                }
            }
            Self::TimeCodeQuarterFrame { value } => check_data("time code value", *value),
            Self::SongPosition { beats } => check_wide("song position", *beats),
            Self::SongSelect { song } => check_data("song number", *song),
            Self::TuneRequest
            | Self::TimingClock
            | Self::Start
            | Self::Continue
            | Self::Stop
            | Self::ActiveSensing
            | Self::SystemReset => Ok(()),
        }
    }

    /// Appends the wire encoding to `out`. Validates first; on error `out`
    /// is left untouched.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), InvalidEvent> {
        self.validate()?;
        out.reserve(self.wire_len());
        match self {
            Self::NoteOff { note, velocity, .. }
            | Self::NoteOn { note, velocity, .. } => {
                out.extend_from_slice(&[self.status_byte(), *note, *velocity]);
            }
            Self::PolyAftertouch { note, pressure, .. } => {
                out.extend_from_slice(&[self.status_byte(), *note, *pressure]);
            }
            Self::ControlChange { controller, value, .. } => {
                out.extend_from_slice(&[self.status_byte(), *controller, *value]);
            }
            Self::ProgramChange { program, .. } => {
                out.extend_from_slice(&[self.status_byte(), *program]);
            }
            Self::ChannelAftertouch { pressure, .. } => {
                out.extend_from_slice(&[self.status_byte(), *pressure]);
            }
            Self::PitchBend { value, .. } => {
                out.extend_from_slice(&[
                    self.status_byte(),
                    (value & 0x7F) as u8,
                    (value >> 7) as u8,
                ]);
            }
            Self::SysEx { data } => {
                out.push(0xF0);
                out.extend_from_slice(data);
                out.push(0xF7);
            }
            Self::TimeCodeQuarterFrame { value } => {
                out.extend_from_slice(&[0xF1, *value]);
            }
            Self::SongPosition { beats } => {
                out.extend_from_slice(&[0xF2, (beats & 0x7F) as u8, (beats >> 7) as u8]);
            }
            Self::SongSelect { song } => {
                out.extend_from_slice(&[0xF3, *song]);
            }
            Self::TuneRequest
            | Self::TimingClock
            | Self::Start
            | Self::Continue
            | Self::Stop
            | Self::ActiveSensing
            | Self::SystemReset => out.push(self.status_byte()),
        }
        Ok(())
    }

    /// Wire encoding as a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InvalidEvent> {
        let mut out = Vec::with_capacity(self.wire_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Strict parse of exactly one complete message: no running status, no
    /// interleaved realtime, no trailing bytes. The exact inverse of
    /// [`to_bytes`](Self::to_bytes). Streams use
    /// [`StreamDecoder`](crate::StreamDecoder) instead.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedMessage> {
        let (&status, data) = bytes.split_first().ok_or(MalformedMessage::Empty)?;
        if status < 0x80 {
            return Err(MalformedMessage::OrphanData(status));
        }

        if status >= 0xF8 {
            let msg = realtime(status).ok_or(MalformedMessage::UndefinedStatus(status))?;
            if !data.is_empty() {
                return Err(MalformedMessage::TrailingBytes(data.len()));
            }
            return Ok(msg);
        }

        if status == 0xF0 {
            return match data.split_last() {
                Some((&0xF7, payload)) => {
                    match payload.iter().find(|b| **b & 0x80 != 0) {
                        Some(byte) => Err(MalformedMessage::InterruptedSysEx(*byte)),
                        None => Ok(Self::SysEx {
                            data: payload.to_vec(),
                        }),
                    }
                }
                _ => Err(MalformedMessage::UnterminatedSysEx),
            };
        }

        let expected = match status {
            0x80..=0xEF => channel_voice_data_len(status),
            0xF1 | 0xF3 => 1,
            0xF2 => 2,
            0xF6 => 0,
            0xF7 => return Err(MalformedMessage::StrayTerminator),
            _ => return Err(MalformedMessage::UndefinedStatus(status)),
        };

        // A status bit inside the data region means the message was cut short
        // by the next message.
        for (i, &b) in data.iter().enumerate().take(expected) {
            if b & 0x80 != 0 {
                return Err(MalformedMessage::Truncated {
                    status,
                    expected,
                    got: i,
                });
            }
        }
        if data.len() < expected {
            return Err(MalformedMessage::Truncated {
                status,
                expected,
                got: data.len(),
            });
        }
        if data.len() > expected {
            return Err(MalformedMessage::TrailingBytes(data.len() - expected));
        }

        let channel = status & 0x0F;
        let msg = match status & 0xF0 {
            0x80 => Self::NoteOff {
                channel,
                note: data[0],
                velocity: data[1],
            },
            0x90 => Self::NoteOn {
                channel,
                note: data[0],
                velocity: data[1],
            },
            0xA0 => Self::PolyAftertouch {
                channel,
                note: data[0],
                pressure: data[1],
            },
            0xB0 => Self::ControlChange {
                channel,
                controller: data[0],
                value: data[1],
            },
            0xC0 => Self::ProgramChange {
                channel,
                program: data[0],
            },
            0xD0 => Self::ChannelAftertouch {
                channel,
                pressure: data[0],
            },
            0xE0 => Self::PitchBend {
                channel,
                value: wide(data[0], data[1]),
            },
            _ => match status {
                0xF1 => Self::TimeCodeQuarterFrame { value: data[0] },
                0xF2 => Self::SongPosition {
                    beats: wide(data[0], data[1]),
                },
                0xF3 => Self::SongSelect { song: data[0] },
                _ => Self::TuneRequest, // 0xF6 is the only zero-data status left
            },
        };
        Ok(msg)
    }
}

/// Data bytes following a channel voice status: 1 for program change and
/// channel aftertouch, 2 for everything else.
#[inline]
pub(crate) fn channel_voice_data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

/// Single-byte realtime messages; `None` for the undefined 0xF9 and 0xFD.
#[inline]
pub(crate) fn realtime(status: u8) -> Option<MidiMessage> {
    match status {
        0xF8 => Some(MidiMessage::TimingClock),
        0xFA => Some(MidiMessage::Start),
        0xFB => Some(MidiMessage::Continue),
        0xFC => Some(MidiMessage::Stop),
        0xFE => Some(MidiMessage::ActiveSensing),
        0xFF => Some(MidiMessage::SystemReset),
        _ => None,
    }
}

#[inline]
fn wide(lsb: u8, msb: u8) -> u16 {
    ((msb as u16) << 7) | lsb as u16
}

#[inline]
fn check_channel(channel: u8) -> Result<(), InvalidEvent> {
    if channel > 0x0F {
        Err(InvalidEvent::Channel(channel))
    } else {
        Ok(())
    }
}

#[inline]
fn check_data(what: &'static str, value: u8) -> Result<(), InvalidEvent> {
    if value > 0x7F {
        Err(InvalidEvent::Data { what, value })
    } else {
        Ok(())
    }
}

#[inline]
fn check_wide(what: &'static str, value: u16) -> Result<(), InvalidEvent> {
    if value > 0x3FFF {
        Err(InvalidEvent::Wide { what, value })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_accessors() {
        let msg = MidiMessage::note_on(0, 60, 100);
        assert!(msg.is_note_on());
        assert!(!msg.is_note_off());
        assert_eq!(msg.note(), Some(60));
        assert_eq!(msg.velocity(), Some(100));
        assert_eq!(msg.channel(), Some(0));
        assert!(!msg.is_system());
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let msg = MidiMessage::note_on(0, 60, 0);
        assert!(msg.is_note_off());
        assert!(!msg.is_note_on());
    }

    #[test]
    fn test_realtime_accessors() {
        assert!(MidiMessage::TimingClock.is_realtime());
        assert!(MidiMessage::TimingClock.is_system());
        assert!(!MidiMessage::note_on(0, 60, 100).is_realtime());
        assert!(!MidiMessage::sysex(vec![1, 2]).is_realtime());
        assert!(MidiMessage::sysex(vec![1, 2]).is_system());
    }

    #[test]
    fn test_to_bytes_channel_voice() {
        assert_eq!(
            MidiMessage::note_on(0, 60, 100).to_bytes().unwrap(),
            vec![0x90, 60, 100]
        );
        assert_eq!(
            MidiMessage::note_off(3, 64, 0).to_bytes().unwrap(),
            vec![0x83, 64, 0]
        );
        assert_eq!(
            MidiMessage::control_change(15, 7, 127).to_bytes().unwrap(),
            vec![0xBF, 7, 127]
        );
        assert_eq!(
            MidiMessage::program_change(1, 42).to_bytes().unwrap(),
            vec![0xC1, 42]
        );
        assert_eq!(
            MidiMessage::channel_aftertouch(2, 99).to_bytes().unwrap(),
            vec![0xD2, 99]
        );
        assert_eq!(
            MidiMessage::poly_aftertouch(4, 61, 20).to_bytes().unwrap(),
            vec![0xA4, 61, 20]
        );
    }

    #[test]
    fn test_pitch_bend_14bit_packing() {
        // Center (0x2000) splits into LSB 0x00, MSB 0x40.
        assert_eq!(
            MidiMessage::pitch_bend(0, 0x2000).to_bytes().unwrap(),
            vec![0xE0, 0x00, 0x40]
        );
        assert_eq!(
            MidiMessage::pitch_bend(5, 0x3FFF).to_bytes().unwrap(),
            vec![0xE5, 0x7F, 0x7F]
        );
        assert_eq!(
            MidiMessage::pitch_bend(0, 1).to_bytes().unwrap(),
            vec![0xE0, 0x01, 0x00]
        );
    }

    #[test]
    fn test_to_bytes_system() {
        assert_eq!(
            MidiMessage::sysex(vec![0x01, 0x02, 0x03]).to_bytes().unwrap(),
            vec![0xF0, 0x01, 0x02, 0x03, 0xF7]
        );
        assert_eq!(
            MidiMessage::sysex(Vec::new()).to_bytes().unwrap(),
            vec![0xF0, 0xF7]
        );
        assert_eq!(
            MidiMessage::SongPosition { beats: 0x2005 }.to_bytes().unwrap(),
            vec![0xF2, 0x05, 0x40]
        );
        assert_eq!(
            MidiMessage::SongSelect { song: 9 }.to_bytes().unwrap(),
            vec![0xF3, 9]
        );
        assert_eq!(MidiMessage::TuneRequest.to_bytes().unwrap(), vec![0xF6]);
        assert_eq!(MidiMessage::TimingClock.to_bytes().unwrap(), vec![0xF8]);
        assert_eq!(MidiMessage::SystemReset.to_bytes().unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_from_bytes_channel_voice() {
        assert_eq!(
            MidiMessage::from_bytes(&[0x90, 60, 100]).unwrap(),
            MidiMessage::note_on(0, 60, 100)
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0x83, 64, 10]).unwrap(),
            MidiMessage::note_off(3, 64, 10)
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xC1, 42]).unwrap(),
            MidiMessage::program_change(1, 42)
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xE0, 0x00, 0x40]).unwrap(),
            MidiMessage::pitch_bend(0, 0x2000)
        );
    }

    #[test]
    fn test_from_bytes_keeps_zero_velocity_note_on() {
        // Round-trip exactness: the logical note-off reading stays in the
        // is_note_off() accessor, not in the parse.
        let msg = MidiMessage::from_bytes(&[0x90, 60, 0]).unwrap();
        assert_eq!(msg, MidiMessage::note_on(0, 60, 0));
        assert!(msg.is_note_off());
    }

    #[test]
    fn test_from_bytes_sysex() {
        assert_eq!(
            MidiMessage::from_bytes(&[0xF0, 0x01, 0x02, 0xF7]).unwrap(),
            MidiMessage::sysex(vec![0x01, 0x02])
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF0, 0xF7]).unwrap(),
            MidiMessage::sysex(Vec::new())
        );
    }

    #[test]
    fn test_from_bytes_rejects_malformed() {
        assert_eq!(MidiMessage::from_bytes(&[]), Err(MalformedMessage::Empty));
        assert_eq!(
            MidiMessage::from_bytes(&[60]),
            Err(MalformedMessage::OrphanData(60))
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0x90, 60]),
            Err(MalformedMessage::Truncated {
                status: 0x90,
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0x90, 60, 100, 0]),
            Err(MalformedMessage::TrailingBytes(1))
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF4]),
            Err(MalformedMessage::UndefinedStatus(0xF4))
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF9]),
            Err(MalformedMessage::UndefinedStatus(0xF9))
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF7]),
            Err(MalformedMessage::StrayTerminator)
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF0, 0x01, 0x02]),
            Err(MalformedMessage::UnterminatedSysEx)
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF0, 0x01, 0x90, 0xF7]),
            Err(MalformedMessage::InterruptedSysEx(0x90))
        );
        assert_eq!(
            MidiMessage::from_bytes(&[0xF8, 0x00]),
            Err(MalformedMessage::TrailingBytes(1))
        );
        // A second status inside the data region reads as truncation.
        assert_eq!(
            MidiMessage::from_bytes(&[0x90, 0x80, 60]),
            Err(MalformedMessage::Truncated {
                status: 0x90,
                expected: 2,
                got: 0
            })
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        let mut out = Vec::new();
        assert_eq!(
            MidiMessage::note_on(16, 60, 100).encode_into(&mut out),
            Err(InvalidEvent::Channel(16))
        );
        assert_eq!(
            MidiMessage::note_on(0, 128, 100).encode_into(&mut out),
            Err(InvalidEvent::Data {
                what: "note",
                value: 128
            })
        );
        assert_eq!(
            MidiMessage::pitch_bend(0, 0x4000).encode_into(&mut out),
            Err(InvalidEvent::Wide {
                what: "pitch bend value",
                value: 0x4000
            })
        );
        assert_eq!(
            MidiMessage::sysex(vec![0x01, 0x80]).encode_into(&mut out),
            Err(InvalidEvent::SysExPayload(0x80))
        );
        assert_eq!(
            MidiMessage::SongSelect { song: 200 }.encode_into(&mut out),
            Err(InvalidEvent::Data {
                what: "song number",
                value: 200
            })
        );
        // Nothing was emitted by any failed encode.
        assert!(out.is_empty());
    }

    #[test]
    fn test_encode_into_appends() {
        let mut out = vec![0xF8];
        MidiMessage::note_on(0, 60, 100)
            .encode_into(&mut out)
            .unwrap();
        assert_eq!(out, vec![0xF8, 0x90, 60, 100]);
    }

    #[test]
    fn test_wire_len_matches_encoding() {
        let messages = [
            MidiMessage::note_on(0, 60, 100),
            MidiMessage::program_change(3, 10),
            MidiMessage::pitch_bend(9, 0x1234),
            MidiMessage::sysex(vec![1, 2, 3, 4]),
            MidiMessage::TimeCodeQuarterFrame { value: 0x35 },
            MidiMessage::SongPosition { beats: 77 },
            MidiMessage::TuneRequest,
            MidiMessage::ActiveSensing,
        ];
        for msg in &messages {
            assert_eq!(msg.wire_len(), msg.to_bytes().unwrap().len(), "{msg:?}");
        }
    }

    #[test]
    fn test_round_trip_all_kinds() {
        let mut messages = vec![
            MidiMessage::sysex(vec![0x7D, 0x01, 0x02, 0x03]),
            MidiMessage::sysex(Vec::new()),
            MidiMessage::TimeCodeQuarterFrame { value: 0x35 },
            MidiMessage::SongPosition { beats: 0 },
            MidiMessage::SongPosition { beats: 0x3FFF },
            MidiMessage::SongSelect { song: 127 },
            MidiMessage::TuneRequest,
            MidiMessage::TimingClock,
            MidiMessage::Start,
            MidiMessage::Continue,
            MidiMessage::Stop,
            MidiMessage::ActiveSensing,
            MidiMessage::SystemReset,
        ];
        for channel in 0..16 {
            for value in [0u8, 1, 64, 127] {
                messages.push(MidiMessage::note_on(channel, value, 127 - value));
                messages.push(MidiMessage::note_off(channel, value, value));
                messages.push(MidiMessage::poly_aftertouch(channel, value, value));
                messages.push(MidiMessage::control_change(channel, value, value));
                messages.push(MidiMessage::program_change(channel, value));
                messages.push(MidiMessage::channel_aftertouch(channel, value));
            }
            for bend in [0u16, 1, 0x2000, 0x3FFF] {
                messages.push(MidiMessage::pitch_bend(channel, bend));
            }
        }
        for msg in &messages {
            let bytes = msg.to_bytes().unwrap();
            assert_eq!(&MidiMessage::from_bytes(&bytes).unwrap(), msg, "{msg:?}");
        }
    }
}
