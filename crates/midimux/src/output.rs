//! Output ports: single and batched message writes.

use std::sync::atomic::{AtomicU64, Ordering};

use midimux_msg::MidiMessage;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::backend::OutputConnection;
use crate::error::{Error, Result};
use crate::event::PortId;

/// An open MIDI output port.
///
/// Writes run on the calling thread under a per-port lock, so batches from
/// different threads interleave at message granularity at worst and one
/// port's traffic never waits on another port's.
pub struct OutputPort {
    id: PortId,
    name: String,
    conn: Mutex<Option<Box<dyn OutputConnection>>>,
    sent: AtomicU64,
}

impl OutputPort {
    pub(crate) fn new(id: PortId, name: String, conn: Box<dyn OutputConnection>) -> Self {
        debug!(port = %id, name = %name, "opened MIDI output");
        Self {
            id,
            name,
            conn: Mutex::new(Some(conn)),
            sent: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Messages successfully written since open.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Validates, encodes, and writes one message.
    pub fn send(&self, message: &MidiMessage) -> Result<()> {
        let bytes = message.to_bytes()?;
        let mut conn = self.conn.lock();
        let conn = conn.as_mut().ok_or(Error::PortClosed)?;
        conn.write(&bytes)?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes a batch in order as one locked operation.
    ///
    /// Every message is validated and encoded before the first byte goes
    /// out, so an invalid message anywhere in the batch means nothing is
    /// written. The batch is not transactional past that point: if the
    /// backend fails mid-way, [`Error::Write`] reports how many messages
    /// were already on the wire, and those are neither retried nor rolled
    /// back. Returns the number written, which on success is the batch
    /// length.
    pub fn send_batch(&self, messages: &[MidiMessage]) -> Result<usize> {
        let mut encoded = Vec::with_capacity(messages.len());
        for message in messages {
            encoded.push(message.to_bytes()?);
        }

        let mut conn = self.conn.lock();
        let conn = conn.as_mut().ok_or(Error::PortClosed)?;
        for (written, bytes) in encoded.iter().enumerate() {
            if let Err(err) = conn.write(bytes) {
                self.sent.fetch_add(written as u64, Ordering::Relaxed);
                let reason = match err {
                    Error::Write { reason, .. } => reason,
                    other => other.to_string(),
                };
                return Err(Error::Write { written, reason });
            }
        }
        self.sent.fetch_add(messages.len() as u64, Ordering::Relaxed);
        trace!(port = %self.id, count = messages.len(), "wrote MIDI batch");
        Ok(messages.len())
    }

    /// Writes pre-encoded bytes as-is, for data the message types do not
    /// model. The caller owns wire correctness; an empty slice is a no-op.
    pub fn send_raw(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let conn = conn.as_mut().ok_or(Error::PortClosed)?;
        conn.write(bytes)?;
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Closes the port, releasing the backend handle.
    pub fn close(mut self) {
        self.close_inner();
    }

    fn close_inner(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            conn.close();
            debug!(port = %self.id, name = %self.name, "closed MIDI output");
        }
    }
}

impl Drop for OutputPort {
    fn drop(&mut self) {
        self.close_inner();
    }
}

impl std::fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPort")
            .field("port", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MidiBackend, MockBackend, PortDirection};
    use std::sync::Arc;

    fn open_output(mock: &Arc<MockBackend>) -> OutputPort {
        let raw = mock.enumerate(PortDirection::Output).unwrap().remove(0);
        let conn = mock.open_output(&raw).unwrap();
        OutputPort::new(PortId::new(1), raw.name, conn)
    }

    #[test]
    fn test_send_encodes_onto_wire() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);

        port.send(&MidiMessage::note_on(2, 60, 100)).unwrap();
        port.send(&MidiMessage::pitch_bend(2, 0x2000)).unwrap();
        assert_eq!(
            mock.written(0),
            vec![vec![0x92, 60, 100], vec![0xE2, 0x00, 0x40]]
        );
        assert_eq!(port.sent(), 2);
    }

    #[test]
    fn test_invalid_message_writes_nothing() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);

        let err = port.send(&MidiMessage::note_on(16, 60, 100)).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
        assert!(mock.written(0).is_empty());
        assert_eq!(port.sent(), 0);
    }

    #[test]
    fn test_batch_validates_before_any_write() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);

        let batch = [
            MidiMessage::note_on(0, 60, 100),
            MidiMessage::control_change(0, 200, 1),
            MidiMessage::note_off(0, 60, 0),
        ];
        let err = port.send_batch(&batch).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
        assert!(mock.written(0).is_empty());
    }

    #[test]
    fn test_batch_reports_written_prefix_on_backend_failure() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);
        mock.fail_writes_after(0, 1);

        let batch = [
            MidiMessage::note_on(0, 60, 100),
            MidiMessage::note_on(0, 64, 100),
            MidiMessage::note_on(0, 67, 100),
        ];
        match port.send_batch(&batch) {
            Err(Error::Write { written, .. }) => assert_eq!(written, 1),
            other => panic!("expected write error, got {other:?}"),
        }
        // Exactly the prefix reached the wire, exactly once.
        assert_eq!(mock.written(0), vec![vec![0x90, 60, 100]]);
        assert_eq!(port.sent(), 1);
    }

    #[test]
    fn test_successful_batch_returns_length() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);

        let batch = [
            MidiMessage::program_change(9, 40),
            MidiMessage::channel_aftertouch(9, 64),
        ];
        assert_eq!(port.send_batch(&batch).unwrap(), 2);
        assert_eq!(mock.written(0), vec![vec![0xC9, 40], vec![0xD9, 64]]);
    }

    #[test]
    fn test_empty_batch_is_ok() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);
        assert_eq!(port.send_batch(&[]).unwrap(), 0);
        assert!(mock.written(0).is_empty());
    }

    #[test]
    fn test_send_raw_passes_bytes_through() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);

        port.send_raw(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]).unwrap();
        port.send_raw(&[]).unwrap();
        assert_eq!(mock.written(0), vec![vec![0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]]);
        assert_eq!(port.sent(), 1);
    }

    #[test]
    fn test_invalidated_connection_surfaces_port_closed() {
        let mock = Arc::new(MockBackend::new().with_outputs(["synth"]));
        let port = open_output(&mock);
        mock.invalidate_output(0);
        assert!(matches!(
            port.send(&MidiMessage::note_on(0, 60, 100)),
            Err(Error::PortClosed)
        ));
    }
}
