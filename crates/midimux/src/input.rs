//! Input channels: one open port feeding decoded events to the dispatcher.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use midimux_msg::StreamDecoder;
use tracing::{debug, trace};

use crate::backend::{InputConnection, MidiBackend, RawInputCallback, RawPort};
use crate::config::Ignore;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::event::{MidiEvent, PortId};
use crate::stats::ChannelStats;

const STATE_OPEN: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// State shared between the port handle and its backend callback.
pub(crate) struct ChannelShared {
    port: PortId,
    name: String,
    state: AtomicU8,
    decoded: AtomicU64,
    malformed: AtomicU64,
    ignored: AtomicU64,
}

impl ChannelShared {
    pub(crate) fn new(port: PortId, name: String) -> Arc<Self> {
        Arc::new(Self {
            port,
            name,
            state: AtomicU8::new(STATE_OPEN),
            decoded: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
        })
    }

    fn stats(&self) -> ChannelStats {
        ChannelStats {
            decoded: self.decoded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

/// An open MIDI input port.
///
/// Exactly one handle exists per opened port. Raw buffers from the backend
/// run through a per-port stream decoder and the decoded events flow to the
/// engine's subscribers until the handle is closed or dropped. The handle
/// itself carries no event API; receiving happens through subscriptions.
pub struct InputPort {
    shared: Arc<ChannelShared>,
    dispatcher: Arc<Dispatcher>,
    conn: Option<Box<dyn InputConnection>>,
}

impl InputPort {
    pub(crate) fn open(
        backend: &Arc<dyn MidiBackend>,
        dispatcher: &Arc<Dispatcher>,
        port: PortId,
        raw: &RawPort,
        ignore: Ignore,
    ) -> Result<Self> {
        let shared = ChannelShared::new(port, raw.name.clone());
        // Register before the backend can fire the callback so the first
        // buffer is never published against an unknown port.
        dispatcher.register_channel(port, shared.clone());
        let callback = input_callback(shared.clone(), dispatcher.clone(), ignore);
        match backend.open_input(raw, callback) {
            Ok(conn) => {
                debug!(%port, name = %shared.name, "opened MIDI input");
                Ok(Self {
                    shared,
                    dispatcher: dispatcher.clone(),
                    conn: Some(conn),
                })
            }
            Err(err) => {
                dispatcher.remove_channel(port);
                Err(err)
            }
        }
    }

    pub(crate) fn open_virtual(
        backend: &Arc<dyn MidiBackend>,
        dispatcher: &Arc<Dispatcher>,
        port: PortId,
        name: &str,
        ignore: Ignore,
    ) -> Result<Self> {
        let shared = ChannelShared::new(port, name.to_string());
        dispatcher.register_channel(port, shared.clone());
        let callback = input_callback(shared.clone(), dispatcher.clone(), ignore);
        match backend.open_virtual_input(name, callback) {
            Ok(conn) => {
                debug!(%port, name = %shared.name, "opened virtual MIDI input");
                Ok(Self {
                    shared,
                    dispatcher: dispatcher.clone(),
                    conn: Some(conn),
                })
            }
            Err(err) => {
                dispatcher.remove_channel(port);
                Err(err)
            }
        }
    }

    pub fn id(&self) -> PortId {
        self.shared.port
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Decode counters for this channel.
    pub fn stats(&self) -> ChannelStats {
        self.shared.stats()
    }

    /// Closes the port.
    ///
    /// Blocks until the backend guarantees the callback cannot fire again.
    /// Once this returns, no event from this port reaches any subscriber:
    /// new buffers are gone with the connection, and events still queued are
    /// discarded at delivery time.
    pub fn close(mut self) {
        self.close_inner();
    }

    fn close_inner(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        self.shared.state.store(STATE_CLOSING, Ordering::Release);
        self.dispatcher.remove_channel(self.shared.port);
        conn.close();
        self.shared.state.store(STATE_CLOSED, Ordering::Release);
        debug!(port = %self.shared.port, name = %self.shared.name, "closed MIDI input");
    }
}

impl Drop for InputPort {
    fn drop(&mut self) {
        self.close_inner();
    }
}

impl std::fmt::Debug for InputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPort")
            .field("port", &self.shared.port)
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

/// Builds the buffer handler the backend drives. Owns the channel's stream
/// decoder; running status and partial messages live here, per port.
fn input_callback(
    shared: Arc<ChannelShared>,
    dispatcher: Arc<Dispatcher>,
    ignore: Ignore,
) -> RawInputCallback {
    let mut decoder = StreamDecoder::new();
    Box::new(move |timestamp, bytes| {
        if shared.state.load(Ordering::Acquire) != STATE_OPEN {
            return;
        }
        let port = shared.port;
        let before = decoder.malformed();
        decoder.feed(timestamp, bytes, |ts, message| {
            if !ignore.keeps(&message) {
                shared.ignored.fetch_add(1, Ordering::Relaxed);
                return;
            }
            shared.decoded.fetch_add(1, Ordering::Relaxed);
            dispatcher.publish(MidiEvent::new(port, ts, message));
        });
        let newly = decoder.malformed() - before;
        if newly > 0 {
            shared.malformed.fetch_add(newly, Ordering::Relaxed);
            dispatcher.note_malformed(newly);
            trace!(%port, count = newly, "discarded malformed MIDI bytes");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::backend::PortDirection;
    use crate::config::OverflowPolicy;
    use crate::dispatcher::PortFilter;
    use midimux_msg::MidiMessage;
    use std::time::Duration;

    fn open_first_input(
        mock: &Arc<MockBackend>,
        dispatcher: &Arc<Dispatcher>,
        ignore: Ignore,
    ) -> InputPort {
        let backend: Arc<dyn MidiBackend> = mock.clone();
        let raw = backend.enumerate(PortDirection::Input).unwrap().remove(0);
        InputPort::open(&backend, dispatcher, PortId::new(1), &raw, ignore).unwrap()
    }

    #[test]
    fn test_decoded_events_reach_subscriber() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        let port = open_first_input(&mock, &dispatcher, Ignore::default());

        let (tx, rx) = crossbeam_channel::unbounded();
        dispatcher.subscribe(
            PortFilter::All,
            Box::new(move |event: MidiEvent| {
                tx.send(event).ok();
            }),
        );

        assert!(mock.inject(0, 123, &[0x90, 60, 100]));
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.port, port.id());
        assert_eq!(event.timestamp_us, 123);
        assert_eq!(event.message, MidiMessage::note_on(0, 60, 100));
        assert_eq!(port.stats().decoded, 1);
    }

    #[test]
    fn test_ignore_filter_counts_instead_of_delivering() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        let ignore = Ignore {
            time: true,
            ..Ignore::default()
        };
        let port = open_first_input(&mock, &dispatcher, ignore);

        let (tx, rx) = crossbeam_channel::unbounded();
        dispatcher.subscribe(
            PortFilter::All,
            Box::new(move |event: MidiEvent| {
                tx.send(event.message).ok();
            }),
        );

        mock.inject(0, 0, &[0xF8, 0x90, 60, 100]);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            MidiMessage::note_on(0, 60, 100)
        );
        let stats = port.stats();
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.decoded, 1);
    }

    #[test]
    fn test_malformed_bytes_counted_and_stream_recovers() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        let port = open_first_input(&mock, &dispatcher, Ignore::default());

        let (tx, rx) = crossbeam_channel::unbounded();
        dispatcher.subscribe(
            PortFilter::All,
            Box::new(move |event: MidiEvent| {
                tx.send(event.message).ok();
            }),
        );

        // NoteOn truncated by the next status byte, then a healthy NoteOff.
        mock.inject(0, 0, &[0x90, 60, 0x80, 64, 20]);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            MidiMessage::note_off(0, 64, 20)
        );
        assert_eq!(port.stats().malformed, 1);
        assert_eq!(dispatcher.stats().malformed, 1);
    }

    #[test]
    fn test_close_unregisters_and_silences_port() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        let port = open_first_input(&mock, &dispatcher, Ignore::default());

        assert_eq!(dispatcher.stats().open_inputs, 1);
        port.close();
        assert_eq!(dispatcher.stats().open_inputs, 0);
        assert!(!mock.inject(0, 0, &[0xF8]));
    }

    #[test]
    fn test_drop_closes_like_close() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        {
            let _port = open_first_input(&mock, &dispatcher, Ignore::default());
            assert_eq!(dispatcher.stats().open_inputs, 1);
        }
        assert_eq!(dispatcher.stats().open_inputs, 0);
        assert!(!mock.inject(0, 0, &[0xF8]));
    }

    #[test]
    fn test_failed_open_leaves_no_channel_behind() {
        let mock = Arc::new(MockBackend::new().with_inputs(["keys"]));
        mock.set_input_busy(0, true);
        let dispatcher = Arc::new(Dispatcher::new(16, OverflowPolicy::DropOldest));
        let backend: Arc<dyn MidiBackend> = mock.clone();
        let raw = backend.enumerate(PortDirection::Input).unwrap().remove(0);
        assert!(InputPort::open(&backend, &dispatcher, PortId::new(1), &raw, Ignore::default()).is_err());
        assert_eq!(dispatcher.stats().open_inputs, 0);
    }
}
