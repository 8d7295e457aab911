//! Engine facade: one handle for ports, subscriptions, and diagnostics.

mod builder;

pub use builder::MidiEngineBuilder;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{MidiBackend, PortDirection};
use crate::config::Ignore;
use crate::dispatcher::{Dispatcher, PortFilter, SubscriptionId};
use crate::error::{Error, Result};
use crate::event::{MidiEvent, PortId};
use crate::input::InputPort;
use crate::output::OutputPort;
use crate::registry::{PortDesc, PortRegistry};
use crate::stats::{EngineStats, SubscriberStats};

/// Cheaply cloneable handle to one MIDI engine.
///
/// All clones share the same backend, dispatcher, and counters. Dropping
/// the last clone shuts down event delivery; open port handles stay valid
/// until closed or dropped themselves.
#[derive(Clone)]
pub struct MidiEngine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    registry: PortRegistry,
    dispatcher: Arc<Dispatcher>,
    ignore: Ignore,
    next_port: AtomicU64,
}

impl EngineInner {
    pub(crate) fn new(
        backend: Arc<dyn MidiBackend>,
        dispatcher: Arc<Dispatcher>,
        ignore: Ignore,
    ) -> Self {
        Self {
            registry: PortRegistry::new(backend),
            dispatcher,
            ignore,
            next_port: AtomicU64::new(1),
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}

impl MidiEngine {
    pub fn builder() -> MidiEngineBuilder {
        MidiEngineBuilder::default()
    }

    /// Hardware engine with default settings.
    #[cfg(feature = "hardware")]
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub(crate) fn from_inner(inner: EngineInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    // ==================== Ports ====================

    /// Lists input ports. Starts a new input enumeration epoch: descriptors
    /// from earlier calls become stale.
    pub fn list_inputs(&self) -> Result<Vec<PortDesc>> {
        self.inner.registry.list(PortDirection::Input)
    }

    /// Lists output ports. Counterpart of [`list_inputs`](Self::list_inputs);
    /// the two directions age independently.
    pub fn list_outputs(&self) -> Result<Vec<PortDesc>> {
        self.inner.registry.list(PortDirection::Output)
    }

    /// Opens an input port from a current descriptor and starts decoding
    /// whatever it sends.
    pub fn open_input(&self, desc: &PortDesc) -> Result<InputPort> {
        if desc.direction != PortDirection::Input {
            return Err(Error::PortOpen(format!("'{}' is not an input port", desc.name)));
        }
        let raw = self.inner.registry.resolve(desc)?;
        InputPort::open(
            self.inner.registry.backend(),
            &self.inner.dispatcher,
            self.next_port_id(),
            &raw,
            self.inner.ignore,
        )
    }

    /// Opens an output port from a current descriptor.
    pub fn open_output(&self, desc: &PortDesc) -> Result<OutputPort> {
        if desc.direction != PortDirection::Output {
            return Err(Error::PortOpen(format!("'{}' is not an output port", desc.name)));
        }
        let raw = self.inner.registry.resolve(desc)?;
        let conn = self.inner.registry.backend().open_output(&raw)?;
        Ok(OutputPort::new(self.next_port_id(), raw.name, conn))
    }

    /// Opens every input whose name contains `pattern`, case-insensitively.
    /// An empty pattern matches everything. Matching nothing is not an
    /// error; the result is just empty.
    pub fn open_inputs_matching(&self, pattern: &str) -> Result<Vec<InputPort>> {
        let needle = pattern.to_lowercase();
        let mut opened = Vec::new();
        for desc in self.list_inputs()? {
            if desc.name.to_lowercase().contains(&needle) {
                opened.push(self.open_input(&desc)?);
            }
        }
        Ok(opened)
    }

    /// Creates a virtual input port other applications can connect to and
    /// send into. Fails with [`Error::UnsupportedOnPlatform`] where the
    /// backend cannot create ports (Windows MM).
    pub fn open_virtual_input(&self, name: &str) -> Result<InputPort> {
        InputPort::open_virtual(
            self.inner.registry.backend(),
            &self.inner.dispatcher,
            self.next_port_id(),
            name,
            self.inner.ignore,
        )
    }

    /// Creates a virtual output port other applications can read from.
    pub fn open_virtual_output(&self, name: &str) -> Result<OutputPort> {
        let conn = self.inner.registry.backend().open_virtual_output(name)?;
        Ok(OutputPort::new(self.next_port_id(), name.to_string(), conn))
    }

    // ==================== Subscriptions ====================

    /// Registers a callback for decoded events from the filtered ports.
    ///
    /// The callback runs on a dedicated worker thread, never on a driver
    /// thread. Events from one port arrive in the order the port sent
    /// them; a slow callback loses events per the engine's overflow policy
    /// instead of stalling the drivers.
    pub fn subscribe(
        &self,
        filter: PortFilter,
        callback: impl FnMut(MidiEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.inner.dispatcher.subscribe(filter, Box::new(callback))
    }

    /// Removes a subscription, discarding anything still queued for it.
    /// Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    // ==================== Diagnostics ====================

    /// Name of the transport in use ("alsa", "coremidi", "winmm", "jack",
    /// "mock").
    pub fn backend_name(&self) -> &str {
        self.inner.registry.backend().name()
    }

    /// Whether the backend can create virtual ports.
    pub fn supports_virtual_ports(&self) -> bool {
        self.inner.registry.backend().supports_virtual_ports()
    }

    /// Engine-wide counters.
    pub fn stats(&self) -> EngineStats {
        self.inner.dispatcher.stats()
    }

    /// Delivery counters for one subscription, `None` once unsubscribed.
    pub fn subscriber_stats(&self, id: SubscriptionId) -> Option<SubscriberStats> {
        self.inner.dispatcher.subscriber_stats(id)
    }

    fn next_port_id(&self) -> PortId {
        PortId::new(self.inner.next_port.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for MidiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiEngine")
            .field("backend", &self.backend_name())
            .finish_non_exhaustive()
    }
}
