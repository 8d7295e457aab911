//! Engine construction.

use std::sync::Arc;

use tracing::debug;

use super::{EngineInner, MidiEngine};
use crate::backend::MidiBackend;
use crate::config::{Ignore, OverflowPolicy};
use crate::dispatcher::Dispatcher;
use crate::error::Result;

const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Builder for [`MidiEngine`].
///
/// ```ignore
/// let engine = MidiEngine::builder()
///     .client_name("sampler")
///     .queue_capacity(512)
///     .overflow_policy(OverflowPolicy::DropNewest)
///     .build()?;
/// ```
pub struct MidiEngineBuilder {
    client_name: String,
    queue_capacity: usize,
    overflow: OverflowPolicy,
    ignore: Ignore,
    backend: Option<Arc<dyn MidiBackend>>,
}

impl Default for MidiEngineBuilder {
    fn default() -> Self {
        Self {
            client_name: "midimux".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
            ignore: Ignore::default(),
            backend: None,
        }
    }
}

impl MidiEngineBuilder {
    /// Name this process shows to other MIDI software.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Capacity of each subscriber's event queue. Clamped to at least 1.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// What to do when a subscriber queue is full.
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Message categories to filter out on every input.
    pub fn ignore(mut self, ignore: Ignore) -> Self {
        self.ignore = ignore;
        self
    }

    /// Replaces the platform backend, for loopback wiring and tests.
    pub fn backend(mut self, backend: Arc<dyn MidiBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<MidiEngine> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => default_backend(&self.client_name)?,
        };
        let dispatcher = Arc::new(Dispatcher::new(self.queue_capacity.max(1), self.overflow));
        debug!(
            backend = backend.name(),
            queue_capacity = self.queue_capacity.max(1),
            "MIDI engine ready"
        );
        Ok(MidiEngine::from_inner(EngineInner::new(
            backend, dispatcher, self.ignore,
        )))
    }
}

#[cfg(feature = "hardware")]
fn default_backend(client_name: &str) -> Result<Arc<dyn MidiBackend>> {
    Ok(Arc::new(crate::backend::MidirBackend::new(client_name)))
}

#[cfg(not(feature = "hardware"))]
fn default_backend(_client_name: &str) -> Result<Arc<dyn MidiBackend>> {
    Err(crate::error::Error::BackendUnavailable(
        "no hardware backend compiled in; supply one with MidiEngineBuilder::backend".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[test]
    fn test_build_with_mock_backend() {
        let engine = MidiEngine::builder()
            .backend(Arc::new(MockBackend::new().with_inputs(["keys"])))
            .build()
            .unwrap();
        assert_eq!(engine.backend_name(), "mock");
        assert_eq!(engine.list_inputs().unwrap().len(), 1);
    }

    #[test]
    fn test_queue_capacity_clamps_to_one() {
        let engine = MidiEngine::builder()
            .backend(Arc::new(MockBackend::new()))
            .queue_capacity(0)
            .build();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_settings_are_fluent() {
        let builder = MidiEngineBuilder::default()
            .client_name("test")
            .queue_capacity(8)
            .overflow_policy(OverflowPolicy::DropNewest)
            .ignore(Ignore {
                sysex: true,
                ..Ignore::default()
            });
        assert_eq!(builder.client_name, "test");
        assert_eq!(builder.queue_capacity, 8);
        assert_eq!(builder.overflow, OverflowPolicy::DropNewest);
        assert!(builder.ignore.sysex);
    }
}
