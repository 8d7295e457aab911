//! Port enumeration and descriptor resolution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{MidiBackend, PortDirection, RawPort};
use crate::error::{Error, Result};

/// A MIDI port as seen during one enumeration pass.
///
/// Descriptors go stale: listing a direction again starts a new epoch, and
/// opening with a descriptor from an older epoch fails with
/// [`Error::PortOpen`]. Hardware unplugged since the listing is caught the
/// same way. A stale descriptor must be re-acquired by listing again, never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDesc {
    pub(crate) index: usize,
    pub name: String,
    pub direction: PortDirection,
    pub is_virtual: bool,
    pub(crate) epoch: u64,
}

impl PortDesc {
    /// Position the backend reported this port at. Stable only within the
    /// enumeration pass that produced this descriptor.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Tracks enumeration epochs per direction and resolves descriptors back to
/// backend ports.
pub(crate) struct PortRegistry {
    backend: Arc<dyn MidiBackend>,
    input_epoch: AtomicU64,
    output_epoch: AtomicU64,
}

impl PortRegistry {
    pub(crate) fn new(backend: Arc<dyn MidiBackend>) -> Self {
        Self {
            backend,
            input_epoch: AtomicU64::new(0),
            output_epoch: AtomicU64::new(0),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn MidiBackend> {
        &self.backend
    }

    /// Enumerates one direction, starting a new epoch for it. Descriptors
    /// from earlier passes of the same direction become stale; the other
    /// direction is untouched.
    pub(crate) fn list(&self, direction: PortDirection) -> Result<Vec<PortDesc>> {
        let raw = self.backend.enumerate(direction)?;
        let epoch = self.epoch_counter(direction).fetch_add(1, Ordering::AcqRel) + 1;
        debug!(?direction, epoch, ports = raw.len(), "enumerated MIDI ports");
        Ok(raw
            .into_iter()
            .map(|port| PortDesc {
                index: port.index,
                name: port.name,
                direction,
                is_virtual: port.is_virtual,
                epoch,
            })
            .collect())
    }

    /// Checks that a descriptor is from the current epoch and that its port
    /// is still present under the same name, and returns the backend's
    /// current view of it.
    pub(crate) fn resolve(&self, desc: &PortDesc) -> Result<RawPort> {
        let current = self.epoch_counter(desc.direction).load(Ordering::Acquire);
        if desc.epoch != current {
            return Err(Error::PortOpen(format!(
                "descriptor for '{}' is stale (enumeration {} superseded by {}); list ports again",
                desc.name, desc.epoch, current
            )));
        }
        let ports = self.backend.enumerate(desc.direction)?;
        match ports.into_iter().nth(desc.index) {
            Some(port) if port.name == desc.name => Ok(port),
            Some(port) => Err(Error::PortOpen(format!(
                "port {} is now '{}', expected '{}'",
                desc.index, port.name, desc.name
            ))),
            None => Err(Error::PortOpen(format!(
                "port '{}' is no longer present",
                desc.name
            ))),
        }
    }

    fn epoch_counter(&self, direction: PortDirection) -> &AtomicU64 {
        match direction {
            PortDirection::Input => &self.input_epoch,
            PortDirection::Output => &self.output_epoch,
        }
    }
}
