//! In-process backend for tests and loopback wiring.
//!
//! Fully deterministic: ports are configured up front (or added later to
//! simulate hot-plugging), raw buffers are injected as if a driver thread
//! delivered them, and everything written to an output is recorded for
//! inspection. Close honors the same quiescence contract real backends
//! provide: it blocks until no injected callback is still running.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::{InputConnection, MidiBackend, OutputConnection, PortDirection, RawInputCallback, RawPort};
use crate::error::{Error, Result};

/// Deterministic in-process MIDI backend.
///
/// ```ignore
/// let mock = Arc::new(MockBackend::new().with_inputs(["keys"]).with_outputs(["synth"]));
/// let engine = MidiEngine::builder().backend(mock.clone()).build()?;
/// mock.inject(0, 1_000, &[0x90, 60, 100]);
/// ```
pub struct MockBackend {
    state: Mutex<MockState>,
    unavailable: bool,
    virtual_ports: bool,
    callback_delay: Mutex<Duration>,
}

#[derive(Default)]
struct MockState {
    inputs: Vec<InputSlot>,
    outputs: Vec<OutputSlot>,
}

struct InputSlot {
    name: String,
    is_virtual: bool,
    busy: bool,
    core: Option<Arc<MockInputCore>>,
}

struct OutputSlot {
    name: String,
    is_virtual: bool,
    busy: bool,
    core: Option<Arc<MockOutputCore>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            unavailable: false,
            virtual_ports: true,
            callback_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// A backend whose every operation fails, as when no MIDI subsystem is
    /// running on the host.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn with_inputs(self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        {
            let mut state = self.state.lock();
            for name in names {
                state.inputs.push(InputSlot::hardware(name.into()));
            }
        }
        self
    }

    pub fn with_outputs(self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        {
            let mut state = self.state.lock();
            for name in names {
                state.outputs.push(OutputSlot::hardware(name.into()));
            }
        }
        self
    }

    /// Disables virtual port creation, as on Windows MM.
    pub fn without_virtual_ports(mut self) -> Self {
        self.virtual_ports = false;
        self
    }

    /// Adds an input port at runtime, simulating a device being plugged in.
    /// Returns its index in the next enumeration.
    pub fn add_input(&self, name: impl Into<String>) -> usize {
        let mut state = self.state.lock();
        state.inputs.push(InputSlot::hardware(name.into()));
        state.inputs.len() - 1
    }

    /// Adds an output port at runtime. Returns its index.
    pub fn add_output(&self, name: impl Into<String>) -> usize {
        let mut state = self.state.lock();
        state.outputs.push(OutputSlot::hardware(name.into()));
        state.outputs.len() - 1
    }

    /// Removes an input port, simulating an unplug. Later ports shift down,
    /// which is exactly the index instability stale descriptors guard
    /// against.
    pub fn remove_input(&self, index: usize) {
        let mut state = self.state.lock();
        if index < state.inputs.len() {
            state.inputs.remove(index);
        }
    }

    /// Marks an input as exclusively held by another application.
    pub fn set_input_busy(&self, index: usize, busy: bool) {
        if let Some(slot) = self.state.lock().inputs.get_mut(index) {
            slot.busy = busy;
        }
    }

    /// Makes every injected callback sleep this long before running, to
    /// widen the window where a callback is in flight.
    pub fn set_callback_delay(&self, delay: Duration) {
        *self.callback_delay.lock() = delay;
    }

    /// Delivers raw bytes to an open input, synchronously on the calling
    /// thread, exactly as a driver thread would. Returns false when the
    /// port is not open or the connection has closed.
    pub fn inject(&self, input: usize, timestamp: u64, bytes: &[u8]) -> bool {
        if self.unavailable {
            return false;
        }
        let core = {
            let state = self.state.lock();
            match state.inputs.get(input).and_then(|slot| slot.core.clone()) {
                Some(core) => core,
                None => return false,
            }
        };
        let delay = *self.callback_delay.lock();
        core.deliver(timestamp, bytes, delay)
    }

    /// Number of injected callbacks currently running on an input.
    pub fn in_flight(&self, input: usize) -> usize {
        let state = self.state.lock();
        state
            .inputs
            .get(input)
            .and_then(|slot| slot.core.as_ref())
            .map_or(0, |core| core.in_flight())
    }

    /// Everything written to an output since it was opened.
    pub fn written(&self, output: usize) -> Vec<Vec<u8>> {
        let state = self.state.lock();
        state
            .outputs
            .get(output)
            .and_then(|slot| slot.core.as_ref())
            .map_or_else(Vec::new, |core| core.written.lock().clone())
    }

    /// Lets `count` more writes succeed on an open output, then fails every
    /// write after that. No effect unless the port is open.
    pub fn fail_writes_after(&self, output: usize, count: usize) {
        let state = self.state.lock();
        if let Some(core) = state.outputs.get(output).and_then(|slot| slot.core.as_ref()) {
            core.fail_after.store(count, Ordering::Release);
        }
    }

    /// Kills an open output connection in place, simulating an unplug while
    /// the handle is still held. Subsequent writes fail with `PortClosed`.
    pub fn invalidate_output(&self, output: usize) {
        let state = self.state.lock();
        if let Some(core) = state.outputs.get(output).and_then(|slot| slot.core.as_ref()) {
            core.closed.store(true, Ordering::Release);
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(Error::BackendUnavailable(
                "mock backend configured unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSlot {
    fn hardware(name: String) -> Self {
        Self {
            name,
            is_virtual: false,
            busy: false,
            core: None,
        }
    }

    fn openable(&self) -> Result<()> {
        if self.busy {
            return Err(Error::PortOpen(format!(
                "port '{}' is in use by another client",
                self.name
            )));
        }
        if self.core.as_ref().is_some_and(|core| !core.is_closed()) {
            return Err(Error::PortOpen(format!("port '{}' is already open", self.name)));
        }
        Ok(())
    }
}

impl OutputSlot {
    fn hardware(name: String) -> Self {
        Self {
            name,
            is_virtual: false,
            busy: false,
            core: None,
        }
    }

    fn openable(&self) -> Result<()> {
        if self.busy {
            return Err(Error::PortOpen(format!(
                "port '{}' is in use by another client",
                self.name
            )));
        }
        if self.core.as_ref().is_some_and(|core| !core.closed.load(Ordering::Acquire)) {
            return Err(Error::PortOpen(format!("port '{}' is already open", self.name)));
        }
        Ok(())
    }
}

impl MidiBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn enumerate(&self, direction: PortDirection) -> Result<Vec<RawPort>> {
        self.check_available()?;
        let state = self.state.lock();
        let ports = match direction {
            PortDirection::Input => state
                .inputs
                .iter()
                .enumerate()
                .map(|(index, slot)| RawPort {
                    index,
                    name: slot.name.clone(),
                    is_virtual: slot.is_virtual,
                })
                .collect(),
            PortDirection::Output => state
                .outputs
                .iter()
                .enumerate()
                .map(|(index, slot)| RawPort {
                    index,
                    name: slot.name.clone(),
                    is_virtual: slot.is_virtual,
                })
                .collect(),
        };
        Ok(ports)
    }

    fn open_input(
        &self,
        port: &RawPort,
        callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        self.check_available()?;
        let mut state = self.state.lock();
        let slot = state
            .inputs
            .get_mut(port.index)
            .filter(|slot| slot.name == port.name)
            .ok_or_else(|| Error::PortOpen(format!("port '{}' is no longer present", port.name)))?;
        slot.openable()?;
        let core = Arc::new(MockInputCore::new(callback));
        slot.core = Some(core.clone());
        Ok(Box::new(MockInputConn { core }))
    }

    fn open_output(&self, port: &RawPort) -> Result<Box<dyn OutputConnection>> {
        self.check_available()?;
        let mut state = self.state.lock();
        let slot = state
            .outputs
            .get_mut(port.index)
            .filter(|slot| slot.name == port.name)
            .ok_or_else(|| Error::PortOpen(format!("port '{}' is no longer present", port.name)))?;
        slot.openable()?;
        let core = Arc::new(MockOutputCore::new());
        slot.core = Some(core.clone());
        Ok(Box::new(MockOutputConn { core }))
    }

    fn open_virtual_input(
        &self,
        name: &str,
        callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        self.check_available()?;
        if !self.virtual_ports {
            return Err(Error::UnsupportedOnPlatform(
                "virtual ports on the mock backend".to_string(),
            ));
        }
        let core = Arc::new(MockInputCore::new(callback));
        let mut state = self.state.lock();
        state.inputs.push(InputSlot {
            name: name.to_string(),
            is_virtual: true,
            busy: false,
            core: Some(core.clone()),
        });
        Ok(Box::new(MockInputConn { core }))
    }

    fn open_virtual_output(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        self.check_available()?;
        if !self.virtual_ports {
            return Err(Error::UnsupportedOnPlatform(
                "virtual ports on the mock backend".to_string(),
            ));
        }
        let core = Arc::new(MockOutputCore::new());
        let mut state = self.state.lock();
        state.outputs.push(OutputSlot {
            name: name.to_string(),
            is_virtual: true,
            busy: false,
            core: Some(core.clone()),
        });
        Ok(Box::new(MockOutputConn { core }))
    }

    fn supports_virtual_ports(&self) -> bool {
        self.virtual_ports
    }
}

// ==================== Input plumbing ====================

struct MockInputCore {
    callback: Mutex<Option<RawInputCallback>>,
    flight: Mutex<Flight>,
    quiesced: Condvar,
}

#[derive(Default)]
struct Flight {
    closed: bool,
    in_flight: usize,
}

impl MockInputCore {
    fn new(callback: RawInputCallback) -> Self {
        Self {
            callback: Mutex::new(Some(callback)),
            flight: Mutex::new(Flight::default()),
            quiesced: Condvar::new(),
        }
    }

    fn deliver(&self, timestamp: u64, bytes: &[u8], delay: Duration) -> bool {
        {
            let mut flight = self.flight.lock();
            if flight.closed {
                return false;
            }
            flight.in_flight += 1;
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        {
            let mut callback = self.callback.lock();
            if let Some(cb) = callback.as_mut() {
                cb(timestamp, bytes);
            }
        }
        let mut flight = self.flight.lock();
        flight.in_flight -= 1;
        if flight.in_flight == 0 {
            self.quiesced.notify_all();
        }
        true
    }

    fn close(&self) {
        let mut flight = self.flight.lock();
        flight.closed = true;
        while flight.in_flight > 0 {
            self.quiesced.wait(&mut flight);
        }
        drop(flight);
        // Only now is it safe to drop the callback and whatever it captured.
        *self.callback.lock() = None;
    }

    fn is_closed(&self) -> bool {
        self.flight.lock().closed
    }

    fn in_flight(&self) -> usize {
        self.flight.lock().in_flight
    }
}

struct MockInputConn {
    core: Arc<MockInputCore>,
}

impl InputConnection for MockInputConn {
    fn close(self: Box<Self>) {
        self.core.close();
    }
}

// ==================== Output plumbing ====================

struct MockOutputCore {
    written: Mutex<Vec<Vec<u8>>>,
    fail_after: AtomicUsize,
    closed: AtomicBool,
}

impl MockOutputCore {
    fn new() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            fail_after: AtomicUsize::new(usize::MAX),
            closed: AtomicBool::new(false),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::PortClosed);
        }
        let mut written = self.written.lock();
        if written.len() >= self.fail_after.load(Ordering::Acquire) {
            return Err(Error::Write {
                written: 0,
                reason: "simulated device failure".to_string(),
            });
        }
        written.push(bytes.to_vec());
        Ok(())
    }
}

struct MockOutputConn {
    core: Arc<MockOutputCore>,
}

impl OutputConnection for MockOutputConn {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.core.write(bytes)
    }

    fn close(self: Box<Self>) {
        self.core.closed.store(true, Ordering::Release);
    }
}
