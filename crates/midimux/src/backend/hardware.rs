//! Hardware transport over midir (ALSA, CoreMIDI, WinMM, JACK).

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use super::{InputConnection, MidiBackend, OutputConnection, PortDirection, RawInputCallback, RawPort};
use crate::error::{Error, Result};

/// The platform MIDI backend.
///
/// Each operation creates a short-lived midir client to query or connect;
/// long-lived driver state exists only inside open connections, never at
/// module level, so independent engines cannot interfere with each other.
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    /// `client_name` is how this process appears to other MIDI software.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn probe_input(&self) -> Result<MidiInput> {
        let mut input = MidiInput::new(&self.client_name)?;
        // Receive everything; filtering happens engine-side where it is
        // configurable and counted.
        input.ignore(midir::Ignore::None);
        Ok(input)
    }

    fn probe_output(&self) -> Result<MidiOutput> {
        Ok(MidiOutput::new(&self.client_name)?)
    }
}

impl MidiBackend for MidirBackend {
    fn name(&self) -> &str {
        if cfg!(all(target_os = "linux", feature = "jack")) {
            "jack"
        } else if cfg!(target_os = "linux") {
            "alsa"
        } else if cfg!(target_os = "macos") {
            "coremidi"
        } else if cfg!(target_os = "windows") {
            "winmm"
        } else {
            "midir"
        }
    }

    fn enumerate(&self, direction: PortDirection) -> Result<Vec<RawPort>> {
        match direction {
            PortDirection::Input => {
                let input = self.probe_input()?;
                Ok(input
                    .ports()
                    .iter()
                    .enumerate()
                    .map(|(index, port)| RawPort {
                        index,
                        name: input
                            .port_name(port)
                            .unwrap_or_else(|_| format!("input {index}")),
                        is_virtual: false,
                    })
                    .collect())
            }
            PortDirection::Output => {
                let output = self.probe_output()?;
                Ok(output
                    .ports()
                    .iter()
                    .enumerate()
                    .map(|(index, port)| RawPort {
                        index,
                        name: output
                            .port_name(port)
                            .unwrap_or_else(|_| format!("output {index}")),
                        is_virtual: false,
                    })
                    .collect())
            }
        }
    }

    fn open_input(
        &self,
        port: &RawPort,
        mut callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        let input = self.probe_input()?;
        let ports = input.ports();
        let target = ports.get(port.index).ok_or_else(|| {
            Error::PortOpen(format!("port '{}' is no longer present", port.name))
        })?;
        // Indices shift when hardware comes and goes between enumeration
        // and open; the name check catches that.
        let current = input
            .port_name(target)
            .map_err(|err| Error::PortOpen(err.to_string()))?;
        if current != port.name {
            return Err(Error::PortOpen(format!(
                "port {} is now '{current}', expected '{}'",
                port.index, port.name
            )));
        }
        let conn = input.connect(
            target,
            &format!("{} in", self.client_name),
            move |timestamp, bytes, _: &mut ()| callback(timestamp, bytes),
            (),
        )?;
        Ok(Box::new(MidirInputConn { conn }))
    }

    fn open_output(&self, port: &RawPort) -> Result<Box<dyn OutputConnection>> {
        let output = self.probe_output()?;
        let ports = output.ports();
        let target = ports.get(port.index).ok_or_else(|| {
            Error::PortOpen(format!("port '{}' is no longer present", port.name))
        })?;
        let current = output
            .port_name(target)
            .map_err(|err| Error::PortOpen(err.to_string()))?;
        if current != port.name {
            return Err(Error::PortOpen(format!(
                "port {} is now '{current}', expected '{}'",
                port.index, port.name
            )));
        }
        let conn = output.connect(target, &format!("{} out", self.client_name))?;
        Ok(Box::new(MidirOutputConn { conn }))
    }

    fn open_virtual_input(
        &self,
        name: &str,
        callback: RawInputCallback,
    ) -> Result<Box<dyn InputConnection>> {
        #[cfg(unix)]
        {
            use midir::os::unix::VirtualInput;
            let input = self.probe_input()?;
            let mut callback = callback;
            let conn = input.create_virtual(
                name,
                move |timestamp, bytes, _: &mut ()| callback(timestamp, bytes),
                (),
            )?;
            Ok(Box::new(MidirInputConn { conn }))
        }
        #[cfg(not(unix))]
        {
            let _ = (name, callback);
            Err(Error::UnsupportedOnPlatform(format!(
                "virtual ports on the {} backend",
                self.name()
            )))
        }
    }

    fn open_virtual_output(&self, name: &str) -> Result<Box<dyn OutputConnection>> {
        #[cfg(unix)]
        {
            use midir::os::unix::VirtualOutput;
            let output = self.probe_output()?;
            let conn = output.create_virtual(name)?;
            Ok(Box::new(MidirOutputConn { conn }))
        }
        #[cfg(not(unix))]
        {
            let _ = name;
            Err(Error::UnsupportedOnPlatform(format!(
                "virtual ports on the {} backend",
                self.name()
            )))
        }
    }

    fn supports_virtual_ports(&self) -> bool {
        cfg!(unix)
    }
}

struct MidirInputConn {
    conn: MidiInputConnection<()>,
}

impl InputConnection for MidirInputConn {
    fn close(self: Box<Self>) {
        // midir joins the driver thread here, so the callback cannot fire
        // once this returns.
        self.conn.close();
    }
}

struct MidirOutputConn {
    conn: MidiOutputConnection,
}

impl OutputConnection for MidirOutputConn {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.conn.send(bytes).map_err(|err| Error::Write {
            written: 0,
            reason: err.to_string(),
        })
    }

    fn close(self: Box<Self>) {
        self.conn.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_is_stable() {
        let backend = MidirBackend::new("midimux-test");
        assert!(!backend.name().is_empty());
        assert_eq!(backend.name(), backend.name());
    }

    // Enumeration either works or reports the subsystem missing; anything
    // else is a bug. Runs without asserting on host hardware.
    #[test]
    fn test_enumerate_reports_cleanly_without_hardware() {
        let backend = MidirBackend::new("midimux-test");
        match backend.enumerate(PortDirection::Input) {
            Ok(_) => {}
            Err(Error::BackendUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
