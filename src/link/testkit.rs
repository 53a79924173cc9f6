//! Scripted stand-ins for the serial driver, shared by the link unit
//! tests. A [`StubBus`] is the backplane: bytes pushed onto it come out
//! of the next port read, and everything the link writes lands on it
//! for inspection.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::link::manager::LinkSettings;
use crate::link::port::{DevicePort, PortDriver};

/// Production settings with the timings shrunk so tests finish fast.
pub(crate) fn test_settings() -> LinkSettings {
    LinkSettings {
        port: "/dev/ttySTUB".to_string(),
        baud_rate: 9600,
        reconnect_interval: Duration::from_millis(40),
        response_timeout: Duration::from_millis(150),
        response_grace: Duration::from_millis(50),
        buffer_capacity: 100,
        history_capacity: 50,
    }
}

#[derive(Default)]
struct BusState {
    pending: VecDeque<u8>,
    written: Vec<u8>,
    opens: usize,
    opened_ports: Vec<String>,
    fail_open: bool,
    fail_next_probe: bool,
    fail_next_read: bool,
    fail_next_write: bool,
}

#[derive(Clone, Default)]
pub(crate) struct StubBus {
    state: Arc<Mutex<BusState>>,
}

impl StubBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a complete device reply, newline included.
    pub(crate) fn push_line(&self, line: &str) {
        let mut state = self.state.lock();
        state.pending.extend(line.as_bytes());
        state.pending.push_back(b'\n');
    }

    pub(crate) fn push_raw(&self, bytes: &[u8]) {
        self.state.lock().pending.extend(bytes);
    }

    pub(crate) fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    pub(crate) fn fail_next_probe(&self) {
        self.state.lock().fail_next_probe = true;
    }

    pub(crate) fn fail_next_read(&self) {
        self.state.lock().fail_next_read = true;
    }

    pub(crate) fn fail_next_write(&self) {
        self.state.lock().fail_next_write = true;
    }

    /// How many times a port was successfully opened.
    pub(crate) fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// Port names passed to every successful open, in order.
    pub(crate) fn opened_ports(&self) -> Vec<String> {
        self.state.lock().opened_ports.clone()
    }

    /// Lines written to the device so far, without their newlines.
    pub(crate) fn written_lines(&self) -> Vec<String> {
        let state = self.state.lock();
        String::from_utf8_lossy(&state.written)
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub(crate) struct StubDriver {
    bus: StubBus,
}

impl StubDriver {
    pub(crate) fn new(bus: StubBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PortDriver for StubDriver {
    async fn open(&self, port: &str, _baud_rate: u32) -> io::Result<Box<dyn DevicePort>> {
        let mut state = self.bus.state.lock();
        if state.fail_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }
        state.opens += 1;
        state.opened_ports.push(port.to_string());
        drop(state);

        Ok(Box::new(StubPort {
            bus: self.bus.clone(),
        }))
    }

    fn list_ports(&self) -> io::Result<Vec<String>> {
        Ok(vec!["/dev/ttySTUB".to_string()])
    }
}

struct StubPort {
    bus: StubBus,
}

#[async_trait]
impl DevicePort for StubPort {
    fn bytes_waiting(&self) -> io::Result<u32> {
        let mut state = self.bus.state.lock();
        if state.fail_next_probe {
            state.fail_next_probe = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "probe failed"));
        }
        Ok(state.pending.len() as u32)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.bus.state.lock();
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed"));
        }
        let count = buf.len().min(state.pending.len());
        for slot in buf.iter_mut().take(count) {
            *slot = state.pending.pop_front().unwrap();
        }
        Ok(count)
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.bus.state.lock();
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        state.written.extend_from_slice(buf);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
