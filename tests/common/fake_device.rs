//! A scripted serial device for integration tests.
//!
//! The [`FakeBus`] plays the robot's firmware: complete lines written
//! to the port are matched against scripted responses, which then land
//! on the read side as if the device had answered. Failure switches
//! simulate yanking the cable.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

use armlink::link::{DevicePort, PortDriver};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Default)]
struct FakeState {
    pending: VecDeque<u8>,
    written: Vec<u8>,
    partial_command: Vec<u8>,
    replies: HashMap<String, String>,
    opens: usize,
    opened_ports: Vec<String>,
    fail_open: bool,
    /// Probes, reads and writes fail while set. Cleared by a
    /// successful open, as plugging the device back in would.
    dead: bool,
}

#[derive(Clone, Default)]
pub struct FakeBus {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the firmware: when `command` is written, `reply` comes
    /// back on the next read.
    pub fn respond_with(&self, command: &str, reply: &str) {
        self.state
            .lock()
            .replies
            .insert(command.to_string(), reply.to_string());
    }

    /// Inject an unsolicited line, as if the firmware spoke on its own.
    pub fn inject_line(&self, line: &str) {
        let mut state = self.state.lock();
        state.pending.extend(line.as_bytes());
        state.pending.push_back(b'\n');
    }

    /// Simulate unplugging: everything on the current handle fails
    /// until a fresh open.
    pub fn kill(&self) {
        self.state.lock().dead = true;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// How many times a handle was successfully opened.
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// Port names passed to every successful open, in order.
    pub fn opened_ports(&self) -> Vec<String> {
        self.state.lock().opened_ports.clone()
    }

    /// Everything written to the device so far.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().written).into_owned()
    }
}

pub struct FakeDriver {
    bus: FakeBus,
}

impl FakeDriver {
    pub fn new(bus: FakeBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PortDriver for FakeDriver {
    async fn open(&self, port: &str, _baud_rate: u32) -> io::Result<Box<dyn DevicePort>> {
        let mut state = self.bus.state.lock();
        if state.fail_open {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("could not open port '{port}'"),
            ));
        }
        state.opens += 1;
        state.opened_ports.push(port.to_string());
        state.dead = false;
        drop(state);

        Ok(Box::new(FakePort {
            bus: self.bus.clone(),
        }))
    }

    fn list_ports(&self) -> io::Result<Vec<String>> {
        Ok(vec![
            "/dev/ttyFAKE".to_string(),
            "/dev/ttyACM9".to_string(),
        ])
    }
}

struct FakePort {
    bus: FakeBus,
}

#[async_trait]
impl DevicePort for FakePort {
    fn bytes_waiting(&self) -> io::Result<u32> {
        let state = self.bus.state.lock();
        if state.dead {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        Ok(state.pending.len() as u32)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.bus.state.lock();
        if state.dead {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        let count = buf.len().min(state.pending.len());
        for slot in buf.iter_mut().take(count) {
            *slot = state.pending.pop_front().unwrap();
        }
        Ok(count)
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.bus.state.lock();
        if state.dead {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
        }
        state.written.extend_from_slice(buf);

        // Feed completed lines to the scripted firmware.
        let mut partial = std::mem::take(&mut state.partial_command);
        partial.extend_from_slice(buf);
        while let Some(pos) = partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = partial.drain(..=pos).collect();
            let command = String::from_utf8_lossy(&line[..line.len() - 1])
                .trim()
                .to_string();
            if let Some(reply) = state.replies.get(&command).cloned() {
                state.pending.extend(reply.as_bytes());
                state.pending.push_back(b'\n');
            }
        }
        state.partial_command = partial;

        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
