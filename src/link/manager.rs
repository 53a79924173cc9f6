use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SerialConfig;
use crate::link::buffer::LineBuffer;
use crate::link::correlate::wait_for_new_response;
use crate::link::error::LinkError;
use crate::link::history::{CommandHistory, ExchangeRecord};
use crate::link::listener;
use crate::link::port::{DevicePort, PortDriver};
use crate::link::reconnect;
use crate::link::reply::Reply;

/// What history records when a command drew no reply.
const NO_RESPONSE: &str = "No response";

/// Connection lifecycle. Transitions happen only in
/// [`SerialLink::connect`], [`SerialLink::close`] and the reconnector;
/// nothing flips the state as a side effect of a failed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No handle. Commands fail immediately.
    Closed,
    /// Handle open and presumed healthy.
    Open,
    /// Handle present but failing its probe; the reconnector is about
    /// to close it.
    Broken,
}

/// Tunables for the link, usually built from [`SerialConfig`].
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Endpoint dialed at startup and by the reconnector until a
    /// connect() names another.
    pub port: String,
    pub baud_rate: u32,
    pub reconnect_interval: Duration,
    pub response_timeout: Duration,
    pub response_grace: Duration,
    pub buffer_capacity: usize,
    pub history_capacity: usize,
}

impl From<&SerialConfig> for LinkSettings {
    fn from(config: &SerialConfig) -> Self {
        Self {
            port: config.port.clone(),
            baud_rate: config.baud_rate,
            reconnect_interval: config.reconnect_interval(),
            response_timeout: config.response_timeout(),
            response_grace: config.response_grace(),
            buffer_capacity: config.buffer_capacity,
            history_capacity: config.history_capacity,
        }
    }
}

pub(crate) struct PortSlot {
    pub(crate) port: Option<Box<dyn DevicePort>>,
    pub(crate) state: LinkState,
}

/// Shared internals behind [`SerialLink`] handles.
pub(crate) struct LinkShared {
    /// The single connection. Reads (listener) and writes (send)
    /// serialize through this lock; critical sections stay short.
    pub(crate) slot: Mutex<PortSlot>,
    pub(crate) buffer: LineBuffer,
    pub(crate) history: CommandHistory,
    /// The reconnector's redial target: the most recent connect target.
    pub(crate) endpoint: parking_lot::Mutex<String>,
    /// Handle of the current listener task. "A listener is running" is
    /// read straight off this handle, so it cannot go stale.
    pub(crate) listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
    pub(crate) driver: Box<dyn PortDriver>,
    pub(crate) settings: LinkSettings,
}

/// Owner of the serial connection and everything that flows over it.
///
/// Cheap to clone; all clones share the one connection, line buffer and
/// history. Construct once at startup and hand clones to whoever needs
/// them.
#[derive(Clone)]
pub struct SerialLink {
    pub(crate) shared: Arc<LinkShared>,
}

impl SerialLink {
    pub fn new(driver: Box<dyn PortDriver>, settings: LinkSettings) -> Self {
        let shared = LinkShared {
            slot: Mutex::new(PortSlot {
                port: None,
                state: LinkState::Closed,
            }),
            buffer: LineBuffer::new(settings.buffer_capacity),
            history: CommandHistory::new(settings.history_capacity),
            endpoint: parking_lot::Mutex::new(settings.port.clone()),
            listener: parking_lot::Mutex::new(None),
            driver,
            settings,
        };

        Self {
            shared: Arc::new(shared),
        }
    }

    pub(crate) fn settings(&self) -> &LinkSettings {
        &self.shared.settings
    }

    /// Open a connection to `port`, closing any previous one first.
    ///
    /// `port` becomes the reconnector's redial target whether or not
    /// the open succeeds: a connect to an arm that is briefly unplugged
    /// should still win in the end.
    pub async fn connect(&self, port: &str) -> Result<(), LinkError> {
        *self.shared.endpoint.lock() = port.to_string();

        let mut slot = self.shared.slot.lock().await;
        slot.port = None;
        slot.state = LinkState::Closed;

        match self
            .shared
            .driver
            .open(port, self.shared.settings.baud_rate)
            .await
        {
            Ok(handle) => {
                slot.port = Some(handle);
                slot.state = LinkState::Open;
                drop(slot);
                info!(port = %port, "serial port opened");
                self.ensure_listener();
                Ok(())
            }
            Err(source) => {
                warn!(port = %port, error = %source, "failed to open serial port");
                Err(LinkError::OpenFailed {
                    port: port.to_string(),
                    source,
                })
            }
        }
    }

    /// Drop the connection, if any. The listener notices the empty slot
    /// and exits on its own.
    pub async fn close(&self) {
        let mut slot = self.shared.slot.lock().await;
        slot.port = None;
        slot.state = LinkState::Closed;
    }

    pub async fn state(&self) -> LinkState {
        self.shared.slot.lock().await.state
    }

    /// Whether the link is usable, per the state machine alone. No
    /// probe happens here; health checking is the reconnector's job.
    pub async fn is_connected(&self) -> bool {
        self.state().await == LinkState::Open
    }

    /// Send one command line and wait for the reply most likely caused
    /// by it.
    ///
    /// The command is trimmed, written with a trailing newline, and
    /// matched against the first buffered line observed after the send
    /// began (less the configured grace). Matching is purely temporal:
    /// two overlapping sends can steal each other's replies, so issue
    /// one command at a time.
    pub async fn send(&self, command: &str) -> Result<Reply, LinkError> {
        let command = command.trim();
        let since = Instant::now();

        {
            let mut slot = self.shared.slot.lock().await;
            if slot.state != LinkState::Open {
                return Err(LinkError::NotConnected);
            }
            let port = slot.port.as_mut().ok_or(LinkError::NotConnected)?;

            let mut frame = Vec::with_capacity(command.len() + 1);
            frame.extend_from_slice(command.as_bytes());
            frame.push(b'\n');
            port.write_all(&frame)
                .await
                .map_err(|source| LinkError::WriteFailed { source })?;
            port.flush()
                .await
                .map_err(|source| LinkError::WriteFailed { source })?;
        }

        let reply = wait_for_new_response(
            &self.shared.buffer,
            since,
            self.shared.settings.response_timeout,
            self.shared.settings.response_grace,
        )
        .await;

        match reply {
            Some(line) => {
                self.shared.history.record(command, &line);
                Ok(Reply::classify(&line))
            }
            None => {
                self.shared.history.record(command, NO_RESPONSE);
                Err(LinkError::NoResponse {
                    timeout: self.shared.settings.response_timeout,
                })
            }
        }
    }

    /// Spawn the background reconnector. It runs for the life of the
    /// process; the returned handle is only good for aborting it in
    /// tests.
    pub fn spawn_reconnector(&self) -> JoinHandle<()> {
        tokio::spawn(reconnect::run(self.clone()))
    }

    /// Recent command/response exchanges, oldest first.
    pub fn history(&self) -> Vec<ExchangeRecord> {
        self.shared.history.snapshot()
    }

    pub fn clear_history(&self) {
        self.shared.history.clear();
    }

    /// Serial ports the host currently offers.
    pub fn list_ports(&self) -> std::io::Result<Vec<String>> {
        self.shared.driver.list_ports()
    }

    /// Start a listener task if none is running. The previous task's
    /// handle is the liveness check, so a crashed listener can always
    /// be replaced and a live one is never doubled.
    pub(crate) fn ensure_listener(&self) {
        let mut guard = self.shared.listener.lock();
        if guard.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        *guard = Some(tokio::spawn(listener::run(self.shared.clone())));
    }
}
