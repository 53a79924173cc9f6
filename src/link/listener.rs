use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::link::buffer::LineRecord;
use crate::link::manager::LinkShared;

/// Poll interval when no bytes are waiting.
const IDLE_POLL: Duration = Duration::from_millis(10);

const READ_CHUNK: usize = 256;

/// Background read loop for one tenure of the connection.
///
/// Takes the port lock just long enough to drain whatever bytes are
/// waiting, then assembles complete lines outside it and pushes them,
/// timestamped, into the shared buffer. Exits when the port is gone or
/// a read fails; respawning is the reconnector's job, never this
/// loop's.
pub(crate) async fn run(shared: Arc<LinkShared>) {
    debug!("serial listener started");
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let mut chunk = [0u8; READ_CHUNK];
        let drained = {
            let mut slot = shared.slot.lock().await;
            let Some(port) = slot.port.as_mut() else {
                debug!("serial listener stopping: port closed");
                return;
            };

            match port.bytes_waiting() {
                Ok(0) => Ok(0),
                Ok(_) => match port.read(&mut chunk).await {
                    Ok(0) => {
                        warn!("serial listener stopping: port reported end of stream");
                        return;
                    }
                    Ok(n) => Ok(n),
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            }
        };

        match drained {
            Ok(0) => tokio::time::sleep(IDLE_POLL).await,
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                for line in drain_lines(&mut pending) {
                    debug!(line = %line, "robot says");
                    shared.buffer.push(LineRecord::new(line));
                }
            }
            Err(e) => {
                warn!(error = %e, "serial listener stopping: read failed");
                return;
            }
        }
    }
}

/// Split complete newline-terminated lines out of `pending`. Bytes
/// after the last newline stay put for the next drain. Invalid UTF-8 is
/// decoded lossily and blank lines are dropped.
fn drain_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&raw).trim().to_string();
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines
}
