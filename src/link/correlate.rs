use std::time::{Duration, Instant};

use crate::link::buffer::LineBuffer;

/// Poll interval while waiting for a reply line.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Wait for the first buffered line observed at or after `since`, less
/// `grace`.
///
/// The robot tags nothing, so correlation is purely temporal: the
/// oldest line in the buffer whose timestamp clears `since - grace`
/// is taken to be the reply. The grace window admits a line the
/// listener stamped just before the command's own timestamp was taken.
/// Returns `None` once `timeout` passes without a qualifying line; the
/// buffer is scanned at least once even with a zero timeout.
pub async fn wait_for_new_response(
    buffer: &LineBuffer,
    since: Instant,
    timeout: Duration,
    grace: Duration,
) -> Option<String> {
    let deadline = Instant::now() + timeout;
    let cutoff = since.checked_sub(grace);

    loop {
        for record in buffer.snapshot() {
            let qualifies = match cutoff {
                Some(cutoff) => record.observed_at >= cutoff,
                // The process is younger than the grace window, so no
                // buffered line can predate the cutoff.
                None => true,
            };
            if qualifies {
                return Some(record.text);
            }
        }

        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
