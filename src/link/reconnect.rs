use tracing::{debug, info, warn};

use crate::link::manager::{LinkState, SerialLink};

/// Background supervision loop.
///
/// Every reconnect period: probe the handle, and when it is missing or
/// unhealthy, close it and redial the current endpoint, restarting the
/// listener after a successful open. Retries forever with no backoff;
/// the arm may be unplugged or power-cycled at any moment and should
/// come back on its own.
pub(crate) async fn run(link: SerialLink) {
    let period = link.settings().reconnect_interval;
    debug!(period_ms = period.as_millis() as u64, "reconnector started");

    loop {
        tokio::time::sleep(period).await;
        supervise(&link).await;
    }
}

/// One supervision pass. State transitions happen only here and in
/// `SerialLink::connect`.
async fn supervise(link: &SerialLink) {
    let endpoint = link.shared.endpoint.lock().clone();

    {
        let mut slot = link.shared.slot.lock().await;
        let healthy = match slot.port.as_ref() {
            Some(port) => match port.bytes_waiting() {
                Ok(_) => true,
                Err(e) => {
                    warn!(port = %endpoint, error = %e, "serial port probe failed");
                    false
                }
            },
            None => false,
        };

        if healthy {
            return;
        }

        if slot.port.is_some() {
            slot.state = LinkState::Broken;
            slot.port = None; // dropping the handle closes it
        }
        slot.state = LinkState::Closed;
    }

    // Redial without holding the slot lock: a send arriving during a
    // slow open must fail fast, not queue behind it.
    match link
        .shared
        .driver
        .open(&endpoint, link.settings().baud_rate)
        .await
    {
        Ok(handle) => {
            let mut slot = link.shared.slot.lock().await;
            if slot.port.is_some() {
                // A concurrent connect() won the race; keep its handle.
                return;
            }
            slot.port = Some(handle);
            slot.state = LinkState::Open;
            drop(slot);
            info!(port = %endpoint, "serial link reconnected");
            link.ensure_listener();
        }
        Err(e) => {
            debug!(port = %endpoint, error = %e, "reconnect attempt failed");
        }
    }
}
