use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the serial link.
///
/// Decode noise never appears here: garbled bytes are repaired or
/// dropped inside the listener and the line simply looks odd.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No connection is open. Surfaced immediately, never after a
    /// response-timeout-length wait.
    #[error("serial port not available")]
    NotConnected,

    /// Opening the requested port failed.
    #[error("failed to open '{port}': {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: io::Error,
    },

    /// A write or flush on the open handle failed. The reconnector will
    /// notice the broken handle on its next pass; the caller is not
    /// kept waiting for that.
    #[error("serial write failed: {source}")]
    WriteFailed {
        #[source]
        source: io::Error,
    },

    /// No qualifying line arrived before the deadline. A normal outcome
    /// for commands the firmware answers silently or not at all.
    #[error("no response from device within {timeout:?}")]
    NoResponse { timeout: Duration },
}
