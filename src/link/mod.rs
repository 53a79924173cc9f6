mod buffer;
mod correlate;
mod error;
mod history;
mod listener;
mod manager;
mod port;
mod reconnect;
mod reply;

#[cfg(test)]
pub(crate) mod testkit;

pub use buffer::{LineBuffer, LineRecord};
pub use correlate::wait_for_new_response;
pub use error::LinkError;
pub use history::{CommandHistory, ExchangeRecord};
pub use manager::{LinkSettings, LinkState, SerialLink};
pub use port::{DevicePort, PortDriver, SerialDriver};
pub use reply::Reply;
