use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialStream};

/// One open connection to the robot.
///
/// The few capabilities the link manager needs from a serial stream,
/// behind a trait so tests can substitute an in-memory device. Dropping
/// the handle closes the port.
#[async_trait]
pub trait DevicePort: Send {
    /// Received bytes waiting to be read.
    ///
    /// Doubles as the health probe: an unplugged or reset port errors
    /// here long before a write would.
    fn bytes_waiting(&self) -> io::Result<u32>;

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    async fn flush(&mut self) -> io::Result<()>;
}

/// Opens ports and enumerates what the host offers.
#[async_trait]
pub trait PortDriver: Send + Sync {
    async fn open(&self, port: &str, baud_rate: u32) -> io::Result<Box<dyn DevicePort>>;

    fn list_ports(&self) -> io::Result<Vec<String>>;
}

/// Production driver backed by tokio-serial. 8N1, no flow control,
/// which is what the arm firmware speaks.
pub struct SerialDriver;

#[async_trait]
impl PortDriver for SerialDriver {
    async fn open(&self, port: &str, baud_rate: u32) -> io::Result<Box<dyn DevicePort>> {
        let builder = tokio_serial::new(port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None);

        let stream = SerialStream::open(&builder).map_err(io::Error::from)?;
        Ok(Box::new(NativePort { stream }))
    }

    fn list_ports(&self) -> io::Result<Vec<String>> {
        let ports = tokio_serial::available_ports().map_err(io::Error::from)?;
        Ok(ports.into_iter().map(|info| info.port_name).collect())
    }
}

struct NativePort {
    stream: SerialStream,
}

#[async_trait]
impl DevicePort for NativePort {
    fn bytes_waiting(&self) -> io::Result<u32> {
        self.stream.bytes_to_read().map_err(io::Error::from)
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}
