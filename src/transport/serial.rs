//! Serial transport implementation

use super::Transport;
use crate::config::PeerDetect;
use crate::error::Result;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Serial transport for the UART-style wireless link
///
/// The radio module (e.g. a Bluetooth SPP adapter bound to `/dev/rfcomm0`)
/// presents the paired link as a plain serial device. Peer attachment is
/// sensed through the carrier-detect modem line unless configured away.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    peer_detect: PeerDetect,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g. "/dev/rfcomm0")
    /// * `baud_rate` - Baud rate (e.g. 115200)
    /// * `peer_detect` - How peer attachment is sensed
    pub fn open(path: &str, baud_rate: u32, peer_detect: PeerDetect) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(10))
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport { port, peer_detect })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn has_peer(&mut self) -> bool {
        match self.peer_detect {
            PeerDetect::Always => true,
            // An unreadable modem line counts as "no peer"; the next poll
            // re-checks.
            PeerDetect::Carrier => self.port.read_carrier_detect().unwrap_or(false),
        }
    }
}
