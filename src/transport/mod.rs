//! Transport layer for the host link

use crate::error::Result;

mod mock;
mod serial;
pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Byte-stream transport toward the paired host
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read (0 = nothing
    /// pending)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Check if data is available to read
    fn available(&mut self) -> Result<usize> {
        Ok(0) // Default implementation
    }

    /// Whether a remote peer is currently attached
    ///
    /// Polled once per cycle; no ordering guarantee relative to in-flight
    /// writes. A detach during a write shows up here on the next poll.
    fn has_peer(&mut self) -> bool {
        true
    }

    /// Write the whole buffer, retrying short writes
    fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "transport accepted zero bytes",
                )
                .into());
            }
            data = &data[n..];
        }
        Ok(())
    }
}
