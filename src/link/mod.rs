//! Host link session: peer gating, command draining, frame framing
//!
//! # Wire Protocol
//!
//! Both flows share one bidirectional byte stream toward the paired host.
//!
//! **Outbound video (device → host):** each frame is length-prefixed:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Little-endian u32│ JPEG data                │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! The header and payload are written back to back with no other frame
//! interleaved, then flushed as one logical unit.
//!
//! **Inbound commands (host → device):** newline-terminated ASCII lines,
//! e.g. `S14:90`. Lines are drained non-blocking each cycle; whatever has
//! not reached its terminator yet stays buffered for the next cycle.
//!
//! **Acknowledgments (device → host):** a plain text line per applied
//! servo command, `Servo set to <angle>`.
//!
//! # Degraded mode
//!
//! If the transport cannot be opened the session still exists: it reports
//! no peer forever and drops outbound writes, so the rest of the firmware
//! keeps cycling without special cases.

mod line_buffer;
pub use line_buffer::LineBuffer;

use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::transport::{SerialTransport, Transport};

/// Session with the (at most one) remote peer on the wireless link
pub struct LinkSession {
    name: String,
    transport: Option<Box<dyn Transport>>,
    lines: LineBuffer<1024>,
}

impl LinkSession {
    /// Open the configured link transport
    ///
    /// Transport failure is not fatal: the session comes up degraded,
    /// `has_peer()` stays false and the loop keeps running.
    pub fn open(name: &str, config: &LinkConfig) -> Self {
        match SerialTransport::open(&config.port, config.baud, config.peer_detect) {
            Ok(transport) => {
                log::info!("Link ready on {}, advertising as \"{}\"", config.port, name);
                Self::with_transport(name, Box::new(transport))
            }
            Err(e) => {
                log::error!(
                    "Link init failed on {}: {} (running degraded, no peer will attach)",
                    config.port,
                    e
                );
                Self {
                    name: name.to_string(),
                    transport: None,
                    lines: LineBuffer::new(),
                }
            }
        }
    }

    /// Build a session over an already-open transport
    pub fn with_transport(name: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            name: name.to_string(),
            transport: Some(transport),
            lines: LineBuffer::new(),
        }
    }

    /// Advertised device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the transport failed to initialize
    pub fn is_degraded(&self) -> bool {
        self.transport.is_none()
    }

    /// Whether a peer is currently attached
    pub fn has_peer(&mut self) -> bool {
        match self.transport.as_mut() {
            Some(transport) => transport.has_peer(),
            None => false,
        }
    }

    /// Drain every complete command line currently buffered
    ///
    /// Non-blocking: reads whatever the transport has pending, then
    /// returns the lines whose terminator has arrived. Never waits for
    /// more input.
    pub fn poll_lines(&mut self) -> Vec<String> {
        if let Some(transport) = self.transport.as_mut() {
            let mut chunk = [0u8; 256];
            loop {
                match transport.available() {
                    Ok(0) => break,
                    Ok(_) => match transport.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => self.lines.extend(&chunk[..n]),
                        Err(e) => {
                            log::warn!("Link read error: {}", e);
                            break;
                        }
                    },
                    Err(e) => {
                        log::warn!("Link poll error: {}", e);
                        break;
                    }
                }
            }
        }

        let mut out = Vec::new();
        while let Some(line) = self.lines.next_line() {
            out.push(line);
        }
        out
    }

    /// Send one acknowledgment line, newline-terminated
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        transport.write_all(line.as_bytes())?;
        transport.write_all(b"\n")?;
        transport.flush()
    }

    /// Transmit one frame as `[length: u32 LE][payload]`
    ///
    /// Written as two consecutive writes with nothing interleaved, then
    /// flushed. A peer detach mid-write is the transport's fault to
    /// report; the session notices on the next `has_peer` poll.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let length =
            u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge(payload.len()))?;
        transport.write_all(&length.to_le_bytes())?;
        transport.write_all(payload)?;
        transport.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerDetect;
    use crate::transport::MockTransport;

    fn session() -> (LinkSession, MockTransport) {
        let mock = MockTransport::new();
        let session = LinkSession::with_transport("TEST_CAM", Box::new(mock.clone()));
        (session, mock)
    }

    #[test]
    fn test_frame_framing_round_trip() {
        let (mut session, mock) = session();
        let payload: Vec<u8> = (0..200u8).collect();

        session.send_frame(&payload).unwrap();

        let written = mock.written();
        assert_eq!(written.len(), 4 + payload.len());
        let decoded = u32::from_le_bytes([written[0], written[1], written[2], written[3]]);
        assert_eq!(decoded as usize, payload.len());
        assert_eq!(&written[4..], payload.as_slice());
    }

    #[test]
    fn test_empty_frame_is_header_only() {
        let (mut session, mock) = session();
        session.send_frame(&[]).unwrap();
        assert_eq!(mock.written(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_send_line_appends_newline() {
        let (mut session, mock) = session();
        session.send_line("Servo set to 90").unwrap();
        assert_eq!(mock.written(), b"Servo set to 90\n");
    }

    #[test]
    fn test_poll_lines_waits_for_terminator() {
        let (mut session, mock) = session();

        mock.inject_read(b"S14:9");
        assert!(session.poll_lines().is_empty());

        mock.inject_read(b"0\nS1");
        assert_eq!(session.poll_lines(), vec!["S14:90".to_string()]);

        mock.inject_read(b"4:45\r\n");
        assert_eq!(session.poll_lines(), vec!["S14:45".to_string()]);
    }

    #[test]
    fn test_poll_lines_drains_everything_available() {
        let (mut session, mock) = session();
        mock.inject_read(b"S14:10\nS14:20\nnoise\n");
        assert_eq!(
            session.poll_lines(),
            vec![
                "S14:10".to_string(),
                "S14:20".to_string(),
                "noise".to_string()
            ]
        );
        assert!(session.poll_lines().is_empty());
    }

    #[test]
    fn test_has_peer_follows_transport() {
        let (mut session, mock) = session();
        assert!(!session.has_peer());
        mock.set_peer(true);
        assert!(session.has_peer());
        mock.set_peer(false);
        assert!(!session.has_peer());
    }

    #[test]
    fn test_degraded_session_is_inert() {
        let config = LinkConfig {
            port: "/dev/__no_such_port__".to_string(),
            baud: 115_200,
            peer_detect: PeerDetect::Carrier,
        };
        let mut session = LinkSession::open("TEST_CAM", &config);

        assert!(session.is_degraded());
        assert!(!session.has_peer());
        assert!(session.poll_lines().is_empty());
        // Outbound writes are dropped, not errors
        session.send_frame(&[1, 2, 3]).unwrap();
        session.send_line("Servo set to 90").unwrap();
    }
}
