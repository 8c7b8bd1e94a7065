//! VC0706 serial JPEG camera driver
//!
//! The camera does the compression; this driver only sequences the
//! capture: freeze the current frame, query its length, read it out in
//! chunks, resume live capture. Frames land in buffers drawn from a
//! finite pool sized by `fb_count`.

pub mod protocol;

use crate::config::CameraConfig;
use crate::core::camera::{Frame, FramePool, FrameSource};
use crate::error::{Error, Result};
use crate::transport::Transport;
use protocol::{
    fbuf_ctrl, gen_version, get_fbuf_len, parse_reply, read_fbuf, set_compression,
    set_image_size, ReplyHeader, CMD_FBUF_CTRL, CMD_GEN_VERSION, CMD_GET_FBUF_LEN,
    CMD_READ_FBUF, CMD_WRITE_DATA, FBUF_RESUME, FBUF_STOP_CURRENT,
};
use std::time::{Duration, Instant};

/// Upper bound on a single frame; guards against a corrupt length reply
const MAX_FRAME_LEN: u32 = 256 * 1024;
/// Bytes requested per READ_FBUF transfer (kept a multiple of 8, which
/// the chip requires for read alignment)
const READ_CHUNK: u32 = 1024;
/// Inter-byte pacing requested from the camera, in 10 µs units
const READ_DELAY_10US: u16 = 0x0010;
/// Deadline for any single reply
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);
/// Initial per-buffer allocation; buffers grow to the largest frame seen
const INITIAL_BUFFER_CAPACITY: usize = 16 * 1024;

/// Driver for a VC0706-class TTL serial JPEG camera
pub struct Vc0706Camera {
    transport: Box<dyn Transport>,
    pool: FramePool,
}

impl std::fmt::Debug for Vc0706Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vc0706Camera")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Vc0706Camera {
    /// Probe the camera and apply the capture format
    ///
    /// Every failure here is an initialization failure; the caller treats
    /// a camera that will not come up as terminal for the process.
    pub fn new(transport: Box<dyn Transport>, config: &CameraConfig) -> Result<Self> {
        let mut camera = Self {
            transport,
            pool: FramePool::new(config.fb_count.max(1), INITIAL_BUFFER_CAPACITY),
        };

        let version = camera
            .probe_version()
            .map_err(|e| Error::InitializationFailed(format!("camera probe: {}", e)))?;
        log::info!("Camera firmware: {}", version);

        camera
            .command_ok(&set_image_size(config.frame_size), CMD_WRITE_DATA)
            .map_err(|e| Error::InitializationFailed(format!("set image size: {}", e)))?;
        camera
            .command_ok(&set_compression(config.jpeg_quality), CMD_WRITE_DATA)
            .map_err(|e| Error::InitializationFailed(format!("set compression: {}", e)))?;

        log::info!(
            "Camera configured: {:?} quality {} ({} frame buffers)",
            config.frame_size,
            config.jpeg_quality,
            config.fb_count.max(1)
        );
        Ok(camera)
    }

    fn probe_version(&mut self) -> Result<String> {
        self.transport.write_all(&gen_version())?;
        self.transport.flush()?;
        let header = self.read_reply_header(CMD_GEN_VERSION)?;
        let data = self.read_data(header.data_len as usize)?;
        Ok(String::from_utf8_lossy(&data).trim().to_string())
    }

    /// Send a command and require a successful reply, draining any payload
    fn command_ok(&mut self, cmd: &[u8], expected: u8) -> Result<()> {
        self.transport.write_all(cmd)?;
        self.transport.flush()?;
        let header = self.read_reply_header(expected)?;
        if header.data_len > 0 {
            self.read_data(header.data_len as usize)?;
        }
        Ok(())
    }

    fn read_reply_header(&mut self, expected: u8) -> Result<ReplyHeader> {
        let mut raw = [0u8; 5];
        self.read_exact(&mut raw)?;
        let header = parse_reply(&raw)?;
        header.check(expected)?;
        Ok(header)
    }

    fn read_data(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut data = vec![0u8; len];
        self.read_exact(&mut data)?;
        Ok(data)
    }

    /// Fill the buffer or time out
    ///
    /// The transport maps its own read timeout to 0 bytes, so this loop
    /// only spins at the transport's pace until the deadline passes.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let deadline = Instant::now() + REPLY_TIMEOUT;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.transport.read(&mut buf[filled..])?;
            filled += n;
            if n == 0 && Instant::now() >= deadline {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }

    fn frozen_frame_len(&mut self) -> Result<u32> {
        self.transport.write_all(&get_fbuf_len())?;
        self.transport.flush()?;
        let header = self.read_reply_header(CMD_GET_FBUF_LEN)?;
        if header.data_len != 4 {
            return Err(Error::InvalidReply(format!(
                "frame length reply carries {} bytes",
                header.data_len
            )));
        }
        let raw = self.read_data(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Freeze, measure, and read the frame into `buffer`
    fn capture_into(&mut self, buffer: &mut Vec<u8>) -> Result<()> {
        self.command_ok(&fbuf_ctrl(FBUF_STOP_CURRENT), CMD_FBUF_CTRL)?;

        let total = self.frozen_frame_len()?;
        if total == 0 || total > MAX_FRAME_LEN {
            return Err(Error::Capture(format!(
                "implausible frame length {} bytes",
                total
            )));
        }

        let mut chunk = [0u8; READ_CHUNK as usize];
        let mut start = 0u32;
        while start < total {
            let wanted = (total - start).min(READ_CHUNK);
            // Reads must be 8-byte aligned; padding past the frame end is
            // discarded below.
            let aligned = (wanted + 7) & !7;

            self.transport
                .write_all(&read_fbuf(start, aligned, READ_DELAY_10US))?;
            self.transport.flush()?;

            self.read_reply_header(CMD_READ_FBUF)?;
            self.read_exact(&mut chunk[..aligned as usize])?;
            let mut footer = [0u8; 5];
            self.read_exact(&mut footer)?;
            parse_reply(&footer)?.check(CMD_READ_FBUF)?;

            buffer.extend_from_slice(&chunk[..wanted as usize]);
            start += wanted;
        }
        Ok(())
    }
}

impl FrameSource for Vc0706Camera {
    fn capture(&mut self) -> Result<Frame> {
        let Some(mut buffer) = self.pool.acquire() else {
            return Err(Error::Capture("frame buffer pool exhausted".to_string()));
        };

        let result = self.capture_into(&mut buffer);

        // Resume live capture whether or not the readout succeeded, so the
        // next cycle starts from a running sensor.
        if let Err(e) = self.command_ok(&fbuf_ctrl(FBUF_RESUME), CMD_FBUF_CTRL) {
            log::warn!("Frame buffer resume failed: {}", e);
        }

        match result {
            Ok(()) => Ok(self.pool.frame(buffer)),
            Err(e) => {
                self.pool.release(buffer);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameSize;
    use crate::transport::MockTransport;

    fn test_config() -> CameraConfig {
        CameraConfig {
            driver: "vc0706".to_string(),
            port: "unused".to_string(),
            baud: 38_400,
            frame_size: FrameSize::Qvga,
            jpeg_quality: 24,
            fb_count: 1,
        }
    }

    fn ok_reply(cmd: u8, data: &[u8]) -> Vec<u8> {
        let mut reply = vec![0x76, 0x00, cmd, 0x00, data.len() as u8];
        reply.extend_from_slice(data);
        reply
    }

    /// Queue the replies for a successful `new()`
    fn inject_init_replies(mock: &MockTransport) {
        mock.inject_read(&ok_reply(CMD_GEN_VERSION, b"VC0703 1.00"));
        mock.inject_read(&ok_reply(CMD_WRITE_DATA, &[])); // image size
        mock.inject_read(&ok_reply(CMD_WRITE_DATA, &[])); // compression
    }

    #[test]
    fn test_init_sends_probe_and_format() {
        let mock = MockTransport::new();
        inject_init_replies(&mock);

        let _camera = Vc0706Camera::new(Box::new(mock.clone()), &test_config()).unwrap();

        let written = mock.written();
        let mut expected = Vec::new();
        expected.extend_from_slice(&gen_version());
        expected.extend_from_slice(&set_image_size(FrameSize::Qvga));
        expected.extend_from_slice(&set_compression(24));
        assert_eq!(written, expected);
    }

    #[test]
    fn test_init_failure_on_error_status() {
        let mock = MockTransport::new();
        // Version probe replies with status 0x03 (command error)
        mock.inject_read(&[0x76, 0x00, CMD_GEN_VERSION, 0x03, 0x00]);

        let err = Vc0706Camera::new(Box::new(mock), &test_config()).unwrap_err();
        assert!(matches!(err, Error::InitializationFailed(_)));
    }

    #[test]
    fn test_capture_reads_frozen_frame() {
        let mock = MockTransport::new();
        inject_init_replies(&mock);
        let mut camera = Vc0706Camera::new(Box::new(mock.clone()), &test_config()).unwrap();
        mock.clear_written();

        // One 16-byte frame, read in a single aligned chunk
        let image: Vec<u8> = (0..16u8).collect();
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[])); // stop
        mock.inject_read(&ok_reply(CMD_GET_FBUF_LEN, &16u32.to_be_bytes()));
        mock.inject_read(&ok_reply(CMD_READ_FBUF, &[])); // data header
        mock.inject_read(&image);
        mock.inject_read(&ok_reply(CMD_READ_FBUF, &[])); // data footer
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[])); // resume

        let frame = camera.capture().unwrap();
        assert_eq!(frame.as_bytes(), image.as_slice());

        // Stop, length query, one chunked read, resume - in that order
        let written = mock.written();
        let mut expected = Vec::new();
        expected.extend_from_slice(&fbuf_ctrl(FBUF_STOP_CURRENT));
        expected.extend_from_slice(&get_fbuf_len());
        expected.extend_from_slice(&read_fbuf(0, 16, READ_DELAY_10US));
        expected.extend_from_slice(&fbuf_ctrl(FBUF_RESUME));
        assert_eq!(written, expected);
    }

    #[test]
    fn test_capture_discards_alignment_padding() {
        let mock = MockTransport::new();
        inject_init_replies(&mock);
        let mut camera = Vc0706Camera::new(Box::new(mock.clone()), &test_config()).unwrap();

        // 13 bytes of frame, read as one 16-byte aligned transfer
        let image: Vec<u8> = (10..23u8).collect();
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[]));
        mock.inject_read(&ok_reply(CMD_GET_FBUF_LEN, &13u32.to_be_bytes()));
        mock.inject_read(&ok_reply(CMD_READ_FBUF, &[]));
        mock.inject_read(&image);
        mock.inject_read(&[0xAA, 0xBB, 0xCC]); // alignment padding
        mock.inject_read(&ok_reply(CMD_READ_FBUF, &[]));
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[]));

        let frame = camera.capture().unwrap();
        assert_eq!(frame.as_bytes(), image.as_slice());
        assert_eq!(frame.len(), 13);
    }

    #[test]
    fn test_failed_capture_releases_buffer_and_resumes() {
        let mock = MockTransport::new();
        inject_init_replies(&mock);
        let mut camera = Vc0706Camera::new(Box::new(mock.clone()), &test_config()).unwrap();
        mock.clear_written();

        // Stop succeeds, but the length reply reports zero bytes
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[]));
        mock.inject_read(&ok_reply(CMD_GET_FBUF_LEN, &0u32.to_be_bytes()));
        mock.inject_read(&ok_reply(CMD_FBUF_CTRL, &[])); // resume still answered

        let err = camera.capture().unwrap_err();
        assert!(matches!(err, Error::Capture(_)));

        // The buffer went back to the pool
        assert_eq!(camera.pool.free_count(), 1);

        // And the driver still resumed live capture
        let written = mock.written();
        assert!(written.ends_with(&fbuf_ctrl(FBUF_RESUME)));
    }
}
