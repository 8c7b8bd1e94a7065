//! Simulated devices for hardware-free runs and tests
//!
//! Selected with `driver = "sim"` / `output = "sim"` in the config, so
//! the whole firmware can cycle on a development host.

use crate::core::camera::{Frame, FramePool, FrameSource};
use crate::core::servo::PwmOutput;
use crate::error::{Error, Result};
use rand::Rng;
use std::sync::{Arc, Mutex};

/// JPEG start-of-image / end-of-image markers
const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Synthetic frame source
///
/// Produces JPEG-shaped frames (valid markers, random body) from a real
/// buffer pool, and supports scripted transient failures for exercising
/// the retry path.
pub struct SimCamera {
    pool: FramePool,
    body_len: usize,
    frames_produced: u64,
    fail_budget: u32,
}

impl SimCamera {
    pub fn new(fb_count: usize) -> Self {
        Self {
            pool: FramePool::new(fb_count.max(1), 4096),
            body_len: 2048,
            frames_produced: 0,
            fail_budget: 0,
        }
    }

    /// Make the next `n` captures fail transiently
    pub fn fail_next(&mut self, n: u32) {
        self.fail_budget += n;
    }

    /// Number of frames successfully produced
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }
}

impl FrameSource for SimCamera {
    fn capture(&mut self) -> Result<Frame> {
        if self.fail_budget > 0 {
            self.fail_budget -= 1;
            return Err(Error::Capture("simulated sensor busy".to_string()));
        }

        let Some(mut buffer) = self.pool.acquire() else {
            return Err(Error::Capture("frame buffer pool exhausted".to_string()));
        };

        let mut rng = rand::thread_rng();
        buffer.extend_from_slice(&SOI);
        buffer.extend((0..self.body_len).map(|_| rng.gen::<u8>()));
        buffer.extend_from_slice(&EOI);

        self.frames_produced += 1;
        Ok(self.pool.frame(buffer))
    }
}

/// Recording servo output
///
/// Clones share the pulse log, so a test can keep a handle while the
/// controller owns another.
#[derive(Clone, Default)]
pub struct SimServo {
    pulses: Arc<Mutex<Vec<u32>>>,
}

impl SimServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pulse width commanded so far
    pub fn pulses(&self) -> Vec<u32> {
        self.pulses.lock().unwrap().clone()
    }

    /// Most recent pulse width, if any
    pub fn last_pulse(&self) -> Option<u32> {
        self.pulses.lock().unwrap().last().copied()
    }
}

impl PwmOutput for SimServo {
    fn set_pulse_us(&mut self, pulse_us: u32) {
        self.pulses.lock().unwrap().push(pulse_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_frames_are_jpeg_shaped() {
        let mut camera = SimCamera::new(1);
        let frame = camera.capture().unwrap();
        assert!(frame.as_bytes().starts_with(&SOI));
        assert!(frame.as_bytes().ends_with(&EOI));
        assert_eq!(frame.len(), 2048 + 4);
        assert_eq!(camera.frames_produced(), 1);
    }

    #[test]
    fn test_scripted_failures_then_recovery() {
        let mut camera = SimCamera::new(1);
        camera.fail_next(2);
        assert!(camera.capture().is_err());
        assert!(camera.capture().is_err());
        assert!(camera.capture().is_ok());
    }

    #[test]
    fn test_unreleased_frame_exhausts_pool() {
        let mut camera = SimCamera::new(1);
        let held = camera.capture().unwrap();
        // The single buffer is checked out, so the next capture fails
        assert!(camera.capture().is_err());
        drop(held);
        assert!(camera.capture().is_ok());
    }

    #[test]
    fn test_sim_servo_records_pulses() {
        let servo = SimServo::new();
        let mut output: Box<dyn PwmOutput> = Box::new(servo.clone());
        output.set_pulse_us(1500);
        output.set_pulse_us(2500);
        assert_eq!(servo.pulses(), vec![1500, 2500]);
        assert_eq!(servo.last_pulse(), Some(2500));
    }
}
