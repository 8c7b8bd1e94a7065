//! Stream orchestration: the per-cycle state machine
//!
//! One logical thread runs the cycle over and over: check the peer, drain
//! inbound command lines, capture one frame, transmit it, delay. There is
//! no parallelism and no async I/O; every step runs to completion before
//! the next, and the only suspension points are the two fixed delays
//! (inter-cycle and capture-retry).

use crate::config::TimingConfig;
use crate::core::camera::FrameSource;
use crate::core::command::{self, Command};
use crate::core::servo::ServoController;
use crate::link::LinkSession;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Orchestrator states: `Active` streams, `Idle` polls for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Active,
}

/// The single coordinator of both link flows
///
/// Owns the session, the camera, and the servo; everything else is
/// passive and synchronous beneath it.
pub struct StreamLoop {
    link: LinkSession,
    camera: Box<dyn FrameSource>,
    servo: ServoController,
    timing: TimingConfig,
    state: StreamState,
    shutdown: Arc<AtomicBool>,
}

impl StreamLoop {
    pub fn new(
        link: LinkSession,
        camera: Box<dyn FrameSource>,
        servo: ServoController,
        timing: TimingConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            link,
            camera,
            servo,
            timing,
            state: StreamState::Idle,
            shutdown,
        }
    }

    /// Run cycles until the shutdown flag is raised
    pub fn run(&mut self) {
        info!("Stream loop running as \"{}\"", self.link.name());
        while !self.shutdown.load(Ordering::Relaxed) {
            self.cycle();
        }
        info!("Stream loop stopped");
    }

    /// One cycle: peer check at the top, then either the active sequence
    /// or an idle poll delay
    fn cycle(&mut self) {
        match (self.state, self.link.has_peer()) {
            (StreamState::Idle, true) => {
                info!("Peer attached, streaming");
                self.state = StreamState::Active;
            }
            (StreamState::Active, false) => {
                info!("Peer detached, waiting for connection");
                self.state = StreamState::Idle;
            }
            _ => {}
        }

        match self.state {
            StreamState::Active => self.active_cycle(),
            StreamState::Idle => thread::sleep(Duration::from_millis(self.timing.idle_poll_ms)),
        }
    }

    /// Drain commands first, then capture and transmit one frame
    ///
    /// A failed capture skips the rest of the cycle after the retry
    /// back-off; the commands were already drained, nothing is lost.
    fn active_cycle(&mut self) {
        self.drain_commands();

        match self.camera.capture() {
            Ok(frame) => {
                debug!("Captured frame: {} bytes", frame.len());
                if let Err(e) = self.link.send_frame(frame.as_bytes()) {
                    warn!("Frame transmit failed: {}", e);
                }
                drop(frame); // buffer back to the pool before the delay
                thread::sleep(Duration::from_millis(self.timing.frame_interval_ms));
            }
            Err(e) => {
                warn!("{}", e);
                thread::sleep(Duration::from_millis(self.timing.capture_retry_ms));
            }
        }
    }

    /// Dispatch every line currently buffered on the link
    ///
    /// Runs to exhaustion of what is immediately available, never waiting
    /// for more input. Unrecognized lines are logged and dropped without a
    /// reply; applied servo commands are acknowledged on the link.
    fn drain_commands(&mut self) {
        for line in self.link.poll_lines() {
            match command::parse(&line) {
                Ok(Command::SetAngle { angle }) => {
                    let applied = self.servo.set_angle(i64::from(angle));
                    info!("Servo set to {}", applied);
                    if let Err(e) = self.link.send_line(&format!("Servo set to {}", applied)) {
                        warn!("Acknowledgment failed: {}", e);
                    }
                }
                Err(err) => warn!("{}", err),
            }
        }
    }
}

/// Terminal halt state for fatal faults
///
/// The process stays alive but unresponsive until an external reset;
/// there are no outgoing transitions.
pub fn halt() -> ! {
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}
