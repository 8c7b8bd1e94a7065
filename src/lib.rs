//! DrishtiIO - firmware core for wearable camera glasses
//!
//! Streams compressed frames from the image sensor to a paired host over
//! a serial-style wireless link, and accepts inline text commands on the
//! same link to drive a positional servo.
//!
//! ## Architecture
//!
//! - `transport`: byte-stream abstraction (serial hardware, mock)
//! - `link`: the host session (peer gating, line draining, frame framing)
//! - `core`: contracts (frame source, command grammar, servo control)
//! - `devices`: drivers (VC0706 serial JPEG camera, sysfs PWM servo, sims)
//! - `app`: the single-threaded cycle orchestrator

pub mod app;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod link;
pub mod transport;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
