//! Device implementations and driver selection

pub mod sim;
pub mod sysfs_pwm;
pub mod vc0706;

use crate::config::{CameraConfig, PeerDetect, ServoConfig};
use crate::core::camera::FrameSource;
use crate::core::servo::PwmOutput;
use crate::error::{Error, Result};
use crate::transport::SerialTransport;

/// Create the camera driver named by the configuration
pub fn create_camera(config: &CameraConfig) -> Result<Box<dyn FrameSource>> {
    match config.driver.as_str() {
        "vc0706" => {
            let transport = SerialTransport::open(&config.port, config.baud, PeerDetect::Always)
                .map_err(|e| {
                    Error::InitializationFailed(format!("camera port {}: {}", config.port, e))
                })?;
            let camera = vc0706::Vc0706Camera::new(Box::new(transport), config)?;
            Ok(Box::new(camera))
        }
        "sim" => Ok(Box::new(sim::SimCamera::new(config.fb_count))),
        other => Err(Error::InvalidConfig(format!(
            "unknown camera driver: {}",
            other
        ))),
    }
}

/// Create the servo output named by the configuration
pub fn create_servo_output(config: &ServoConfig) -> Result<Box<dyn PwmOutput>> {
    match config.output.as_str() {
        "sysfs" => {
            let pwm = sysfs_pwm::SysfsPwm::open(config.pwm_chip, config.pwm_channel)?;
            Ok(Box::new(pwm))
        }
        "sim" => Ok(Box::new(sim::SimServo::new())),
        other => Err(Error::InvalidConfig(format!(
            "unknown servo output: {}",
            other
        ))),
    }
}
