//! Configuration for the DrishtiIO firmware
//!
//! Loads configuration from a TOML file with the minimal parameters the
//! firmware needs: link attachment, camera attachment and format, servo
//! output, and cycle timing.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub link: LinkConfig,
    pub camera: CameraConfig,
    pub servo: ServoConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Device identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Name advertised to peers so they can discover and attach
    pub name: String,
}

/// Host link configuration (the serial-style wireless transport)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Serial device node for the paired link (e.g. `/dev/rfcomm0`)
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// How peer attachment is sensed
    #[serde(default)]
    pub peer_detect: PeerDetect,
}

/// Peer-attachment sensing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerDetect {
    /// Poll the carrier-detect modem line (rfcomm asserts it while a
    /// client is attached)
    #[default]
    Carrier,
    /// Assume a peer is always attached (links without modem lines)
    Always,
}

/// Imaging peripheral configuration
///
/// Collaborator parameters handed to the camera driver once at
/// initialization; the core never interprets them beyond driver selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Camera driver: "vc0706" (serial JPEG camera) or "sim"
    pub driver: String,
    /// Serial device node the camera is attached to
    pub port: String,
    /// Camera baud rate
    pub baud: u32,
    /// Capture resolution
    pub frame_size: FrameSize,
    /// JPEG compression ratio (higher = smaller frames)
    pub jpeg_quality: u8,
    /// Number of frame buffers in the capture pool
    pub fb_count: usize,
}

/// Supported capture resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSize {
    /// 640x480
    Vga,
    /// 320x240
    Qvga,
    /// 160x120
    Qqvga,
}

/// Servo output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServoConfig {
    /// Servo output driver: "sysfs" (Linux PWM) or "sim"
    #[serde(default = "default_servo_output")]
    pub output: String,
    /// sysfs PWM chip index (`/sys/class/pwm/pwmchipN`)
    pub pwm_chip: u32,
    /// PWM channel within the chip
    pub pwm_channel: u32,
    /// Angle commanded at startup
    pub default_angle: u8,
}

fn default_servo_output() -> String {
    "sysfs".to_string()
}

/// Cycle timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Delay after each transmitted frame (bounds the outbound frame rate)
    pub frame_interval_ms: u64,
    /// Delay between peer polls while no peer is attached
    pub idle_poll_ms: u64,
    /// Back-off after a failed capture before the next cycle
    pub capture_retry_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration for the camera-glasses reference hardware
    ///
    /// Suitable for testing and development; deployments should use a
    /// proper TOML configuration file.
    pub fn glasses_defaults() -> Self {
        Self {
            device: DeviceConfig {
                name: "DRISHTI_CAM".to_string(),
            },
            link: LinkConfig {
                port: "/dev/rfcomm0".to_string(),
                baud: 115_200,
                peer_detect: PeerDetect::Carrier,
            },
            camera: CameraConfig {
                driver: "vc0706".to_string(),
                port: "/dev/ttyS1".to_string(),
                baud: 38_400,
                frame_size: FrameSize::Qvga,
                jpeg_quality: 24,
                fb_count: 1,
            },
            servo: ServoConfig {
                output: "sysfs".to_string(),
                pwm_chip: 0,
                pwm_channel: 0,
                default_angle: 90,
            },
            timing: TimingConfig {
                frame_interval_ms: 1000,
                idle_poll_ms: 500,
                capture_retry_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::glasses_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::glasses_defaults();
        assert_eq!(config.device.name, "DRISHTI_CAM");
        assert_eq!(config.link.port, "/dev/rfcomm0");
        assert_eq!(config.link.peer_detect, PeerDetect::Carrier);
        assert_eq!(config.camera.driver, "vc0706");
        assert_eq!(config.camera.frame_size, FrameSize::Qvga);
        assert_eq!(config.camera.fb_count, 1);
        assert_eq!(config.servo.default_angle, 90);
        assert_eq!(config.timing.frame_interval_ms, 1000);
        assert_eq!(config.timing.idle_poll_ms, 500);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::glasses_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should contain all sections
        assert!(toml_string.contains("[device]"));
        assert!(toml_string.contains("[link]"));
        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[servo]"));
        assert!(toml_string.contains("[timing]"));
        assert!(toml_string.contains("[logging]"));

        // Should contain key values
        assert!(toml_string.contains("name = \"DRISHTI_CAM\""));
        assert!(toml_string.contains("frame_interval_ms = 1000"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[device]
name = "BENCH_CAM"

[link]
port = "/dev/ttyUSB0"
baud = 230400
peer_detect = "always"

[camera]
driver = "sim"
port = "/dev/ttyUSB1"
baud = 38400
frame_size = "vga"
jpeg_quality = 36
fb_count = 2

[servo]
pwm_chip = 1
pwm_channel = 2
default_angle = 45

[timing]
frame_interval_ms = 200
idle_poll_ms = 100
capture_retry_ms = 250

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.name, "BENCH_CAM");
        assert_eq!(config.link.peer_detect, PeerDetect::Always);
        assert_eq!(config.camera.frame_size, FrameSize::Vga);
        assert_eq!(config.camera.fb_count, 2);
        assert_eq!(config.servo.default_angle, 45);
        // output was omitted, the sysfs driver is the default
        assert_eq!(config.servo.output, "sysfs");
        assert_eq!(config.timing.capture_retry_ms, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_peer_detect_defaults_to_carrier() {
        let toml_content = r#"
[device]
name = "X"

[link]
port = "/dev/rfcomm0"
baud = 115200

[camera]
driver = "sim"
port = "/dev/null"
baud = 38400
frame_size = "qvga"
jpeg_quality = 24
fb_count = 1

[servo]
pwm_chip = 0
pwm_channel = 0
default_angle = 90

[timing]
frame_interval_ms = 1000
idle_poll_ms = 500
capture_retry_ms = 1000

[logging]
level = "info"
"#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.link.peer_detect, PeerDetect::Carrier);
    }
}
