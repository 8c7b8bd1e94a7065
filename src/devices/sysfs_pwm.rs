//! Servo output through the Linux sysfs PWM interface

use crate::core::servo::PwmOutput;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 50 Hz servo frame
const PERIOD_NS: u64 = 20_000_000;

/// One PWM channel exported via `/sys/class/pwm`
pub struct SysfsPwm {
    channel_dir: PathBuf,
}

impl SysfsPwm {
    /// Export the channel and program the 20 ms servo period
    pub fn open(chip: u32, channel: u32) -> Result<Self> {
        let chip_dir = PathBuf::from(format!("/sys/class/pwm/pwmchip{}", chip));
        let channel_dir = chip_dir.join(format!("pwm{}", channel));

        if !channel_dir.exists() {
            write_attr(&chip_dir, "export", channel as u64)
                .map_err(|e| Error::InitializationFailed(format!("pwm export: {}", e)))?;
        }
        write_attr(&channel_dir, "period", PERIOD_NS)
            .map_err(|e| Error::InitializationFailed(format!("pwm period: {}", e)))?;
        write_attr(&channel_dir, "enable", 1)
            .map_err(|e| Error::InitializationFailed(format!("pwm enable: {}", e)))?;

        log::info!("Servo output on pwmchip{}/pwm{}", chip, channel);
        Ok(Self { channel_dir })
    }
}

impl PwmOutput for SysfsPwm {
    fn set_pulse_us(&mut self, pulse_us: u32) {
        // Fire-and-forget: the control line has no feedback channel, a
        // failed write only gets logged.
        if let Err(e) = write_attr(&self.channel_dir, "duty_cycle", u64::from(pulse_us) * 1_000) {
            log::warn!("PWM duty write failed: {}", e);
        }
    }
}

impl Drop for SysfsPwm {
    fn drop(&mut self) {
        let _ = write_attr(&self.channel_dir, "enable", 0);
    }
}

fn write_attr(dir: &Path, attr: &str, value: u64) -> std::io::Result<()> {
    fs::write(dir.join(attr), value.to_string())
}
