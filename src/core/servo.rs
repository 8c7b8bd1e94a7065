//! Servo control: clamped absolute positioning over one PWM line

/// Lowest commandable angle
pub const ANGLE_MIN: u8 = 0;
/// Highest commandable angle
pub const ANGLE_MAX: u8 = 180;

/// Standard hobby-servo pulse range in microseconds over the full travel
const PULSE_MIN_US: u32 = 500;
const PULSE_MAX_US: u32 = 2500;

/// The single control line toward the servo
///
/// Fire-and-forget: the actuation primitive has no feedback channel, so
/// implementations log their own faults instead of returning them.
pub trait PwmOutput: Send {
    /// Drive the line with the given pulse width
    fn set_pulse_us(&mut self, pulse_us: u32);
}

/// Owns the servo position state and the output that realizes it
///
/// Constructed once at startup (which doubles as the move-to-default
/// initialization) and threaded through the orchestrator; there is no
/// process-wide position global.
pub struct ServoController {
    output: Box<dyn PwmOutput>,
    current_angle: u8,
}

impl ServoController {
    /// Attach to the output and move to the default angle
    pub fn new(output: Box<dyn PwmOutput>, default_angle: u8) -> Self {
        let mut servo = Self {
            output,
            current_angle: 0,
        };
        let applied = servo.set_angle(i64::from(default_angle));
        log::info!("Servo initialized at {}°", applied);
        servo
    }

    /// Move to `target`, clamped into `[0, 180]`
    ///
    /// Out-of-range requests are silently normalized, never rejected.
    /// Returns the applied angle.
    pub fn set_angle(&mut self, target: i64) -> u8 {
        let angle = clamp_angle(target);
        self.output.set_pulse_us(angle_to_pulse_us(angle));
        self.current_angle = angle;
        angle
    }

    /// Last commanded angle
    pub fn current_angle(&self) -> u8 {
        self.current_angle
    }
}

/// Constrain an angle into the servo range, saturating at the bounds
pub fn clamp_angle(value: i64) -> u8 {
    value.clamp(i64::from(ANGLE_MIN), i64::from(ANGLE_MAX)) as u8
}

/// Map an angle to its pulse width (500 µs at 0°, 2500 µs at 180°)
fn angle_to_pulse_us(angle: u8) -> u32 {
    PULSE_MIN_US + u32::from(angle) * (PULSE_MAX_US - PULSE_MIN_US) / u32::from(ANGLE_MAX)
}
