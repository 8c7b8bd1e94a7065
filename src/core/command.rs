//! Inbound command line parsing
//!
//! One recognized command today: `S14:<integer>` moves the servo on
//! control channel 14. Everything else is an unrecognized line, logged by
//! the caller and dropped without a reply.

use super::servo::clamp_angle;

/// Grammar prefix for the servo command (channel 14 is the one control
/// line this hardware has)
pub const SET_ANGLE_PREFIX: &str = "S14:";

/// A parsed inbound command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the servo to an absolute angle, already clamped to `[0, 180]`
    SetAngle { angle: u8 },
}

/// A line that did not parse
///
/// Non-fatal and per-line; carries the offending input for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command received: {0}")]
    UnrecognizedCommand(String),
}

/// Parse one inbound line (terminator already stripped, whitespace
/// trimmed) into a command
pub fn parse(line: &str) -> Result<Command, ParseError> {
    match line.strip_prefix(SET_ANGLE_PREFIX) {
        Some(body) => Ok(Command::SetAngle {
            angle: clamp_angle(lenient_int(body)),
        }),
        None => Err(ParseError::UnrecognizedCommand(line.to_string())),
    }
}

/// Best-effort integer extraction
///
/// Skips leading whitespace, accepts an optional sign, then consumes a
/// run of decimal digits; trailing non-numeric characters are ignored and
/// a body with no digits yields 0. Deliberately lenient: the command
/// channel favors doing something plausible over rejecting input.
fn lenient_int(body: &str) -> i64 {
    let trimmed = body.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for c in digits.chars() {
        match c.to_digit(10) {
            Some(d) => {
                seen_digit = true;
                value = value.saturating_mul(10).saturating_add(d as i64);
            }
            None => break,
        }
    }

    if !seen_digit {
        return 0;
    }
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_set_angle() {
        assert_eq!(parse("S14:90"), Ok(Command::SetAngle { angle: 90 }));
        assert_eq!(parse("S14:0"), Ok(Command::SetAngle { angle: 0 }));
        assert_eq!(parse("S14:180"), Ok(Command::SetAngle { angle: 180 }));
    }

    #[test]
    fn test_out_of_range_clamped() {
        assert_eq!(parse("S14:181"), Ok(Command::SetAngle { angle: 180 }));
        assert_eq!(parse("S14:-5"), Ok(Command::SetAngle { angle: 0 }));
        assert_eq!(parse("S14:99999999999999999999"), Ok(Command::SetAngle { angle: 180 }));
    }

    #[test]
    fn test_permissive_integer_extraction() {
        // Trailing junk is ignored
        assert_eq!(parse("S14:90abc"), Ok(Command::SetAngle { angle: 90 }));
        // Leading whitespace in the body is skipped
        assert_eq!(parse("S14: 45"), Ok(Command::SetAngle { angle: 45 }));
        // Explicit plus sign
        assert_eq!(parse("S14:+30"), Ok(Command::SetAngle { angle: 30 }));
    }

    #[test]
    fn test_non_numeric_body_is_zero() {
        assert_eq!(parse("S14:abc"), Ok(Command::SetAngle { angle: 0 }));
        assert_eq!(parse("S14:"), Ok(Command::SetAngle { angle: 0 }));
        // A bare sign has no digits either
        assert_eq!(parse("S14:-"), Ok(Command::SetAngle { angle: 0 }));
    }

    #[test]
    fn test_unrecognized_lines() {
        for line in ["", "hello", "s14:90", "S15:90", "CMD:90,45", "14:90"] {
            assert_eq!(
                parse(line),
                Err(ParseError::UnrecognizedCommand(line.to_string()))
            );
        }
    }

    #[test]
    fn test_parse_error_carries_original_line() {
        let err = parse("garbage input").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown command received: garbage input"
        );
    }
}
