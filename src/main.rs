//! DrishtiIO daemon entry point
//!
//! Brings up the camera, the servo, and the host link, then hands control
//! to the stream loop. A camera that will not initialize is terminal; a
//! link that will not initialize only degrades the session.

use drishti_io::app::{self, StreamLoop};
use drishti_io::config::AppConfig;
use drishti_io::core::servo::ServoController;
use drishti_io::devices;
use drishti_io::error::Result;
use drishti_io::link::LinkSession;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::env;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `drishti-io <path>` (positional)
/// - `drishti-io --config <path>` (flag-based)
/// - `drishti-io -c <path>` (short flag)
///
/// Defaults to `/etc/drishti.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/drishti.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let from_file = Path::new(&config_path).exists();
    let config = if from_file {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::glasses_defaults()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DrishtiIO v0.1.0 starting...");
    if from_file {
        log::info!("Using config: {}", config_path);
    } else {
        log::warn!("Config {} not found, using built-in defaults", config_path);
    }

    // Imaging path first: a camera that cannot come up makes the device
    // pointless, so the process parks until someone resets it.
    let camera = match devices::create_camera(&config.camera) {
        Ok(camera) => camera,
        Err(e) => {
            log::error!("Camera init failed: {}", e);
            app::halt();
        }
    };

    let servo_output = devices::create_servo_output(&config.servo)?;
    let servo = ServoController::new(servo_output, config.servo.default_angle);

    let link = LinkSession::open(&config.device.name, &config.link);

    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(&shutdown))?;
    }

    let mut stream = StreamLoop::new(link, camera, servo, config.timing.clone(), shutdown);
    stream.run();

    log::info!("DrishtiIO stopped");
    Ok(())
}
