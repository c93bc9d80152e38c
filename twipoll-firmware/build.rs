//! Build script for twipoll-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates sensor.toml and generates the configuration constants

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use twipoll_core::PollerConfig;

/// Fastest SCL the bit-banged controller is rated for
const MAX_TWI_FREQUENCY: u32 = 400_000;

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct BoardConfig {
    serial: SerialSection,
    twi: TwiSection,
    poller: PollerConfig,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SerialSection {
    baudrate: u32,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self { baudrate: 9600 }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TwiSection {
    frequency: u32,
}

impl Default for TwiSection {
    fn default() -> Self {
        Self { frequency: 100_000 }
    }
}

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|e| fail("OUT_DIR not set", e)));
    setup_linker(&out_dir);

    let config = load_config(Path::new("sensor.toml"));
    validate(&config);
    write_config(&out_dir, &config);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    fs::write(out_dir.join("memory.x"), memory_x)
        .unwrap_or_else(|e| fail("failed to write memory.x", e));

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

fn load_config(path: &Path) -> BoardConfig {
    println!("cargo:rerun-if-changed={}", path.display());

    if !path.exists() {
        banner(
            "sensor.toml not found",
            &["The firmware requires a sensor.toml next to Cargo.toml.".into()],
        );
    }

    let content = fs::read_to_string(path).unwrap_or_else(|e| fail("failed to read sensor.toml", e));
    toml::from_str(&content).unwrap_or_else(|e| fail("invalid sensor.toml", e))
}

fn validate(config: &BoardConfig) {
    let mut errors = Vec::new();

    if let Err(e) = config.poller.validate() {
        errors.push(format!("[poller] {:?}", e));
    }
    if config.serial.baudrate == 0 {
        errors.push("[serial] baudrate cannot be 0".to_string());
    }
    if config.twi.frequency == 0 || config.twi.frequency > MAX_TWI_FREQUENCY {
        errors.push(format!(
            "[twi] frequency must be 1-{} Hz, got {}",
            MAX_TWI_FREQUENCY, config.twi.frequency
        ));
    }

    if !errors.is_empty() {
        banner("Invalid sensor.toml", &errors);
    }
}

fn write_config(out_dir: &Path, config: &BoardConfig) {
    let p = &config.poller;
    let s = &p.sensor;
    let mut code = String::new();

    // Infallible for String
    let _ = writeln!(code, "// Generated from sensor.toml by build.rs");
    let _ = writeln!(code, "pub const SERIAL_BAUDRATE: u32 = {};", config.serial.baudrate);
    let _ = writeln!(code, "pub const TWI_FREQUENCY: u32 = {};", config.twi.frequency);
    let _ = writeln!(
        code,
        "pub const POLLER: twipoll_core::PollerConfig = twipoll_core::PollerConfig {{\n    \
         sensor: twipoll_core::SensorConfig {{\n        \
         address: {:#04x},\n        \
         power_register: {:#04x},\n        \
         wake_value: {:#04x},\n        \
         axis_high_register: {:#04x},\n        \
         axis_low_register: {:#04x},\n    \
         }},\n    \
         interval_ms: {},\n    \
         newline: {:#04x},\n    \
         bus_wait_polls: {},\n\
         }};",
        s.address,
        s.power_register,
        s.wake_value,
        s.axis_high_register,
        s.axis_low_register,
        p.interval_ms,
        p.newline,
        p.bus_wait_polls,
    );

    fs::write(out_dir.join("config.rs"), code).unwrap_or_else(|e| fail("failed to write config.rs", e));
}

fn fail(what: &str, err: impl std::fmt::Display) -> ! {
    banner(what, &[err.to_string()])
}

fn banner(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}
