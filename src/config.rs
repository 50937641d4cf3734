//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::thruster::ThrustProfile;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub thrusters: ThrustProfile,

    #[serde(default)]
    pub control: ControlConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Read window for one device response. Also bounds how long a loop tick
    /// can stall waiting on the device.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    /// Minimum loop period. A throttle, not a real-time guarantee.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115_200 }
fn default_timeout_ms() -> u64 { 50 }

fn default_tick_ms() -> u64 { 10 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { tick_ms: default_tick_ms() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            thrusters: ThrustProfile::default(),
            control: ControlConfig::default(),
        }
    }
}

impl SerialConfig {
    /// Per-call read timeout for `DeviceLink::receive`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ControlConfig {
    /// Loop tick period
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rov_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if ![9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600]
            .contains(&self.serial.baud_rate)
        {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom(
                    "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600"
                )
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10_000 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("timeout_ms must be between 1 and 10000")
            ));
        }

        if self.control.tick_ms == 0 || self.control.tick_ms > 1000 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("tick_ms must be between 1 and 1000")
            ));
        }

        for (name, value) in [
            ("scaling", self.thrusters.scaling),
            ("z_scaling", self.thrusters.z_scaling),
        ] {
            if !value.is_finite() {
                return Err(crate::error::BridgeError::Config(
                    toml::de::Error::custom(format!("{} must be a finite number", name))
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.thrusters.power_min, self.thrusters.power_max) {
            if min >= max {
                return Err(crate::error::BridgeError::Config(
                    toml::de::Error::custom("power_min must be less than power_max")
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_serial_port(), "/dev/ttyACM0");
        assert_eq!(default_baud_rate(), 115_200);
        assert_eq!(default_timeout_ms(), 50);
        assert_eq!(default_tick_ms(), 10);
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(50));
        assert_eq!(config.control.tick(), Duration::from_millis(10));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"
baud_rate = 115200
timeout_ms = 50

[thrusters]
scaling = 1000.0
zero_shift = 3300

[control]
tick_ms = 10
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.thrusters.zero_shift, 3300);
    }

    #[test]
    fn test_load_applies_section_defaults() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        // An empty file is a valid config: every field has a default.
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"").unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.thrusters.z_zero_shift, 5200);
        assert_eq!(config.control.tick_ms, 10);
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 123_456;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &[9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600] {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_timeout_ms_zero() {
        let mut config = Config::default();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_too_high() {
        let mut config = Config::default();
        config.serial.timeout_ms = 10_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_ms_zero() {
        let mut config = Config::default();
        config.control.tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_scaling() {
        let mut config = Config::default();
        config.thrusters.scaling = f32::NAN;
        assert!(config.validate().is_err());

        config.thrusters.scaling = 1000.0;
        config.thrusters.z_scaling = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_power_range() {
        let mut config = Config::default();
        config.thrusters.power_min = Some(5000);
        config.thrusters.power_max = Some(1000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_power_range() {
        let mut config = Config::default();
        config.thrusters.power_min = Some(0);
        config.thrusters.power_max = Some(9999);
        assert!(config.validate().is_ok());
    }
}
