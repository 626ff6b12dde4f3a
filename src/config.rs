//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use crate::codec::motion::MotionThresholds;
use crate::codec::protocol::{ARCHIVE_HEADER_LINE, LIVE_PACKET_SIZE};
use crate::error::{GpsLogError, Result};
use crate::telemetry::export::ExportFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub motion: MotionThresholds,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Live UDP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ListenerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

/// Archive file configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    #[serde(default = "default_header_line")]
    pub header_line: String,
}

/// Text report configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_heading_delta_threshold_deg")]
    pub heading_delta_threshold_deg: f64,

    #[serde(default = "default_show_raw_hex_on_error")]
    pub show_raw_hex_on_error: bool,
}

/// Export configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,
}

// Default value functions
fn default_bind_addr() -> IpAddr { IpAddr::from([0, 0, 0, 0]) }
fn default_port() -> u16 { 9000 }
fn default_max_datagram_size() -> usize { 1024 }

fn default_header_line() -> String { ARCHIVE_HEADER_LINE.to_string() }

fn default_heading_delta_threshold_deg() -> f64 { 5.0 }
fn default_show_raw_hex_on_error() -> bool { true }

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_datagram_size: default_max_datagram_size(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            header_line: default_header_line(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            heading_delta_threshold_deg: default_heading_delta_threshold_deg(),
            show_raw_hex_on_error: default_show_raw_hex_on_error(),
        }
    }
}

impl ListenerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
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
    /// use gpslog::config::Config;
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
        if self.listener.port == 0 {
            return Err(GpsLogError::Config(
                toml::de::Error::custom("listener port must be between 1 and 65535")
            ));
        }

        if self.listener.max_datagram_size < LIVE_PACKET_SIZE
            || self.listener.max_datagram_size > 65_507 {
            return Err(GpsLogError::Config(
                toml::de::Error::custom(format!(
                    "max_datagram_size must be between {} and 65507",
                    LIVE_PACKET_SIZE
                ))
            ));
        }

        if self.archive.header_line.is_empty() || self.archive.header_line.contains('\n') {
            return Err(GpsLogError::Config(
                toml::de::Error::custom("header_line must be a single non-empty line")
            ));
        }

        let threshold = self.report.heading_delta_threshold_deg;
        if !(0.0..=180.0).contains(&threshold) {
            return Err(GpsLogError::Config(
                toml::de::Error::custom("heading_delta_threshold_deg must be between 0.0 and 180.0")
            ));
        }

        // Validate motion thresholds
        for (name, value) in self.motion.named_values() {
            if !value.is_finite() || value <= 0.0 {
                return Err(GpsLogError::Config(
                    toml::de::Error::custom(format!("motion {} must be a positive number", name))
                ));
            }
        }

        Ok(())
    }
}
