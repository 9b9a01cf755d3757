use config::{Config, Environment, File};
use mbrs_logger::LogSettings;
use modbus_rtu_slave::{DEFAULT_BUFFER_SIZE, DEFAULT_STATS_BASE};
use serde::Deserialize;
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "device";
const ENV_PREFIX: &str = "MBRS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Top-level device configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub slave: SlaveConfig,
    pub transport: TransportConfig,
    pub registers: RegisterConfig,
    pub log: LogSettings,
}

/// Protocol engine settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlaveConfig {
    pub address: u8,
    pub stats_base: u16,
    pub rx_capacity: usize,
    pub tx_capacity: usize,
}

/// RTU over TCP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub listen: SocketAddr,
    /// Line speed used to derive the inter-frame silence (t3.5).
    pub baud_rate: u32,
    /// Overrides the silence derived from `baud_rate`, in microseconds.
    pub frame_gap_us: Option<u64>,
    pub max_connections: usize,
}

/// Register bank sizes, in items.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    pub coils: usize,
    pub discrete_inputs: usize,
    pub holding_registers: usize,
}

impl TransportConfig {
    /// Silence that closes a frame on this transport.
    ///
    /// # Errors
    /// Fails for a zero baud rate without an explicit `frame_gap_us`.
    pub fn frame_gap(&self) -> Result<Duration, modbus_rtu_slave::SlaveError> {
        self.frame_gap_us.map_or_else(
            || modbus_rtu_slave::timing::inter_frame_delay(self.baud_rate),
            |us| Ok(Duration::from_micros(us)),
        )
    }
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            address: 1,
            stats_base: DEFAULT_STATS_BASE,
            rx_capacity: DEFAULT_BUFFER_SIZE,
            tx_capacity: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5020),
            baud_rate: 19_200,
            frame_gap_us: None,
            max_connections: 16,
        }
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self { coils: 1024, discrete_inputs: 1024, holding_registers: 1024 }
    }
}

/// Loads the device configuration.
///
/// Settings come from the file at `path` (any format the `config` crate
/// recognises by extension) overlaid with `MBRS__` environment variables,
/// e.g. `MBRS__SLAVE__ADDRESS=7` or `MBRS__TRANSPORT__LISTEN=127.0.0.1:502`.
/// Without a `path` the optional `device` file in the working directory is used.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicitly given file is missing or
/// the merged values do not match [`DeviceConfig`].
pub fn load_config(path: Option<&Path>) -> Result<DeviceConfig, ConfigError> {
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.to_path_buf(), true),
    );

    info!(path = %effective_path.display(), required, "Loading config");

    Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
        )
        .build()
        .map_err(|source| ConfigError::Config {
            source,
            context: Some("Failed to build config".into()),
        })?
        .try_deserialize::<DeviceConfig>()
        .map_err(|source| ConfigError::Config {
            source,
            context: Some("Failed to deserialize config".into()),
        })
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = DeviceConfig::default();
        assert_eq!(cfg.slave.address, 1);
        assert_eq!(cfg.slave.stats_base, 0xAA00);
        assert_eq!(cfg.transport.listen.port(), 5020);
        assert_eq!(cfg.transport.baud_rate, 19_200);
        assert_eq!(cfg.registers.holding_registers, 1024);
        assert_eq!(cfg.transport.frame_gap().unwrap(), Duration::from_micros(2006));
    }

    #[test]
    fn test_partial_deserialize() {
        let raw = json!({
            "slave": { "address": 17 },
            "transport": { "listen": "127.0.0.1:1502", "frame_gap_us": 5000 },
            "log": { "level": "debug" }
        });

        let cfg: DeviceConfig = serde_json::from_value(raw).expect("config deserialize");
        assert_eq!(cfg.slave.address, 17);
        assert_eq!(cfg.slave.rx_capacity, DEFAULT_BUFFER_SIZE);
        assert_eq!(cfg.transport.listen, "127.0.0.1:1502".parse().unwrap());
        assert_eq!(cfg.transport.frame_gap().unwrap(), Duration::from_millis(5));
        assert_eq!(cfg.registers.coils, 1024);
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn test_load_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[slave]\naddress = 42\n\n[registers]\ncoils = 64")?;

        let cfg = load_config(Some(file.path()))?;
        assert_eq!(cfg.slave.address, 42);
        assert_eq!(cfg.registers.coils, 64);
        assert_eq!(cfg.registers.discrete_inputs, 1024);
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let err = load_config(Some(Path::new("/nonexistent/mbrs-device.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to build config"));
    }
}
