use std::path::{Path, PathBuf};
use std::time::Duration;

use ledatronic_frame::{FrameConfig, PAYLOAD_LEN};
use ledatronic_schema::Schema;
use ledatronic_transport::{ConnectOptions, DeviceAddr};
use serde::Deserialize;

use crate::error::{PollError, Result};

/// Default controller port.
pub const DEFAULT_PORT: u16 = 10001;

/// Default poll cycle in seconds.
pub const DEFAULT_CYCLE_SECS: u64 = 300;

/// Shortest accepted poll cycle in seconds.
pub const MIN_CYCLE_SECS: u64 = 10;

const DEFAULT_NAME: &str = "ledatronic";
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Plugin instance name; also the caller name for item updates.
    #[serde(default = "default_name")]
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds between poll starts; values below the floor are raised to it.
    #[serde(default = "default_cycle")]
    pub cycle: u64,
    /// Host item that pauses and resumes polling.
    #[serde(default)]
    pub pause_item: Option<String>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Unset means a stalled controller blocks the poll indefinitely.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default = "default_payload_len")]
    pub payload_len: usize,
    /// Field schema file; the built-in layout when unset.
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
}

impl PollerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            name: default_name(),
            host: host.into(),
            port,
            cycle: DEFAULT_CYCLE_SECS,
            pause_item: None,
            connect_timeout_ms: None,
            read_timeout_ms: None,
            payload_len: PAYLOAD_LEN,
            schema_file: None,
        }
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|err| PollError::Config(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PollError::Config(format!(
                "{}: file size {} exceeds max {MAX_CONFIG_FILE_SIZE}",
                path.display(),
                metadata.len()
            )));
        }
        let json = std::fs::read_to_string(path)
            .map_err(|err| PollError::Config(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| PollError::Config(format!("parse failed: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PollError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(PollError::Config("port must not be 0".to_string()));
        }
        if self.payload_len == 0 {
            return Err(PollError::Config("payload_len must not be 0".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(PollError::Config("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Poll cycle with the minimum floor applied.
    pub fn effective_cycle(&self) -> Duration {
        Duration::from_secs(self.cycle.max(MIN_CYCLE_SECS))
    }

    pub fn addr(&self) -> DeviceAddr {
        DeviceAddr::new(self.host.clone(), self.port)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            payload_len: self.payload_len,
        }
    }

    /// The configured schema file, or the built-in layout.
    pub fn load_schema(&self) -> Result<Schema> {
        match &self.schema_file {
            Some(path) => Ok(Schema::from_json_file(path)?),
            None => Ok(Schema::ledatronic()),
        }
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cycle() -> u64 {
    DEFAULT_CYCLE_SECS
}

fn default_payload_len() -> usize {
    PAYLOAD_LEN
}
