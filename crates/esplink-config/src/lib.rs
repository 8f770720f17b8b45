//! Shared configuration for esplink tools.
//!
//! TOML file + environment layering via figment, login credentials for the
//! session gate, and translation to `esplink_core::DeviceConfig`. The CLI
//! adds flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use esplink_core::session::{DEFAULT_PASSWORD, DEFAULT_USERNAME};
use esplink_core::{DeviceConfig, OrderingPolicy, SessionGate};

/// Prefix for nested environment overrides, e.g. `ESPLINK_POLL__INTERVAL_MS`.
pub const ENV_PREFIX: &str = "ESPLINK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub poll: PollSection,

    #[serde(default)]
    pub login: LoginSection,

    #[serde(default)]
    pub defaults: Defaults,
}

/// Where the device lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Bare host, `host:port`, or full URL.
    #[serde(default = "default_host")]
    pub host: String,

    /// Per-request timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "192.168.4.1".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Status polling and command confirmation timings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,

    #[serde(default)]
    pub ordering: OrderingPolicy,

    /// Sensor samples kept for `watch` summaries.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            confirm_delay_ms: default_confirm_delay_ms(),
            ordering: OrderingPolicy::default(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}
fn default_confirm_delay_ms() -> u64 {
    500
}
fn default_history_capacity() -> usize {
    720
}

/// The single account the session gate accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoginSection {
    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext; prefer `ESPLINK_PASSWORD`.
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for LoginSection {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

fn default_username() -> String {
    DEFAULT_USERNAME.into()
}
fn default_password() -> String {
    DEFAULT_PASSWORD.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "esplink", "esplink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("esplink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) layered under the environment.
///
/// Precedence, lowest first: built-in defaults, the TOML file, nested
/// `ESPLINK_SECTION__KEY` variables, then the `ESPLINK_HOST`,
/// `ESPLINK_USERNAME` and `ESPLINK_PASSWORD` shorthands.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().filter_map(|key| {
            if key == "ESPLINK_HOST" {
                Some("device.host".into())
            } else if key == "ESPLINK_USERNAME" {
                Some("login.username".into())
            } else if key == "ESPLINK_PASSWORD" {
                Some("login.password".into())
            } else {
                None
            }
        }));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// TOML rendering with the password masked.
pub fn render_redacted(cfg: &Config) -> Result<String, ConfigError> {
    let mut shown = cfg.clone();
    shown.login.password = "********".into();
    Ok(toml::to_string_pretty(&shown)?)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Build the core `DeviceConfig`.
    pub fn to_device_config(&self) -> Result<DeviceConfig, ConfigError> {
        let mut device =
            DeviceConfig::for_host(&self.device.host).map_err(|e| ConfigError::Validation {
                field: "device.host".into(),
                reason: e.to_string(),
            })?;

        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "poll.interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }

        device.timeout = (self.device.timeout_secs > 0)
            .then(|| Duration::from_secs(self.device.timeout_secs));
        device.poll_interval = Duration::from_millis(self.poll.interval_ms);
        device.confirm_delay = Duration::from_millis(self.poll.confirm_delay_ms);
        device.ordering = self.poll.ordering;
        device.history_capacity = self.poll.history_capacity;
        Ok(device)
    }

    /// Gate that accepts the configured login.
    pub fn session_gate(&self) -> SessionGate {
        SessionGate::new(
            self.login.username.clone(),
            SecretString::from(self.login.password.clone()),
        )
    }
}
