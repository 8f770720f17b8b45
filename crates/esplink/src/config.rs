//! CLI configuration: thin wrapper around `esplink_config`.
//!
//! Loads the shared TOML + environment config and applies the
//! `GlobalOpts` flag overrides (--host, --timeout) on top.

use std::path::PathBuf;

use clap::ValueEnum;

use esplink_core::DeviceConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use esplink_config::{Config, config_path, load_config_from, render_redacted, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `ESPLINK_CONFIG`, else the platform default.
pub fn resolved_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config and apply flag overrides. Flags beat environment,
/// environment beats the file.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&resolved_path(global))?;
    if let Some(ref host) = global.host {
        cfg.device.host.clone_from(host);
    }
    if let Some(timeout) = global.timeout {
        cfg.device.timeout_secs = timeout;
    }
    Ok(cfg)
}

/// Translate the resolved config into the core `DeviceConfig`.
pub fn device_config(cfg: &Config) -> Result<DeviceConfig, CliError> {
    Ok(cfg.to_device_config()?)
}

/// The `[defaults]` section as typed values.
pub fn format_defaults(cfg: &Config) -> Result<(OutputFormat, ColorMode), CliError> {
    let output = OutputFormat::from_str(&cfg.defaults.output, true)
        .map_err(|reason| invalid_default("defaults.output", reason))?;
    let color = ColorMode::from_str(&cfg.defaults.color, true)
        .map_err(|reason| invalid_default("defaults.color", reason))?;
    Ok((output, color))
}

fn invalid_default(field: &str, reason: String) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason,
    }
}
