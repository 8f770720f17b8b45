//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use esplink_config::ConfigError;
use esplink_core::{CoreError, TransportFailure};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the device: {message}")]
    #[diagnostic(
        code(esplink::unreachable),
        help(
            "Check that the board is powered and on the same network.\n\
             Set its address with --host, ESPLINK_HOST, or [device] host in the config file."
        )
    )]
    Unreachable { message: String },

    #[error("Device returned an error: {message}")]
    #[diagnostic(code(esplink::device_error))]
    DeviceError { message: String },

    #[error("Command '{command}' was not accepted: {reason}")]
    #[diagnostic(
        code(esplink::command_failed),
        help("The displayed state will be corrected by the next status read.")
    )]
    CommandFailed { command: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Invalid username or password")]
    #[diagnostic(
        code(esplink::auth_failed),
        help(
            "The accepted account is set by [login] in the config file \
             or ESPLINK_USERNAME / ESPLINK_PASSWORD."
        )
    )]
    AuthFailed,

    #[error("No password supplied")]
    #[diagnostic(
        code(esplink::no_credentials),
        help("Pass --password, set ESPLINK_LOGIN_PASSWORD, or run from a terminal to be prompted.")
    )]
    NoCredentials,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid command: {reason}")]
    #[diagnostic(code(esplink::invalid_command), help("The door accepts 0 (closed) or 90 (open)."))]
    InvalidCommand { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(esplink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(code(esplink::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(esplink::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Device did not answer in time")]
    #[diagnostic(
        code(esplink::timeout),
        help("Increase the timeout with --timeout or check the device's responsiveness.")
    )]
    Timeout,

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Controller stopped before the operation finished")]
    #[diagnostic(code(esplink::stopped))]
    Stopped,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::CommandFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::InvalidCommand { .. }
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { failure, message } => match failure {
                TransportFailure::Unreachable => CliError::Unreachable { message },
                TransportFailure::TimedOut => CliError::Timeout,
                TransportFailure::Rejected { .. }
                | TransportFailure::Malformed
                | TransportFailure::Other => CliError::DeviceError { message },
            },
            CoreError::InvalidCommand { message } => CliError::InvalidCommand { reason: message },
            CoreError::InvalidCredentials | CoreError::NotAuthorized => CliError::AuthFailed,
            CoreError::Stopped => CliError::Stopped,
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_pick_distinct_exit_codes() {
        let unreachable = CliError::from(CoreError::Transport {
            failure: TransportFailure::Unreachable,
            message: "connection refused".into(),
        });
        assert_eq!(unreachable.exit_code(), exit_code::CONNECTION);

        let timed_out = CliError::from(CoreError::Transport {
            failure: TransportFailure::TimedOut,
            message: "timed out".into(),
        });
        assert_eq!(timed_out.exit_code(), exit_code::TIMEOUT);

        let rejected = CliError::from(CoreError::Transport {
            failure: TransportFailure::Rejected { status: 500 },
            message: "HTTP 500".into(),
        });
        assert_eq!(rejected.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn session_and_validation_errors() {
        assert_eq!(
            CliError::from(CoreError::InvalidCredentials).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(CoreError::InvalidCommand {
                message: "door angle 45".into()
            })
            .exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(ConfigError::Validation {
                field: "poll.interval_ms".into(),
                reason: "must be greater than zero".into(),
            })
            .exit_code(),
            exit_code::USAGE
        );
    }
}
