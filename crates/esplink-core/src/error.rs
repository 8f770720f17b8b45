// ── Core error types ──
//
// User-facing errors from esplink-core. Every way a single HTTP call can go
// wrong collapses into `CoreError::Transport`; the `failure` field keeps
// just enough detail for exit codes and log lines.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Device call failed: {message}")]
    Transport {
        failure: TransportFailure,
        message: String,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    // ── Session ──────────────────────────────────────────────────────
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session is not authorized to control the device")]
    NotAuthorized,

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Controller has been shut down")]
    Stopped,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of a failed device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TransportFailure {
    /// The request never reached the device.
    Unreachable,
    /// The device did not answer within the timeout.
    TimedOut,
    /// The device answered with a non-2xx status.
    Rejected { status: u16 },
    /// The device answered 2xx with an unusable body.
    Malformed,
    /// Anything else (client construction, body encoding).
    Other,
}

impl CoreError {
    /// Whether this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Transport failure classification, if this is a transport error.
    pub fn transport_failure(&self) -> Option<TransportFailure> {
        match self {
            Self::Transport { failure, .. } => Some(*failure),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<esplink_api::Error> for CoreError {
    fn from(err: esplink_api::Error) -> Self {
        let failure = match &err {
            esplink_api::Error::Transport(e) if e.is_timeout() => TransportFailure::TimedOut,
            esplink_api::Error::Transport(e) if e.is_connect() => TransportFailure::Unreachable,
            esplink_api::Error::Transport(e) => match e.status() {
                Some(status) => TransportFailure::Rejected {
                    status: status.as_u16(),
                },
                None => TransportFailure::Unreachable,
            },
            esplink_api::Error::Status { status, .. } => {
                TransportFailure::Rejected { status: *status }
            }
            esplink_api::Error::Deserialization { .. } => TransportFailure::Malformed,
            esplink_api::Error::InvalidUrl(_) => {
                return CoreError::Config {
                    message: err.to_string(),
                };
            }
            esplink_api::Error::ClientBuild(_) | esplink_api::Error::Encode(_) => {
                TransportFailure::Other
            }
        };

        CoreError::Transport {
            failure,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_maps_to_rejected() {
        let err = CoreError::from(esplink_api::Error::Status {
            status: 503,
            path: "/api/status".into(),
        });
        assert_eq!(
            err.transport_failure(),
            Some(TransportFailure::Rejected { status: 503 })
        );
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn bad_body_maps_to_malformed() {
        let err = CoreError::from(esplink_api::Error::Deserialization {
            message: "missing field `pumpState`".into(),
            body: "{}".into(),
        });
        assert_eq!(err.transport_failure(), Some(TransportFailure::Malformed));
    }

    #[test]
    fn invalid_url_is_a_config_error() {
        let parse = url::Url::parse("http://[::1").expect_err("bad url");
        let err = CoreError::from(esplink_api::Error::InvalidUrl(parse));
        assert!(matches!(err, CoreError::Config { .. }));
        assert!(!err.is_transport());
    }
}
