// ── Connectivity and surfaced errors ──
//
// Connectivity is never stored on its own: it is computed from the record
// of the most recently completed transport call.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::TransportFailure;

/// Online/offline indicator derived from the last completed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum ConnectivityState {
    Connected,
    Disconnected,
}

impl ConnectivityState {
    /// `Connected` iff the last completed call succeeded. No call yet
    /// means `Disconnected`.
    pub fn from_last_call(last: Option<&CallRecord>) -> Self {
        match last {
            Some(call) if call.ok => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

/// Which kind of transport call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case")]
pub enum CallKind {
    StatusRead,
    Command,
}

/// Outcome of the most recently completed transport call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub kind: CallKind,
    pub ok: bool,
    pub at: DateTime<Utc>,
}

/// Where a surfaced error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorSource {
    /// A status read failed.
    StatusRead,
    /// A control POST failed.
    Command,
}

/// Human-readable error shown to the user until the next good read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfacedError {
    pub source: ErrorSource,
    pub message: String,
    /// Set when the error came from a failed device call.
    #[serde(skip)]
    pub failure: Option<TransportFailure>,
    pub at: DateTime<Utc>,
}
