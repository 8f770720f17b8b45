// ── Status read bookkeeping ──

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a status read was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case")]
pub enum PollOrigin {
    /// Regular poller tick.
    Cadence,
    /// Follow-up read after a successful command.
    Confirmation,
    /// Explicit refresh request.
    Manual,
}

/// What the reconciler did with a completed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case")]
pub enum ReadOutcome {
    /// The body replaced the status snapshot.
    Applied,
    /// The body was older than the last applied write and was dropped.
    Stale,
    /// The call failed; the snapshot was left alone.
    Failed,
}

/// The most recently reconciled status read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRecord {
    /// Issue order across reads and optimistic writes.
    pub seq: u64,
    pub origin: PollOrigin,
    pub outcome: ReadOutcome,
    pub at: DateTime<Utc>,
}
