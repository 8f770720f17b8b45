// ── Controller configuration ──
//
// Plain runtime settings handed to `Controller::new`. File and environment
// loading live in esplink-config; this type knows nothing about either.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use esplink_api::DeviceClient;

use crate::error::CoreError;

/// Default status poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Default delay between a successful command and its confirmation read.
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(500);
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of sensor samples kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 720;

/// How overlapping status reads are reconciled.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OrderingPolicy {
    /// Whichever read completes last is applied, even if it was issued
    /// earlier than the value it overwrites.
    #[default]
    #[serde(rename = "last-completion")]
    #[strum(serialize = "last-completion")]
    LastCompletionWins,
    /// A read older than the last applied write is discarded.
    Sequenced,
}

/// Runtime settings for a single device connection.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device root URL, e.g. `http://192.168.4.1`.
    pub url: Url,
    /// Per-request timeout. `None` disables it.
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub confirm_delay: Duration,
    pub ordering: OrderingPolicy,
    pub history_capacity: usize,
}

impl DeviceConfig {
    /// Settings for `url` with every other field at its default.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: Some(DEFAULT_TIMEOUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_delay: DEFAULT_CONFIRM_DELAY,
            ordering: OrderingPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Settings for a bare host (`192.168.4.1`, `esp32.local:8080`) or a
    /// full URL.
    pub fn for_host(host: &str) -> Result<Self, CoreError> {
        Ok(Self::new(DeviceClient::base_url_for_host(host)?))
    }
}
