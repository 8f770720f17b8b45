// ── Session context ──
//
// A `Session` is an explicit value owned by the caller and passed into
// every operation that needs authorization. Nothing here is global.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Display theme preference carried with the session.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Per-user context: authorization flag, username, theme.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
    theme: Theme,
}

impl Session {
    /// A fresh, unauthorized session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authorized(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Log out. The theme survives.
    pub fn end(&mut self) {
        if let Some(user) = self.username.take() {
            debug!(user = %user, "session ended");
        }
    }

    pub(crate) fn require_authorized(&self) -> Result<(), CoreError> {
        if self.is_authorized() {
            Ok(())
        } else {
            Err(CoreError::NotAuthorized)
        }
    }
}

/// Checks credentials against a single configured account.
#[derive(Debug, Clone)]
pub struct SessionGate {
    username: String,
    password: SecretString,
}

impl SessionGate {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Mark `session` authorized if the credentials match. A failed attempt
    /// leaves the session exactly as it was.
    pub fn authorize(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), CoreError> {
        if username == self.username && password == self.password.expose_secret() {
            debug!(user = %username, "session authorized");
            session.username = Some(username.to_owned());
            Ok(())
        } else {
            warn!(user = %username, "rejected login attempt");
            Err(CoreError::InvalidCredentials)
        }
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, SecretString::from(DEFAULT_PASSWORD))
    }
}
