//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use esplink_core::{
    Controller, CoreError, PollOrigin, ReadOutcome, ReadRecord, Session, SurfacedError,
};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::error::CliError;
use crate::output::StatusView;

/// Slack on top of the request timeout when waiting for a read to land.
const READ_GRACE: Duration = Duration::from_secs(2);

/// Authorize a session against the configured account.
///
/// The username defaults to the configured one. The password comes from
/// `--password` / `ESPLINK_LOGIN_PASSWORD`, else a terminal prompt.
pub fn login(cfg: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let username = global
        .user
        .clone()
        .unwrap_or_else(|| cfg.login.username.clone());

    let password = match global.password {
        Some(ref password) => password.clone(),
        None if std::io::stdin().is_terminal() => {
            rpassword::prompt_password(format!("Password for {username}: "))?
        }
        None => return Err(CliError::NoCredentials),
    };

    let mut session = Session::new();
    cfg.session_gate()
        .authorize(&mut session, &username, &password)?;
    Ok(session)
}

/// How long to wait for one status read to be reconciled.
pub fn read_deadline(controller: &Controller) -> Duration {
    controller
        .config()
        .timeout
        .map_or(Duration::from_secs(30), |t| t + READ_GRACE)
}

/// Wait for the next reconciled read matching `origin` (any origin when
/// `None`). Subscribe before triggering the read.
pub async fn wait_for_read(
    reads: &mut broadcast::Receiver<ReadRecord>,
    origin: Option<PollOrigin>,
    deadline: Duration,
) -> Result<ReadRecord, CliError> {
    let wait = async {
        loop {
            match reads.recv().await {
                Ok(record) if origin.is_none_or(|o| record.origin == o) => return Ok(record),
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "read log lagged"),
                Err(RecvError::Closed) => return Err(CliError::Stopped),
            }
        }
    };
    tokio::time::timeout(deadline, wait)
        .await
        .map_err(|_| CliError::Timeout)?
}

/// Number of reads consumed by the next receive, counting any skipped
/// because the receiver lagged. `None` once the controller is gone.
pub async fn next_reads(reads: &mut broadcast::Receiver<ReadRecord>) -> Option<u64> {
    match reads.recv().await {
        Ok(_) => Some(1),
        Err(RecvError::Lagged(n)) => Some(n),
        Err(RecvError::Closed) => None,
    }
}

/// Turn a failed read into the error it surfaced.
pub fn read_error(controller: &Controller, record: &ReadRecord) -> Option<CliError> {
    if record.outcome != ReadOutcome::Failed {
        return None;
    }
    Some(
        controller
            .last_error()
            .map_or(CliError::Stopped, |err| surfaced_to_cli(&err)),
    )
}

fn surfaced_to_cli(err: &SurfacedError) -> CliError {
    match err.failure {
        Some(failure) => CliError::from(CoreError::Transport {
            failure,
            message: err.message.clone(),
        }),
        None => CliError::DeviceError {
            message: err.message.clone(),
        },
    }
}

/// Current snapshot plus connectivity for rendering.
pub fn status_view(controller: &Controller) -> StatusView {
    let status = controller.status_snapshot();
    StatusView {
        status,
        door: status.door_position(),
        connectivity: controller.connectivity_state(),
        last_error: controller.last_error(),
    }
}

/// Stderr spinner, hidden in quiet mode or when stderr is not a terminal.
pub fn spinner(message: String, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
