// ── Command dispatcher ──
//
// Turns a validated `DeviceCommand` into an optimistic write plus a POST,
// then schedules the confirmation read. Never blocks on the network: the
// caller gets a ticket as soon as the optimistic value is visible.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::command::{CommandId, CommandState, CommandTicket, DeviceCommand};
use crate::error::CoreError;
use crate::model::PollOrigin;
use crate::poller::StatusPoller;
use crate::reconcile::{SequenceClock, Update};
use crate::session::Session;
use crate::transport::Transport;

pub struct CommandDispatcher {
    transport: Arc<dyn Transport>,
    updates: mpsc::UnboundedSender<Update>,
    clock: Arc<SequenceClock>,
    poller: Arc<StatusPoller>,
    confirm_delay: Duration,
    next_id: AtomicU64,
}

impl CommandDispatcher {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        updates: mpsc::UnboundedSender<Update>,
        clock: Arc<SequenceClock>,
        poller: Arc<StatusPoller>,
        confirm_delay: Duration,
    ) -> Self {
        Self {
            transport,
            updates,
            clock,
            poller,
            confirm_delay,
            next_id: AtomicU64::new(0),
        }
    }

    /// Dispatch `command` on behalf of `session`.
    ///
    /// Authorization and validation failures return before anything is
    /// written or sent. On success the optimistic value is already
    /// published when this returns.
    pub async fn dispatch(
        &self,
        session: &Session,
        command: DeviceCommand,
    ) -> Result<CommandTicket, CoreError> {
        session.require_authorized()?;
        command.validate()?;

        let id = CommandId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let seq = self.clock.next();

        let (ack, acked) = oneshot::channel();
        self.updates
            .send(Update::Optimistic {
                seq,
                id,
                command,
                ack,
            })
            .map_err(|_| CoreError::Stopped)?;
        acked.await.map_err(|_| CoreError::Stopped)?;

        debug!(%id, %command, "dispatching command");

        let (outcome_tx, outcome) = oneshot::channel();
        tokio::spawn(command_task(
            Arc::clone(&self.transport),
            self.updates.clone(),
            Arc::clone(&self.poller),
            id,
            command,
            self.confirm_delay,
            outcome_tx,
        ));

        Ok(CommandTicket {
            id,
            command,
            outcome,
        })
    }
}

async fn command_task(
    transport: Arc<dyn Transport>,
    updates: mpsc::UnboundedSender<Update>,
    poller: Arc<StatusPoller>,
    id: CommandId,
    command: DeviceCommand,
    confirm_delay: Duration,
    outcome: oneshot::Sender<CommandState>,
) {
    let result = transport
        .post_control(command.to_control())
        .await
        .map_err(CoreError::from);

    let state = match &result {
        Ok(()) => CommandState::Confirmed,
        Err(e) => CommandState::Failed {
            reason: e.to_string(),
        },
    };
    let _ = updates.send(Update::CommandSettled {
        id,
        command,
        result,
    });
    let _ = outcome.send(state);

    // Success or failure, the next read brings back the device's own view.
    tokio::time::sleep(confirm_delay).await;
    if !poller.poll_now(PollOrigin::Confirmation).await {
        trace!(%id, "poller stopped; skipping confirmation read");
    }
}
