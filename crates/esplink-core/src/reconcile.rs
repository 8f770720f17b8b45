// ── Reconciliation loop ──
//
// Every mutation of published state goes through here. Poll results,
// optimistic writes and command settlements arrive as `Update` messages
// on one unbounded channel and are applied strictly one at a time, in
// arrival order.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::command::{CommandId, CommandRecord, CommandState, DeviceCommand};
use crate::config::OrderingPolicy;
use crate::error::CoreError;
use crate::model::{
    CallKind, CallRecord, DeviceStatus, ErrorSource, PollOrigin, ReadOutcome, ReadRecord,
    SensorHistory, SensorSample, SurfacedError,
};
use crate::store::StatusStore;

/// Number of commands kept in the ledger.
pub const COMMAND_LEDGER_SIZE: usize = 32;

/// Monotonic issue-order counter shared by reads and optimistic writes.
#[derive(Debug, Default)]
pub(crate) struct SequenceClock(AtomicU64);

impl SequenceClock {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// A message for the reconciliation loop.
#[derive(Debug)]
pub(crate) enum Update {
    /// A status read finished. `liveness` is the token of the poller run
    /// that issued it; a cancelled token means nobody wants the result.
    PollCompleted {
        seq: u64,
        origin: PollOrigin,
        liveness: CancellationToken,
        result: Result<DeviceStatus, CoreError>,
    },
    /// Write a command's intended value ahead of the POST.
    Optimistic {
        seq: u64,
        id: CommandId,
        command: DeviceCommand,
        ack: oneshot::Sender<DeviceStatus>,
    },
    /// The POST for a command finished.
    CommandSettled {
        id: CommandId,
        command: DeviceCommand,
        result: Result<(), CoreError>,
    },
    /// Answered once every earlier update has been applied.
    Barrier { ack: oneshot::Sender<()> },
}

/// State owned by the loop that never needs to be published as-is.
pub(crate) struct Reconciler {
    store: Arc<StatusStore>,
    ordering: OrderingPolicy,
    /// Highest seq that has written the status snapshot.
    last_applied_seq: u64,
    history: SensorHistory,
    ledger: VecDeque<CommandRecord>,
}

impl Reconciler {
    pub(crate) fn new(store: Arc<StatusStore>, ordering: OrderingPolicy) -> Self {
        let history = SensorHistory::clone(&store.history());
        Self {
            store,
            ordering,
            last_applied_seq: 0,
            history,
            ledger: VecDeque::with_capacity(COMMAND_LEDGER_SIZE),
        }
    }

    /// Drain `updates` until cancelled or every sender is gone.
    pub(crate) async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<Update>,
        cancel: CancellationToken,
    ) {
        debug!(ordering = %self.ordering, "reconciler started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                update = updates.recv() => {
                    let Some(update) = update else { break };
                    self.apply(update);
                }
            }
        }
        debug!("reconciler stopped");
    }

    pub(crate) fn apply(&mut self, update: Update) {
        match update {
            Update::PollCompleted {
                seq,
                origin,
                liveness,
                result,
            } => self.apply_poll(seq, origin, &liveness, result),
            Update::Optimistic {
                seq,
                id,
                command,
                ack,
            } => {
                let status = self.apply_optimistic(seq, id, command);
                let _ = ack.send(status);
            }
            Update::CommandSettled {
                id,
                command,
                result,
            } => self.apply_settlement(id, command, result),
            Update::Barrier { ack } => {
                let _ = ack.send(());
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    fn apply_poll(
        &mut self,
        seq: u64,
        origin: PollOrigin,
        liveness: &CancellationToken,
        result: Result<DeviceStatus, CoreError>,
    ) {
        if liveness.is_cancelled() {
            trace!(seq, %origin, "dropping read from a stopped poller");
            return;
        }

        self.record_call(CallKind::StatusRead, result.is_ok());

        let outcome = match result {
            Ok(status) => {
                if self.ordering == OrderingPolicy::Sequenced && seq < self.last_applied_seq {
                    debug!(
                        seq,
                        last_applied = self.last_applied_seq,
                        "discarding stale read"
                    );
                    ReadOutcome::Stale
                } else {
                    self.apply_read(seq, status);
                    ReadOutcome::Applied
                }
            }
            Err(e) => {
                warn!(seq, %origin, error = %e, "status read failed");
                self.surface(ErrorSource::StatusRead, &e);
                ReadOutcome::Failed
            }
        };

        let record = ReadRecord {
            seq,
            origin,
            outcome,
            at: Utc::now(),
        };
        // No subscribers is fine.
        let _ = self.store.read_log.send(record.clone());
        self.store.last_read.send_replace(Some(record));
    }

    fn apply_read(&mut self, seq: u64, status: DeviceStatus) {
        self.store.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        self.last_applied_seq = self.last_applied_seq.max(seq);

        // Only a good read clears a surfaced error.
        self.store
            .last_error
            .send_if_modified(|e| e.take().is_some());

        self.history.push(SensorSample {
            at: Utc::now(),
            temperature_c: status.temperature_c,
            humidity_pct: status.humidity_pct,
        });
        self.store
            .history
            .send_replace(Arc::new(self.history.clone()));
    }

    // ── Commands ─────────────────────────────────────────────────

    fn apply_optimistic(
        &mut self,
        seq: u64,
        id: CommandId,
        command: DeviceCommand,
    ) -> DeviceStatus {
        self.store
            .status
            .send_modify(|status| command.apply_to(status));
        self.last_applied_seq = self.last_applied_seq.max(seq);
        trace!(%id, %command, seq, "optimistic write applied");

        if self.ledger.len() >= COMMAND_LEDGER_SIZE {
            self.ledger.pop_front();
        }
        self.ledger.push_back(CommandRecord {
            id,
            command,
            state: CommandState::Pending,
            issued_at: Utc::now(),
        });
        self.publish_ledger();

        self.store.status()
    }

    fn apply_settlement(
        &mut self,
        id: CommandId,
        command: DeviceCommand,
        result: Result<(), CoreError>,
    ) {
        self.record_call(CallKind::Command, result.is_ok());

        let state = match result {
            Ok(()) => {
                debug!(%id, %command, "command confirmed");
                self.store.usage.send_modify(|usage| usage.record(command));
                CommandState::Confirmed
            }
            Err(e) => {
                warn!(%id, %command, error = %e, "command failed");
                self.surface(ErrorSource::Command, &e);
                CommandState::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if let Some(record) = self.ledger.iter_mut().find(|r| r.id == id) {
            record.state = state;
            self.publish_ledger();
        }
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn record_call(&self, kind: CallKind, ok: bool) {
        self.store.last_call.send_replace(Some(CallRecord {
            kind,
            ok,
            at: Utc::now(),
        }));
    }

    fn surface(&self, source: ErrorSource, error: &CoreError) {
        self.store.last_error.send_replace(Some(SurfacedError {
            source,
            message: error.to_string(),
            failure: error.transport_failure(),
            at: Utc::now(),
        }));
    }

    fn publish_ledger(&self) {
        self.store
            .commands
            .send_replace(Arc::new(self.ledger.iter().cloned().collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportFailure;
    use crate::model::ConnectivityState;

    fn reconciler(ordering: OrderingPolicy) -> (Reconciler, Arc<StatusStore>) {
        let store = Arc::new(StatusStore::new(16));
        (Reconciler::new(Arc::clone(&store), ordering), store)
    }

    fn read(seq: u64, led_on: bool) -> Update {
        read_with(seq, &CancellationToken::new(), Ok(DeviceStatus {
            led_on,
            temperature_c: 25.0,
            humidity_pct: 50.0,
            ..DeviceStatus::default()
        }))
    }

    fn read_with(
        seq: u64,
        liveness: &CancellationToken,
        result: Result<DeviceStatus, CoreError>,
    ) -> Update {
        Update::PollCompleted {
            seq,
            origin: PollOrigin::Cadence,
            liveness: liveness.clone(),
            result,
        }
    }

    fn offline() -> CoreError {
        CoreError::Transport {
            failure: TransportFailure::Unreachable,
            message: "connection refused".into(),
        }
    }

    fn optimistic(
        seq: u64,
        id: u64,
        command: DeviceCommand,
    ) -> (Update, oneshot::Receiver<DeviceStatus>) {
        let (ack, rx) = oneshot::channel();
        (
            Update::Optimistic {
                seq,
                id: CommandId(id),
                command,
                ack,
            },
            rx,
        )
    }

    #[test]
    fn identical_reads_do_not_notify() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        r.apply(read(1, true));

        let rx = store.subscribe_status();
        r.apply(read(2, true));
        r.apply(read(3, true));

        assert!(!rx.has_changed().expect("store alive"));
        assert!(store.status().led_on);
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn failed_read_keeps_snapshot_and_surfaces_error() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        r.apply(read(1, true));
        r.apply(read_with(2, &CancellationToken::new(), Err(offline())));

        assert!(store.status().led_on);
        assert_eq!(store.connectivity(), ConnectivityState::Disconnected);
        let err = store.last_error().expect("surfaced");
        assert_eq!(err.source, ErrorSource::StatusRead);
        assert_eq!(
            store.last_read().map(|r| r.outcome),
            Some(ReadOutcome::Failed)
        );

        r.apply(read(3, true));
        assert!(store.last_error().is_none());
        assert_eq!(store.connectivity(), ConnectivityState::Connected);
    }

    #[test]
    fn cancelled_liveness_drops_result_entirely() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let liveness = CancellationToken::new();
        liveness.cancel();

        r.apply(read_with(
            1,
            &liveness,
            Ok(DeviceStatus {
                led_on: true,
                ..DeviceStatus::default()
            }),
        ));

        assert_eq!(store.status(), DeviceStatus::default());
        assert!(store.last_call().is_none());
        assert!(store.last_read().is_none());
    }

    #[test]
    fn last_completion_wins_applies_late_stale_read() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        // Read #1 issued first, read #2 second; #2 completes first.
        r.apply(read(2, true));
        r.apply(read(1, false));
        assert!(!store.status().led_on);
    }

    #[test]
    fn sequenced_discards_late_stale_read() {
        let (mut r, store) = reconciler(OrderingPolicy::Sequenced);
        r.apply(read(2, true));
        r.apply(read(1, false));

        assert!(store.status().led_on);
        assert_eq!(store.last_read().map(|r| r.outcome), Some(ReadOutcome::Stale));
        // A stale read still completed, so it still counts as a good call.
        assert_eq!(store.connectivity(), ConnectivityState::Connected);
    }

    #[test]
    fn sequenced_read_issued_before_command_cannot_revert_it() {
        let (mut r, store) = reconciler(OrderingPolicy::Sequenced);
        let (update, _ack) = optimistic(2, 1, DeviceCommand::SetPump(true));
        r.apply(update);
        r.apply(read(1, false));
        assert!(store.status().pump_on);
    }

    #[test]
    fn optimistic_write_acks_with_new_snapshot() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let (update, mut ack) = optimistic(1, 1, DeviceCommand::SetLed(true));
        r.apply(update);

        let acked = ack.try_recv().expect("acked");
        assert!(acked.led_on);
        assert!(store.status().led_on);
        assert_eq!(store.commands().len(), 1);
        assert_eq!(store.commands()[0].state, CommandState::Pending);
    }

    #[test]
    fn failed_settlement_keeps_optimistic_value() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let (update, _ack) = optimistic(1, 7, DeviceCommand::SetBuzzer(true));
        r.apply(update);
        r.apply(Update::CommandSettled {
            id: CommandId(7),
            command: DeviceCommand::SetBuzzer(true),
            result: Err(offline()),
        });

        assert!(store.status().buzzer_on);
        assert_eq!(store.connectivity(), ConnectivityState::Disconnected);
        assert_eq!(
            store.last_error().map(|e| e.source),
            Some(ErrorSource::Command)
        );
        assert!(matches!(
            store.commands()[0].state,
            CommandState::Failed { .. }
        ));
        assert_eq!(store.usage().buzzer_on, 0);
    }

    #[test]
    fn confirmed_settlement_counts_usage() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let (update, _ack) = optimistic(1, 1, DeviceCommand::SetServoDoor(90));
        r.apply(update);
        r.apply(Update::CommandSettled {
            id: CommandId(1),
            command: DeviceCommand::SetServoDoor(90),
            result: Ok(()),
        });

        assert_eq!(store.commands()[0].state, CommandState::Confirmed);
        assert_eq!(store.usage().door_operations, 1);
        assert_eq!(store.connectivity(), ConnectivityState::Connected);
    }

    #[test]
    fn ledger_keeps_most_recent_commands() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let total = u64::try_from(COMMAND_LEDGER_SIZE).expect("fits") + 5;
        for id in 1..=total {
            let (update, _ack) = optimistic(id, id, DeviceCommand::SetLed(id % 2 == 0));
            r.apply(update);
        }

        let ledger = store.commands();
        assert_eq!(ledger.len(), COMMAND_LEDGER_SIZE);
        assert_eq!(ledger.first().map(|c| c.id), Some(CommandId(6)));
        assert_eq!(ledger.last().map(|c| c.id), Some(CommandId(total)));
    }

    #[test]
    fn read_log_keeps_back_to_back_reads() {
        let (mut r, store) = reconciler(OrderingPolicy::LastCompletionWins);
        let mut log = store.subscribe_read_log();
        let mut latest = store.subscribe_reads();

        r.apply(Update::PollCompleted {
            seq: 5,
            origin: PollOrigin::Confirmation,
            liveness: CancellationToken::new(),
            result: Ok(DeviceStatus::default()),
        });
        r.apply(read(6, true));

        // The watch channel only has the last one.
        assert_eq!(
            latest.borrow_and_update().as_ref().map(|r| r.origin),
            Some(PollOrigin::Cadence)
        );
        let first = log.try_recv().expect("first read");
        assert_eq!((first.seq, first.origin), (5, PollOrigin::Confirmation));
        let second = log.try_recv().expect("second read");
        assert_eq!((second.seq, second.origin), (6, PollOrigin::Cadence));
        assert!(log.try_recv().is_err());
    }

    #[test]
    fn sequence_clock_is_monotonic() {
        let clock = SequenceClock::default();
        assert_eq!(clock.next(), 1);
        assert_eq!(clock.next(), 2);
    }
}
