// ── Status store ──
//
// Published state behind `watch` channels. Only the reconciliation loop
// writes; everything else reads snapshots or subscribes.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::command::CommandRecord;
use crate::model::{
    CallRecord, ConnectivityState, DeviceStatus, ReadRecord, SensorHistory, SurfacedError,
    UsageCounters,
};

/// Reconciled reads buffered per subscriber before it starts lagging.
pub const READ_LOG_CAPACITY: usize = 256;

/// Reactive snapshot store for one device.
pub struct StatusStore {
    pub(crate) status: watch::Sender<DeviceStatus>,
    pub(crate) last_call: watch::Sender<Option<CallRecord>>,
    pub(crate) last_error: watch::Sender<Option<SurfacedError>>,
    pub(crate) last_read: watch::Sender<Option<ReadRecord>>,
    /// Every reconciled read, in the order it was applied.
    pub(crate) read_log: broadcast::Sender<ReadRecord>,
    pub(crate) commands: watch::Sender<Arc<Vec<CommandRecord>>>,
    pub(crate) history: watch::Sender<Arc<SensorHistory>>,
    pub(crate) usage: watch::Sender<UsageCounters>,
}

impl StatusStore {
    pub fn new(history_capacity: usize) -> Self {
        let (read_log, _) = broadcast::channel(READ_LOG_CAPACITY);
        Self {
            status: watch::Sender::new(DeviceStatus::default()),
            last_call: watch::Sender::new(None),
            last_error: watch::Sender::new(None),
            last_read: watch::Sender::new(None),
            read_log,
            commands: watch::Sender::new(Arc::new(Vec::new())),
            history: watch::Sender::new(Arc::new(SensorHistory::new(history_capacity))),
            usage: watch::Sender::new(UsageCounters::default()),
        }
    }

    // ── Snapshots ────────────────────────────────────────────────

    pub fn status(&self) -> DeviceStatus {
        *self.status.borrow()
    }

    pub fn last_call(&self) -> Option<CallRecord> {
        self.last_call.borrow().clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        ConnectivityState::from_last_call(self.last_call.borrow().as_ref())
    }

    pub fn last_error(&self) -> Option<SurfacedError> {
        self.last_error.borrow().clone()
    }

    pub fn last_read(&self) -> Option<ReadRecord> {
        self.last_read.borrow().clone()
    }

    /// Command ledger, oldest first.
    pub fn commands(&self) -> Arc<Vec<CommandRecord>> {
        Arc::clone(&self.commands.borrow())
    }

    pub fn history(&self) -> Arc<SensorHistory> {
        Arc::clone(&self.history.borrow())
    }

    pub fn usage(&self) -> UsageCounters {
        *self.usage.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn subscribe_status(&self) -> watch::Receiver<DeviceStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_calls(&self) -> watch::Receiver<Option<CallRecord>> {
        self.last_call.subscribe()
    }

    pub fn subscribe_reads(&self) -> watch::Receiver<Option<ReadRecord>> {
        self.last_read.subscribe()
    }

    /// Unlike [`subscribe_reads`](Self::subscribe_reads), back-to-back
    /// reads are not coalesced.
    pub fn subscribe_read_log(&self) -> broadcast::Receiver<ReadRecord> {
        self.read_log.subscribe()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<Option<SurfacedError>> {
        self.last_error.subscribe()
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}
