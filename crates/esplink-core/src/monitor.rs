// ── Connectivity monitor ──
//
// Read-only view over the last completed call. Holds no state of its own,
// so there is nothing to debounce or reset.

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;

use crate::model::{CallRecord, ConnectivityState};

/// Subscription to the device's online/offline state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    calls: watch::Receiver<Option<CallRecord>>,
}

impl ConnectivityMonitor {
    pub(crate) fn new(calls: watch::Receiver<Option<CallRecord>>) -> Self {
        Self { calls }
    }

    pub fn current(&self) -> ConnectivityState {
        ConnectivityState::from_last_call(self.calls.borrow().as_ref())
    }

    pub fn last_call(&self) -> Option<CallRecord> {
        self.calls.borrow().clone()
    }

    /// Wait for the next completed call and return the state it implies,
    /// which may equal the current one. `None` once the controller is gone.
    pub async fn next_call(&mut self) -> Option<ConnectivityState> {
        self.calls.changed().await.ok()?;
        Some(ConnectivityState::from_last_call(
            self.calls.borrow_and_update().as_ref(),
        ))
    }

    /// Wait until the derived state differs from what it is now.
    pub async fn transition(&mut self) -> Option<ConnectivityState> {
        let from = self.current();
        loop {
            let next = self.next_call().await?;
            if next != from {
                return Some(next);
            }
        }
    }

    /// Every completed call as a state, starting with the current one.
    pub fn into_stream(self) -> impl Stream<Item = ConnectivityState> + Send + Unpin {
        WatchStream::new(self.calls)
            .map(|last| ConnectivityState::from_last_call(last.as_ref()))
    }
}
