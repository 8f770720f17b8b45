// ── Reactive status stream ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::DeviceStatus;

/// A subscription to the device status snapshot.
///
/// Provides both point-in-time access and change notification via
/// `changed()` or by converting into a `Stream`.
pub struct StatusStream {
    current: DeviceStatus,
    receiver: watch::Receiver<DeviceStatus>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<DeviceStatus>) -> Self {
        let current = *receiver.borrow();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &DeviceStatus {
        &self.current
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> DeviceStatus {
        *self.receiver.borrow()
    }

    /// Whether a new snapshot was published since the last `changed()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<DeviceStatus> {
        self.receiver.changed().await.ok()?;
        let snap = *self.receiver.borrow_and_update();
        self.current = snap;
        Some(snap)
    }

    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`. Yields the current
/// snapshot first, then one item per change.
pub struct StatusWatchStream {
    inner: WatchStream<DeviceStatus>,
}

impl Stream for StatusWatchStream {
    type Item = DeviceStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
