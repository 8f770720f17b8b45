// ── Controller abstraction ──
//
// Full lifecycle for one device: owns the store, the reconciliation loop,
// the poller and the dispatcher, and exposes snapshots and subscriptions
// to consumers.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use esplink_api::{DeviceClient, TransportConfig};

use crate::command::{Actuator, CommandRecord, CommandTicket, DeviceCommand};
use crate::config::DeviceConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::CoreError;
use crate::model::{
    ConnectivityState, DeviceStatus, PollOrigin, ReadRecord, SensorHistory, SurfacedError,
    UsageCounters,
};
use crate::monitor::ConnectivityMonitor;
use crate::poller::StatusPoller;
use crate::reconcile::{Reconciler, SequenceClock, Update};
use crate::session::Session;
use crate::store::StatusStore;
use crate::stream::StatusStream;
use crate::transport::Transport;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Nothing touches the
/// network until [`start`](Self::start), [`dispatch`](Self::dispatch) or
/// [`refresh`](Self::refresh) is called.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: DeviceConfig,
    store: Arc<StatusStore>,
    updates: mpsc::UnboundedSender<Update>,
    updates_rx: Mutex<Option<mpsc::UnboundedReceiver<Update>>>,
    poller: Arc<StatusPoller>,
    dispatcher: CommandDispatcher,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        // Stops the ticker and the reconciler even without `shutdown()`.
        self.cancel.cancel();
    }
}

impl Controller {
    /// Create a controller over any transport. Does not start polling.
    pub fn new(config: DeviceConfig, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(StatusStore::new(config.history_capacity));
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let clock = Arc::new(SequenceClock::default());
        let cancel = CancellationToken::new();

        let poller = Arc::new(StatusPoller::new(
            Arc::clone(&transport),
            updates.clone(),
            Arc::clone(&clock),
            cancel.clone(),
        ));
        let dispatcher = CommandDispatcher::new(
            transport,
            updates.clone(),
            clock,
            Arc::clone(&poller),
            config.confirm_delay,
        );

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                updates,
                updates_rx: Mutex::new(Some(updates_rx)),
                poller,
                dispatcher,
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a controller that talks HTTP to `config.url`.
    pub fn connect_http(config: DeviceConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = DeviceClient::new(config.url.clone(), &transport)?;
        debug!(url = %config.url, "built device client");
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start polling at the configured cadence. Restarts the cadence when
    /// already running.
    pub async fn start(&self, session: &Session) -> Result<(), CoreError> {
        session.require_authorized()?;
        self.ensure_reconciler().await?;
        self.inner
            .poller
            .start(self.inner.config.poll_interval)
            .await?;
        info!(url = %self.inner.config.url, "controller started");
        Ok(())
    }

    /// Stop polling. State already published stays as it is.
    pub async fn stop(&self) {
        self.inner.poller.stop().await;
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.poller.is_running().await
    }

    /// Stop polling and the reconciliation loop. Further dispatches fail
    /// with [`CoreError::Stopped`].
    pub async fn shutdown(&self) {
        self.inner.poller.stop().await;
        self.inner.cancel.cancel();
        // Drop the receiver if the loop never ran, so senders see a closed channel.
        self.inner.updates_rx.lock().await.take();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task panicked");
            }
        }
        info!("controller shut down");
    }

    /// Spawn the reconciliation loop on first use.
    async fn ensure_reconciler(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Stopped);
        }
        let Some(rx) = self.inner.updates_rx.lock().await.take() else {
            return Ok(());
        };

        let reconciler = Reconciler::new(Arc::clone(&self.inner.store), self.inner.config.ordering);
        let handle = tokio::spawn(reconciler.run(rx, self.inner.cancel.clone()));
        self.inner.task_handles.lock().await.push(handle);
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate, apply optimistically and send `command`.
    pub async fn dispatch(
        &self,
        session: &Session,
        command: DeviceCommand,
    ) -> Result<CommandTicket, CoreError> {
        self.ensure_reconciler().await?;
        self.inner.dispatcher.dispatch(session, command).await
    }

    /// Flip `actuator` relative to the current snapshot.
    pub async fn toggle(
        &self,
        session: &Session,
        actuator: Actuator,
    ) -> Result<CommandTicket, CoreError> {
        let command = DeviceCommand::toggle(actuator, &self.inner.store.status());
        self.dispatch(session, command).await
    }

    /// Issue one read now. Returns `false` if the poller is stopped.
    pub async fn refresh(&self) -> Result<bool, CoreError> {
        self.ensure_reconciler().await?;
        Ok(self.inner.poller.poll_now(PollOrigin::Manual).await)
    }

    /// Resolve once every update queued before this call has been applied.
    pub async fn sync(&self) -> Result<(), CoreError> {
        self.ensure_reconciler().await?;
        let (ack, done) = oneshot::channel();
        self.inner
            .updates
            .send(Update::Barrier { ack })
            .map_err(|_| CoreError::Stopped)?;
        done.await.map_err(|_| CoreError::Stopped)
    }

    /// Every reconciled read, without coalescing. Subscribe before
    /// triggering the read you want to observe.
    pub fn read_log(&self) -> broadcast::Receiver<ReadRecord> {
        self.inner.store.subscribe_read_log()
    }

    // ── Snapshots & subscriptions ────────────────────────────────

    pub fn status_snapshot(&self) -> DeviceStatus {
        self.inner.store.status()
    }

    pub fn status_stream(&self) -> StatusStream {
        StatusStream::new(self.inner.store.subscribe_status())
    }

    pub fn connectivity(&self) -> ConnectivityMonitor {
        ConnectivityMonitor::new(self.inner.store.subscribe_calls())
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.inner.store.connectivity()
    }

    pub fn last_error(&self) -> Option<SurfacedError> {
        self.inner.store.last_error()
    }

    pub fn errors(&self) -> watch::Receiver<Option<SurfacedError>> {
        self.inner.store.subscribe_errors()
    }

    pub fn last_read(&self) -> Option<ReadRecord> {
        self.inner.store.last_read()
    }

    pub fn commands_snapshot(&self) -> Arc<Vec<CommandRecord>> {
        self.inner.store.commands()
    }

    pub fn history_snapshot(&self) -> Arc<SensorHistory> {
        self.inner.store.history()
    }

    pub fn usage(&self) -> UsageCounters {
        self.inner.store.usage()
    }
}
