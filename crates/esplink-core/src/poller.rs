// ── Status poller ──
//
// Issues `GET /api/status` on a fixed cadence plus on demand. Each read
// runs as its own task and reports back through the reconciliation loop,
// so a slow device never delays the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::CoreError;
use crate::model::{DeviceStatus, PollOrigin};
use crate::reconcile::{SequenceClock, Update};
use crate::transport::Transport;

/// One started-to-stopped span of the poller.
struct PollerRun {
    /// Cancelled on stop; every read issued during the run carries a clone.
    liveness: CancellationToken,
    ticker: JoinHandle<()>,
}

/// Periodic and on-demand status reader.
pub struct StatusPoller {
    transport: Arc<dyn Transport>,
    updates: mpsc::UnboundedSender<Update>,
    clock: Arc<SequenceClock>,
    /// Parent of every run's liveness token.
    shutdown: CancellationToken,
    run: Mutex<Option<PollerRun>>,
}

impl StatusPoller {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        updates: mpsc::UnboundedSender<Update>,
        clock: Arc<SequenceClock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            transport,
            updates,
            clock,
            shutdown,
            run: Mutex::new(None),
        }
    }

    /// Start polling every `interval`, with the first read issued
    /// immediately. Restarts the cadence if already running; reads still
    /// in flight from the previous run are discarded when they land.
    pub async fn start(&self, interval: Duration) -> Result<(), CoreError> {
        if interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll interval must be greater than zero".into(),
            });
        }

        let mut run = self.run.lock().await;
        if let Some(previous) = run.take() {
            debug!("restarting poller");
            shutdown_run(previous).await;
        }

        if self.shutdown.is_cancelled() {
            return Err(CoreError::Stopped);
        }

        let liveness = self.shutdown.child_token();
        let ticker = tokio::spawn(ticker_task(
            Arc::clone(&self.transport),
            self.updates.clone(),
            Arc::clone(&self.clock),
            liveness.clone(),
            interval,
        ));
        *run = Some(PollerRun { liveness, ticker });

        info!(?interval, "poller started");
        Ok(())
    }

    /// Stop polling. Idempotent. Results of reads already in flight are
    /// dropped without touching any state.
    pub async fn stop(&self) {
        let previous = self.run.lock().await.take();
        if let Some(previous) = previous {
            shutdown_run(previous).await;
            info!("poller stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.run.lock().await.is_some()
    }

    /// Issue one extra read under the current run. Returns `false` (and
    /// issues nothing) when the poller is stopped.
    pub async fn poll_now(&self, origin: PollOrigin) -> bool {
        let run = self.run.lock().await;
        let Some(current) = run.as_ref().filter(|r| !r.liveness.is_cancelled()) else {
            trace!(%origin, "poller stopped; read not issued");
            return false;
        };
        spawn_read(
            Arc::clone(&self.transport),
            self.updates.clone(),
            &self.clock,
            current.liveness.clone(),
            origin,
        );
        true
    }
}

async fn shutdown_run(run: PollerRun) {
    run.liveness.cancel();
    let _ = run.ticker.await;
}

// ── Tasks ────────────────────────────────────────────────────────

async fn ticker_task(
    transport: Arc<dyn Transport>,
    updates: mpsc::UnboundedSender<Update>,
    clock: Arc<SequenceClock>,
    liveness: CancellationToken,
    interval: Duration,
) {
    let mut ticks = tokio::time::interval(interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = liveness.cancelled() => break,
            _ = ticks.tick() => {
                spawn_read(
                    Arc::clone(&transport),
                    updates.clone(),
                    &clock,
                    liveness.clone(),
                    PollOrigin::Cadence,
                );
            }
        }
    }
}

/// Issue one GET. The sequence number is taken before the request goes
/// out, so it reflects issue order rather than completion order.
fn spawn_read(
    transport: Arc<dyn Transport>,
    updates: mpsc::UnboundedSender<Update>,
    clock: &SequenceClock,
    liveness: CancellationToken,
    origin: PollOrigin,
) {
    let seq = clock.next();
    trace!(seq, %origin, "issuing status read");
    tokio::spawn(async move {
        let result = transport
            .get_status()
            .await
            .map(DeviceStatus::from)
            .map_err(CoreError::from);
        let _ = updates.send(Update::PollCompleted {
            seq,
            origin,
            liveness,
            result,
        });
    });
}
