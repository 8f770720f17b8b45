#![allow(clippy::unwrap_used, dead_code)]
// Scripted in-memory transport for driving the controller deterministically.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use url::Url;

use esplink_api::{Control, StatusResponse};
use esplink_core::{Controller, DeviceConfig, OrderingPolicy, Session, SessionGate, Transport};

type Reply<T> = Result<T, esplink_api::Error>;

/// A response that is either ready or released later by the test.
pub enum Scripted<T> {
    Ready(Reply<T>),
    Gated(oneshot::Receiver<Reply<T>>),
}

/// Transport whose answers are queued up front by the test.
///
/// Reads past the end of the script return `fallback` when set, otherwise
/// an HTTP 503.
#[derive(Default)]
pub struct ScriptedTransport {
    reads: Mutex<VecDeque<Scripted<StatusResponse>>>,
    posts: Mutex<VecDeque<Scripted<()>>>,
    fallback: Mutex<Option<StatusResponse>>,
    read_calls: AtomicUsize,
    posted: Mutex<Vec<Control>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_read(&self, reply: Reply<StatusResponse>) {
        self.reads.lock().unwrap().push_back(Scripted::Ready(reply));
    }

    /// Queue a read that blocks until the returned sender fires.
    pub fn gate_read(&self) -> oneshot::Sender<Reply<StatusResponse>> {
        let (tx, rx) = oneshot::channel();
        self.reads.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn push_post(&self, reply: Reply<()>) {
        self.posts.lock().unwrap().push_back(Scripted::Ready(reply));
    }

    pub fn gate_post(&self) -> oneshot::Sender<Reply<()>> {
        let (tx, rx) = oneshot::channel();
        self.posts.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn set_fallback(&self, status: StatusResponse) {
        *self.fallback.lock().unwrap() = Some(status);
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<Control> {
        self.posted.lock().unwrap().clone()
    }

    fn next_read(&self) -> Option<Scripted<StatusResponse>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.reads.lock().unwrap().pop_front()
    }

    fn fallback_read(&self) -> Reply<StatusResponse> {
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable("/api/status"))
    }

    fn next_post(&self, control: Control) -> Option<Scripted<()>> {
        self.posted.lock().unwrap().push(control);
        self.posts.lock().unwrap().pop_front()
    }
}

impl Transport for ScriptedTransport {
    fn get_status(&self) -> BoxFuture<'_, Reply<StatusResponse>> {
        let next = self.next_read();
        Box::pin(async move {
            match next {
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(unavailable("/api/status"))),
                None => self.fallback_read(),
            }
        })
    }

    fn post_control(&self, control: Control) -> BoxFuture<'_, Reply<()>> {
        let next = self.next_post(control);
        Box::pin(async move {
            match next {
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(unavailable(control.path()))),
                None => Ok(()),
            }
        })
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn unavailable(path: &str) -> esplink_api::Error {
    esplink_api::Error::Status {
        status: 503,
        path: path.to_owned(),
    }
}

pub fn malformed() -> esplink_api::Error {
    esplink_api::Error::Deserialization {
        message: "missing field `pumpState`".into(),
        body: r#"{"temperature":25}"#.into(),
    }
}

/// The literal body from the device documentation.
pub fn device_body() -> StatusResponse {
    StatusResponse {
        temperature: 25.0,
        humidity: 50.0,
        led_state: true,
        buzzer_state: false,
        servo_door_angle: 90,
        hanger_state: false,
        servo_hanger_angle: 0,
        pump_state: false,
    }
}

pub fn body_with_led(led_state: bool) -> StatusResponse {
    StatusResponse {
        led_state,
        ..device_body()
    }
}

pub fn config(poll_interval: Duration, ordering: OrderingPolicy) -> DeviceConfig {
    let mut config = DeviceConfig::new(Url::parse("http://192.168.4.1").unwrap());
    config.poll_interval = poll_interval;
    config.ordering = ordering;
    config
}

pub fn controller(transport: &Arc<ScriptedTransport>, poll_interval: Duration) -> Controller {
    controller_with(transport, poll_interval, OrderingPolicy::LastCompletionWins)
}

pub fn controller_with(
    transport: &Arc<ScriptedTransport>,
    poll_interval: Duration,
    ordering: OrderingPolicy,
) -> Controller {
    let transport: Arc<dyn Transport> = Arc::clone(transport) as Arc<dyn Transport>;
    Controller::new(config(poll_interval, ordering), transport)
}

pub fn logged_in() -> Session {
    let mut session = Session::new();
    SessionGate::default()
        .authorize(&mut session, "admin", "admin123")
        .unwrap();
    session
}

/// Let every ready task run. Under a paused clock this also advances time
/// by `ms`, firing any timers that fall due.
pub async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
