// esplink-core: Device state synchronization between esplink-api and consumers (CLI).

pub mod command;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    Actuator, CommandId, CommandRecord, CommandState, CommandTicket, DOOR_ANGLES, DeviceCommand,
};
pub use config::{DeviceConfig, OrderingPolicy};
pub use controller::Controller;
pub use error::{CoreError, TransportFailure};
pub use monitor::ConnectivityMonitor;
pub use session::{Session, SessionGate, Theme};
pub use store::StatusStore;
pub use stream::StatusStream;
pub use transport::Transport;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CallKind, CallRecord, ConnectivityState, DeviceStatus, DoorPosition, ErrorSource, PollOrigin,
    ReadOutcome, ReadRecord, SensorHistory, SensorSample, SensorSummary, SurfacedError,
    UsageCounters,
};
