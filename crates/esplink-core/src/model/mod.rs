// ── Domain model ──
//
// Status snapshot, connectivity derivation and the sensor/usage
// bookkeeping that hangs off applied reads and confirmed commands.

pub mod connectivity;
pub mod history;
pub mod read;
pub mod status;

pub use connectivity::{CallKind, CallRecord, ConnectivityState, ErrorSource, SurfacedError};
pub use history::{SensorHistory, SensorSample, SensorSummary, SeriesStats, UsageCounters};
pub use read::{PollOrigin, ReadOutcome, ReadRecord};
pub use status::{
    DOOR_CLOSED_DEG, DOOR_OPEN_DEG, DeviceStatus, DoorPosition, HANGER_EXTENDED_DEG,
    HANGER_RETRACTED_DEG,
};
