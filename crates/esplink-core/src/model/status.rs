// ── Device status snapshot ──
//
// The canonical view of everything the device exposes. Replaced wholesale
// on every authoritative read; only optimistic command writes touch
// individual fields.

use serde::{Deserialize, Serialize};

use esplink_api::StatusResponse;

/// Door servo angle when closed.
pub const DOOR_CLOSED_DEG: i32 = 0;
/// Door servo angle when open.
pub const DOOR_OPEN_DEG: i32 = 90;
/// Hanger servo angle when retracted.
pub const HANGER_RETRACTED_DEG: i32 = 0;
/// Hanger servo angle when extended.
pub const HANGER_EXTENDED_DEG: i32 = 90;

/// Snapshot of all controllable and observable device fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub led_on: bool,
    pub buzzer_on: bool,
    pub door_angle_deg: i32,
    pub hanger_on: bool,
    pub hanger_angle_deg: i32,
    pub pump_on: bool,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// Interpretation of the door servo angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DoorPosition {
    Closed,
    Open,
    /// Any other reported angle, e.g. while the servo is still settling.
    Intermediate(i32),
}

impl DeviceStatus {
    pub fn door_position(&self) -> DoorPosition {
        match self.door_angle_deg {
            DOOR_CLOSED_DEG => DoorPosition::Closed,
            DOOR_OPEN_DEG => DoorPosition::Open,
            other => DoorPosition::Intermediate(other),
        }
    }
}

impl From<StatusResponse> for DeviceStatus {
    fn from(raw: StatusResponse) -> Self {
        Self {
            led_on: raw.led_state,
            buzzer_on: raw.buzzer_state,
            door_angle_deg: raw.servo_door_angle,
            hanger_on: raw.hanger_state,
            hanger_angle_deg: raw.servo_hanger_angle,
            pump_on: raw.pump_state,
            temperature_c: raw.temperature,
            humidity_pct: raw.humidity,
        }
    }
}
