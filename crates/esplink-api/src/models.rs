// Wire models for the device HTTP API.
//
// Field names follow the firmware's JSON exactly. Every status field is
// required: a body missing any of them fails to deserialize.

use serde::{Deserialize, Serialize};

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub led_state: bool,
    pub buzzer_state: bool,
    pub servo_door_angle: i32,
    pub hanger_state: bool,
    pub servo_hanger_angle: i32,
    pub pump_state: bool,
}

/// A single control request understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Led(bool),
    Buzzer(bool),
    ServoDoor(i32),
    Hanger(bool),
    Pump(bool),
}

/// JSON body posted to a control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlBody {
    State { state: bool },
    Angle { angle: i32 },
}

impl Control {
    /// Endpoint path relative to `/api/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::Led(_) => "led",
            Self::Buzzer(_) => "buzzer",
            Self::ServoDoor(_) => "servo",
            Self::Hanger(_) => "hanger",
            Self::Pump(_) => "pump",
        }
    }

    pub fn body(self) -> ControlBody {
        match self {
            Self::Led(state) | Self::Buzzer(state) | Self::Hanger(state) | Self::Pump(state) => {
                ControlBody::State { state }
            }
            Self::ServoDoor(angle) => ControlBody::Angle { angle },
        }
    }
}
