// ── Command system ──
//
// Typed device commands, their validation and optimistic effect, and the
// ledger records that track each one from dispatch to settlement.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use esplink_api::Control;

use crate::error::CoreError;
use crate::model::{
    DOOR_CLOSED_DEG, DOOR_OPEN_DEG, DeviceStatus, HANGER_EXTENDED_DEG, HANGER_RETRACTED_DEG,
};

/// Door angles the firmware accepts.
pub const DOOR_ANGLES: [i32; 2] = [DOOR_CLOSED_DEG, DOOR_OPEN_DEG];

// ── DeviceCommand ────────────────────────────────────────────────

/// A single user intent against the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "camelCase")]
pub enum DeviceCommand {
    SetLed(bool),
    SetBuzzer(bool),
    SetServoDoor(i32),
    SetHanger(bool),
    SetPump(bool),
}

impl DeviceCommand {
    /// Reject commands the device cannot act on. Runs before anything is
    /// sent or written.
    pub fn validate(self) -> Result<(), CoreError> {
        match self {
            Self::SetServoDoor(angle) if !DOOR_ANGLES.contains(&angle) => {
                Err(CoreError::InvalidCommand {
                    message: format!(
                        "door angle {angle} is not supported (expected {DOOR_CLOSED_DEG} or {DOOR_OPEN_DEG})"
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// Write the intended value into `status` ahead of confirmation.
    ///
    /// The hanger servo follows its state, so setting the hanger also moves
    /// the reported angle.
    pub fn apply_to(self, status: &mut DeviceStatus) {
        match self {
            Self::SetLed(on) => status.led_on = on,
            Self::SetBuzzer(on) => status.buzzer_on = on,
            Self::SetServoDoor(angle) => status.door_angle_deg = angle,
            Self::SetHanger(on) => {
                status.hanger_on = on;
                status.hanger_angle_deg = if on {
                    HANGER_EXTENDED_DEG
                } else {
                    HANGER_RETRACTED_DEG
                };
            }
            Self::SetPump(on) => status.pump_on = on,
        }
    }

    /// Wire request for this command.
    pub fn to_control(self) -> Control {
        match self {
            Self::SetLed(on) => Control::Led(on),
            Self::SetBuzzer(on) => Control::Buzzer(on),
            Self::SetServoDoor(angle) => Control::ServoDoor(angle),
            Self::SetHanger(on) => Control::Hanger(on),
            Self::SetPump(on) => Control::Pump(on),
        }
    }

    /// Command that flips `actuator` relative to `current`.
    pub fn toggle(actuator: Actuator, current: &DeviceStatus) -> Self {
        match actuator {
            Actuator::Led => Self::SetLed(!current.led_on),
            Actuator::Buzzer => Self::SetBuzzer(!current.buzzer_on),
            Actuator::Hanger => Self::SetHanger(!current.hanger_on),
            Actuator::Pump => Self::SetPump(!current.pump_on),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |on: bool| if on { "on" } else { "off" };
        match self {
            Self::SetLed(on) => write!(f, "led {}", on_off(*on)),
            Self::SetBuzzer(on) => write!(f, "buzzer {}", on_off(*on)),
            Self::SetServoDoor(angle) => write!(f, "door {angle}°"),
            Self::SetHanger(on) => write!(f, "hanger {}", on_off(*on)),
            Self::SetPump(on) => write!(f, "pump {}", on_off(*on)),
        }
    }
}

/// Something a user can flip without naming the target value. The door is
/// opened or closed explicitly and is not an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Actuator {
    Led,
    Buzzer,
    Hanger,
    Pump,
}

// ── Ledger ───────────────────────────────────────────────────────

/// Process-local identifier for a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CommandState {
    /// Written optimistically, POST still outstanding.
    Pending,
    /// The device accepted the POST.
    Confirmed,
    /// The POST failed. The optimistic value stays until the next read.
    Failed { reason: String },
}

impl CommandState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One entry in the command ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub id: CommandId,
    pub command: DeviceCommand,
    #[serde(flatten)]
    pub state: CommandState,
    pub issued_at: DateTime<Utc>,
}

/// Handle returned by a successful dispatch.
///
/// By the time a ticket exists the optimistic write is already visible.
/// Awaiting [`outcome`](Self::outcome) is optional.
#[derive(Debug)]
pub struct CommandTicket {
    pub id: CommandId,
    pub command: DeviceCommand,
    pub(crate) outcome: oneshot::Receiver<CommandState>,
}

impl CommandTicket {
    /// Wait for the device's answer to the POST.
    pub async fn outcome(self) -> CommandState {
        self.outcome.await.unwrap_or_else(|_| CommandState::Failed {
            reason: CoreError::Stopped.to_string(),
        })
    }
}
