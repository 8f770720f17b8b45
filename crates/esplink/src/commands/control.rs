//! Actuator commands: led, buzzer, door, hanger, pump, toggle.
//!
//! Every command follows the same path: start polling, dispatch (the
//! optimistic write happens inside), wait for the POST, then wait for the
//! confirmation read and print what the device reports.

use tokio::sync::broadcast;
use tracing::debug;

use esplink_core::model::{DOOR_CLOSED_DEG, DOOR_OPEN_DEG};
use esplink_core::{
    Actuator, CommandState, Controller, DeviceCommand, PollOrigin, ReadRecord, Session,
};

use crate::cli::{DoorCommand, GlobalOpts, ToggleTarget};
use crate::error::CliError;
use crate::output;

use super::util;

/// Door subcommand to the command it sends.
pub fn door_command(cmd: &DoorCommand) -> DeviceCommand {
    match cmd {
        DoorCommand::Open => DeviceCommand::SetServoDoor(DOOR_OPEN_DEG),
        DoorCommand::Close => DeviceCommand::SetServoDoor(DOOR_CLOSED_DEG),
        DoorCommand::Set { angle } => DeviceCommand::SetServoDoor(*angle),
    }
}

pub fn actuator(target: ToggleTarget) -> Actuator {
    match target {
        ToggleTarget::Led => Actuator::Led,
        ToggleTarget::Buzzer => Actuator::Buzzer,
        ToggleTarget::Hanger => Actuator::Hanger,
        ToggleTarget::Pump => Actuator::Pump,
    }
}

/// Send an explicit command.
pub async fn handle(
    controller: &Controller,
    session: &Session,
    command: DeviceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    command.validate()?;
    controller.start(session).await?;
    let result = send(controller, session, command, global).await;
    controller.shutdown().await;
    result
}

/// Flip an actuator. Needs one good read first to know its current state.
pub async fn toggle(
    controller: &Controller,
    session: &Session,
    target: ToggleTarget,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut reads = controller.read_log();
    controller.start(session).await?;

    let result = toggle_from_snapshot(controller, session, &mut reads, target, global).await;
    controller.shutdown().await;
    result
}

async fn toggle_from_snapshot(
    controller: &Controller,
    session: &Session,
    reads: &mut broadcast::Receiver<ReadRecord>,
    target: ToggleTarget,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let record = util::wait_for_read(reads, None, util::read_deadline(controller)).await?;
    if let Some(err) = util::read_error(controller, &record) {
        return Err(err);
    }
    let command = DeviceCommand::toggle(actuator(target), &controller.status_snapshot());
    debug!(%command, "resolved toggle");
    send(controller, session, command, global).await
}

async fn send(
    controller: &Controller,
    session: &Session,
    command: DeviceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut reads = controller.read_log();
    let spinner = util::spinner(format!("Sending {command}"), global);

    let ticket = match controller.dispatch(session, command).await {
        Ok(ticket) => ticket,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    if let CommandState::Failed { reason } = ticket.outcome().await {
        spinner.finish_and_clear();
        return Err(CliError::CommandFailed {
            command: command.to_string(),
            reason,
        });
    }

    spinner.set_message(format!("Confirming {command}"));
    let deadline = controller.config().confirm_delay + util::read_deadline(controller);
    let confirmed =
        util::wait_for_read(&mut reads, Some(PollOrigin::Confirmation), deadline).await;
    spinner.finish_and_clear();

    let record = confirmed?;
    if let Some(err) = util::read_error(controller, &record) {
        return Err(err);
    }

    let out = output::render_status(global.output, &util::status_view(controller));
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_subcommands_map_to_angles() {
        assert_eq!(
            door_command(&DoorCommand::Open),
            DeviceCommand::SetServoDoor(90)
        );
        assert_eq!(
            door_command(&DoorCommand::Close),
            DeviceCommand::SetServoDoor(0)
        );
        assert!(
            door_command(&DoorCommand::Set { angle: 45 })
                .validate()
                .is_err()
        );
    }
}
