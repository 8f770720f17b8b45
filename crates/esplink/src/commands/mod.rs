//! Command dispatch: bridges CLI args -> core commands -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod status;
pub mod util;
pub mod watch;

use esplink_core::{Controller, DeviceCommand, Session};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, session, global).await,
        Command::Watch(args) => watch::handle(controller, session, &args, global).await,
        Command::Led(args) => {
            let command = DeviceCommand::SetLed(args.state.is_on());
            control::handle(controller, session, command, global).await
        }
        Command::Buzzer(args) => {
            let command = DeviceCommand::SetBuzzer(args.state.is_on());
            control::handle(controller, session, command, global).await
        }
        Command::Door(args) => {
            let command = control::door_command(&args.command);
            control::handle(controller, session, command, global).await
        }
        Command::Hanger(args) => {
            let command = DeviceCommand::SetHanger(args.state.is_on());
            control::handle(controller, session, command, global).await
        }
        Command::Pump(args) => {
            let command = DeviceCommand::SetPump(args.state.is_on());
            control::handle(controller, session, command, global).await
        }
        Command::Toggle(args) => {
            control::toggle(controller, session, args.actuator, global).await
        }
        // Config and Completions are handled before a controller exists
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
