mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use esplink_core::{Controller, DeviceConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        command,
        mut global,
    } = cli;

    match command {
        // Config commands don't need the device, and `config init --force`
        // has to work over a file that no longer loads.
        Command::Config(ref args) => {
            let defaults = config::load(&global)
                .ok()
                .and_then(|cfg| config::format_defaults(&cfg).ok());
            global.resolve_formats(defaults);
            commands::config_cmd::handle(args, &global)
        }

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "esplink", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load(&global)?;
            global.resolve_formats(Some(config::format_defaults(&cfg)?));
            let session = commands::util::login(&cfg, &global)?;
            let device = device_config_for(&cmd, &cfg)?;
            let controller = Controller::connect_http(device)?;

            tracing::debug!(command = ?cmd, url = %controller.config().url, "dispatching command");
            commands::dispatch(cmd, &controller, &session, &global).await
        }
    }
}

/// Core config plus per-command overrides.
fn device_config_for(cmd: &Command, cfg: &config::Config) -> Result<DeviceConfig, CliError> {
    let mut device = config::device_config(cfg)?;
    if let Command::Watch(args) = cmd {
        if let Some(ms) = args.interval_ms {
            if ms == 0 {
                return Err(CliError::Validation {
                    field: "interval-ms".into(),
                    reason: "must be greater than zero".into(),
                });
            }
            device.poll_interval = Duration::from_millis(ms);
        }
    }
    Ok(device)
}
