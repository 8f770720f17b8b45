//! Config subcommand handlers. None of these touch the device.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::resolved_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config(&Config::default(), &path)?;
            output::print_output(&format!("Wrote {}", path.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => config::render_redacted(&cfg)?,
                OutputFormat::Json => output::render_json_pretty(&redacted(cfg)),
                OutputFormat::JsonCompact => output::render_json_compact(&redacted(cfg)),
                OutputFormat::Yaml => output::render_yaml(&redacted(cfg)),
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = config::resolved_path(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}

fn redacted(mut cfg: Config) -> Config {
    MASK.clone_into(&mut cfg.login.password);
    cfg
}
