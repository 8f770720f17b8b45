//! Clap derive structures for the `esplink` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept free
//! of crate-internal imports so `build.rs` can include it for man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// esplink -- control an ESP32 home-automation board from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "esplink",
    version,
    about = "Monitor and control an ESP32 home-automation board",
    long_about = "Reads sensor and actuator state from an ESP32 board over its\n\
        HTTP API and sends actuator commands (LED, buzzer, door servo,\n\
        clothes hanger, pump). Commands are applied optimistically and\n\
        confirmed by a follow-up status read.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path
    #[arg(long, env = "ESPLINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device host, host:port, or URL (overrides config)
    #[arg(long, short = 'H', global = true)]
    pub host: Option<String>,

    /// Login name (defaults to the configured account)
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    /// Login password (prompted for when omitted on a terminal)
    #[arg(long, env = "ESPLINK_LOGIN_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: `defaults.output` from the config file, else table]
    #[arg(
        id = "output",
        long = "output",
        short = 'o',
        env = "ESPLINK_OUTPUT",
        value_name = "FORMAT",
        global = true
    )]
    pub output_flag: Option<OutputFormat>,

    /// When to use color output [default: `defaults.color` from the config file, else auto]
    #[arg(id = "color", long = "color", value_name = "WHEN", global = true)]
    pub color_flag: Option<ColorMode>,

    /// Output format in effect, set by [`GlobalOpts::resolve_formats`].
    #[arg(skip)]
    pub output: OutputFormat,

    /// Color mode in effect, set by [`GlobalOpts::resolve_formats`].
    #[arg(skip)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds, 0 to disable (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Settle `output` and `color`. Flags and their env vars win over the
    /// config file's defaults, which win over the built-in ones.
    pub fn resolve_formats(&mut self, defaults: Option<(OutputFormat, ColorMode)>) {
        let (output, color) = defaults.unwrap_or_default();
        self.output = self.output_flag.unwrap_or(output);
        self.color = self.color_flag.unwrap_or(color);
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain key=value lines (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the device status once
    #[command(alias = "st")]
    Status,

    /// Poll continuously and print every change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Switch the LED
    Led(SwitchArgs),

    /// Switch the buzzer
    Buzzer(SwitchArgs),

    /// Move the door servo
    Door(DoorArgs),

    /// Extend or retract the clothes hanger
    Hanger(SwitchArgs),

    /// Switch the water pump
    Pump(SwitchArgs),

    /// Flip an actuator relative to its current state
    Toggle(ToggleArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MONITORING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in milliseconds (overrides config)
    #[arg(long, short = 'i')]
    pub interval_ms: Option<u64>,

    /// Stop after this many status reads
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACTUATORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Desired state
    pub state: SwitchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Args)]
pub struct DoorArgs {
    #[command(subcommand)]
    pub command: DoorCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorCommand {
    /// Open the door (90 degrees)
    Open,

    /// Close the door (0 degrees)
    Close,

    /// Move the servo to an explicit angle (0 or 90)
    Set {
        /// Target angle in degrees
        #[arg(value_name = "DEGREES", allow_negative_numbers = true)]
        angle: i32,
    },
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    /// Actuator to flip
    pub actuator: ToggleTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleTarget {
    Led,
    Buzzer,
    Hanger,
    Pump,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG & COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file populated with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (password masked)
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
