//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits `key=value` lines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use esplink_core::{
    ConnectivityState, DeviceStatus, DoorPosition, SensorSummary, SurfacedError, UsageCounters,
};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Applies the palette only when color is enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    pub fn switch(self, on: bool) -> String {
        match (self.enabled, on) {
            (false, _) => on_off(on).to_owned(),
            (true, true) => on_off(on).green().bold().to_string(),
            (true, false) => on_off(on).dimmed().to_string(),
        }
    }

    pub fn connectivity(self, state: ConnectivityState) -> String {
        let label = state.to_string().to_lowercase();
        match (self.enabled, state) {
            (false, _) => label,
            (true, ConnectivityState::Connected) => label.green().to_string(),
            (true, ConnectivityState::Disconnected) => label.red().bold().to_string(),
        }
    }

    pub fn error(self, message: &str) -> String {
        if self.enabled {
            message.yellow().to_string()
        } else {
            message.to_owned()
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn door_label(position: DoorPosition) -> String {
    match position {
        DoorPosition::Closed => "closed".into(),
        DoorPosition::Open => "open".into(),
        DoorPosition::Intermediate(deg) => format!("moving ({deg}°)"),
    }
}

fn hanger_label(status: &DeviceStatus) -> &'static str {
    if status.hanger_on { "extended" } else { "retracted" }
}

// ── Views ────────────────────────────────────────────────────────────

/// Everything `status` and the control commands print.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    #[serde(flatten)]
    pub status: DeviceStatus,
    pub door: DoorPosition,
    pub connectivity: ConnectivityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<SurfacedError>,
}

/// Printed when `watch` ends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSummary {
    pub reads: u64,
    pub sensors: Option<SensorSummary>,
    pub usage: UsageCounters,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(field: &'static str, value: impl Into<String>) -> FieldRow {
    FieldRow {
        field,
        value: value.into(),
    }
}

// ── Status rendering ─────────────────────────────────────────────────

pub fn render_status(format: OutputFormat, view: &StatusView) -> String {
    render_single(format, view, status_detail, status_plain)
}

fn status_detail(view: &StatusView) -> String {
    let s = &view.status;
    let mut rows = vec![
        row("Temperature", format!("{:.1} °C", s.temperature_c)),
        row("Humidity", format!("{:.1} %", s.humidity_pct)),
        row("LED", on_off(s.led_on)),
        row("Buzzer", on_off(s.buzzer_on)),
        row("Door", door_label(view.door)),
        row(
            "Hanger",
            format!("{} ({}°)", hanger_label(s), s.hanger_angle_deg),
        ),
        row("Pump", on_off(s.pump_on)),
        row("Connection", view.connectivity.to_string().to_lowercase()),
    ];
    if let Some(ref err) = view.last_error {
        rows.push(row("Last error", err.message.clone()));
    }
    render_table(&rows)
}

fn status_plain(view: &StatusView) -> String {
    let s = &view.status;
    let mut lines = vec![
        format!("temperature_c={:.1}", s.temperature_c),
        format!("humidity_pct={:.1}", s.humidity_pct),
        format!("led={}", on_off(s.led_on)),
        format!("buzzer={}", on_off(s.buzzer_on)),
        format!("door_angle_deg={}", s.door_angle_deg),
        format!("hanger={}", on_off(s.hanger_on)),
        format!("hanger_angle_deg={}", s.hanger_angle_deg),
        format!("pump={}", on_off(s.pump_on)),
        format!(
            "connectivity={}",
            view.connectivity.to_string().to_lowercase()
        ),
    ];
    if let Some(ref err) = view.last_error {
        lines.push(format!("error={}", err.message));
    }
    lines.join("\n")
}

/// One line per observed change, for `watch` in table/plain mode.
pub fn status_line(view: &StatusView, painter: Painter) -> String {
    let s = &view.status;
    let mut line = format!(
        "{}  {:>5.1}°C {:>5.1}%  led:{} buzzer:{} door:{} hanger:{} pump:{}  [{}]",
        chrono::Local::now().format("%H:%M:%S"),
        s.temperature_c,
        s.humidity_pct,
        painter.switch(s.led_on),
        painter.switch(s.buzzer_on),
        door_label(view.door),
        painter.switch(s.hanger_on),
        painter.switch(s.pump_on),
        painter.connectivity(view.connectivity),
    );
    if let Some(ref err) = view.last_error {
        line.push_str("  ");
        line.push_str(&painter.error(&err.message));
    }
    line
}

pub fn render_summary(format: OutputFormat, summary: &WatchSummary) -> String {
    render_single(format, summary, summary_detail, summary_plain)
}

fn summary_detail(summary: &WatchSummary) -> String {
    let mut rows = vec![row("Reads", summary.reads.to_string())];
    if let Some(ref sensors) = summary.sensors {
        rows.push(row("Samples", sensors.samples.to_string()));
        rows.push(row(
            "Temperature",
            format!(
                "min {:.1} / mean {:.1} / max {:.1} °C",
                sensors.temperature_c.min, sensors.temperature_c.mean, sensors.temperature_c.max
            ),
        ));
        rows.push(row(
            "Humidity",
            format!(
                "min {:.1} / mean {:.1} / max {:.1} %",
                sensors.humidity_pct.min, sensors.humidity_pct.mean, sensors.humidity_pct.max
            ),
        ));
    }
    let u = &summary.usage;
    rows.push(row("LED switched on", u.led_on.to_string()));
    rows.push(row("Buzzer switched on", u.buzzer_on.to_string()));
    rows.push(row("Door operations", u.door_operations.to_string()));
    rows.push(row("Hanger operations", u.hanger_operations.to_string()));
    rows.push(row("Pump switched on", u.pump_on.to_string()));
    render_table(&rows)
}

fn summary_plain(summary: &WatchSummary) -> String {
    let mut lines = vec![format!("reads={}", summary.reads)];
    if let Some(ref sensors) = summary.sensors {
        lines.push(format!("samples={}", sensors.samples));
        lines.push(format!("temperature_mean_c={:.1}", sensors.temperature_c.mean));
        lines.push(format!("humidity_mean_pct={:.1}", sensors.humidity_pct.mean));
    }
    lines.join("\n")
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since detail views are key/value
/// tables rather than a `Tabled` derive over `T`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json_pretty<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: {e}"))
}
