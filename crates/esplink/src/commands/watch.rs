//! `esplink watch`: poll until interrupted and print every change.

use tracing::debug;

use esplink_core::{Controller, Session};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Painter, StatusView, WatchSummary};

use super::util;

pub async fn handle(
    controller: &Controller,
    session: &Session,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(global.color);
    let mut reads = controller.read_log();
    controller.start(session).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen: u64 = 0;
    let mut last_shown: Option<StatusView> = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            consumed = util::next_reads(&mut reads) => {
                let Some(n) = consumed else { break };
                seen += n;

                let view = util::status_view(controller);
                if last_shown.as_ref().is_none_or(|prev| differs(prev, &view)) {
                    let change = render_change(global.output, &view, painter);
                    output::print_output(&change, global.quiet);
                    last_shown = Some(view);
                }

                if args.count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
    }

    controller.shutdown().await;

    let history = controller.history_snapshot();
    let summary = WatchSummary {
        reads: seen,
        sensors: history.summary(),
        usage: controller.usage(),
    };
    output::print_output(
        &output::render_summary(global.output, &summary),
        global.quiet,
    );
    Ok(())
}

/// Whether anything a user would see changed.
fn differs(prev: &StatusView, next: &StatusView) -> bool {
    let message = |view: &StatusView| view.last_error.as_ref().map(|e| e.message.clone());
    prev.status != next.status
        || prev.connectivity != next.connectivity
        || message(prev) != message(next)
}

/// One record per change: a line for humans, a compact document otherwise.
fn render_change(format: OutputFormat, view: &StatusView, painter: Painter) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Plain => output::status_line(view, painter),
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(view),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(view)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use esplink_core::{ConnectivityState, DeviceStatus, ErrorSource, SurfacedError};

    use super::*;

    fn view(led_on: bool, error: Option<&str>) -> StatusView {
        let status = DeviceStatus {
            led_on,
            ..DeviceStatus::default()
        };
        StatusView {
            status,
            door: status.door_position(),
            connectivity: ConnectivityState::Connected,
            last_error: error.map(|message| SurfacedError {
                source: ErrorSource::StatusRead,
                message: message.into(),
                failure: None,
                at: Utc::now(),
            }),
        }
    }

    #[test]
    fn same_error_text_is_not_a_change() {
        assert!(!differs(&view(false, Some("boom")), &view(false, Some("boom"))));
        assert!(differs(&view(false, None), &view(false, Some("boom"))));
        assert!(differs(&view(false, None), &view(true, None)));
    }

    #[test]
    fn json_changes_are_single_line() {
        let rendered = render_change(
            OutputFormat::Json,
            &view(true, None),
            Painter::new(crate::cli::ColorMode::Never),
        );
        assert!(!rendered.contains('\n'));
        assert!(rendered.contains("\"ledOn\":true"));
    }
}
