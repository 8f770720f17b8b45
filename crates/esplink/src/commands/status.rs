//! `esplink status`: one authoritative read.

use esplink_core::{Controller, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut reads = controller.read_log();
    controller.start(session).await?;
    let waited = util::wait_for_read(&mut reads, None, util::read_deadline(controller)).await;
    controller.shutdown().await;

    let record = waited?;
    if let Some(err) = util::read_error(controller, &record) {
        return Err(err);
    }

    let out = output::render_status(global.output, &util::status_view(controller));
    output::print_output(&out, global.quiet);
    Ok(())
}
