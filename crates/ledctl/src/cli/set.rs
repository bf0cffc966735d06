//! `-S` mode — apply LED commands through the serializer.

use super::{
    BackendArgs, CommandSource, Result, Serializer, SessionReport, lit_names, open_backend,
    print_json, run_session,
};

/// Open the backend, run one session, and report it.
///
/// Per-command errors are logged by the serializer and do not fail the
/// command; only backend setup does.
pub(super) fn cmd_set(backend: &BackendArgs, source: CommandSource, json: bool) -> Result<()> {
    let led_backend = open_backend(backend)?;
    let serializer = Serializer::new(led_backend)?;
    let report = run_session(serializer, source);
    if json {
        print_json(&report)?;
    } else {
        log_summary(&report);
    }
    Ok(())
}

fn log_summary(report: &SessionReport) {
    if !report.authoritative {
        log::info!("{}: initial LED state assumed off", report.backend);
    }
    log::info!(
        "{} command(s): {} applied, {} rejected, {} failed; LEDs {} ({})",
        report.handled(),
        report.applied,
        report.rejected,
        report.failed,
        report.final_state,
        lit_names(report.final_state)
    );
}

