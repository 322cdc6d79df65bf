use std::collections::HashMap;
use std::path::PathBuf;

use loadcheck_summary_model::{append_run_summary, RunSummary};

use crate::config::RunConfig;

/// Append a JSON line describing the run to the file named by this variable, when it is set.
pub const SUMMARY_OUTPUT_ENV: &str = "LOADCHECK_SUMMARY_OUTPUT";

/// Environment variables worth keeping with the run for later comparison.
const CAPTURED_ENV: &[&str] = &["RUST_LOG"];

pub(crate) fn new_run_summary(
    run_id: &str,
    scenario_name: &str,
    started_at: i64,
    run_config: &RunConfig,
    target_url: &str,
    assigned_behaviours: &[(String, usize)],
) -> RunSummary {
    let mut assigned = HashMap::new();
    for (name, count) in assigned_behaviours {
        *assigned.entry(name.clone()).or_insert(0) += count;
    }

    let mut summary = RunSummary::new(
        run_id.to_string(),
        scenario_name.to_string(),
        started_at,
        run_config.duration().map(|d| d.as_secs()),
        target_url.to_string(),
        run_config.virtual_users(),
        assigned,
        env!("CARGO_PKG_VERSION").to_string(),
    );

    for key in CAPTURED_ENV {
        if let Ok(value) = std::env::var(key) {
            summary.add_env(key.to_string(), value);
        }
    }

    summary
}

/// Write the summary if [SUMMARY_OUTPUT_ENV] is set. Failures are logged, the run is already over.
pub(crate) fn write_run_summary(summary: &RunSummary) {
    let Some(path) = std::env::var_os(SUMMARY_OUTPUT_ENV).map(PathBuf::from) else {
        return;
    };

    match append_run_summary(summary, &path) {
        Ok(()) => log::info!(
            "Run summary {} written to {}",
            summary.fingerprint(),
            path.display()
        ),
        Err(e) => log::error!("Failed to write run summary to {}: {e:?}", path.display()),
    }
}
