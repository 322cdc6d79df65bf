use std::time::Duration;

use anyhow::Context;
use http_client_instrumented::prelude::HttpClient;
use loadcheck_runner::prelude::{
    CheckResult, HookResult, LoadCheckResult, RunnerContext, VuContext,
};
use url::Url;

use crate::checks::{evaluate_checks, ResponseCheck};
use crate::context::{HttpRunnerContext, HttpVuContext};

/// Parse the runner's target URL once and keep it in [HttpRunnerContext].
///
/// Use as the global setup hook, or call it from yours.
pub fn configure_target(ctx: &mut RunnerContext<HttpRunnerContext>) -> HookResult {
    let base_url = Url::parse(ctx.get_target_url())
        .with_context(|| format!("Invalid target URL: {}", ctx.get_target_url()))?;
    log::info!("Targeting {base_url}");
    ctx.get_mut().base_url = Some(base_url);

    Ok(())
}

/// Give the virtual user its own instrumented HTTP client.
///
/// Use as the virtual user setup hook, or call it from yours.
pub fn configure_client(ctx: &mut VuContext<HttpRunnerContext, HttpVuContext>) -> HookResult {
    let client = HttpClient::new(
        ctx.runner_context().reporter(),
        ctx.runner_context().request_timeout(),
    )?;
    log::debug!("HTTP client ready for {}", ctx.vu_id());
    ctx.get_mut().client = Some(client);

    Ok(())
}

/// Build a URL from the target with the given path and query parameters.
///
/// Requires [configure_target] to have run.
pub fn target_url(
    ctx: &VuContext<HttpRunnerContext, HttpVuContext>,
    path: &str,
    query: &[(&str, &str)],
) -> LoadCheckResult<Url> {
    let base_url = ctx
        .runner_context()
        .get()
        .base_url
        .as_ref()
        .context("Target not configured, call 'configure_target' in the scenario setup")?;

    let mut url = base_url
        .join(path)
        .with_context(|| format!("Cannot join {path} onto {base_url}"))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

/// Send one GET, evaluate the checks against the outcome and report each result.
///
/// A request that fails outright still produces results, all of them failed. The only error
/// returned is [loadcheck_runner::prelude::ShutdownSignalError] when the run ends while the
/// request is in flight, in which case nothing is reported. Requires [configure_client] to have
/// run.
pub fn get_and_check(
    ctx: &mut VuContext<HttpRunnerContext, HttpVuContext>,
    url: Url,
    checks: &[ResponseCheck],
) -> LoadCheckResult<Vec<CheckResult>> {
    let client = ctx
        .get()
        .client
        .clone()
        .context("HTTP client not configured, call 'configure_client' in the virtual user setup")?;

    let response = ctx
        .runner_context()
        .executor()
        .execute_in_place(async move { Ok(client.get(url).await) })?;

    if let Err(e) = &response {
        log::debug!("Request from {} failed: {e:#}", ctx.vu_id());
    }

    let results = evaluate_checks(checks, &response);
    let reporter = ctx.runner_context().reporter();
    for result in &results {
        reporter.add_check(ctx.vu_id(), result);
    }

    Ok(results)
}

/// Wait before the next iteration.
///
/// Cut short with [loadcheck_runner::prelude::ShutdownSignalError] when the run ends.
pub fn pause(ctx: &VuContext<HttpRunnerContext, HttpVuContext>, duration: Duration) -> HookResult {
    ctx.runner_context().executor().execute_in_place(async move {
        tokio::time::sleep(duration).await;
        Ok(())
    })
}
