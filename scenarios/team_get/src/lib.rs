use std::time::Duration;

use http_load_runner::prelude::*;

pub const DEFAULT_TARGET_URL: &str = "http://localhost:8080";
pub const DEFAULT_VUS: usize = 10;
pub const DEFAULT_DURATION_S: u64 = 10;

pub const TEAM_NAME: &str = "backend";
pub const MAX_RESPONSE_TIME: Duration = Duration::from_millis(300);
pub const THINK_TIME: Duration = Duration::from_millis(200);

pub fn team_checks() -> Vec<ResponseCheck> {
    vec![
        ResponseCheck::status_is(200),
        ResponseCheck::response_time_under(MAX_RESPONSE_TIME),
    ]
}

/// Look up the team once, check the response, then wait [THINK_TIME].
pub fn team_get_iteration(
    ctx: &mut VuContext<HttpRunnerContext, HttpVuContext>,
) -> LoadCheckResult<Vec<CheckResult>> {
    let url = target_url(ctx, "/team/get", &[("team_name", TEAM_NAME)])?;
    let results = get_and_check(ctx, url, &team_checks())?;
    log::trace!("{} checks: {results:?}", ctx.vu_id());

    pause(ctx, THINK_TIME)?;

    Ok(results)
}

pub fn vu_behaviour(ctx: &mut VuContext<HttpRunnerContext, HttpVuContext>) -> HookResult {
    team_get_iteration(ctx)?;
    Ok(())
}

pub fn scenario(
    builder: ScenarioDefinitionBuilder<HttpRunnerContext, HttpVuContext>,
) -> ScenarioDefinitionBuilder<HttpRunnerContext, HttpVuContext> {
    builder
        .with_default_target_url(DEFAULT_TARGET_URL)
        .with_default_vus(DEFAULT_VUS)
        .with_default_duration_s(DEFAULT_DURATION_S)
        .use_setup(configure_target)
        .use_vu_setup(configure_client)
        .use_vu_behaviour(vu_behaviour)
}
