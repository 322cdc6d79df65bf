use http_load_runner::prelude::*;

fn main() -> LoadCheckResult<()> {
    let builder = team_get::scenario(ScenarioDefinitionBuilder::<
        HttpRunnerContext,
        HttpVuContext,
    >::new_with_init(env!("CARGO_PKG_NAME")));

    run(builder)?;

    Ok(())
}
