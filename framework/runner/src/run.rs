use std::sync::Arc;

use anyhow::Context;
use loadcheck_core::prelude::VuBailError;
use loadcheck_instruments::prelude::ReportConfig;

use crate::cli::ReporterOpt;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::summary::{new_run_summary, write_run_summary};
use crate::{
    context::{RunnerContext, UserValuesConstraint, VuContext},
    definition::{ScenarioDefinition, ScenarioDefinitionBuilder},
    executor::Executor,
    shutdown::{start_shutdown_listener, ShutdownSignalError},
};

/// Run the scenario to completion.
///
/// Starts one thread per configured virtual user, each looping its behaviour until the run
/// duration elapses or the run is stopped. Returns the number of virtual users that were still
/// running their behaviour when the run ended.
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<usize> {
    let definition = definition.build()?;

    log::info!(
        "Running scenario {} [run id {}] against {} with {} virtual users",
        definition.name,
        definition.run_id,
        definition.target_url,
        definition.run_config.virtual_users()
    );

    let started_at = chrono::Utc::now().timestamp();
    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let reporter = Arc::new(
        report_config(&definition)
            .init(runtime.handle(), &shutdown_handle)
            .context("Failed to set up reporting")?,
    );
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));

    let mut runner_context = RunnerContext::new(
        executor,
        reporter,
        shutdown_handle.clone(),
        definition.run_config,
        definition.target_url.clone(),
        definition.run_id.clone(),
        definition.request_timeout,
    );

    if let Some(setup_fn) = definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    // The clock for a time bounded run starts once setup is done.
    if let Some(duration) = definition.run_config.duration() {
        if !definition.no_progress {
            start_progress(duration, shutdown_handle.new_listener());
        }

        let shutdown_handle = shutdown_handle.clone();
        runner_context.executor().spawn(async move {
            tokio::time::sleep(duration).await;
            log::info!("Run duration elapsed, stopping virtual users");
            shutdown_handle.shutdown();
        });
    }

    let runner_context = Arc::new(runner_context);

    // Virtual users are about to start generating load, watch for the load generator becoming the
    // bottleneck.
    start_monitor(shutdown_handle.new_listener());

    let mut handles = Vec::new();
    let assigned_behaviours = definition.assigned_behaviours_flat();
    for (vu_index, assigned_behaviour) in assigned_behaviours.into_iter().enumerate() {
        let runner_context = runner_context.clone();

        let setup_vu_fn = definition.setup_vu_fn;
        let behaviour_fn = definition.vu_behaviour.get(&assigned_behaviour).copied();
        let teardown_vu_fn = definition.teardown_vu_fn;

        // For the runner to check between iterations
        let mut cycle_shutdown_listener = shutdown_handle.new_listener();
        // For the behaviour to listen for shutdown and respond appropriately
        let delegated_shutdown_listener = shutdown_handle.new_listener();

        let vu_id = format!("vu-{vu_index}");

        let handle = std::thread::Builder::new()
            .name(vu_id.clone())
            .spawn(move || {
                let mut context = VuContext::<RV, V>::new(
                    vu_id.clone(),
                    runner_context,
                    delegated_shutdown_listener,
                );

                if let Some(setup_vu_fn) = setup_vu_fn {
                    if let Err(e) = setup_vu_fn(&mut context) {
                        log::error!("Setup failed for {vu_id}: {e:?}");
                        return false;
                    }
                }

                let mut bailed = false;
                if let Some(behaviour) = behaviour_fn {
                    log::debug!("Starting {vu_id} with behaviour {assigned_behaviour}");
                    let mut iterations = 0u64;
                    loop {
                        if cycle_shutdown_listener.should_shutdown() {
                            log::debug!("Stopping {vu_id} after {iterations} iterations");
                            break;
                        }

                        match behaviour(&mut context) {
                            Ok(()) => {}
                            Err(e) if e.is::<ShutdownSignalError>() => {
                                // Expected when the run ends mid-iteration, the check at the top
                                // of the loop ends it.
                            }
                            Err(e) if e.is::<VuBailError>() => {
                                log::warn!("{vu_id} stopped early: {e}");
                                bailed = true;
                                break;
                            }
                            Err(e) => {
                                log::error!("Behaviour failed for {vu_id}: {e:?}");
                            }
                        }
                        iterations += 1;
                    }
                }

                if let Some(teardown_vu_fn) = teardown_vu_fn {
                    if let Err(e) = teardown_vu_fn(&mut context) {
                        log::error!("Teardown failed for {vu_id}: {e:?}");
                    }
                }

                !bailed
            })
            .context("Failed to spawn thread for virtual user")?;
        handles.push(handle);
    }

    let mut vu_end_count = 0;
    for handle in handles {
        let completed = handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining thread for virtual user: {:?}", e))?;
        if completed {
            vu_end_count += 1;
        }
    }

    // Every virtual user may have stopped before the duration, make sure background work ends.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Best effort, reporting and a clean shutdown still need to happen.
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {:?}", e);
        }
    }

    runner_context.reporter().finalize();

    let mut summary = new_run_summary(
        &definition.run_id,
        &definition.name,
        started_at,
        &definition.run_config,
        &definition.target_url,
        &definition.assigned_behaviours,
    );
    summary.set_vu_end_count(vu_end_count);
    write_run_summary(&summary);

    log::info!(
        "Scenario {} finished, {vu_end_count} of {} virtual users ran to the end",
        definition.name,
        definition.run_config.virtual_users()
    );

    Ok(vu_end_count)
}

fn report_config<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: &ScenarioDefinition<RV, V>,
) -> ReportConfig {
    match definition.reporter {
        ReporterOpt::InMemory => ReportConfig::default().enable_in_memory(),
        ReporterOpt::InfluxFile => ReportConfig::default().enable_influx_file(
            definition.influx_dir.clone(),
            format!("{}-{}", definition.name, definition.run_id),
        ),
        ReporterOpt::Noop => ReportConfig::default(),
    }
}
