use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use loadcheck_runner::prelude::{
    run, HookResult, LoadCheckScenarioCli, ReporterOpt, RunnerContext, ScenarioDefinitionBuilder,
    UserValuesConstraint, VuContext, SUMMARY_OUTPUT_ENV,
};
use loadcheck_summary_model::load_summary_runs;

// These tests share process-wide statics and environment variables.
static SERIAL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

#[derive(Default, Debug)]
struct RunnerValue {}

impl UserValuesConstraint for RunnerValue {}

#[derive(Default, Debug)]
struct VuValue {
    iterations: usize,
}

impl UserValuesConstraint for VuValue {}

fn cli(vus: usize) -> LoadCheckScenarioCli {
    LoadCheckScenarioCli {
        target_url: Some("http://localhost:8080".to_string()),
        vus: Some(vus),
        no_progress: true,
        reporter: ReporterOpt::Noop,
        ..Default::default()
    }
}

#[test]
fn starts_one_independent_loop_per_virtual_user() {
    let _serial = SERIAL.lock();
    static STARTED: Mutex<Option<HashSet<String>>> = Mutex::new(None);
    static LOOPING: Mutex<Option<HashSet<String>>> = Mutex::new(None);

    fn vu_setup(ctx: &mut VuContext<RunnerValue, VuValue>) -> HookResult {
        STARTED
            .lock()
            .unwrap()
            .get_or_insert_with(HashSet::new)
            .insert(ctx.vu_id().to_string());
        Ok(())
    }

    fn vu_behaviour(ctx: &mut VuContext<RunnerValue, VuValue>) -> HookResult {
        ctx.get_mut().iterations += 1;
        if ctx.get().iterations == 3 {
            LOOPING
                .lock()
                .unwrap()
                .get_or_insert_with(HashSet::new)
                .insert(ctx.vu_id().to_string());
        }
        std::thread::sleep(Duration::from_millis(5));
        Ok(())
    }

    for vus in [1, 4, 10] {
        *STARTED.lock().unwrap() = None;
        *LOOPING.lock().unwrap() = None;

        let scenario = ScenarioDefinitionBuilder::<RunnerValue, VuValue>::new(
            "starts_one_independent_loop_per_virtual_user",
            cli(vus),
        )
        .with_default_duration_s(1)
        .use_vu_setup(vu_setup)
        .use_vu_behaviour(vu_behaviour);

        let ended = run(scenario).unwrap();
        assert_eq!(vus, ended);

        let expected = (0..vus).map(|i| format!("vu-{i}")).collect::<HashSet<_>>();
        assert_eq!(Some(expected.clone()), STARTED.lock().unwrap().take());
        assert_eq!(Some(expected), LOOPING.lock().unwrap().take());
    }
}

#[test]
fn run_stops_when_duration_elapses() {
    let _serial = SERIAL.lock();
    static ITERATIONS: AtomicUsize = AtomicUsize::new(0);

    fn vu_behaviour(ctx: &mut VuContext<RunnerValue, VuValue>) -> HookResult {
        ITERATIONS.fetch_add(1, Ordering::SeqCst);
        ctx.runner_context().executor().execute_in_place(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
    }

    let mut cfg = cli(2);
    cfg.duration = Some(Duration::from_secs(1));

    let scenario =
        ScenarioDefinitionBuilder::<RunnerValue, VuValue>::new("run_stops_when_duration_elapses", cfg)
            .use_vu_behaviour(vu_behaviour);

    let started = Instant::now();
    let ended = run(scenario).unwrap();
    let took = started.elapsed();

    assert_eq!(2, ended);
    assert!(took >= Duration::from_secs(1), "ended early after {took:?}");
    assert!(took < Duration::from_secs(5), "took too long: {took:?}");

    // Two VUs pausing 200ms per iteration for one second, with slack for scheduling.
    let iterations = ITERATIONS.load(Ordering::SeqCst);
    assert!((6..=14).contains(&iterations), "unexpected iteration count {iterations}");
}

#[test]
fn run_summary_is_appended_when_requested() {
    let _serial = SERIAL.lock();
    fn vu_behaviour(ctx: &mut VuContext<RunnerValue, VuValue>) -> HookResult {
        ctx.runner_context().force_stop_scenario();
        Ok(())
    }

    fn teardown(ctx: Arc<RunnerContext<RunnerValue>>) -> HookResult {
        assert_eq!("summary-run", ctx.run_id());
        Ok(())
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.jsonl");
    std::env::set_var(SUMMARY_OUTPUT_ENV, &path);

    let mut cfg = cli(3);
    cfg.run_id = Some("summary-run".to_string());
    let scenario = ScenarioDefinitionBuilder::<RunnerValue, VuValue>::new(
        "run_summary_is_appended_when_requested",
        cfg,
    )
    .with_default_duration_s(30)
    .use_vu_behaviour(vu_behaviour)
    .use_teardown(teardown);

    let result = run(scenario);
    std::env::remove_var(SUMMARY_OUTPUT_ENV);
    assert_eq!(3, result.unwrap());

    let runs = load_summary_runs(&path).unwrap();
    assert_eq!(1, runs.len());
    assert_eq!("summary-run", runs[0].run_id);
    assert_eq!("run_summary_is_appended_when_requested", runs[0].scenario_name);
    assert_eq!(Some(30), runs[0].run_duration);
    assert_eq!(3, runs[0].vu_count);
    assert_eq!(3, runs[0].vu_end_count);
    assert_eq!(Some(&3), runs[0].assigned_behaviours.get("default"));
}
