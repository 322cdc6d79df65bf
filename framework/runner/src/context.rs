use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use loadcheck_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use loadcheck_instruments::prelude::Reporter;

use crate::config::RunConfig;
use crate::executor::Executor;

pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// State shared by every virtual user for the whole run.
///
/// Mutable only in the global setup hook, after that it is shared read-only.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    reporter: Arc<Reporter>,
    shutdown_handle: ShutdownHandle,
    run_config: RunConfig,
    target_url: String,
    run_id: String,
    request_timeout: Duration,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        reporter: Arc<Reporter>,
        shutdown_handle: ShutdownHandle,
        run_config: RunConfig,
        target_url: String,
        run_id: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            reporter,
            shutdown_handle,
            run_config,
            target_url,
            run_id,
            request_timeout,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> Arc<Reporter> {
        self.reporter.clone()
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// The base URL of the service under test.
    pub fn get_target_url(&self) -> &str {
        &self.target_url
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// End the run now, as if the duration had elapsed.
    ///
    /// Virtual users finish their current iteration, or have it cancelled, and then tear down.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// State owned by a single virtual user.
pub struct VuContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    vu_id: String,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: DelegatedShutdownListener,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> VuContext<RV, V> {
    pub(crate) fn new(
        vu_id: String,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            vu_id,
            runner_context,
            shutdown_listener,
            value: Default::default(),
        }
    }

    /// Stable identifier of this virtual user within the run, `vu-<index>`.
    pub fn vu_id(&self) -> &str {
        &self.vu_id
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn get(&self) -> &V {
        &self.value
    }
}
