use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};

use crate::cli::{LoadCheckScenarioCli, ReporterOpt};
use crate::config::RunConfig;
use crate::context::{RunnerContext, UserValuesConstraint, VuContext};

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type VuHookMut<RV, V> = fn(&mut VuContext<RV, V>) -> HookResult;

const DEFAULT_BEHAVIOUR: &str = "default";

/// The builder for a scenario definition.
///
/// This must be used at the start of a scenario binary to define what each virtual user does.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario, which should be unique within the workspace.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: LoadCheckScenarioCli,
    default_vus: Option<usize>,
    default_duration: Option<Duration>,
    default_target_url: Option<String>,
    /// Global setup hook, run once before any virtual users are started.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook run once by each virtual user as it starts, before its first iteration.
    setup_vu_fn: Option<VuHookMut<RV, V>>,
    /// The behaviours for this scenario. There are two ways that this can be used:
    /// - Specify a single behaviour for all virtual users using [ScenarioDefinitionBuilder::use_vu_behaviour].
    /// - Specify multiple behaviours using [ScenarioDefinitionBuilder::use_named_vu_behaviour] and
    ///   assign them with `--behaviour name:count` on the command line.
    vu_behaviour: HashMap<String, VuHookMut<RV, V>>,
    /// Teardown hook run once by each virtual user after its last iteration.
    teardown_vu_fn: Option<VuHookMut<RV, V>>,
    /// Global teardown hook, run once after all virtual users have stopped. Best effort.
    teardown_fn: Option<GlobalHook<RV>>,
}

/// A validated scenario, ready for [crate::run::run].
pub(crate) struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub name: String,
    pub run_config: RunConfig,
    pub assigned_behaviours: Vec<(String, usize)>,
    pub target_url: String,
    pub run_id: String,
    pub reporter: ReporterOpt,
    pub influx_dir: PathBuf,
    pub request_timeout: Duration,
    pub no_progress: bool,
    pub setup_fn: Option<GlobalHookMut<RV>>,
    pub setup_vu_fn: Option<VuHookMut<RV, V>>,
    pub vu_behaviour: HashMap<String, VuHookMut<RV, V>>,
    pub teardown_vu_fn: Option<VuHookMut<RV, V>>,
    pub teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Create a scenario definition from the scenario name and an already parsed command line.
    pub fn new(name: &str, cli: LoadCheckScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_vus: None,
            default_duration: None,
            default_target_url: None,
            setup_fn: None,
            setup_vu_fn: None,
            vu_behaviour: HashMap::new(),
            teardown_vu_fn: None,
            teardown_fn: None,
        }
    }

    /// Initialise logging, parse the command line and create a scenario definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    /// Number of virtual users to run when `--vus` is not given.
    pub fn with_default_vus(mut self, vus: usize) -> Self {
        self.default_vus = Some(vus);
        self
    }

    /// Run duration when `--duration` is not given.
    pub fn with_default_duration_s(mut self, duration_s: u64) -> Self {
        self.default_duration = Some(Duration::from_secs(duration_s));
        self
    }

    /// Target URL when `--target-url` is not given.
    pub fn with_default_target_url(mut self, target_url: &str) -> Self {
        self.default_target_url = Some(target_url.to_string());
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this scenario.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Set the virtual user setup hook [ScenarioDefinitionBuilder::setup_vu_fn] for this scenario.
    pub fn use_vu_setup(mut self, setup_vu_fn: VuHookMut<RV, V>) -> Self {
        self.setup_vu_fn = Some(setup_vu_fn);
        self
    }

    /// Set the default behaviour, used by every virtual user without an explicit assignment.
    pub fn use_vu_behaviour(self, behaviour: VuHookMut<RV, V>) -> Self {
        self.use_named_vu_behaviour(DEFAULT_BEHAVIOUR, behaviour)
    }

    /// Register a named behaviour [ScenarioDefinitionBuilder::vu_behaviour] for this scenario.
    pub fn use_named_vu_behaviour(mut self, name: &str, behaviour: VuHookMut<RV, V>) -> Self {
        let previous = self.vu_behaviour.insert(name.to_string(), behaviour);

        if previous.is_some() {
            panic!("Behaviour [{}] is already defined", name);
        }

        self
    }

    /// Set the virtual user teardown hook [ScenarioDefinitionBuilder::teardown_vu_fn].
    pub fn use_vu_teardown(mut self, teardown_vu_fn: VuHookMut<RV, V>) -> Self {
        self.teardown_vu_fn = Some(teardown_vu_fn);
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn].
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        let assigned_count = self.cli.behaviour.iter().map(|(_, count)| count).sum::<usize>();
        let vus = self
            .cli
            .vus
            .or(self.default_vus)
            .unwrap_or(assigned_count.max(1));

        let duration = if self.cli.soak {
            None
        } else {
            self.cli.duration.or(self.default_duration)
        };
        let run_config = RunConfig::new(vus, duration)?;

        let assigned_behaviours = self.assign_behaviours(vus, assigned_count)?;

        let target_url = self
            .cli
            .target_url
            .clone()
            .or(self.default_target_url.clone())
            .context("No target URL configured, pass --target-url")?;
        url::Url::parse(&target_url)
            .with_context(|| format!("Invalid target URL: {target_url}"))?;

        Ok(ScenarioDefinition {
            name: self.name,
            run_config,
            assigned_behaviours,
            target_url,
            run_id: self
                .cli
                .run_id
                .unwrap_or_else(|| nanoid::nanoid!()),
            reporter: self.cli.reporter,
            influx_dir: self.cli.influx_dir,
            request_timeout: Duration::from_secs(self.cli.request_timeout_s),
            no_progress: self.cli.no_progress,
            setup_fn: self.setup_fn,
            setup_vu_fn: self.setup_vu_fn,
            vu_behaviour: self.vu_behaviour,
            teardown_vu_fn: self.teardown_vu_fn,
            teardown_fn: self.teardown_fn,
        })
    }

    fn assign_behaviours(
        &self,
        vus: usize,
        assigned_count: usize,
    ) -> anyhow::Result<Vec<(String, usize)>> {
        if assigned_count > vus {
            bail!(
                "Behaviours are assigned to {assigned_count} virtual users but only {vus} are configured"
            );
        }

        let mut assigned = Vec::new();
        for (name, count) in &self.cli.behaviour {
            if !self.vu_behaviour.contains_key(name) {
                bail!("Behaviour [{name}] is not defined by this scenario");
            }
            assigned.push((name.clone(), *count));
        }

        let remaining = vus - assigned_count;
        if remaining > 0 {
            if self.vu_behaviour.is_empty() || self.vu_behaviour.contains_key(DEFAULT_BEHAVIOUR) {
                assigned.push((DEFAULT_BEHAVIOUR.to_string(), remaining));
            } else {
                bail!(
                    "{remaining} virtual users have no behaviour assigned and this scenario has no default behaviour"
                );
            }
        }

        Ok(assigned)
    }
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinition<RV, V> {
    /// One behaviour name per virtual user, in start order.
    pub(crate) fn assigned_behaviours_flat(&self) -> Vec<String> {
        self.assigned_behaviours
            .iter()
            .flat_map(|(name, count)| std::iter::repeat(name.clone()).take(*count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default, Debug)]
    struct Values;

    impl UserValuesConstraint for Values {}

    fn noop(_ctx: &mut VuContext<Values, Values>) -> HookResult {
        Ok(())
    }

    fn cli() -> LoadCheckScenarioCli {
        LoadCheckScenarioCli {
            target_url: Some("http://localhost:8080".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_cli_is_silent() {
        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli())
            .with_default_vus(10)
            .with_default_duration_s(10)
            .use_vu_behaviour(noop)
            .build()
            .unwrap();

        assert_eq!(
            RunConfig::new(10, Some(Duration::from_secs(10))).unwrap(),
            definition.run_config
        );
        assert_eq!(vec![("default".to_string(), 10)], definition.assigned_behaviours);
        assert_eq!(10, definition.assigned_behaviours_flat().len());
    }

    #[test]
    fn cli_overrides_defaults() {
        let mut cli = cli();
        cli.vus = Some(3);
        cli.duration = Some(Duration::from_secs(2));

        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .with_default_vus(10)
            .with_default_duration_s(10)
            .use_vu_behaviour(noop)
            .build()
            .unwrap();

        assert_eq!(3, definition.run_config.virtual_users());
        assert_eq!(Some(Duration::from_secs(2)), definition.run_config.duration());
    }

    #[test]
    fn soak_ignores_duration() {
        let mut cli = cli();
        cli.soak = true;

        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .with_default_duration_s(10)
            .use_vu_behaviour(noop)
            .build()
            .unwrap();

        assert!(definition.run_config.is_soak());
    }

    #[test]
    fn named_behaviours_fill_with_default() {
        let mut cli = cli();
        cli.vus = Some(5);
        cli.behaviour = vec![("slow".to_string(), 2)];

        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .use_vu_behaviour(noop)
            .use_named_vu_behaviour("slow", noop)
            .build()
            .unwrap();

        assert_eq!(
            vec!["slow", "slow", "default", "default", "default"],
            definition.assigned_behaviours_flat()
        );
    }

    #[test]
    fn reject_zero_vus() {
        let mut cli = cli();
        cli.vus = Some(0);

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .use_vu_behaviour(noop)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_unknown_behaviour() {
        let mut cli = cli();
        cli.behaviour = vec![("missing".to_string(), 1)];

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .use_vu_behaviour(noop)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_over_assignment() {
        let mut cli = cli();
        cli.vus = Some(1);
        cli.behaviour = vec![("slow".to_string(), 2)];

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .use_named_vu_behaviour("slow", noop)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_unassigned_without_default() {
        let mut cli = cli();
        cli.vus = Some(2);
        cli.behaviour = vec![("slow".to_string(), 1)];

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli)
            .use_named_vu_behaviour("slow", noop)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_missing_or_invalid_target() {
        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", Default::default())
            .use_vu_behaviour(noop)
            .build();
        assert!(result.is_err());

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("t", Default::default())
            .with_default_target_url("not a url")
            .use_vu_behaviour(noop)
            .build();
        assert!(result.is_err());
    }

    #[test]
    #[should_panic(expected = "already defined")]
    fn duplicate_behaviour_panics() {
        let _ = ScenarioDefinitionBuilder::<Values, Values>::new("t", cli())
            .use_vu_behaviour(noop)
            .use_vu_behaviour(noop);
    }
}
