mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod shutdown;
mod summary;
mod types;

pub mod prelude {
    pub use crate::cli::{parse_duration, LoadCheckScenarioCli, ReporterOpt};
    pub use crate::config::RunConfig;
    pub use crate::context::{RunnerContext, UserValuesConstraint, VuContext};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::run::run;
    pub use crate::summary::SUMMARY_OUTPUT_ENV;
    pub use crate::types::LoadCheckResult;

    pub use loadcheck_core::prelude::{ShutdownSignalError, VuBailError};
    pub use loadcheck_instruments::prelude::{
        report_operation, CheckResult, OperationRecord, Reporter,
    };
}
