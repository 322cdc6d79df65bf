mod in_memory_reporter;
mod influx_file_reporter;

use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use loadcheck_core::prelude::ShutdownHandle;

use crate::check::CheckResult;
use crate::operation::OperationRecord;

pub use in_memory_reporter::{CheckRow, InMemoryReporter, OperationRow};
use influx_file_reporter::InfluxFileReportCollector;

pub trait ReportCollector {
    fn add_operation(&mut self, operation_record: &OperationRecord);

    /// Record the outcome of a check made by the given virtual user.
    fn add_check(&mut self, vu_id: &str, check: &CheckResult);

    fn finalize(&self);
}

/// Which collectors the [Reporter] should send records to.
#[derive(Default)]
pub struct ReportConfig {
    enable_in_memory: bool,
    influx_file: Option<InfluxFileConfig>,
    custom: Vec<Box<dyn ReportCollector + Send>>,
}

#[derive(Debug)]
struct InfluxFileConfig {
    dir: PathBuf,
    file_stem: String,
}

impl ReportConfig {
    /// Keep everything in memory and print summary tables when the run finishes.
    pub fn enable_in_memory(mut self) -> Self {
        self.enable_in_memory = true;
        self
    }

    /// Write records in the InfluxDB line protocol to `<dir>/<file_stem>.influx`.
    pub fn enable_influx_file(mut self, dir: PathBuf, file_stem: impl Into<String>) -> Self {
        self.influx_file = Some(InfluxFileConfig {
            dir,
            file_stem: file_stem.into(),
        });
        self
    }

    /// Also send records to a collector of your own.
    pub fn add_collector(mut self, collector: Box<dyn ReportCollector + Send>) -> Self {
        self.custom.push(collector);
        self
    }

    /// Create the collectors. Background writers are spawned onto `runtime` and stop when the
    /// shutdown signal fires.
    pub fn init(self, runtime: &Handle, shutdown_handle: &ShutdownHandle) -> anyhow::Result<Reporter> {
        let mut collectors: Vec<Mutex<Box<dyn ReportCollector + Send>>> =
            self.custom.into_iter().map(Mutex::new).collect();

        if self.enable_in_memory {
            collectors.push(Mutex::new(Box::new(InMemoryReporter::new())));
        }

        if let Some(InfluxFileConfig { dir, file_stem }) = self.influx_file {
            collectors.push(Mutex::new(Box::new(InfluxFileReportCollector::new(
                runtime,
                shutdown_handle.new_listener(),
                dir,
                file_stem,
            )?)));
        }

        if collectors.is_empty() {
            log::info!("No reporters enabled, results will not be recorded");
        }

        Ok(Reporter { collectors })
    }
}

/// Fans records out to every configured [ReportCollector].
///
/// Shared between all virtual users, each collector sits behind its own lock.
pub struct Reporter {
    collectors: Vec<Mutex<Box<dyn ReportCollector + Send>>>,
}

impl Reporter {
    pub fn add_operation(&self, operation_record: &OperationRecord) {
        for collector in &self.collectors {
            collector.lock().add_operation(operation_record);
        }
    }

    pub fn add_check(&self, vu_id: &str, check: &CheckResult) {
        for collector in &self.collectors {
            collector.lock().add_check(vu_id, check);
        }
    }

    pub fn finalize(&self) {
        for collector in &self.collectors {
            collector.lock().finalize();
        }
    }
}

impl Debug for Reporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.len())
            .finish()
    }
}
