use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use influxdb::{InfluxDbWriteable, Query, Timestamp, WriteQuery};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use loadcheck_core::prelude::DelegatedShutdownListener;

use crate::check::CheckResult;
use crate::operation::OperationRecord;
use crate::report::ReportCollector;

pub(crate) const OPERATION_MEASUREMENT: &str = "loadcheck.instruments.operation_duration";
pub(crate) const CHECK_MEASUREMENT: &str = "loadcheck.instruments.check";

/// Write records to disk in the InfluxDB line protocol format, for Telegraf or `influx write` to
/// pick up after the run.
pub(crate) struct InfluxFileReportCollector {
    join_handle: JoinHandle<()>,
    writer: UnboundedSender<WriteQuery>,
    flush_complete: Arc<AtomicBool>,
}

impl InfluxFileReportCollector {
    pub(crate) fn new(
        runtime: &Handle,
        shutdown_listener: DelegatedShutdownListener,
        dir: PathBuf,
        file_stem: String,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create influx output directory {}", dir.display()))?;

        let path = dir.join(format!("{file_stem}.influx"));
        let file = std::fs::File::options()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to create influx output file {}", path.display()))?;
        log::info!("Writing metrics to {}", path.display());

        let flush_complete = Arc::new(AtomicBool::new(false));
        let (join_handle, writer) = start_metrics_file_write_task(
            runtime,
            shutdown_listener,
            File::from_std(file),
            flush_complete.clone(),
        );

        Ok(Self {
            join_handle,
            writer,
            flush_complete,
        })
    }

    fn try_send(&self, query: WriteQuery) {
        if let Err(e) = self.writer.send(query) {
            if self.flush_complete.load(Ordering::Relaxed) {
                log::info!("Failed to record metric because the write task has finished: {e}");
            } else {
                log::warn!("Failed to record metric: {e}");
            }
        }
    }
}

impl ReportCollector for InfluxFileReportCollector {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        let Some(elapsed) = operation_record.duration() else {
            log::warn!(
                "Dropping operation {} without an elapsed time",
                operation_record.operation_id
            );
            return;
        };

        let mut query = now_timestamp()
            .into_query(OPERATION_MEASUREMENT)
            .add_field("value", elapsed.as_micros() as f64 / 1000.0)
            .add_tag("operation_id", operation_record.operation_id.clone())
            .add_tag("is_error", operation_record.is_error.to_string());

        for (k, v) in &operation_record.attr {
            query = query.add_tag(k, v.clone());
        }

        self.try_send(query);
    }

    fn add_check(&mut self, vu_id: &str, check: &CheckResult) {
        let query = now_timestamp()
            .into_query(CHECK_MEASUREMENT)
            .add_field("passed", check.passed)
            .add_tag("name", check.name.clone())
            .add_tag("vu_id", vu_id.to_string());

        self.try_send(query);
    }

    fn finalize(&self) {
        let wait_started = std::time::Instant::now();
        let mut notify_timer = std::time::Instant::now();
        while !self.flush_complete.load(Ordering::Relaxed) {
            if notify_timer.elapsed().as_secs() > 10 {
                log::warn!(
                    "Still waiting for metrics to flush after {} seconds.",
                    wait_started.elapsed().as_secs()
                );
                notify_timer = std::time::Instant::now();
            }

            // No point waiting on a write task that has already exited.
            if self.join_handle.is_finished() {
                break;
            }

            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        log::debug!(
            "Metrics flushed after {} seconds",
            wait_started.elapsed().as_secs()
        );
    }
}

fn now_timestamp() -> Timestamp {
    Timestamp::Nanoseconds(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
    )
}

fn start_metrics_file_write_task(
    runtime: &Handle,
    mut shutdown_listener: DelegatedShutdownListener,
    file: File,
    flush_complete: Arc<AtomicBool>,
) -> (JoinHandle<()>, UnboundedSender<WriteQuery>) {
    let (writer, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let join_handle = runtime.spawn(async move {
        let mut file = BufWriter::new(file);

        loop {
            select! {
                _ = shutdown_listener.wait_for_shutdown() => {
                    log::debug!("Shutting down influx file reporter");
                    break;
                }
                query = receiver.recv() => {
                    match query {
                        Some(query) => {
                            if let Err(e) = write_query(&mut file, query).await {
                                log::warn!("Failed to write metric: {e:?}");
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        log::debug!("Draining any remaining metrics before shutting down...");
        let mut drain_count = 0;

        while let Ok(query) = receiver.try_recv() {
            if let Err(e) = write_query(&mut file, query).await {
                log::warn!("Failed to write metric: {e:?}");
            }
            drain_count += 1;

            if drain_count % 1000 == 0 {
                log::debug!("Drained {drain_count} remaining metrics");
            }
        }

        if let Err(e) = file.flush().await {
            log::error!("Failed to flush metrics file: {e:?}");
        }

        log::debug!("Drained {drain_count} remaining metrics");

        flush_complete.store(true, Ordering::Relaxed);
    });

    (join_handle, writer)
}

#[inline]
async fn write_query<W>(writer: &mut W, query: WriteQuery) -> anyhow::Result<()>
where
    W: AsyncWriteExt + Unpin + Debug,
{
    let query_str = query.build()?.get();
    writer.write_all(query_str.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use loadcheck_core::prelude::ShutdownHandle;
    use tokio::runtime::Runtime;

    use super::*;

    #[test]
    fn writes_operations_and_checks_as_line_protocol() {
        let runtime = Runtime::new().unwrap();
        let shutdown_handle = ShutdownHandle::new();
        let dir = tempfile::tempdir().unwrap();

        let mut collector = InfluxFileReportCollector::new(
            runtime.handle(),
            shutdown_handle.new_listener(),
            dir.path().to_path_buf(),
            "team_get-test".to_string(),
        )
        .unwrap();

        let mut record = OperationRecord::completed("http_get", Duration::from_millis(12), false);
        record.add_attr("status", 200);
        collector.add_operation(&record);
        collector.add_check("vu-3", &CheckResult::fail("status is 200"));

        shutdown_handle.shutdown();
        collector.finalize();

        let content = std::fs::read_to_string(dir.path().join("team_get-test.influx")).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(2, lines.len());
        assert!(lines[0].starts_with(OPERATION_MEASUREMENT));
        assert!(lines[0].contains("operation_id=http_get"));
        assert!(lines[0].contains("status=200"));
        assert!(lines[0].contains("value=12"));
        assert!(lines[1].starts_with(CHECK_MEASUREMENT));
        assert!(lines[1].contains("vu_id=vu-3"));
        assert!(lines[1].contains("passed=false"));
    }

    #[test]
    fn refuses_to_overwrite_existing_output() {
        let runtime = Runtime::new().unwrap();
        let shutdown_handle = ShutdownHandle::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.influx"), "").unwrap();

        let result = InfluxFileReportCollector::new(
            runtime.handle(),
            shutdown_handle.new_listener(),
            dir.path().to_path_buf(),
            "run".to_string(),
        );
        assert!(result.is_err());
    }
}
