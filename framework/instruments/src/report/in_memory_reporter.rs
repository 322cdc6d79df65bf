mod checks_table;
mod operations_table;

use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::check::CheckResult;
use crate::operation::OperationRecord;
use crate::report::ReportCollector;

pub use checks_table::CheckRow;
pub use operations_table::OperationRow;

/// Keeps every operation and check in memory and prints summary tables at the end of the run.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    operation_records: Vec<OperationRecord>,
    check_results: Vec<CheckResult>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// One row per operation id, sorted by id.
    pub fn operation_rows(&self) -> Vec<OperationRow> {
        let mut grouped: BTreeMap<&str, Vec<&OperationRecord>> = BTreeMap::new();
        for record in &self.operation_records {
            grouped
                .entry(record.operation_id.as_str())
                .or_default()
                .push(record);
        }

        grouped
            .into_iter()
            .map(|(operation_id, operations)| {
                let total_operations = operations.len();
                let total_errors = operations.iter().filter(|op| op.is_error).count();

                let mut successful = operations
                    .iter()
                    .filter(|op| !op.is_error)
                    .filter_map(|op| op.duration())
                    .collect::<Vec<_>>();
                successful.sort();

                let total_duration_ms = operations
                    .iter()
                    .filter_map(|op| op.duration())
                    .map(as_millis_f64)
                    .sum::<f64>();

                OperationRow {
                    operation_id: operation_id.to_string(),
                    total_operations,
                    total_errors,
                    avg_time_ms: total_duration_ms / total_operations as f64,
                    min_time_ms: successful.first().copied().map(as_millis_f64).unwrap_or(0.0),
                    max_time_ms: successful.last().copied().map(as_millis_f64).unwrap_or(0.0),
                    p90_time_ms: percentile(&successful, 90.0).map(as_millis_f64).unwrap_or(0.0),
                    p95_time_ms: percentile(&successful, 95.0).map(as_millis_f64).unwrap_or(0.0),
                }
            })
            .collect()
    }

    /// One row per check name, sorted by name.
    pub fn check_rows(&self) -> Vec<CheckRow> {
        let mut grouped: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for check in &self.check_results {
            let (passes, fails) = grouped.entry(check.name.as_str()).or_default();
            if check.passed {
                *passes += 1;
            } else {
                *fails += 1;
            }
        }

        grouped
            .into_iter()
            .map(|(name, (passes, fails))| CheckRow {
                name: name.to_string(),
                passes,
                fails,
                pass_rate: 100.0 * passes as f64 / (passes + fails) as f64,
            })
            .collect()
    }

    fn print_summary(&self) {
        println!("\nSummary of operations");
        let mut table = Table::new(self.operation_rows());
        table.with(Style::modern());
        println!("{table}");

        println!("\nSummary of checks");
        let mut table = Table::new(self.check_rows());
        table.with(Style::modern());
        println!("{table}");
    }
}

impl ReportCollector for InMemoryReporter {
    fn add_operation(&mut self, operation_record: &OperationRecord) {
        self.operation_records.push(operation_record.clone());
    }

    fn add_check(&mut self, _vu_id: &str, check: &CheckResult) {
        self.check_results.push(check.clone());
    }

    fn finalize(&self) {
        self.print_summary();
    }
}

fn as_millis_f64(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

/// Nearest-rank percentile over already sorted values.
fn percentile(sorted: &[Duration], p: f64) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }

    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.clamp(1, sorted.len()) - 1).copied()
}
