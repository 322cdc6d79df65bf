use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::report::Reporter;

/// Timing and outcome of a single operation, such as one HTTP request.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: String,
    pub attr: HashMap<String, String>,
    started: Instant,
    pub elapsed: Option<Duration>,
    pub is_error: bool,
}

impl OperationRecord {
    /// Start timing an operation now.
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            attr: HashMap::new(),
            started: Instant::now(),
            elapsed: None,
            is_error: false,
        }
    }

    /// A record for an operation that was timed by the caller.
    pub fn completed(operation_id: impl Into<String>, elapsed: Duration, is_error: bool) -> Self {
        let mut record = Self::new(operation_id);
        record.elapsed = Some(elapsed);
        record.is_error = is_error;
        record
    }

    pub fn add_attr(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attr.insert(key.into(), value.to_string());
    }

    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Stop the clock, keeping any elapsed time that was already set.
    pub(crate) fn finish(&mut self, is_error: bool) {
        if self.elapsed.is_none() {
            self.elapsed = Some(self.started.elapsed());
        }
        self.is_error = is_error;
    }
}

/// Finish the record based on the response and hand it to the reporter.
pub fn report_operation<T, E>(
    reporter: Arc<Reporter>,
    mut operation_record: OperationRecord,
    response: &Result<T, E>,
) {
    operation_record.finish(response.is_err());
    log::trace!(
        "Operation {} took {:?}, error: {}",
        operation_record.operation_id,
        operation_record.elapsed,
        operation_record.is_error
    );
    reporter.add_operation(&operation_record);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_keeps_caller_timing() {
        let mut record = OperationRecord::completed("http_get", Duration::from_millis(42), false);
        record.finish(true);
        assert_eq!(Some(Duration::from_millis(42)), record.duration());
        assert!(record.is_error);
    }

    #[test]
    fn finish_measures_when_untimed() {
        let mut record = OperationRecord::new("http_get");
        assert!(record.duration().is_none());
        record.finish(false);
        assert!(record.duration().is_some());
    }
}
