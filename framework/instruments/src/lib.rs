mod check;
mod operation;
mod report;

pub mod prelude {
    pub use crate::check::CheckResult;
    pub use crate::operation::{report_operation, OperationRecord};
    pub use crate::report::{
        CheckRow, InMemoryReporter, OperationRow, ReportCollector, ReportConfig, Reporter,
    };
}
