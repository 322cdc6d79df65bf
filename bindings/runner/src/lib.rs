mod checks;
mod common;
mod context;

pub mod prelude {
    /// Common operations for HTTP scenarios.
    ///
    /// This is a good place to start if you are getting started writing scenarios.
    pub use crate::common::*;

    pub use crate::checks::{evaluate_checks, ResponseCheck};
    pub use crate::context::{HttpRunnerContext, HttpVuContext};

    /// Re-export of the `loadcheck_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use loadcheck_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use http_client_instrumented::prelude::*;
}
