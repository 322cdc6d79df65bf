use http_client_instrumented::prelude::HttpClient;
use loadcheck_runner::prelude::UserValuesConstraint;
use url::Url;

#[derive(Default, Debug)]
pub struct HttpRunnerContext {
    /// Parsed form of the runner's target URL, set by [crate::common::configure_target].
    pub base_url: Option<Url>,
}

impl UserValuesConstraint for HttpRunnerContext {}

#[derive(Default, Debug)]
pub struct HttpVuContext {
    /// Set by [crate::common::configure_client].
    pub client: Option<HttpClient>,
}

impl UserValuesConstraint for HttpVuContext {}
