use std::fmt::{Debug, Formatter};
use std::time::Duration;

use http_client_instrumented::prelude::HttpResponse;
use loadcheck_runner::prelude::CheckResult;

type Predicate = Box<dyn Fn(&HttpResponse) -> bool + Send + Sync>;

/// A named assertion against a response.
pub struct ResponseCheck {
    name: String,
    predicate: Predicate,
}

impl ResponseCheck {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Passes when the status code is exactly `code`. Named `status is <code>`.
    pub fn status_is(code: u16) -> Self {
        Self::new(format!("status is {code}"), move |r| r.status_code == code)
    }

    /// Passes when the response took strictly less than `limit`. Named `response time < <limit>ms`.
    pub fn response_time_under(limit: Duration) -> Self {
        Self::new(
            format!("response time < {}ms", limit.as_millis()),
            move |r| r.elapsed < limit,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check(&self, response: &HttpResponse) -> CheckResult {
        CheckResult::new(self.name.clone(), (self.predicate)(response))
    }
}

impl Debug for ResponseCheck {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One result per check, in order.
///
/// Without a response there is nothing to pass, so a failed request fails every check.
pub fn evaluate_checks(
    checks: &[ResponseCheck],
    response: &anyhow::Result<HttpResponse>,
) -> Vec<CheckResult> {
    match response {
        Ok(response) => checks.iter().map(|c| c.check(response)).collect(),
        Err(_) => checks
            .iter()
            .map(|c| CheckResult::fail(c.name.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks() -> Vec<ResponseCheck> {
        vec![
            ResponseCheck::status_is(200),
            ResponseCheck::response_time_under(Duration::from_millis(300)),
        ]
    }

    fn response(status_code: u16, elapsed_ms: u64) -> anyhow::Result<HttpResponse> {
        Ok(HttpResponse::new(status_code, Duration::from_millis(elapsed_ms)))
    }

    #[test]
    fn check_names() {
        let names = checks().iter().map(|c| c.name().to_string()).collect::<Vec<_>>();
        assert_eq!(vec!["status is 200", "response time < 300ms"], names);
    }

    #[test]
    fn fast_ok_passes_both() {
        assert_eq!(
            vec![
                CheckResult::pass("status is 200"),
                CheckResult::pass("response time < 300ms"),
            ],
            evaluate_checks(&checks(), &response(200, 50))
        );
    }

    #[test]
    fn fast_server_error_fails_status_only() {
        assert_eq!(
            vec![
                CheckResult::fail("status is 200"),
                CheckResult::pass("response time < 300ms"),
            ],
            evaluate_checks(&checks(), &response(500, 50))
        );
    }

    #[test]
    fn slow_ok_fails_response_time_only() {
        assert_eq!(
            vec![
                CheckResult::pass("status is 200"),
                CheckResult::fail("response time < 300ms"),
            ],
            evaluate_checks(&checks(), &response(200, 400))
        );
    }

    #[test]
    fn limit_is_exclusive() {
        assert_eq!(
            vec![
                CheckResult::pass("status is 200"),
                CheckResult::fail("response time < 300ms"),
            ],
            evaluate_checks(&checks(), &response(200, 300))
        );
    }

    #[test]
    fn failed_request_fails_every_check() {
        let failed: anyhow::Result<HttpResponse> = Err(anyhow::anyhow!("connection refused"));
        assert_eq!(
            vec![
                CheckResult::fail("status is 200"),
                CheckResult::fail("response time < 300ms"),
            ],
            evaluate_checks(&checks(), &failed)
        );
    }

    #[test]
    fn custom_check_on_body() {
        let check = ResponseCheck::new("has team", |r| r.body.starts_with(b"{\"team\""));
        let response = HttpResponse::new(200, Duration::from_millis(1)).with_body(r#"{"team":{}}"#);
        assert!(check.check(&response).passed);
    }
}
