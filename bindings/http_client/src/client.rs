use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use loadcheck_instruments::prelude::{report_operation, OperationRecord, Reporter};
use url::Url;

use crate::response::HttpResponse;

/// Operation id reported for every GET request.
pub const HTTP_GET_OPERATION: &str = "http_get";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A [reqwest::Client] that reports the timing and outcome of every request.
///
/// Cheap to clone, clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    reporter: Arc<Reporter>,
}

impl HttpClient {
    pub fn new(reporter: Arc<Reporter>, timeout: Duration) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner, reporter })
    }

    /// Send a GET request and read the whole body.
    ///
    /// Any status code is a successful response here, only transport failures such as a refused
    /// connection or a timeout are errors.
    pub async fn get(&self, url: Url) -> anyhow::Result<HttpResponse> {
        let mut operation_record = OperationRecord::new(HTTP_GET_OPERATION);
        operation_record.add_attr("url_path", url.path());

        let started = Instant::now();
        let result = self.send_get(url).await;
        let elapsed = started.elapsed();

        let result = result.map(|(status_code, body)| HttpResponse {
            status_code,
            elapsed,
            body,
        });

        match &result {
            Ok(response) => {
                operation_record.add_attr("status", response.status_code);
            }
            Err(e) => {
                log::trace!("GET request failed: {e:?}");
            }
        }
        operation_record.elapsed = Some(elapsed);
        report_operation(self.reporter.clone(), operation_record, &result);

        result
    }

    async fn send_get(&self, url: Url) -> anyhow::Result<(u16, bytes::Bytes)> {
        let response = self
            .inner
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status_code = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of GET {url}"))?;

        Ok((status_code, body))
    }
}
