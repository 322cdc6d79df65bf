use std::time::Duration;

use bytes::Bytes;

/// A fully read response and how long it took to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    /// From sending the request until the last byte of the body was read.
    pub elapsed: Duration,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status_code: u16, elapsed: Duration) -> Self {
        Self {
            status_code,
            elapsed,
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}
