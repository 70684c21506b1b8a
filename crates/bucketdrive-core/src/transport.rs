//! Transport trait: one HTTP round trip at a time.
//!
//! The drive never touches a socket directly; it goes through `Transport`.
//! The trait is dyn-compatible (boxed futures) so tests can substitute a
//! scripted double and count calls.
//!
//! No retries, no caching, no cancellation: each request runs to completion
//! or failure, and timeout policy belongs to the transport, not the drive.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use crate::error::{DriveError, DriveResult};

/// Boxed, Send future — the return type for transport calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP method subset the backend routes use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A single-request HTTP transport returning the parsed JSON body.
pub trait Transport: Send + Sync {
    /// Issue one round trip and return the response body as JSON.
    ///
    /// The body is returned even for non-2xx statuses when it parses as
    /// JSON, since the backend reports failures through the `error` field
    /// of its envelope rather than through status codes alone.
    fn request<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<&'a Value>,
    ) -> BoxFuture<'a, DriveResult<Value>>;
}

/// reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> DriveResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn round_trip(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> DriveResult<Value> {
        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        // The backend reports failures inside a JSON envelope, often with an
        // error status; keep the status error around in case the body turns
        // out not to be JSON at all.
        let status_error = response.error_for_status_ref().err();
        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) => match status_error {
                Some(e) => Err(DriveError::Transport(e)),
                None => Err(DriveError::Malformed(format!(
                    "HTTP {status}: body is not JSON"
                ))),
            },
        }
    }
}

impl Transport for HttpTransport {
    fn request<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<&'a Value>,
    ) -> BoxFuture<'a, DriveResult<Value>> {
        Box::pin(self.round_trip(method, url, body))
    }
}
