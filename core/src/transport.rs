//! Blocking HTTP execution.
//!
//! # Design
//! `Transport` is the seam between request classification and the network.
//! Implementations must return every HTTP status as data; only failures that
//! prevent a response from being read at all are `TransportError`s.
//!
//! `UreqTransport` owns a single `ureq::Agent`. The agent keeps a keep-alive
//! pool and opens its first connection lazily, so a client talks to its base
//! URL over one persistent connection for its whole lifetime.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Largest response body read into memory. Loan documents are rendered PDFs
/// and can exceed ureq's 10 MiB default.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// A failure below HTTP: DNS, connect, TLS, timeout or a broken body read.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes `HttpRequest`s synchronously.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build a transport. `timeout` bounds the whole call; `None` leaves the
    /// agent's defaults in place.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let body = request.body.as_deref().unwrap_or_default().as_bytes();
        let url = &request.url;

        // The API reads JSON parameters from GET bodies too (e.g. order filters).
        let sent = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers)
                .force_send_body()
                .send(body),
            HttpMethod::Post => with_headers(self.agent.post(url), &request.headers).send(body),
            HttpMethod::Put => with_headers(self.agent.put(url), &request.headers).send(body),
            HttpMethod::Patch => with_headers(self.agent.patch(url), &request.headers).send(body),
        };
        let mut response = sent.map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |builder, (name, value)| builder.header(name.as_str(), value.as_str()))
}
