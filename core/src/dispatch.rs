//! Request dispatcher: header composition, JSON encoding and response
//! classification shared by every client operation.
//!
//! # Design
//! `build_request` and `classify` are pure functions over the plain
//! `HttpRequest` / `HttpResponse` values; `Dispatcher::dispatch` only glues
//! them to a `Transport`. The classification table:
//!
//! | response                          | result                                  |
//! |-----------------------------------|-----------------------------------------|
//! | 2xx, empty body                   | `Success(Payload::Empty)`               |
//! | 2xx, JSON body                    | `Success(Payload::Json)`                |
//! | 2xx, other body                   | `Success(Payload::Raw)`                 |
//! | 401                               | `Err(ApiError::InvalidAccessToken)`     |
//! | other non-2xx, `application/json` | `Failure(Failure::Rejected)`            |
//! | other non-2xx, other content type | `Failure(Failure::UnexpectedResponse)`  |
//! | transport failure                 | `Err(ApiError::UnexpectedResponse)`     |

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::outcome::{Failure, Outcome, Payload};
use crate::session::Session;
use crate::transport::Transport;

pub const API_CONTENT_TYPE: &str = "application/json";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const APPLICATION_SOURCE_HEADER: &str = "Application-Source";

const UNAUTHORIZED: u16 = 401;

/// Serializes to `{}`; the body sent when an operation has no parameters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyBody {}

/// Join the base URL and an endpoint with a single `/`. Neither side is
/// normalized, so a trailing slash on the base URL yields `//`.
pub fn url_for(base_url: &str, endpoint: &str) -> String {
    format!("{base_url}/{endpoint}")
}

/// Compose request headers.
///
/// `Content-Type` and `Authorization` (from the session token) come first;
/// `overrides` replace headers of the same name, case-insensitively. Any
/// header left without a value is dropped rather than sent empty.
pub fn compose_headers(session: &Session, overrides: &[(&str, Option<&str>)]) -> Vec<(String, String)> {
    let mut headers: Vec<(String, Option<String>)> = vec![
        (CONTENT_TYPE_HEADER.to_string(), Some(API_CONTENT_TYPE.to_string())),
        (AUTHORIZATION_HEADER.to_string(), session.token().map(str::to_string)),
    ];

    for (name, value) in overrides {
        let value = value.map(str::to_string);
        match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value,
            None => headers.push((name.to_string(), value)),
        }
    }

    headers
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect()
}

/// Build a request with a JSON-encoded body.
pub fn build_request<B: Serialize + ?Sized>(
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: &B,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest {
        method,
        url,
        headers,
        body: Some(body),
    })
}

/// Turn an HTTP response into an `Outcome`, or a fatal `ApiError` for 401.
pub fn classify(response: HttpResponse) -> Result<Outcome<Payload>, ApiError> {
    if response.is_success() {
        return Ok(Outcome::Success(parse_payload(response.body)));
    }

    if response.status == UNAUTHORIZED {
        warn!("session token rejected (HTTP 401)");
        return Err(ApiError::InvalidAccessToken);
    }

    let status = response.status;
    let failure = if response.content_type().as_deref() == Some(API_CONTENT_TYPE) {
        let body = match parse_payload(response.body) {
            Payload::Json(value) => Some(value),
            Payload::Empty | Payload::Raw(_) => None,
        };
        Failure::Rejected { status, body }
    } else {
        Failure::UnexpectedResponse { status }
    };
    Ok(Outcome::Failure(failure))
}

/// Decode a body as JSON, falling back to the raw bytes. Whitespace-only
/// bodies count as empty.
fn parse_payload(body: Vec<u8>) -> Payload {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Payload::Empty;
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Raw(body),
    }
}

/// Sends requests against one base URL through one transport.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    base_url: String,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request and classify its response.
    pub fn dispatch<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        method: HttpMethod,
        endpoint: &str,
        body: &B,
        headers: &[(&str, Option<&str>)],
    ) -> Result<Outcome<Payload>, ApiError> {
        let url = url_for(&self.base_url, endpoint);
        let request = build_request(method, url, compose_headers(session, headers), body)?;

        debug!("{} {}", request.method, request.url);
        let response = self.transport.execute(&request).map_err(|e| {
            warn!("{} {} failed: {e}", request.method, request.url);
            ApiError::from(e)
        })?;
        debug!("{} {} -> {}", request.method, request.url, response.status);

        classify(response)
    }
}
