//! The two-branch result every client operation returns.
//!
//! # Design
//! `Outcome` is fully determined by the HTTP status class and content type of
//! the response: 2xx is `Success`, anything else (except 401, which is an
//! `ApiError`) is `Failure`. Business failures are values the caller inspects,
//! never errors it has to catch.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Outcome of a single API operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(failure) => Some(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Like `map`, for transformations that can hit a fatal condition.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U, ApiError>) -> Result<Outcome<U>, ApiError> {
        match self {
            Outcome::Success(value) => f(value).map(Outcome::Success),
            Outcome::Failure(failure) => Ok(Outcome::Failure(failure)),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

/// A recoverable, non-2xx answer from the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The server rejected the request with a JSON body, usually
    /// `{"errors": {"field": ["message", ...]}}`. `body` is `None` when the
    /// JSON response was empty or could not be decoded.
    Rejected { status: u16, body: Option<Value> },

    /// A non-2xx answer that was not JSON (an HTML error page, a proxy
    /// message). The body is not trusted as structured error data.
    UnexpectedResponse { status: u16 },

    /// The loan request was accepted but its quoted terms could not be
    /// fetched afterwards.
    TermsUnavailable,
}

impl Failure {
    /// HTTP status of the failed response, where one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Rejected { status, .. } | Failure::UnexpectedResponse { status } => Some(*status),
            Failure::TermsUnavailable => None,
        }
    }

    /// Field-level messages from an `{"errors": {...}}` body.
    ///
    /// Non-string messages are rendered as JSON text; a bare string value is
    /// treated as a one-element list. Synthetic failures report their marker
    /// under `base`.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let body = self.to_error_body();
        let Some(errors) = body.get("errors").and_then(Value::as_object) else {
            return BTreeMap::new();
        };

        errors
            .iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    Value::Array(items) => items.iter().map(message_text).collect(),
                    other => vec![message_text(other)],
                };
                (field.clone(), messages)
            })
            .collect()
    }

    /// The error envelope as JSON, with markers for the synthetic failures:
    /// `{"errors": {"base": ["unexpected_response"]}}` and
    /// `{"errors": {"base": ["cant_fetch_loan_request_terms"]}}`.
    pub fn to_error_body(&self) -> Value {
        match self {
            Failure::Rejected { body, .. } => body.clone().unwrap_or(Value::Null),
            Failure::UnexpectedResponse { .. } => json!({ "errors": { "base": ["unexpected_response"] } }),
            Failure::TermsUnavailable => {
                json!({ "errors": { "base": ["cant_fetch_loan_request_terms"] } })
            }
        }
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The response had no body.
    Empty,
    /// The body decoded as JSON.
    Json(Value),
    /// The body was not JSON (documents, plain text).
    Raw(Vec<u8>),
}

impl Payload {
    /// Decode into an endpoint's response shape. An empty body decodes as
    /// JSON `null`; a raw body never decodes.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let value = match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value,
            Payload::Raw(_) => {
                return Err(ApiError::UnexpectedResponse(
                    "expected a JSON body, got raw content".to_string(),
                ))
            }
        };
        serde_json::from_value(value).map_err(|e| ApiError::UnexpectedResponse(e.to_string()))
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Empty | Payload::Raw(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Raw(bytes) => bytes,
            Payload::Empty | Payload::Json(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}
