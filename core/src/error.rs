//! Error types for the loans API client.
//!
//! # Design
//! Only conditions that must interrupt a call chain live here. Business
//! failures (validation errors, unexpected non-JSON error pages) are data and
//! are returned as `Outcome::Failure` instead.

use thiserror::Error;

use crate::transport::TransportError;

/// Fatal conditions raised by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered 401: the session token is missing, stale or
    /// invalid. The caller has to authenticate again.
    #[error("invalid access token")]
    InvalidAccessToken,

    /// The request never produced a usable HTTP response (timeout, refused
    /// connection, TLS failure) or a 2xx body did not match the endpoint's
    /// schema.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        ApiError::UnexpectedResponse(error.to_string())
    }
}

/// Errors raised while assembling a `ClientConfig` from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}
