//! Session state threaded explicitly through client calls.
//!
//! # Design
//! The client itself holds no mutable cursor. `create_session` returns a
//! `Session`, loan-request creation returns a `LoanRequestToken`, and the
//! caller passes both back into the operations that need them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication state for a sequence of calls.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// A session without a token. Requests carry no `Authorization` header.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resume a session from a token obtained earlier.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Identifies a loan request on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanRequestToken(String);

impl LoanRequestToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoanRequestToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl fmt::Display for LoanRequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
