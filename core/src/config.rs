//! Client configuration.
//!
//! Settings can be assembled in code with the `with_*` methods or read from
//! the environment with `ClientConfig::from_env`:
//!
//! | variable                        | required | meaning                                  |
//! |---------------------------------|----------|------------------------------------------|
//! | `LOANS_API_BASE_URL`            | yes      | API root, endpoints are joined with `/`  |
//! | `LOANS_API_LOGIN`               | no       | agent login for `create_session`         |
//! | `LOANS_API_PASSWORD`            | no       | agent password for `create_session`      |
//! | `LOANS_API_APPLICATION_SOURCE`  | no       | `Application-Source` header value        |
//! | `LOANS_API_TIMEOUT_SECS`        | no       | overall per-call timeout in seconds      |

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "LOANS_API_BASE_URL";
pub const LOGIN_VAR: &str = "LOANS_API_LOGIN";
pub const PASSWORD_VAR: &str = "LOANS_API_PASSWORD";
pub const APPLICATION_SOURCE_VAR: &str = "LOANS_API_APPLICATION_SOURCE";
pub const TIMEOUT_VAR: &str = "LOANS_API_TIMEOUT_SECS";

/// Connection and identity settings for a `LoansClient`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    login: Option<String>,
    password: Option<String>,
    application_source: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// The base URL is used verbatim; a trailing slash is not stripped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login: None,
            password: None,
            application_source: None,
            timeout: None,
        }
    }

    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_application_source(mut self, source: impl Into<String>) -> Self {
        self.application_source = Some(source.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = read(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let timeout = match read(TIMEOUT_VAR) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            base_url,
            login: read(LOGIN_VAR),
            password: read(PASSWORD_VAR),
            application_source: read(APPLICATION_SOURCE_VAR),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn application_source(&self) -> Option<&str> {
        self.application_source.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("application_source", &self.application_source)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_all_settings() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "https://api.example.test/api/loans/v1"),
            (LOGIN_VAR, "some-agent"),
            (PASSWORD_VAR, "p@$$w0rd"),
            (APPLICATION_SOURCE_VAR, "pos"),
            (TIMEOUT_VAR, "15"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "https://api.example.test/api/loans/v1");
        assert_eq!(config.login(), Some("some-agent"));
        assert_eq!(config.password(), Some("p@$$w0rd"));
        assert_eq!(config.application_source(), Some("pos"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn base_url_is_required() {
        let err = ClientConfig::from_lookup(lookup(&[(LOGIN_VAR, "agent")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(BASE_URL_VAR));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "http://localhost"),
            (APPLICATION_SOURCE_VAR, "  "),
        ]))
        .unwrap();
        assert!(config.application_source().is_none());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn timeout_must_be_whole_seconds() {
        let err = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "http://localhost"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: TIMEOUT_VAR, .. }));
    }

    #[test]
    fn debug_hides_password() {
        let config = ClientConfig::new("http://localhost").with_credentials("agent", "hunter2");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("agent"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn trailing_slash_is_kept() {
        assert_eq!(ClientConfig::new("http://localhost/").base_url(), "http://localhost/");
    }
}
