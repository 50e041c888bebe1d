//! Configuration structures for Carvoyant clients.
//!
//! A configuration carries the API base URL, one of two credential modes and
//! a few transport settings. The credential mode is resolved once into an
//! [`AuthStrategy`], which also decides the default base URL and whether
//! request paths need a trailing slash.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::warn;
use url::Url;
use validator::Validate;

/// Base URL for OAuth (bearer token) clients.
pub const DEFAULT_API_URL: &str = "https://api.carvoyant.com/v1/api";

/// Base URL for clients still using an API key and security token.
pub const LEGACY_API_URL: &str = "https://dash.carvoyant.com/api";

const MISSING_CREDENTIALS: &str =
    "accessToken or both apiKey and securityToken are required.";

/// Configuration for a Carvoyant client instance.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CarvoyantConfig {
    /// API base URL; defaults depend on the credential mode
    #[validate(url)]
    #[serde(default)]
    pub api_url: Option<String>,

    /// OAuth access token (bearer mode)
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub access_token: Option<SecretString>,

    /// API key (basic mode user name)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Security token (basic mode password)
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub security_token: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl CarvoyantConfig {
    /// Create a configuration without credentials.
    ///
    /// One of [`with_access_token`](Self::with_access_token) or
    /// [`with_basic_credentials`](Self::with_basic_credentials) must be applied
    /// before a client can be built.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            api_url: None,
            access_token: None,
            api_key: None,
            security_token: None,
            tls_verify: default_tls_verify(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Create a bearer-mode configuration.
    #[must_use]
    pub fn new_bearer(access_token: impl Into<String>) -> Self {
        Self::new().with_access_token(access_token)
    }

    /// Create a basic-mode configuration.
    #[must_use]
    pub fn new_basic(api_key: impl Into<String>, security_token: impl Into<String>) -> Self {
        Self::new().with_basic_credentials(api_key, security_token)
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Set the OAuth access token.
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(access_token.into()));
        self
    }

    /// Set the API key and security token.
    #[must_use]
    pub fn with_basic_credentials(
        mut self,
        api_key: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.security_token = Some(SecretString::from(security_token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the credential mode.
    ///
    /// Bearer mode wins when both modes are configured. Empty strings count as
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when neither mode is complete.
    pub fn auth_strategy(&self) -> Result<AuthStrategy, Error> {
        let access_token = self
            .access_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty());
        let api_key = self.api_key.as_deref().filter(|key| !key.is_empty());
        let security_token = self
            .security_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty());

        match (access_token, api_key, security_token) {
            (Some(token), key, secret) => {
                if key.is_some() || secret.is_some() {
                    warn!("both access token and API key credentials configured; using the access token");
                }
                Ok(AuthStrategy::Bearer(token.clone()))
            }
            (None, Some(api_key), Some(security_token)) => Ok(AuthStrategy::Basic {
                api_key: api_key.to_string(),
                security_token: security_token.clone(),
            }),
            _ => Err(Error::ConfigError(MISSING_CREDENTIALS.to_string())),
        }
    }

    /// Parse the base URL, falling back to the default for `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the URL cannot be parsed.
    pub fn parse_api_url(&self, strategy: &AuthStrategy) -> Result<Url, Error> {
        let raw = self
            .api_url
            .as_deref()
            .unwrap_or_else(|| strategy.default_api_url());

        Url::parse(raw).map_err(|e| Error::ConfigError(format!("Invalid API URL: {e}")))
    }

    /// Validate field ranges and resolve credentials in one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<AuthStrategy, Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        self.auth_strategy()
    }
}

impl Default for CarvoyantConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How requests are authenticated. Fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// `Authorization: Bearer <token>`
    Bearer(SecretString),
    /// HTTP Basic with the API key as user and the security token as password
    Basic {
        /// API key
        api_key: String,
        /// Security token
        security_token: SecretString,
    },
}

impl AuthStrategy {
    /// Base URL used when none is configured.
    #[must_use]
    pub const fn default_api_url(&self) -> &'static str {
        match self {
            Self::Bearer(_) => DEFAULT_API_URL,
            Self::Basic { .. } => LEGACY_API_URL,
        }
    }

    /// Bearer-mode endpoints answer `596 Service Not Found` unless the path ends in `/`.
    #[must_use]
    pub const fn requires_trailing_slash(&self) -> bool {
        matches!(self, Self::Bearer(_))
    }

    /// Short name for log output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::Basic { .. } => "basic",
        }
    }

    /// Value of the `Authorization` header in bearer mode.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            Self::Bearer(token) => Some(format!("Bearer {}", token.expose_secret())),
            Self::Basic { .. } => None,
        }
    }

    /// User and password in basic mode.
    #[must_use]
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match self {
            Self::Bearer(_) => None,
            Self::Basic {
                api_key,
                security_token,
            } => Some((api_key.as_str(), security_token.expose_secret())),
        }
    }
}
