//! The HTTP boundary between [`CarvoyantClient`](crate::CarvoyantClient) and the network.

use async_trait::async_trait;
use carvoyant_core::client::HttpConfig;
use carvoyant_core::types::HttpMethod;
use carvoyant_core::Error;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

use crate::models::{ApiResponse, RequestInfo};
use crate::Result;

const USER_AGENT: &str = concat!("carvoyant-api/", env!("CARGO_PKG_VERSION"));

/// A fully built request, ready to send.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: Url,
    /// Extra headers, in order.
    pub headers: Vec<(String, String)>,
    /// HTTP Basic user and password.
    pub basic_auth: Option<(String, String)>,
    /// Query-string pairs.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request with no headers, query or body.
    #[must_use]
    pub const fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            basic_auth: None,
            query: Vec::new(),
            body: None,
        }
    }

    /// Value of the first header called `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first query pair called `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("authorization") {
                    (key.as_str(), "[REDACTED]")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field(
                "basic_auth",
                &self.basic_auth.as_ref().map(|(user, _)| (user, "[REDACTED]")),
            )
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}

/// Sends built requests and turns replies into [`ApiResponse`]s.
///
/// Any status the server answers with is a successful send; only failures to
/// reach the server are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request.
    async fn send(&self, request: HttpRequest) -> Result<ApiResponse>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    log_responses: bool,
}

impl ReqwestTransport {
    /// Build the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be constructed.
    pub fn new(http_config: &HttpConfig, tls_verify: bool) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(http_config.timeout)
            .pool_idle_timeout(http_config.pool_idle_timeout)
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .connect_timeout(http_config.connect_timeout)
            .gzip(http_config.enable_compression);

        if !tls_verify {
            warn!("TLS verification disabled for Carvoyant client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Carvoyant HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            log_responses: http_config.enable_logging,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<ApiResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            basic_auth,
            query,
            body,
        } = request;

        let mut builder = self.http.request(method.into(), url);

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some((user, password)) = &basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }

        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let path = response.url().path().to_string();
        let text = response.text().await?;

        if self.log_responses {
            debug!(status, path = %path, bytes = text.len(), "Received Carvoyant response");
        }

        Ok(ApiResponse::from_text(
            status,
            &text,
            RequestInfo::new(method, path),
        ))
    }
}
