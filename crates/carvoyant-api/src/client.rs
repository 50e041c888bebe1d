//! Asynchronous Carvoyant client: request building, dispatch and pagination.

use carvoyant_core::action::{self, NEXT_PAGE_ACTION, PREVIOUS_PAGE_ACTION};
use carvoyant_core::client::HttpConfig;
use carvoyant_core::config::{AuthStrategy, CarvoyantConfig};
use carvoyant_core::params::{ParamKind, ParameterRules, RequestParameters};
use carvoyant_core::types::HttpMethod;
use carvoyant_core::Error;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::models::ApiResponse;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::Result;

/// Receives the outcome of a dispatched request, exactly once.
pub type Callback = Box<dyn FnOnce(Result<ApiResponse>) + Send + 'static>;

/// Builder for [`CarvoyantClient`].
pub struct CarvoyantClientBuilder {
    config: CarvoyantConfig,
    http_config: HttpConfig,
    rules: ParameterRules,
    transport: Option<Arc<dyn Transport>>,
}

impl CarvoyantClientBuilder {
    /// Create a new builder from a [`CarvoyantConfig`].
    #[must_use]
    pub fn new(config: CarvoyantConfig) -> Self {
        Self {
            config,
            http_config: HttpConfig::new(),
            rules: ParameterRules::standard(),
            transport: None,
        }
    }

    /// Override the HTTP client configuration used when building the client.
    #[must_use]
    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Replace the parameter rule table.
    #[must_use]
    pub fn with_parameter_rules(mut self, rules: ParameterRules) -> Self {
        self.rules = rules;
        self
    }

    /// Add or replace the rule for one parameter name.
    #[must_use]
    pub fn with_parameter_rule(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.rules = self.rules.with_rule(name, kind);
        self
    }

    /// Send requests through `transport` instead of the built-in reqwest client.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Finalise the builder and create the [`CarvoyantClient`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when no complete credential mode is
    /// configured, a setting is out of range, the base URL is invalid, or the
    /// HTTP client cannot be constructed.
    pub fn build(self) -> Result<CarvoyantClient> {
        let strategy = self.config.check()?;
        let base_url = self.config.parse_api_url(&strategy)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut http_config = self.http_config;
                http_config.timeout = self.config.timeout();
                Arc::new(ReqwestTransport::new(&http_config, self.config.tls_verify)?)
            }
        };

        debug!(auth = strategy.name(), base_url = %base_url, "Built Carvoyant client");

        Ok(CarvoyantClient {
            strategy: Arc::new(strategy),
            base_url: Arc::new(base_url),
            rules: Arc::new(self.rules),
            transport,
        })
    }
}

/// Asynchronous client for the Carvoyant API.
///
/// Cloning is cheap; clones share configuration and the connection pool.
#[derive(Clone)]
pub struct CarvoyantClient {
    strategy: Arc<AuthStrategy>,
    base_url: Arc<Url>,
    rules: Arc<ParameterRules>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for CarvoyantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarvoyantClient")
            .field("auth", &self.strategy.name())
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CarvoyantClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`CarvoyantClientBuilder::build`].
    pub fn from_config(config: &CarvoyantConfig) -> Result<Self> {
        CarvoyantClientBuilder::new(config.clone()).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: CarvoyantConfig) -> CarvoyantClientBuilder {
        CarvoyantClientBuilder::new(config)
    }

    /// The resolved authentication mode.
    #[must_use]
    pub fn auth_strategy(&self) -> &AuthStrategy {
        &self.strategy
    }

    /// The base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The rule table used to encode and decode parameters.
    #[must_use]
    pub fn parameter_rules(&self) -> &ParameterRules {
        &self.rules
    }

    /// Validate arguments and build the request without sending it.
    ///
    /// `path` is relative to the base URL. In bearer mode a missing trailing
    /// `/` is appended. Parameters go to the query string for GET and DELETE
    /// and to a JSON body for POST.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty path or an invalid parameter.
    pub fn build_request(
        &self,
        path: &str,
        method: HttpMethod,
        params: &RequestParameters,
    ) -> Result<HttpRequest> {
        if path.is_empty() {
            return Err(Error::validation("path must be defined."));
        }

        let serialized = self.rules.serialize(params)?;
        let url = self.endpoint(path)?;

        let mut request = HttpRequest::new(method, url);
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));

        if let Some(value) = self.strategy.authorization_header() {
            request.headers.push(("Authorization".to_string(), value));
        }
        request.basic_auth = self
            .strategy
            .basic_credentials()
            .map(|(user, password)| (user.to_string(), password.to_string()));

        if method.sends_body() {
            request.body = Some(serialized.json_body());
        } else {
            request.query = serialized.query_pairs();
        }

        Ok(request)
    }

    /// Validate, build and send a request.
    ///
    /// Any HTTP status is returned as a response; see
    /// [`ApiResponse::error_for_status`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] before any network activity when an
    /// argument is invalid, or a transport error when the server cannot be
    /// reached.
    pub async fn send_request(
        &self,
        path: &str,
        method: HttpMethod,
        params: RequestParameters,
    ) -> Result<ApiResponse> {
        let request = self.build_request(path, method, &params)?;
        self.execute(request).await
    }

    /// Validate a request now and send it in the background.
    ///
    /// `callback` receives the outcome exactly once; `None` discards it. The
    /// returned handle completes after the callback has run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without spawning anything when an argument
    /// is invalid, or [`Error::ConfigError`] outside a Tokio runtime.
    pub fn dispatch(
        &self,
        path: &str,
        method: HttpMethod,
        params: RequestParameters,
        callback: Option<Callback>,
    ) -> Result<JoinHandle<()>> {
        let request = self.build_request(path, method, &params)?;
        self.spawn(request, callback)
    }

    /// Parameters encoded in the response's action called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionNotFound`] when the response has no such action,
    /// or a conversion error for a malformed action URI.
    pub fn action_parameters(&self, response: &ApiResponse, name: &str) -> Result<RequestParameters> {
        action::action_parameters(&response.body, name, &self.rules)
    }

    /// Replay the request behind `response` with the parameters of its action `name`.
    ///
    /// # Errors
    ///
    /// See [`CarvoyantClient::action_parameters`] and [`CarvoyantClient::send_request`].
    pub async fn follow_action(&self, response: &ApiResponse, name: &str) -> Result<ApiResponse> {
        let (path, method, params) = self.action_request(response, name)?;
        self.send_request(&path, method, params).await
    }

    /// Fetch the page after `response`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionNotFound`] on the last page.
    pub async fn next_page(&self, response: &ApiResponse) -> Result<ApiResponse> {
        self.follow_action(response, NEXT_PAGE_ACTION).await
    }

    /// Fetch the page before `response`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionNotFound`] on the first page.
    pub async fn prev_page(&self, response: &ApiResponse) -> Result<ApiResponse> {
        self.follow_action(response, PREVIOUS_PAGE_ACTION).await
    }

    /// Callback flavour of [`CarvoyantClient::follow_action`].
    ///
    /// # Errors
    ///
    /// Returns action lookup and validation errors immediately.
    pub fn dispatch_action(
        &self,
        response: &ApiResponse,
        name: &str,
        callback: Option<Callback>,
    ) -> Result<JoinHandle<()>> {
        let (path, method, params) = self.action_request(response, name)?;
        self.dispatch(&path, method, params, callback)
    }

    fn action_request(
        &self,
        response: &ApiResponse,
        name: &str,
    ) -> Result<(String, HttpMethod, RequestParameters)> {
        let params = self.action_parameters(response, name)?;
        let path = action::replay_path(&response.request.path, self.base_url.path());
        debug!(action = name, path = %path, "Following Carvoyant action");
        Ok((path, response.request.method, params))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if self.strategy.requires_trailing_slash() && !path.ends_with('/') {
            path.push('/');
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid Carvoyant path `{path}`: {err}")))
    }

    async fn execute(&self, request: HttpRequest) -> Result<ApiResponse> {
        info!(method = %request.method, path = %request.url.path(), "Sending Carvoyant request");
        debug!(query = ?request.query, body = ?request.body, "Carvoyant request parameters");

        self.transport.send(request).await
    }

    fn spawn(&self, request: HttpRequest, callback: Option<Callback>) -> Result<JoinHandle<()>> {
        let runtime = Handle::try_current()
            .map_err(|err| Error::ConfigError(format!("dispatch requires a Tokio runtime: {err}")))?;

        let client = self.clone();
        Ok(runtime.spawn(async move {
            let outcome = client.execute(request).await;
            if let Some(callback) = callback {
                callback(outcome);
            }
        }))
    }
}
