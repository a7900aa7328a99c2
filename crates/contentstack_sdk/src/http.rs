//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so the transport can be
//! tested without a network. [`ReqwestClient`] is the production client.

use crate::config::StackConfig;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, HostKind, Transport};
use contentstack_protocol::{QueryParams, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("contentstack-rust/", env!("CARGO_PKG_VERSION"));

/// A raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Errors are
/// connection-level failures only; non-2xx replies come back as responses.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response.
    fn get(
        &self,
        url: &str,
        query: &QueryParams,
        headers: &[(String, String)],
    ) -> std::result::Result<HttpResponse, String>;
}

/// Blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(
        &self,
        url: &str,
        query: &QueryParams,
        headers: &[(String, String)],
    ) -> std::result::Result<HttpResponse, String> {
        let mut request = self.client.get(url).query(query.as_pairs());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// HTTP-based transport for a stack.
///
/// Adds the stack's default headers and the `environment` parameter to every
/// request and turns non-2xx replies into errors.
pub struct HttpTransport<C: HttpClient> {
    config: StackConfig,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(config: &StackConfig, client: C) -> Self {
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Builds the absolute URL for a request.
    pub fn url_for(&self, request: &ApiRequest) -> Result<String> {
        let base = match request.host {
            HostKind::Delivery => self.config.base_url(),
            HostKind::Preview => self
                .config
                .preview_base_url()
                .ok_or_else(|| Error::Config("live preview is not enabled".into()))?,
        };
        Ok(format!("{}{}", base, request.path))
    }

    /// Builds the header list for a request.
    ///
    /// Draft requests authenticate with the live preview token instead of the
    /// delivery token.
    pub fn headers_for(&self, request: &ApiRequest) -> Vec<(String, String)> {
        let mut headers = vec![("api_key".to_string(), self.config.api_key.clone())];
        if request.host == HostKind::Delivery {
            headers.push((
                "access_token".to_string(),
                self.config.delivery_token.clone(),
            ));
        }
        if let Some(branch) = &self.config.branch {
            headers.push(("branch".to_string(), branch.clone()));
        }
        if !self.config.early_access.is_empty() {
            headers.push(("x-header-ea".to_string(), self.config.early_access.join(",")));
        }
        headers.push(("X-User-Agent".to_string(), USER_AGENT.to_string()));
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        headers.extend(request.headers.iter().cloned());
        headers
    }

    fn query_for(&self, request: &ApiRequest) -> QueryParams {
        let mut query = QueryParams::new();
        if !request.params.contains("environment") {
            query.set("environment", self.config.environment.as_str());
        }
        query.extend_from(&request.params);
        query
    }
}

impl<C: HttpClient> Transport for HttpTransport<C> {
    fn send(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.url_for(request)?;
        let query = self.query_for(request);
        let headers = self.headers_for(request);

        debug!(path = %request.path, host = ?request.host, params = query.len(), "sending request");

        let response = self.client.get(&url, &query, &headers).map_err(|e| {
            warn!(path = %request.path, error = %e, "request failed");
            Error::transport(e)
        })?;

        if !response.is_success() {
            warn!(path = %request.path, status = response.status, "request rejected");
            return Err(error_from_response(&response));
        }

        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// Maps a non-2xx reply to an error, using the API error document if present.
fn error_from_response(response: &HttpResponse) -> Error {
    let document: Option<Value> = serde_json::from_slice(&response.body).ok();
    let message = document
        .as_ref()
        .and_then(|doc| doc.get("error_message"))
        .and_then(Value::as_str);

    match message {
        Some(message) => Error::Api {
            status: response.status,
            error_code: document
                .as_ref()
                .and_then(|doc| doc.get("error_code"))
                .and_then(Value::as_i64),
            error_message: message.to_string(),
        },
        None => Error::Transport {
            message: format!("HTTP {}", response.status),
            status: Some(response.status),
        },
    }
}
