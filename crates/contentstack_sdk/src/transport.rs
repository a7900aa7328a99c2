//! Transport layer abstraction.

use crate::error::{Error, Result};
use contentstack_protocol::{QueryParams, Value};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Which host a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKind {
    /// The delivery CDN for the configured region.
    #[default]
    Delivery,
    /// The live preview host.
    Preview,
}

/// One API call, independent of how it is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Target host.
    pub host: HostKind,
    /// Path below the API version, e.g. `/content_types/blog/entries`.
    pub path: String,
    /// Query parameters.
    pub params: QueryParams,
    /// Request-specific headers, added to the stack's default headers.
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a request for the delivery host.
    pub fn delivery(path: impl Into<String>) -> Self {
        Self {
            host: HostKind::Delivery,
            path: path.into(),
            params: QueryParams::new(),
            headers: Vec::new(),
        }
    }

    /// Creates a request for the live preview host.
    pub fn preview(path: impl Into<String>) -> Self {
        Self {
            host: HostKind::Preview,
            ..Self::delivery(path)
        }
    }

    /// Sets the query parameters.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns a request header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A transport carries API requests and returns decoded JSON bodies.
///
/// Implementations own timeouts and cancellation; callers above this trait
/// never retry.
pub trait Transport: Send + Sync {
    /// Sends a request and returns the decoded response body.
    fn send(&self, request: &ApiRequest) -> Result<Value>;
}

/// A scripted transport for testing.
///
/// Responses are handed out in the order they were queued and every request
/// is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Creates a mock transport with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn push_response(&self, response: Value) -> &Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// Queues a failure.
    pub fn push_error(&self, error: Error) -> &Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of responses not yet handed out.
    pub fn pending_responses(&self) -> usize {
        self.responses.lock().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<Value> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::transport("no mock response queued")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builders() {
        let request = ApiRequest::preview("/content_types/page/entries/blt1")
            .with_header("live_preview", "hash")
            .with_params([("locale", "en-us")].into_iter().collect());

        assert_eq!(request.host, HostKind::Preview);
        assert_eq!(request.header("LIVE_PREVIEW"), Some("hash"));
        assert_eq!(request.params.get("locale"), Some("en-us"));
        assert_eq!(ApiRequest::delivery("/x").host, HostKind::Delivery);
    }

    #[test]
    fn mock_transport_replays_in_order() {
        let transport = MockTransport::new();
        transport
            .push_response(json!({"n": 1}))
            .push_error(Error::transport("down"));

        let request = ApiRequest::delivery("/stacks/sync");
        assert_eq!(transport.send(&request).unwrap(), json!({"n": 1}));
        assert!(matches!(
            transport.send(&request),
            Err(Error::Transport { .. })
        ));
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.pending_responses(), 0);
    }

    #[test]
    fn mock_transport_empty_queue() {
        let transport = MockTransport::new();
        let err = transport.send(&ApiRequest::delivery("/assets")).unwrap_err();
        assert!(err.to_string().contains("no mock response"));
        assert_eq!(transport.requests()[0].path, "/assets");
    }
}
