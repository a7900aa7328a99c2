//! Sync cursor walker.
//!
//! Follows `pagination_token`s until the server hands back a `sync_token`
//! (or nothing), collecting the items of every page in order. Each request
//! depends on the previous response, so the walk is strictly sequential.

use crate::error::{Error, Result};
use contentstack_protocol::{
    QueryParams, SyncContinuation, SyncItem, SyncRequest, SyncResponse, Value,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Result of a completed sync walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    /// Items from every page, in server order.
    pub items: Vec<SyncItem>,
    /// Token to persist for the next incremental sync, if the server issued one.
    pub sync_token: Option<String>,
    /// Number of pages fetched.
    pub pages: usize,
    /// `total_count` reported by the server, from the latest page that had one.
    pub total_count: Option<u64>,
    /// `skip` of the last page, as reported by the server.
    pub skip: Option<u64>,
    /// `limit` of the last page, as reported by the server.
    pub limit: Option<u64>,
}

/// Drives the sync endpoint until no continuation token remains.
///
/// The walker never retries. On failure the error carries every item received
/// so far (see [`Error::partial_items`]) so the caller can decide whether to
/// keep them and resume from the last cursor or discard them.
#[derive(Debug, Clone, Copy)]
pub struct SyncWalker {
    max_pages: usize,
}

impl SyncWalker {
    /// Creates a walker that gives up after `max_pages` pages.
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Returns the page bound.
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Walks a sync sequence.
    ///
    /// `send` performs one call with the given query parameters and returns
    /// the decoded JSON body. Follow-up calls carry only the
    /// `pagination_token`.
    pub fn walk<F>(&self, initial: &SyncRequest, mut send: F) -> Result<SyncOutcome>
    where
        F: FnMut(&QueryParams) -> Result<Value>,
    {
        initial.validate()?;

        let mut params = initial.to_params();
        let mut last_cursor = initial
            .pagination_token
            .clone()
            .or_else(|| initial.sync_token.clone());
        let mut consumed: HashSet<String> = initial.pagination_token.iter().cloned().collect();
        let mut items: Vec<SyncItem> = Vec::new();
        let mut total_count = None;
        let mut skip = None;
        let mut limit = None;
        let mut pages = 0usize;

        loop {
            if pages >= self.max_pages {
                warn!(pages, items = items.len(), "sync page bound reached");
                return Err(Error::SyncPageLimitExceeded {
                    pages,
                    partial_items: items,
                });
            }

            let raw = match send(&params) {
                Ok(raw) => raw,
                Err(source) => {
                    warn!(page = pages + 1, items = items.len(), error = %source, "sync request failed");
                    return Err(Error::SyncTransport {
                        source: Box::new(source),
                        partial_items: items,
                        last_cursor,
                    });
                }
            };
            pages += 1;

            let page = match SyncResponse::from_value(&raw) {
                Ok(page) => page,
                Err(e) => {
                    return Err(Error::SyncProtocol {
                        message: e.to_string(),
                        partial_items: items,
                    })
                }
            };

            if page.total_count.is_some() {
                total_count = page.total_count;
            }
            skip = page.skip;
            limit = page.limit;
            let continuation = page.continuation();
            items.extend(page.items);
            debug!(page = pages, items = items.len(), "sync page received");

            match continuation {
                SyncContinuation::Paginate(token) => {
                    if !consumed.insert(token.clone()) {
                        return Err(Error::SyncProtocol {
                            message: format!("server repeated pagination token {}", token),
                            partial_items: items,
                        });
                    }
                    params = SyncRequest::pagination(token.as_str()).to_params();
                    last_cursor = Some(token);
                }
                SyncContinuation::Complete(sync_token) => {
                    info!(pages, items = items.len(), "sync complete");
                    return Ok(SyncOutcome {
                        items,
                        sync_token: Some(sync_token),
                        pages,
                        total_count,
                        skip,
                        limit,
                    });
                }
                SyncContinuation::Exhausted => {
                    info!(pages, items = items.len(), "sync ended without a sync token");
                    return Ok(SyncOutcome {
                        items,
                        sync_token: None,
                        pages,
                        total_count,
                        skip,
                        limit,
                    });
                }
            }
        }
    }
}

impl Default for SyncWalker {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;

    fn item(uid: &str) -> Value {
        json!({"type": "entry_published", "content_type_uid": "blog", "data": {"uid": uid}})
    }

    /// Replays canned pages and records the parameters of every call.
    fn scripted(
        pages: Vec<Result<Value>>,
    ) -> (
        impl FnMut(&QueryParams) -> Result<Value>,
        std::rc::Rc<std::cell::RefCell<Vec<QueryParams>>>,
    ) {
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen = calls.clone();
        let mut queue: VecDeque<Result<Value>> = pages.into();
        let send = move |params: &QueryParams| {
            seen.borrow_mut().push(params.clone());
            queue
                .pop_front()
                .unwrap_or_else(|| Err(Error::transport("script exhausted")))
        };
        (send, calls)
    }

    #[test]
    fn terminates_and_concatenates_in_order() {
        let (send, calls) = scripted(vec![
            Ok(json!({"items": [item("a"), item("b")], "pagination_token": "P1"})),
            Ok(json!({"items": [item("c")], "pagination_token": "P2"})),
            Ok(json!({"items": [], "pagination_token": "P3"})),
            Ok(json!({"items": [item("d")], "sync_token": "S9", "total_count": 4})),
        ]);

        let outcome = SyncWalker::default().walk(&SyncRequest::init(), send).unwrap();

        let uids: Vec<&str> = outcome.items.iter().filter_map(SyncItem::uid).collect();
        assert_eq!(uids, vec!["a", "b", "c", "d"]);
        assert_eq!(outcome.pages, 4);
        assert_eq!(outcome.total_count, Some(4));
        assert_eq!(outcome.sync_token.as_deref(), Some("S9"));
        assert_eq!(calls.borrow().len(), 4);
    }

    #[test]
    fn token_handoff_sends_only_the_pagination_token() {
        let (send, calls) = scripted(vec![
            Ok(json!({"items": [item("a")], "pagination_token": "T1"})),
            Ok(json!({"items": [item("b")], "sync_token": "S1"})),
        ]);

        let request = SyncRequest::init().with_locale("en-us");
        let outcome = SyncWalker::default().walk(&request, send).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].get("init"), Some("true"));
        assert_eq!(calls[0].get("locale"), Some("en-us"));
        let expected: QueryParams = [("pagination_token", "T1")].into_iter().collect();
        assert_eq!(calls[1], expected);
        assert_eq!(outcome.sync_token.as_deref(), Some("S1"));
    }

    #[test]
    fn no_tokens_stops_immediately() {
        let (send, calls) = scripted(vec![Ok(json!({"items": [item("a")]}))]);
        let outcome = SyncWalker::default()
            .walk(&SyncRequest::since("S0"), send)
            .unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.sync_token, None);
        assert_eq!(calls.borrow()[0].get("sync_token"), Some("S0"));
    }

    #[test]
    fn transport_failure_carries_partial_items() {
        let (send, _) = scripted(vec![
            Ok(json!({"items": [item("a"), item("b")], "pagination_token": "T1"})),
            Err(Error::transport("connection reset")),
        ]);

        let err = SyncWalker::default()
            .walk(&SyncRequest::init(), send)
            .unwrap_err();

        match err {
            Error::SyncTransport {
                source,
                partial_items,
                last_cursor,
            } => {
                assert!(matches!(*source, Error::Transport { .. }));
                assert_eq!(partial_items.len(), 2);
                assert_eq!(last_cursor.as_deref(), Some("T1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_page_is_protocol_error() {
        let (send, _) = scripted(vec![
            Ok(json!({"items": [item("a")], "pagination_token": "T1"})),
            Ok(json!({"items": "nope"})),
        ]);

        let err = SyncWalker::default()
            .walk(&SyncRequest::init(), send)
            .unwrap_err();
        assert!(matches!(err, Error::SyncProtocol { .. }));
        assert_eq!(err.partial_items().map(<[_]>::len), Some(1));
    }

    #[test]
    fn repeated_token_is_rejected() {
        let (send, calls) = scripted(vec![
            Ok(json!({"items": [], "pagination_token": "T1"})),
            Ok(json!({"items": [], "pagination_token": "T1"})),
        ]);

        let err = SyncWalker::default()
            .walk(&SyncRequest::init(), send)
            .unwrap_err();
        assert!(err.to_string().contains("repeated pagination token"));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn resuming_with_a_consumed_token_is_rejected() {
        let (send, _) = scripted(vec![Ok(json!({"items": [], "pagination_token": "T1"}))]);
        let err = SyncWalker::default()
            .walk(&SyncRequest::pagination("T1"), send)
            .unwrap_err();
        assert!(matches!(err, Error::SyncProtocol { .. }));
    }

    #[test]
    fn page_bound_aborts() {
        let mut n = 0;
        let send = |_: &QueryParams| {
            n += 1;
            Ok(json!({"items": [item("x")], "pagination_token": format!("T{n}")}))
        };

        let err = SyncWalker::new(3)
            .walk(&SyncRequest::init(), send)
            .unwrap_err();
        match err {
            Error::SyncPageLimitExceeded {
                pages,
                partial_items,
            } => {
                assert_eq!(pages, 3);
                assert_eq!(partial_items.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_request_sends_nothing() {
        let (send, calls) = scripted(vec![]);
        let err = SyncWalker::default()
            .walk(&SyncRequest::default(), send)
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(calls.borrow().is_empty());
    }
}
