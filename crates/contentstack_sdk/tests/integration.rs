//! Integration tests for the delivery client.

use contentstack_sdk::{
    BaseQuery, Error, HostKind, HttpClient, HttpResponse, HttpTransport, LivePreviewConfig,
    LivePreviewQuery, MockTransport, QueryOperation, QueryParams, Region, Stack, StackConfig,
    SyncItemType, SyncRequest,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

fn stack() -> Stack<MockTransport> {
    Stack::new(
        StackConfig::new("blt_api", "cs_token", "production"),
        MockTransport::new(),
    )
    .unwrap()
}

fn preview_stack() -> Stack<MockTransport> {
    let config = StackConfig::new("blt_api", "cs_token", "production")
        .with_live_preview(LivePreviewConfig::with_preview_token("csprev_token"));
    Stack::new(config, MockTransport::new()).unwrap()
}

fn entry_item(uid: &str) -> Value {
    json!({
        "type": "entry_published",
        "content_type_uid": "blog",
        "event_at": "2024-01-01T00:00:00.000Z",
        "data": {"uid": uid}
    })
}

#[test]
fn sync_follows_pagination_to_sync_token() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({
            "items": [entry_item("e1"), entry_item("e2")],
            "skip": 0, "limit": 100, "total_count": 3,
            "pagination_token": "P1"
        }))
        .push_response(json!({
            "items": [{"type": "asset_deleted", "data": {"uid": "a1"}}],
            "skip": 100, "limit": 100, "total_count": 3,
            "sync_token": "S1"
        }));

    let outcome = stack
        .sync_init(SyncRequest::init().with_locale("en-us"))
        .unwrap();

    let uids: Vec<_> = outcome.items.iter().filter_map(|i| i.uid()).collect();
    assert_eq!(uids, ["e1", "e2", "a1"]);
    assert_eq!(outcome.items[2].item_type, SyncItemType::AssetDeleted);
    assert_eq!(outcome.sync_token.as_deref(), Some("S1"));
    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.total_count, Some(3));
    assert_eq!(outcome.skip, Some(100));
    assert_eq!(outcome.limit, Some(100));

    let requests = stack.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].params.get("init"), Some("true"));
    assert_eq!(requests[0].params.get("locale"), Some("en-us"));
    let follow_up: Vec<_> = requests[1].params.iter().collect();
    assert_eq!(follow_up, [("pagination_token", "P1")]);
}

#[test]
fn sync_with_token_sends_only_token() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"items": [], "sync_token": "S2"}));

    let outcome = stack.sync_token("S1").unwrap();
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.sync_token.as_deref(), Some("S2"));

    let sent: Vec<_> = stack.transport().requests()[0]
        .params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(sent, [("sync_token".to_string(), "S1".to_string())]);
}

#[test]
fn sync_failure_keeps_partial_items() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"items": [entry_item("e1")], "pagination_token": "P1"}))
        .push_error(Error::Transport {
            message: "HTTP 502".into(),
            status: Some(502),
        });

    let err = stack.sync_init(SyncRequest::init()).unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.partial_items().map(<[_]>::len), Some(1));
    match err {
        Error::SyncTransport { last_cursor, .. } => {
            assert_eq!(last_cursor.as_deref(), Some("P1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sync_resume_from_pagination_token() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"items": [entry_item("e9")], "sync_token": "S9"}));

    let outcome = stack.sync_pagination("P4").unwrap();
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(
        stack.transport().requests()[0].params.get("pagination_token"),
        Some("P4")
    );
}

#[test]
fn sync_page_bound_from_config() {
    let config = StackConfig::new("k", "t", "e").with_max_sync_pages(2);
    let stack = Stack::new(config, MockTransport::new()).unwrap();
    stack
        .transport()
        .push_response(json!({"items": [entry_item("e1")], "pagination_token": "P1"}))
        .push_response(json!({"items": [entry_item("e2")], "pagination_token": "P2"}))
        .push_response(json!({"items": [], "sync_token": "S"}));

    let err = stack.sync_init(SyncRequest::init()).unwrap_err();
    assert!(matches!(err, Error::SyncPageLimitExceeded { pages: 2, .. }));
    assert_eq!(err.partial_items().map(<[_]>::len), Some(2));
    assert_eq!(stack.transport().pending_responses(), 1);
}

#[test]
fn entry_fetch_builds_request() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"entry": {"uid": "blt1", "title": "Home"}}));

    let entry = stack
        .content_type("page")
        .entry("blt1")
        .locale("fr-fr")
        .include_reference(["author", "author"])
        .only(["title"])
        .fetch()
        .unwrap();
    assert_eq!(entry["title"], "Home");

    let request = &stack.transport().requests()[0];
    assert_eq!(request.host, HostKind::Delivery);
    assert_eq!(request.path, "/content_types/page/entries/blt1");
    assert_eq!(request.params.get("locale"), Some("fr-fr"));
    assert_eq!(request.params.get_all("include[]"), ["author"]);
    assert_eq!(request.params.get_all("only[BASE][]"), ["title"]);
}

#[test]
fn live_preview_overlays_draft_on_entry() {
    let stack = preview_stack();
    stack
        .live_preview_query(LivePreviewQuery::new("hash123", "blog").with_entry_uid("blt1"))
        .unwrap();
    stack
        .transport()
        .push_response(json!({"entry": {
            "uid": "blt1",
            "title": "Published",
            "seo": {"title": "Old", "keywords": "a"}
        }}))
        .push_response(json!({"entry": {
            "uid": "blt1",
            "title": "Draft",
            "seo": {"title": "New"}
        }}));

    let entry = stack.content_type("blog").entry("blt1").fetch().unwrap();
    assert_eq!(
        entry,
        json!({"uid": "blt1", "title": "Draft", "seo": {"title": "New", "keywords": "a"}})
    );

    let requests = stack.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].host, HostKind::Preview);
    assert_eq!(requests[1].path, "/content_types/blog/entries/blt1");
    assert_eq!(requests[1].header("live_preview"), Some("hash123"));
    assert_eq!(requests[1].header("preview_token"), Some("csprev_token"));
}

#[test]
fn live_preview_skips_other_entries() {
    let stack = preview_stack();
    stack
        .live_preview_query(LivePreviewQuery::new("hash123", "blog").with_entry_uid("blt1"))
        .unwrap();
    stack
        .transport()
        .push_response(json!({"entry": {"uid": "blt2", "title": "Other"}}));

    let entry = stack.content_type("blog").entry("blt2").fetch().unwrap();
    assert_eq!(entry["title"], "Other");
    assert_eq!(stack.transport().request_count(), 1);
}

#[test]
fn live_preview_merges_into_query_results() {
    let stack = preview_stack();
    stack
        .live_preview_query(LivePreviewQuery::new("hash123", "blog").with_entry_uid("blt2"))
        .unwrap();
    stack
        .transport()
        .push_response(json!({
            "entries": [
                {"uid": "blt1", "title": "One"},
                {"uid": "blt2", "title": "Two", "tags": ["a", "b"]}
            ],
            "count": 2
        }))
        .push_response(json!({"entry": {"uid": "blt2", "title": "Two (draft)", "tags": ["c"]}}));

    let result = stack
        .content_type("blog")
        .query()
        .where_clause("title", QueryOperation::Exists(true))
        .skip(20)
        .limit(5)
        .include_count()
        .order_by_ascending("title")
        .locale("en-us")
        .include_reference(["author"])
        .find()
        .unwrap();
    assert_eq!(result.count, Some(2));
    assert_eq!(result.items[0], json!({"uid": "blt1", "title": "One"}));
    assert_eq!(
        result.items[1],
        json!({"uid": "blt2", "title": "Two (draft)", "tags": ["c"]})
    );

    let requests = stack.transport().requests();
    assert_eq!(requests[0].params.get("skip"), Some("20"));
    assert!(requests[0].params.contains("query"));

    assert_eq!(requests[1].host, HostKind::Preview);
    assert_eq!(requests[1].path, "/content_types/blog/entries/blt2");
    let draft_params: Vec<_> = requests[1].params.iter().collect();
    assert_eq!(draft_params, [("locale", "en-us"), ("include[]", "author")]);
}

#[test]
fn malformed_draft_is_a_merge_error() {
    let stack = preview_stack();
    stack
        .live_preview_query(LivePreviewQuery::new("hash123", "blog").with_entry_uid("blt1"))
        .unwrap();
    stack
        .transport()
        .push_response(json!({"entry": {"uid": "blt1", "title": "Published"}}))
        .push_response(json!({"entry": {"title": "no uid"}}));

    let err = stack.content_type("blog").entry("blt1").fetch().unwrap_err();
    assert!(matches!(err, Error::MergeInput(_)));
}

#[test]
fn query_renders_conditions() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"entries": [{"uid": "blt1"}]}));

    let query = stack.content_type("product").query();
    let cheap = stack
        .content_type("product")
        .query()
        .where_clause("price", QueryOperation::IsLessThan(json!(10)));
    let result = query
        .where_clause("price", QueryOperation::IsGreaterThan(json!(1)))
        .or(&[cheap])
        .order_by_descending("updated_at")
        .limit(5)
        .find()
        .unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.count, None);

    let request = &stack.transport().requests()[0];
    assert_eq!(request.path, "/content_types/product/entries");
    assert_eq!(request.params.get("desc"), Some("updated_at"));
    assert_eq!(request.params.get("limit"), Some("5"));
    let query: Value = serde_json::from_str(request.params.get("query").unwrap()).unwrap();
    assert_eq!(
        query,
        json!({"price": {"$gt": 1}, "$or": [{"price": {"$lt": 10}}]})
    );
}

#[test]
fn query_builders_render_wire_shapes() {
    let stack = stack();
    stack.transport().push_response(json!({"entries": []}));

    let blog = stack.content_type("blog");
    let older = blog
        .query()
        .where_clause("age", QueryOperation::IsGreaterThan(json!(3)));
    let by_name = stack
        .content_type("author")
        .query()
        .where_clause("name", QueryOperation::Equals(json!("X")));
    let banned = stack
        .content_type("author")
        .query()
        .where_clause("banned", QueryOperation::Equals(json!(true)));

    blog.query()
        .and(&[older])
        .where_in("author", &by_name)
        .where_not_in("reviewer", &banned)
        .tags(["t1"])
        .search("hello")
        .excepts(["body"])
        .include_fallback()
        .find()
        .unwrap();

    let request = &stack.transport().requests()[0];
    assert_eq!(request.params.get("typeahead"), Some("hello"));
    assert_eq!(request.params.get_all("except[BASE][]"), ["body"]);
    assert_eq!(request.params.get("include_fallback"), Some("true"));

    let query: Value = serde_json::from_str(request.params.get("query").unwrap()).unwrap();
    assert_eq!(
        query,
        json!({
            "$and": [{"age": {"$gt": 3}}],
            "author": {"$in_query": {"name": "X"}},
            "reviewer": {"$nin_query": {"banned": true}},
            "tags": {"$in": ["t1"]}
        })
    );
}

#[test]
fn entry_fallback_and_excepts() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"entry": {"uid": "blt1"}}));

    stack
        .content_type("blog")
        .entry("blt1")
        .include_fallback()
        .excepts(["body", "seo"])
        .fetch()
        .unwrap();

    let request = &stack.transport().requests()[0];
    assert_eq!(request.params.get("include_fallback"), Some("true"));
    assert_eq!(request.params.get_all("except[BASE][]"), ["body", "seo"]);
}

#[test]
fn find_one_reports_not_found() {
    let stack = stack();
    stack.transport().push_response(json!({"entries": []}));

    let err = stack
        .content_type("blog")
        .query()
        .where_clause("title", QueryOperation::Equals(json!("Missing")))
        .find_one()
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(stack.transport().requests()[0].params.get("limit"), Some("1"));
}

#[test]
fn assets_fetch_and_query() {
    let stack = stack();
    stack
        .transport()
        .push_response(json!({"asset": {"uid": "a1", "url": "https://images/x.png"}}))
        .push_response(json!({"assets": [{"uid": "a1"}, {"uid": "a2"}], "count": 2}));

    let asset = stack.asset("a1").include_dimension().fetch().unwrap();
    assert_eq!(asset["uid"], "a1");

    let result = stack
        .asset_query()
        .include_count()
        .relative_url()
        .find()
        .unwrap();
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.count, Some(2));

    let requests = stack.transport().requests();
    assert_eq!(requests[0].path, "/assets/a1");
    assert_eq!(requests[0].params.get("include_dimension"), Some("true"));
    assert_eq!(requests[1].path, "/assets");
    assert_eq!(requests[1].params.get("relative_urls"), Some("true"));
}

#[test]
fn content_type_fetch_missing_envelope() {
    let stack = stack();
    stack.transport().push_response(json!({"notice": "nothing"}));

    let err = stack.content_type("blog").fetch().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[test]
fn image_transform_appends_params() {
    let stack = stack();
    let mut params = QueryParams::new();
    params.set("width", "200");
    assert_eq!(
        stack.image_transform("https://images.contentstack.io/a.png", &params),
        "https://images.contentstack.io/a.png?width=200"
    );
}

/// HTTP client that answers from a fixed table and records what it saw.
struct RecordingClient {
    replies: Mutex<Vec<HttpResponse>>,
    seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl RecordingClient {
    fn new(replies: Vec<HttpResponse>) -> Self {
        Self {
            replies: Mutex::new(replies),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl HttpClient for RecordingClient {
    fn get(
        &self,
        url: &str,
        query: &QueryParams,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, String> {
        let pairs = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.seen.lock().push((url.to_string(), pairs));
        let mut replies = self.replies.lock();
        if replies.is_empty() {
            Err("connection refused".to_string())
        } else {
            Ok(replies.remove(0))
        }
    }
}

fn reply(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string().into_bytes(),
    }
}

#[test]
fn sync_over_http_transport() {
    let config = StackConfig::new("blt_api", "cs_token", "staging").with_region(Region::Eu);
    let client = RecordingClient::new(vec![
        reply(json!({"items": [entry_item("e1")], "pagination_token": "P1"})),
        reply(json!({"items": [entry_item("e2")], "sync_token": "S1"})),
    ]);
    let transport = HttpTransport::new(&config, client);
    let stack = Stack::new(config, transport).unwrap();

    let outcome = stack.sync_init(SyncRequest::init()).unwrap();
    assert_eq!(outcome.items.len(), 2);
    assert_eq!(outcome.sync_token.as_deref(), Some("S1"));

    let seen = stack.transport().client().seen.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "https://eu-cdn.contentstack.com/v3/stacks/sync");
    assert!(seen[1]
        .1
        .contains(&("pagination_token".to_string(), "P1".to_string())));
    assert!(seen[1]
        .1
        .contains(&("environment".to_string(), "staging".to_string())));
}

#[test]
fn http_api_error_is_reported() {
    let config = StackConfig::new("blt_api", "cs_token", "production");
    let client = RecordingClient::new(vec![HttpResponse {
        status: 422,
        body: json!({"error_message": "Entry not found", "error_code": 141})
            .to_string()
            .into_bytes(),
    }]);
    let stack = Stack::new(config.clone(), HttpTransport::new(&config, client)).unwrap();

    let err = stack.content_type("blog").entry("nope").fetch().unwrap_err();
    match err {
        Error::Api {
            status,
            error_code,
            error_message,
        } => {
            assert_eq!(status, 422);
            assert_eq!(error_code, Some(141));
            assert_eq!(error_message, "Entry not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}
