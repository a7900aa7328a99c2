//! The stack: entry point for every delivery call.

use crate::asset::{Asset, AssetQuery};
use crate::config::StackConfig;
use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, ReqwestClient};
use crate::image;
use crate::live_preview::LivePreviewQuery;
use crate::query::QueryResult;
use crate::sync::{SyncOutcome, SyncWalker};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{response_count, Envelope, QueryParams, SyncRequest, Value};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// State shared by a stack and every handle created from it.
pub(crate) struct StackContext<T: Transport> {
    pub(crate) config: StackConfig,
    pub(crate) transport: T,
    live_preview: RwLock<Option<LivePreviewQuery>>,
}

impl<T: Transport> StackContext<T> {
    pub(crate) fn send(&self, request: &ApiRequest) -> Result<Value> {
        self.transport.send(request)
    }

    /// Returns the stored live preview query if it applies to this content
    /// type (and entry, when one is given).
    pub(crate) fn live_preview_for(
        &self,
        content_type_uid: &str,
        entry_uid: Option<&str>,
    ) -> Option<LivePreviewQuery> {
        self.config.active_live_preview()?;
        let guard = self.live_preview.read();
        let query = guard.as_ref()?;
        if query.content_type_uid != content_type_uid {
            return None;
        }
        match (entry_uid, query.entry_uid.as_deref()) {
            (Some(wanted), Some(previewed)) if wanted != previewed => None,
            _ => Some(query.clone()),
        }
    }
}

/// Options for listing content types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypesOptions {
    /// Ask for the total count.
    pub include_count: bool,
    /// Expand global field schemas.
    pub include_global_field_schema: bool,
    /// Page size.
    pub limit: Option<u32>,
    /// Page offset.
    pub skip: Option<u32>,
}

impl ContentTypesOptions {
    fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if self.include_count {
            params.set_flag("include_count", true);
        }
        if self.include_global_field_schema {
            params.set_flag("include_global_field_schema", true);
        }
        if let Some(limit) = self.limit {
            params.set("limit", limit.to_string());
        }
        if let Some(skip) = self.skip {
            params.set("skip", skip.to_string());
        }
        params
    }
}

/// A delivery stack.
///
/// Cheap to clone; clones share the transport and live preview state.
pub struct Stack<T: Transport = HttpTransport<ReqwestClient>> {
    ctx: Arc<StackContext<T>>,
}

impl<T: Transport> Clone for Stack<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl Stack<HttpTransport<ReqwestClient>> {
    /// Creates a stack that talks to the delivery API over HTTPS.
    pub fn connect(config: StackConfig) -> Result<Self> {
        let client = ReqwestClient::new(config.timeout)?;
        let transport = HttpTransport::new(&config, client);
        Self::new(config, transport)
    }
}

impl<T: Transport> Stack<T> {
    /// Creates a stack over the given transport. The configuration is
    /// validated here.
    pub fn new(config: StackConfig, transport: T) -> Result<Self> {
        config.validate()?;
        debug!(host = config.host(), environment = %config.environment, "stack created");
        Ok(Self {
            ctx: Arc::new(StackContext {
                config,
                transport,
                live_preview: RwLock::new(None),
            }),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StackConfig {
        &self.ctx.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.ctx.transport
    }

    /// Lists content types.
    pub fn content_types(&self, options: &ContentTypesOptions) -> Result<QueryResult> {
        let request = ApiRequest::delivery("/content_types").with_params(options.to_params());
        let response = self.ctx.send(&request)?;
        let count = response_count(&response);
        let items = Envelope::ContentTypes.extract_list(response)?;
        Ok(QueryResult { items, count })
    }

    /// Returns a handle on a content type.
    pub fn content_type(&self, uid: impl Into<String>) -> ContentType<T> {
        ContentType::new(Arc::clone(&self.ctx), uid.into())
    }

    /// Returns a handle on an asset.
    pub fn asset(&self, uid: impl Into<String>) -> Asset<T> {
        Asset::new(Arc::clone(&self.ctx), uid.into())
    }

    /// Returns a query over all assets.
    pub fn asset_query(&self) -> AssetQuery<T> {
        AssetQuery::new(Arc::clone(&self.ctx))
    }

    /// Runs a sync sequence to completion.
    pub fn sync(&self, request: &SyncRequest) -> Result<SyncOutcome> {
        let walker = SyncWalker::new(self.ctx.config.max_sync_pages);
        walker.walk(request, |params| {
            self.ctx
                .send(&ApiRequest::delivery("/stacks/sync").with_params(params.clone()))
        })
    }

    /// Starts a fresh sync. Filters are taken from `request`; its `init` flag
    /// is forced on and any tokens are dropped.
    pub fn sync_init(&self, request: SyncRequest) -> Result<SyncOutcome> {
        let request = SyncRequest {
            init: true,
            pagination_token: None,
            sync_token: None,
            ..request
        };
        self.sync(&request)
    }

    /// Resumes an interrupted sync from a pagination token.
    pub fn sync_pagination(&self, pagination_token: impl Into<String>) -> Result<SyncOutcome> {
        self.sync(&SyncRequest::pagination(pagination_token))
    }

    /// Fetches changes since a previous sync.
    pub fn sync_token(&self, sync_token: impl Into<String>) -> Result<SyncOutcome> {
        self.sync(&SyncRequest::since(sync_token))
    }

    /// Stores the live preview query sent by the preview iframe. Later entry
    /// fetches for the same content type overlay the draft.
    pub fn live_preview_query(&self, query: LivePreviewQuery) -> Result<()> {
        if self.ctx.config.active_live_preview().is_none() {
            return Err(Error::Config("live preview is not enabled".into()));
        }
        if query.live_preview.is_empty() || query.content_type_uid.is_empty() {
            return Err(Error::Config(
                "live preview query needs a hash and a content type".into(),
            ));
        }
        *self.ctx.live_preview.write() = Some(query);
        Ok(())
    }

    /// Forgets the live preview query.
    pub fn clear_live_preview(&self) {
        *self.ctx.live_preview.write() = None;
    }

    /// Returns the stored live preview query.
    pub fn current_live_preview(&self) -> Option<LivePreviewQuery> {
        self.ctx.live_preview.read().clone()
    }

    /// Appends image delivery transformations to an asset URL.
    pub fn image_transform(&self, url: &str, params: &QueryParams) -> String {
        image::transform_url(url, params)
    }
}

/// Percent-encodes a path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
