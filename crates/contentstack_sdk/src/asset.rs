//! Assets: single fetch and queries.

use crate::error::Result;
use crate::query::{BaseQuery, QueryResult, QueryState};
use crate::stack::{segment, StackContext};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{response_count, Envelope, QueryParams, Value};
use std::sync::Arc;
use tracing::debug;

/// A handle on one asset.
pub struct Asset<T: Transport> {
    ctx: Arc<StackContext<T>>,
    uid: String,
    params: QueryParams,
}

impl<T: Transport> Clone for Asset<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            uid: self.uid.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T: Transport> Asset<T> {
    pub(crate) fn new(ctx: Arc<StackContext<T>>, uid: String) -> Self {
        Self {
            ctx,
            uid,
            params: QueryParams::new(),
        }
    }

    /// Returns the asset uid.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the parameters collected so far.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Sets the locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.params.set("locale", locale);
        self
    }

    /// Fetches a specific published version.
    pub fn version(mut self, version: u32) -> Self {
        self.params.set("version", version.to_string());
        self
    }

    /// Adds image dimensions.
    pub fn include_dimension(mut self) -> Self {
        self.params.set_flag("include_dimension", true);
        self
    }

    /// Falls back to the parent locale.
    pub fn include_fallback(mut self) -> Self {
        self.params.set_flag("include_fallback", true);
        self
    }

    /// Adds asset metadata.
    pub fn include_metadata(mut self) -> Self {
        self.params.set_flag("include_metadata", true);
        self
    }

    /// Adds branch information.
    pub fn include_branch(mut self) -> Self {
        self.params.set_flag("include_branch", true);
        self
    }

    /// Sets an arbitrary parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Fetches the asset.
    pub fn fetch(&self) -> Result<Value> {
        let request = ApiRequest::delivery(format!("/assets/{}", segment(&self.uid)))
            .with_params(self.params.clone());
        Ok(Envelope::Asset.extract(self.ctx.send(&request)?)?)
    }
}

/// A query over the stack's assets.
pub struct AssetQuery<T: Transport> {
    ctx: Arc<StackContext<T>>,
    state: QueryState,
}

impl<T: Transport> Clone for AssetQuery<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            state: self.state.clone(),
        }
    }
}

impl<T: Transport> BaseQuery for AssetQuery<T> {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }
}

impl<T: Transport> AssetQuery<T> {
    pub(crate) fn new(ctx: Arc<StackContext<T>>) -> Self {
        Self {
            ctx,
            state: QueryState::default(),
        }
    }

    /// Sets the locale.
    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.param("locale", locale)
    }

    /// Adds image dimensions.
    pub fn include_dimension(mut self) -> Self {
        self.state.params_mut().set_flag("include_dimension", true);
        self
    }

    /// Falls back to the parent locale.
    pub fn include_fallback(mut self) -> Self {
        self.state.params_mut().set_flag("include_fallback", true);
        self
    }

    /// Adds asset metadata.
    pub fn include_metadata(mut self) -> Self {
        self.state.params_mut().set_flag("include_metadata", true);
        self
    }

    /// Returns URLs relative to the asset host.
    pub fn relative_url(mut self) -> Self {
        self.state.params_mut().set_flag("relative_urls", true);
        self
    }

    /// Runs the query.
    pub fn find(&self) -> Result<QueryResult> {
        let request = ApiRequest::delivery("/assets").with_params(self.state.to_params());
        let response = self.ctx.send(&request)?;
        let count = response_count(&response);
        let items = Envelope::Assets.extract_list(response)?;
        debug!(assets = items.len(), "asset query returned");
        Ok(QueryResult { items, count })
    }
}
