//! Content type handle.

use crate::entry::Entry;
use crate::error::Result;
use crate::query::Query;
use crate::stack::{segment, StackContext};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{Envelope, QueryParams, Value};
use std::sync::Arc;

/// A handle on a content type: fetch its schema, or reach its entries.
pub struct ContentType<T: Transport> {
    ctx: Arc<StackContext<T>>,
    uid: String,
    params: QueryParams,
}

impl<T: Transport> Clone for ContentType<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            uid: self.uid.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T: Transport> ContentType<T> {
    pub(crate) fn new(ctx: Arc<StackContext<T>>, uid: String) -> Self {
        Self {
            ctx,
            uid,
            params: QueryParams::new(),
        }
    }

    /// Returns the content type uid.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Expands global field schemas when fetching.
    pub fn include_global_field_schema(mut self) -> Self {
        self.params.set_flag("include_global_field_schema", true);
        self
    }

    /// Fetches the content type schema.
    pub fn fetch(&self) -> Result<Value> {
        let request = ApiRequest::delivery(format!("/content_types/{}", segment(&self.uid)))
            .with_params(self.params.clone());
        Ok(Envelope::ContentType.extract(self.ctx.send(&request)?)?)
    }

    /// Returns a handle on one entry.
    pub fn entry(&self, uid: impl Into<String>) -> Entry<T> {
        Entry::new(Arc::clone(&self.ctx), self.uid.clone(), uid.into())
    }

    /// Returns a query over this content type's entries.
    pub fn query(&self) -> Query<T> {
        Query::new(Arc::clone(&self.ctx), self.uid.clone())
    }
}
