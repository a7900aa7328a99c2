//! Single entry fetch.

use crate::error::Result;
use crate::live_preview;
use crate::stack::{segment, StackContext};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{Envelope, QueryParams, Value};
use std::sync::Arc;
use tracing::debug;

/// A handle on one entry of a content type.
pub struct Entry<T: Transport> {
    ctx: Arc<StackContext<T>>,
    content_type_uid: String,
    uid: String,
    params: QueryParams,
}

impl<T: Transport> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            content_type_uid: self.content_type_uid.clone(),
            uid: self.uid.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T: Transport> Entry<T> {
    pub(crate) fn new(ctx: Arc<StackContext<T>>, content_type_uid: String, uid: String) -> Self {
        Self {
            ctx,
            content_type_uid,
            uid,
            params: QueryParams::new(),
        }
    }

    /// Returns the entry uid.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the content type uid.
    pub fn content_type_uid(&self) -> &str {
        &self.content_type_uid
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

    /// Falls back to the parent locale if the entry is not localized.
    pub fn include_fallback(mut self) -> Self {
        self.params.set_flag("include_fallback", true);
        self
    }

    /// Adds branch information.
    pub fn include_branch(mut self) -> Self {
        self.params.set_flag("include_branch", true);
        self
    }

    /// Adds entry metadata.
    pub fn include_metadata(mut self) -> Self {
        self.params.set_flag("include_metadata", true);
        self
    }

    /// Resolves embedded items in rich text fields.
    pub fn include_embedded_items(mut self) -> Self {
        self.params.push_unique("include_embedded_items[]", "BASE");
        self
    }

    /// Includes the content type schema.
    pub fn include_content_type(mut self) -> Self {
        self.params.set_flag("include_content_type", true);
        self.params.set_flag("include_global_field_schema", true);
        self
    }

    /// Adds `_content_type_uid` to referenced entries.
    pub fn include_reference_content_type_uid(mut self) -> Self {
        self.params
            .set_flag("include_reference_content_type_uid", true);
        self
    }

    /// Expands reference fields.
    pub fn include_reference<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.params.push_unique("include[]", field);
        }
        self
    }

    /// Returns only these top-level fields.
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.params.push_unique("only[BASE][]", field);
        }
        self
    }

    /// Returns every top-level field except these.
    pub fn excepts<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.params.push_unique("except[BASE][]", field);
        }
        self
    }

    /// Sets an arbitrary parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Fetches the entry.
    ///
    /// When a live preview query is stored for this entry, the draft is fetched
    /// from the preview host and merged over the published entry.
    pub fn fetch(&self) -> Result<Value> {
        let path = format!(
            "/content_types/{}/entries/{}",
            segment(&self.content_type_uid),
            segment(&self.uid)
        );
        let response = self
            .ctx
            .send(&ApiRequest::delivery(path).with_params(self.params.clone()))?;
        let mut entry = Envelope::Entry.extract(response)?;
        debug!(content_type = %self.content_type_uid, entry = %self.uid, "entry fetched");

        if let Some(preview) = self
            .ctx
            .live_preview_for(&self.content_type_uid, Some(&self.uid))
        {
            live_preview::overlay_draft(
                &self.ctx,
                &preview,
                &self.uid,
                &self.params,
                std::slice::from_mut(&mut entry),
            )?;
        }

        Ok(entry)
    }
}
