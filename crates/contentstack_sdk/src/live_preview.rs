//! Live preview: fetch the draft an editor is viewing and lay it over the
//! published entry.

use crate::error::{Error, Result};
use crate::stack::{segment, StackContext};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{deep_merge, Envelope, QueryParams, Value};
use tracing::debug;

/// The query the preview iframe passes to the site being previewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePreviewQuery {
    /// Preview session hash, sent as the `live_preview` header.
    pub live_preview: String,
    /// Content type being edited.
    pub content_type_uid: String,
    /// Entry being edited, if known.
    pub entry_uid: Option<String>,
}

impl LivePreviewQuery {
    /// Creates a live preview query.
    pub fn new(live_preview: impl Into<String>, content_type_uid: impl Into<String>) -> Self {
        Self {
            live_preview: live_preview.into(),
            content_type_uid: content_type_uid.into(),
            entry_uid: None,
        }
    }

    /// Sets the entry being edited.
    pub fn with_entry_uid(mut self, entry_uid: impl Into<String>) -> Self {
        self.entry_uid = Some(entry_uid.into());
        self
    }
}

/// Builds the request for a draft entry on the preview host.
pub(crate) fn draft_request<T: Transport>(
    ctx: &StackContext<T>,
    query: &LivePreviewQuery,
    entry_uid: &str,
    params: &QueryParams,
) -> Result<ApiRequest> {
    let live_preview = ctx
        .config
        .active_live_preview()
        .ok_or_else(|| Error::Config("live preview is not enabled".into()))?;
    let (auth_name, auth_value) = live_preview
        .auth_header()
        .ok_or_else(|| Error::Config("live preview has no token".into()))?;

    let path = format!(
        "/content_types/{}/entries/{}",
        segment(&query.content_type_uid),
        segment(entry_uid)
    );
    Ok(ApiRequest::preview(path)
        .with_params(params.clone())
        .with_header("live_preview", query.live_preview.as_str())
        .with_header(auth_name, auth_value))
}

/// Fetches the draft for an entry and merges it onto the published records
/// that share its uid.
pub(crate) fn overlay_draft<T: Transport>(
    ctx: &StackContext<T>,
    query: &LivePreviewQuery,
    entry_uid: &str,
    params: &QueryParams,
    published: &mut [Value],
) -> Result<()> {
    let request = draft_request(ctx, query, entry_uid, params)?;
    let draft = Envelope::Entry.extract(ctx.send(&request)?)?;
    debug!(
        content_type = %query.content_type_uid,
        entry = entry_uid,
        "merging live preview draft"
    );
    deep_merge(published, std::slice::from_ref(&draft))?;
    Ok(())
}
