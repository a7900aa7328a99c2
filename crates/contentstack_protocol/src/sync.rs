//! Sync endpoint payloads.
//!
//! The sync endpoint is a change feed. A caller starts with `init=true`,
//! follows `pagination_token`s while the server has more pages, and keeps the
//! final `sync_token` to ask for changes since that point next time.

use crate::envelope::kind_of;
use crate::error::{ProtocolError, ProtocolResult};
use crate::params::QueryParams;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of change a sync item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncItemType {
    /// An entry was published.
    EntryPublished,
    /// An entry was unpublished.
    EntryUnpublished,
    /// An entry was deleted.
    EntryDeleted,
    /// An asset was published.
    AssetPublished,
    /// An asset was unpublished.
    AssetUnpublished,
    /// An asset was deleted.
    AssetDeleted,
    /// A content type was deleted.
    ContentTypeDeleted,
}

impl SyncItemType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncItemType::EntryPublished => "entry_published",
            SyncItemType::EntryUnpublished => "entry_unpublished",
            SyncItemType::EntryDeleted => "entry_deleted",
            SyncItemType::AssetPublished => "asset_published",
            SyncItemType::AssetUnpublished => "asset_unpublished",
            SyncItemType::AssetDeleted => "asset_deleted",
            SyncItemType::ContentTypeDeleted => "content_type_deleted",
        }
    }

    /// Returns true for entry events.
    pub fn is_entry(&self) -> bool {
        matches!(
            self,
            SyncItemType::EntryPublished | SyncItemType::EntryUnpublished | SyncItemType::EntryDeleted
        )
    }

    /// Returns true for asset events.
    pub fn is_asset(&self) -> bool {
        matches!(
            self,
            SyncItemType::AssetPublished | SyncItemType::AssetUnpublished | SyncItemType::AssetDeleted
        )
    }

    /// Returns true if the record should be removed from a local replica.
    pub fn is_removal(&self) -> bool {
        !matches!(
            self,
            SyncItemType::EntryPublished | SyncItemType::AssetPublished
        )
    }
}

impl fmt::Display for SyncItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncItemType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry_published" => Ok(SyncItemType::EntryPublished),
            "entry_unpublished" => Ok(SyncItemType::EntryUnpublished),
            "entry_deleted" => Ok(SyncItemType::EntryDeleted),
            "asset_published" => Ok(SyncItemType::AssetPublished),
            "asset_unpublished" => Ok(SyncItemType::AssetUnpublished),
            "asset_deleted" => Ok(SyncItemType::AssetDeleted),
            "content_type_deleted" => Ok(SyncItemType::ContentTypeDeleted),
            other => Err(ProtocolError::UnknownItemType(other.to_string())),
        }
    }
}

/// One change record from the sync feed. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncItem {
    /// Kind of change.
    #[serde(rename = "type")]
    pub item_type: SyncItemType,
    /// Content type of the entry, for entry events and content type deletions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_uid: Option<String>,
    /// Server timestamp of the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_at: Option<String>,
    /// Opaque record payload.
    pub data: Value,
}

impl SyncItem {
    /// Decodes an item from the wire.
    pub fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ProtocolError::invalid_structure("sync item is not an object"))?;

        let item_type = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::invalid_structure("sync item is missing `type`"))?
            .parse::<SyncItemType>()?;

        let content_type_uid = optional_string(map, "content_type_uid")?;
        let event_at = optional_string(map, "event_at")?;
        let data = map.get("data").cloned().unwrap_or(Value::Null);

        Ok(Self {
            item_type,
            content_type_uid,
            event_at,
            data,
        })
    }

    /// Returns the `uid` of the changed record, if the payload carries one.
    pub fn uid(&self) -> Option<&str> {
        self.data.get("uid").and_then(Value::as_str)
    }
}

/// What a sync response tells the caller to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncContinuation {
    /// More pages remain; request the next one with this token.
    Paginate(String),
    /// The feed is at its current edge; persist this token for the next sync.
    Complete(String),
    /// The server returned neither token.
    Exhausted,
}

/// A decoded sync response page.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResponse {
    /// Change records in server order.
    pub items: Vec<SyncItem>,
    /// Offset of this page.
    pub skip: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Total number of items in the sync sequence.
    pub total_count: Option<u64>,
    /// Token for the next incremental sync.
    pub sync_token: Option<String>,
    /// Token for the next page of this sync.
    pub pagination_token: Option<String>,
}

impl SyncResponse {
    /// Decodes a sync response.
    ///
    /// `items` must be present and be a list; tokens, when present, must be
    /// strings. Nothing is defaulted.
    pub fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            ProtocolError::invalid_structure(format!(
                "expected sync response object, got {}",
                kind_of(value)
            ))
        })?;

        let raw_items = map
            .get("items")
            .ok_or(ProtocolError::MissingEnvelope("items"))?
            .as_array()
            .ok_or_else(|| ProtocolError::invalid_structure("`items` is not a list"))?;

        let items = raw_items
            .iter()
            .map(SyncItem::from_value)
            .collect::<ProtocolResult<Vec<_>>>()?;

        Ok(Self {
            items,
            skip: optional_u64(map, "skip")?,
            limit: optional_u64(map, "limit")?,
            total_count: optional_u64(map, "total_count")?,
            sync_token: optional_string(map, "sync_token")?,
            pagination_token: optional_string(map, "pagination_token")?,
        })
    }

    /// Decides how to continue.
    ///
    /// The two tokens are treated as mutually exclusive; if a server sends
    /// both, the pagination token wins. Empty tokens count as absent.
    pub fn continuation(&self) -> SyncContinuation {
        match (non_empty(&self.pagination_token), non_empty(&self.sync_token)) {
            (Some(token), _) => SyncContinuation::Paginate(token.to_string()),
            (None, Some(token)) => SyncContinuation::Complete(token.to_string()),
            (None, None) => SyncContinuation::Exhausted,
        }
    }
}

/// Parameters for one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRequest {
    /// Start a fresh sync from the beginning.
    pub init: bool,
    /// Continue a paginated sync.
    pub pagination_token: Option<String>,
    /// Fetch changes since a previous sync.
    pub sync_token: Option<String>,
    /// Restrict an initial sync to one content type.
    pub content_type_uid: Option<String>,
    /// Restrict an initial sync to changes since this ISO 8601 date.
    pub from_date: Option<String>,
    /// Restrict an initial sync to one locale.
    pub locale: Option<String>,
    /// Restrict an initial sync to one kind of change.
    pub publish_type: Option<SyncItemType>,
}

impl SyncRequest {
    /// Creates an initial sync request.
    pub fn init() -> Self {
        Self {
            init: true,
            ..Self::default()
        }
    }

    /// Creates a request for the next page of a sync.
    pub fn pagination(token: impl Into<String>) -> Self {
        Self {
            pagination_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Creates a request for changes since a previous sync.
    pub fn since(sync_token: impl Into<String>) -> Self {
        Self {
            sync_token: Some(sync_token.into()),
            ..Self::default()
        }
    }

    /// Restricts to a content type.
    pub fn with_content_type_uid(mut self, uid: impl Into<String>) -> Self {
        self.content_type_uid = Some(uid.into());
        self
    }

    /// Restricts to changes since a date.
    pub fn with_from_date(mut self, date: impl Into<String>) -> Self {
        self.from_date = Some(date.into());
        self
    }

    /// Restricts to a locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Restricts to a kind of change.
    pub fn with_publish_type(mut self, publish_type: SyncItemType) -> Self {
        self.publish_type = Some(publish_type);
        self
    }

    fn has_filters(&self) -> bool {
        self.content_type_uid.is_some()
            || self.from_date.is_some()
            || self.locale.is_some()
            || self.publish_type.is_some()
    }

    /// Checks that exactly one starting point is set and that filters only
    /// accompany an initial sync.
    pub fn validate(&self) -> ProtocolResult<()> {
        let starts = [
            self.init,
            self.pagination_token.is_some(),
            self.sync_token.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if starts != 1 {
            return Err(ProtocolError::InvalidSyncRequest(
                "exactly one of init, pagination_token or sync_token must be set".into(),
            ));
        }
        if non_empty(&self.pagination_token).is_none() && self.pagination_token.is_some() {
            return Err(ProtocolError::InvalidSyncRequest(
                "pagination_token is empty".into(),
            ));
        }
        if non_empty(&self.sync_token).is_none() && self.sync_token.is_some() {
            return Err(ProtocolError::InvalidSyncRequest("sync_token is empty".into()));
        }
        if !self.init && self.has_filters() {
            return Err(ProtocolError::InvalidSyncRequest(
                "filters are only accepted on an initial sync".into(),
            ));
        }
        Ok(())
    }

    /// Renders the wire parameters.
    ///
    /// A token request carries only its token; filters are sent only with
    /// `init`.
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();

        if let Some(token) = &self.pagination_token {
            params.set("pagination_token", token.as_str());
            return params;
        }
        if let Some(token) = &self.sync_token {
            params.set("sync_token", token.as_str());
            return params;
        }

        params.set_flag("init", self.init);
        if let Some(uid) = &self.content_type_uid {
            params.set("content_type_uid", uid.as_str());
        }
        if let Some(date) = &self.from_date {
            params.set("start_from", date.as_str());
        }
        if let Some(locale) = &self.locale {
            params.set("locale", locale.as_str());
        }
        if let Some(publish_type) = self.publish_type {
            params.set("type", publish_type.as_str());
        }
        params
    }
}

fn non_empty(token: &Option<String>) -> Option<&str> {
    token.as_deref().filter(|t| !t.is_empty())
}

fn optional_string(map: &Map<String, Value>, key: &str) -> ProtocolResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ProtocolError::invalid_structure(format!(
            "`{}` should be a string, got {}",
            key,
            kind_of(other)
        ))),
    }
}

fn optional_u64(map: &Map<String, Value>, key: &str) -> ProtocolResult<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            ProtocolError::invalid_structure(format!(
                "`{}` should be a non-negative integer, got {}",
                key,
                kind_of(value)
            ))
        }),
    }
}
