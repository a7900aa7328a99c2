//! # Contentstack SDK
//!
//! Blocking client for the Contentstack Content Delivery API.
//!
//! This crate provides:
//! - [`Stack`] configuration and the entry point for every call
//! - Entry, asset and content type fetches and queries
//! - The sync walker, which follows pagination tokens to a sync token
//! - Live preview, which overlays draft entries onto published ones
//! - HTTP transport abstraction with a scripted [`MockTransport`]
//!
//! ## Architecture
//!
//! Every call goes through a [`Transport`]. [`HttpTransport`] adds the stack
//! headers and `environment` parameter and maps replies to errors; the
//! actual HTTP client sits behind [`HttpClient`] so the whole stack can be
//! exercised without a network.
//!
//! ## Key Invariants
//!
//! - A sync walk issues one request per page, strictly in sequence
//! - Follow-up sync calls carry only the `pagination_token`
//! - Sync failures carry every item received before the failure
//! - A draft is merged only into published records with the same `uid`
//! - Nothing is retried

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod config;
mod content_type;
mod entry;
mod error;
mod http;
mod image;
mod live_preview;
mod query;
mod stack;
mod sync;
mod transport;

pub use asset::{Asset, AssetQuery};
pub use config::{
    LivePreviewConfig, Region, StackConfig, DEFAULT_API_VERSION, DEFAULT_PREVIEW_HOST,
};
pub use content_type::ContentType;
pub use entry::Entry;
pub use error::{Error, Result};
pub use http::{HttpClient, HttpResponse, HttpTransport, ReqwestClient, USER_AGENT};
pub use image::transform_url;
pub use live_preview::LivePreviewQuery;
pub use query::{BaseQuery, Query, QueryOperation, QueryResult, QueryState};
pub use stack::{ContentTypesOptions, Stack};
pub use sync::{SyncOutcome, SyncWalker};
pub use transport::{ApiRequest, HostKind, MockTransport, Transport};

pub use contentstack_protocol::{
    deep_merge, Envelope, Map, ProtocolError, QueryParams, SyncItem, SyncItemType, SyncRequest,
    Value,
};
