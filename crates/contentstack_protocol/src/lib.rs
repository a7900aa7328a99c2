//! # Contentstack Protocol
//!
//! Wire types for the Contentstack Content Delivery API.
//!
//! This crate provides:
//! - [`Envelope`] dispatch over the top-level response keys
//! - [`QueryParams`] for building request query strings
//! - [`SyncRequest`], [`SyncResponse`] and [`SyncItem`] for the sync endpoint
//! - [`deep_merge`] for overlaying live preview drafts onto published entries
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod error;
mod merge;
mod params;
mod sync;

pub use envelope::{response_count, Envelope};
pub use error::{ProtocolError, ProtocolResult};
pub use merge::{deep_merge, record_uid};
pub use params::QueryParams;
pub use sync::{SyncContinuation, SyncItem, SyncItemType, SyncRequest, SyncResponse};

/// Re-exported so callers can build and inspect payloads without a direct
/// `serde_json` dependency.
pub use serde_json::{Map, Value};
