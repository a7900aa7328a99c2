//! Sync command implementation.

use super::{print_json, CliError, SyncArgs};
use contentstack_sdk::{Error, Stack, SyncRequest};
use tracing::warn;

/// Builds the sync request described by the flags.
pub fn request(args: &SyncArgs) -> Result<SyncRequest, CliError> {
    let starts = [
        args.init,
        args.sync_token.is_some(),
        args.pagination_token.is_some(),
    ];
    if starts.iter().filter(|s| **s).count() != 1 {
        return Err(CliError::SyncStart);
    }

    if let Some(token) = &args.pagination_token {
        return Ok(SyncRequest::pagination(token.as_str()));
    }
    if let Some(token) = &args.sync_token {
        return Ok(SyncRequest::since(token.as_str()));
    }

    let mut request = SyncRequest::init();
    if let Some(content_type) = &args.content_type {
        request = request.with_content_type_uid(content_type.as_str());
    }
    if let Some(locale) = &args.locale {
        request = request.with_locale(locale.as_str());
    }
    if let Some(from_date) = &args.from_date {
        request = request.with_from_date(from_date.as_str());
    }
    if let Some(publish_type) = args.publish_type {
        request = request.with_publish_type(publish_type);
    }
    Ok(request)
}

/// Runs the sync and prints the outcome.
///
/// On failure the items received so far are reported before the error.
pub fn run(stack: &Stack, args: &SyncArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = request(args)?;
    match stack.sync(&request) {
        Ok(outcome) => print_json(&outcome),
        Err(err) => {
            if let Some(items) = err.partial_items() {
                warn!(items = items.len(), "sync failed; discarding partial items");
            }
            if let Error::SyncTransport {
                last_cursor: Some(cursor),
                ..
            } = &err
            {
                warn!(cursor = %cursor, "resume with --pagination-token or --sync-token");
            }
            Err(err.into())
        }
    }
}
