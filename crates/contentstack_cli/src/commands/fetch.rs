//! Entry, asset and content type commands.

use super::print_json;
use contentstack_sdk::{BaseQuery, ContentTypesOptions, Stack};
use tracing::info;

/// Prints one entry.
pub fn entry(
    stack: &Stack,
    content_type: &str,
    uid: &str,
    locale: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut entry = stack.content_type(content_type).entry(uid);
    if let Some(locale) = locale {
        entry = entry.locale(locale);
    }
    print_json(&entry.fetch()?)
}

/// Prints the entries of a content type.
pub fn entries(
    stack: &Stack,
    content_type: &str,
    limit: Option<u32>,
    skip: Option<u32>,
    locale: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut query = stack.content_type(content_type).query().include_count();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(skip) = skip {
        query = query.skip(skip);
    }
    if let Some(locale) = locale {
        query = query.locale(locale);
    }

    let result = query.find()?;
    info!(content_type, returned = result.items.len(), count = ?result.count, "entries fetched");
    print_json(&result)
}

/// Prints one asset.
pub fn asset(stack: &Stack, uid: &str) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&stack.asset(uid).fetch()?)
}

/// Prints the stack's assets.
pub fn assets(stack: &Stack, limit: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let mut query = stack.asset_query().include_count();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    print_json(&query.find()?)
}

/// Prints the stack's content types.
pub fn content_types(stack: &Stack) -> Result<(), Box<dyn std::error::Error>> {
    let options = ContentTypesOptions {
        include_count: true,
        ..ContentTypesOptions::default()
    };
    print_json(&stack.content_types(&options)?)
}
