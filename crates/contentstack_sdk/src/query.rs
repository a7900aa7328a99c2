//! Query builders.
//!
//! [`BaseQuery`] holds what entry and asset queries share: paging, ordering,
//! counts and `where` conditions. Conditions are collected into one JSON
//! object and sent as the `query` parameter.

use crate::error::{Error, Result};
use crate::live_preview;
use crate::stack::{segment, StackContext};
use crate::transport::{ApiRequest, Transport};
use contentstack_protocol::{response_count, Envelope, Map, QueryParams, Value};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A comparison applied to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperation {
    /// Field equals the value.
    Equals(Value),
    /// Field does not equal the value.
    NotEquals(Value),
    /// Field equals one of the values.
    Includes(Vec<Value>),
    /// Field equals none of the values.
    Excludes(Vec<Value>),
    /// Field is less than the value.
    IsLessThan(Value),
    /// Field is less than or equal to the value.
    IsLessThanOrEqual(Value),
    /// Field is greater than the value.
    IsGreaterThan(Value),
    /// Field is greater than or equal to the value.
    IsGreaterThanOrEqual(Value),
    /// Field is (or is not) present.
    Exists(bool),
    /// Field matches a regular expression.
    Matches(String),
}

impl QueryOperation {
    /// Renders the condition placed under the field name.
    pub fn to_condition(&self) -> Value {
        fn op(name: &str, value: Value) -> Value {
            let mut map = Map::new();
            map.insert(name.to_string(), value);
            Value::Object(map)
        }

        match self {
            QueryOperation::Equals(value) => value.clone(),
            QueryOperation::NotEquals(value) => op("$ne", value.clone()),
            QueryOperation::Includes(values) => op("$in", Value::Array(values.clone())),
            QueryOperation::Excludes(values) => op("$nin", Value::Array(values.clone())),
            QueryOperation::IsLessThan(value) => op("$lt", value.clone()),
            QueryOperation::IsLessThanOrEqual(value) => op("$lte", value.clone()),
            QueryOperation::IsGreaterThan(value) => op("$gt", value.clone()),
            QueryOperation::IsGreaterThanOrEqual(value) => op("$gte", value.clone()),
            QueryOperation::Exists(present) => op("$exists", Value::Bool(*present)),
            QueryOperation::Matches(pattern) => op("$regex", Value::String(pattern.clone())),
        }
    }
}

/// Parameters and conditions accumulated by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    params: QueryParams,
    conditions: Map<String, Value>,
}

impl QueryState {
    /// Returns the plain parameters.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Returns the plain parameters for modification.
    pub fn params_mut(&mut self) -> &mut QueryParams {
        &mut self.params
    }

    /// Returns the `where` conditions.
    pub fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }

    /// Adds a condition on a field.
    ///
    /// Operator conditions on the same field are combined
    /// (`{"$gt": 1}` then `{"$lt": 9}` gives `{"$gt": 1, "$lt": 9}`);
    /// anything else replaces the previous condition.
    pub fn add_condition(&mut self, field: impl Into<String>, condition: Value) {
        let field = field.into();
        if let (Some(Value::Object(existing)), Value::Object(new)) =
            (self.conditions.get_mut(&field), &condition)
        {
            if is_operator_map(existing) && is_operator_map(new) {
                existing.extend(new.clone());
                return;
            }
        }
        self.conditions.insert(field, condition);
    }

    /// Renders the conditions as the `query` JSON string.
    pub fn query_json(&self) -> Option<String> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(Value::Object(self.conditions.clone()).to_string())
        }
    }

    /// Renders the parameters that still apply when fetching a single record:
    /// paging, ordering, search and `where` conditions are dropped.
    pub fn entry_params(&self) -> QueryParams {
        let mut params = self.params.clone();
        for key in LIST_ONLY_PARAMS {
            params.remove(key);
        }
        params
    }

    /// Renders the full parameter list, including `query`.
    pub fn to_params(&self) -> QueryParams {
        let mut params = self.params.clone();
        if let Some(query) = self.query_json() {
            params.set("query", query);
        }
        params
    }
}

/// Parameters that only apply to list endpoints.
const LIST_ONLY_PARAMS: [&str; 7] = [
    "skip",
    "limit",
    "include_count",
    "asc",
    "desc",
    "query",
    "typeahead",
];

fn is_operator_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

/// Builder methods shared by [`Query`] and [`crate::AssetQuery`].
pub trait BaseQuery: Sized {
    /// Returns the accumulated state.
    fn state(&self) -> &QueryState;

    /// Returns the accumulated state for modification.
    fn state_mut(&mut self) -> &mut QueryState;

    /// Limits the number of records returned.
    fn limit(mut self, limit: u32) -> Self {
        self.state_mut().params.set("limit", limit.to_string());
        self
    }

    /// Skips records.
    fn skip(mut self, skip: u32) -> Self {
        self.state_mut().params.set("skip", skip.to_string());
        self
    }

    /// Sorts ascending by a field.
    fn order_by_ascending(mut self, field: impl Into<String>) -> Self {
        let params = &mut self.state_mut().params;
        params.remove("desc");
        params.set("asc", field);
        self
    }

    /// Sorts descending by a field.
    fn order_by_descending(mut self, field: impl Into<String>) -> Self {
        let params = &mut self.state_mut().params;
        params.remove("asc");
        params.set("desc", field);
        self
    }

    /// Asks for the total number of matches.
    fn include_count(mut self) -> Self {
        self.state_mut().params.set_flag("include_count", true);
        self
    }

    /// Sets an arbitrary parameter.
    fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state_mut().params.set(key, value);
        self
    }

    /// Removes a parameter.
    fn remove_param(mut self, key: &str) -> Self {
        self.state_mut().params.remove(key);
        self
    }

    /// Adds a `where` condition.
    fn where_clause(mut self, field: impl Into<String>, operation: QueryOperation) -> Self {
        self.state_mut()
            .add_condition(field, operation.to_condition());
        self
    }

    /// Returns the `query` JSON string, if any conditions were added.
    fn query_json(&self) -> Option<String> {
        self.state().query_json()
    }
}

/// Records returned by a list call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// The records.
    pub items: Vec<Value>,
    /// Total number of matches, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// A query over the entries of one content type.
pub struct Query<T: Transport> {
    ctx: Arc<StackContext<T>>,
    content_type_uid: String,
    state: QueryState,
}

impl<T: Transport> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            content_type_uid: self.content_type_uid.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: Transport> BaseQuery for Query<T> {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }
}

impl<T: Transport> Query<T> {
    pub(crate) fn new(ctx: Arc<StackContext<T>>, content_type_uid: String) -> Self {
        Self {
            ctx,
            content_type_uid,
            state: QueryState::default(),
        }
    }

    /// Returns the content type being queried.
    pub fn content_type_uid(&self) -> &str {
        &self.content_type_uid
    }

    /// Sets the locale.
    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.param("locale", locale)
    }

    /// Falls back to the parent locale for unlocalized entries.
    pub fn include_fallback(mut self) -> Self {
        self.state.params.set_flag("include_fallback", true);
        self
    }

    /// Expands reference fields.
    pub fn include_reference<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.state.params.push_unique("include[]", field);
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
            self.state.params.push_unique("only[BASE][]", field);
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
            self.state.params.push_unique("except[BASE][]", field);
        }
        self
    }

    /// Includes the content type schema in the response.
    pub fn include_content_type(mut self) -> Self {
        self.state.params.set_flag("include_content_type", true);
        self.state
            .params
            .set_flag("include_global_field_schema", true);
        self
    }

    /// Adds `_content_type_uid` to referenced entries.
    pub fn include_reference_content_type_uid(mut self) -> Self {
        self.state
            .params
            .set_flag("include_reference_content_type_uid", true);
        self
    }

    /// Resolves embedded items in rich text fields.
    pub fn include_embedded_items(mut self) -> Self {
        self.state
            .params
            .push_unique("include_embedded_items[]", "BASE");
        self
    }

    /// Adds branch information to each entry.
    pub fn include_branch(mut self) -> Self {
        self.state.params.set_flag("include_branch", true);
        self
    }

    /// Adds entry metadata.
    pub fn include_metadata(mut self) -> Self {
        self.state.params.set_flag("include_metadata", true);
        self
    }

    /// Matches entries carrying any of these tags.
    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags.into_iter().map(|t| Value::String(t.into())).collect();
        self.where_clause("tags", QueryOperation::Includes(tags))
    }

    /// Full-text search.
    pub fn search(self, text: impl Into<String>) -> Self {
        self.param("typeahead", text)
    }

    /// Matches entries satisfying every sub-query.
    pub fn and(self, queries: &[Query<T>]) -> Self {
        self.combine("$and", queries)
    }

    /// Matches entries satisfying any sub-query.
    pub fn or(self, queries: &[Query<T>]) -> Self {
        self.combine("$or", queries)
    }

    fn combine(mut self, operator: &str, queries: &[Query<T>]) -> Self {
        let clauses = queries
            .iter()
            .map(|q| Value::Object(q.state.conditions.clone()))
            .collect();
        self.state.add_condition(operator, Value::Array(clauses));
        self
    }

    /// Matches entries whose reference field points at entries matching
    /// `query`.
    pub fn where_in(mut self, reference_field: impl Into<String>, query: &Query<T>) -> Self {
        let mut condition = Map::new();
        condition.insert(
            "$in_query".into(),
            Value::Object(query.state.conditions.clone()),
        );
        self.state
            .add_condition(reference_field, Value::Object(condition));
        self
    }

    /// Matches entries whose reference field points at no entry matching
    /// `query`.
    pub fn where_not_in(mut self, reference_field: impl Into<String>, query: &Query<T>) -> Self {
        let mut condition = Map::new();
        condition.insert(
            "$nin_query".into(),
            Value::Object(query.state.conditions.clone()),
        );
        self.state
            .add_condition(reference_field, Value::Object(condition));
        self
    }

    fn path(&self) -> String {
        format!("/content_types/{}/entries", segment(&self.content_type_uid))
    }

    /// Runs the query.
    ///
    /// With live preview active for this content type and an entry uid in the
    /// preview query, the draft is merged into the matching entry.
    pub fn find(&self) -> Result<QueryResult> {
        let params = self.state.to_params();
        let response = self
            .ctx
            .send(&ApiRequest::delivery(self.path()).with_params(params))?;
        let count = response_count(&response);
        let mut items = Envelope::Entries.extract_list(response)?;
        debug!(content_type = %self.content_type_uid, entries = items.len(), "query returned");

        if let Some(preview) = self.ctx.live_preview_for(&self.content_type_uid, None) {
            if let Some(entry_uid) = preview.entry_uid.clone() {
                let draft_params = self.state.entry_params();
                live_preview::overlay_draft(
                    &self.ctx,
                    &preview,
                    &entry_uid,
                    &draft_params,
                    &mut items,
                )?;
            }
        }

        Ok(QueryResult { items, count })
    }

    /// Runs the query for a single entry.
    pub fn find_one(&self) -> Result<Value> {
        let query = self.clone().limit(1);
        query.find()?.items.into_iter().next().ok_or_else(|| {
            Error::NotFound(format!(
                "no entry of content type {} matched the query",
                self.content_type_uid
            ))
        })
    }
}
