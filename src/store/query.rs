//! Query builder for composing filters over an entity collection.
//!
//! The store only understands equality and range predicates, so:
//! - prefix search is expressed as the half-open range `[p, successor(p))`
//! - "contains" search downloads the filtered set and matches client-side

use std::collections::HashSet;
use std::marker::PhantomData;

use futures::TryStreamExt;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::store::criteria::{Criteria, QueryOptions};
use crate::store::document::Document;
use crate::store::filter::{Filter, FilterOp, StructuredQuery};
use crate::store::path::CollectionPath;
use crate::store::traits::{DocumentConverter, DocumentStore};

/// A composable query over a collection of `T`.
///
/// Builder methods accumulate constraints; nothing touches the store until a
/// terminal method (`fetch_all`, `fetch_one`, `either_contains`) is awaited.
///
/// # Example
///
/// ```ignore
/// let active = categories
///     .where_equal(criteria!(state = true), QueryOptions::default())
///     .where_starts_with(criteria!(lower = "cof"))
///     .limit(10)
///     .fetch_all()
///     .await?;
/// ```
pub struct QueryBuilder<'a, T> {
    store: &'a dyn DocumentStore,
    query: StructuredQuery,
    invalid: Option<AppError>,
    _entity: PhantomData<fn() -> T>,
}

impl<'a, T: DocumentConverter> QueryBuilder<'a, T> {
    pub fn new(store: &'a dyn DocumentStore, collection: CollectionPath) -> Self {
        Self {
            store,
            query: StructuredQuery::new(collection),
            invalid: None,
            _entity: PhantomData,
        }
    }

    /// Adds one equality constraint per pair (AND).
    pub fn where_equal(mut self, criteria: Criteria) -> Self {
        self.defer(criteria.validate());
        for (field, value) in criteria.iter() {
            self.query = self.query.filter(Filter::equal(field, value.clone()));
        }
        self
    }

    /// Adds a prefix constraint per pair as a `>= start AND < end` range.
    ///
    /// An empty prefix adds no constraint. A prefix whose last character has
    /// no successor (`char::MAX`), a non-string value or rejected criteria
    /// make the query fail when it is executed.
    pub fn where_starts_with(mut self, criteria: Criteria) -> Self {
        self.defer(criteria.validate());
        for (field, value) in criteria.iter() {
            let JsonValue::String(prefix) = value else {
                self.reject(field, "prefix must be a string");
                continue;
            };
            if prefix.is_empty() {
                continue;
            }
            match prefix_upper_bound(prefix) {
                Some(end) => {
                    self.query = self
                        .query
                        .filter(Filter::new(
                            field,
                            FilterOp::GreaterOrEqual,
                            JsonValue::String(prefix.clone()),
                        ))
                        .filter(Filter::new(field, FilterOp::LessThan, JsonValue::String(end)));
                }
                None => self.reject(field, "last character has no successor"),
            }
        }
        self
    }

    /// Limits the result page. Zero means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = (limit > 0).then_some(limit);
        self
    }

    /// Skips the first `skip` results.
    pub fn skip(mut self, skip: usize) -> Self {
        self.query.offset = (skip > 0).then_some(skip);
        self
    }

    pub fn with_options(self, options: QueryOptions) -> Self {
        let skip = options.effective_skip();
        match options.effective_limit() {
            Some(limit) => self.limit(limit).skip(skip),
            None => self.skip(skip),
        }
    }

    /// The store-level query accumulated so far.
    pub fn structured(&self) -> &StructuredQuery {
        &self.query
    }

    /// Executes the query and materializes every result.
    pub async fn fetch_all(self) -> Result<Vec<T>, AppError> {
        self.fetch_documents()
            .await?
            .into_iter()
            .map(T::from_document)
            .collect()
    }

    /// Alias of [`fetch_all`](Self::fetch_all).
    pub async fn get_results(self) -> Result<Vec<T>, AppError> {
        self.fetch_all().await
    }

    /// Executes the query and returns the first result, if any.
    pub async fn fetch_one(self) -> Result<Option<T>, AppError> {
        let documents = self.limit(1).fetch_documents().await?;
        documents
            .into_iter()
            .next()
            .map(T::from_document)
            .transpose()
    }

    /// Union ("either contains") search.
    ///
    /// Fetches the current result page, then keeps every record whose field
    /// contains the given needle for *any* of the pairs. Records matched by
    /// several pairs appear once (deduplicated by id, first match wins the
    /// position). `options` paginates the final list, not the fetch, so cost
    /// grows with the size of the filtered collection rather than the result.
    pub async fn either_contains(
        self,
        criteria: Criteria,
        options: QueryOptions,
    ) -> Result<Vec<T>, AppError> {
        criteria.validate()?;
        let collection = self.query.collection.to_string();
        let records = self.fetch_documents().await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut matches: Vec<Document> = Vec::new();
        for (field, needle) in criteria.iter() {
            for record in &records {
                if contains(record.get_raw(field), needle) && seen.insert(record.id().to_string())
                {
                    matches.push(record.clone());
                }
            }
        }

        tracing::debug!(
            collection = %collection,
            scanned = records.len(),
            matched = matches.len(),
            "either-contains search"
        );

        options
            .paginate(matches)
            .into_iter()
            .map(T::from_document)
            .collect()
    }

    async fn fetch_documents(self) -> Result<Vec<Document>, AppError> {
        if let Some(err) = self.invalid {
            return Err(err);
        }
        tracing::debug!(
            collection = %self.query.collection,
            filters = self.query.filters.len(),
            limit = ?self.query.limit,
            offset = ?self.query.offset,
            "running query"
        );
        self.store.run_query(self.query).await?.try_collect().await
    }

    fn reject(&mut self, field: &str, reason: &str) {
        self.defer(Err(AppError::InvalidPrefix {
            field: field.to_string(),
            reason: reason.to_string(),
        }));
    }

    /// Keeps the first construction error; it is returned when the query runs.
    fn defer(&mut self, result: Result<(), AppError>) {
        if let Err(err) = result {
            if self.invalid.is_none() {
                self.invalid = Some(err);
            }
        }
    }
}

/// Exclusive upper bound of the prefix range: the prefix with its last
/// character replaced by the next Unicode scalar value.
///
/// The surrogate gap is skipped (`U+D7FF` is followed by `U+E000`). Returns
/// `None` for an empty prefix or one ending in `char::MAX`.
pub fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let last = prefix.chars().last()?;
    let next = match last as u32 {
        0xD7FF => Some('\u{E000}'),
        code => char::from_u32(code + 1),
    }?;
    let mut end = prefix[..prefix.len() - last.len_utf8()].to_string();
    end.push(next);
    Some(end)
}

fn contains(actual: Option<&JsonValue>, needle: &JsonValue) -> bool {
    match (actual, needle) {
        (Some(JsonValue::String(haystack)), JsonValue::String(needle)) => {
            haystack.contains(needle.as_str())
        }
        (Some(_), JsonValue::String(_)) | (None, _) => false,
        (Some(actual), needle) => actual == needle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_upper_bound_ascii() {
        assert_eq!(prefix_upper_bound("cof").as_deref(), Some("cog"));
        assert_eq!(prefix_upper_bound("a").as_deref(), Some("b"));
    }

    #[test]
    fn test_prefix_upper_bound_multibyte() {
        assert_eq!(prefix_upper_bound("caf\u{e9}").as_deref(), Some("caf\u{ea}"));
        assert_eq!(prefix_upper_bound("x\u{D7FF}").as_deref(), Some("x\u{E000}"));
    }

    #[test]
    fn test_prefix_upper_bound_edges() {
        assert_eq!(prefix_upper_bound(""), None);
        assert_eq!(prefix_upper_bound("a\u{10FFFF}"), None);
    }

    #[test]
    fn test_contains_string_and_scalar_needles() {
        assert!(contains(Some(&json!("coffee beans")), &json!("bean")));
        assert!(!contains(Some(&json!(12)), &json!("1")));
        assert!(contains(Some(&json!(true)), &json!(true)));
        assert!(!contains(None, &json!("a")));
    }
}
