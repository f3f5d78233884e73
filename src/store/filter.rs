//! Store-level query description: conjunctive field filters over one collection.
//!
//! Backends receive a [`StructuredQuery`] and must honor the same semantics:
//! - all filters must match (AND)
//! - a filter over a field the document lacks never matches
//! - range filters only match values of the same type as the bound
//! - strings order by Unicode scalar value (UTF-8 byte order)
//! - results are ordered by document id, then `offset`, then `limit`

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::store::document::Fields;
use crate::store::path::CollectionPath;

/// Comparison supported by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    GreaterOrEqual,
    LessThan,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Equal => "==",
            FilterOp::GreaterOrEqual => ">=",
            FilterOp::LessThan => "<",
        }
    }
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

impl Filter {
    pub fn new(field: &str, op: FilterOp, value: JsonValue) -> Self {
        Self {
            field: field.to_string(),
            op,
            value,
        }
    }

    pub fn equal(field: &str, value: JsonValue) -> Self {
        Self::new(field, FilterOp::Equal, value)
    }

    /// Evaluates the predicate against a document's fields.
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Equal => compare_values(actual, &self.value) == Ordering::Equal,
            FilterOp::GreaterOrEqual => {
                same_type(actual, &self.value)
                    && compare_values(actual, &self.value) != Ordering::Less
            }
            FilterOp::LessThan => {
                same_type(actual, &self.value)
                    && compare_values(actual, &self.value) == Ordering::Less
            }
        }
    }
}

/// A query against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl StructuredQuery {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|f| f.matches(fields))
    }
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

fn same_type(a: &JsonValue, b: &JsonValue) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over JSON values: null < bool < number < string < array < object.
///
/// Numbers compare numerically (`1 == 1.0`).
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            // serde_json maps iterate in key order
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
