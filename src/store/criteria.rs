//! Field/value pairs used to build filters, plus pagination options.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::error::AppError;

/// Values accepted by [`Criteria::field`].
///
/// `Ok(None)` means unset and the pair is skipped. A value with no document
/// representation (NaN, infinities) is an error.
pub trait CriteriaValue {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String>;
}

impl<V: CriteriaValue + ?Sized> CriteriaValue for &V {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        (**self).to_criteria_value()
    }
}

impl<V: CriteriaValue> CriteriaValue for Option<V> {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        match self {
            Some(value) => value.to_criteria_value(),
            None => Ok(None),
        }
    }
}

impl CriteriaValue for str {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        Ok(Some(JsonValue::String(self.to_string())))
    }
}

impl CriteriaValue for String {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        self.as_str().to_criteria_value()
    }
}

impl CriteriaValue for bool {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        Ok(Some(JsonValue::Bool(*self)))
    }
}

macro_rules! integer_criteria {
    ($($ty:ty),+) => {
        $(impl CriteriaValue for $ty {
            fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
                Ok(Some(JsonValue::from(*self)))
            }
        })+
    };
}

integer_criteria!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl CriteriaValue for f64 {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        Number::from_f64(*self)
            .map(|n| Some(JsonValue::Number(n)))
            .ok_or_else(|| format!("{} is not a finite number", self))
    }
}

impl CriteriaValue for f32 {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        f64::from(*self).to_criteria_value()
    }
}

/// JSON `null` counts as unset.
impl CriteriaValue for JsonValue {
    fn to_criteria_value(&self) -> Result<Option<JsonValue>, String> {
        match self {
            JsonValue::Null => Ok(None),
            value => Ok(Some(value.clone())),
        }
    }
}

/// Ordered list of `(field, value)` pairs.
///
/// `None` values are unset and skipped, so callers can pass optional inputs
/// straight through. The first value that cannot be expressed is kept and
/// surfaces as [`AppError::InvalidCriteria`] when the query runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pairs: Vec<(String, JsonValue)>,
    invalid: Option<(String, String)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair; `None` values are skipped.
    pub fn field<V: CriteriaValue>(mut self, name: &str, value: V) -> Self {
        match value.to_criteria_value() {
            Ok(Some(value)) => self.pairs.push((name.to_string(), value)),
            Ok(None) => {}
            Err(reason) => {
                if self.invalid.is_none() {
                    self.invalid = Some((name.to_string(), reason));
                }
            }
        }
        self
    }

    /// Fails if any value given to [`field`](Self::field) was rejected.
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.invalid {
            Some((field, reason)) => Err(AppError::InvalidCriteria {
                field: field.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, JsonValue)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            invalid: None,
        }
    }
}

/// Numeric offset/limit pagination.
///
/// A zero `limit` is treated as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
}

impl QueryOptions {
    pub fn new(limit: usize, skip: usize) -> Self {
        Self {
            limit: Some(limit),
            skip: Some(skip),
        }
    }

    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            skip: None,
        }
    }

    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0)
    }

    pub fn effective_skip(&self) -> usize {
        self.skip.unwrap_or(0)
    }

    /// Applies skip then limit to an already-materialized list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.effective_skip());
        match self.effective_limit() {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Builds [`Criteria`] inline.
///
/// ```ignore
/// use catalog_store::criteria;
///
/// let active = criteria!(state = true);
/// let by_owner = criteria!(user = &author.id, state = true);
/// // `None` values are skipped
/// let maybe = criteria!(lower = name_filter.as_deref());
/// ```
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::store::Criteria::new()
    };
    ($($name:ident = $value:expr),+ $(,)?) => {
        $crate::store::Criteria::new()$(.field(stringify!($name), $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_none_values_are_skipped() {
        let lower: Option<&str> = None;
        let criteria = crate::criteria!(state = true, lower = lower);
        let pairs: Vec<_> = criteria.iter().collect();
        assert_eq!(pairs, vec![("state", &json!(true))]);
    }

    #[test]
    fn test_non_finite_float_is_recorded_not_skipped() {
        let criteria = crate::criteria!(state = true, price = f64::NAN, img = f64::INFINITY);
        let pairs: Vec<_> = criteria.iter().collect();
        assert_eq!(pairs, vec![("state", &json!(true))]);

        match criteria.validate().unwrap_err() {
            AppError::InvalidCriteria { field, .. } => assert_eq!(field, "price"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_values() {
        let owner = String::from("U1");
        let criteria = crate::criteria!(user = &owner, price = 2.5, count = 3u8, lower = Some("tea"));
        assert!(criteria.validate().is_ok());
        let pairs: Vec<_> = criteria.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(pairs, vec![json!("U1"), json!(2.5), json!(3), json!("tea")]);
    }

    #[test]
    fn test_macro_preserves_order_and_trailing_comma() {
        let criteria = crate::criteria!(lower = "a", email = "a",);
        let fields: Vec<_> = criteria.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["lower", "email"]);
    }

    #[test]
    fn test_empty_macro() {
        assert!(crate::criteria!().is_empty());
    }

    #[test]
    fn test_zero_limit_is_unset() {
        let options = QueryOptions::new(0, 2);
        assert_eq!(options.effective_limit(), None);
        assert_eq!(options.paginate(vec![1, 2, 3, 4]), vec![3, 4]);
    }

    #[test]
    fn test_paginate_skip_then_limit() {
        let options = QueryOptions::new(2, 1);
        assert_eq!(options.paginate(vec!['a', 'b', 'c', 'd']), vec!['b', 'c']);
    }
}
