//! Raw documents and streaming types for query results.

use std::pin::Pin;

use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::store::path::DocumentPath;

/// Flat field map of a stored document.
pub type Fields = serde_json::Map<String, JsonValue>;

/// A stream of documents from a query result.
pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = Result<Document, AppError>> + Send + 'a>>;

/// A document as returned by the store: its location plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    path: DocumentPath,
    fields: Fields,
}

impl Document {
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Id of the document (last path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Gets a field, deserializing to the requested type.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Result<T, AppError> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| self.malformed(format!("missing field '{}'", field)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| self.malformed(format!("field '{}': {}", field, e)))
    }

    /// Gets a field, returning `None` when it is missing or null.
    pub fn get_opt<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, AppError> {
        match self.fields.get(field) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| self.malformed(format!("field '{}': {}", field, e))),
            None => Ok(None),
        }
    }

    pub fn get_raw(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    pub fn into_parts(self) -> (DocumentPath, Fields) {
        (self.path, self.fields)
    }

    fn malformed(&self, message: String) -> AppError {
        AppError::MalformedDocument {
            path: self.path.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::path::CollectionPath;
    use serde_json::json;

    fn document(fields: JsonValue) -> Document {
        let fields = match fields {
            JsonValue::Object(map) => map,
            _ => Fields::new(),
        };
        Document::new(CollectionPath::root("products").doc("p1"), fields)
    }

    #[test]
    fn test_get_typed_field() {
        let doc = document(json!({"price": 12.5, "name": "Beans"}));
        let price: f64 = doc.get("price").unwrap();
        assert_eq!(price, 12.5);
        assert_eq!(doc.id(), "p1");
    }

    #[test]
    fn test_get_missing_field_is_malformed() {
        let doc = document(json!({}));
        let err = doc.get::<String>("name").unwrap_err();
        assert!(matches!(err, AppError::MalformedDocument { .. }));
    }

    #[test]
    fn test_get_opt_null_and_missing() {
        let doc = document(json!({"img": null}));
        assert_eq!(doc.get_opt::<String>("img").unwrap(), None);
        assert_eq!(doc.get_opt::<String>("missing").unwrap(), None);
    }

    #[test]
    fn test_get_opt_wrong_type() {
        let doc = document(json!({"available": "yes"}));
        assert!(doc.get_opt::<bool>("available").is_err());
    }
}
