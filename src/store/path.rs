//! Materialized paths for collections and documents.
//!
//! A collection path has an odd number of segments (`users`,
//! `users/U1/categories`); a document path adds one id segment to it.

use std::fmt;

use crate::error::AppError;

/// Path to a collection, possibly nested under a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Top-level collection.
    ///
    /// Segments given to `root`, [`doc`](Self::doc) and
    /// [`DocumentPath::child`] are trusted. Caller-supplied ids go through
    /// [`try_doc`](Self::try_doc).
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Parses `a/b/c` style paths, validating segment count and content.
    pub fn parse(path: &str) -> Result<Self, AppError> {
        let segments = split_segments(path)?;
        if segments.len() % 2 == 0 {
            return Err(AppError::InvalidPath(format!(
                "'{}' names a document, not a collection",
                path
            )));
        }
        Ok(Self { segments })
    }

    /// Path of the document `id` inside this collection.
    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }

    /// Like [`doc`](Self::doc), but rejects an empty id or one containing `/`.
    pub fn try_doc(&self, id: &str) -> Result<DocumentPath, AppError> {
        if id.is_empty() {
            return Err(AppError::InvalidPath(format!("empty id in '{}'", self)));
        }
        if id.contains('/') {
            return Err(AppError::InvalidPath(format!(
                "id '{}' in '{}' contains '/'",
                id, self
            )));
        }
        Ok(self.doc(id))
    }

    /// Collection name (last segment).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The document this collection is nested under, if any.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        let id = segments.pop()?;
        Some(DocumentPath {
            collection: CollectionPath { segments },
            id,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Path to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, AppError> {
        let mut segments = split_segments(path)?;
        if segments.len() % 2 != 0 {
            return Err(AppError::InvalidPath(format!(
                "'{}' names a collection, not a document",
                path
            )));
        }
        let id = segments.pop().unwrap_or_default();
        Ok(Self {
            collection: CollectionPath { segments },
            id,
        })
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Subcollection nested under this document.
    pub fn child(&self, name: &str) -> CollectionPath {
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(name.to_string());
        CollectionPath { segments }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

fn split_segments(path: &str) -> Result<Vec<String>, AppError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::InvalidPath("path is empty".to_string()));
    }
    let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AppError::InvalidPath(format!(
            "'{}' contains an empty segment",
            path
        )));
    }
    Ok(segments)
}
