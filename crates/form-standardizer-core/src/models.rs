//! Core data models used throughout Form Standardizer.
//!
//! [`StandardField`] and [`FieldCatalog`] are long-lived and immutable once
//! loaded. [`FieldBlock`], [`MatchResult`], and [`Standardized`] are created
//! and discarded within a single request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Range;

use crate::error::CatalogError;

/// A canonical, pre-approved form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardField {
    pub name: String,
    pub html: String,
}

impl StandardField {
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            html: html.into(),
        }
    }
}

/// Ordered collection of standard fields.
///
/// Entries are identified by position; names may repeat. Every entry is
/// guaranteed to carry non-empty html.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Vec<StandardField>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting any entry whose html is blank.
    pub fn new(fields: Vec<StandardField>) -> Result<Self, CatalogError> {
        if let Some((position, field)) = fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.html.trim().is_empty())
        {
            return Err(CatalogError::EmptyHtml {
                name: field.name.clone(),
                position,
            });
        }
        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&StandardField> {
        self.fields.get(position)
    }

    pub fn fields(&self) -> &[StandardField] {
        &self.fields
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// SHA-256 over every `(name, html)` pair in order, hex encoded.
    ///
    /// Two catalogs with the same fingerprint produce identical indexes
    /// under a deterministic provider.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in &self.fields {
            hasher.update(field.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(field.html.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

/// A structurally balanced block of markup found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBlock {
    /// Literal source text, trimmed of leading/trailing whitespace.
    pub text: String,
    /// 1-based line of the opening marker.
    pub start_line: usize,
    /// 1-based line of the matching closing marker.
    pub end_line: usize,
    /// Byte range of `text` within the scanned document.
    pub span: Range<usize>,
}

/// An opening marker whose block never closed before end of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedInput {
    /// 1-based line of the unmatched opener.
    pub start_line: usize,
    /// Nesting depth still open at end of input.
    pub open_depth: usize,
}

/// The decision taken for one block.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub block: FieldBlock,
    pub label: String,
    /// Nearest catalog entry, absent only when embedding the label failed
    /// and the engine was told to skip such blocks.
    pub candidate: Option<StandardField>,
    /// Catalog position of `candidate`.
    pub position: Option<usize>,
    /// Squared Euclidean distance to `candidate`.
    pub distance: Option<f32>,
    pub similarity: Option<f64>,
    pub replaced: bool,
}

/// Output of a standardization request.
#[derive(Debug, Clone, Serialize)]
pub struct Standardized {
    pub html: String,
    pub matches: Vec<MatchResult>,
    pub malformed: Vec<MalformedInput>,
}

impl Standardized {
    pub fn replaced_count(&self) -> usize {
        self.matches.iter().filter(|m| m.replaced).count()
    }
}
