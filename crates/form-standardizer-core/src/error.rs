//! Error taxonomy for index construction and standardization.

use thiserror::Error;

/// Failures that abort an index build or a standardization request.
#[derive(Debug, Error)]
pub enum StandardizeError {
    /// An index build was attempted with zero standard fields.
    #[error("catalog is empty: no standard fields to index")]
    CatalogEmpty,

    /// The embedding provider failed for a label.
    #[error("embedding failed for label '{label}': {source}")]
    Embedding {
        label: String,
        #[source]
        source: anyhow::Error,
    },

    /// A provider returned a vector whose length differs from the index dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The provider returned a different number of vectors than texts requested.
    #[error("embedding provider returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },
}

/// Failures while parsing or constructing a [`FieldCatalog`](crate::models::FieldCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("standard field '{name}' (entry {position}) has empty html")]
    EmptyHtml { name: String, position: usize },

    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
}
