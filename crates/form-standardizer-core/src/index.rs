//! Flat exact nearest-neighbor index over catalog embeddings.
//!
//! Vectors are stored row-major in one contiguous buffer, row `i` holding
//! the embedding of `catalog[i].name`. Queries are a brute-force scan by
//! squared Euclidean distance; catalogs run from tens to low thousands of
//! entries, so no approximate structure is used.
//!
//! Ties are broken by catalog position (lower wins), which keeps results
//! reproducible for duplicate names and colliding embeddings.

use serde::Serialize;
use std::sync::Arc;

use crate::embedding::{similarity_from_distance, squared_l2, EmbeddingProvider};
use crate::error::StandardizeError;
use crate::models::{FieldCatalog, StandardField};

/// Input embedded once per build to fix the index dimension.
pub const CANARY_TEXT: &str = "test";

/// Default number of names sent to the provider per call during a build.
pub const DEFAULT_BUILD_BATCH: usize = 64;

/// A search hit: catalog position plus squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f64 {
        similarity_from_distance(self.distance)
    }
}

/// Read-only index built from a [`FieldCatalog`].
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dims: usize,
    data: Vec<f32>,
    catalog: Arc<FieldCatalog>,
}

impl VectorIndex {
    /// Embed every catalog name and build the index.
    pub async fn build(
        catalog: Arc<FieldCatalog>,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self, StandardizeError> {
        Self::build_batched(catalog, provider, DEFAULT_BUILD_BATCH).await
    }

    /// Like [`build`](Self::build) with an explicit provider batch size.
    pub async fn build_batched(
        catalog: Arc<FieldCatalog>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> Result<Self, StandardizeError> {
        if catalog.is_empty() {
            return Err(StandardizeError::CatalogEmpty);
        }

        let canary = provider
            .embed_one(CANARY_TEXT)
            .await
            .map_err(|source| StandardizeError::Embedding {
                label: CANARY_TEXT.to_string(),
                source,
            })?;
        let dims = canary.len();

        let names = catalog.names();
        let mut vectors = Vec::with_capacity(names.len());
        for batch in names.chunks(batch_size.max(1)) {
            let embedded =
                provider
                    .embed(batch)
                    .await
                    .map_err(|source| StandardizeError::Embedding {
                        label: batch[0].clone(),
                        source,
                    })?;
            if embedded.len() != batch.len() {
                return Err(StandardizeError::CountMismatch {
                    expected: batch.len(),
                    actual: embedded.len(),
                });
            }
            vectors.extend(embedded);
        }

        Self::with_dims(catalog, vectors, dims)
    }

    /// Build from precomputed vectors, one per catalog entry in order.
    ///
    /// The dimension is taken from the first vector.
    pub fn from_vectors(
        catalog: Arc<FieldCatalog>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, StandardizeError> {
        let dims = vectors.first().map_or(0, |v| v.len());
        Self::with_dims(catalog, vectors, dims)
    }

    fn with_dims(
        catalog: Arc<FieldCatalog>,
        vectors: Vec<Vec<f32>>,
        dims: usize,
    ) -> Result<Self, StandardizeError> {
        if catalog.is_empty() {
            return Err(StandardizeError::CatalogEmpty);
        }
        if vectors.len() != catalog.len() {
            return Err(StandardizeError::CountMismatch {
                expected: catalog.len(),
                actual: vectors.len(),
            });
        }

        let mut data = Vec::with_capacity(dims * vectors.len());
        for v in &vectors {
            if v.len() != dims {
                return Err(StandardizeError::DimensionMismatch {
                    expected: dims,
                    actual: v.len(),
                });
            }
            data.extend_from_slice(v);
        }

        Ok(Self {
            dims,
            data,
            catalog,
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn catalog(&self) -> &Arc<FieldCatalog> {
        &self.catalog
    }

    pub fn field(&self, position: usize) -> Option<&StandardField> {
        self.catalog.get(position)
    }

    /// The stored vector for a catalog position.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.len()).then(|| self.row(position))
    }

    fn row(&self, position: usize) -> &[f32] {
        &self.data[position * self.dims..(position + 1) * self.dims]
    }

    fn check_query(&self, query: &[f32]) -> Result<(), StandardizeError> {
        if query.len() != self.dims {
            return Err(StandardizeError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        Ok(())
    }

    /// Distance ordering where NaN ranks after every real distance.
    fn compare(a: f32, b: f32) -> std::cmp::Ordering {
        a.is_nan().cmp(&b.is_nan()).then(a.total_cmp(&b))
    }

    /// The `k` nearest entries, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, StandardizeError> {
        self.check_query(query)?;

        let mut hits: Vec<Neighbor> = (0..self.len())
            .map(|position| Neighbor {
                position,
                distance: squared_l2(query, self.row(position)),
            })
            .collect();
        hits.sort_by(|a, b| {
            Self::compare(a.distance, b.distance).then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// The single nearest entry.
    pub fn nearest(&self, query: &[f32]) -> Result<Neighbor, StandardizeError> {
        self.check_query(query)?;

        let mut best = Neighbor {
            position: 0,
            distance: squared_l2(query, self.row(0)),
        };
        for position in 1..self.len() {
            let distance = squared_l2(query, self.row(position));
            if Self::compare(distance, best.distance).is_lt() {
                best = Neighbor { position, distance };
            }
        }
        Ok(best)
    }
}
