//! Substitution engine: replaces matched field blocks with canonical html.
//!
//! For every block in document order:
//!
//! 1. Derive the block's label ([`LabelExtractor`]).
//! 2. Embed the label with the request's [`EmbeddingProvider`].
//! 3. Query the [`VectorIndex`] for the nearest standard field.
//! 4. If `similarity >= threshold`, replace the block.
//!
//! # Replace modes
//!
//! - [`ReplaceMode::Literal`] rewrites **every** occurrence of the block's
//!   exact source text in the working copy, so later blocks see earlier
//!   replacements. Two blocks with byte-identical text are both rewritten
//!   by the first accepted match.
//! - [`ReplaceMode::Span`] rewrites only the recorded byte span of each
//!   accepted block, applied in reverse document order against the
//!   original text.
//!
//! The engine performs no I/O other than the provider calls.

use serde::{Deserialize, Serialize};

use crate::blocks::{BlockExtractor, BlockMarkers};
use crate::embedding::EmbeddingProvider;
use crate::error::StandardizeError;
use crate::index::VectorIndex;
use crate::label::LabelExtractor;
use crate::models::{FieldBlock, MatchResult, Standardized};

pub const DEFAULT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    #[default]
    Literal,
    Span,
}

/// What to do when the provider fails for a block's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFailurePolicy {
    /// Fail the whole request.
    #[default]
    Fail,
    /// Leave the block unchanged and record a match without a candidate.
    Skip,
}

#[derive(Debug, Clone)]
pub struct StandardizeOptions {
    pub threshold: f64,
    pub markers: BlockMarkers,
    pub labels: LabelExtractor,
    pub replace_mode: ReplaceMode,
    pub on_embedding_error: EmbeddingFailurePolicy,
}

impl Default for StandardizeOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            markers: BlockMarkers::default(),
            labels: LabelExtractor::default(),
            replace_mode: ReplaceMode::default(),
            on_embedding_error: EmbeddingFailurePolicy::default(),
        }
    }
}

/// Stateless engine; one instance can serve any number of requests.
#[derive(Debug, Clone)]
pub struct Standardizer {
    extractor: BlockExtractor,
    options: StandardizeOptions,
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::new(StandardizeOptions::default())
    }
}

impl Standardizer {
    pub fn new(options: StandardizeOptions) -> Self {
        Self {
            extractor: BlockExtractor::new(options.markers.clone()),
            options,
        }
    }

    pub fn options(&self) -> &StandardizeOptions {
        &self.options
    }

    pub fn extractor(&self) -> &BlockExtractor {
        &self.extractor
    }

    /// Copy of this engine with a different threshold.
    pub fn with_threshold(&self, threshold: f64) -> Self {
        let mut options = self.options.clone();
        options.threshold = threshold;
        Self::new(options)
    }

    /// Decide a single block against the index.
    pub async fn match_block(
        &self,
        block: FieldBlock,
        index: &VectorIndex,
        provider: &dyn EmbeddingProvider,
    ) -> Result<MatchResult, StandardizeError> {
        let label = self.options.labels.label(&block);

        let query = match provider.embed_one(&label).await {
            Ok(v) => v,
            Err(source) => {
                return match self.options.on_embedding_error {
                    EmbeddingFailurePolicy::Fail => {
                        Err(StandardizeError::Embedding { label, source })
                    }
                    EmbeddingFailurePolicy::Skip => Ok(MatchResult {
                        block,
                        label,
                        candidate: None,
                        position: None,
                        distance: None,
                        similarity: None,
                        replaced: false,
                    }),
                };
            }
        };

        let hit = index.nearest(&query)?;
        let similarity = hit.similarity();
        let candidate = index.field(hit.position).cloned();

        Ok(MatchResult {
            block,
            label,
            candidate,
            position: Some(hit.position),
            distance: Some(hit.distance),
            similarity: Some(similarity),
            replaced: similarity >= self.options.threshold,
        })
    }

    /// Standardize `document`, returning the rewritten text and every decision.
    ///
    /// On failure no partial output is produced.
    pub async fn standardize(
        &self,
        document: &str,
        index: &VectorIndex,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Standardized, StandardizeError> {
        let (blocks, malformed) = self.extractor.extract(document);

        let mut matches = Vec::with_capacity(blocks.len());
        for block in blocks {
            matches.push(self.match_block(block, index, provider).await?);
        }

        let html = match self.options.replace_mode {
            ReplaceMode::Literal => apply_literal(document, &matches),
            ReplaceMode::Span => apply_spans(document, &matches),
        };

        Ok(Standardized {
            html,
            matches,
            malformed,
        })
    }
}

fn accepted(matches: &[MatchResult]) -> impl Iterator<Item = (&FieldBlock, &str)> {
    matches.iter().filter(|m| m.replaced).filter_map(|m| {
        m.candidate
            .as_ref()
            .map(|field| (&m.block, field.html.as_str()))
    })
}

fn apply_literal(document: &str, matches: &[MatchResult]) -> String {
    let mut working = document.to_string();
    for (block, html) in accepted(matches) {
        working = working.replace(&block.text, html);
    }
    working
}

fn apply_spans(document: &str, matches: &[MatchResult]) -> String {
    let mut replacements: Vec<(&FieldBlock, &str)> = accepted(matches).collect();
    replacements.sort_by(|a, b| b.0.span.start.cmp(&a.0.span.start));

    let mut working = document.to_string();
    for (block, html) in replacements {
        working.replace_range(block.span.clone(), html);
    }
    working
}
