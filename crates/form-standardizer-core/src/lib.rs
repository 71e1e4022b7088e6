//! # Form Standardizer Core
//!
//! Shared, I/O-free logic for Form Standardizer: data models, the
//! line-oriented block extractor, label inference, catalog parsing, the
//! flat vector index, and the substitution engine.
//!
//! This crate contains no tokio, networking, or filesystem access. The
//! application crate supplies embedding providers and owns the catalog
//! lifecycle.
//!
//! ## Pipeline
//!
//! ```text
//! catalog ──▶ embed names ──▶ VectorIndex           (build time)
//! html ──▶ blocks ──▶ labels ──▶ embed ──▶ nearest ──▶ substitute (per request)
//! ```

pub mod blocks;
pub mod catalog;
pub mod embedding;
pub mod error;
pub mod index;
pub mod label;
pub mod models;
pub mod substitute;
