//! # catena-core
//!
//! A Rust library for assembling normalized science metadata records —
//! themes, projects, products, and variables — into a browsable,
//! statically servable linked catalog: a directory tree of JSON documents
//! connected by typed hyperlinks, in the style of a spatio-temporal asset
//! catalog.
//!
//! ## Overview
//!
//! The build is a synchronous pipeline; each stage consumes the immutable
//! output of the previous one:
//!
//! 1. **[`loader`]** reads one JSON record per file into an
//!    [`entity::EntityStore`] (duplicate identifiers rejected).
//! 2. **[`relations`]** derives bidirectional association indices for the
//!    three many-to-many relation pairs and accumulates every referential
//!    integrity error before aborting.
//! 3. **[`tree`]** turns the multi-parent association graph into a
//!    single-parent catalog tree plus secondary `related` cross-links:
//!    the lexicographically smallest referenced id owns the structural
//!    edge, every other membership becomes a link pair.
//! 4. **[`paths`]** assigns each node a deterministic path
//!    (`themes/<slug>.json`, `projects/<slug>.json`, …) and rewrites every
//!    link into a concrete href — absolute under a configured root, or
//!    tree-relative via a lowest-common-ancestor walk.
//! 5. **[`writer`]** serializes the resolved, read-only nodes to disk,
//!    optionally with a companion ISO metadata artifact per
//!    project/product.
//!
//! Identical inputs and configuration produce byte-identical output
//! trees; nothing in the documents embeds a timestamp.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catena_core::{config::BuildConfig, pipeline};
//!
//! fn main() -> Result<(), catena_core::CatenaError> {
//!     let config = BuildConfig {
//!         root_href: Some("https://example.com/catalog".to_string()),
//!         ..BuildConfig::default()
//!     };
//!     let stats = pipeline::build("data", "dist", &config)?;
//!     println!("wrote {} files", stats.files_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Referential problems are accumulated and reported together as
//! [`CatenaError::Integrity`]; [`CatenaError::Internal`] marks engine
//! defects (double ownership, path collisions) as distinct from bad
//! input.

pub mod config;
pub mod entity;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod paths;
pub mod pipeline;
pub mod relations;
pub mod tree;
pub mod writer;

pub use error::*;
