//! # JobMatch Core
//!
//! The matching engine behind JobMatch.
//!
//! This crate provides:
//!
//! - [`Embedder`] - the text → unit vector boundary, plus [`HashingEmbedder`]
//! - [`VectorIndex`] - inner-product top-k search with two backends,
//!   [`FlatIndex`] and [`BruteForceIndex`]
//! - [`JobCatalog`] - deduplicated job records, row-aligned with the index
//! - [`Scorer`] - skill, experience, location and recency scoring
//! - [`MatchEngine`] - ingestion and profile matching over a shared store
//!
//! ## Example
//!
//! ```rust
//! use jobmatch_core::{EngineConfig, JobInput, MatchEngine, UserProfile};
//!
//! let engine = MatchEngine::with_hashing_embedder(EngineConfig::default()).unwrap();
//!
//! let job = JobInput {
//!     required_skills: Some(vec!["Python".into(), "SQL".into()]),
//!     remote: Some(true),
//!     ..JobInput::new("1", "Data Scientist")
//! };
//! let report = engine.ingest(vec![job]).unwrap();
//! assert_eq!(report.ingested, 1);
//!
//! let results = engine.match_profile(&UserProfile::new(["Python"])).unwrap();
//! assert_eq!(results[0].job.id, "1");
//! ```

pub mod brute_force;
pub mod catalog;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod error;
pub mod flat;
pub mod index;
pub mod job;
pub mod profile;
pub mod scorer;
pub mod vector;

/// Dot-product kernels
///
/// - AVX2/FMA and SSE on x86_64
/// - NEON on ARM64/Apple Silicon
/// - scalar elsewhere
pub mod simd;

pub use brute_force::BruteForceIndex;
pub use catalog::JobCatalog;
pub use config::EngineConfig;
pub use embedder::{EmbedWorkers, Embedder, HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use engine::{IngestReport, JobStore, MatchEngine, PendingBatch};
pub use error::{EmbeddingError, Error, Result};
pub use flat::FlatIndex;
pub use index::{create_index, IndexBackend, SearchHit, VectorIndex};
pub use job::{parse_posted_date, JobInput, JobRecord, PostedDate};
pub use profile::UserProfile;
pub use scorer::{MatchResult, ScoreBreakdown, ScoreWeights, Scorer, ScoringConfig};
pub use vector::Vector;
