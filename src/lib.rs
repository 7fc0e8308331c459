//! # JobMatch
//!
//! Semantic job matching: job postings are embedded into a vector index,
//! candidate profiles are embedded at query time, and the nearest jobs are
//! re-ranked by skill similarity, experience, location and recency.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! jobmatch --http-port 8000 --data-dir ./data
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use jobmatch::prelude::*;
//!
//! let engine = MatchEngine::with_hashing_embedder(EngineConfig::default()).unwrap();
//! engine
//!     .ingest(vec![JobInput {
//!         required_skills: Some(vec!["Rust".into(), "Tokio".into()]),
//!         location: Some("Berlin".into()),
//!         ..JobInput::new("42", "Backend Engineer")
//!     }])
//!     .unwrap();
//!
//! let profile = UserProfile {
//!     location: Some("berlin".into()),
//!     ..UserProfile::new(["Rust"])
//! };
//! let results = engine.match_profile(&profile).unwrap();
//! assert_eq!(results[0].breakdown.location, 100.0);
//! ```
//!
//! ## Crate Structure
//!
//! - [`jobmatch-core`](https://docs.rs/jobmatch-core) - embedder, vector index, catalog, scorer, engine
//! - [`jobmatch-storage`](https://docs.rs/jobmatch-storage) - LMDB persistence
//! - [`jobmatch-api`](https://docs.rs/jobmatch-api) - REST API

// Re-export core types
pub use jobmatch_core::{
    BruteForceIndex, Embedder, EmbeddingError, EngineConfig, Error, FlatIndex, HashingEmbedder,
    IndexBackend, IngestReport, JobInput, JobRecord, MatchEngine, MatchResult, PostedDate, Result,
    ScoreBreakdown, ScoreWeights, Scorer, ScoringConfig, UserProfile, Vector, VectorIndex,
};

// Re-export storage
pub use jobmatch_storage::StorageManager;

// Re-export API
pub use jobmatch_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Embedder, EngineConfig, Error, HashingEmbedder, IndexBackend, JobInput, JobRecord,
        MatchEngine, MatchResult, Result, StorageManager, UserProfile,
    };
}

/// SIMD-optimized vector operations
pub mod simd {
    pub use jobmatch_core::simd::{dot_product_simd, norm_simd, DotKernel};
}
