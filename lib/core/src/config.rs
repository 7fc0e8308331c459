use crate::embedder::DEFAULT_EMBEDDING_DIM;
use crate::{Error, IndexBackend, Result, ScoringConfig};
use std::time::Duration;

/// Configuration for a [`crate::MatchEngine`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Width of the embeddings the engine stores and queries
    pub embedding_dim: usize,
    pub index_backend: IndexBackend,
    /// Upper bound on a single embedder call
    pub embed_timeout: Duration,
    /// Embedder threads allowed at once, including ones whose caller timed out
    pub max_embed_workers: usize,
    /// Result cap for profiles that do not set one
    pub default_top_k: usize,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            index_backend: IndexBackend::Auto,
            embed_timeout: Duration::from_secs(30),
            max_embed_workers: 32,
            default_top_k: 10,
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be positive".into()));
        }
        if self.embed_timeout.is_zero() {
            return Err(Error::InvalidConfig("embed_timeout must be positive".into()));
        }
        if self.max_embed_workers == 0 {
            return Err(Error::InvalidConfig("max_embed_workers must be positive".into()));
        }
        if self.default_top_k == 0 {
            return Err(Error::InvalidConfig("default_top_k must be positive".into()));
        }

        let s = &self.scoring;
        let w = &s.weights;
        let weights = [w.skill, w.experience, w.location, w.recency];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig("score weights must be finite and non-negative".into()));
        }
        if !(s.decay_days.is_finite() && s.decay_days > 0.0) {
            return Err(Error::InvalidConfig("decay_days must be positive".into()));
        }
        if !(s.default_age_days.is_finite() && s.default_age_days >= 0.0) {
            return Err(Error::InvalidConfig("default_age_days must be non-negative".into()));
        }
        if !(0.0..=1.0).contains(&s.neutral_location) {
            return Err(Error::InvalidConfig("neutral_location must lie in [0, 1]".into()));
        }
        Ok(())
    }
}
