use crate::lmdb_storage::LmdbStorage;
use jobmatch_core::{
    Embedder, EngineConfig, Error, IngestReport, JobInput, MatchEngine, MatchResult, Result,
    UserProfile,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the match engine and, optionally, its on-disk copy.
///
/// With persistence enabled every ingested batch is written to LMDB inside
/// the engine's commit hook, so a batch that fails to persist is never
/// visible to queries either.
pub struct StorageManager {
    engine: Arc<MatchEngine>,
    lmdb: Option<Arc<LmdbStorage>>,
    data_dir: Option<PathBuf>,
}

impl StorageManager {
    /// Open (or create) the store under `data_dir` and restore its jobs.
    pub fn open<P: AsRef<Path>>(
        data_dir: P,
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let lmdb = LmdbStorage::new(data_dir.join("lmdb")).map_err(storage_error)?;
        let (records, vectors) = lmdb.load_all().map_err(storage_error)?;

        let expected = config.embedding_dim;
        if let Some(bad) = vectors.iter().find(|v| v.dim() != expected) {
            return Err(Error::Storage(format!(
                "stored embeddings are {}-dimensional but the engine is configured for {expected}",
                bad.dim()
            )));
        }

        let engine = MatchEngine::new(config, embedder)?;
        if !records.is_empty() {
            engine.restore(records, vectors)?;
        }
        info!(data_dir = %data_dir.display(), jobs = engine.len(), "opened job store");

        Ok(Self {
            engine: Arc::new(engine),
            lmdb: Some(Arc::new(lmdb)),
            data_dir: Some(data_dir),
        })
    }

    /// Engine with no backing store; everything is lost on exit.
    pub fn in_memory(config: EngineConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        warn!("persistence disabled, jobs will not survive a restart");
        Ok(Self {
            engine: Arc::new(MatchEngine::new(config, embedder)?),
            lmdb: None,
            data_dir: None,
        })
    }

    #[inline]
    pub fn engine(&self) -> &Arc<MatchEngine> {
        &self.engine
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.lmdb.is_some()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn ingest(&self, jobs: Vec<JobInput>) -> Result<IngestReport> {
        match &self.lmdb {
            Some(lmdb) => self.engine.ingest_with(jobs, |batch| {
                lmdb.save_batch(batch.first_row, batch.records, batch.vectors)
                    .map_err(storage_error)
            }),
            None => self.engine.ingest(jobs),
        }
    }

    pub fn match_profile(&self, profile: &UserProfile) -> Result<Vec<MatchResult>> {
        self.engine.match_profile(profile)
    }
}

fn storage_error(err: anyhow::Error) -> Error {
    Error::Storage(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::{HashingEmbedder, IndexBackend};

    fn config() -> EngineConfig {
        EngineConfig {
            embedding_dim: 64,
            ..Default::default()
        }
    }

    fn embedder(dim: usize) -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::new(dim))
    }

    fn job(id: &str, title: &str, skills: &[&str]) -> JobInput {
        JobInput {
            required_skills: Some(skills.iter().map(|s| s.to_string()).collect()),
            ..JobInput::new(id, title)
        }
    }

    #[test]
    fn test_reopen_restores_jobs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let profile = UserProfile::new(["Rust", "Tokio"]);

        let before = {
            let manager = StorageManager::open(dir.path(), config(), embedder(64)).unwrap();
            assert!(manager.is_persistent());
            manager
                .ingest(vec![
                    job("b", "Backend Engineer", &["Rust", "Tokio"]),
                    job("a", "Line Cook", &["Knife skills"]),
                ])
                .unwrap();
            manager.ingest(vec![job("c", "Data Analyst", &["SQL"])]).unwrap();
            manager.match_profile(&profile).unwrap()
        };

        let manager = StorageManager::open(dir.path(), config(), embedder(64)).unwrap();
        assert_eq!(manager.engine().sizes(), (3, 3));
        let ids: Vec<String> = manager
            .engine()
            .read(|store| store.catalog().iter().map(|j| j.id.clone()).collect());
        assert_eq!(ids, vec!["b", "a", "c"]);

        let after = manager.match_profile(&profile).unwrap();
        let before_ids: Vec<&str> = before.iter().map(|r| r.job.id.as_str()).collect();
        let after_ids: Vec<&str> = after.iter().map(|r| r.job.id.as_str()).collect();
        assert_eq!(before_ids, after_ids);
    }

    #[test]
    fn test_duplicates_are_not_persisted_twice() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::open(dir.path(), config(), embedder(64)).unwrap();
        manager.ingest(vec![job("1", "Nurse", &["Triage"])]).unwrap();
        let report = manager.ingest(vec![job("1", "Nurse", &["Triage"])]).unwrap();
        assert_eq!(report.ingested, 0);
        assert_eq!(report.skipped_duplicates, 1);
        drop(manager);

        let reopened = StorageManager::open(dir.path(), config(), embedder(64)).unwrap();
        assert_eq!(reopened.engine().len(), 1);
    }

    #[test]
    fn test_dimension_change_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let manager = StorageManager::open(dir.path(), config(), embedder(64)).unwrap();
            manager.ingest(vec![job("1", "Nurse", &["Triage"])]).unwrap();
        }

        let wider = EngineConfig {
            embedding_dim: 128,
            index_backend: IndexBackend::BruteForce,
            ..Default::default()
        };
        let err = StorageManager::open(dir.path(), wider, embedder(128));
        assert!(matches!(err, Err(Error::Storage(_))));
    }

    #[test]
    fn test_in_memory_manager() {
        let manager = StorageManager::in_memory(config(), embedder(64)).unwrap();
        assert!(!manager.is_persistent());
        assert!(manager.data_dir().is_none());
        manager.ingest(vec![job("1", "Nurse", &["Triage"])]).unwrap();
        assert_eq!(manager.engine().len(), 1);
    }
}
