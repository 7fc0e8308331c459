use crate::embedder::EmbedWorkers;
use crate::{
    create_index, Embedder, EmbeddingError, EngineConfig, Error, HashingEmbedder, IndexBackend,
    JobCatalog, JobInput, JobRecord, MatchResult, Result, Scorer, UserProfile, Vector, VectorIndex,
};
use chrono::{NaiveDateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Catalog and index, always mutated together
pub struct JobStore {
    catalog: JobCatalog,
    index: Box<dyn VectorIndex>,
}

impl JobStore {
    fn new(index: Box<dyn VectorIndex>) -> Self {
        Self {
            catalog: JobCatalog::new(),
            index,
        }
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    fn check_alignment(&self) -> Result<()> {
        let (catalog, index) = (self.catalog.len(), self.index.len());
        if catalog != index {
            error!(catalog, index, "catalog and vector index are out of alignment");
            return Err(Error::IndexInconsistency { catalog, index });
        }
        Ok(())
    }

    /// Append a batch to both halves or to neither.
    fn append(&mut self, records: Vec<JobRecord>, vectors: Vec<Vector>) -> Result<()> {
        if records.len() != vectors.len() {
            return Err(Error::IndexInconsistency {
                catalog: self.catalog.len() + records.len(),
                index: self.index.len() + vectors.len(),
            });
        }
        self.catalog.check_appendable(&records)?;
        self.index.add(&vectors)?;
        self.catalog.extend_unchecked(records);
        self.check_alignment()
    }
}

/// Outcome of one ingestion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Jobs appended by this call
    pub ingested: usize,
    /// Candidates dropped because their id was already known
    pub skipped_duplicates: usize,
    /// Catalog size after the call
    pub total: usize,
}

/// Rows about to be committed, handed to [`MatchEngine::ingest_with`] hooks
pub struct PendingBatch<'a> {
    /// Row the first record will occupy
    pub first_row: usize,
    pub records: &'a [JobRecord],
    pub vectors: &'a [Vector],
}

/// The matching engine: owns the job store and answers profile queries.
///
/// Readers (`match_profile`, lookups) share a read lock on the store.
/// Ingestions are serialized by their own mutex for their whole duration,
/// embed without holding the store lock, and take the write lock only to
/// append. Readers therefore never observe a half-applied batch.
pub struct MatchEngine {
    config: EngineConfig,
    embedder: Arc<dyn Embedder>,
    workers: EmbedWorkers,
    scorer: Scorer,
    store: RwLock<JobStore>,
    ingest_lock: Mutex<()>,
}

impl MatchEngine {
    pub fn new(config: EngineConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        if embedder.dim() != config.embedding_dim {
            return Err(Error::InvalidConfig(format!(
                "embedder produces {}-dimensional vectors, engine expects {}",
                embedder.dim(),
                config.embedding_dim
            )));
        }

        let index = create_index(config.index_backend, config.embedding_dim)?;
        info!(
            backend = %index.backend(),
            dim = config.embedding_dim,
            kernel = crate::simd::DotKernel::detect().name(),
            "match engine initialized"
        );

        Ok(Self {
            workers: EmbedWorkers::new(config.max_embed_workers),
            scorer: Scorer::new(config.scoring),
            config,
            embedder,
            store: RwLock::new(JobStore::new(index)),
            ingest_lock: Mutex::new(()),
        })
    }

    /// Engine backed by the built-in [`HashingEmbedder`]
    pub fn with_hashing_embedder(config: EngineConfig) -> Result<Self> {
        let embedder = Arc::new(HashingEmbedder::new(config.embedding_dim));
        Self::new(config, embedder)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> IndexBackend {
        self.store.read().index.backend()
    }

    pub fn len(&self) -> usize {
        self.store.read().catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Catalog length and index row count, read under one lock
    pub fn sizes(&self) -> (usize, usize) {
        let store = self.store.read();
        (store.catalog.len(), store.index.len())
    }

    pub fn get_job(&self, id: &str) -> Option<JobRecord> {
        self.store.read().catalog.get_by_id(id).cloned()
    }

    /// Run `f` with shared access to the store
    pub fn read<R>(&self, f: impl FnOnce(&JobStore) -> R) -> R {
        f(&self.store.read())
    }

    pub fn ingest(&self, jobs: Vec<JobInput>) -> Result<IngestReport> {
        self.ingest_with(jobs, |_| Ok(()))
    }

    /// Ingest a batch, calling `before_commit` with the fully embedded rows
    /// right before they are appended. An error from the hook aborts the
    /// batch with nothing appended.
    pub fn ingest_with<F>(&self, jobs: Vec<JobInput>, before_commit: F) -> Result<IngestReport>
    where
        F: FnOnce(&PendingBatch<'_>) -> Result<()>,
    {
        let candidates = jobs
            .into_iter()
            .map(JobRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        let _writer = self.ingest_lock.lock();

        let (fresh, skipped_duplicates, first_row) = {
            let store = self.store.read();
            let (fresh, skipped) = store.catalog.filter_new(candidates);
            (fresh, skipped, store.catalog.len())
        };

        if fresh.is_empty() {
            debug!(skipped_duplicates, "nothing new to ingest");
            return Ok(IngestReport {
                ingested: 0,
                skipped_duplicates,
                total: first_row,
            });
        }

        let texts: Vec<String> = fresh.iter().map(JobRecord::combined_text).collect();
        let vectors = self.workers.embed(&self.embedder, texts, self.config.embed_timeout)?;

        before_commit(&PendingBatch {
            first_row,
            records: &fresh,
            vectors: &vectors,
        })?;

        let ingested = fresh.len();
        let total = {
            let mut store = self.store.write();
            store.append(fresh, vectors)?;
            store.catalog.len()
        };

        info!(ingested, skipped_duplicates, total, "ingested jobs");
        Ok(IngestReport {
            ingested,
            skipped_duplicates,
            total,
        })
    }

    /// Rebuild state from persisted rows, in row order, without embedding.
    pub fn restore(&self, records: Vec<JobRecord>, vectors: Vec<Vector>) -> Result<usize> {
        let _writer = self.ingest_lock.lock();
        let count = records.len();
        self.store.write().append(records, vectors)?;
        info!(restored = count, "restored jobs");
        Ok(count)
    }

    /// Rank catalog jobs for `profile`, best first
    pub fn match_profile(&self, profile: &UserProfile) -> Result<Vec<MatchResult>> {
        self.match_profile_at(profile, Utc::now().naive_utc())
    }

    /// [`MatchEngine::match_profile`] with an explicit clock for recency
    pub fn match_profile_at(&self, profile: &UserProfile, now: NaiveDateTime) -> Result<Vec<MatchResult>> {
        if self.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let query_text = profile.query_text();
        if query_text.is_empty() {
            return Err(EmbeddingError::DegenerateText { position: 0 }.into());
        }
        let query = self
            .workers
            .embed(&self.embedder, vec![query_text], self.config.embed_timeout)?
            .pop()
            .ok_or(EmbeddingError::CountMismatch { expected: 1, actual: 0 })?;

        let requested = profile
            .top_k
            .filter(|k| *k > 0)
            .unwrap_or(self.config.default_top_k);

        let mut ranked: Vec<(usize, MatchResult)> = {
            let store = self.store.read();
            store.check_alignment()?;
            if store.catalog.is_empty() {
                return Err(Error::EmptyCatalog);
            }

            let k = requested.min(store.catalog.len());
            let hits = store.index.search(&query, k)?;
            hits.into_iter()
                .map(|hit| -> Result<(usize, MatchResult)> {
                    let job = store.catalog.get(hit.row).ok_or(Error::IndexInconsistency {
                        catalog: store.catalog.len(),
                        index: store.index.len(),
                    })?;
                    Ok((hit.row, self.scorer.score_at(profile, job, hit.score, now)))
                })
                .collect::<Result<_>>()?
        };

        ranked.sort_by(|(row_a, a), (row_b, b)| {
            b.match_percent
                .total_cmp(&a.match_percent)
                .then(row_a.cmp(row_b))
        });

        debug!(requested, returned = ranked.len(), "matched profile");
        Ok(ranked.into_iter().map(|(_, result)| result).collect())
    }
}
