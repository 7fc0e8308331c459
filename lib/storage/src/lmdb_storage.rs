// LMDB-backed job table: one row per job id, plus an ordering table so a
// reload rebuilds catalog and index in ingestion order.
use anyhow::{bail, Context, Result};
use heed::byteorder::BE;
use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions};
use jobmatch_core::{JobRecord, Vector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const DB_JOBS: &str = "jobs";
const DB_ORDER: &str = "order";

/// Default LMDB map size (1 GiB)
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// On-disk value of the `jobs` table
#[derive(Debug, Serialize, Deserialize)]
struct StoredJob {
    row: u64,
    record: JobRecord,
    /// Little-endian `f32` embedding
    embedding: Vec<u8>,
}

pub struct LmdbStorage {
    env: Arc<Env>,
    jobs_db: Database<Str, Bytes>,
    order_db: Database<U64<BE>, Str>,
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn with_map_size<P: AsRef<Path>>(path: P, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path.as_ref())
                .with_context(|| format!("opening LMDB environment at {:?}", path.as_ref()))?
        });

        let mut wtxn = env.write_txn()?;
        let jobs_db = env.create_database(&mut wtxn, Some(DB_JOBS))?;
        let order_db = env.create_database(&mut wtxn, Some(DB_ORDER))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            jobs_db,
            order_db,
        })
    }

    /// Write a batch of rows starting at `first_row` in one transaction.
    pub fn save_batch(&self, first_row: usize, records: &[JobRecord], vectors: &[Vector]) -> Result<()> {
        if records.len() != vectors.len() {
            bail!(
                "batch has {} records but {} embeddings",
                records.len(),
                vectors.len()
            );
        }

        let mut wtxn = self.env.write_txn()?;
        for (offset, (record, vector)) in records.iter().zip(vectors).enumerate() {
            let row = (first_row + offset) as u64;
            if self.jobs_db.get(&wtxn, &record.id)?.is_some() {
                bail!("job {} is already stored", record.id);
            }
            let stored = StoredJob {
                row,
                record: record.clone(),
                embedding: vector.to_le_bytes(),
            };
            let bytes = bincode::serialize(&stored)?;
            self.jobs_db.put(&mut wtxn, &record.id, &bytes)?;
            self.order_db.put(&mut wtxn, &row, &record.id)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    /// All rows in row order
    pub fn load_all(&self) -> Result<(Vec<JobRecord>, Vec<Vector>)> {
        let rtxn = self.env.read_txn()?;
        let mut records = Vec::new();
        let mut vectors = Vec::new();

        for (expected_row, entry) in self.order_db.iter(&rtxn)?.enumerate() {
            let (row, id) = entry?;
            if row != expected_row as u64 {
                bail!("row sequence has a gap: expected {expected_row}, found {row}");
            }
            let bytes = self
                .jobs_db
                .get(&rtxn, id)?
                .with_context(|| format!("row {row} points at missing job {id}"))?;
            let stored: StoredJob = bincode::deserialize(bytes)?;
            if stored.row != row {
                bail!("job {id} claims row {} but is listed at row {row}", stored.row);
            }
            let vector = Vector::from_le_bytes(&stored.embedding)
                .with_context(|| format!("job {id} has a malformed embedding"))?;
            records.push(stored.record);
            vectors.push(vector);
        }

        Ok((records, vectors))
    }
}
