use crate::{Error, JobRecord, Result};
use ahash::AHashMap;

/// Ordered, deduplicated job records. Row `i` here is row `i` of the
/// vector index.
#[derive(Debug, Default, Clone)]
pub struct JobCatalog {
    records: Vec<JobRecord>,
    rows_by_id: AHashMap<String, usize>,
}

impl JobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows_by_id.contains_key(id)
    }

    pub fn get(&self, row: usize) -> Option<&JobRecord> {
        self.records.get(row)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&JobRecord> {
        self.rows_by_id.get(id).and_then(|&row| self.records.get(row))
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.rows_by_id.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    /// Keep only records whose id is new to the catalog, first occurrence
    /// winning within the batch. Returns the survivors and how many were
    /// dropped.
    pub fn filter_new(&self, candidates: Vec<JobRecord>) -> (Vec<JobRecord>, usize) {
        let total = candidates.len();
        let mut batch_ids = ahash::AHashSet::with_capacity(total);
        let fresh: Vec<JobRecord> = candidates
            .into_iter()
            .filter(|job| !self.contains(&job.id) && batch_ids.insert(job.id.clone()))
            .collect();
        let skipped = total - fresh.len();
        (fresh, skipped)
    }

    /// Check that `records` can be appended as a unit
    pub fn check_appendable(&self, records: &[JobRecord]) -> Result<()> {
        let mut batch_ids = ahash::AHashSet::with_capacity(records.len());
        for job in records {
            if self.contains(&job.id) || !batch_ids.insert(job.id.as_str()) {
                return Err(Error::InvalidJob(format!("duplicate job id: {}", job.id)));
            }
        }
        Ok(())
    }

    /// Append after [`JobCatalog::check_appendable`] succeeded.
    pub(crate) fn extend_unchecked(&mut self, records: Vec<JobRecord>) {
        self.records.reserve(records.len());
        for job in records {
            self.rows_by_id.insert(job.id.clone(), self.records.len());
            self.records.push(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobInput;

    fn job(id: &str) -> JobRecord {
        JobRecord::try_from(JobInput::new(id, format!("Job {id}"))).unwrap()
    }

    #[test]
    fn test_filter_new_first_write_wins() {
        let mut catalog = JobCatalog::new();
        catalog.extend_unchecked(vec![job("a")]);

        let mut second_b = job("b");
        second_b.title = "Other".into();
        let (fresh, skipped) = catalog.filter_new(vec![job("a"), job("b"), second_b, job("c")]);

        let ids: Vec<&str> = fresh.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(fresh[0].title, "Job b");
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_rows_follow_insertion_order() {
        let mut catalog = JobCatalog::new();
        catalog.extend_unchecked(vec![job("x"), job("y")]);
        catalog.extend_unchecked(vec![job("z")]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.row_of("z"), Some(2));
        assert_eq!(catalog.get(1).map(|j| j.id.as_str()), Some("y"));
        assert_eq!(catalog.get_by_id("x").map(|j| j.title.as_str()), Some("Job x"));
        assert!(catalog.get_by_id("missing").is_none());
    }

    #[test]
    fn test_check_appendable_rejects_duplicates() {
        let mut catalog = JobCatalog::new();
        catalog.extend_unchecked(vec![job("a")]);
        assert!(catalog.check_appendable(&[job("a")]).is_err());
        assert!(catalog.check_appendable(&[job("b"), job("b")]).is_err());
        assert!(catalog.check_appendable(&[job("b"), job("c")]).is_ok());
    }
}
