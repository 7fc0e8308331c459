// Integration tests for JobMatch
use chrono::NaiveDate;
use jobmatch_core::{
    EngineConfig, Error, HashingEmbedder, IndexBackend, JobInput, MatchEngine, PostedDate,
    UserProfile,
};
use jobmatch_storage::StorageManager;
use std::sync::Arc;

fn engine(backend: IndexBackend) -> MatchEngine {
    MatchEngine::with_hashing_embedder(EngineConfig {
        embedding_dim: 128,
        index_backend: backend,
        ..Default::default()
    })
    .unwrap()
}

fn posting(id: &str, title: &str, skills: &[&str]) -> JobInput {
    JobInput {
        required_skills: Some(skills.iter().map(|s| s.to_string()).collect()),
        ..JobInput::new(id, title)
    }
}

fn catalog() -> Vec<JobInput> {
    vec![
        posting("1", "Data Scientist", &["Python", "SQL", "Pandas"]),
        posting("2", "Backend Engineer", &["Rust", "Postgres"]),
        posting("3", "Registered Nurse", &["Patient care", "Triage"]),
        posting("4", "Sous Chef", &["Menu planning", "Knife skills"]),
        posting("5", "ML Engineer", &["Python", "PyTorch"]),
        posting("6", "Frontend Developer", &["TypeScript", "React"]),
    ]
}

#[test]
fn test_single_remote_job_end_to_end() {
    let engine = engine(IndexBackend::Auto);
    engine
        .ingest(vec![JobInput {
            company: Some("Acme".into()),
            description: Some("Build models on tabular data".into()),
            min_years_experience: Some(2),
            remote: Some(true),
            posted_date: Some(PostedDate::Text("2024-01-15".into())),
            ..posting("1", "Data Scientist", &["Python", "SQL"])
        }])
        .unwrap();

    let profile = UserProfile {
        location: Some(String::new()),
        years_experience: 2,
        top_k: Some(1),
        ..UserProfile::new(["Python"])
    };
    let now = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let results = engine.match_profile_at(&profile, now).unwrap();

    assert_eq!(results.len(), 1);
    let top = &results[0];
    assert_eq!(top.job.id, "1");
    assert_eq!(top.breakdown.experience, 100.0);
    assert_eq!(top.breakdown.location, 100.0);
    assert_eq!(top.breakdown.recency, 100.0);
    assert!((0.0..=100.0).contains(&top.match_percent));
}

#[test]
fn test_identical_text_different_ids_are_both_kept() {
    let engine = engine(IndexBackend::Auto);
    let report = engine
        .ingest(vec![
            posting("a", "Data Scientist", &["Python"]),
            posting("b", "Data Scientist", &["Python"]),
        ])
        .unwrap();
    assert_eq!(report.ingested, 2);
    assert_eq!(engine.sizes(), (2, 2));
}

#[test]
fn test_top_k_larger_than_catalog_is_clamped() {
    let engine = engine(IndexBackend::Auto);
    engine.ingest(catalog()).unwrap();

    let profile = UserProfile {
        top_k: Some(50),
        ..UserProfile::new(["Python"])
    };
    let results = engine.match_profile(&profile).unwrap();
    assert_eq!(results.len(), 6);
    assert!(results
        .windows(2)
        .all(|w| w[0].match_percent >= w[1].match_percent));

    let single = engine_with(vec![posting("solo", "Data Scientist", &["Python"])]);
    assert_eq!(single.match_profile(&profile).unwrap().len(), 1);
}

fn engine_with(jobs: Vec<JobInput>) -> MatchEngine {
    let engine = engine(IndexBackend::Auto);
    engine.ingest(jobs).unwrap();
    engine
}

#[test]
fn test_no_experience_requirement_and_no_experience() {
    let engine = engine(IndexBackend::Auto);
    engine
        .ingest(vec![JobInput {
            min_years_experience: Some(0),
            ..posting("1", "Junior Analyst", &["Excel"])
        }])
        .unwrap();

    let profile = UserProfile {
        years_experience: 0,
        ..UserProfile::new(["Excel"])
    };
    let results = engine.match_profile(&profile).unwrap();
    assert_eq!(results[0].breakdown.experience, 100.0);
}

#[test]
fn test_reingesting_is_idempotent() {
    let engine = engine(IndexBackend::Auto);
    engine.ingest(catalog()).unwrap();
    let report = engine.ingest(catalog()).unwrap();

    assert_eq!(report.ingested, 0);
    assert_eq!(report.skipped_duplicates, 6);
    assert_eq!(engine.sizes(), (6, 6));
}

#[test]
fn test_backends_rank_identically() {
    let flat = engine(IndexBackend::Flat);
    let brute = engine(IndexBackend::BruteForce);
    flat.ingest(catalog()).unwrap();
    brute.ingest(catalog()).unwrap();

    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    for skills in [vec!["Python"], vec!["Rust", "Postgres"], vec!["Triage"]] {
        let profile = UserProfile {
            top_k: Some(4),
            ..UserProfile::new(skills)
        };
        let a = flat.match_profile_at(&profile, now).unwrap();
        let b = brute.match_profile_at(&profile, now).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_empty_catalog_is_an_error() {
    let engine = engine(IndexBackend::Auto);
    let err = engine.match_profile(&UserProfile::new(["Python"]));
    assert!(matches!(err, Err(Error::EmptyCatalog)));
}

#[test]
fn test_storage_reload_preserves_results() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        embedding_dim: 128,
        ..Default::default()
    };
    let profile = UserProfile {
        top_k: Some(3),
        ..UserProfile::new(["Python", "SQL"])
    };
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let before = {
        let storage =
            StorageManager::open(dir.path(), config.clone(), Arc::new(HashingEmbedder::new(128)))
                .unwrap();
        storage.ingest(catalog()).unwrap();
        storage.engine().match_profile_at(&profile, now).unwrap()
    };

    let storage =
        StorageManager::open(dir.path(), config, Arc::new(HashingEmbedder::new(128))).unwrap();
    assert_eq!(storage.engine().sizes(), (6, 6));
    let after = storage.engine().match_profile_at(&profile, now).unwrap();
    assert_eq!(before, after);
}
