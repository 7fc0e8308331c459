use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use jobmatch_core::{Error, JobInput, JobRecord, MatchResult, ScoreBreakdown, UserProfile};
use jobmatch_storage::StorageManager;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    jobs: usize,
    backend: String,
    embedding_dim: usize,
    persistent: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestResponse {
    ingested: usize,
    skipped_duplicates: usize,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchView {
    job: JobRecord,
    match_percent: f32,
    similarity: f32,
    breakdown: ScoreBreakdown,
}

impl From<MatchResult> for MatchView {
    fn from(result: MatchResult) -> Self {
        let b = result.breakdown;
        Self {
            job: result.job,
            match_percent: round1(result.match_percent),
            similarity: result.similarity,
            breakdown: ScoreBreakdown {
                skill: round1(b.skill),
                experience: round1(b.experience),
                location: round1(b.location),
                recency: round1(b.recency),
            },
        }
    }
}

#[derive(Serialize)]
struct MatchResponse {
    results: Vec<MatchView>,
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Order on the displayed (rounded) percentage, catalog row on ties.
fn into_views(results: Vec<MatchResult>, row_of: impl Fn(&str) -> Option<usize>) -> Vec<MatchView> {
    let mut views: Vec<(usize, MatchView)> = results
        .into_iter()
        .map(|r| (row_of(&r.job.id).unwrap_or(usize::MAX), MatchView::from(r)))
        .collect();
    views.sort_by(|(row_a, a), (row_b, b)| {
        b.match_percent
            .total_cmp(&a.match_percent)
            .then(row_a.cmp(row_b))
    });
    views.into_iter().map(|(_, view)| view).collect()
}

pub struct RestApi;

impl RestApi {
    pub async fn start(storage: Arc<StorageManager>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).configure(configure(storage.clone()))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and the handler tests
pub fn configure(storage: Arc<StorageManager>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(storage))
            .route("/", web::get().to(root))
            .route("/health", web::get().to(health))
            .route("/ingest", web::post().to(ingest))
            .route("/match", web::post().to(match_profile))
            .route("/jobs/{id}", web::get().to(get_job));
    }
}

async fn root() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ServiceInfo {
        service: "JobMatch API",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(storage: web::Data<Arc<StorageManager>>) -> ActixResult<HttpResponse> {
    let engine = storage.engine();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        jobs: engine.len(),
        backend: engine.backend().to_string(),
        embedding_dim: engine.config().embedding_dim,
        persistent: storage.is_persistent(),
    }))
}

async fn ingest(
    storage: web::Data<Arc<StorageManager>>,
    req: web::Json<Vec<JobInput>>,
) -> ActixResult<HttpResponse> {
    let storage = storage.get_ref().clone();
    let jobs = req.into_inner();

    match web::block(move || storage.ingest(jobs)).await? {
        Ok(report) => Ok(HttpResponse::Ok().json(IngestResponse {
            ingested: report.ingested,
            skipped_duplicates: report.skipped_duplicates,
            total: report.total,
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn match_profile(
    storage: web::Data<Arc<StorageManager>>,
    req: web::Json<UserProfile>,
) -> ActixResult<HttpResponse> {
    let storage = storage.get_ref().clone();
    let profile = req.into_inner();

    let ranked = web::block(move || -> jobmatch_core::Result<Vec<MatchView>> {
        let results = storage.match_profile(&profile)?;
        Ok(storage
            .engine()
            .read(|store| into_views(results, |id| store.catalog().row_of(id))))
    })
    .await?;

    match ranked {
        Ok(results) => Ok(HttpResponse::Ok().json(MatchResponse { results })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_job(
    storage: web::Data<Arc<StorageManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match storage.engine().get_job(&id) {
        Some(job) => Ok(HttpResponse::Ok().json(job)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Job {id} not found")
        }))),
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::EmptyCatalog => StatusCode::NOT_FOUND,
        Error::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvalidJob(_) => StatusCode::BAD_REQUEST,
        Error::IndexInconsistency { .. }
        | Error::InvalidDimension { .. }
        | Error::Storage(_)
        | Error::Io(_)
        | Error::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        warn!(error = %err, "request rejected");
    }
    HttpResponse::build(status).json(serde_json::json!({
        "error": err.to_string()
    }))
}
