//! Generation worker: polls for queued jobs and drives them through the
//! pipeline. Any number of worker processes can run against the same
//! database; the orchestrator's conditional claim keeps them from
//! duplicating billable work.

mod config;

use std::sync::Arc;

use mascotly_db::models::job::GenerationJob;
use mascotly_db::repositories::JobRepo;
use mascotly_pipeline::{
    GenerationRequest, InputImage, JobParameters, Orchestrator, PgStore, RunOutcome,
};
use mascotly_providers::http::{HttpImageProvider, HttpVideoProvider, HttpVisionProvider};
use mascotly_storage::S3ObjectStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mascotly_worker=debug,mascotly_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(poll_secs = config.poll_interval.as_secs(), "Loaded worker configuration");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = mascotly_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    mascotly_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    mascotly_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let http = reqwest::Client::new();
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(HttpVisionProvider::new(
            http.clone(),
            config.vision_api_url.clone(),
            config.vision_api_key.clone(),
            config.vision_model.clone(),
        )),
        Arc::new(HttpImageProvider::new(
            http.clone(),
            config.image_api_url.clone(),
            config.image_api_key.clone(),
            config.image_model.clone(),
        )),
        Arc::new(HttpVideoProvider::new(
            http.clone(),
            config.video_api_url.clone(),
            config.video_api_key.clone(),
            config.video_model.clone(),
        )),
        Arc::new(
            S3ObjectStore::from_env(config.s3_bucket.clone(), config.asset_base_url.clone())
                .await,
        ),
        config.pipeline.clone(),
    ));

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, finishing current job");
        signal_token.cancel();
    });

    tracing::info!("Worker started");
    poll_loop(&pool, &http, &orchestrator, &config, &cancel).await;
    tracing::info!("Worker stopped");
}

async fn poll_loop(
    pool: &mascotly_db::DbPool,
    http: &reqwest::Client,
    orchestrator: &Orchestrator,
    config: &WorkerConfig,
    cancel: &CancellationToken,
) {
    while !cancel.is_cancelled() {
        let next = match JobRepo::find_next_queued(pool).await {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(error = %e, "Failed to poll for queued jobs");
                None
            }
        };

        match next {
            Some(job) => process_job(pool, http, orchestrator, job, cancel).await,
            None => {
                tokio::select! {
                    _ = tokio::time::sleep(config.poll_interval) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }
    }
}

async fn process_job(
    pool: &mascotly_db::DbPool,
    http: &reqwest::Client,
    orchestrator: &Orchestrator,
    job: GenerationJob,
    cancel: &CancellationToken,
) {
    let request = match build_request(http, &job).await {
        Ok(request) => request,
        Err(detail) => {
            tracing::warn!(job_id = %job.job_id, detail = %detail, "Unusable job parameters");
            // Claim first so the failure transition is valid; losing the
            // claim means another worker owns the job.
            match JobRepo::try_claim(pool, &job.job_id).await {
                Ok(true) => {
                    if let Err(e) = JobRepo::fail(pool, &job.job_id, "validation", &detail).await {
                        tracing::error!(job_id = %job.job_id, error = %e, "Failed to record job failure");
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(job_id = %job.job_id, error = %e, "Failed to claim unusable job");
                }
            }
            return;
        }
    };

    match orchestrator.run(request, cancel).await {
        Ok(RunOutcome::Completed(manifest)) => {
            tracing::info!(
                job_id = %job.job_id,
                succeeded = manifest.succeeded.len(),
                "Job finished"
            );
        }
        Ok(RunOutcome::Failed { kind, detail }) => {
            tracing::warn!(job_id = %job.job_id, kind = kind.as_str(), detail = %detail, "Job failed");
        }
        Ok(RunOutcome::ReplayedTerminal { .. }) | Ok(RunOutcome::OwnedElsewhere) => {}
        Err(e) => {
            tracing::error!(job_id = %job.job_id, error = %e, "Pipeline infrastructure error");
        }
    }
}

/// Rebuild the orchestrator request from a stored job row, fetching the
/// referenced product photo when the image phase needs it.
async fn build_request(
    http: &reqwest::Client,
    job: &GenerationJob,
) -> Result<GenerationRequest, String> {
    let params: JobParameters = serde_json::from_value(job.parameters.clone())
        .map_err(|e| format!("invalid job parameters: {e}"))?;

    let input_image = match &params.input_image_url {
        Some(url) => Some(fetch_image(http, url).await?),
        None => None,
    };

    Ok(GenerationRequest {
        job_id: job.job_id.clone(),
        tenant_id: job.tenant_id,
        persona_id: job.persona_id,
        phase: params.phase,
        input_image,
        style: params.style,
    })
}

async fn fetch_image(http: &reqwest::Client, url: &str) -> Result<InputImage, String> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| format!("failed to fetch input image: {e}"))?;
    if !response.status().is_success() {
        return Err(format!(
            "input image fetch returned HTTP {}",
            response.status().as_u16()
        ));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed to read input image body: {e}"))?;
    Ok(InputImage {
        bytes: bytes.to_vec(),
        content_type,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
