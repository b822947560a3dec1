use std::time::Duration;

use mascotly_core::limits::LimitConfig;
use mascotly_pipeline::PipelineConfig;

/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to poll for queued jobs when the queue is empty.
    pub poll_interval: Duration,
    pub vision_api_url: String,
    pub vision_api_key: String,
    pub vision_model: String,
    pub image_api_url: String,
    pub image_api_key: String,
    pub image_model: String,
    pub video_api_url: String,
    pub video_api_key: String,
    pub video_model: String,
    pub s3_bucket: String,
    /// Public base URL assets are served from (CDN or bucket endpoint).
    pub asset_base_url: String,
    pub pipeline: PipelineConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                   |
    /// |-----------------------|---------------------------|
    /// | `POLL_INTERVAL_SECS`  | `2`                       |
    /// | `VISION_API_URL`      | `http://localhost:9701`   |
    /// | `VISION_API_KEY`      | (empty)                   |
    /// | `VISION_MODEL`        | `vision-default`          |
    /// | `IMAGE_API_URL`       | `http://localhost:9702`   |
    /// | `IMAGE_API_KEY`       | (empty)                   |
    /// | `IMAGE_MODEL`         | `image-default`           |
    /// | `VIDEO_API_URL`       | `http://localhost:9703`   |
    /// | `VIDEO_API_KEY`       | (empty)                   |
    /// | `VIDEO_MODEL`         | `video-default`           |
    /// | `S3_BUCKET`           | `mascotly-assets`         |
    /// | `ASSET_BASE_URL`      | `http://localhost:9000/mascotly-assets` |
    /// | `CALL_TIMEOUT_SECS`   | `120`                     |
    /// | `PHASE_TIMEOUT_SECS`  | `900`                     |
    /// | `SPEND_CEILING_CENTS` | `5000`                    |
    /// | `COOLDOWN_SECS`       | `300`                     |
    /// | `MAX_INFLIGHT_JOBS`   | `32`                      |
    pub fn from_env() -> Self {
        let pipeline = PipelineConfig {
            limits: LimitConfig {
                spend_ceiling_cents: env_parse("SPEND_CEILING_CENTS", 5_000),
                cooldown: Duration::from_secs(env_parse("COOLDOWN_SECS", 300)),
                max_inflight_jobs: env_parse("MAX_INFLIGHT_JOBS", 32),
                ..LimitConfig::default()
            },
            call_timeout: Duration::from_secs(env_parse("CALL_TIMEOUT_SECS", 120)),
            phase_timeout: Duration::from_secs(env_parse("PHASE_TIMEOUT_SECS", 900)),
            ..PipelineConfig::default()
        };

        Self {
            poll_interval: Duration::from_secs(env_parse("POLL_INTERVAL_SECS", 2)),
            vision_api_url: env_or("VISION_API_URL", "http://localhost:9701"),
            vision_api_key: env_or("VISION_API_KEY", ""),
            vision_model: env_or("VISION_MODEL", "vision-default"),
            image_api_url: env_or("IMAGE_API_URL", "http://localhost:9702"),
            image_api_key: env_or("IMAGE_API_KEY", ""),
            image_model: env_or("IMAGE_MODEL", "image-default"),
            video_api_url: env_or("VIDEO_API_URL", "http://localhost:9703"),
            video_api_key: env_or("VIDEO_API_KEY", ""),
            video_model: env_or("VIDEO_MODEL", "video-default"),
            s3_bucket: env_or("S3_BUCKET", "mascotly-assets"),
            asset_base_url: env_or("ASSET_BASE_URL", "http://localhost:9000/mascotly-assets"),
            pipeline,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid number")),
        Err(_) => default,
    }
}
