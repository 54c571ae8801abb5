use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::applications::screening::CvScreener;
use crate::auth::jwt::JwtConfig;
use crate::config::Config;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::openai::OpenAiClient;
use crate::videos::youtube::YouTubeClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Cache for YouTube search results.
    pub redis: RedisClient,
    /// Uploaded CV storage.
    pub s3: S3Client,
    pub gemini: GeminiClient,
    pub openai: OpenAiClient,
    pub youtube: YouTubeClient,
    pub jwt: JwtConfig,
    pub config: Config,
    /// Pluggable CV screener. Default: Gemini. Swap via CV_SCREENER env.
    pub screener: Arc<dyn CvScreener>,
}
