mod analysis;
mod applications;
mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod events;
mod extract;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod state;
mod videos;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::applications::screening::{CvScreener, GeminiScreener, KeywordScreener};
use crate::auth::jwt::JwtConfig;
use crate::config::{Config, ScreenerBackend};
use crate::db::{create_pool, run_migrations};
use crate::llm_client::gemini::{GeminiClient, GEMINI_MODEL};
use crate::llm_client::openai::{OpenAiClient, OPENAI_MODEL};
use crate::routes::{build_router, MAX_UPLOAD_BYTES};
use crate::state::AppState;
use crate::videos::youtube::YouTubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize hosted model clients
    let gemini = GeminiClient::new(config.gemini_api_key.clone())?;
    let openai = OpenAiClient::new(config.openai_api_key.clone())?;
    info!("LLM clients initialized (gemini: {GEMINI_MODEL}, openai: {OPENAI_MODEL})");

    let youtube = YouTubeClient::new(config.youtube_api_key.clone())?;

    // Initialize CV screener (Gemini by default, swap via CV_SCREENER)
    let screener: Arc<dyn CvScreener> = match config.screener {
        ScreenerBackend::Gemini => Arc::new(GeminiScreener(gemini.clone())),
        ScreenerBackend::Keyword => Arc::new(KeywordScreener),
    };
    info!("CV screener: {:?}", config.screener);

    let jwt = JwtConfig {
        secret: config.auth_secret.clone(),
        ttl_hours: config.token_ttl_hours,
    };

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        gemini,
        openai,
        youtube,
        jwt,
        config: config.clone(),
        screener,
    };

    // Build router
    let app = build_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "jobboard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
