//! GET /api/videos: job-hunting tips from YouTube.

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extract::QueryParams;
use crate::state::AppState;
use crate::videos::cache::{cache_key, get_cached, store};
use crate::videos::youtube::Video;

pub const DEFAULT_QUERY: &str = "tips cari kerja indonesia";
pub const DEFAULT_MAX_RESULTS: u32 = 12;
pub const MAX_RESULTS_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosQuery {
    pub q: Option<String>,
    pub max_results: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<Video>,
    pub success: bool,
}

/// Blank `q` falls back to the default; an unparsable `maxResults` too.
fn resolve_params(query: VideosQuery) -> (String, u32) {
    let q = query
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());

    let max_results = query
        .max_results
        .and_then(|m| m.trim().parse::<i64>().ok())
        .map(|m| m.clamp(1, i64::from(MAX_RESULTS_LIMIT)) as u32)
        .unwrap_or(DEFAULT_MAX_RESULTS);

    (q, max_results)
}

pub async fn handle_list_videos(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<VideosQuery>,
) -> Result<Json<VideosResponse>, AppError> {
    let (q, max_results) = resolve_params(query);
    let key = cache_key(&q, max_results);

    if let Some(videos) = get_cached(&state.redis, &key).await {
        return Ok(Json(VideosResponse {
            videos,
            success: true,
        }));
    }

    let videos = state
        .youtube
        .search_videos(&q, max_results)
        .await
        .map_err(|e| {
            warn!(query = %q, "YouTube search failed: {e}");
            AppError::Upstream("Failed to fetch videos".to_string())
        })?;

    store(&state.redis, &key, &videos).await;
    info!(query = %q, count = videos.len(), "fetched videos from YouTube");

    Ok(Json(VideosResponse {
        videos,
        success: true,
    }))
}
