//! Redis cache for video search results. Cache failures never fail a request.

use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::videos::youtube::Video;

pub const CACHE_TTL_SECS: u64 = 3600;

pub fn cache_key(query: &str, max_results: u32) -> String {
    format!("videos:{}:{}", max_results, query.trim().to_lowercase())
}

async fn read_raw(client: &redis::Client, key: &str) -> redis::RedisResult<Option<String>> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.get(key).await
}

async fn write_raw(client: &redis::Client, key: &str, raw: String) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.set_ex(key, raw, CACHE_TTL_SECS).await
}

pub async fn get_cached(client: &redis::Client, key: &str) -> Option<Vec<Video>> {
    match read_raw(client, key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(videos) => {
                debug!(key, "video cache hit");
                Some(videos)
            }
            Err(e) => {
                warn!(key, "discarding unreadable cached videos: {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, "video cache read failed: {e}");
            None
        }
    }
}

pub async fn store(client: &redis::Client, key: &str, videos: &[Video]) {
    let raw = match serde_json::to_string(videos) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, "could not serialize videos for cache: {e}");
            return;
        }
    };

    if let Err(e) = write_raw(client, key, raw).await {
        warn!(key, "video cache write failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes_query() {
        assert_eq!(cache_key("  Tips Interview ", 12), "videos:12:tips interview");
        assert_ne!(cache_key("tips", 12), cache_key("tips", 6));
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        assert!(get_cached(&client, "videos:1:x").await.is_none());
        store(&client, "videos:1:x", &[]).await;
    }
}
