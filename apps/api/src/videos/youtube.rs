//! YouTube Data API v3 search client.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API error {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoDuration {
    /// 4 to 20 minutes.
    Medium,
    /// Over 20 minutes.
    Long,
}

impl VideoDuration {
    fn as_param(self) -> &'static str {
        match self {
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: ItemId,
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// A video as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub published_at: String,
    pub url: String,
}

impl Video {
    /// `None` for results that are not videos (channels, playlists).
    fn from_item(item: SearchItem) -> Option<Self> {
        let id = item.id.video_id?;
        let thumbnails = item.snippet.thumbnails;
        let thumbnail = thumbnails
            .high
            .or(thumbnails.medium)
            .map(|t| t.url)
            .unwrap_or_default();

        Some(Self {
            url: format!("https://www.youtube.com/watch?v={id}"),
            id,
            title: item.snippet.title,
            description: item.snippet.description,
            thumbnail,
            channel_title: item.snippet.channel_title,
            published_at: item.snippet.published_at,
        })
    }
}

/// Concatenates the result lists in order, keeps the first occurrence of
/// each video id and truncates to `max_results`.
pub fn merge_results(lists: Vec<Vec<SearchItem>>, max_results: usize) -> Vec<Video> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter_map(Video::from_item)
        .filter(|video| seen.insert(video.id.clone()))
        .take(max_results)
        .collect()
}

#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self, YouTubeError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    pub async fn search(
        &self,
        query: &str,
        duration: VideoDuration,
        max_results: u32,
    ) -> Result<Vec<SearchItem>, YouTubeError> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("videoDuration", duration.as_param()),
                ("order", "relevance"),
                ("relevanceLanguage", "id"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(
            duration = duration.as_param(),
            results = parsed.items.len(),
            "YouTube search succeeded"
        );
        Ok(parsed.items)
    }

    /// Medium-length results first, then long ones.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<Video>, YouTubeError> {
        let (medium, long) = tokio::try_join!(
            self.search(query, VideoDuration::Medium, max_results),
            self.search(query, VideoDuration::Long, max_results),
        )?;
        Ok(merge_results(vec![medium, long], max_results as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, high: Option<&str>) -> SearchItem {
        serde_json::from_value(json!({
            "id": {"kind": "youtube#video", "videoId": id},
            "snippet": {
                "title": format!("Video {id}"),
                "description": "Tips interview",
                "thumbnails": {
                    "high": high.map(|url| json!({"url": url})),
                    "medium": {"url": format!("https://i.ytimg.com/{id}/mq.jpg")}
                },
                "channelTitle": "Karier ID",
                "publishedAt": "2024-03-01T00:00:00Z"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_merge_keeps_medium_first_and_dedupes() {
        let medium = vec![item("a", None), item("b", None)];
        let long = vec![item("b", None), item("c", None)];
        let ids: Vec<String> = merge_results(vec![medium, long], 10)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_truncates() {
        let medium = vec![item("a", None), item("b", None)];
        let long = vec![item("c", None)];
        assert_eq!(merge_results(vec![medium, long], 2).len(), 2);
    }

    #[test]
    fn test_video_mapping_prefers_high_thumbnail() {
        let videos = merge_results(vec![vec![item("x", Some("https://i.ytimg.com/x/hq.jpg"))]], 5);
        assert_eq!(videos[0].thumbnail, "https://i.ytimg.com/x/hq.jpg");
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=x");
        assert_eq!(videos[0].channel_title, "Karier ID");

        let videos = merge_results(vec![vec![item("y", None)]], 5);
        assert_eq!(videos[0].thumbnail, "https://i.ytimg.com/y/mq.jpg");
    }

    #[test]
    fn test_non_video_items_skipped() {
        let channel: SearchItem = serde_json::from_value(json!({
            "id": {"kind": "youtube#channel", "channelId": "UC123"},
            "snippet": {"title": "A channel"}
        }))
        .unwrap();
        assert!(merge_results(vec![vec![channel, item("v", None)]], 5)
            .iter()
            .all(|v| v.id == "v"));
    }

    #[test]
    fn test_video_serializes_camel_case() {
        let value = serde_json::to_value(&merge_results(vec![vec![item("z", None)]], 1)[0]).unwrap();
        assert_eq!(value["channelTitle"], "Karier ID");
        assert_eq!(value["publishedAt"], "2024-03-01T00:00:00Z");
    }
}
