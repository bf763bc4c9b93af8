use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Normalized video identifier, resolved once from whichever id shape the
/// platform returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel snapshot fetched per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    pub published_at: String,
}

/// Metrics derived from a video's counters and publish time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalytics {
    #[serde(rename = "daysFromPublished")]
    pub days_since_published: i64,
    /// Views per day.
    pub growth_rate: f64,
    pub comment_rate: f64,
    pub like_rate: f64,
    pub engagement_rate: f64,
    pub is_trending: bool,
    pub is_new: bool,
}

/// One video record: reference fields joined with detail fields, plus
/// analytics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: String,
    /// `H:MM:SS` or `M:SS`.
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub analytics: VideoAnalytics,
}

/// GET /api/youtube/keyword response.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeywordSearchResponse {
    pub videos: Vec<Video>,
    pub query: String,
    pub count: usize,
}

/// GET /api/youtube/search response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSearchResponse {
    pub channels: Vec<Channel>,
}

/// GET /api/youtube/channel/{id} response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDetailsResponse {
    pub channel: Channel,
    pub videos: Vec<Video>,
}

/// GET /api/youtube/channel/{id}/videos response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideosResponse {
    pub videos: Vec<Video>,
    pub channel_id: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub quota_units_spent: u64,
    pub cache_entries: u64,
}

/// Query string accepted by the search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQueryParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Query string accepted by the channel endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Views,
    Date,
    Growth,
    Comments,
    Likes,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "views" => Ok(SortKey::Views),
            "date" => Ok(SortKey::Date),
            "growth" => Ok(SortKey::Growth),
            "comments" => Ok(SortKey::Comments),
            "likes" => Ok(SortKey::Likes),
            other => Err(format!(
                "unknown sort '{other}', expected one of views, date, growth, comments, likes"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown order '{other}', expected asc or desc")),
        }
    }
}
