use config::{Config, Environment, File};
use serde::Deserialize;

/// Largest page the platform returns from a single search or listing call.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Longest accepted rate-limit window (one day).
pub const MAX_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Deserialize, Clone)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub keyword_max_results: u32,
    #[serde(default = "default_max_results")]
    pub channel_max_results: u32,
    #[serde(default = "default_channel_search_max_results")]
    pub channel_search_max_results: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            keyword_max_results: default_max_results(),
            channel_max_results: default_max_results(),
            channel_search_max_results: default_channel_search_max_results(),
        }
    }
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("keyword_max_results", &self.keyword_max_results)
            .field("channel_max_results", &self.channel_max_results)
            .field(
                "channel_search_max_results",
                &self.channel_search_max_results,
            )
            .finish()
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_results() -> u32 {
    50
}
fn default_channel_search_max_results() -> u32 {
    10
}

/// Per-client sliding window: `max_requests` per `window_secs`.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> u32 {
    10
}
fn default_window_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub keyword_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub channel_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub channel_search_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            keyword_ttl_secs: default_ttl_secs(),
            channel_ttl_secs: default_ttl_secs(),
            channel_search_ttl_secs: default_ttl_secs(),
            max_capacity: default_cache_capacity(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    1800 // 30 minutes
}
fn default_cache_capacity() -> u64 {
    1024
}

/// Thresholds and weights for the derived video metrics.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Smallest day count used as the growth-rate denominator.
    #[serde(default = "default_min_day_floor")]
    pub min_day_floor: i64,
    /// Views per day above which a recent video is trending.
    #[serde(default = "default_trending_growth_threshold")]
    pub trending_growth_threshold: f64,
    #[serde(default = "default_trending_recency_days")]
    pub trending_recency_days: i64,
    #[serde(default = "default_new_recency_days")]
    pub new_recency_days: i64,
    #[serde(default = "default_like_weight")]
    pub like_weight: f64,
    #[serde(default = "default_comment_weight")]
    pub comment_weight: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_day_floor: default_min_day_floor(),
            trending_growth_threshold: default_trending_growth_threshold(),
            trending_recency_days: default_trending_recency_days(),
            new_recency_days: default_new_recency_days(),
            like_weight: default_like_weight(),
            comment_weight: default_comment_weight(),
        }
    }
}

fn default_min_day_floor() -> i64 {
    1
}
fn default_trending_growth_threshold() -> f64 {
    10_000.0
}
fn default_trending_recency_days() -> i64 {
    7
}
fn default_new_recency_days() -> i64 {
    2
}
fn default_like_weight() -> f64 {
    0.7
}
fn default_comment_weight() -> f64 {
    0.3
}

impl AppConfig {
    /// Validate configuration before any component is constructed.
    pub fn validate(&self) -> Result<(), String> {
        if self.youtube.api_key.trim().is_empty() {
            return Err("youtube.api_key must be set. \
                 Set YOUTUBE_API_KEY or TUBESCOPE__YOUTUBE__API_KEY."
                .to_string());
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err("rate_limit.max_requests and rate_limit.window_secs must be positive"
                .to_string());
        }
        if self.rate_limit.window_secs > MAX_WINDOW_SECS {
            return Err(format!(
                "rate_limit.window_secs must be at most {MAX_WINDOW_SECS}"
            ));
        }
        if self.youtube.timeout_secs == 0 {
            return Err("youtube.timeout_secs must be positive".to_string());
        }
        if let Err(e) = url::Url::parse(&self.youtube.base_url) {
            return Err(format!("youtube.base_url is not a valid URL: {e}"));
        }
        for (name, value) in [
            ("keyword_max_results", self.youtube.keyword_max_results),
            ("channel_max_results", self.youtube.channel_max_results),
            (
                "channel_search_max_results",
                self.youtube.channel_search_max_results,
            ),
        ] {
            if value == 0 || value > MAX_PAGE_SIZE {
                return Err(format!(
                    "youtube.{name} must be between 1 and {MAX_PAGE_SIZE}"
                ));
            }
        }
        if self.analytics.min_day_floor < 1 {
            return Err("analytics.min_day_floor must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // TUBESCOPE__SERVER__PORT=8080, TUBESCOPE__RATE_LIMIT__MAX_REQUESTS=20, ...
        builder = builder.add_source(
            Environment::with_prefix("TUBESCOPE")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        // The platform key conventionally lives in YOUTUBE_API_KEY.
        if config.youtube.api_key.is_empty() {
            if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
                config.youtube.api_key = key;
            }
        }

        Ok(config)
    }
}
