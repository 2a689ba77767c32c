//! Platform collectors. Each collector wraps one social API and returns a
//! normalized batch of [`Post`]s; an unconfigured collector logs a warning
//! and yields an empty batch rather than failing the ingest cycle.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::warn;

use tidewatch_common::{GeoPoint, Platform, Post};

/// Query terms run against every platform's search endpoint.
pub const SEARCH_TERMS: &[&str] = &[
    "tsunami",
    "storm surge",
    "high waves",
    "coastal flooding",
    "ocean hazard",
    "sea level",
    "tidal wave",
    "coastal current",
];

const TWITTER_BASE_URL: &str = "https://api.twitter.com/2";
const FACEBOOK_BASE_URL: &str = "https://graph.facebook.com/v18.0";
const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Results requested per search term per cycle.
const RESULTS_PER_TERM: u32 = 10;

#[async_trait]
pub trait SocialCollector: Send + Sync {
    /// Fetch a batch of recent posts. A failed search for one term is logged
    /// and skipped; the call only errors when the whole platform is down.
    async fn collect(&self) -> Result<Vec<Post>>;

    fn platform(&self) -> Platform;
}

// ---------------------------------------------------------------------------
// Twitter
// ---------------------------------------------------------------------------

pub struct TwitterCollector {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

#[derive(Deserialize)]
struct TweetSearchResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    public_metrics: TweetMetrics,
    geo: Option<TweetGeo>,
}

#[derive(Deserialize, Default)]
struct TweetMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
}

#[derive(Deserialize)]
struct TweetGeo {
    coordinates: Option<TweetPoint>,
}

#[derive(Deserialize)]
struct TweetPoint {
    coordinates: Option<[f64; 2]>,
}

impl TwitterCollector {
    pub fn new(client: reqwest::Client, bearer_token: Option<String>) -> Self {
        Self {
            client,
            bearer_token,
        }
    }

    async fn search_term(&self, token: &str, term: &str) -> Result<Vec<Post>> {
        let resp = self
            .client
            .get(format!("{TWITTER_BASE_URL}/tweets/search/recent"))
            .bearer_auth(token)
            .query(&[
                ("query", format!("{term} -is:retweet lang:en")),
                ("max_results", RESULTS_PER_TERM.to_string()),
                (
                    "tweet.fields",
                    "created_at,author_id,public_metrics,geo".to_string(),
                ),
            ])
            .send()
            .await
            .context("Twitter search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Twitter search returned {status}: {body}");
        }

        let parsed: TweetSearchResponse =
            resp.json().await.context("Invalid Twitter search body")?;

        Ok(parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| {
                let mut engagement = HashMap::new();
                engagement.insert("likes".to_string(), tweet.public_metrics.like_count);
                engagement.insert("retweets".to_string(), tweet.public_metrics.retweet_count);
                engagement.insert("replies".to_string(), tweet.public_metrics.reply_count);

                let location = tweet
                    .geo
                    .and_then(|g| g.coordinates)
                    .and_then(|p| p.coordinates)
                    .map(|[lat, lng]| GeoPoint { lat, lng });

                Post {
                    platform: Platform::Twitter,
                    external_id: tweet.id,
                    content: tweet.text,
                    author: tweet.author_id,
                    location,
                    engagement,
                    created_at: tweet.created_at.unwrap_or_else(Utc::now),
                }
            })
            .collect())
    }
}

#[async_trait]
impl SocialCollector for TwitterCollector {
    async fn collect(&self) -> Result<Vec<Post>> {
        let Some(token) = self.bearer_token.clone() else {
            warn!("Twitter API not configured, skipping");
            return Ok(Vec::new());
        };

        let mut posts = Vec::new();
        for term in SEARCH_TERMS {
            match self.search_term(&token, term).await {
                Ok(batch) => posts.extend(batch),
                Err(e) => warn!(term, error = %e, "Twitter search term failed"),
            }
        }
        Ok(posts)
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }
}

// ---------------------------------------------------------------------------
// Facebook
// ---------------------------------------------------------------------------

pub struct FacebookCollector {
    client: reqwest::Client,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct GraphSearchResponse {
    #[serde(default)]
    data: Vec<GraphPost>,
}

#[derive(Deserialize)]
struct GraphPost {
    id: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    from: Option<GraphAuthor>,
    created_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct GraphAuthor {
    name: Option<String>,
}

impl FacebookCollector {
    pub fn new(client: reqwest::Client, access_token: Option<String>) -> Self {
        Self {
            client,
            access_token,
        }
    }

    async fn search_term(&self, token: &str, term: &str) -> Result<Vec<Post>> {
        let resp = self
            .client
            .get(format!("{FACEBOOK_BASE_URL}/search"))
            .query(&[
                ("q", term),
                ("type", "post"),
                ("fields", "id,message,from,created_time"),
                ("limit", "5"),
                ("access_token", token),
            ])
            .send()
            .await
            .context("Facebook search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Facebook search returned {status}: {body}");
        }

        let parsed: GraphSearchResponse =
            resp.json().await.context("Invalid Facebook search body")?;

        Ok(parsed
            .data
            .into_iter()
            .filter_map(|post| {
                let content = post.message?;
                Some(Post {
                    platform: Platform::Facebook,
                    external_id: post.id,
                    content,
                    author: post.from.and_then(|f| f.name),
                    location: None,
                    engagement: HashMap::new(),
                    created_at: post.created_time.unwrap_or_else(Utc::now),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SocialCollector for FacebookCollector {
    async fn collect(&self) -> Result<Vec<Post>> {
        let Some(token) = self.access_token.clone() else {
            warn!("Facebook API not configured, skipping");
            return Ok(Vec::new());
        };

        let mut posts = Vec::new();
        for term in SEARCH_TERMS {
            match self.search_term(&token, term).await {
                Ok(batch) => posts.extend(batch),
                Err(e) => warn!(term, error = %e, "Facebook search term failed"),
            }
        }
        Ok(posts)
    }

    fn platform(&self) -> Platform {
        Platform::Facebook
    }
}

// ---------------------------------------------------------------------------
// YouTube
// ---------------------------------------------------------------------------

pub struct YoutubeCollector {
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct YoutubeSearchResponse {
    #[serde(default)]
    items: Vec<YoutubeItem>,
}

#[derive(Deserialize)]
struct YoutubeItem {
    id: YoutubeItemId,
    snippet: YoutubeSnippet,
}

#[derive(Deserialize)]
struct YoutubeItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct YoutubeSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

impl YoutubeCollector {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    async fn search_term(&self, key: &str, term: &str) -> Result<Vec<Post>> {
        let published_after = (Utc::now() - Duration::days(7)).to_rfc3339();
        let resp = self
            .client
            .get(format!("{YOUTUBE_BASE_URL}/search"))
            .query(&[
                ("part", "snippet"),
                ("q", &format!("{term} ocean hazard")),
                ("type", "video"),
                ("maxResults", "5"),
                ("publishedAfter", &published_after),
                ("key", key),
            ])
            .send()
            .await
            .context("YouTube search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("YouTube search returned {status}: {body}");
        }

        let parsed: YoutubeSearchResponse =
            resp.json().await.context("Invalid YouTube search body")?;

        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let content = if item.snippet.description.is_empty() {
                    item.snippet.title
                } else {
                    format!("{}. {}", item.snippet.title, item.snippet.description)
                };
                Some(Post {
                    platform: Platform::Youtube,
                    external_id: video_id,
                    content,
                    author: item.snippet.channel_title,
                    location: None,
                    engagement: HashMap::new(),
                    created_at: item.snippet.published_at.unwrap_or_else(Utc::now),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SocialCollector for YoutubeCollector {
    async fn collect(&self) -> Result<Vec<Post>> {
        let Some(key) = self.api_key.clone() else {
            warn!("YouTube API not configured, skipping");
            return Ok(Vec::new());
        };

        let mut posts = Vec::new();
        for term in SEARCH_TERMS {
            match self.search_term(&key, term).await {
                Ok(batch) => posts.extend(batch),
                Err(e) => warn!(term, error = %e, "YouTube search term failed"),
            }
        }
        Ok(posts)
    }

    fn platform(&self) -> Platform {
        Platform::Youtube
    }
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Fixed sample batch for demos and tests. No network access.
pub struct MockCollector;

#[async_trait]
impl SocialCollector for MockCollector {
    async fn collect(&self) -> Result<Vec<Post>> {
        let now = Utc::now();
        let sample = |external_id: &str, content: &str, author: &str, engagement: &[(&str, u64)]| {
            Post {
                platform: Platform::Mock,
                external_id: external_id.to_string(),
                content: content.to_string(),
                author: Some(author.to_string()),
                location: None,
                engagement: engagement
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
                created_at: now,
            }
        };

        Ok(vec![
            sample(
                "tweet_001",
                "High waves observed at Marina Beach Chennai. Water levels rising rapidly. #OceanHazard #Chennai",
                "coastal_observer",
                &[("likes", 15), ("retweets", 8), ("replies", 3)],
            ),
            sample(
                "fb_001",
                "Storm surge warning issued for coastal areas. Residents advised to stay away from beaches.",
                "weather_alert",
                &[("likes", 25), ("shares", 12), ("comments", 7)],
            ),
            sample(
                "yt_001",
                "Tsunami preparedness video: What to do when you see unusual ocean behavior",
                "disaster_prep_channel",
                &[("views", 1500), ("likes", 45), ("comments", 12)],
            ),
            sample(
                "tweet_002",
                "Abnormal tide patterns observed in Mumbai. Water levels much higher than normal.",
                "mumbai_coast",
                &[("likes", 8), ("retweets", 4), ("replies", 2)],
            ),
        ])
    }

    fn platform(&self) -> Platform {
        Platform::Mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_collectors_return_empty() {
        let client = reqwest::Client::new();
        assert!(TwitterCollector::new(client.clone(), None)
            .collect()
            .await
            .unwrap()
            .is_empty());
        assert!(FacebookCollector::new(client.clone(), None)
            .collect()
            .await
            .unwrap()
            .is_empty());
        assert!(YoutubeCollector::new(client, None)
            .collect()
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn mock_collector_yields_sample_batch() {
        let posts = MockCollector.collect().await.unwrap();
        assert_eq!(posts.len(), 4);
        assert!(posts.iter().all(|p| p.platform == Platform::Mock));
        assert!(posts.iter().any(|p| p.external_id == "tweet_001"));
    }

    #[test]
    fn tweet_search_body_parses() {
        let body = r#"{
            "data": [{
                "id": "1790001",
                "text": "Storm surge hitting the coast",
                "author_id": "42",
                "created_at": "2026-08-20T10:00:00Z",
                "public_metrics": {"like_count": 3, "retweet_count": 1, "reply_count": 0},
                "geo": {"coordinates": {"coordinates": [13.05, 80.25]}}
            }]
        }"#;
        let parsed: TweetSearchResponse = serde_json::from_str(body).unwrap();
        let tweets = parsed.data.unwrap();
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].public_metrics.like_count, 3);
        let point = tweets[0]
            .geo
            .as_ref()
            .and_then(|g| g.coordinates.as_ref())
            .and_then(|p| p.coordinates)
            .unwrap();
        assert!((point[0] - 13.05).abs() < 1e-9);
    }

    #[test]
    fn empty_tweet_search_body_parses() {
        let parsed: TweetSearchResponse = serde_json::from_str(r#"{"meta":{}}"#).unwrap();
        assert!(parsed.data.is_none());
    }
}
