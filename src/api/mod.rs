use crate::config::NetworkConfig;
use crate::internal::models::Article;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Where the feed document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Remote(String),
    Local(PathBuf),
}

impl FeedSource {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let lower = source.to_ascii_lowercase();
        match lower.starts_with("http://") || lower.starts_with("https://") {
            true => Self::Remote(source.to_string()),
            false => Self::Local(PathBuf::from(source)),
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Decode a feed body: a JSON array of article objects.
///
/// Entries that do not decode as an article are skipped so one bad record
/// cannot take the whole list down.
pub fn parse_feed(body: &str) -> Result<Vec<Article>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(body).context("feed is not a JSON array")?;

    let total = entries.len();
    let articles: Vec<Article> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Article>(entry) {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed feed entry");
                None
            }
        })
        .collect();

    tracing::info!(total, accepted = articles.len(), "Parsed feed");
    Ok(articles)
}

/// Loads the news feed over HTTP or from disk.
///
/// Errors keep their `anyhow` context chain so the log says which source
/// failed and why.
#[derive(Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new(network: &NetworkConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(network.timeout_secs))
            .user_agent(network.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::error!("Failed to build HTTP client, using defaults: {}", e);
                Client::new()
            });
        Self { client }
    }

    /// One request (or read) for the feed document.
    #[tracing::instrument(skip_all, fields(source = %source))]
    pub async fn fetch(&self, source: &FeedSource) -> Result<Vec<Article>> {
        let start = std::time::Instant::now();
        let body = match source {
            FeedSource::Remote(url) => self
                .get_text(url)
                .await
                .with_context(|| format!("failed to load feed from {}", url))?,
            FeedSource::Local(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read feed file {}", path.display()))?,
        };

        let articles =
            parse_feed(&body).with_context(|| format!("failed to parse feed from {}", source))?;
        tracing::info!(elapsed = ?start.elapsed(), articles = articles.len(), "Feed loaded");
        Ok(articles)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to send GET request to {}", url))?
            .error_for_status()
            .context("feed responded with a non-success status")?;

        resp.text()
            .await
            .with_context(|| format!("failed to read response body from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"[
        {"title": "Primeira", "date": "2024-01-01", "published": true},
        {"title": "Segunda", "date": "2024-02-01", "published": false}
    ]"#;

    #[test]
    fn parses_sources() {
        assert_eq!(
            FeedSource::parse("https://example.com/news.json"),
            FeedSource::Remote("https://example.com/news.json".to_string())
        );
        assert_eq!(
            FeedSource::parse(" HTTP://example.com/a "),
            FeedSource::Remote("HTTP://example.com/a".to_string())
        );
        assert_eq!(
            FeedSource::parse("news.json"),
            FeedSource::Local(PathBuf::from("news.json"))
        );
    }

    #[test]
    fn parse_feed_reads_articles() {
        let articles = parse_feed(FEED).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Primeira");
        assert!(!articles[1].published);
    }

    #[test]
    fn parse_feed_skips_malformed_entries() {
        let body = r#"[{"title": "Ok", "published": true}, 42, {"title": 7}, "texto"]"#;
        let articles = parse_feed(body).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Ok");
    }

    #[test]
    fn parse_feed_keeps_entries_with_null_text_fields() {
        let body = r#"[{"title": "Feira", "displayDate": null, "altText": null, "readMoreText": null, "date": "2024-01-01", "published": true}]"#;
        let articles = parse_feed(body).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Feira");
        assert!(articles[0].display_date.is_empty());
    }

    #[test]
    fn parse_feed_rejects_non_arrays() {
        assert!(parse_feed(r#"{"title": "x"}"#).is_err());
        assert!(parse_feed("not json").is_err());
    }

    #[tokio::test]
    async fn fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/news.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(FEED)
            .create_async()
            .await;

        let client = FeedClient::new(&NetworkConfig::default());
        let source = FeedSource::parse(&format!("{}/news.json", server.url()));
        let articles = client.fetch(&source).await.unwrap();

        mock.assert_async().await;
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn fetch_non_ok_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/news.json")
            .with_status(500)
            .with_body(FEED)
            .create_async()
            .await;

        let client = FeedClient::new(&NetworkConfig::default());
        let source = FeedSource::parse(&format!("{}/news.json", server.url()));
        let result = client.fetch(&source).await;

        mock.assert_async().await;
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("non-success status"));
    }

    #[tokio::test]
    async fn fetch_network_error() {
        let client = FeedClient::new(&NetworkConfig::default());
        let source = FeedSource::parse("http://localhost:1/news.json");
        let err = client.fetch(&source).await.unwrap_err().to_string();
        assert!(err.contains("failed to load feed"));
    }

    #[tokio::test]
    async fn fetch_local_file() {
        let path = std::env::temp_dir().join(format!(
            "tui-news-preview-feed-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, FEED).await.unwrap();

        let client = FeedClient::new(&NetworkConfig::default());
        let articles = client.fetch(&FeedSource::Local(path.clone())).await.unwrap();
        assert_eq!(articles[0].title, "Primeira");

        let _ = tokio::fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn fetch_missing_local_file() {
        let client = FeedClient::new(&NetworkConfig::default());
        let result = client
            .fetch(&FeedSource::Local(PathBuf::from("/nonexistent/news.json")))
            .await;
        assert!(result.is_err());
    }
}
