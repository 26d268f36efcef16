//! TOML-driven source definitions.
//!
//! A [`SourceDefinition`] captures everything needed to search one
//! platform: its mirror list, search URL template, selector fallback
//! chains, and page-driving parameters. Sources come in two fetch
//! modes: `browser` sources are driven through a
//! [`BrowserSession`], `api` sources hit a JSON search endpoint
//! directly over HTTP.

use std::time::Duration;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use social_pulse_models::{NewPost, PlatformFamily};
use social_pulse_scraper::browser::BrowserSession;
use social_pulse_scraper::parsing::{parse_metric, parse_post_date};

use crate::SourceError;

/// Retries per mirror navigation before moving to the next mirror.
const NAVIGATE_RETRIES: u32 = 2;

const API_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0";

/// How a source's pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Drive a headless browser through mirrors and scrape the DOM.
    #[default]
    Browser,
    /// Fetch a JSON search endpoint directly.
    Api,
}

/// CSS selector configuration for locating posts within a result page.
///
/// `content`, `likes`, and `shares` are fallback chains: selectors are
/// tried in order and the first one that matches wins. Mirrors of the
/// same platform drift apart in markup, so chains absorb the variation.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Selects one result item (post, comment, story).
    pub item: String,
    /// Fallback chain for the post text within an item.
    pub content: Vec<String>,
    /// Author handle within an item.
    #[serde(default)]
    pub author: Option<String>,
    /// Permalink anchor within an item (`href` is taken).
    #[serde(default)]
    pub link: Option<String>,
    /// Timestamp element within an item (`title` attr preferred over
    /// text).
    #[serde(default)]
    pub date: Option<String>,
    /// Fallback chain for the like/upvote counter.
    #[serde(default)]
    pub likes: Vec<String>,
    /// Fallback chain for the share/repost counter.
    #[serde(default)]
    pub shares: Vec<String>,
}

/// A complete per-source scraping configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique id used in CLI selections (e.g. "twitter").
    pub id: String,
    /// Human-readable description of the source.
    pub name: String,
    /// Platform label stamped onto every post (e.g. "Twitter").
    pub platform: String,
    /// Which scraping flow family this source belongs to.
    pub family: PlatformFamily,
    /// How pages are fetched.
    #[serde(default)]
    pub fetch: FetchMode,
    /// Base URLs tried in order until one yields results.
    pub mirrors: Vec<String>,
    /// Path template appended to a mirror; `{query}` is replaced with
    /// the URL-encoded keyword and `{limit}` with the result cap.
    pub search_path: String,
    /// Selector configuration (browser sources only).
    #[serde(default)]
    pub selectors: Option<SelectorConfig>,
    /// Selector whose appearance signals that results have loaded.
    #[serde(default)]
    pub wait_selector: Option<String>,
    /// Incremental scroll steps after results load.
    #[serde(default = "default_scroll_steps")]
    pub scroll_steps: u32,
    /// How long to poll for `wait_selector` before parsing anyway.
    #[serde(default = "default_result_timeout_ms")]
    pub result_timeout_ms: u64,
}

const fn default_scroll_steps() -> u32 {
    5
}

const fn default_result_timeout_ms() -> u64 {
    10_000
}

impl SourceDefinition {
    /// Searches this source for `keyword` and returns normalized post
    /// candidates no older than `days`, at most `cap` of them.
    ///
    /// Mirrors are tried in order; the first one yielding at least one
    /// post wins. A source where every mirror comes up empty returns an
    /// empty `Vec`, not an error.
    ///
    /// # Errors
    ///
    /// * `SourceError::Selector` - if a configured selector is invalid.
    /// * `SourceError::Config` - if a browser source lacks selectors.
    /// * `SourceError::Api` - if an API response cannot be decoded.
    pub async fn scrape(
        &self,
        session: &mut BrowserSession,
        keyword: &str,
        days: i64,
        cap: usize,
    ) -> Result<Vec<NewPost>, SourceError> {
        match self.fetch {
            FetchMode::Browser => self.scrape_browser(session, keyword, days, cap).await,
            FetchMode::Api => self.fetch_api(keyword, days, cap).await,
        }
    }

    async fn scrape_browser(
        &self,
        session: &mut BrowserSession,
        keyword: &str,
        days: i64,
        cap: usize,
    ) -> Result<Vec<NewPost>, SourceError> {
        let now = Utc::now();
        for mirror in &self.mirrors {
            let url = self.search_url(mirror, keyword, cap);
            if !session.navigate(&url, NAVIGATE_RETRIES).await {
                log::warn!("{}: mirror {mirror} unreachable, trying next", self.id);
                continue;
            }
            if let Some(wait_selector) = &self.wait_selector {
                if session
                    .find_one(
                        wait_selector,
                        Duration::from_millis(self.result_timeout_ms),
                    )
                    .await
                    .is_none()
                {
                    log::debug!("{}: no results appeared on {mirror} for '{keyword}'", self.id);
                }
            }
            session.scroll(self.scroll_steps).await;
            let html = match session.content().await {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("{}: failed to read page from {mirror}: {e}", self.id);
                    continue;
                }
            };
            let posts = self.extract_posts(&html, mirror, keyword, now, days, cap)?;
            if posts.is_empty() {
                log::debug!("{}: mirror {mirror} yielded no posts for '{keyword}'", self.id);
            } else {
                log::info!(
                    "{}: {} posts for '{keyword}' via {mirror}",
                    self.id,
                    posts.len()
                );
                return Ok(posts);
            }
        }
        Ok(Vec::new())
    }

    /// Parses a result page into post candidates.
    ///
    /// The sole relevance filter is a case-insensitive substring match
    /// of the keyword against the extracted content. Items older than
    /// the lookback window are dropped, missing metrics degrade to 0,
    /// and an unparseable date degrades to `now`.
    pub fn extract_posts(
        &self,
        html: &str,
        base_url: &str,
        keyword: &str,
        now: DateTime<Utc>,
        days: i64,
        cap: usize,
    ) -> Result<Vec<NewPost>, SourceError> {
        let selectors = self.selectors.as_ref().ok_or_else(|| {
            SourceError::Config(format!("source {} has no selectors", self.id))
        })?;
        let item_selector = parse_selector(&selectors.item)?;
        let document = Html::parse_document(html);
        let needle = keyword.to_lowercase();
        let cutoff = now - chrono::Duration::days(days);
        let mut posts = Vec::new();

        for element in document.select(&item_selector) {
            if posts.len() >= cap {
                break;
            }
            let Some(content) = first_chain_text(&element, &selectors.content)? else {
                continue;
            };
            if !content.to_lowercase().contains(&needle) {
                continue;
            }
            let created_at = match optional_date_text(&element, selectors.date.as_deref())? {
                Some(text) => parse_post_date(&text, now),
                None => now,
            };
            if created_at < cutoff {
                continue;
            }
            let author = optional_text(&element, selectors.author.as_deref())?;
            let source_url = optional_href(&element, selectors.link.as_deref(), base_url)?;
            let likes = chain_metric(&element, &selectors.likes)?;
            let shares = chain_metric(&element, &selectors.shares)?;

            posts.push(NewPost {
                content,
                platform: self.platform.clone(),
                created_at,
                likes,
                shares,
                source_url,
                author,
            });
        }
        Ok(posts)
    }

    async fn fetch_api(
        &self,
        keyword: &str,
        days: i64,
        cap: usize,
    ) -> Result<Vec<NewPost>, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(API_TIMEOUT)
            .build()?;
        let now = Utc::now();
        for mirror in &self.mirrors {
            let url = self.search_url(mirror, keyword, cap);
            let body = match fetch_body(&client, &url).await {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("{}: API mirror {mirror} failed: {e}", self.id);
                    continue;
                }
            };
            let posts = posts_from_search_json(&body, &self.platform, keyword, now, days, cap)?;
            if !posts.is_empty() {
                log::info!(
                    "{}: {} posts for '{keyword}' via {mirror}",
                    self.id,
                    posts.len()
                );
                return Ok(posts);
            }
            log::debug!("{}: API mirror {mirror} yielded no posts for '{keyword}'", self.id);
        }
        Ok(Vec::new())
    }

    fn search_url(&self, mirror: &str, keyword: &str, cap: usize) -> String {
        let path = self
            .search_path
            .replace("{query}", &encode_query(keyword))
            .replace("{limit}", &cap.to_string());
        format!("{}{path}", mirror.trim_end_matches('/'))
    }
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).send().await?;
    response.error_for_status()?.text().await
}

/// Parses a source config from its TOML text.
///
/// # Errors
///
/// * `SourceError::Config` - on malformed TOML, an empty mirror list, a
///   `search_path` without the `{query}` placeholder, or a browser
///   source without selectors.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    let source: SourceDefinition =
        toml::from_str(toml_str).map_err(|e| SourceError::Config(e.to_string()))?;
    if source.mirrors.is_empty() {
        return Err(SourceError::Config(format!(
            "source {} has no mirrors",
            source.id
        )));
    }
    if !source.search_path.contains("{query}") {
        return Err(SourceError::Config(format!(
            "source {} search_path lacks {{query}}",
            source.id
        )));
    }
    if source.fetch == FetchMode::Browser && source.selectors.is_none() {
        return Err(SourceError::Config(format!(
            "browser source {} has no selectors",
            source.id
        )));
    }
    Ok(source)
}

fn parse_selector(raw: &str) -> Result<Selector, SourceError> {
    Selector::parse(raw).map_err(|_| SourceError::Selector(raw.to_owned()))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First selector in the chain that matches an element with non-empty
/// text wins.
fn first_chain_text(
    element: &ElementRef<'_>,
    chain: &[String],
) -> Result<Option<String>, SourceError> {
    for raw in chain {
        let selector = parse_selector(raw)?;
        if let Some(found) = element.select(&selector).next() {
            let text = element_text(&found);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

fn optional_text(
    element: &ElementRef<'_>,
    selector: Option<&str>,
) -> Result<Option<String>, SourceError> {
    let Some(raw) = selector else {
        return Ok(None);
    };
    let selector = parse_selector(raw)?;
    Ok(element
        .select(&selector)
        .next()
        .map(|found| element_text(&found))
        .filter(|text| !text.is_empty()))
}

fn optional_date_text(
    element: &ElementRef<'_>,
    selector: Option<&str>,
) -> Result<Option<String>, SourceError> {
    let Some(raw) = selector else {
        return Ok(None);
    };
    let selector = parse_selector(raw)?;
    Ok(element.select(&selector).next().and_then(|found| {
        // Mirrors often carry the precise timestamp in a title attr
        // while the text shows a relative phrase.
        let titled = found.value().attr("title").map(str::trim);
        match titled {
            Some(title) if !title.is_empty() => Some(title.to_owned()),
            _ => {
                let text = element_text(&found);
                (!text.is_empty()).then_some(text)
            }
        }
    }))
}

fn optional_href(
    element: &ElementRef<'_>,
    selector: Option<&str>,
    base_url: &str,
) -> Result<Option<String>, SourceError> {
    let Some(raw) = selector else {
        return Ok(None);
    };
    let selector = parse_selector(raw)?;
    Ok(element
        .select(&selector)
        .next()
        .and_then(|found| found.value().attr("href"))
        .map(|href| resolve_href(href, base_url)))
}

fn resolve_href(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_owned()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

fn chain_metric(element: &ElementRef<'_>, chain: &[String]) -> Result<i64, SourceError> {
    for raw in chain {
        let selector = parse_selector(raw)?;
        if let Some(found) = element.select(&selector).next() {
            let text = element_text(&found);
            if !text.is_empty() {
                // Saturate rather than wrap; counts stay non-negative.
                return Ok(i64::try_from(parse_metric(&text)).unwrap_or(i64::MAX));
            }
        }
    }
    Ok(0)
}

fn encode_query(raw: &str) -> String {
    let mut out = String::new();
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    story_text: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    points: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "objectID", default)]
    object_id: Option<String>,
}

/// Maps an Algolia-style search response into post candidates.
fn posts_from_search_json(
    body: &str,
    platform: &str,
    keyword: &str,
    now: DateTime<Utc>,
    days: i64,
    cap: usize,
) -> Result<Vec<NewPost>, SourceError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let needle = keyword.to_lowercase();
    let cutoff = now - chrono::Duration::days(days);
    let mut posts = Vec::new();

    for hit in response.hits {
        if posts.len() >= cap {
            break;
        }
        let content = match (hit.title, hit.story_text) {
            (Some(title), Some(text)) if !text.is_empty() => format!("{title} {text}"),
            (Some(title), _) => title,
            (None, Some(text)) => text,
            (None, None) => continue,
        };
        if content.is_empty() || !content.to_lowercase().contains(&needle) {
            continue;
        }
        let created_at = hit
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(now, |dt| dt.with_timezone(&Utc));
        if created_at < cutoff {
            continue;
        }
        let source_url = hit.url.or_else(|| {
            hit.object_id
                .map(|id| format!("https://news.ycombinator.com/item?id={id}"))
        });

        posts.push(NewPost {
            content,
            platform: platform.to_owned(),
            created_at,
            likes: hit.points.unwrap_or(0).max(0),
            shares: 0,
            source_url,
            author: hit.author,
        });
    }
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
id = "micro_test"
name = "Test micro-blog source"
platform = "Twitter"
family = "micro_blog"
mirrors = ["https://mirror-a.example", "https://mirror-b.example"]
search_path = "/search?q={query}"
wait_selector = ".timeline-item"
scroll_steps = 3

[selectors]
item = ".timeline-item"
content = [".tweet-content", ".content"]
author = ".username"
link = ".tweet-link"
date = ".tweet-date a"
likes = [".icon-heart + .stat"]
shares = [".icon-retweet + .stat"]
"#;

    const SAMPLE_HTML: &str = r#"
<html><body>
  <div class="timeline-item">
    <a class="username">@alice</a>
    <div class="tweet-content">Rust makes systems programming fun</div>
    <span class="tweet-date"><a title="2024-06-15T10:00:00">2h</a></span>
    <a class="tweet-link" href="/alice/status/1"></a>
    <span class="icon-heart"></span><span class="stat">1.2K</span>
    <span class="icon-retweet"></span><span class="stat">34</span>
  </div>
  <div class="timeline-item">
    <a class="username">@bob</a>
    <div class="tweet-content">Completely unrelated gardening tips</div>
    <span class="tweet-date"><a title="2024-06-15T09:00:00">3h</a></span>
    <a class="tweet-link" href="/bob/status/2"></a>
  </div>
  <div class="timeline-item">
    <a class="username">@carol</a>
    <div class="tweet-content">old rust post from months back</div>
    <span class="tweet-date"><a title="2024-01-01T00:00:00">Jan 1</a></span>
  </div>
</body></html>
"#;

    fn reference_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_sample_toml() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        assert_eq!(source.id, "micro_test");
        assert_eq!(source.platform, "Twitter");
        assert_eq!(source.family, PlatformFamily::MicroBlog);
        assert_eq!(source.fetch, FetchMode::Browser);
        assert_eq!(source.mirrors.len(), 2);
        assert_eq!(source.scroll_steps, 3);
        assert_eq!(source.result_timeout_ms, 10_000);
        let selectors = source.selectors.unwrap();
        assert_eq!(selectors.content.len(), 2);
    }

    #[test]
    fn rejects_config_without_mirrors() {
        let toml = SAMPLE_TOML.replace(
            "mirrors = [\"https://mirror-a.example\", \"https://mirror-b.example\"]",
            "mirrors = []",
        );
        assert!(matches!(
            parse_source_toml(&toml),
            Err(SourceError::Config(_))
        ));
    }

    #[test]
    fn rejects_search_path_without_query_placeholder() {
        let toml = SAMPLE_TOML.replace("/search?q={query}", "/search?q=fixed");
        assert!(matches!(
            parse_source_toml(&toml),
            Err(SourceError::Config(_))
        ));
    }

    #[test]
    fn extracts_relevant_posts_only() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        let posts = source
            .extract_posts(
                SAMPLE_HTML,
                "https://mirror-a.example",
                "rust",
                reference_time(),
                7,
                50,
            )
            .unwrap();
        // Matching, recent post kept; gardening post filtered by
        // keyword; January post filtered by the lookback window.
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.content, "Rust makes systems programming fun");
        assert_eq!(post.platform, "Twitter");
        assert_eq!(post.author.as_deref(), Some("@alice"));
        assert_eq!(post.likes, 1200);
        assert_eq!(post.shares, 34);
        assert_eq!(
            post.source_url.as_deref(),
            Some("https://mirror-a.example/alice/status/1")
        );
        assert_eq!(post.created_at.to_string(), "2024-06-15 10:00:00 UTC");
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        let posts = source
            .extract_posts(
                SAMPLE_HTML,
                "https://mirror-a.example",
                "RUST",
                reference_time(),
                7,
                50,
            )
            .unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn cap_limits_extraction() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        let posts = source
            .extract_posts(
                SAMPLE_HTML,
                "https://mirror-a.example",
                "rust",
                reference_time(),
                365,
                1,
            )
            .unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn missing_metrics_degrade_to_zero() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        let posts = source
            .extract_posts(
                SAMPLE_HTML,
                "https://mirror-a.example",
                "gardening",
                reference_time(),
                7,
                50,
            )
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].likes, 0);
        assert_eq!(posts[0].shares, 0);
    }

    #[test]
    fn absurd_metrics_saturate_instead_of_wrapping_negative() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        let html = r#"
<html><body>
  <div class="timeline-item">
    <div class="tweet-content">rust hype train</div>
    <span class="icon-heart"></span><span class="stat">99999999999999999999k</span>
  </div>
</body></html>
"#;
        let posts = source
            .extract_posts(
                html,
                "https://mirror-a.example",
                "rust",
                reference_time(),
                7,
                50,
            )
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].likes, i64::MAX);
        assert_eq!(posts[0].shares, 0);
    }

    #[test]
    fn builds_search_urls_from_templates() {
        let source = parse_source_toml(SAMPLE_TOML).unwrap();
        assert_eq!(
            source.search_url("https://mirror-a.example/", "data science", 50),
            "https://mirror-a.example/search?q=data+science"
        );
    }

    #[test]
    fn encodes_reserved_query_characters() {
        assert_eq!(encode_query("c++ & rust"), "c%2B%2B+%26+rust");
    }

    #[test]
    fn maps_api_hits_to_posts() {
        let body = r#"{
            "hits": [
                {
                    "title": "Rust 2.0 announced",
                    "author": "pg",
                    "points": 512,
                    "num_comments": 300,
                    "created_at": "2024-06-14T08:00:00Z",
                    "url": "https://example.com/rust-2",
                    "objectID": "101"
                },
                {
                    "title": "Knitting patterns",
                    "points": 7,
                    "created_at": "2024-06-14T09:00:00Z",
                    "objectID": "102"
                },
                {
                    "title": "Ancient rust removal",
                    "points": 3,
                    "created_at": "2023-01-01T00:00:00Z",
                    "objectID": "103"
                }
            ]
        }"#;
        let posts =
            posts_from_search_json(body, "News (HN)", "rust", reference_time(), 7, 50).unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.content, "Rust 2.0 announced");
        assert_eq!(post.likes, 512);
        assert_eq!(post.shares, 0);
        assert_eq!(post.author.as_deref(), Some("pg"));
        assert_eq!(post.source_url.as_deref(), Some("https://example.com/rust-2"));
    }

    #[test]
    fn api_hits_without_url_link_to_the_item_page() {
        let body = r#"{"hits": [{"title": "Ask HN: why rust?", "created_at": "2024-06-15T00:00:00Z", "objectID": "7"}]}"#;
        let posts =
            posts_from_search_json(body, "News (HN)", "rust", reference_time(), 7, 50).unwrap();
        assert_eq!(
            posts[0].source_url.as_deref(),
            Some("https://news.ycombinator.com/item?id=7")
        );
    }

    #[test]
    fn malformed_api_body_is_an_error() {
        assert!(posts_from_search_json("not json", "News (HN)", "rust", reference_time(), 7, 50)
            .is_err());
    }

    #[test]
    fn resolves_relative_hrefs() {
        assert_eq!(
            resolve_href("/a/b", "https://mirror.example"),
            "https://mirror.example/a/b"
        );
        assert_eq!(
            resolve_href("https://other.example/x", "https://mirror.example"),
            "https://other.example/x"
        );
    }
}
