//! Default HTTP connectors: page text extraction and feed-based source
//! resolution.
//!
//! Feeds are read with a handful of tolerant patterns rather than a full XML
//! parser; only the first few entries of well-formed RSS 2.0 and Atom feeds
//! matter here.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use aura_models::{ExtractedContent, LatestItem, Source, SourceType};

use crate::error::{BriefingError, BriefingResult};
use crate::providers::{ContentExtractor, SourceResolver};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; rv:91.0) Gecko/20100101 Firefox/91.0";
const FEED_USER_AGENT: &str = "AuraBriefing/1.0";

/// Extracted page text is capped at this many characters.
pub const MAX_TEXT_CHARS: usize = 80_000;

static SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static RSS_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<item[\s>].*?</item>").unwrap());
static ATOM_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<entry[\s>].*?</entry>").unwrap());
static RSS_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link>(.*?)</link>").unwrap());
static ATOM_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)/?>").unwrap());
static HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap());
static REL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"rel\s*=\s*["']([^"']+)["']"#).unwrap());
static PUBLISHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(pubDate|published|updated|dc:date)>(.*?)</(?:pubDate|published|updated|dc:date)>").unwrap());
static CHANNEL_ID_IN_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/channel/(UC[\w-]{22})").unwrap());
static CHANNEL_ID_IN_PAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:channelId|externalId)"\s*:\s*"(UC[\w-]{22})""#).unwrap());

/// Decode the few entities that matter for plain text.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Strip scripts, styles and tags from HTML, returning collapsed text.
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_scripts, " ");
    collapse_whitespace(&decode_entities(&without_tags))
}

/// Contents of the page `<title>`, if any.
pub fn html_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .map(|c| collapse_whitespace(&decode_entities(&c[1])))
        .filter(|t| !t.is_empty())
}

/// Whether a news/podcast URL looks like a feed.
pub fn is_feed_url(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.contains("rss") || lower.contains("feed") || lower.ends_with(".xml")
}

fn xml_text(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|r| r.strip_suffix("]]>"))
        .unwrap_or(raw);
    collapse_whitespace(&decode_entities(raw))
}

fn entry_field(block: &str, re: &Regex) -> Option<String> {
    re.captures(block)
        .map(|c| xml_text(c.get(c.len() - 1).map_or("", |m| m.as_str())))
        .filter(|s| !s.is_empty())
}

fn atom_link(block: &str) -> Option<String> {
    let mut fallback = None;
    for caps in ATOM_LINK.captures_iter(block) {
        let attrs = &caps[1];
        let Some(href) = HREF.captures(attrs).map(|h| decode_entities(&h[1])) else {
            continue;
        };
        match REL.captures(attrs).map(|r| r[1].to_lowercase()) {
            None => return Some(href),
            Some(rel) if rel == "alternate" => return Some(href),
            _ => {
                fallback.get_or_insert(href);
            }
        }
    }
    fallback
}

/// Entries of an RSS 2.0 or Atom feed, in document order.
pub fn parse_feed(xml: &str) -> Vec<LatestItem> {
    let rss: Vec<LatestItem> = RSS_ITEM
        .find_iter(xml)
        .filter_map(|m| {
            let block = m.as_str();
            let url = entry_field(block, &RSS_LINK)?;
            Some(LatestItem {
                url,
                title: entry_field(block, &TITLE),
                published_at: entry_field(block, &PUBLISHED),
            })
        })
        .collect();
    if !rss.is_empty() {
        return rss;
    }

    ATOM_ENTRY
        .find_iter(xml)
        .filter_map(|m| {
            let block = m.as_str();
            Some(LatestItem {
                url: atom_link(block)?,
                title: entry_field(block, &TITLE),
                published_at: entry_field(block, &PUBLISHED),
            })
        })
        .collect()
}

/// Recover the publisher URL embedded in a Google News article link.
///
/// Older article ids are base64url protobuf carrying the target URL; newer
/// opaque ids return `None`.
pub fn decode_google_news_url(link: &str) -> Option<String> {
    let id = link
        .split(['?', '#'])
        .next()?
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())?;
    let bytes = URL_SAFE_NO_PAD.decode(id.trim_end_matches('=')).ok()?;
    let start = bytes.windows(4).position(|w| w == b"http")?;

    let declared = start
        .checked_sub(1)
        .map(|i| bytes[i] as usize)
        .filter(|&len| len < 0x80 && start + len <= bytes.len());
    let end = match declared {
        Some(len) => start + len,
        None => bytes[start..]
            .iter()
            .position(|b| !(0x21..=0x7e).contains(b))
            .map_or(bytes.len(), |p| start + p),
    };

    String::from_utf8(bytes[start..end].to_vec())
        .ok()
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
}

fn http_client(timeout: Duration, user_agent: &str) -> BriefingResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| BriefingError::internal(format!("Failed to build HTTP client: {}", e)))
}

async fn fetch_text(client: &Client, url: &str) -> BriefingResult<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| BriefingError::extraction(format!("Failed to fetch {}: {}", url, e)))?;
    let status = response.status();
    if !status.is_success() {
        return Err(BriefingError::extraction(format!("{} returned {}", url, status)));
    }
    response
        .text()
        .await
        .map_err(|e| BriefingError::extraction(format!("Failed to read {}: {}", url, e)))
}

/// Fetches a page and keeps its title and visible text.
pub struct HttpTextExtractor {
    client: Client,
}

impl HttpTextExtractor {
    pub fn new() -> BriefingResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(20), BROWSER_USER_AGENT)?,
        })
    }
}

#[async_trait]
impl ContentExtractor for HttpTextExtractor {
    async fn extract(&self, url: &str) -> BriefingResult<Option<ExtractedContent>> {
        let html = fetch_text(&self.client, url).await?;
        let text: String = html_to_text(&html).chars().take(MAX_TEXT_CHARS).collect();
        if text.is_empty() {
            debug!(url, "Page has no visible text");
            return Ok(None);
        }
        let title = html_title(&html).unwrap_or_default();
        Ok(Some(ExtractedContent::new(title, text)))
    }
}

/// Resolves followed sources through their feeds and topics through a
/// Google News RSS search.
pub struct FeedResolver {
    client: Client,
    news_base_url: String,
    youtube_base_url: String,
}

impl FeedResolver {
    pub fn new() -> BriefingResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(20), FEED_USER_AGENT)?,
            news_base_url: "https://news.google.com".to_string(),
            youtube_base_url: "https://www.youtube.com".to_string(),
        })
    }

    pub fn with_news_base_url(mut self, url: impl Into<String>) -> Self {
        self.news_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_youtube_base_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Google News RSS search URL for `topic`.
    pub fn topic_search_url(&self, topic: &str, language: &str, country: &str) -> String {
        let lang = language.split('-').next().unwrap_or(language);
        format!(
            "{}/rss/search?q={}&hl={}&gl={}&ceid={}:{}",
            self.news_base_url,
            urlencoding::encode(topic.trim()),
            language,
            country,
            country,
            lang
        )
    }

    async fn latest_from_feed(&self, feed_url: &str) -> BriefingResult<LatestItem> {
        let xml = fetch_text(&self.client, feed_url).await?;
        parse_feed(&xml)
            .into_iter()
            .next()
            .ok_or_else(|| BriefingError::extraction(format!("Feed has no entries: {}", feed_url)))
    }

    async fn youtube_channel_id(&self, channel_url: &str) -> BriefingResult<String> {
        if let Some(caps) = CHANNEL_ID_IN_URL.captures(channel_url) {
            return Ok(caps[1].to_string());
        }
        let page = fetch_text(&self.client, channel_url).await?;
        CHANNEL_ID_IN_PAGE
            .captures(&page)
            .map(|c| c[1].to_string())
            .ok_or_else(|| BriefingError::extraction(format!("No channel id found for {}", channel_url)))
    }
}

#[async_trait]
impl SourceResolver for FeedResolver {
    async fn latest_item(&self, source: &Source) -> BriefingResult<LatestItem> {
        let url = source.url.trim();
        if url.is_empty() {
            return Err(BriefingError::input("source URL is required"));
        }

        match source.kind {
            SourceType::Youtube => {
                let channel_id = self.youtube_channel_id(url).await?;
                let feed = format!("{}/feeds/videos.xml?channel_id={}", self.youtube_base_url, channel_id);
                self.latest_from_feed(&feed).await
            }
            SourceType::News | SourceType::Podcast => {
                if !is_feed_url(url) {
                    return Err(BriefingError::extraction(
                        "News source URL should be an RSS/feed URL (e.g. .../feed or .../rss) to fetch latest article",
                    ));
                }
                self.latest_from_feed(url).await
            }
            SourceType::X | SourceType::Linkedin => Err(BriefingError::extraction(
                "Latest post from X/LinkedIn not supported yet",
            )),
        }
    }

    async fn articles_for_topic(
        &self,
        topic: &str,
        max_results: usize,
        language: &str,
        country: &str,
    ) -> BriefingResult<Vec<LatestItem>> {
        if topic.trim().is_empty() {
            return Ok(Vec::new());
        }
        let xml = fetch_text(&self.client, &self.topic_search_url(topic, language, country)).await?;

        Ok(parse_feed(&xml)
            .into_iter()
            .take(max_results)
            .map(|mut item| {
                if item.url.contains("news.google.com") {
                    match decode_google_news_url(&item.url) {
                        Some(decoded) => item.url = decoded,
                        None => warn!(url = %item.url, "Could not decode Google News link"),
                    }
                }
                item
            })
            .collect())
    }
}
