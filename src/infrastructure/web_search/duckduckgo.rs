//! DuckDuckGo web search
//!
//! Tries the instant answer API first and falls back to the HTML results page
//! when it yields nothing. Hits are scored by rank with a boost for official
//! regulation domains.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{DomainError, WebResult, WebSearchProvider};
use crate::infrastructure::llm::HttpClientTrait;

pub const DEFAULT_DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";
pub const DEFAULT_DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

pub const DEFAULT_PRIORITY_DOMAINS: &[&str] = &[
    "bygningsreglementet.dk",
    "retsinformation.dk",
    "boligstyrelsen.dk",
    "energistyrelsen.dk",
    "brs.dk",
    "bygherreforeningen.dk",
];

const PRIORITY_BOOST: f64 = 1.2;
const TITLE_MAX_CHARS: usize = 100;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug)]
pub struct DuckDuckGoProvider<C: HttpClientTrait> {
    client: C,
    api_url: String,
    html_url: String,
    priority_domains: Vec<String>,
}

impl<C: HttpClientTrait> DuckDuckGoProvider<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            api_url: DEFAULT_DUCKDUCKGO_API_URL.to_string(),
            html_url: DEFAULT_DUCKDUCKGO_HTML_URL.to_string(),
            priority_domains: DEFAULT_PRIORITY_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }

    pub fn with_urls(mut self, api_url: impl Into<String>, html_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.html_url = html_url.into();
        self
    }

    pub fn with_priority_domains(mut self, domains: Vec<String>) -> Self {
        self.priority_domains = domains;
        self
    }

    async fn instant_answers(&self, query: &str) -> Result<Vec<RawHit>, DomainError> {
        let json = self
            .client
            .get_json(
                &self.api_url,
                vec![],
                &[
                    ("q", query),
                    ("format", "json"),
                    ("no_html", "1"),
                    ("skip_disambig", "1"),
                ],
            )
            .await?;

        let answer: InstantAnswer = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("duckduckgo", format!("Failed to parse instant answer: {}", e))
        })?;

        Ok(answer.into_hits())
    }

    async fn html_results(&self, query: &str) -> Result<Vec<RawHit>, DomainError> {
        let html = self
            .client
            .get_text(&self.html_url, vec![], &[("q", query)])
            .await?;

        Ok(parse_html_results(&html))
    }

    fn is_priority(&self, url: &str) -> bool {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase));

        match host {
            Some(host) => self
                .priority_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            None => false,
        }
    }

    fn score(&self, hits: Vec<RawHit>, max_results: usize) -> Vec<WebResult> {
        hits.into_iter()
            .filter(|hit| !hit.url.is_empty() && !hit.snippet.is_empty())
            .take(max_results)
            .enumerate()
            .map(|(rank, hit)| {
                let mut score = 1.0 / (1.0 + rank as f64);
                if self.is_priority(&hit.url) {
                    score *= PRIORITY_BOOST;
                }
                WebResult::new(hit.url, hit.snippet, score).with_title(hit.title)
            })
            .collect()
    }
}

#[async_trait]
impl<C: HttpClientTrait> WebSearchProvider for DuckDuckGoProvider<C> {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>, DomainError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let hits = match self.instant_answers(query).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                debug!(query, "No instant answers, falling back to HTML results");
                self.html_results(query).await?
            }
            Err(e) => {
                warn!(error = %e, "Instant answer lookup failed, falling back to HTML results");
                self.html_results(query).await?
            }
        };

        let results = self.score(hits, max_results);
        debug!(query, results = results.len(), "Web search completed");

        Ok(results)
    }

    fn provider_name(&self) -> &'static str {
        "duckduckgo"
    }
}

#[derive(Debug)]
struct RawHit {
    url: String,
    title: String,
    snippet: String,
}

impl RawHit {
    fn new(url: &str, title: &str, snippet: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            title: clean_text(title),
            snippet: clean_text(snippet),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "Abstract", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    /// Present on topic groups instead of `Text`
    #[serde(rename = "Topics", default)]
    topics: Vec<RelatedTopic>,
}

impl InstantAnswer {
    fn into_hits(self) -> Vec<RawHit> {
        let mut hits = Vec::new();

        if !self.abstract_text.is_empty() && !self.abstract_url.is_empty() {
            let title = if self.heading.is_empty() {
                "DuckDuckGo Abstract"
            } else {
                self.heading.as_str()
            };
            hits.push(RawHit::new(&self.abstract_url, title, &self.abstract_text));
        }

        let mut pending: Vec<RelatedTopic> = self.related_topics;
        pending.reverse();
        while let Some(topic) = pending.pop() {
            if !topic.topics.is_empty() {
                pending.extend(topic.topics.into_iter().rev());
                continue;
            }
            if topic.text.is_empty() {
                continue;
            }
            let title: String = topic.text.chars().take(TITLE_MAX_CHARS).collect();
            hits.push(RawHit::new(&topic.first_url, &title, &topic.text));
        }

        hits
    }
}

fn parse_html_results(html: &str) -> Vec<RawHit> {
    let document = Html::parse_document(html);

    let (Ok(result), Ok(link), Ok(snippet)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result)
        .filter_map(|element| {
            let anchor = element.select(&link).next()?;
            let href = anchor.value().attr("href")?;
            let title = anchor.text().collect::<String>();
            let text = element
                .select(&snippet)
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();

            Some(RawHit::new(&resolve_redirect(href), &title, &text))
        })
        .collect()
}

/// Unwrap DuckDuckGo's `/l/?uddg=` redirect links to the target URL
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

/// Collapse whitespace, decode common entities and drop inline URLs
fn clean_text(text: &str) -> String {
    let decoded = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'");
    let without_urls = URL_PATTERN.replace_all(&decoded, "");

    WHITESPACE.replace_all(&without_urls, " ").trim().to_string()
}
