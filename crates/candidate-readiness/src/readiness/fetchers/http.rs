use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    FetchError, FetchResult, LayoffLookup, LayoffReport, LinkedInLookup, NewsArticle, NewsLookup,
    SentimentAnalyzer, TextSentiment,
};
use crate::config::FetcherConfig;
use crate::readiness::domain::{
    parse_lenient_date, LinkedInExperience, LinkedInPost, LinkedInProfile,
};

const BRIGHTDATA_DATASETS_URL: &str = "https://api.brightdata.com/datasets/v3";
const BRIGHTDATA_SERP_URL: &str = "https://api.brightdata.com/request";
const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SNAPSHOT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const SNAPSHOT_POLL_CEILING: Duration = Duration::from_secs(30);
const MAX_LINKEDIN_POSTS: usize = 10;
const MAX_NEWS_ARTICLES: usize = 5;

fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| FetchError::Unavailable(err.to_string()))
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        code: status.as_u16(),
        body,
    })
}

/// BrightData-backed lookups: SERP queries for layoffs and news, dataset
/// scrapes for LinkedIn profiles.
pub struct BrightDataClient {
    http: Client,
    api_key: String,
    serp_zone: String,
    linkedin_dataset: String,
}

#[derive(Debug, Serialize)]
struct SerpRequest<'a> {
    zone: &'a str,
    url: String,
    format: &'a str,
    data_format: &'a str,
}

impl BrightDataClient {
    pub fn new(api_key: &str, config: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(config.request_timeout)?,
            api_key: api_key.to_string(),
            serp_zone: config.serp_zone.clone(),
            linkedin_dataset: config.linkedin_dataset.clone(),
        })
    }

    async fn search(&self, query: &str, results: u8) -> Result<Vec<Value>, FetchError> {
        let url = Url::parse_with_params(
            GOOGLE_SEARCH_URL,
            &[
                ("q", query.to_string()),
                ("hl", "en".to_string()),
                ("num", results.to_string()),
            ],
        )
        .map_err(|err| FetchError::Unavailable(err.to_string()))?;

        let request = SerpRequest {
            zone: &self.serp_zone,
            url: url.to_string(),
            format: "raw",
            data_format: "parsed_light",
        };

        let response = self
            .http
            .post(BRIGHTDATA_SERP_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let payload: Value = ensure_success(response).await?.json().await?;
        Ok(organic_results(&payload))
    }

    async fn poll_snapshot(&self, snapshot_id: &str) -> Result<Option<Value>, FetchError> {
        let started = Instant::now();
        while started.elapsed() < SNAPSHOT_POLL_CEILING {
            let progress: Value = ensure_success(
                self.http
                    .get(format!("{BRIGHTDATA_DATASETS_URL}/progress/{snapshot_id}"))
                    .bearer_auth(&self.api_key)
                    .send()
                    .await?,
            )
            .await?
            .json()
            .await?;

            match progress.get("status").and_then(Value::as_str) {
                Some("ready") => {
                    let snapshot = ensure_success(
                        self.http
                            .get(format!("{BRIGHTDATA_DATASETS_URL}/snapshot/{snapshot_id}"))
                            .query(&[("format", "json")])
                            .bearer_auth(&self.api_key)
                            .send()
                            .await?,
                    )
                    .await?
                    .json()
                    .await?;
                    return Ok(Some(snapshot));
                }
                Some("error") | Some("failed") => {
                    return Err(FetchError::Unavailable(format!(
                        "snapshot {snapshot_id} failed upstream"
                    )))
                }
                _ => tokio::time::sleep(SNAPSHOT_POLL_INTERVAL).await,
            }
        }

        warn!(snapshot_id, "linkedin snapshot not ready before poll ceiling");
        Err(FetchError::Timeout)
    }
}

/// The SERP payload nests organic hits differently depending on parser version.
fn organic_results(payload: &Value) -> Vec<Value> {
    let candidates = [
        payload.get("organic"),
        payload.get("results").and_then(|results| results.get("organic")),
        payload.get("results"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| value.as_array().cloned())
        .unwrap_or_default()
}

fn text_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|text| !text.is_empty())
}

fn mentions_layoff(result: &Value) -> bool {
    ["title", "snippet", "description"].iter().any(|key| {
        result
            .get(*key)
            .and_then(Value::as_str)
            .map(|text| text.to_lowercase().contains("layoff"))
            .unwrap_or(false)
    })
}

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*)\s*(?:employees?|people|workers?|laid off)")
            .expect("layoff count pattern compiles")
    })
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{4}-\d{2}-\d{2})\b|\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(\d{4})\b")
            .expect("layoff date pattern compiles")
    })
}

pub(crate) fn parse_layoff_snippet(snippet: &str) -> LayoffReport {
    let count = count_pattern()
        .captures(snippet)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().replace(',', "").parse::<u32>().ok());

    let date = date_pattern().captures(snippet).and_then(|caps| {
        if let Some(iso) = caps.get(1) {
            return parse_lenient_date(iso.as_str());
        }
        let month = caps.get(2)?.as_str();
        let year = caps.get(3)?.as_str();
        NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %b %Y").ok()
    });

    LayoffReport {
        has_layoffs: true,
        date,
        count,
    }
}

#[async_trait]
impl LayoffLookup for BrightDataClient {
    async fn fetch_layoffs(&self, company: &str) -> FetchResult<LayoffReport> {
        let results = self
            .search(&format!("site:layoffs.fyi {company}"), 5)
            .await?;

        if !results.iter().any(mentions_layoff) {
            debug!(company, "no layoff mentions in search results");
            return Ok(Some(LayoffReport {
                has_layoffs: false,
                date: None,
                count: None,
            }));
        }

        let snippet = results
            .first()
            .and_then(|first| text_field(first, &["snippet", "description"]))
            .unwrap_or_default();
        Ok(Some(parse_layoff_snippet(snippet)))
    }
}

#[async_trait]
impl NewsLookup for BrightDataClient {
    async fn fetch_company_news(&self, company: &str) -> FetchResult<Vec<NewsArticle>> {
        let results = self.search(&format!("{company} news"), 10).await?;
        if results.is_empty() {
            return Ok(None);
        }

        // SERP hits carry no tone; they enter as neutral until an analyzer scores them.
        let today = Utc::now().date_naive();
        let articles = results
            .iter()
            .take(MAX_NEWS_ARTICLES)
            .map(|result| NewsArticle {
                title: text_field(result, &["title"]).unwrap_or_default().to_string(),
                date: today,
                sentiment: 0.5,
            })
            .collect();
        Ok(Some(articles))
    }
}

#[async_trait]
impl LinkedInLookup for BrightDataClient {
    async fn fetch_linkedin_profile(&self, url: &str) -> FetchResult<LinkedInProfile> {
        let trigger: Value = ensure_success(
            self.http
                .post(format!("{BRIGHTDATA_DATASETS_URL}/trigger"))
                .query(&[("dataset_id", self.linkedin_dataset.as_str())])
                .bearer_auth(&self.api_key)
                .json(&[serde_json::json!({ "url": url })])
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let Some(snapshot_id) = trigger.get("snapshot_id").and_then(Value::as_str) else {
            return Ok(None);
        };

        let Some(snapshot) = self.poll_snapshot(snapshot_id).await? else {
            return Ok(None);
        };

        let record = match &snapshot {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        Ok(record.map(linkedin_from_record))
    }
}

pub(crate) fn linkedin_from_record(record: &Value) -> LinkedInProfile {
    let headline = text_field(record, &["headline", "title"]).map(str::to_string);

    let experience = ["experience", "positions"]
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_array))
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    let end_date = text_field(entry, &["end_date", "to"]).and_then(parse_lenient_date);
                    LinkedInExperience {
                        title: text_field(entry, &["title", "role"]).unwrap_or_default().to_string(),
                        company: text_field(entry, &["company", "company_name"])
                            .unwrap_or_default()
                            .to_string(),
                        start_date: text_field(entry, &["start_date", "from"])
                            .and_then(parse_lenient_date),
                        end_date,
                        current: entry
                            .get("current")
                            .and_then(Value::as_bool)
                            .unwrap_or(end_date.is_none()),
                    }
                })
                .collect()
        });

    let skills = record.get("skills").and_then(Value::as_array).map(|skills| {
        skills
            .iter()
            .filter_map(|skill| match skill {
                Value::String(name) => Some(name.clone()),
                other => text_field(other, &["name", "title"]).map(str::to_string),
            })
            .collect()
    });

    let posts = ["posts", "activity"]
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_array))
        .map(|entries| {
            entries
                .iter()
                .take(MAX_LINKEDIN_POSTS)
                .filter_map(|entry| {
                    let date = text_field(entry, &["date", "posted_at"])
                        .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())?
                        .with_timezone(&Utc);
                    let reactions = ["reactions", "likes"]
                        .iter()
                        .find_map(|key| entry.get(*key).and_then(Value::as_u64))
                        .unwrap_or(0);
                    Some(LinkedInPost {
                        text: text_field(entry, &["text", "content"]).unwrap_or_default().to_string(),
                        date,
                        reactions: u32::try_from(reactions).unwrap_or(u32::MAX),
                    })
                })
                .collect()
        });

    LinkedInProfile {
        headline,
        experience,
        skills,
        posts,
    }
}

/// LLM sentiment scoring through OpenRouter's chat-completions API.
pub struct OpenRouterSentiment {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenRouterSentiment {
    pub fn new(api_key: &str, config: &FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(config.request_timeout)?,
            api_key: api_key.to_string(),
            model: config.openrouter_model.clone(),
        })
    }
}

fn sentiment_prompt(texts: &[String]) -> String {
    let numbered = texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("{}. {}", index + 1, text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Analyze the sentiment of these texts on a scale from 0 (very negative) to 1 (very positive). Return JSON array.\n\nTexts:\n{numbered}\n\nReturn format: [{{\"text\": \"...\", \"sentiment\": 0.7, \"confidence\": 0.9}}, ...]"
    )
}

/// Accepts a bare array or an object wrapping it under `results`/`sentiments`.
pub(crate) fn parse_sentiment_content(
    content: &str,
    texts: &[String],
) -> Result<Vec<TextSentiment>, FetchError> {
    let parsed: Value =
        serde_json::from_str(content).map_err(|err| FetchError::Decode(err.to_string()))?;
    let entries = match &parsed {
        Value::Array(items) => items.clone(),
        Value::Object(_) => ["results", "sentiments"]
            .iter()
            .find_map(|key| parsed.get(*key).and_then(Value::as_array).cloned())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, entry)| TextSentiment {
            text: text_field(entry, &["text"])
                .map(str::to_string)
                .or_else(|| texts.get(index).cloned())
                .unwrap_or_default(),
            sentiment: entry.get("sentiment").and_then(Value::as_f64).unwrap_or(0.5),
            confidence: entry.get("confidence").and_then(Value::as_f64).unwrap_or(0.7),
        })
        .collect())
}

#[async_trait]
impl SentimentAnalyzer for OpenRouterSentiment {
    async fn analyze_sentiment(&self, texts: &[String]) -> FetchResult<Vec<TextSentiment>> {
        if texts.is_empty() {
            return Ok(None);
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: sentiment_prompt(texts),
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let completion: ChatCompletionResponse = ensure_success(response).await?.json().await?;

        let Some(content) = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .filter(|content| !content.trim().is_empty())
        else {
            return Ok(None);
        };

        let results = parse_sentiment_content(content, texts)?;
        Ok(Some(results).filter(|results| !results.is_empty()))
    }
}
