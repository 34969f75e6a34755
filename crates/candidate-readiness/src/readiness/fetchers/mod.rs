//! Capability contract for the external data sources pillars may consult.
//!
//! Each capability is optional. A slot left empty in [`FetcherSet`] means the
//! host never wired that integration; `Ok(None)` means the integration ran
//! and had nothing to say; `Err(_)` means it failed. Pillars treat the three
//! states differently when recording `fallbacks_used`.

mod http;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::LinkedInProfile;
use crate::config::FetcherConfig;

pub use http::{BrightDataClient, OpenRouterSentiment};

/// Result of a layoff lookup for one employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoffReport {
    pub has_layoffs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub date: NaiveDate,
    /// 0 = very negative, 1 = very positive.
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSentiment {
    pub text: String,
    pub sentiment: f64,
    pub confidence: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("unable to decode upstream payload: {0}")]
    Decode(String),
    #[error("upstream request timed out")]
    Timeout,
    #[error("fetcher unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            FetchError::Timeout
        } else if value.is_decode() {
            FetchError::Decode(value.to_string())
        } else {
            FetchError::Transport(value.to_string())
        }
    }
}

pub type FetchResult<T> = Result<Option<T>, FetchError>;

#[async_trait]
pub trait LayoffLookup: Send + Sync {
    async fn fetch_layoffs(&self, company: &str) -> FetchResult<LayoffReport>;
}

#[async_trait]
pub trait NewsLookup: Send + Sync {
    async fn fetch_company_news(&self, company: &str) -> FetchResult<Vec<NewsArticle>>;
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze_sentiment(&self, texts: &[String]) -> FetchResult<Vec<TextSentiment>>;
}

#[async_trait]
pub trait LinkedInLookup: Send + Sync {
    async fn fetch_linkedin_profile(&self, url: &str) -> FetchResult<LinkedInProfile>;
}

/// Bundle of optional capabilities handed to every pillar.
#[derive(Clone, Default)]
pub struct FetcherSet {
    pub layoffs: Option<Arc<dyn LayoffLookup>>,
    pub news: Option<Arc<dyn NewsLookup>>,
    pub sentiment: Option<Arc<dyn SentimentAnalyzer>>,
    pub linkedin: Option<Arc<dyn LinkedInLookup>>,
}

impl FetcherSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_layoffs(mut self, lookup: Arc<dyn LayoffLookup>) -> Self {
        self.layoffs = Some(lookup);
        self
    }

    pub fn with_news(mut self, lookup: Arc<dyn NewsLookup>) -> Self {
        self.news = Some(lookup);
        self
    }

    pub fn with_sentiment(mut self, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        self.sentiment = Some(analyzer);
        self
    }

    pub fn with_linkedin(mut self, lookup: Arc<dyn LinkedInLookup>) -> Self {
        self.linkedin = Some(lookup);
        self
    }

    /// Wire the live clients whose credentials are present.
    pub fn from_config(config: &FetcherConfig) -> Result<Self, FetchError> {
        let mut set = Self::none();

        if let Some(key) = config.brightdata_api_key.as_deref() {
            let client = Arc::new(BrightDataClient::new(key, config)?);
            set = set
                .with_layoffs(client.clone())
                .with_news(client.clone())
                .with_linkedin(client);
        }

        if let Some(key) = config.openrouter_api_key.as_deref() {
            let analyzer = Arc::new(OpenRouterSentiment::new(key, config)?);
            set = set.with_sentiment(analyzer);
        }

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.layoffs.is_none()
            && self.news.is_none()
            && self.sentiment.is_none()
            && self.linkedin.is_none()
    }
}

impl fmt::Debug for FetcherSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherSet")
            .field("layoffs", &self.layoffs.is_some())
            .field("news", &self.news.is_some())
            .field("sentiment", &self.sentiment.is_some())
            .field("linkedin", &self.linkedin.is_some())
            .finish()
    }
}
