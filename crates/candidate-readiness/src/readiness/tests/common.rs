use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::readiness::domain::{
    GitHubEvent, GitHubProfile, GitHubRepo, LinkedInExperience, LinkedInPost, LinkedInProfile,
    ReadinessInput,
};
use crate::readiness::fetchers::{
    FetchError, FetchResult, FetcherSet, LayoffLookup, LayoffReport, LinkedInLookup, NewsArticle,
    NewsLookup, SentimentAnalyzer, TextSentiment,
};
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::pillars::{self, PillarContext};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid evaluation instant")
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn date_days_ago(days: i64) -> NaiveDate {
    days_ago(days).date_naive()
}

pub(super) fn github_profile(login: &str) -> GitHubProfile {
    GitHubProfile {
        login: login.to_string(),
        public_repos: 12,
        followers: 40,
        following: 20,
        created_at: days_ago(6 * 365),
        updated_at: Some(days_ago(3)),
        bio: Some("Backend engineer".to_string()),
        company: Some("Acme".to_string()),
    }
}

pub(super) fn repo(name: &str, language: Option<&str>, pushed_days: i64, created_days: i64) -> GitHubRepo {
    GitHubRepo {
        name: name.to_string(),
        language: language.map(str::to_string),
        stargazers_count: 3,
        forks_count: 1,
        pushed_at: days_ago(pushed_days),
        created_at: days_ago(created_days),
        topics: Vec::new(),
        fork: false,
    }
}

pub(super) fn event(kind: &str, repo: &str, days: i64) -> GitHubEvent {
    GitHubEvent::new(kind, days_ago(days), repo)
}

pub(super) fn role(
    title: &str,
    company: &str,
    start_days: i64,
    end_days: Option<i64>,
) -> LinkedInExperience {
    LinkedInExperience {
        title: title.to_string(),
        company: company.to_string(),
        start_date: Some(date_days_ago(start_days)),
        end_date: end_days.map(date_days_ago),
        current: end_days.is_none(),
    }
}

pub(super) fn linkedin_post(text: &str, days: i64, reactions: u32) -> LinkedInPost {
    LinkedInPost {
        text: text.to_string(),
        date: days_ago(days),
        reactions,
    }
}

/// Open-to-work bio, GitHub/LinkedIn employer mismatch, ~2.5 years in the
/// current role and three languages adopted in the last six months.
pub(super) fn rich_input() -> ReadinessInput {
    let mut profile = github_profile("octo-dev");
    profile.bio = Some("Open to work | Rust and distributed systems".to_string());
    profile.following = 120;
    profile.followers = 30;

    let mut input = ReadinessInput::new("cand-rich");
    input.name = Some("Sam Rivera".to_string());
    input.github_username = Some("octo-dev".to_string());
    input.location = Some("Berlin".to_string());
    input.github_profile = Some(profile);
    input.github_repos = Some(vec![
        repo("octo-dev", Some("Markdown"), 2, 400),
        repo("tokio-playground", Some("Rust"), 10, 60),
        repo("grpc-gateway-fork", Some("Go"), 20, 80),
        repo("zig-allocator", Some("Zig"), 30, 45),
        repo("legacy-django", Some("Python"), 500, 1500),
    ]);
    input.github_events = Some(vec![
        event("PushEvent", "octo-dev/tokio-playground", 75),
        event("PushEvent", "octo-dev/tokio-playground", 70),
        event("PullRequestEvent", "acme/api", 65),
        event("IssuesEvent", "acme/api", 62),
        event("WatchEvent", "rust-lang/rust", 5),
        event("WatchEvent", "tokio-rs/axum", 4),
        event("ForkEvent", "grpc/grpc-go", 20),
        event("WatchEvent", "ziglang/zig", 2),
    ]);
    input.linkedin_profile = Some(LinkedInProfile {
        headline: Some("Staff Engineer, open to new challenges".to_string()),
        experience: Some(vec![
            role("Staff Engineer", "Globex", 913, None),
            role("Senior Engineer", "Initech", 1700, Some(950)),
            role("Engineer", "Hooli", 2400, Some(1750)),
        ]),
        skills: Some(vec!["Rust".to_string(), "Go".to_string()]),
        posts: Some(vec![
            linkedin_post("Tired of endless meetings, time for a change", 10, 4),
            linkedin_post("Excited about our launch", 120, 40),
        ]),
    });
    input
}

pub(super) async fn run_pillar(
    pillar: PillarName,
    input: &ReadinessInput,
    fetchers: &FetcherSet,
) -> PillarResult {
    let ctx = PillarContext::new(input, fetchers, now());
    pillars::compute(pillar, &ctx)
        .await
        .expect("pillar computes")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub(super) struct StaticLayoffs(pub Option<LayoffReport>);

#[async_trait]
impl LayoffLookup for StaticLayoffs {
    async fn fetch_layoffs(&self, _company: &str) -> FetchResult<LayoffReport> {
        Ok(self.0.clone())
    }
}

pub(super) struct StaticNews(pub Vec<NewsArticle>);

#[async_trait]
impl NewsLookup for StaticNews {
    async fn fetch_company_news(&self, _company: &str) -> FetchResult<Vec<NewsArticle>> {
        Ok(Some(self.0.clone()))
    }
}

pub(super) struct StaticSentiment(pub f64, pub f64);

#[async_trait]
impl SentimentAnalyzer for StaticSentiment {
    async fn analyze_sentiment(&self, texts: &[String]) -> FetchResult<Vec<TextSentiment>> {
        Ok(Some(
            texts
                .iter()
                .map(|text| TextSentiment {
                    text: text.clone(),
                    sentiment: self.0,
                    confidence: self.1,
                })
                .collect(),
        ))
    }
}

#[derive(Default)]
pub(super) struct StaticLinkedIn {
    pub profile: Option<LinkedInProfile>,
    pub calls: AtomicUsize,
}

impl StaticLinkedIn {
    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkedInLookup for StaticLinkedIn {
    async fn fetch_linkedin_profile(&self, _url: &str) -> FetchResult<LinkedInProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.profile.clone())
    }
}

/// Every capability rejects.
pub(super) struct FailingFetcher;

fn outage() -> FetchError {
    FetchError::Unavailable("upstream outage".to_string())
}

#[async_trait]
impl LayoffLookup for FailingFetcher {
    async fn fetch_layoffs(&self, _company: &str) -> FetchResult<LayoffReport> {
        Err(outage())
    }
}

#[async_trait]
impl NewsLookup for FailingFetcher {
    async fn fetch_company_news(&self, _company: &str) -> FetchResult<Vec<NewsArticle>> {
        Err(outage())
    }
}

#[async_trait]
impl SentimentAnalyzer for FailingFetcher {
    async fn analyze_sentiment(&self, _texts: &[String]) -> FetchResult<Vec<TextSentiment>> {
        Err(outage())
    }
}

#[async_trait]
impl LinkedInLookup for FailingFetcher {
    async fn fetch_linkedin_profile(&self, _url: &str) -> FetchResult<LinkedInProfile> {
        Err(FetchError::Timeout)
    }
}

pub(super) fn failing_fetchers() -> FetcherSet {
    let failing = Arc::new(FailingFetcher);
    FetcherSet::none()
        .with_layoffs(failing.clone())
        .with_news(failing.clone())
        .with_sentiment(failing.clone())
        .with_linkedin(failing)
}

/// Layoff lookup whose task blows up mid-computation.
pub(super) struct PanickingLayoffs;

#[async_trait]
impl LayoffLookup for PanickingLayoffs {
    async fn fetch_layoffs(&self, _company: &str) -> FetchResult<LayoffReport> {
        panic!("layoff scraper crashed");
    }
}
