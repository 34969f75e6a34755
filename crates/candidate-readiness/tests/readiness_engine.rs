use std::sync::Arc;

use async_trait::async_trait;
use candidate_readiness::readiness::{
    tenure_bell_curve, DataSource, FetchError, FetchResult, FetcherSet, GitHubEvent,
    GitHubProfile, GitHubRepo, LayoffLookup, LayoffReport, LinkedInExperience, LinkedInProfile,
    NewsArticle, NewsLookup, PillarName, ReadinessEngine, ReadinessInput, ReadinessLevel,
    SentimentAnalyzer, TextSentiment,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn evaluation_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0)
        .single()
        .expect("valid instant")
}

fn ago(days: i64) -> DateTime<Utc> {
    evaluation_instant() - Duration::days(days)
}

fn repo(name: &str, language: &str, pushed: i64, created: i64) -> GitHubRepo {
    GitHubRepo {
        name: name.to_string(),
        language: Some(language.to_string()),
        stargazers_count: 10,
        forks_count: 2,
        pushed_at: ago(pushed),
        created_at: ago(created),
        topics: vec!["backend".to_string()],
        fork: false,
    }
}

fn github_candidate(id: &str) -> ReadinessInput {
    let mut input = ReadinessInput::new(id);
    input.github_username = Some("jdoe".to_string());
    input.current_company = Some("Initrode".to_string());
    input.github_profile = Some(GitHubProfile {
        login: "jdoe".to_string(),
        public_repos: 8,
        followers: 15,
        following: 45,
        created_at: ago(3000),
        updated_at: Some(ago(12)),
        bio: Some("Platform engineer. Open to work, seeking my next role".to_string()),
        company: Some("@initrode".to_string()),
    });
    input.github_repos = Some(vec![
        repo("jdoe", "Markdown", 4, 700),
        repo("edge-cache", "Rust", 12, 40),
        repo("k8s-operator", "Go", 25, 70),
        repo("ml-notebooks", "Julia", 40, 85),
        repo("billing", "Java", 420, 1800),
    ]);
    input.github_events = Some(vec![
        GitHubEvent::new("PushEvent", ago(80), "jdoe/billing"),
        GitHubEvent::new("PushEvent", ago(71), "jdoe/billing"),
        GitHubEvent::new("PullRequestEvent", ago(66), "initrode/core"),
        GitHubEvent::new("PushEvent", ago(45), "jdoe/billing"),
        GitHubEvent::new("WatchEvent", ago(6), "hashicorp/raft"),
        GitHubEvent::new("ForkEvent", ago(9), "vectordotdev/vector"),
    ]);
    input
}

fn scenario_candidate() -> ReadinessInput {
    let mut input = github_candidate("cand-scenario");
    let start = |days: i64| Some(ago(days).date_naive());
    input.linkedin_profile = Some(LinkedInProfile {
        headline: Some("Senior Engineer | Actively looking".to_string()),
        experience: Some(vec![
            LinkedInExperience {
                title: "Senior Engineer".to_string(),
                company: "Umbrella".to_string(),
                start_date: start(913),
                end_date: None,
                current: true,
            },
            LinkedInExperience {
                title: "Engineer".to_string(),
                company: "Initrode".to_string(),
                start_date: start(2100),
                end_date: start(930),
                current: false,
            },
        ]),
        skills: None,
        posts: None,
    });
    input
}

struct ConfirmedLayoff;

#[async_trait]
impl LayoffLookup for ConfirmedLayoff {
    async fn fetch_layoffs(&self, _company: &str) -> FetchResult<LayoffReport> {
        Ok(Some(LayoffReport {
            has_layoffs: true,
            date: Some(ago(14).date_naive()),
            count: Some(350),
        }))
    }
}

struct Rejecting;

#[async_trait]
impl LayoffLookup for Rejecting {
    async fn fetch_layoffs(&self, _company: &str) -> FetchResult<LayoffReport> {
        Err(FetchError::Status {
            code: 503,
            body: "maintenance".to_string(),
        })
    }
}

#[async_trait]
impl NewsLookup for Rejecting {
    async fn fetch_company_news(&self, _company: &str) -> FetchResult<Vec<NewsArticle>> {
        Err(FetchError::Timeout)
    }
}

#[async_trait]
impl SentimentAnalyzer for Rejecting {
    async fn analyze_sentiment(&self, _texts: &[String]) -> FetchResult<Vec<TextSentiment>> {
        Err(FetchError::Transport("connection reset".to_string()))
    }
}

#[test]
fn pillar_weights_sum_to_one() {
    let total: f64 = PillarName::ALL.iter().map(|pillar| pillar.weight()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn tenure_curve_rises_to_a_peak_then_settles_at_the_floor() {
    assert_eq!(tenure_bell_curve(0.5), 10);
    let peak = (0..350)
        .map(|step| f64::from(step) / 100.0)
        .map(tenure_bell_curve)
        .max()
        .unwrap_or_default();
    assert_eq!(peak, 100);
    assert!(tenure_bell_curve(2.5) >= tenure_bell_curve(1.0));

    let mut previous = tenure_bell_curve(3.5);
    for step in 36..200 {
        let current = tenure_bell_curve(f64::from(step) / 10.0);
        assert!(current <= previous);
        previous = current;
    }
    assert_eq!(previous, 5);
}

#[tokio::test]
async fn empty_input_scores_zero_with_seven_pillars() {
    let score = ReadinessEngine::offline()
        .score_at(ReadinessInput::new("only-id"), evaluation_instant())
        .await;

    assert_eq!(score.pillars.len(), 7);
    assert!(score.pillars.values().all(|result| result.score.is_none()));
    assert_eq!(score.overall, 0);
    assert_eq!(score.confidence, 0.0);
    assert_eq!(score.level, ReadinessLevel::Cold);
}

#[tokio::test]
async fn scores_stay_in_bounds_across_evidence_levels() {
    let mut inputs = vec![
        ReadinessInput::new("bare"),
        github_candidate("github"),
        scenario_candidate(),
    ];
    let mut sparse = ReadinessInput::new("sparse");
    sparse.years_at_company = Some(12.0);
    inputs.push(sparse);

    let engine = ReadinessEngine::offline();
    for input in inputs {
        let score = engine.score_at(input, evaluation_instant()).await;
        assert!(score.overall <= 100);
        assert!((0.0..=1.0).contains(&score.confidence));
        assert_eq!(score.pillars.len(), 7);
        for result in score.pillars.values() {
            assert_eq!(result.score.is_none(), result.signals.is_empty());
            assert!((0.0..=1.0).contains(&result.confidence));
            for signal in &result.signals {
                assert!((0.0..=100.0).contains(&signal.normalized_value));
                assert!((0.0..=1.0).contains(&signal.confidence));
            }
        }
    }
}

#[tokio::test]
async fn dropping_a_pillar_renormalizes_the_remaining_weights() {
    let score = ReadinessEngine::offline()
        .score_at(github_candidate("reweight"), evaluation_instant())
        .await;

    let scored: Vec<_> = score.scored_pillars().collect();
    let active_weight: f64 = scored.iter().map(|result| result.pillar.weight()).sum();
    let expected: f64 = scored
        .iter()
        .map(|result| {
            f64::from(result.score.unwrap_or_default()) * result.pillar.weight() / active_weight
        })
        .sum();
    let expected_confidence: f64 = scored
        .iter()
        .map(|result| result.confidence * result.pillar.weight() / active_weight)
        .sum();

    assert_eq!(score.overall, expected.round() as u8);
    assert!((score.confidence - expected_confidence).abs() < 1e-9);
}

#[tokio::test]
async fn open_to_work_candidate_with_mismatch_is_not_cold() {
    let score = ReadinessEngine::offline()
        .score_at(scenario_candidate(), evaluation_instant())
        .await;

    assert!(matches!(
        score.level,
        ReadinessLevel::Warming | ReadinessLevel::Warm | ReadinessLevel::Hot
    ));
    let profile = score
        .pillar(PillarName::ProfileOptimization)
        .expect("profile pillar");
    assert!(profile.signal("employer_mismatch").is_some());
    assert_eq!(profile.primary_source, DataSource::Linkedin);
}

#[tokio::test]
async fn confirmed_recent_layoff_pushes_company_health_above_half() {
    let engine = ReadinessEngine::new(FetcherSet::none().with_layoffs(Arc::new(ConfirmedLayoff)));
    let score = engine
        .score_at(github_candidate("layoff"), evaluation_instant())
        .await;

    let company = score.pillar(PillarName::CompanyHealth).expect("company pillar");
    assert!(company.score.unwrap_or_default() > 50);
    assert!(score.data_sources_summary.contains(&DataSource::LayoffsFyi));
}

#[tokio::test]
async fn rejecting_fetchers_still_produce_a_github_score() {
    let rejecting = Arc::new(Rejecting);
    let fetchers = FetcherSet::none()
        .with_layoffs(rejecting.clone())
        .with_news(rejecting.clone())
        .with_sentiment(rejecting);
    let score = ReadinessEngine::new(fetchers)
        .score_at(github_candidate("outage"), evaluation_instant())
        .await;

    assert!(score.overall <= 100);
    assert!(score.scored_pillars().count() > 0);
    assert!(score
        .scored_pillars()
        .all(|result| result.primary_source == DataSource::Github));
    assert!(score
        .pillars
        .values()
        .any(|result| !result.fallbacks_used.is_empty()));
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let engine = ReadinessEngine::new(FetcherSet::none().with_layoffs(Arc::new(ConfirmedLayoff)));
    let first = engine
        .score_at(scenario_candidate(), evaluation_instant())
        .await;
    let second = engine
        .score_at(scenario_candidate(), evaluation_instant())
        .await;

    assert_eq!(first.overall, second.overall);
    assert_eq!(first.pillars, second.pillars);
}

#[tokio::test]
async fn score_serializes_with_snake_case_keys() {
    let score = ReadinessEngine::offline()
        .score_at(scenario_candidate(), evaluation_instant())
        .await;
    let json = serde_json::to_value(&score).expect("score serializes");

    assert!(json["pillars"]["company_health"].is_object());
    assert!(json["data_sources_summary"].is_array());
    assert!(json["level"].is_string());
}
