use crate::infra::{build_engine, load_inputs, parse_timestamp};
use candidate_readiness::config::AppConfig;
use candidate_readiness::error::AppError;
use candidate_readiness::readiness::{
    DataSource, GitHubEvent, GitHubProfile, GitHubRepo, LinkedInExperience, LinkedInPost,
    LinkedInProfile, PillarName, PillarResult, ReadinessEngine, ReadinessInput, ReadinessScore,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding one candidate evidence bundle or a list of them
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Skip every live fetcher even when credentials are configured
    #[arg(long)]
    pub(crate) offline: bool,
    /// Print the raw score JSON instead of the pillar breakdown
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant (RFC 3339) the sample histories are anchored to
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Print the raw score JSON instead of the pillar breakdown
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        input,
        now,
        offline,
        json,
    } = args;

    let engine = if offline {
        ReadinessEngine::offline()
    } else {
        build_engine(&AppConfig::load()?, false)?
    };
    let candidates = load_inputs(&input)?;
    let now = now.unwrap_or_else(Utc::now);

    let mut scores = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        scores.push(engine.score_at(candidate, now).await);
    }

    emit(&scores, json)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(demo_instant);
    let engine = ReadinessEngine::offline();

    let mut scores = Vec::new();
    for candidate in sample_candidates(now) {
        scores.push(engine.score_at(candidate, now).await);
    }

    if !args.json {
        println!("Candidate readiness demo (offline, evaluated {})", now.to_rfc3339());
    }
    emit(&scores, args.json)
}

fn emit(scores: &[ReadinessScore], json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(scores)?);
        return Ok(());
    }
    for score in scores {
        println!();
        render_score(score);
    }
    Ok(())
}

pub(crate) fn render_score(score: &ReadinessScore) {
    println!("Candidate {}", score.candidate_id.as_str());
    println!(
        "Overall readiness: {}/100 ({}), confidence {:.2}",
        score.overall,
        score.level.label(),
        score.confidence
    );
    println!("Computed at {}", score.computed_at.to_rfc3339());
    if score.data_sources_summary.is_empty() {
        println!("Data sources: none");
    } else {
        println!("Data sources: {}", source_list(&score.data_sources_summary));
    }

    println!("\nPillar breakdown");
    for pillar in PillarName::ALL {
        match score.pillar(pillar) {
            Some(result) => render_pillar(result),
            None => println!("- {}: missing", pillar.label()),
        }
    }
}

fn render_pillar(result: &PillarResult) {
    let weight = result.pillar.weight() * 100.0;
    let headline = match (result.score, result.error.as_deref()) {
        (_, Some(err)) => format!("failed ({err})"),
        (Some(score), None) => format!(
            "{score} | confidence {:.2} | primary {}",
            result.confidence,
            result.primary_source.label()
        ),
        (None, None) => "no data".to_string(),
    };
    println!("- {} ({weight:.0}%): {headline}", result.pillar.label());

    if !result.fallbacks_used.is_empty() {
        println!("    fallbacks: {}", source_list(&result.fallbacks_used));
    }
    for signal in &result.signals {
        println!(
            "    {} = {:.2} -> {:.1} ({}, confidence {:.2}) {}",
            signal.name,
            signal.value,
            signal.normalized_value,
            signal.source.label(),
            signal.confidence,
            signal.detail
        );
    }
}

fn source_list(sources: &[DataSource]) -> String {
    sources
        .iter()
        .map(|source| source.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn demo_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// An engineer visibly exploring the market and one settled in a long role.
pub(crate) fn sample_candidates(now: DateTime<Utc>) -> Vec<ReadinessInput> {
    vec![exploring_candidate(now), settled_candidate(now)]
}

fn repo(
    now: DateTime<Utc>,
    name: &str,
    language: &str,
    pushed_days: i64,
    created_days: i64,
) -> GitHubRepo {
    GitHubRepo {
        name: name.to_string(),
        language: Some(language.to_string()),
        stargazers_count: 12,
        forks_count: 3,
        pushed_at: now - Duration::days(pushed_days),
        created_at: now - Duration::days(created_days),
        topics: Vec::new(),
        fork: false,
    }
}

fn role(
    now: DateTime<Utc>,
    title: &str,
    company: &str,
    start_days: i64,
    end_days: Option<i64>,
) -> LinkedInExperience {
    LinkedInExperience {
        title: title.to_string(),
        company: company.to_string(),
        start_date: Some((now - Duration::days(start_days)).date_naive()),
        end_date: end_days.map(|days| (now - Duration::days(days)).date_naive()),
        current: end_days.is_none(),
    }
}

fn exploring_candidate(now: DateTime<Utc>) -> ReadinessInput {
    let ago = |days: i64| now - Duration::days(days);

    let mut input = ReadinessInput::new("demo-exploring");
    input.name = Some("Riley Chen".to_string());
    input.github_username = Some("rchen".to_string());
    input.location = Some("Lisbon".to_string());
    input.github_profile = Some(GitHubProfile {
        login: "rchen".to_string(),
        public_repos: 9,
        followers: 25,
        following: 140,
        created_at: ago(7 * 365),
        updated_at: Some(ago(2)),
        bio: Some("Distributed systems engineer. Open to work".to_string()),
        company: Some("@initech".to_string()),
    });
    input.github_repos = Some(vec![
        repo(now, "rchen", "Markdown", 3, 500),
        repo(now, "raft-sandbox", "Rust", 6, 50),
        repo(now, "edge-proxy", "Go", 18, 75),
        repo(now, "payments-monolith", "Java", 380, 1600),
    ]);
    input.github_events = Some(vec![
        GitHubEvent::new("PushEvent", ago(82), "rchen/payments-monolith"),
        GitHubEvent::new("PushEvent", ago(77), "rchen/payments-monolith"),
        GitHubEvent::new("PullRequestEvent", ago(68), "initech/ledger"),
        GitHubEvent::new("WatchEvent", ago(8), "tokio-rs/tokio"),
        GitHubEvent::new("ForkEvent", ago(12), "etcd-io/raft"),
    ]);
    input.linkedin_profile = Some(LinkedInProfile {
        headline: Some("Senior Engineer | Open to new opportunities".to_string()),
        experience: Some(vec![
            role(now, "Senior Engineer", "Globex", 880, None),
            role(now, "Engineer", "Initech", 1900, Some(900)),
        ]),
        skills: Some(vec!["Rust".to_string(), "Go".to_string(), "Java".to_string()]),
        posts: Some(vec![LinkedInPost {
            text: "Frustrated with another reorg, looking for a new challenge".to_string(),
            date: ago(9),
            reactions: 6,
        }]),
    });
    input
}

fn settled_candidate(now: DateTime<Utc>) -> ReadinessInput {
    let ago = |days: i64| now - Duration::days(days);

    let mut input = ReadinessInput::new("demo-settled");
    input.name = Some("Morgan Ellis".to_string());
    input.github_username = Some("mellis".to_string());
    input.current_company = Some("Hooli".to_string());
    input.years_at_company = Some(9.0);
    input.github_profile = Some(GitHubProfile {
        login: "mellis".to_string(),
        public_repos: 4,
        followers: 60,
        following: 15,
        created_at: ago(10 * 365),
        updated_at: Some(ago(20)),
        bio: Some("Infrastructure at Hooli".to_string()),
        company: Some("Hooli".to_string()),
    });
    input.github_repos = Some(vec![
        repo(now, "dotfiles", "Shell", 5, 2500),
        repo(now, "hooli-tools", "Python", 9, 2200),
    ]);
    input.github_events = Some(
        [84, 71, 63, 55, 41, 33, 22, 14, 6]
            .into_iter()
            .map(|days| GitHubEvent::new("PushEvent", ago(days), "mellis/hooli-tools"))
            .collect(),
    );
    input
}
