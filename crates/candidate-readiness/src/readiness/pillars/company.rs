use tracing::{debug, warn};

use super::{keyword_hits, PillarContext, PillarError};
use crate::readiness::domain::GitHubProfile;
use crate::readiness::fetchers::{LayoffReport, NewsArticle};
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{clamp_score, DataSource, Signal};

const LAYOFF_HIT_SCORE: f64 = 85.0;
const LAYOFF_MISS_SCORE: f64 = 10.0;
const LAYOFF_DECAY_DAYS: f64 = 365.0;

const DEPARTURE_PHRASES: &[&str] = &["formerly", "ex-", "previously at", "alumni", "looking for"];

fn layoff_signal(ctx: &PillarContext<'_>, employer: &str, report: &LayoffReport) -> Signal {
    if !report.has_layoffs {
        return Signal::new(
            "layoff_data",
            0.0,
            LAYOFF_MISS_SCORE,
            DataSource::LayoffsFyi,
            0.9,
            format!("no recorded layoffs at {employer}"),
        );
    }

    let recency = report
        .date
        .map(|date| (1.0 - ctx.days_since_date(date) / LAYOFF_DECAY_DAYS).clamp(0.0, 1.0))
        .unwrap_or(0.5);
    let detail = match (report.count, report.date) {
        (Some(count), Some(date)) => format!("{employer} laid off {count} people on {date}"),
        (None, Some(date)) => format!("{employer} reported layoffs on {date}"),
        (Some(count), None) => format!("{employer} laid off {count} people (undated)"),
        (None, None) => format!("{employer} reported layoffs (undated)"),
    };

    Signal::new(
        "layoff_data",
        f64::from(report.count.unwrap_or(0)),
        LAYOFF_HIT_SCORE * recency,
        DataSource::LayoffsFyi,
        0.9,
        detail,
    )
}

fn news_signal(employer: &str, articles: &[NewsArticle]) -> Signal {
    let average =
        articles.iter().map(|article| article.sentiment).sum::<f64>() / articles.len() as f64;
    Signal::new(
        "news_sentiment",
        average,
        clamp_score((1.0 - average) * 50.0 + 25.0),
        DataSource::NewsApi,
        0.7,
        format!(
            "average sentiment {average:.2} across {} {employer} headlines",
            articles.len()
        ),
    )
}

fn profile_signal(profile: &GitHubProfile) -> Signal {
    let bio = profile.bio.as_deref().unwrap_or_default();
    let hits = keyword_hits(bio, DEPARTURE_PHRASES);
    if !hits.is_empty() {
        return Signal::new(
            "departure_signal",
            hits.len() as f64,
            80.0,
            DataSource::Github,
            0.6,
            format!("bio mentions {}", hits.join(", ")),
        );
    }

    let listed = profile
        .company
        .as_deref()
        .map(str::trim)
        .filter(|company| !company.is_empty());
    match listed {
        None => Signal::new(
            "no_company_listed",
            0.0,
            40.0,
            DataSource::Github,
            0.3,
            "GitHub profile has no company field",
        ),
        Some(company) => Signal::new(
            "company_listed",
            1.0,
            10.0,
            DataSource::Github,
            0.3,
            format!("GitHub profile lists {company}"),
        ),
    }
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let Some(employer) = ctx.input.employer() else {
        return Ok(PillarResult::no_data(
            PillarName::CompanyHealth,
            DataSource::Github,
            Vec::new(),
        ));
    };

    let mut signals = Vec::new();
    let mut fallbacks = Vec::new();

    if let Some(lookup) = &ctx.fetchers.layoffs {
        match lookup.fetch_layoffs(&employer).await {
            Ok(Some(report)) => signals.push(layoff_signal(ctx, &employer, &report)),
            Ok(None) => debug!(employer = %employer, "layoff lookup returned no data"),
            Err(err) => {
                warn!(employer = %employer, error = %err, "layoff lookup failed");
                fallbacks.push(DataSource::LayoffsFyi);
            }
        }
    }

    if let Some(lookup) = &ctx.fetchers.news {
        match lookup.fetch_company_news(&employer).await {
            Ok(Some(articles)) if !articles.is_empty() => {
                signals.push(news_signal(&employer, &articles))
            }
            Ok(_) => debug!(employer = %employer, "news lookup returned no articles"),
            Err(err) => {
                warn!(employer = %employer, error = %err, "news lookup failed");
                fallbacks.push(DataSource::NewsApi);
            }
        }
    }

    if signals.is_empty() {
        if let Some(profile) = &ctx.input.github_profile {
            signals.push(profile_signal(profile));
        }
    }

    let primary = signals
        .first()
        .map(|signal| signal.source)
        .unwrap_or(DataSource::Github);

    Ok(PillarResult::from_signals(
        PillarName::CompanyHealth,
        signals,
        primary,
        fallbacks,
    ))
}
