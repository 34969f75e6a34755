use std::collections::BTreeSet;

use super::{PillarContext, PillarError};
use crate::readiness::domain::{GitHubEvent, GitHubRepo};
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{clamp_score, ratio_to_ceiling, DataSource, Signal};

const VARIETY_CEILING: f64 = 3.0;
const REPO_FALLBACK_CONFIDENCE: f64 = 0.4;

/// Events split into trailing 30-day windows.
#[derive(Debug, Default)]
struct Buckets<'a> {
    recent: Vec<&'a GitHubEvent>,
    mid: Vec<&'a GitHubEvent>,
    old: Vec<&'a GitHubEvent>,
}

fn bucket_events<'a>(ctx: &PillarContext<'_>, events: &'a [GitHubEvent]) -> Buckets<'a> {
    let mut buckets = Buckets::default();
    for event in events {
        let age = ctx.days_since(event.created_at);
        if (0.0..30.0).contains(&age) {
            buckets.recent.push(event);
        } else if (30.0..60.0).contains(&age) {
            buckets.mid.push(event);
        } else if (60.0..90.0).contains(&age) {
            buckets.old.push(event);
        }
    }
    buckets
}

/// 100 for a full cliff, 0 when nothing older exists to fall from.
pub(crate) fn cliff_severity(recent: usize, older: usize) -> f64 {
    match (recent, older) {
        (_, 0) => 0.0,
        (0, _) => 100.0,
        (recent, older) => clamp_score((1.0 - recent as f64 / older as f64) * 100.0),
    }
}

fn decay_pattern(recent: usize, mid: usize, old: usize) -> (&'static str, f64) {
    let (recent, mid, old) = (recent as f64, mid as f64, old as f64);
    if mid >= 0.8 * old && recent < 0.2 * old {
        ("sudden", 80.0)
    } else if mid > 0.0 && mid < old && mid > recent {
        ("gradual", 50.0)
    } else {
        ("stable", 20.0)
    }
}

fn distinct_kinds(events: &[&GitHubEvent]) -> usize {
    events
        .iter()
        .map(|event| event.kind.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn event_signals(buckets: &Buckets<'_>) -> Vec<Signal> {
    let mut signals = Vec::new();
    let (recent, mid, old) = (buckets.recent.len(), buckets.mid.len(), buckets.old.len());

    if recent > 0 || old > 0 {
        let severity = cliff_severity(recent, old);
        signals.push(Signal::new(
            "activity_cliff",
            severity / 100.0,
            severity,
            DataSource::Github,
            ((recent + old) as f64 / 20.0).min(0.9),
            format!("{recent} events in the last 30 days vs {old} from 60-90 days ago"),
        ));
    }

    if old > 0 {
        let (label, severity) = decay_pattern(recent, mid, old);
        signals.push(Signal::new(
            "decay_pattern",
            severity,
            severity,
            DataSource::Github,
            0.6,
            format!("{label} decline across windows ({old} -> {mid} -> {recent})"),
        ));
    }

    let old_kinds = distinct_kinds(&buckets.old);
    let recent_kinds = distinct_kinds(&buckets.recent);
    let drop = old_kinds.saturating_sub(recent_kinds) as f64;
    signals.push(Signal::new(
        "event_type_diversity",
        drop,
        ratio_to_ceiling(drop, VARIETY_CEILING),
        DataSource::Github,
        0.5,
        format!("{old_kinds} event types then vs {recent_kinds} now"),
    ));

    signals
}

fn repo_push_signal(ctx: &PillarContext<'_>, repos: &[GitHubRepo]) -> Signal {
    let recent = repos
        .iter()
        .filter(|repo| ctx.within_days(repo.pushed_at, 30.0))
        .count();
    let older = repos
        .iter()
        .filter(|repo| (60.0..90.0).contains(&ctx.days_since(repo.pushed_at)))
        .count();

    let score = if older > 0 && recent == 0 {
        70.0
    } else if older > recent {
        40.0
    } else {
        10.0
    };

    Signal::new(
        "repo_push_decay",
        score,
        score,
        DataSource::Github,
        REPO_FALLBACK_CONFIDENCE,
        format!("{recent} repositories pushed in the last 30 days vs {older} last pushed 60-90 days ago"),
    )
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let signals = if let Some(events) = ctx.input.non_empty_events() {
        event_signals(&bucket_events(ctx, events))
    } else if let Some(repos) = ctx.input.non_empty_repos() {
        vec![repo_push_signal(ctx, repos)]
    } else {
        Vec::new()
    };

    Ok(PillarResult::from_signals(
        PillarName::EngagementDecay,
        signals,
        DataSource::Github,
        Vec::new(),
    ))
}
