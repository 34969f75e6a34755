use std::collections::BTreeSet;

use super::{PillarContext, PillarError};
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{ratio_to_ceiling, DataSource, Signal};

const RATIO_CEILING: f64 = 10.0;
const ORG_CEILING: f64 = 10.0;
const RECENT_ACTIVITY_CEILING: f64 = 20.0;
const RECENT_FORK_CEILING: f64 = 5.0;

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let input = ctx.input;
    if input.github_profile.is_none() && input.github_events.is_none() {
        return Ok(PillarResult::no_data(
            PillarName::NetworkIntelligence,
            DataSource::Github,
            Vec::new(),
        ));
    }

    let mut signals = Vec::new();

    if let Some(profile) = &input.github_profile {
        let following = f64::from(profile.following);
        let ratio = if profile.followers == 0 {
            following
        } else {
            following / f64::from(profile.followers)
        };
        signals.push(Signal::new(
            "follow_ratio",
            ratio,
            ratio_to_ceiling(ratio, RATIO_CEILING),
            DataSource::Github,
            0.6,
            format!(
                "following {} vs {} followers (ratio {ratio:.2})",
                profile.following, profile.followers
            ),
        ));
    }

    if let Some(events) = input.github_events.as_deref().filter(|events| !events.is_empty()) {
        let excluded: BTreeSet<String> = [
            input
                .github_username
                .clone()
                .or_else(|| input.github_profile.as_ref().map(|p| p.login.clone())),
            input.employer(),
        ]
        .into_iter()
        .flatten()
        .map(|name| name.to_lowercase())
        .collect();

        let orgs: BTreeSet<String> = events
            .iter()
            .filter(|event| event.is_watch_or_fork())
            .map(|event| event.owner())
            .filter(|owner| !owner.is_empty() && !excluded.contains(owner))
            .collect();
        let org_count = orgs.len() as f64;
        signals.push(Signal::new(
            "org_diversity",
            org_count,
            ratio_to_ceiling(org_count, ORG_CEILING),
            DataSource::Github,
            0.7,
            format!("starred or forked work from {} outside organizations", orgs.len()),
        ));

        let recent = events
            .iter()
            .filter(|event| event.is_watch_or_fork() && ctx.within_days(event.created_at, 30.0))
            .count() as f64;
        signals.push(Signal::new(
            "recent_exploration",
            recent,
            ratio_to_ceiling(recent, RECENT_ACTIVITY_CEILING),
            DataSource::Github,
            0.8,
            format!("{recent} watch/fork events in the last 30 days"),
        ));
    }

    if let Some(repos) = input.github_repos.as_deref() {
        let forks = repos
            .iter()
            .filter(|repo| repo.fork && ctx.within_days(repo.pushed_at, 90.0))
            .count() as f64;
        signals.push(Signal::new(
            "recent_forks",
            forks,
            ratio_to_ceiling(forks, RECENT_FORK_CEILING),
            DataSource::Github,
            0.75,
            format!("{forks} forked repositories active in the last 90 days"),
        ));
    }

    Ok(PillarResult::from_signals(
        PillarName::NetworkIntelligence,
        signals,
        DataSource::Github,
        Vec::new(),
    ))
}
