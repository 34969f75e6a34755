use std::collections::BTreeSet;

use super::{PillarContext, PillarError};
use crate::readiness::domain::GitHubRepo;
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{ratio_to_ceiling, DataSource, Signal};

const RECENT_WINDOW_DAYS: f64 = 180.0;
const CREATION_WINDOW_DAYS: f64 = 90.0;
const NEW_LANGUAGE_CEILING: f64 = 3.0;
const BREADTH_CEILING: f64 = 8.0;
const TOPIC_CEILING: f64 = 5.0;
const CREATION_CEILING: f64 = 5.0;
const SKILL_LIST_CEILING: f64 = 15.0;

/// Language names compare exactly as the code host reports them.
fn languages<'a>(repos: impl Iterator<Item = &'a GitHubRepo>) -> BTreeSet<String> {
    repos
        .filter_map(|repo| repo.language.clone())
        .collect()
}

fn topics<'a>(repos: impl Iterator<Item = &'a GitHubRepo>) -> BTreeSet<String> {
    repos.flat_map(|repo| repo.topics.iter().cloned()).collect()
}

fn repo_signals(ctx: &PillarContext<'_>, repos: &[GitHubRepo]) -> Vec<Signal> {
    let (recent, older): (Vec<&GitHubRepo>, Vec<&GitHubRepo>) = repos
        .iter()
        .partition(|repo| ctx.days_since(repo.pushed_at) < RECENT_WINDOW_DAYS);

    let mut signals = Vec::new();

    let older_languages = languages(older.iter().copied());
    let new_languages: Vec<String> = languages(recent.iter().copied())
        .difference(&older_languages)
        .cloned()
        .collect();
    let count = new_languages.len() as f64;
    signals.push(Signal::new(
        "new_languages",
        count,
        ratio_to_ceiling(count, NEW_LANGUAGE_CEILING),
        DataSource::Github,
        if older.is_empty() { 0.4 } else { 0.8 },
        if new_languages.is_empty() {
            "no languages adopted in the last 180 days".to_string()
        } else {
            format!("recently adopted: {}", new_languages.join(", "))
        },
    ));

    let breadth = languages(repos.iter()).len() as f64;
    signals.push(Signal::new(
        "language_diversity",
        breadth,
        ratio_to_ceiling(breadth, BREADTH_CEILING),
        DataSource::Github,
        0.6,
        format!("{breadth} distinct languages across repositories"),
    ));

    let older_topics = topics(older.iter().copied());
    let recent_topics = topics(recent.iter().copied());
    if !older_topics.is_empty() || !recent_topics.is_empty() {
        let expansion = recent_topics.difference(&older_topics).count() as f64;
        signals.push(Signal::new(
            "topic_expansion",
            expansion,
            ratio_to_ceiling(expansion, TOPIC_CEILING),
            DataSource::Github,
            0.5,
            format!("{expansion} topics only present in recent work"),
        ));
    }

    let created = repos
        .iter()
        .filter(|repo| !repo.fork && ctx.within_days(repo.created_at, CREATION_WINDOW_DAYS))
        .count() as f64;
    signals.push(Signal::new(
        "recent_repo_creation",
        created,
        ratio_to_ceiling(created, CREATION_CEILING),
        DataSource::Github,
        0.65,
        format!("{created} original repositories started in the last 90 days"),
    ));

    signals
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    if let Some(repos) = ctx.input.non_empty_repos() {
        return Ok(PillarResult::from_signals(
            PillarName::SkillDiversification,
            repo_signals(ctx, repos),
            DataSource::Github,
            Vec::new(),
        ));
    }

    let from_linkedin = ctx
        .input
        .linkedin_profile
        .as_ref()
        .and_then(|profile| profile.skills.as_deref())
        .filter(|skills| !skills.is_empty());
    let provided = ctx.input.skills.as_deref().filter(|skills| !skills.is_empty());
    let (skills, source) = match (from_linkedin, provided) {
        (Some(skills), _) => (skills, DataSource::Linkedin),
        (None, Some(skills)) => (skills, DataSource::Provided),
        (None, None) => {
            return Ok(PillarResult::no_data(
                PillarName::SkillDiversification,
                DataSource::Github,
                Vec::new(),
            ))
        }
    };

    // Half weight: a skill list says little about recent adoption.
    let count = skills.len() as f64;
    let signal = Signal::new(
        "skill_list_size",
        count,
        ratio_to_ceiling(count, SKILL_LIST_CEILING) * 0.5,
        source,
        0.3,
        format!("{} listed skills", skills.len()),
    );

    Ok(PillarResult::from_signals(
        PillarName::SkillDiversification,
        vec![signal],
        source,
        Vec::new(),
    ))
}
