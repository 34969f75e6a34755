use std::sync::OnceLock;

use regex::Regex;

use super::{keyword_hits, PillarContext, PillarError};
use crate::readiness::domain::{clean_company, GitHubProfile, GitHubRepo, ReadinessInput};
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{DataSource, Signal};

const SEEKING_KEYWORDS: &[&str] = &[
    "open to work",
    "looking for",
    "seeking",
    "available for",
    "open for opportunities",
    "job hunting",
    "on the market",
    "freelance",
    "for hire",
    "looking for opportunities",
    "actively looking",
    "open to new",
];

fn website_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\.github\.io$|portfolio|personal.*site|blog|resume|cv$|website)")
            .expect("website pattern compiles")
    })
}

fn stepped(days: f64, steps: &[(f64, f64)], floor: f64) -> f64 {
    steps
        .iter()
        .find(|(limit, _)| days < *limit)
        .map(|(_, score)| *score)
        .unwrap_or(floor)
}

fn normalize_employer(raw: &str) -> String {
    clean_company(raw)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn username(input: &ReadinessInput) -> Option<&str> {
    input
        .github_username
        .as_deref()
        .or_else(|| input.github_profile.as_ref().map(|p| p.login.as_str()))
        .filter(|name| !name.is_empty())
}

/// `None` when the profile carries no bio text to read.
fn bio_signal(profile: &GitHubProfile) -> Option<Signal> {
    let bio = profile.bio.as_deref().filter(|bio| !bio.trim().is_empty())?;
    let hits = keyword_hits(bio, SEEKING_KEYWORDS);
    let detail = if hits.is_empty() {
        "no job-seeking language in bio".to_string()
    } else {
        format!("bio mentions {}", hits.join(", "))
    };
    Some(Signal::new(
        "seeking_keywords",
        hits.len() as f64,
        (hits.len() as f64 * 50.0).min(100.0),
        DataSource::Github,
        if hits.is_empty() { 0.3 } else { 0.9 },
        detail,
    ))
}

fn completeness_signal(profile: &GitHubProfile, location: Option<&str>) -> Signal {
    let filled = [
        profile.bio.as_deref().is_some_and(|bio| !bio.trim().is_empty()),
        profile
            .company
            .as_deref()
            .is_some_and(|company| !company.trim().is_empty()),
        location.is_some_and(|location| !location.trim().is_empty()),
        profile.public_repos > 0,
    ];
    let filled = filled.iter().filter(|present| **present).count();
    Signal::new(
        "profile_completeness",
        filled as f64,
        filled as f64 / 4.0 * 60.0,
        DataSource::Github,
        0.4,
        format!("{filled}/4 profile fields populated"),
    )
}

fn repo_signals(ctx: &PillarContext<'_>, repos: &[GitHubRepo], signals: &mut Vec<Signal>) {
    if let Some(login) = username(ctx.input) {
        if let Some(readme) = repos
            .iter()
            .find(|repo| repo.name.eq_ignore_ascii_case(login))
        {
            let days = ctx.days_since(readme.pushed_at);
            let score = stepped(days, &[(7.0, 100.0), (30.0, 70.0), (90.0, 30.0)], 5.0);
            signals.push(Signal::new(
                "readme_freshness",
                days,
                score,
                DataSource::Github,
                0.8,
                format!("profile README last edited {days:.0} days ago"),
            ));
        }
    }

    let latest_site = repos
        .iter()
        .filter(|repo| website_pattern().is_match(&repo.name))
        .max_by_key(|repo| repo.pushed_at);
    if let Some(site) = latest_site {
        let days = ctx.days_since(site.pushed_at);
        let score = stepped(days, &[(14.0, 90.0), (60.0, 50.0), (180.0, 20.0)], 5.0);
        signals.push(Signal::new(
            "website_activity",
            days,
            score,
            DataSource::Github,
            0.7,
            format!("{} last pushed {days:.0} days ago", site.name),
        ));
    }
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let input = ctx.input;
    if input.github_profile.is_none()
        && input.non_empty_repos().is_none()
        && input.linkedin_profile.is_none()
    {
        return Ok(PillarResult::no_data(
            PillarName::ProfileOptimization,
            DataSource::Github,
            Vec::new(),
        ));
    }

    let mut signals = Vec::new();

    if let Some(signal) = input.github_profile.as_ref().and_then(bio_signal) {
        signals.push(signal);
    }

    if let Some(repos) = input.non_empty_repos() {
        repo_signals(ctx, repos, &mut signals);
    }

    if let Some(profile) = &input.github_profile {
        signals.push(completeness_signal(profile, input.location.as_deref()));

        if let Some(updated_at) = profile.updated_at {
            let days = ctx.days_since(updated_at);
            let score = stepped(
                days,
                &[(7.0, 75.0), (30.0, 60.0), (90.0, 45.0), (180.0, 25.0)],
                10.0,
            );
            signals.push(Signal::new(
                "profile_staleness",
                days,
                score,
                DataSource::Github,
                0.25,
                format!("profile updated {days:.0} days ago"),
            ));
        }
    }

    if let Some(linkedin) = &input.linkedin_profile {
        let github_company = input
            .github_profile
            .as_ref()
            .and_then(|profile| profile.company.as_deref())
            .map(normalize_employer)
            .filter(|company| !company.is_empty());
        let linkedin_company = linkedin
            .current_role()
            .map(|role| normalize_employer(&role.company))
            .filter(|company| !company.is_empty());

        if let (Some(github), Some(current)) = (github_company, linkedin_company) {
            if !github.contains(&current) && !current.contains(&github) {
                signals.push(Signal::new(
                    "employer_mismatch",
                    1.0,
                    90.0,
                    DataSource::Linkedin,
                    0.85,
                    format!("GitHub lists {github} while LinkedIn lists {current}"),
                ));
            }
        }

        if let Some(headline) = linkedin.headline.as_deref() {
            let hits = keyword_hits(headline, SEEKING_KEYWORDS);
            if !hits.is_empty() {
                signals.push(Signal::new(
                    "headline_keywords",
                    hits.len() as f64,
                    (hits.len() as f64 * 60.0).min(100.0),
                    DataSource::Linkedin,
                    0.95,
                    format!("headline mentions {}", hits.join(", ")),
                ));
            }
        }
    }

    let primary = if signals
        .iter()
        .any(|signal| signal.source == DataSource::Linkedin)
    {
        DataSource::Linkedin
    } else {
        DataSource::Github
    };

    Ok(PillarResult::from_signals(
        PillarName::ProfileOptimization,
        signals,
        primary,
        Vec::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_pattern_matches_personal_sites() {
        for name in ["octo.github.io", "Portfolio-2024", "my-personal-site", "blog", "resume", "octocv"] {
            assert!(website_pattern().is_match(name), "{name} should match");
        }
        assert!(!website_pattern().is_match("tokio"));
        assert!(!website_pattern().is_match("cvxpy"));
    }

    #[test]
    fn employer_normalization_ignores_punctuation_and_case() {
        assert_eq!(normalize_employer("@Acme-Corp "), "acmecorp");
        assert_eq!(normalize_employer("ACME corp."), "acmecorp");
    }

    #[test]
    fn stepped_picks_first_threshold() {
        let steps = [(7.0, 100.0), (30.0, 70.0), (90.0, 30.0)];
        assert_eq!(stepped(3.0, &steps, 5.0), 100.0);
        assert_eq!(stepped(45.0, &steps, 5.0), 30.0);
        assert_eq!(stepped(400.0, &steps, 5.0), 5.0);
    }
}
