use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Identifier wrapper for the candidate being scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Evidence bundle for one candidate. Every field except the identifier may be
/// absent, and absence is meaningful: `None` means "never collected" while
/// `Some(vec![])` means "collected and empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadinessInput {
    pub candidate_id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_at_company: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_profile: Option<GitHubProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repos: Option<Vec<GitHubRepo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_events: Option<Vec<GitHubEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_profile: Option<LinkedInProfile>,
}

impl ReadinessInput {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: CandidateId(candidate_id.into()),
            ..Self::default()
        }
    }

    /// Declared employer, falling back to the company on the GitHub profile.
    /// A leading `@` (GitHub org mention) is stripped.
    pub fn employer(&self) -> Option<String> {
        self.current_company
            .as_deref()
            .or_else(|| {
                self.github_profile
                    .as_ref()
                    .and_then(|profile| profile.company.as_deref())
            })
            .map(clean_company)
            .filter(|company| !company.is_empty())
    }

    pub fn non_empty_events(&self) -> Option<&[GitHubEvent]> {
        self.github_events
            .as_deref()
            .filter(|events| !events.is_empty())
    }

    pub fn non_empty_repos(&self) -> Option<&[GitHubRepo]> {
        self.github_repos.as_deref().filter(|repos| !repos.is_empty())
    }
}

pub(crate) fn clean_company(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}

/// Public profile as returned by the GitHub users API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    pub pushed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub fork: bool,
}

/// Entry of the public event stream (`WatchEvent`, `ForkEvent`, `PushEvent`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub repo: EventRepo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

impl GitHubEvent {
    pub fn new(kind: &str, created_at: DateTime<Utc>, repo: &str) -> Self {
        Self {
            kind: kind.to_string(),
            created_at,
            repo: EventRepo {
                name: repo.to_string(),
            },
        }
    }

    /// Lower-cased owner segment of `owner/repo`.
    pub fn owner(&self) -> String {
        self.repo
            .name
            .split('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn is_watch_or_fork(&self) -> bool {
        self.kind == "WatchEvent" || self.kind == "ForkEvent"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedInProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<LinkedInExperience>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<LinkedInPost>>,
}

impl LinkedInProfile {
    /// First role flagged current, or lacking an end date.
    pub fn current_role(&self) -> Option<&LinkedInExperience> {
        self.experience
            .as_deref()?
            .iter()
            .find(|role| role.current || role.end_date.is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedInExperience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedInPost {
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub reactions: u32,
}

/// Parse the date shapes scraped profiles use: full dates, year-month, bare
/// years, and RFC 3339 timestamps.
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }
    None
}

fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => {
            let parsed = parse_lenient_date(&raw);
            if parsed.is_none() {
                debug!(raw = %raw, "ignoring unrecognized date");
            }
            Ok(parsed)
        }
    }
}
