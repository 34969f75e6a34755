//! The seven pillar computators.
//!
//! Every computator is a read-only function of a [`PillarContext`]: the input
//! bundle, the optional fetchers and a fixed evaluation instant. Time
//! arithmetic goes through [`PillarContext::days_since`] so a run is fully
//! determined by its arguments.

pub(crate) mod company;
pub(crate) mod engagement;
pub(crate) mod network;
pub(crate) mod profile;
pub(crate) mod sentiment;
pub(crate) mod skills;
pub(crate) mod tenure;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::ReadinessInput;
use super::fetchers::FetcherSet;
use super::pillar::{PillarName, PillarResult};

pub use tenure::tenure_bell_curve;

const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, thiserror::Error)]
pub enum PillarError {
    #[error("invalid input field {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

/// Everything a computator may read.
#[derive(Debug, Clone, Copy)]
pub struct PillarContext<'a> {
    pub input: &'a ReadinessInput,
    pub fetchers: &'a FetcherSet,
    pub now: DateTime<Utc>,
}

impl<'a> PillarContext<'a> {
    pub fn new(input: &'a ReadinessInput, fetchers: &'a FetcherSet, now: DateTime<Utc>) -> Self {
        Self {
            input,
            fetchers,
            now,
        }
    }

    /// Fractional days elapsed between `at` and the evaluation instant.
    /// Future timestamps yield negative values.
    pub fn days_since(&self, at: DateTime<Utc>) -> f64 {
        (self.now - at).num_seconds() as f64 / SECONDS_PER_DAY
    }

    pub fn days_since_date(&self, date: NaiveDate) -> f64 {
        (self.now.date_naive() - date).num_days() as f64
    }

    pub fn within_days(&self, at: DateTime<Utc>, days: f64) -> bool {
        let age = self.days_since(at);
        (0.0..days).contains(&age)
    }
}

/// Route a pillar name to its computator.
pub async fn compute(
    pillar: PillarName,
    ctx: &PillarContext<'_>,
) -> Result<PillarResult, PillarError> {
    match pillar {
        PillarName::NetworkIntelligence => network::compute(ctx).await,
        PillarName::EngagementDecay => engagement::compute(ctx).await,
        PillarName::SkillDiversification => skills::compute(ctx).await,
        PillarName::CompanyHealth => company::compute(ctx).await,
        PillarName::TenureRisk => tenure::compute(ctx).await,
        PillarName::ProfileOptimization => profile::compute(ctx).await,
        PillarName::SentimentShift => sentiment::compute(ctx).await,
    }
}

/// Case-insensitive substring hits of `keywords` inside `text`.
pub(crate) fn keyword_hits<'k>(text: &str, keywords: &[&'k str]) -> Vec<&'k str> {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .collect()
}
