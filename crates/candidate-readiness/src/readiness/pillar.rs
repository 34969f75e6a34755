use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CandidateId;
use super::signal::{aggregate_signals, mean_confidence, DataSource, Signal};

/// The seven independently scored readiness dimensions, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarName {
    NetworkIntelligence,
    EngagementDecay,
    SkillDiversification,
    CompanyHealth,
    TenureRisk,
    ProfileOptimization,
    SentimentShift,
}

impl PillarName {
    pub const ALL: [PillarName; 7] = [
        PillarName::NetworkIntelligence,
        PillarName::EngagementDecay,
        PillarName::SkillDiversification,
        PillarName::CompanyHealth,
        PillarName::TenureRisk,
        PillarName::ProfileOptimization,
        PillarName::SentimentShift,
    ];

    /// Share of the overall score this pillar carries when every pillar has
    /// evidence. The seven weights sum to 1.
    pub const fn weight(self) -> f64 {
        match self {
            PillarName::NetworkIntelligence => 0.25,
            PillarName::EngagementDecay => 0.20,
            PillarName::SkillDiversification => 0.15,
            PillarName::CompanyHealth => 0.15,
            PillarName::TenureRisk => 0.10,
            PillarName::ProfileOptimization => 0.10,
            PillarName::SentimentShift => 0.05,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PillarName::NetworkIntelligence => "network_intelligence",
            PillarName::EngagementDecay => "engagement_decay",
            PillarName::SkillDiversification => "skill_diversification",
            PillarName::CompanyHealth => "company_health",
            PillarName::TenureRisk => "tenure_risk",
            PillarName::ProfileOptimization => "profile_optimization",
            PillarName::SentimentShift => "sentiment_shift",
        }
    }
}

/// Outcome of one pillar computator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarResult {
    pub pillar: PillarName,
    /// `None` exactly when `signals` is empty.
    pub score: Option<u8>,
    pub confidence: f64,
    pub signals: Vec<Signal>,
    pub primary_source: DataSource,
    pub fallbacks_used: Vec<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PillarResult {
    pub fn from_signals(
        pillar: PillarName,
        signals: Vec<Signal>,
        primary_source: DataSource,
        fallbacks_used: Vec<DataSource>,
    ) -> Self {
        let score = aggregate_signals(&signals);
        if score.is_none() {
            return Self::no_data(pillar, primary_source, fallbacks_used);
        }
        Self {
            pillar,
            score,
            confidence: mean_confidence(&signals),
            signals,
            primary_source,
            fallbacks_used,
            error: None,
        }
    }

    pub fn no_data(
        pillar: PillarName,
        primary_source: DataSource,
        fallbacks_used: Vec<DataSource>,
    ) -> Self {
        Self {
            pillar,
            score: None,
            confidence: 0.0,
            signals: Vec::new(),
            primary_source,
            fallbacks_used,
            error: None,
        }
    }

    pub fn failed(pillar: PillarName, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::no_data(pillar, DataSource::Github, Vec::new())
        }
    }

    pub fn has_score(&self) -> bool {
        self.score.is_some()
    }

    /// True when every piece of evidence came from the code-hosting profile.
    pub fn is_github_only(&self) -> bool {
        self.primary_source == DataSource::Github
            && self
                .signals
                .iter()
                .all(|signal| signal.source == DataSource::Github)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.name == name)
    }
}

/// Categorical reading of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessLevel {
    Cold,
    Warming,
    Warm,
    Hot,
}

impl ReadinessLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            75..=u8::MAX => ReadinessLevel::Hot,
            50..=74 => ReadinessLevel::Warm,
            25..=49 => ReadinessLevel::Warming,
            _ => ReadinessLevel::Cold,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ReadinessLevel::Hot => "Hot - Likely receptive now",
            ReadinessLevel::Warm => "Warm - Some positive signals",
            ReadinessLevel::Warming => "Warming - Early indicators",
            ReadinessLevel::Cold => "Cold - No strong signals",
        }
    }
}

/// Final engine output. `pillars` always holds all seven entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessScore {
    pub overall: u8,
    pub confidence: f64,
    pub level: ReadinessLevel,
    pub pillars: BTreeMap<PillarName, PillarResult>,
    pub computed_at: DateTime<Utc>,
    pub candidate_id: CandidateId,
    pub data_sources_summary: Vec<DataSource>,
}

impl ReadinessScore {
    pub fn pillar(&self, name: PillarName) -> Option<&PillarResult> {
        self.pillars.get(&name)
    }

    pub fn scored_pillars(&self) -> impl Iterator<Item = &PillarResult> {
        self.pillars.values().filter(|result| result.has_score())
    }
}
