//! Candidate readiness scoring.
//!
//! An input bundle fans out to seven independent pillar computators, each of
//! which turns whatever evidence it finds into confidence-tagged signals. The
//! engine then folds the pillar scores into one overall score, spreading the
//! weight of evidence-free pillars across the rest.

pub mod domain;
pub mod engine;
pub mod fetchers;
pub mod pillar;
pub mod pillars;
pub mod router;
pub mod signal;

#[cfg(test)]
mod tests;

pub use domain::{
    CandidateId, EventRepo, GitHubEvent, GitHubProfile, GitHubRepo, LinkedInExperience,
    LinkedInPost, LinkedInProfile, ReadinessInput,
};
pub use engine::{aggregate_pillars, staleness_factor, ReadinessEngine};
pub use fetchers::{
    BrightDataClient, FetchError, FetchResult, FetcherSet, LayoffLookup, LayoffReport,
    LinkedInLookup, NewsArticle, NewsLookup, OpenRouterSentiment, SentimentAnalyzer,
    TextSentiment,
};
pub use pillar::{PillarName, PillarResult, ReadinessLevel, ReadinessScore};
pub use pillars::{tenure_bell_curve, PillarContext, PillarError};
pub use router::readiness_router;
pub use signal::{aggregate_signals, mean_confidence, ratio_to_ceiling, DataSource, Signal};
