use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, debug_span, info, info_span, warn, Instrument};

use super::domain::{CandidateId, ReadinessInput};
use super::fetchers::FetcherSet;
use super::pillar::{PillarName, PillarResult, ReadinessLevel, ReadinessScore};
use super::pillars::{self, PillarContext};
use super::signal::{clamp_score, clamp_unit, DataSource};

/// Orchestrates the seven pillar computators and reduces their results.
#[derive(Debug, Clone, Default)]
pub struct ReadinessEngine {
    fetchers: FetcherSet,
}

impl ReadinessEngine {
    pub fn new(fetchers: FetcherSet) -> Self {
        Self { fetchers }
    }

    /// Engine that only uses evidence carried on the input.
    pub fn offline() -> Self {
        Self::new(FetcherSet::none())
    }

    pub fn fetchers(&self) -> &FetcherSet {
        &self.fetchers
    }

    /// Score against the current wall-clock time.
    pub async fn score(&self, input: ReadinessInput) -> ReadinessScore {
        self.score_at(input, Utc::now()).await
    }

    /// Score with every age computed relative to `now`.
    pub async fn score_at(&self, input: ReadinessInput, now: DateTime<Utc>) -> ReadinessScore {
        let span = info_span!("readiness_score", candidate_id = %input.candidate_id.as_str());
        async move {
            let started = Instant::now();
            let input = Arc::new(self.enrich(input).await);
            let mut pillars = self.run_pillars(Arc::clone(&input), now).await;

            let factor = staleness_factor(&input, now);
            if factor < 1.0 {
                debug!(factor, "discounting GitHub-only pillars for stale profile data");
                apply_staleness(&mut pillars, factor);
            }

            let score = aggregate_pillars(input.candidate_id.clone(), pillars, now);
            info!(
                overall = score.overall,
                confidence = score.confidence,
                level = ?score.level,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "readiness scored"
            );
            score
        }
        .instrument(span)
        .await
    }

    /// Pull the LinkedIn profile when only its URL was supplied.
    async fn enrich(&self, mut input: ReadinessInput) -> ReadinessInput {
        if input.linkedin_profile.is_some() {
            return input;
        }
        let (Some(url), Some(lookup)) = (input.linkedin_url.as_deref(), &self.fetchers.linkedin)
        else {
            return input;
        };

        match lookup.fetch_linkedin_profile(url).await {
            Ok(Some(profile)) => {
                debug!("merged fetched LinkedIn profile");
                input.linkedin_profile = Some(profile);
            }
            Ok(None) => debug!("LinkedIn lookup returned no profile"),
            Err(err) => warn!(error = %err, "LinkedIn lookup failed, continuing without it"),
        }
        input
    }

    async fn run_pillars(
        &self,
        input: Arc<ReadinessInput>,
        now: DateTime<Utc>,
    ) -> BTreeMap<PillarName, PillarResult> {
        let mut tasks = JoinSet::new();
        for pillar in PillarName::ALL {
            let input = Arc::clone(&input);
            let fetchers = self.fetchers.clone();
            let span = debug_span!("pillar", pillar = pillar.label());
            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let ctx = PillarContext::new(&input, &fetchers, now);
                    let outcome = pillars::compute(pillar, &ctx).await;
                    (pillar, outcome, started.elapsed())
                }
                .instrument(span),
            );
        }

        let mut results = BTreeMap::new();
        let mut aborted = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((pillar, Ok(result), elapsed)) => {
                    debug!(
                        pillar = pillar.label(),
                        score = ?result.score,
                        confidence = result.confidence,
                        elapsed_us = elapsed.as_micros() as u64,
                        "pillar computed"
                    );
                    results.insert(pillar, result);
                }
                Ok((pillar, Err(err), _)) => {
                    warn!(pillar = pillar.label(), error = %err, "pillar computation failed");
                    results.insert(pillar, PillarResult::failed(pillar, err.to_string()));
                }
                Err(err) => {
                    warn!(error = %err, "pillar task did not complete");
                    aborted.push(err.to_string());
                }
            }
        }

        // A task that panicked never reported its pillar; every missing key is one of those.
        let message = if aborted.is_empty() {
            "pillar task did not complete".to_string()
        } else {
            aborted.join("; ")
        };
        for pillar in PillarName::ALL {
            results
                .entry(pillar)
                .or_insert_with(|| PillarResult::failed(pillar, message.clone()));
        }
        results
    }
}

/// Multiplier for GitHub-only evidence when the profile has not been touched
/// in a while. LinkedIn data, when present, disables the discount.
pub fn staleness_factor(input: &ReadinessInput, now: DateTime<Utc>) -> f64 {
    if input.linkedin_profile.is_some() {
        return 1.0;
    }
    let Some(updated_at) = input
        .github_profile
        .as_ref()
        .and_then(|profile| profile.updated_at)
    else {
        return 1.0;
    };

    let days = (now - updated_at).num_days();
    match days {
        i64::MIN..=29 => 1.0,
        30..=89 => 0.9,
        90..=179 => 0.7,
        180..=364 => 0.5,
        _ => 0.3,
    }
}

fn apply_staleness(pillars: &mut BTreeMap<PillarName, PillarResult>, factor: f64) {
    for result in pillars.values_mut() {
        if !result.has_score() || !result.is_github_only() {
            continue;
        }
        result.confidence = clamp_unit(result.confidence * factor);
        for signal in &mut result.signals {
            signal.scale_confidence(factor);
        }
    }
}

/// Reduce pillar results into the final score.
///
/// Pillars without a score drop out and their weight is spread across the
/// remaining pillars in proportion to each one's own weight. With no scored
/// pillar at all the result is `0` / `0.0` / cold.
pub fn aggregate_pillars(
    candidate_id: CandidateId,
    pillars: BTreeMap<PillarName, PillarResult>,
    computed_at: DateTime<Utc>,
) -> ReadinessScore {
    let active_weight: f64 = pillars
        .values()
        .filter(|result| result.has_score())
        .map(|result| result.pillar.weight())
        .sum();

    let (overall, confidence) = if active_weight > 0.0 {
        pillars
            .values()
            .filter_map(|result| result.score.map(|score| (result, score)))
            .fold((0.0, 0.0), |(overall, confidence), (result, score)| {
                let share = result.pillar.weight() / active_weight;
                (
                    overall + f64::from(score) * share,
                    confidence + result.confidence * share,
                )
            })
    } else {
        (0.0, 0.0)
    };
    let overall = clamp_score(overall).round() as u8;

    let mut data_sources_summary: Vec<DataSource> = Vec::new();
    for result in pillars.values() {
        let primary = result.has_score().then_some(result.primary_source);
        for source in primary.into_iter().chain(result.fallbacks_used.iter().copied()) {
            if !data_sources_summary.contains(&source) {
                data_sources_summary.push(source);
            }
        }
    }

    ReadinessScore {
        overall,
        confidence: clamp_unit(confidence),
        level: ReadinessLevel::from_score(overall),
        pillars,
        computed_at,
        candidate_id,
        data_sources_summary,
    }
}
