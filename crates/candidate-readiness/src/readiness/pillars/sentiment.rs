use tracing::{debug, warn};

use super::{keyword_hits, PillarContext, PillarError};
use crate::readiness::domain::LinkedInPost;
use crate::readiness::fetchers::TextSentiment;
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{clamp_score, DataSource, Signal};

const NEGATIVE_KEYWORDS: &[&str] = &[
    "frustrated",
    "burnout",
    "burned out",
    "tired of",
    "done with",
    "leaving",
    "moving on",
    "next chapter",
    "new beginnings",
    "time for a change",
    "exploring options",
    "open to",
];

const POSITIVE_KEYWORDS: &[&str] = &[
    "excited about",
    "love my",
    "grateful",
    "amazing team",
    "great company",
    "proud to",
    "thrilled",
];

const LLM_CONFIDENCE_DISCOUNT: f64 = 0.8;
const TREND_THRESHOLD: f64 = 0.3;

fn llm_signal(results: &[TextSentiment]) -> Signal {
    let count = results.len() as f64;
    let average = results.iter().map(|r| r.sentiment).sum::<f64>() / count;
    let confidence = results.iter().map(|r| r.confidence).sum::<f64>() / count;
    Signal::new(
        "llm_sentiment",
        average,
        clamp_score((1.0 - average) * 100.0).round(),
        DataSource::LlmInference,
        confidence * LLM_CONFIDENCE_DISCOUNT,
        format!("average sentiment {average:.2} across {} texts", results.len()),
    )
}

/// Each distinct phrase counts once across every text.
fn keyword_signal(texts: &[String], source: DataSource) -> Signal {
    let combined = texts.join(" ");
    let negative = keyword_hits(&combined, NEGATIVE_KEYWORDS).len();
    let positive = keyword_hits(&combined, POSITIVE_KEYWORDS).len();
    let net = negative as f64 - positive as f64;
    Signal::new(
        "keyword_sentiment",
        net,
        clamp_score(50.0 + net * 25.0),
        source,
        0.4,
        format!("{negative} negative vs {positive} positive phrases"),
    )
}

/// Compares mean reactions of the newer half of posts against the older half.
pub(crate) fn engagement_trend(posts: &[LinkedInPost]) -> Option<Signal> {
    if posts.len() < 2 {
        return None;
    }
    let mut ordered: Vec<&LinkedInPost> = posts.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    let split = posts.len().div_ceil(2);
    let (recent, older) = ordered.split_at(split);
    let mean = |half: &[&LinkedInPost]| {
        half.iter().map(|post| f64::from(post.reactions)).sum::<f64>() / half.len() as f64
    };
    let older_mean = mean(older);
    if older.is_empty() || older_mean == 0.0 {
        return None;
    }
    let change = (mean(recent) - older_mean) / older_mean;

    let (score, label) = if change <= -TREND_THRESHOLD {
        (60.0, "dropping")
    } else if change >= TREND_THRESHOLD {
        (20.0, "rising")
    } else {
        (40.0, "steady")
    };

    Some(Signal::new(
        "post_engagement_trend",
        change,
        score,
        DataSource::Linkedin,
        0.5,
        format!("post engagement {label} ({:+.0}%)", change * 100.0),
    ))
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let input = ctx.input;
    let posts = input
        .linkedin_profile
        .as_ref()
        .and_then(|profile| profile.posts.as_deref())
        .unwrap_or_default();

    let mut texts: Vec<String> = posts
        .iter()
        .map(|post| post.text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect();
    let posts_contributed = !texts.is_empty();
    if let Some(bio) = input
        .github_profile
        .as_ref()
        .and_then(|profile| profile.bio.as_deref())
        .map(str::trim)
        .filter(|bio| !bio.is_empty())
    {
        texts.push(bio.to_string());
    }

    if texts.is_empty() && input.non_empty_events().is_none() {
        return Ok(PillarResult::no_data(
            PillarName::SentimentShift,
            DataSource::Github,
            Vec::new(),
        ));
    }

    let mut signals = Vec::new();
    let mut fallbacks = Vec::new();
    let mut llm_fired = false;

    if !texts.is_empty() {
        if let Some(analyzer) = &ctx.fetchers.sentiment {
            match analyzer.analyze_sentiment(&texts).await {
                Ok(Some(results)) if !results.is_empty() => {
                    signals.push(llm_signal(&results));
                    llm_fired = true;
                }
                Ok(_) => debug!("sentiment analyzer returned no results"),
                Err(err) => {
                    warn!(error = %err, "sentiment analysis failed, using keyword fallback");
                    fallbacks.push(DataSource::LlmInference);
                }
            }
        }

        if !llm_fired {
            let source = if posts_contributed {
                DataSource::Linkedin
            } else {
                DataSource::Github
            };
            signals.push(keyword_signal(&texts, source));
        }
    }

    if let Some(trend) = engagement_trend(posts) {
        signals.push(trend);
    }

    let primary = if llm_fired {
        DataSource::LlmInference
    } else {
        signals
            .first()
            .map(|signal| signal.source)
            .unwrap_or(DataSource::Github)
    };

    Ok(PillarResult::from_signals(
        PillarName::SentimentShift,
        signals,
        primary,
        fallbacks,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(day: u32, reactions: u32) -> LinkedInPost {
        LinkedInPost {
            text: format!("post {day}"),
            date: Utc
                .with_ymd_and_hms(2025, 1, day, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            reactions,
        }
    }

    #[test]
    fn trend_detects_drop_rise_and_steady() {
        let dropping = engagement_trend(&[post(1, 100), post(2, 90), post(20, 10), post(21, 5)])
            .expect("trend computed");
        assert_eq!(dropping.normalized_value, 60.0);

        let rising = engagement_trend(&[post(1, 10), post(20, 50)]).expect("trend computed");
        assert_eq!(rising.normalized_value, 20.0);

        let steady = engagement_trend(&[post(1, 40), post(20, 44)]).expect("trend computed");
        assert_eq!(steady.normalized_value, 40.0);
    }

    #[test]
    fn trend_needs_two_posts_and_older_engagement() {
        assert!(engagement_trend(&[post(3, 10)]).is_none());
        assert!(engagement_trend(&[post(1, 0), post(20, 30)]).is_none());
    }

    #[test]
    fn keyword_sentiment_nets_negative_against_positive() {
        let texts = vec![
            "Burnout is real, time for a change".to_string(),
            "Grateful for the team".to_string(),
        ];
        let signal = keyword_signal(&texts, DataSource::Linkedin);
        assert_eq!(signal.value, 1.0);
        assert_eq!(signal.normalized_value, 75.0);
    }

    #[test]
    fn repeated_phrases_count_once_across_posts() {
        let texts = vec![
            "Open to conversations".to_string(),
            "Still open to new roles".to_string(),
            "open to relocation".to_string(),
        ];
        let signal = keyword_signal(&texts, DataSource::Linkedin);
        assert_eq!(signal.value, 1.0);
        assert_eq!(signal.normalized_value, 75.0);
    }
}
