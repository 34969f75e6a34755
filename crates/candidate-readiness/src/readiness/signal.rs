use serde::{Deserialize, Serialize};

/// Provenance tag attached to every signal and pillar result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Github,
    Linkedin,
    LayoffsFyi,
    NewsApi,
    LlmInference,
    /// Fields supplied directly by the host, e.g. `years_at_company`.
    Provided,
}

impl DataSource {
    pub const fn label(self) -> &'static str {
        match self {
            DataSource::Github => "github",
            DataSource::Linkedin => "linkedin",
            DataSource::LayoffsFyi => "layoffs_fyi",
            DataSource::NewsApi => "news_api",
            DataSource::LlmInference => "llm_inference",
            DataSource::Provided => "provided",
        }
    }
}

/// Atomic, normalized measurement feeding a pillar score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    /// Raw measurement in its natural units (ratio, count, days, ...).
    pub value: f64,
    /// Always within `[0, 100]`.
    pub normalized_value: f64,
    pub source: DataSource,
    /// Trust in this particular measurement, within `[0, 1]`.
    pub confidence: f64,
    pub detail: String,
}

impl Signal {
    pub fn new(
        name: &str,
        value: f64,
        normalized_value: f64,
        source: DataSource,
        confidence: f64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            value,
            normalized_value: clamp_score(normalized_value),
            source,
            confidence: clamp_unit(confidence),
            detail: detail.into(),
        }
    }

    pub(crate) fn scale_confidence(&mut self, factor: f64) {
        self.confidence = clamp_unit(self.confidence * factor);
    }
}

/// Linear normalization of `count` against `ceiling` onto `[0, 100]`.
pub fn ratio_to_ceiling(count: f64, ceiling: f64) -> f64 {
    if ceiling <= 0.0 {
        return 0.0;
    }
    clamp_score(count / ceiling * 100.0)
}

pub(crate) fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Confidence-weighted mean of normalized values, rounded onto `0..=100`.
///
/// Returns `None` for an empty list: no evidence is not the same as a zero.
pub fn aggregate_signals(signals: &[Signal]) -> Option<u8> {
    let weight: f64 = signals.iter().map(|signal| signal.confidence).sum();
    if signals.is_empty() || weight <= 0.0 {
        return None;
    }
    let weighted: f64 = signals
        .iter()
        .map(|signal| signal.normalized_value * signal.confidence)
        .sum();
    Some(clamp_score(weighted / weight).round() as u8)
}

/// Unweighted mean of signal confidences; 0 for an empty list.
pub fn mean_confidence(signals: &[Signal]) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }
    let total: f64 = signals.iter().map(|signal| signal.confidence).sum();
    clamp_unit(total / signals.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(normalized: f64, confidence: f64) -> Signal {
        Signal::new("probe", normalized, normalized, DataSource::Github, confidence, "")
    }

    #[test]
    fn constructor_clamps_extreme_values() {
        let high = Signal::new("ratio", 5000.0, 5000.0, DataSource::Github, 3.0, "");
        assert_eq!(high.normalized_value, 100.0);
        assert_eq!(high.confidence, 1.0);
        assert_eq!(high.value, 5000.0);

        let low = Signal::new("ratio", -4.0, -4.0, DataSource::Github, -0.5, "");
        assert_eq!(low.normalized_value, 0.0);
        assert_eq!(low.confidence, 0.0);

        let nan = Signal::new("ratio", f64::NAN, f64::NAN, DataSource::Github, 0.5, "");
        assert_eq!(nan.normalized_value, 0.0);
    }

    #[test]
    fn aggregate_is_confidence_weighted() {
        let signals = vec![signal(100.0, 0.9), signal(0.0, 0.3)];
        // (100 * 0.9) / 1.2 = 75
        assert_eq!(aggregate_signals(&signals), Some(75));
        assert!((mean_confidence(&signals) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn empty_signal_list_has_no_score() {
        assert_eq!(aggregate_signals(&[]), None);
        assert_eq!(mean_confidence(&[]), 0.0);
    }

    #[test]
    fn zero_is_a_real_score() {
        assert_eq!(aggregate_signals(&[signal(0.0, 0.5)]), Some(0));
    }

    #[test]
    fn ratio_to_ceiling_saturates() {
        assert_eq!(ratio_to_ceiling(5.0, 10.0), 50.0);
        assert_eq!(ratio_to_ceiling(40.0, 10.0), 100.0);
        assert_eq!(ratio_to_ceiling(3.0, 0.0), 0.0);
    }
}
