use candidate_readiness::config::AppConfig;
use candidate_readiness::error::AppError;
use candidate_readiness::readiness::{FetcherSet, ReadinessEngine, ReadinessInput};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine wired with every live fetcher the configuration has credentials for.
pub(crate) fn build_engine(config: &AppConfig, offline: bool) -> Result<ReadinessEngine, AppError> {
    if offline {
        return Ok(ReadinessEngine::offline());
    }
    let fetchers = FetcherSet::from_config(&config.fetchers)?;
    Ok(ReadinessEngine::new(fetchers))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

/// A score file holds either one candidate or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputFile {
    Many(Vec<ReadinessInput>),
    One(Box<ReadinessInput>),
}

pub(crate) fn parse_inputs(raw: &str) -> Result<Vec<ReadinessInput>, AppError> {
    let parsed: InputFile = serde_json::from_str(raw)?;
    Ok(match parsed {
        InputFile::Many(inputs) => inputs,
        InputFile::One(input) => vec![*input],
    })
}

pub(crate) fn load_inputs(path: &Path) -> Result<Vec<ReadinessInput>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_inputs(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let parsed = parse_timestamp("2025-06-01T14:00:00+02:00").expect("valid timestamp");
        let expected = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_bare_dates() {
        let err = parse_timestamp("2025-06-01").expect_err("date only");
        assert!(err.contains("RFC 3339"));
    }

    #[test]
    fn input_files_accept_single_objects_and_lists() {
        let single = parse_inputs(r#"{"candidate_id": "cand-1"}"#).expect("single parses");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].candidate_id.as_str(), "cand-1");

        let many = parse_inputs(r#"[{"candidate_id": "a"}, {"candidate_id": "b"}]"#)
            .expect("list parses");
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].candidate_id.as_str(), "b");
    }

    #[test]
    fn malformed_input_files_are_invalid_input() {
        let err = parse_inputs(r#"{"name": "missing id"}"#).expect_err("id required");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn offline_engine_has_no_fetchers() {
        let config = AppConfig {
            environment: candidate_readiness::config::AppEnvironment::Test,
            server: candidate_readiness::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: candidate_readiness::config::TelemetryConfig {
                log_level: "info".to_string(),
            },
            fetchers: candidate_readiness::config::FetcherConfig::offline(),
        };
        let engine = build_engine(&config, true).expect("offline engine");
        assert!(engine.fetchers().is_empty());
        let engine = build_engine(&config, false).expect("no credentials configured");
        assert!(engine.fetchers().is_empty());
    }
}
