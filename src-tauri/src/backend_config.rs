use std::{env, time::Duration};

use url::Url;

use crate::{
    BACKEND_TIMEOUT_ENV, BACKEND_TIMEOUT_MAX_MS, BACKEND_TIMEOUT_MIN_MS,
    DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_READY_POLL_INTERVAL_MS, DEFAULT_READY_PROBE_TIMEOUT_MS,
    READY_POLL_INTERVAL_ENV, READY_POLL_INTERVAL_MAX_MS, READY_POLL_INTERVAL_MIN_MS,
    READY_PROBE_TIMEOUT_ENV, READY_PROBE_TIMEOUT_MAX_MS, READY_PROBE_TIMEOUT_MIN_MS,
};

/// Normalizes the configured backend address. Readiness probes speak plain
/// HTTP only, so anything other than an `http` URL falls back to the default.
pub(crate) fn normalize_backend_url(raw: &str, default_backend_url: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default_backend_url.to_string();
    }

    match Url::parse(trimmed) {
        Ok(mut parsed) if parsed.scheme() == "http" => {
            if parsed.path().is_empty() {
                parsed.set_path("/");
            }
            parsed.to_string()
        }
        _ => default_backend_url.to_string(),
    }
}

pub(crate) fn parse_clamped_ms(raw: Option<&str>, default_ms: u64, min_ms: u64, max_ms: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(|value| value.clamp(min_ms, max_ms))
        .unwrap_or(default_ms)
}

fn env_clamped_ms(env_key: &str, default_ms: u64, min_ms: u64, max_ms: u64) -> Duration {
    let raw = env::var(env_key).ok();
    Duration::from_millis(parse_clamped_ms(raw.as_deref(), default_ms, min_ms, max_ms))
}

/// Timing of one readiness polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadinessSettings {
    pub(crate) poll_interval: Duration,
    pub(crate) probe_timeout: Duration,
    pub(crate) overall_timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_READY_POLL_INTERVAL_MS),
            probe_timeout: Duration::from_millis(DEFAULT_READY_PROBE_TIMEOUT_MS),
            overall_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
        }
    }
}

impl ReadinessSettings {
    pub(crate) fn from_env() -> Self {
        Self {
            poll_interval: env_clamped_ms(
                READY_POLL_INTERVAL_ENV,
                DEFAULT_READY_POLL_INTERVAL_MS,
                READY_POLL_INTERVAL_MIN_MS,
                READY_POLL_INTERVAL_MAX_MS,
            ),
            probe_timeout: env_clamped_ms(
                READY_PROBE_TIMEOUT_ENV,
                DEFAULT_READY_PROBE_TIMEOUT_MS,
                READY_PROBE_TIMEOUT_MIN_MS,
                READY_PROBE_TIMEOUT_MAX_MS,
            ),
            overall_timeout: env_clamped_ms(
                BACKEND_TIMEOUT_ENV,
                DEFAULT_BACKEND_TIMEOUT_MS,
                BACKEND_TIMEOUT_MIN_MS,
                BACKEND_TIMEOUT_MAX_MS,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_URL: &str = "http://127.0.0.1:5000/";

    #[test]
    fn normalize_backend_url_adds_trailing_slash() {
        assert_eq!(
            normalize_backend_url("http://localhost:5000", DEFAULT_URL),
            "http://localhost:5000/"
        );
    }

    #[test]
    fn normalize_backend_url_falls_back_for_blank_or_invalid_input() {
        assert_eq!(normalize_backend_url("   ", DEFAULT_URL), DEFAULT_URL);
        assert_eq!(normalize_backend_url("not a url", DEFAULT_URL), DEFAULT_URL);
        assert_eq!(
            normalize_backend_url("file:///tmp/index.html", DEFAULT_URL),
            DEFAULT_URL
        );
    }

    #[test]
    fn normalize_backend_url_falls_back_for_https_so_probes_can_reach_it() {
        let normalized = normalize_backend_url("https://127.0.0.1:5443", DEFAULT_URL);
        assert_eq!(normalized, DEFAULT_URL);

        let url = Url::parse(&normalized).expect("parse");
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn parse_clamped_ms_clamps_and_defaults() {
        assert_eq!(parse_clamped_ms(Some("250"), 100, 50, 1_000), 250);
        assert_eq!(parse_clamped_ms(Some("5"), 100, 50, 1_000), 50);
        assert_eq!(parse_clamped_ms(Some("99999"), 100, 50, 1_000), 1_000);
        assert_eq!(parse_clamped_ms(Some("fast"), 100, 50, 1_000), 100);
        assert_eq!(parse_clamped_ms(None, 100, 50, 1_000), 100);
    }

    #[test]
    fn readiness_settings_default_matches_polling_contract() {
        let settings = ReadinessSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.probe_timeout, Duration::from_secs(1));
        assert_eq!(settings.overall_timeout, Duration::from_secs(30));
    }
}
