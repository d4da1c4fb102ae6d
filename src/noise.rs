//! Analytics/telemetry noise classification (spec §4.2).

use crate::config::NoiseConfig;
use serde_json::Value;

/// Everything [`NoiseFilter::score`] needs about one exchange, pulled out of
/// the richer [`crate::types::Exchange`] so the scorer stays a pure function
/// over plain data (spec §4.2 input shape).
pub struct NoiseInput<'a> {
    /// Request host, lowercased.
    pub host: &'a str,
    /// Full request path (no query string).
    pub path: &'a str,
    /// HTTP method, uppercase.
    pub method: &'a str,
    /// Declared request `Content-Type`, if any.
    pub request_content_type: Option<&'a str>,
    /// Raw request body text, if any.
    pub request_body_text: Option<&'a str>,
    /// Parsed request body, if it was valid JSON.
    pub request_json: Option<&'a Value>,
    /// Response body byte length, if known.
    pub response_size: Option<usize>,
    /// Parsed response body, if it was valid JSON.
    pub response_json: Option<&'a Value>,
}

const FAST_PATH_SUBSTRINGS: &[&str] = &[
    "/tracking/",
    "/sgtm/",
    "/beacon",
    "/pixel",
    "/~partytown/",
    "/telemetry/",
    "/client_configs",
    "/client-configs",
    "/data-layer",
    "/datalayer",
    "/feature-flags",
    "/feature_flags",
];

const PATH_SCORE_1_0: &[&str] = &[
    "analytics",
    "event-tracking",
    "pageview",
    "impression",
    "collect",
    "metrics",
    "diagnostic",
    "logging",
    "gtm",
    "tag-manager",
    "attribution",
    "conversion",
    "campaign_event",
    "pagead",
    "adserver",
    "ad-event",
];

const PATH_SCORE_0_8_EXACT: &[&str] = &["health", "healthz", "ping", "heartbeat", "ready", "alive"];

const PATH_SCORE_0_7: &[&str] = &["experiments", "client-config", "platformassets", "static-assets"];

const ANALYTICS_PAYLOAD_KEYS: &[&str] = &[
    "event",
    "event_name",
    "event_type",
    "timestamp",
    "client_id",
    "session_id",
    "page_url",
    "referrer",
    "user_agent",
];

const BATCH_KEYS: &[&str] = &["events", "batch", "messages", "logs", "entries"];

const LOTTIE_KEYS: &[&str] = &["layers", "assets", "fr", "op", "ip", "v", "w", "h", "nm"];

const CONFIG_RESPONSE_KEYS: &[&str] = &["features", "flags", "experiments", "variants", "toggles"];

/// Third-party analytics/ads/payment/support domains rejected before scoring
/// ever runs (SPEC_FULL §1.1), consulted by [`crate::har::HarParser::parse`].
const SKIP_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "doubleclick.net",
    "googletagmanager.com",
    "googlesyndication.com",
    "mixpanel.com",
    "segment.io",
    "segment.com",
    "amplitude.com",
    "heapanalytics.com",
    "posthog.com",
    "plausible.io",
    "stripe.com",
    "intercom.io",
    "hotjar.com",
    "clarity.ms",
    "sentry.io",
    "fullstory.com",
    "launchdarkly.com",
    "datadoghq.com",
    "bugsnag.com",
    "facebook.com",
    "connect.facebook.net",
    "newrelic.com",
];

/// True if `host` is (or is a subdomain of) a known third-party domain.
pub fn is_skipped_domain(host: &str) -> bool {
    SKIP_DOMAINS.iter().any(|skip| host == *skip || host.ends_with(&format!(".{skip}")))
}

/// Classifies one exchange as analytics/telemetry noise vs real API traffic
/// using the weighted-signal scorer from spec §4.2.
pub struct NoiseFilter<'a> {
    config: &'a NoiseConfig,
}

impl<'a> NoiseFilter<'a> {
    /// Build a filter bound to the given config.
    pub fn new(config: &'a NoiseConfig) -> Self {
        Self { config }
    }

    /// True if the exchange should be filtered out as noise.
    pub fn is_noise(&self, input: &NoiseInput) -> bool {
        self.score(input) >= self.config.threshold
    }

    /// Compute the final [0, 1] noise score for one exchange.
    pub fn score(&self, input: &NoiseInput) -> f64 {
        if self.fast_path(input) {
            return 1.0;
        }
        let path = self.path_score(input.path);
        let request = self.request_score(input);
        let response = self.response_score(input);
        let max = path.max(request).max(response);
        if max >= self.config.dominant_signal {
            max
        } else {
            0.5 * path + 0.3 * request + 0.2 * response
        }
    }

    fn fast_path(&self, input: &NoiseInput) -> bool {
        let lower = input.path.to_ascii_lowercase();
        if FAST_PATH_SUBSTRINGS.iter().any(|s| lower.contains(s)) {
            return true;
        }
        input.method.eq_ignore_ascii_case("POST") && (lower == "/js" || lower == "/js/")
    }

    fn path_score(&self, path: &str) -> f64 {
        let lower = path.to_ascii_lowercase();
        if PATH_SCORE_1_0.iter().any(|kw| lower.contains(kw)) {
            return 1.0;
        }
        let trimmed = lower.trim_start_matches('/');
        let first_segment = trimmed.split('/').next().unwrap_or("");
        if PATH_SCORE_0_8_EXACT.contains(&first_segment) || PATH_SCORE_0_8_EXACT.contains(&trimmed)
        {
            return 0.8;
        }
        if PATH_SCORE_0_7.iter().any(|kw| lower.contains(kw)) {
            return 0.7;
        }
        if has_fine_version_segment(&lower) && !lower.contains("/api/") {
            return 0.6;
        }
        0.0
    }

    fn request_score(&self, input: &NoiseInput) -> f64 {
        let small_response = matches!(input.response_size, Some(n) if n < 50);
        if matches!(input.method, "POST" | "PUT") && small_response {
            return 0.8;
        }
        if let Some(ct) = input.request_content_type {
            if ct.starts_with("text/plain") {
                return 0.8;
            }
        }
        if let Some(body) = input.request_json {
            match body {
                Value::Array(_) => return 0.8,
                Value::Object(map) => {
                    if let Some((first_key, _)) = map.iter().next() {
                        if BATCH_KEYS.contains(&first_key.as_str()) {
                            return 0.8;
                        }
                    }
                    let hits = ANALYTICS_PAYLOAD_KEYS
                        .iter()
                        .filter(|k| map.contains_key(**k))
                        .count();
                    if hits >= 3 {
                        return 0.8;
                    }
                }
                _ => {}
            }
        }
        let _ = input.request_body_text;
        0.0
    }

    fn response_score(&self, input: &NoiseInput) -> f64 {
        if let Some(body) = input.response_json {
            if let Value::Object(map) = body {
                let lottie_hits = LOTTIE_KEYS.iter().filter(|k| map.contains_key(**k)).count();
                if lottie_hits >= 4 {
                    return 1.0;
                }
                if CONFIG_RESPONSE_KEYS.iter().any(|k| map.contains_key(*k)) {
                    return 0.6;
                }
                if is_trivial_ack(body) {
                    return 0.5;
                }
                let scalar_keys = map.values().filter(|v| is_scalar(v)).count();
                if map.len() >= 50 && scalar_keys >= 50 {
                    return 0.5;
                }
            } else if is_trivial_ack(body) {
                return 0.5;
            }
        }
        0.0
    }
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn is_trivial_ack(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => s.is_empty() || s.eq_ignore_ascii_case("ok"),
        Value::Object(map) => {
            map.is_empty()
                || matches!(map.get("ok"), Some(Value::Bool(true)))
                || matches!(map.get("ok"), Some(Value::Number(n)) if n.as_i64() == Some(1))
                || matches!(map.get("success"), Some(Value::Bool(true)))
                || matches!(map.get("status"), Some(Value::String(s)) if s == "ok" || s == "success")
        }
        Value::Array(_) => false,
    }
}

/// True if `path` contains a `/vN.N.N/`-style semantic-version segment.
fn has_fine_version_segment(path: &str) -> bool {
    path.split('/').any(|seg| {
        let Some(rest) = seg.strip_prefix('v') else {
            return false;
        };
        let parts: Vec<&str> = rest.split('.').collect();
        parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input(path: &'static str) -> NoiseInput<'static> {
        NoiseInput {
            host: "api.acme.com",
            path,
            method: "GET",
            request_content_type: None,
            request_body_text: None,
            request_json: None,
            response_size: None,
            response_json: None,
        }
    }

    #[test]
    fn fast_path_tracking_is_noise() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let input = NoiseInput {
            method: "POST",
            ..base_input("/tracking/events")
        };
        assert!(filter.is_noise(&input));
        assert_eq!(filter.score(&input), 1.0);
    }

    #[test]
    fn health_check_path_scores_0_8() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let input = base_input("/healthz");
        assert!((filter.path_score("/healthz") - 0.8).abs() < 1e-9);
        assert!(!filter.is_noise(&input));
    }

    #[test]
    fn real_api_path_is_not_noise() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let input = base_input("/api/v1/users/4231");
        assert_eq!(filter.score(&input), 0.0);
        assert!(!filter.is_noise(&input));
    }

    #[test]
    fn analytics_payload_keys_drive_request_score() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let body = serde_json::json!({
            "event": "click",
            "event_name": "button",
            "timestamp": 123,
        });
        let input = NoiseInput {
            method: "POST",
            request_json: Some(&body),
            ..base_input("/collect")
        };
        // path_score=1.0 (contains "collect") dominates
        assert_eq!(filter.score(&input), 1.0);
    }

    #[test]
    fn lottie_response_is_noise() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let body = serde_json::json!({
            "layers": [], "assets": [], "fr": 30, "op": 1, "ip": 0, "v": "5.0", "w": 100, "h": 100, "nm": "anim"
        });
        let input = NoiseInput {
            response_json: Some(&body),
            ..base_input("/assets/anim")
        };
        assert_eq!(filter.score(&input), 1.0);
        assert!(filter.is_noise(&input));
    }

    #[test]
    fn trivial_ack_contributes_half_weight() {
        let cfg = NoiseConfig::default();
        let filter = NoiseFilter::new(&cfg);
        let body = serde_json::json!({"status": "ok"});
        let input = NoiseInput {
            response_json: Some(&body),
            ..base_input("/api/v1/orders/42/confirm")
        };
        // path_score=0, request_score=0, response_score=0.5 -> final = 0.2*0.5 = 0.1
        assert!((filter.score(&input) - 0.1).abs() < 1e-9);
        assert!(!filter.is_noise(&input));
    }

    #[test]
    fn ok_count_is_not_a_trivial_ack() {
        let body = serde_json::json!({"ok": 7});
        assert!(!is_trivial_ack(&body));
    }

    #[test]
    fn ok_one_is_a_trivial_ack() {
        let body = serde_json::json!({"ok": 1});
        assert!(is_trivial_ack(&body));
    }

    #[test]
    fn known_third_party_domains_are_skipped() {
        assert!(is_skipped_domain("www.google-analytics.com"));
        assert!(is_skipped_domain("js.stripe.com"));
        assert!(is_skipped_domain("sentry.io"));
        assert!(!is_skipped_domain("api.acme.com"));
    }
}
