//! Auth/CSRF material extraction and provenance (spec §4.4).

use crate::config::AuthConfig;
use crate::types::{ApiData, AuthMethod, CsrfProvenance, ParsedRequest, ProvenanceKind};
use once_cell::sync::Lazy;
use regex::Regex;

const AUTH_HEADER_NAMES: &[&str] = &[
    "authorization",
    "x-api-key",
    "api-key",
    "apikey",
    "x-auth-token",
    "access-token",
    "x-access-token",
    "token",
    "x-token",
    "x-csrf-token",
    "x-xsrf-token",
];

const API_KEY_HEADER_NAMES: &[&str] = &[
    "x-api-key",
    "api-key",
    "apikey",
    "x-auth-token",
    "access-token",
    "x-access-token",
    "token",
    "x-token",
];

static STORAGE_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)token|auth|session|jwt|access|refresh|csrf|xsrf|key|cred|user|login|bearer")
        .unwrap()
});

/// True if `name` matches the same token-like vocabulary used to accept
/// storage keys (spec §4.4), reused by [`crate::enrich`] to classify
/// response fields as `produces` candidates.
pub fn is_token_like_name(name: &str) -> bool {
    STORAGE_KEY_RE.is_match(name)
}

const REFRESH_PATH_MARKERS: &[&str] = &["/refresh", "/renew", "/rotate"];

/// A single named credential observed in browser storage, keyed by its
/// storage key (the collaborator supplies these; the core only classifies
/// and promotes them — spec §4.4 "consumed from the collaborator").
#[derive(Debug, Clone)]
pub struct StorageToken {
    /// Which storage the value came from.
    pub kind: ProvenanceKind,
    /// The storage key.
    pub key: String,
    /// The stored value.
    pub value: String,
}

/// A named CSRF token observed in a `<meta>` tag.
#[derive(Debug, Clone)]
pub struct MetaToken {
    /// `<meta name="...">`.
    pub name: String,
    /// `<meta content="...">`.
    pub value: String,
}

/// Scans surviving exchanges (plus optional collaborator-supplied storage
/// and meta tokens) to build the auth profile of [`ApiData`] (spec §4.4).
pub struct AuthExtractor<'a> {
    config: &'a AuthConfig,
}

impl<'a> AuthExtractor<'a> {
    /// Build an extractor bound to the given config.
    pub fn new(config: &'a AuthConfig) -> Self {
        Self { config }
    }

    fn is_auth_header(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        AUTH_HEADER_NAMES.contains(&lower.as_str())
            || self
                .config
                .extra_auth_headers
                .iter()
                .any(|h| h.eq_ignore_ascii_case(&lower))
    }

    /// Populate `api_data`'s auth fields in place from its surviving requests
    /// plus any storage/meta tokens the collaborator supplied.
    pub fn apply(
        &self,
        api_data: &mut ApiData,
        storage_tokens: &[StorageToken],
        meta_tokens: &[MetaToken],
    ) {
        for req in &api_data.requests {
            for (name, value) in &req.request_headers {
                if self.is_auth_header(name) {
                    api_data
                        .auth_headers
                        .insert(name.to_ascii_lowercase(), value.clone());
                }
            }
            for (name, value) in &req.request_cookies {
                api_data.cookies.insert(name.clone(), value.clone());
            }
            for (name, value) in &req.response_headers {
                if name.eq_ignore_ascii_case("set-cookie") {
                    apply_set_cookie(&mut api_data.cookies, value);
                }
            }
        }

        for token in storage_tokens {
            if !STORAGE_KEY_RE.is_match(&token.key) {
                continue;
            }
            api_data
                .auth_info
                .insert(token.key.clone(), token.value.clone());

            if token.value.starts_with("eyJ") && !api_data.auth_headers.contains_key("authorization") {
                api_data
                    .auth_headers
                    .insert("authorization".to_string(), format!("Bearer {}", token.value));
            }

            let lower_key = token.key.to_ascii_lowercase();
            if lower_key.contains("csrf") || lower_key.contains("xsrf") {
                api_data.auth_headers.insert(
                    "x-csrf-token".to_string(),
                    token.value.clone(),
                );
                api_data.csrf_provenance.insert(
                    "x-csrf-token".to_string(),
                    CsrfProvenance {
                        kind: token.kind,
                        key: token.key.clone(),
                    },
                );
            }
        }

        for token in meta_tokens {
            let lower_name = token.name.to_ascii_lowercase();
            if lower_name.contains("csrf") || lower_name.contains("xsrf") {
                api_data
                    .auth_headers
                    .insert("x-csrf-token".to_string(), token.value.clone());
                api_data.csrf_provenance.insert(
                    "x-csrf-token".to_string(),
                    CsrfProvenance {
                        kind: ProvenanceKind::Meta,
                        key: token.name.clone(),
                    },
                );
            }
        }

        let (method, label) = self.select_auth_method(api_data);
        api_data.auth_method = method;
        api_data.auth_method_label = label;
    }

    fn select_auth_method(&self, api_data: &ApiData) -> (AuthMethod, String) {
        let has_bearer = api_data
            .auth_headers
            .get("authorization")
            .map(|v| v.to_ascii_lowercase().starts_with("bearer "))
            .unwrap_or(false);
        let has_api_key = api_data
            .auth_headers
            .keys()
            .any(|k| API_KEY_HEADER_NAMES.contains(&k.as_str()));
        let has_custom_header = api_data.auth_headers.keys().any(|k| {
            k != "authorization"
                && k != "x-csrf-token"
                && k != "x-xsrf-token"
                && !API_KEY_HEADER_NAMES.contains(&k.as_str())
        });
        let has_basic = api_data
            .auth_headers
            .get("authorization")
            .map(|v| v.to_ascii_lowercase().starts_with("basic "))
            .unwrap_or(false);
        let has_cookies = !api_data.cookies.is_empty();

        let mut mechanisms: Vec<AuthMethod> = Vec::new();
        if has_bearer {
            mechanisms.push(AuthMethod::Bearer);
        } else if has_basic {
            mechanisms.push(AuthMethod::Basic);
        } else if has_api_key {
            mechanisms.push(AuthMethod::ApiKey);
        } else if has_custom_header {
            mechanisms.push(AuthMethod::Header);
        }
        if has_cookies {
            mechanisms.push(AuthMethod::Cookie);
        }

        match mechanisms.len() {
            0 => (AuthMethod::None, "none".to_string()),
            1 => {
                let m = mechanisms[0];
                (m, method_label(m))
            }
            _ => (AuthMethod::Mixed, "mixed".to_string()),
        }
    }
}

/// Find a refresh endpoint among the observed endpoint keys, if any, by URL
/// shape *or* by request-body grant type (SPEC_FULL §1.1, grounded on
/// unbrowse's `detect_refresh_endpoint`).
pub fn detect_refresh_endpoint<'k>(
    endpoint_keys: &'k [String],
    requests: &[ParsedRequest],
) -> Option<&'k str> {
    endpoint_keys.iter().find_map(|key| {
        let path = key.split_once(' ').map(|(_, p)| p).unwrap_or(key);
        let lower = path.to_ascii_lowercase();
        let path_hit = REFRESH_PATH_MARKERS.iter().any(|m| lower.contains(m));
        let grant_hit = requests.iter().any(|r| {
            format!("{} {}", r.method, r.normalized_path) == *key
                && has_refresh_grant(r.request_json.as_ref())
        });
        (path_hit || grant_hit).then_some(key.as_str())
    })
}

/// True if a parsed JSON request body carries `grant_type: "refresh_token"`
/// (SPEC_FULL §1.1).
fn has_refresh_grant(body: Option<&serde_json::Value>) -> bool {
    body.and_then(|v| v.as_object())
        .and_then(|map| map.get("grant_type"))
        .and_then(|v| v.as_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("refresh_token"))
}

fn method_label(method: AuthMethod) -> String {
    match method {
        AuthMethod::None => "none",
        AuthMethod::Cookie => "cookie-based session",
        AuthMethod::Header => "custom header",
        AuthMethod::Bearer => "bearer token",
        AuthMethod::ApiKey => "API key",
        AuthMethod::Basic => "HTTP basic",
        AuthMethod::Mixed => "mixed",
    }
    .to_string()
}

/// Apply one `Set-Cookie` header value to the running cookie jar: update on
/// a normal cookie, remove when expired (`Max-Age=0` or a past `Expires`).
fn apply_set_cookie(cookies: &mut std::collections::BTreeMap<String, String>, raw: &str) {
    let mut attrs = raw.split(';').map(str::trim);
    let Some(name_value) = attrs.next() else {
        return;
    };
    let Some((name, value)) = name_value.split_once('=') else {
        return;
    };
    let name = name.trim().to_string();
    let value = value.trim().to_string();

    let mut expired = false;
    for attr in attrs {
        let lower = attr.to_ascii_lowercase();
        if let Some(age) = lower.strip_prefix("max-age=") {
            if age.trim() == "0" || age.trim().starts_with('-') {
                expired = true;
            }
        } else if lower.starts_with("expires=") {
            let raw_expires = attr["expires=".len()..].trim();
            if let Ok(expires) = chrono::DateTime::parse_from_rfc2822(raw_expires) {
                if expires < chrono::Utc::now() {
                    expired = true;
                }
            }
        }
    }

    if expired {
        cookies.remove(&name);
    } else {
        cookies.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthMethod, ParsedRequest, ResourceType};

    fn empty_api_data() -> ApiData {
        ApiData {
            service: "svc".to_string(),
            base_url: "https://svc.example.com".to_string(),
            base_urls: vec!["https://svc.example.com".to_string()],
            auth_method: AuthMethod::None,
            auth_method_label: "none".to_string(),
            auth_headers: Default::default(),
            cookies: Default::default(),
            auth_info: Default::default(),
            csrf_provenance: Default::default(),
            requests: Vec::new(),
            endpoints: Default::default(),
            endpoint_groups: Vec::new(),
        }
    }

    fn parsed_request(headers: Vec<(String, String)>) -> ParsedRequest {
        ParsedRequest {
            method: "GET".to_string(),
            url: "https://svc.example.com/me".to_string(),
            host: "svc.example.com".to_string(),
            raw_path: "/me".to_string(),
            normalized_path: "/me".to_string(),
            status: 200,
            response_content_type: None,
            request_json: None,
            response_json: None,
            resource_type: ResourceType::Xhr,
            query_params: Vec::new(),
            request_headers: headers,
            response_headers: Vec::new(),
            request_cookies: Vec::new(),
        }
    }

    #[test]
    fn bearer_header_selects_bearer_method() {
        let cfg = AuthConfig::default();
        let extractor = AuthExtractor::new(&cfg);
        let mut data = empty_api_data();
        data.requests
            .push(parsed_request(vec![("Authorization".to_string(), "Bearer abc123".to_string())]));
        extractor.apply(&mut data, &[], &[]);
        assert_eq!(data.auth_method, AuthMethod::Bearer);
        assert_eq!(data.auth_method_label, "bearer token");
    }

    #[test]
    fn jwt_storage_token_is_promoted_to_bearer() {
        let cfg = AuthConfig::default();
        let extractor = AuthExtractor::new(&cfg);
        let mut data = empty_api_data();
        let storage = vec![StorageToken {
            kind: ProvenanceKind::LocalStorage,
            key: "access_token".to_string(),
            value: "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.sig".to_string(),
        }];
        extractor.apply(&mut data, &storage, &[]);
        assert_eq!(
            data.auth_headers.get("authorization").unwrap(),
            "Bearer eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.sig"
        );
        assert_eq!(data.auth_method, AuthMethod::Bearer);
    }

    #[test]
    fn cookie_only_selects_cookie_method() {
        let cfg = AuthConfig::default();
        let extractor = AuthExtractor::new(&cfg);
        let mut data = empty_api_data();
        let mut req = parsed_request(Vec::new());
        req.request_cookies.push(("session".to_string(), "abc".to_string()));
        data.requests.push(req);
        extractor.apply(&mut data, &[], &[]);
        assert_eq!(data.auth_method, AuthMethod::Cookie);
    }

    #[test]
    fn mixed_bearer_and_cookie() {
        let cfg = AuthConfig::default();
        let extractor = AuthExtractor::new(&cfg);
        let mut data = empty_api_data();
        let mut req = parsed_request(vec![("Authorization".to_string(), "Bearer xyz".to_string())]);
        req.request_cookies.push(("session".to_string(), "abc".to_string()));
        data.requests.push(req);
        extractor.apply(&mut data, &[], &[]);
        assert_eq!(data.auth_method, AuthMethod::Mixed);
    }

    #[test]
    fn cookie_session_with_csrf_meta_is_still_cookie_method() {
        let cfg = AuthConfig::default();
        let extractor = AuthExtractor::new(&cfg);
        let mut data = empty_api_data();
        let mut req = parsed_request(Vec::new());
        req.request_cookies.push(("session".to_string(), "abc".to_string()));
        data.requests.push(req);
        let meta = vec![MetaToken {
            name: "csrf-token".to_string(),
            value: "tok".to_string(),
        }];
        extractor.apply(&mut data, &[], &meta);
        assert_eq!(data.auth_method, AuthMethod::Cookie);
    }

    #[test]
    fn detects_refresh_endpoint_by_path() {
        let keys = vec!["POST /auth/login".to_string(), "POST /auth/refresh".to_string()];
        assert_eq!(
            detect_refresh_endpoint(&keys, &[]),
            Some("POST /auth/refresh")
        );
    }

    #[test]
    fn detects_refresh_endpoint_by_grant_type() {
        let keys = vec!["POST /auth/login".to_string(), "POST /oauth/token".to_string()];
        let mut req = parsed_request(Vec::new());
        req.method = "POST".to_string();
        req.normalized_path = "/oauth/token".to_string();
        req.request_json = Some(serde_json::json!({"grant_type": "refresh_token"}));
        assert_eq!(
            detect_refresh_endpoint(&keys, std::slice::from_ref(&req)),
            Some("POST /oauth/token")
        );
    }

    #[test]
    fn expired_cookie_is_removed() {
        let mut cookies = std::collections::BTreeMap::new();
        cookies.insert("session".to_string(), "abc".to_string());
        apply_set_cookie(&mut cookies, "session=; Max-Age=0; Path=/");
        assert!(!cookies.contains_key("session"));
    }

    #[test]
    fn cookie_with_past_expires_is_removed() {
        let mut cookies = std::collections::BTreeMap::new();
        cookies.insert("session".to_string(), "abc".to_string());
        apply_set_cookie(
            &mut cookies,
            "session=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
        );
        assert!(!cookies.contains_key("session"));
    }

    #[test]
    fn cookie_with_future_expires_is_kept() {
        let mut cookies = std::collections::BTreeMap::new();
        apply_set_cookie(
            &mut cookies,
            "session=abc; Expires=Thu, 01 Jan 2099 00:00:00 GMT; Path=/",
        );
        assert_eq!(cookies.get("session"), Some(&"abc".to_string()));
    }
}
