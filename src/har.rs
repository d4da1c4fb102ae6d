//! HAR ingestion and request normalization (spec §4.3, shape in SPEC_FULL §4.3.1).

use crate::config::SchemaConfig;
use crate::error::{AnalysisError, Warning};
use crate::noise::{is_skipped_domain, NoiseFilter, NoiseInput};
use crate::types::{ApiData, AuthMethod, Exchange, Har, ParsedRequest, ResourceType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

const DROPPED_RESOURCE_TYPES: &[ResourceType] = &[
    ResourceType::Script,
    ResourceType::Image,
    ResourceType::Stylesheet,
    ResourceType::Font,
    ResourceType::Media,
];

const BINARY_CONTENT_PREFIXES: &[&str] = &[
    "image/", "font/", "video/", "audio/", "application/font", "application/octet-stream",
];

const FILE_EXT_WHITELIST: &[&str] = &[".json", ".xml", ".rss"];

/// Static-asset extensions rejected outright, so archives that don't set
/// `resourceType` faithfully still filter correctly (SPEC_FULL §1.1).
const STATIC_EXTS: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2", ".ico", ".map",
    ".ttf", ".eot",
];

const SUBDOMAIN_STRIP: &[&str] = &["www", "api", "app", "auth", "login"];
const TLD_STRIP: &[&str] = &["com", "io", "org", "net", "dev", "co", "ai"];

static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").unwrap());
static BASE64URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

/// Decode a raw HAR document into our own [`Exchange`] sequence.
///
/// This is the only place HAR's wire shape (`HarEntry`/`HarRequest`/...) is
/// visible to the rest of the pipeline; everything past this point operates
/// on [`Exchange`]/[`ParsedRequest`].
pub fn decode_har(bytes: &[u8]) -> Result<Vec<Exchange>, AnalysisError> {
    let har: Har = serde_json::from_slice(bytes)
        .map_err(|e| AnalysisError::InputMalformed(e.to_string()))?;
    Ok(har
        .log
        .entries
        .into_iter()
        .map(|entry| {
            let resource_type = entry
                .resource_type
                .as_deref()
                .map(ResourceType::parse)
                .unwrap_or(ResourceType::Other);
            let request_headers = entry
                .request
                .headers
                .into_iter()
                .map(|h| (h.name, h.value))
                .collect();
            let request_cookies = entry
                .request
                .cookies
                .into_iter()
                .map(|c| (c.name, c.value))
                .collect();
            let request_body = entry
                .request
                .post_data
                .and_then(|pd| pd.text.map(|t| (pd.mime_type, t)));
            let response_headers = entry
                .response
                .headers
                .into_iter()
                .map(|h| (h.name, h.value))
                .collect();
            let response_body = entry
                .response
                .content
                .and_then(|c| c.text.map(|t| (c.mime_type, t)));
            Exchange {
                method: entry.request.method.to_ascii_uppercase(),
                url: entry.request.url,
                request_headers,
                request_cookies,
                request_body,
                status: entry.response.status,
                response_headers,
                response_body,
                resource_type,
            }
        })
        .collect())
}

/// Normalizes captured exchanges into [`ApiData`] (without `endpoint_groups`,
/// which [`crate::enrich::EndpointEnricher`] fills in) (spec §4.3).
pub struct HarParser<'a> {
    schema_config: &'a SchemaConfig,
}

impl<'a> HarParser<'a> {
    /// Build a parser bound to the given schema config.
    pub fn new(schema_config: &'a SchemaConfig) -> Self {
        Self { schema_config }
    }

    /// Filter, normalize, and group the given exchanges.
    ///
    /// `seed_url`, when known, is the primary URL the capture was seeded
    /// from; any host sharing its root domain is treated as in-scope for
    /// `base_url` selection even when a busier, unrelated third-party host
    /// was observed more often (SPEC_FULL §1.1 "root-domain relatedness").
    ///
    /// Returns the partial [`ApiData`] plus any warnings accumulated along
    /// the way (malformed URLs, unparseable bodies) — neither is fatal to
    /// the pass (spec §4.3 "Failure modes").
    pub fn parse(
        &self,
        exchanges: &[Exchange],
        noise: &NoiseFilter,
        seed_url: Option<&str>,
    ) -> (ApiData, Vec<Warning>) {
        let mut warnings = Vec::new();
        let mut requests: Vec<ParsedRequest> = Vec::new();
        let mut origin_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut origin_order: Vec<String> = Vec::new();

        for exchange in exchanges {
            if DROPPED_RESOURCE_TYPES.contains(&exchange.resource_type) {
                continue;
            }
            if let Some((ct, _)) = &exchange.response_body {
                if BINARY_CONTENT_PREFIXES.iter().any(|p| ct.starts_with(p)) {
                    continue;
                }
            }
            let path_only = exchange
                .url
                .split(['?', '#'])
                .next()
                .unwrap_or(&exchange.url)
                .to_ascii_lowercase();
            if STATIC_EXTS.iter().any(|ext| path_only.ends_with(ext)) {
                continue;
            }

            let url = match url::Url::parse(&exchange.url) {
                Ok(u) => u,
                Err(_) => {
                    warnings.push(Warning::UrlInvalid {
                        url: exchange.url.clone(),
                    });
                    continue;
                }
            };
            let host = url.host_str().unwrap_or("").to_ascii_lowercase();
            if is_skipped_domain(&host) {
                continue;
            }
            let raw_path = url.path().to_string();
            let query_params: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();

            let request_json = parse_body_json(&exchange.request_body, "request", &raw_path, &mut warnings);
            let response_json = parse_body_json(&exchange.response_body, "response", &raw_path, &mut warnings);

            let request_content_type = exchange.request_body.as_ref().map(|(ct, _)| ct.as_str());
            let request_body_text = exchange.request_body.as_ref().map(|(_, t)| t.as_str());
            let response_size = exchange.response_body.as_ref().map(|(_, t)| t.len());

            let noise_input = NoiseInput {
                host: &host,
                path: &raw_path,
                method: &exchange.method,
                request_content_type,
                request_body_text,
                request_json: request_json.as_ref(),
                response_size,
                response_json: response_json.as_ref(),
            };
            if noise.is_noise(&noise_input) {
                continue;
            }

            let normalized_path = normalize_path(&raw_path);
            let response_content_type = exchange
                .response_body
                .as_ref()
                .map(|(ct, _)| ct.clone())
                .or_else(|| {
                    exchange
                        .response_headers
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                        .map(|(_, v)| v.clone())
                });

            let scheme_host = format!("{}://{}", url.scheme(), host);
            if !origin_counts.contains_key(&scheme_host) {
                origin_order.push(scheme_host.clone());
            }
            *origin_counts.entry(scheme_host).or_insert(0) += 1;

            requests.push(ParsedRequest {
                method: exchange.method.clone(),
                url: exchange.url.clone(),
                host,
                raw_path,
                normalized_path,
                status: exchange.status,
                response_content_type,
                request_json,
                response_json,
                resource_type: exchange.resource_type,
                query_params,
                request_headers: exchange.request_headers.clone(),
                response_headers: exchange.response_headers.clone(),
                request_cookies: exchange.request_cookies.clone(),
            });
        }

        let mut base_urls = origin_order;
        base_urls.sort_by(|a, b| origin_counts[b].cmp(&origin_counts[a]));
        let seed_root = seed_url
            .and_then(|u| url::Url::parse(u).ok())
            .and_then(|u| u.host_str().map(|h| root_domain(&h.to_ascii_lowercase())));
        let base_url = seed_root
            .as_deref()
            .and_then(|root| {
                base_urls
                    .iter()
                    .find(|origin| {
                        origin_host(origin)
                            .map(|h| root_domain(h) == root)
                            .unwrap_or(false)
                    })
                    .cloned()
            })
            .or_else(|| base_urls.first().cloned())
            .unwrap_or_default();
        let primary_host = base_url
            .split("://")
            .nth(1)
            .unwrap_or("")
            .to_string();
        let service = derive_service_name(&primary_host);

        let mut endpoints: BTreeMap<String, Vec<ParsedRequest>> = BTreeMap::new();
        for req in &requests {
            let key = format!("{} {}", req.method, req.normalized_path);
            endpoints.entry(key).or_default().push(req.clone());
        }

        let api_data = ApiData {
            service,
            base_url,
            base_urls,
            auth_method: AuthMethod::None,
            auth_method_label: "none".to_string(),
            auth_headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            auth_info: BTreeMap::new(),
            csrf_provenance: BTreeMap::new(),
            requests,
            endpoints,
            endpoint_groups: Vec::new(),
        };
        let _ = self.schema_config;
        (api_data, warnings)
    }
}

fn parse_body_json(
    body: &Option<(String, String)>,
    side: &str,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Option<serde_json::Value> {
    let (content_type, text) = body.as_ref()?;
    if text.trim().is_empty() {
        return None;
    }
    let looks_json = content_type.contains("json") || text.trim_start().starts_with(['{', '[']);
    if !looks_json {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.push(Warning::SchemaUnparseable {
                context: format!("{side} body at {path}"),
            });
            None
        }
    }
}

/// What the segment just emitted looked like, for naming the next
/// digit-id placeholder (SPEC_FULL §4.5.1).
enum PrevSegment<'a> {
    /// Start of path, or the previous segment was itself a placeholder —
    /// both force the bare `{id}` fallback.
    None,
    /// A literal segment, kept verbatim. Only used to derive `{xId}` if it
    /// isn't itself purely numeric.
    Literal(&'a str),
}

/// Segment-by-segment path normalization (spec §4.3 step 3).
pub fn normalize_path(raw_path: &str) -> String {
    let leading_slash = raw_path.starts_with('/');
    let segments: Vec<&str> = raw_path.split('/').collect();
    let mut prev = PrevSegment::None;
    let mut out_segments: Vec<String> = Vec::with_capacity(segments.len());

    for seg in segments {
        if seg.is_empty() {
            out_segments.push(String::new());
            continue;
        }
        if UUID_RE.is_match(seg) {
            out_segments.push("{id}".to_string());
            prev = PrevSegment::None;
            continue;
        }
        if seg.chars().all(|c| c.is_ascii_digit()) && seg.len() >= 4 {
            let name = match prev {
                PrevSegment::Literal(p) if !p.chars().all(|c| c.is_ascii_digit()) => {
                    format!("{{{}Id}}", singularize(p))
                }
                _ => "{id}".to_string(),
            };
            out_segments.push(name);
            prev = PrevSegment::None;
            continue;
        }
        if seg.contains('.') && FILE_EXT_WHITELIST.iter().any(|ext| seg.to_ascii_lowercase().ends_with(ext)) {
            out_segments.push(seg.to_string());
            prev = PrevSegment::Literal(seg);
            continue;
        }
        if HEX_RE.is_match(seg) && seg.len() >= 8 {
            out_segments.push("{id}".to_string());
            prev = PrevSegment::None;
            continue;
        }
        if is_base64url_like(seg) && seg.len() >= 16 {
            out_segments.push("{id}".to_string());
            prev = PrevSegment::None;
            continue;
        }
        out_segments.push(seg.to_string());
        prev = PrevSegment::Literal(seg);
    }

    let joined = out_segments.join("/");
    if leading_slash && !joined.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Base64url-like: matches the charset, but excluded by the caller from
/// winning against the hex check (hex strings are also valid base64url).
fn is_base64url_like(seg: &str) -> bool {
    BASE64URL_RE.is_match(seg) && seg.chars().any(|c| !c.is_ascii_hexdigit())
}

/// Shallow suffix-stripper used to name digit-id segments (SPEC_FULL §4.5.1,
/// resolving the "{usersId}" open question: singularize then append `Id`).
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if let Some(stem) = lower.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 1 {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

/// Host part of a `"scheme://host"` origin string, as recorded in `base_urls`.
fn origin_host(origin: &str) -> Option<&str> {
    origin.split("://").nth(1)
}

/// Last two dot-separated labels of a host, e.g. `api.acme.com` -> `acme.com`
/// (SPEC_FULL §1.1 root-domain relatedness).
fn root_domain(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2..].join(".")
    } else {
        host.to_string()
    }
}

/// Derive a service slug from a primary host (spec §4.3 step 5).
pub fn derive_service_name(host: &str) -> String {
    if host.is_empty() {
        return "unknown-api".to_string();
    }
    let mut parts: Vec<&str> = host.split('.').collect();
    if parts.len() > 1 && SUBDOMAIN_STRIP.contains(&parts[0]) {
        parts.remove(0);
    }
    if parts.len() > 1 {
        if let Some(last) = parts.last() {
            if TLD_STRIP.contains(last) {
                parts.pop();
            }
        }
    }
    if parts.is_empty() {
        return "unknown-api".to_string();
    }
    let joined = parts.join("-");
    let slug: String = joined
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    if slug.is_empty() {
        "unknown-api".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_digit_id_with_derived_name() {
        assert_eq!(normalize_path("/api/v1/users/4231"), "/api/v1/users/{userId}");
    }

    #[test]
    fn normalizes_uuid_segment() {
        assert_eq!(
            normalize_path("/api/orders/550e8400-e29b-41d4-a716-446655440000"),
            "/api/orders/{id}"
        );
    }

    #[test]
    fn keeps_whitelisted_extension_literal() {
        assert_eq!(normalize_path("/feeds/report.xml"), "/feeds/report.xml");
    }

    #[test]
    fn keeps_short_digit_runs_literal() {
        assert_eq!(normalize_path("/api/v2/items"), "/api/v2/items");
    }

    #[test]
    fn long_path_terminates_and_preserves_static_segments() {
        let mut path = String::new();
        for i in 0..100 {
            path.push_str(&format!("/seg{i}"));
        }
        let normalized = normalize_path(&path);
        assert_eq!(normalized, path);
    }

    #[test]
    fn singularize_plural_resource() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
    }

    #[test]
    fn derive_service_name_strips_subdomain_and_tld() {
        assert_eq!(derive_service_name("api.acme.com"), "acme");
        assert_eq!(derive_service_name("www.example.io"), "example");
    }

    #[test]
    fn derive_service_name_falls_back_when_empty() {
        assert_eq!(derive_service_name(""), "unknown-api");
    }

    #[test]
    fn consecutive_digit_ids_do_not_reuse_stale_literal() {
        assert_eq!(normalize_path("/users/1234/5678"), "/users/{userId}/{id}");
    }

    #[test]
    fn purely_numeric_previous_segment_falls_back_to_bare_id() {
        assert_eq!(normalize_path("/42/100000"), "/42/{id}");
    }

    fn exchange(method: &str, url: &str) -> Exchange {
        Exchange {
            method: method.to_string(),
            url: url.to_string(),
            request_headers: Vec::new(),
            request_cookies: Vec::new(),
            request_body: None,
            status: 200,
            response_headers: Vec::new(),
            response_body: Some(("application/json".to_string(), "{}".to_string())),
            resource_type: ResourceType::Xhr,
        }
    }

    #[test]
    fn static_asset_extension_is_rejected() {
        let schema_config = SchemaConfig::default();
        let noise_config = crate::config::NoiseConfig::default();
        let noise = NoiseFilter::new(&noise_config);
        let parser = HarParser::new(&schema_config);
        let exchanges = vec![exchange("GET", "https://api.acme.com/static/app.css")];
        let (api_data, _) = parser.parse(&exchanges, &noise, None);
        assert!(api_data.requests.is_empty());
    }

    #[test]
    fn third_party_domain_is_rejected() {
        let schema_config = SchemaConfig::default();
        let noise_config = crate::config::NoiseConfig::default();
        let noise = NoiseFilter::new(&noise_config);
        let parser = HarParser::new(&schema_config);
        let exchanges = vec![exchange("POST", "https://www.google-analytics.com/collect")];
        let (api_data, _) = parser.parse(&exchanges, &noise, None);
        assert!(api_data.requests.is_empty());
    }

    #[test]
    fn seed_url_sharpens_base_url_toward_same_root_domain() {
        let schema_config = SchemaConfig::default();
        let noise_config = crate::config::NoiseConfig::default();
        let noise = NoiseFilter::new(&noise_config);
        let parser = HarParser::new(&schema_config);
        let mut exchanges = vec![exchange("GET", "https://api.acme.com/v1/users")];
        for _ in 0..5 {
            exchanges.push(exchange("GET", "https://busier-unrelated.example.com/v1/items"));
        }
        let (api_data, _) = parser.parse(&exchanges, &noise, Some("https://acme.com/dashboard"));
        assert_eq!(api_data.base_url, "https://api.acme.com");
    }
}
