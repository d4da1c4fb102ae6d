//! Endpoint grouping and schema aggregation (spec §4.5).

use crate::auth::is_token_like_name;
use crate::config::SchemaConfig;
use crate::schema::{merge, SchemaInferrer};
use crate::types::{
    Category, EndpointGroup, ParsedRequest, PathParam, QueryParam, TypeSummary,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const AUTH_PATH_MARKERS: &[&str] = &[
    "/login",
    "/signin",
    "/sign-in",
    "/auth",
    "/token",
    "/oauth",
    "/register",
    "/signup",
    "/sign-up",
    "/session",
];

static ID_FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^id$|id$|_id$|uuid").unwrap());

/// Transforms `ApiData.endpoints` into `endpoint_groups` (spec §4.5).
pub struct EndpointEnricher<'a> {
    schema: SchemaInferrer<'a>,
}

impl<'a> EndpointEnricher<'a> {
    /// Build an enricher bound to the given schema config.
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self {
            schema: SchemaInferrer::new(config),
        }
    }

    /// Build one [`EndpointGroup`] per `(method, normalized_path)` key.
    pub fn enrich(
        &self,
        endpoints: &BTreeMap<String, Vec<ParsedRequest>>,
        service: &str,
    ) -> Vec<EndpointGroup> {
        let mut groups: Vec<EndpointGroup> = endpoints
            .iter()
            .map(|(key, observations)| self.build_group(key, observations, service))
            .collect();
        groups.sort_by(|a, b| {
            a.method
                .cmp(&b.method)
                .then_with(|| a.normalized_path.cmp(&b.normalized_path))
        });
        groups
    }

    fn build_group(
        &self,
        key: &str,
        observations: &[ParsedRequest],
        service: &str,
    ) -> EndpointGroup {
        let (method, normalized_path) = key.split_once(' ').unwrap_or((key, ""));
        let method = method.to_string();
        let normalized_path = normalized_path.to_string();

        let path_params = self.extract_path_params(&normalized_path, observations);
        let query_params = self.extract_query_params(observations);

        let mut request_schema = TypeSummary::Unknown;
        let mut response_schema = TypeSummary::Unknown;
        let mut resource_types = Vec::new();
        for obs in observations {
            if let Some(json) = &obs.request_json {
                let this = self.schema.infer(json);
                request_schema = merge(&request_schema, &this);
            }
            if let Some(json) = &obs.response_json {
                let this = self.schema.infer(json);
                response_schema = merge(&response_schema, &this);
            }
            if !resource_types.contains(&obs.resource_type) {
                resource_types.push(obs.resource_type);
            }
        }

        let category = classify_category(&method, &normalized_path);
        let produces = collect_produces(&response_schema);
        let consumes = collect_consumes(&path_params, &query_params, &request_schema);
        let response_summary = summarize_response(&response_schema);
        let endpoint_id = compute_endpoint_id(&method, &normalized_path, service);

        EndpointGroup {
            method,
            normalized_path,
            description: String::new(),
            category,
            path_params,
            query_params,
            request_body_schema: request_schema,
            response_body_schema: response_schema,
            example_count: observations.len(),
            produces,
            consumes,
            response_summary,
            endpoint_id,
            resource_types,
        }
    }

    fn extract_path_params(
        &self,
        normalized_path: &str,
        observations: &[ParsedRequest],
    ) -> Vec<PathParam> {
        let norm_segments: Vec<&str> = normalized_path.split('/').collect();
        let Some(first) = observations.first() else {
            return Vec::new();
        };
        let raw_segments: Vec<&str> = first.raw_path.split('/').collect();

        let mut params = Vec::new();
        for (i, seg) in norm_segments.iter().enumerate() {
            if seg.starts_with('{') && seg.ends_with('}') {
                let name = seg[1..seg.len() - 1].to_string();
                let example = raw_segments.get(i).copied().unwrap_or("").to_string();
                let inferred_type = self
                    .schema
                    .infer(&serde_json::Value::String(example.clone()));
                params.push(PathParam {
                    name,
                    example,
                    inferred_type,
                });
            }
        }
        params
    }

    fn extract_query_params(&self, observations: &[ParsedRequest]) -> Vec<QueryParam> {
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        for obs in observations {
            for (k, v) in &obs.query_params {
                seen.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        seen.into_iter()
            .map(|(name, example)| {
                let inferred_type = self
                    .schema
                    .infer(&serde_json::Value::String(example.clone()));
                QueryParam {
                    name,
                    example,
                    inferred_type,
                }
            })
            .collect()
    }
}

fn classify_category(method: &str, normalized_path: &str) -> Category {
    let lower = normalized_path.to_ascii_lowercase();
    if AUTH_PATH_MARKERS.iter().any(|m| lower.contains(m)) {
        return Category::Auth;
    }
    match method {
        "GET" | "HEAD" => Category::Read,
        "DELETE" => Category::Delete,
        "POST" | "PUT" | "PATCH" => Category::Write,
        _ => Category::Other,
    }
}

fn collect_produces(schema: &TypeSummary) -> Vec<String> {
    match schema {
        TypeSummary::Object { fields, .. } => fields
            .keys()
            .filter(|name| ID_FIELD_RE.is_match(name) || is_token_like_name(name))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_consumes(
    path_params: &[PathParam],
    query_params: &[QueryParam],
    request_schema: &TypeSummary,
) -> Vec<String> {
    let mut names: Vec<String> = path_params.iter().map(|p| p.name.clone()).collect();
    names.extend(query_params.iter().map(|q| q.name.clone()));
    if let TypeSummary::Object { fields, .. } = request_schema {
        names.extend(fields.keys().cloned());
    }
    names.sort();
    names.dedup();
    names
}

fn summarize_response(schema: &TypeSummary) -> String {
    match schema {
        TypeSummary::Array { element, len } => match len {
            Some(n) => format!("array[{n}]"),
            None => format!("array<{}>", element.short_label()),
        },
        other => other.short_label(),
    }
}

/// 12-hex prefix of SHA-256 over `<method>\n<normalized_path>\n<service>`
/// (spec §4.5).
pub fn compute_endpoint_id(method: &str, normalized_path: &str, service: &str) -> String {
    let input = format!("{method}\n{normalized_path}\n{service}");
    let digest = Sha256::digest(input.as_bytes());
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceType;

    fn request(method: &str, raw_path: &str, normalized_path: &str, json: Option<serde_json::Value>) -> ParsedRequest {
        ParsedRequest {
            method: method.to_string(),
            url: format!("https://svc.example.com{raw_path}"),
            host: "svc.example.com".to_string(),
            raw_path: raw_path.to_string(),
            normalized_path: normalized_path.to_string(),
            status: 200,
            response_content_type: Some("application/json".to_string()),
            request_json: None,
            response_json: json,
            resource_type: ResourceType::Xhr,
            query_params: Vec::new(),
            request_headers: Vec::new(),
            response_headers: Vec::new(),
            request_cookies: Vec::new(),
        }
    }

    #[test]
    fn groups_digit_id_endpoint() {
        let cfg = SchemaConfig::default();
        let enricher = EndpointEnricher::new(&cfg);
        let mut endpoints = BTreeMap::new();
        endpoints.insert(
            "GET /api/v1/users/{userId}".to_string(),
            vec![request(
                "GET",
                "/api/v1/users/4231",
                "/api/v1/users/{userId}",
                Some(serde_json::json!({"id": 4231, "name": "A"})),
            )],
        );
        let groups = enricher.enrich(&endpoints, "acme");
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.path_params.len(), 1);
        assert_eq!(g.path_params[0].name, "userId");
        assert_eq!(g.path_params[0].example, "4231");
        assert_eq!(g.category, Category::Read);
        assert!(g.produces.contains(&"id".to_string()));
    }

    #[test]
    fn auth_path_is_categorized_auth() {
        assert_eq!(classify_category("POST", "/auth/login"), Category::Auth);
    }

    #[test]
    fn endpoint_id_is_deterministic() {
        let a = compute_endpoint_id("GET", "/api/v1/users/{userId}", "acme");
        let b = compute_endpoint_id("GET", "/api/v1/users/{userId}", "acme");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn endpoint_id_differs_by_service() {
        let a = compute_endpoint_id("GET", "/api/v1/users/{userId}", "acme");
        let b = compute_endpoint_id("GET", "/api/v1/users/{userId}", "other");
        assert_ne!(a, b);
    }
}
