//! Higher-order traffic analysis: entities, auth flows, pagination, errors,
//! rate limits, data flows, API style, versioning, confidence (spec §4.6).

use crate::auth::{detect_refresh_endpoint, is_token_like_name};
use crate::har::singularize;
use crate::prober::EndpointProber;
use crate::types::{
    AgenticAnalysis, ApiData, ApiStyle, AuthFlow, Category, Confidence, DataFlow, ConsumerLocation,
    EndpointGroup, Entity, EntityField, ErrorShape, Pagination, PaginationGap, PaginationStyle,
    RateLimit, Suggestion, TypeSummary, VersioningPattern,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

const CRUD_VERBS: &[&str] = &["read", "create", "update", "delete"];

const ERROR_FIELD_VOCAB: &[&str] = &[
    "message",
    "error",
    "code",
    "detail",
    "details",
    "errors",
    "error_code",
    "error_message",
    "error_description",
    "status",
    "reason",
    "description",
    "type",
    "title",
    "instance",
    "violations",
];

const RATE_LIMIT_HEADERS: &[&str] = &[
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
    "retry-after",
];

static RPC_VERB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(get|set|create|update|delete|process|execute|run|do|fetch|send|check|validate|compute|calculate|submit|generate)").unwrap()
});

static VERSION_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^v\d+(\.\d+)?$").unwrap());

const OFFSET_LIMIT_PARAMS: &[&str] = &["offset", "limit", "skip", "take"];
const PAGE_NUMBER_PARAMS: &[&str] = &["page", "per_page", "pagesize", "page_size", "size", "perpage"];
const CURSOR_PARAMS: &[&str] = &["cursor", "after", "before", "next_token", "continuation", "start_after"];

const PAGE_RESPONSE_KEYS: &[&str] = &[
    "total",
    "count",
    "total_count",
    "total_pages",
    "has_more",
    "next_cursor",
    "next_page",
    "next",
];

/// Derives the `AgenticAnalysis` artifact from an enriched [`ApiData`]
/// (spec §4.6).
pub struct AgenticAnalyzer<'a> {
    prober: &'a EndpointProber<'a>,
}

impl<'a> AgenticAnalyzer<'a> {
    /// Build an analyzer over the given (already-configured) prober.
    pub fn new(prober: &'a EndpointProber<'a>) -> Self {
        Self { prober }
    }

    /// Run the full analysis.
    pub fn analyze(&self, api_data: &ApiData) -> AgenticAnalysis {
        let groups = &api_data.endpoint_groups;
        let entities = self.extract_entities(groups);
        let auth_flows = self.extract_auth_flows(groups, api_data);
        let (pagination, pagination_gaps) = self.extract_pagination(groups);
        let errors = self.extract_errors(groups, api_data);
        let rate_limits = self.extract_rate_limits(groups, api_data);
        let data_flows = self.extract_data_flows(groups);
        let orchestrators = find_orchestrators(&data_flows);
        let api_style = self.classify_api_style(groups);
        let versioning = self.detect_versioning(groups, api_data);

        let has_auth_material = !api_data.auth_headers.is_empty() || !api_data.cookies.is_empty();
        let mut suggestions = self.prober.probe(groups, has_auth_material);
        suggestions.extend(self.gap_suggestions(&entities, groups));

        let has_raw_bodies = groups
            .iter()
            .any(|g| !matches!(g.response_body_schema, TypeSummary::Unknown));
        let confidence = self.compute_confidence(
            &entities,
            groups,
            &auth_flows,
            api_data,
            &data_flows,
            has_raw_bodies,
        );
        let summary = self.compose_summary(
            api_data,
            &entities,
            &auth_flows,
            &data_flows,
            api_style,
            versioning,
            &confidence,
        );

        AgenticAnalysis {
            entities,
            auth_flows,
            pagination,
            pagination_gaps,
            errors,
            rate_limits,
            data_flows,
            orchestrators,
            suggestions,
            api_style,
            versioning,
            confidence,
            summary,
        }
    }

    fn extract_entities(&self, groups: &[EndpointGroup]) -> Vec<Entity> {
        let mut by_resource: BTreeMap<String, Vec<&EndpointGroup>> = BTreeMap::new();
        for g in groups {
            let resource = resource_name(&g.normalized_path);
            by_resource.entry(resource).or_default().push(g);
        }

        by_resource
            .into_iter()
            .map(|(resource, groups)| {
                let mut fields: BTreeMap<String, EntityField> = BTreeMap::new();
                let mut observed_categories: BTreeSet<Category> = BTreeSet::new();
                let mut endpoint_keys = Vec::new();

                for g in &groups {
                    observed_categories.insert(g.category);
                    endpoint_keys.push(format!("{} {}", g.method, g.normalized_path));
                    if let TypeSummary::Object { fields: f, .. } = &g.response_body_schema {
                        for (name, ty) in f {
                            let entry = fields.entry(name.clone()).or_insert_with(|| EntityField {
                                name: name.clone(),
                                inferred_type: TypeSummary::Unknown,
                                seen_in: Vec::new(),
                                nullable: false,
                                is_id: name.eq_ignore_ascii_case("id")
                                    || name.to_ascii_lowercase().ends_with("id")
                                    || name.to_ascii_lowercase().ends_with("_id"),
                            });
                            entry.inferred_type = crate::schema::merge(&entry.inferred_type, ty);
                            entry.seen_in.push(format!("{} {}", g.method, g.normalized_path));
                            if matches!(ty, TypeSummary::Null) {
                                entry.nullable = true;
                            }
                        }
                    }
                }

                let missing_ops: Vec<String> = CRUD_VERBS
                    .iter()
                    .filter(|verb| !category_covers(&observed_categories, verb))
                    .map(|v| v.to_string())
                    .collect();

                Entity {
                    name: capitalize(&singularize(&resource)),
                    fields: fields.into_values().collect(),
                    endpoints: endpoint_keys,
                    crud_complete: missing_ops.is_empty(),
                    missing_ops,
                }
            })
            .collect()
    }

    fn extract_auth_flows(&self, groups: &[EndpointGroup], api_data: &ApiData) -> Vec<AuthFlow> {
        let auth_keys: Vec<String> = groups
            .iter()
            .filter(|g| g.category == Category::Auth)
            .map(|g| format!("{} {}", g.method, g.normalized_path))
            .collect();

        groups
            .iter()
            .filter(|g| g.category == Category::Auth)
            .map(|g| {
                let endpoint = format!("{} {}", g.method, g.normalized_path);
                let input_fields = match &g.request_body_schema {
                    TypeSummary::Object { fields, .. } => fields.keys().cloned().collect(),
                    _ => Vec::new(),
                };
                let produced_tokens: Vec<String> = match &g.response_body_schema {
                    TypeSummary::Object { fields, .. } => fields
                        .iter()
                        .filter(|(name, _)| is_token_like_name(name))
                        .map(|(name, ty)| match ty {
                            TypeSummary::Jwt => format!("{name}(jwt)"),
                            _ => format!("{name}(opaque)"),
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                let consumed_by: Vec<String> = groups
                    .iter()
                    .filter(|c| c.category != Category::Auth)
                    .filter(|c| {
                        c.consumes.iter().any(|slot| {
                            let lower = slot.to_ascii_lowercase();
                            lower == "authorization" || lower == "cookie" || lower.contains("csrf")
                        })
                    })
                    .map(|c| format!("{} {}", c.method, c.normalized_path))
                    .collect();
                let refresh_endpoint = detect_refresh_endpoint(&auth_keys, &api_data.requests)
                    .map(str::to_string);
                AuthFlow {
                    endpoint,
                    method: g.method.clone(),
                    input_fields,
                    produced_tokens,
                    consumed_by,
                    refresh_endpoint,
                }
            })
            .collect()
    }

    fn extract_pagination(&self, groups: &[EndpointGroup]) -> (Vec<Pagination>, Vec<PaginationGap>) {
        let mut patterns = Vec::new();
        let mut gaps = Vec::new();

        for g in groups.iter().filter(|g| g.method == "GET") {
            let endpoint = format!("{} {}", g.method, g.normalized_path);
            let query_names: Vec<&str> = g.query_params.iter().map(|q| q.name.as_str()).collect();

            let style_params = [
                (PaginationStyle::OffsetLimit, OFFSET_LIMIT_PARAMS),
                (PaginationStyle::PageNumber, PAGE_NUMBER_PARAMS),
                (PaginationStyle::Cursor, CURSOR_PARAMS),
            ];
            let mut found = false;
            for (style, names) in style_params {
                let matched: Vec<String> = query_names
                    .iter()
                    .filter(|n| names.contains(&n.to_ascii_lowercase().as_str()))
                    .map(|s| s.to_string())
                    .collect();
                if !matched.is_empty() {
                    let example = g
                        .query_params
                        .iter()
                        .find(|q| matched.contains(&q.name))
                        .map(|q| q.example.clone());
                    patterns.push(Pagination {
                        endpoint: endpoint.clone(),
                        style,
                        params: matched,
                        example,
                    });
                    found = true;
                    break;
                }
            }

            if !found {
                if let TypeSummary::Object { fields, .. } = &g.response_body_schema {
                    let matched: Vec<String> = PAGE_RESPONSE_KEYS
                        .iter()
                        .filter(|k| fields.contains_key(**k))
                        .map(|s| s.to_string())
                        .collect();
                    if !matched.is_empty() {
                        patterns.push(Pagination {
                            endpoint: endpoint.clone(),
                            style: PaginationStyle::PageNumber,
                            params: matched,
                            example: None,
                        });
                        found = true;
                    }
                }
            }

            let array_len = array_len_of(&g.response_body_schema);
            if !found {
                if let Some(len) = array_len {
                    if len >= 10 {
                        gaps.push(PaginationGap {
                            endpoint: endpoint.clone(),
                            observed_len: len,
                        });
                    }
                }
            }
        }

        (patterns, gaps)
    }

    fn extract_errors(&self, groups: &[EndpointGroup], api_data: &ApiData) -> Vec<ErrorShape> {
        let mut by_status: BTreeMap<u16, (Vec<String>, TypeSummary, Option<String>)> =
            BTreeMap::new();

        for req in &api_data.requests {
            if req.status < 400 {
                continue;
            }
            let key = format!("{} {}", req.method, req.normalized_path);
            let entry = by_status
                .entry(req.status)
                .or_insert_with(|| (Vec::new(), TypeSummary::Unknown, None));
            if !entry.0.contains(&key) {
                entry.0.push(key);
            }
            if let Some(json) = &req.response_json {
                let cfg = crate::config::SchemaConfig::default();
                let inferrer = crate::schema::SchemaInferrer::new(&cfg);
                let this = inferrer.infer(json);
                entry.1 = crate::schema::merge(&entry.1, &this);
                if let serde_json::Value::Object(map) = json {
                    for field in ERROR_FIELD_VOCAB {
                        if let Some(serde_json::Value::String(msg)) = map.get(*field) {
                            if entry.2.is_none() {
                                entry.2 = Some(msg.chars().take(120).collect());
                            }
                        }
                    }
                }
            }
        }

        let _ = groups;
        by_status
            .into_iter()
            .map(|(status, (endpoints, shape, example_message))| {
                let fields_observed = match &shape {
                    TypeSummary::Object { fields, .. } => ERROR_FIELD_VOCAB
                        .iter()
                        .filter(|f| fields.contains_key(**f))
                        .map(|f| f.to_string())
                        .collect(),
                    _ => Vec::new(),
                };
                ErrorShape {
                    status,
                    shape,
                    fields_observed,
                    example_message,
                    endpoints,
                    retryable: matches!(status, 429 | 502 | 503 | 504),
                    terminal: matches!(status, 400 | 401 | 403 | 404 | 422),
                }
            })
            .collect()
    }

    fn extract_rate_limits(&self, _groups: &[EndpointGroup], api_data: &ApiData) -> Vec<RateLimit> {
        let mut out = Vec::new();
        for req in &api_data.requests {
            let has_signal = req
                .response_headers
                .iter()
                .any(|(k, _)| {
                    let lower = k.to_ascii_lowercase();
                    RATE_LIMIT_HEADERS.contains(&lower.as_str())
                        || lower.starts_with("x-rate-limit-")
                        || lower.starts_with("x-ratelimit-")
                        || lower.starts_with("ratelimit")
                });
            if !has_signal {
                continue;
            }
            let header = |name: &str| -> Option<i64> {
                req.response_headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .and_then(|(_, v)| v.parse::<i64>().ok())
            };
            let limit = header("x-ratelimit-limit");
            let remaining = header("x-ratelimit-remaining");
            let reset = header("x-ratelimit-reset");
            let retry_after = header("retry-after");
            let window_seconds = reset.map(|r| {
                if r > 946_684_800 {
                    r - chrono::Utc::now().timestamp()
                } else {
                    r
                }
            });
            out.push(RateLimit {
                endpoint: format!("{} {}", req.method, req.normalized_path),
                limit,
                remaining,
                window_seconds,
                retry_after,
            });
        }
        out
    }

    fn extract_data_flows(&self, groups: &[EndpointGroup]) -> Vec<DataFlow> {
        let mut flows = Vec::new();
        for producer in groups.iter().filter(|g| !g.produces.is_empty()) {
            for field in &producer.produces {
                for consumer in groups {
                    if std::ptr::eq(producer, consumer) {
                        continue;
                    }
                    if let Some(location) = matches_consumer_slot(field, consumer) {
                        flows.push(DataFlow {
                            producer: format!("{} {}", producer.method, producer.normalized_path),
                            producer_field: field.clone(),
                            consumer: format!("{} {}", consumer.method, consumer.normalized_path),
                            consumer_location: location.0,
                            consumer_field: location.1,
                        });
                    }
                }
            }
        }
        flows
    }

    fn classify_api_style(&self, groups: &[EndpointGroup]) -> ApiStyle {
        let graphql_count = groups
            .iter()
            .filter(|g| {
                let lower = g.normalized_path.to_ascii_lowercase();
                lower.contains("/graphql") || lower.ends_with("/gql")
            })
            .count();
        if groups.is_empty() {
            return ApiStyle::Mixed;
        }
        if graphql_count * 2 > groups.len() {
            return ApiStyle::Graphql;
        }

        let mut rest_signals = 0usize;
        let mut rpc_signals = 0usize;
        for g in groups {
            let has_param = g.normalized_path.contains('{');
            if has_param && matches!(g.method.as_str(), "GET" | "PUT" | "DELETE" | "PATCH") {
                rest_signals += 1;
            }
            if let Some(last_segment) = g.normalized_path.rsplit('/').find(|s| !s.is_empty()) {
                if g.method == "POST" && RPC_VERB_RE.is_match(last_segment) {
                    rpc_signals += 1;
                }
            }
        }
        if rest_signals == 0 && rpc_signals == 0 {
            ApiStyle::Mixed
        } else if rest_signals >= rpc_signals * 2 {
            ApiStyle::Rest
        } else if rpc_signals >= rest_signals * 2 {
            ApiStyle::Rpc
        } else {
            ApiStyle::Mixed
        }
    }

    fn detect_versioning(&self, groups: &[EndpointGroup], api_data: &ApiData) -> VersioningPattern {
        if groups
            .iter()
            .any(|g| g.normalized_path.split('/').any(|s| VERSION_SEGMENT_RE.is_match(s)))
        {
            return VersioningPattern::Path;
        }
        let header_hit = api_data.requests.iter().any(|r| {
            r.request_headers.iter().any(|(k, _)| {
                matches!(
                    k.to_ascii_lowercase().as_str(),
                    "accept-version" | "api-version" | "x-api-version"
                )
            })
        });
        if header_hit {
            return VersioningPattern::Header;
        }
        let query_hit = groups.iter().any(|g| {
            g.query_params
                .iter()
                .any(|q| matches!(q.name.as_str(), "version" | "api_version"))
        });
        if query_hit {
            return VersioningPattern::Query;
        }
        VersioningPattern::None
    }

    fn gap_suggestions(&self, entities: &[Entity], groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let mut out = Vec::new();
        for entity in entities {
            if entity.endpoints.len() == 1 {
                if let Some(g) = groups
                    .iter()
                    .find(|g| format!("{} {}", g.method, g.normalized_path) == entity.endpoints[0])
                {
                    if g.method == "GET" {
                        for (method, reason) in [
                            ("POST", "lone GET resource, suggesting a create counterpart"),
                            ("PUT", "lone GET resource, suggesting an update counterpart"),
                            ("DELETE", "lone GET resource, suggesting a delete counterpart"),
                        ] {
                            out.push(Suggestion {
                                method: method.to_string(),
                                path: g.normalized_path.clone(),
                                reason: reason.to_string(),
                                confidence: 0.4,
                            });
                        }
                    }
                }
            }
        }
        out
    }

    fn compute_confidence(
        &self,
        entities: &[Entity],
        groups: &[EndpointGroup],
        auth_flows: &[AuthFlow],
        api_data: &ApiData,
        data_flows: &[DataFlow],
        has_raw_bodies: bool,
    ) -> Confidence {
        let entities_score = if entities.is_empty() {
            0.0
        } else {
            let total_fields: usize = entities.iter().map(|e| e.fields.len()).sum();
            let avg_fields = total_fields as f64 / entities.len() as f64;
            let avg_endpoints = entities.iter().map(|e| e.endpoints.len()).sum::<usize>() as f64
                / entities.len() as f64;
            let mut score = 0.3 + 0.05 * avg_fields;
            if avg_endpoints > 2.0 {
                score += 0.15;
            }
            let with_schema = groups
                .iter()
                .filter(|g| !matches!(g.response_body_schema, TypeSummary::Unknown))
                .count();
            let coverage_ratio = if groups.is_empty() {
                0.0
            } else {
                with_schema as f64 / groups.len() as f64
            };
            if coverage_ratio < 0.3 {
                score *= 0.6;
            }
            score.clamp(0.0, 1.0)
        };

        let auth_score = if auth_flows.is_empty() {
            if !api_data.auth_headers.is_empty() && api_data.auth_method != crate::types::AuthMethod::None {
                0.3
            } else if !api_data.auth_headers.is_empty() {
                0.2
            } else {
                0.5
            }
        } else {
            let mut score = 0.5;
            if auth_flows.iter().any(|f| !f.produced_tokens.is_empty()) {
                score += 0.2;
            }
            if auth_flows.iter().any(|f| !f.consumed_by.is_empty()) {
                score += 0.2;
            }
            if auth_flows.iter().any(|f| f.refresh_endpoint.is_some()) {
                score += 0.1;
            }
            score
        };

        let data_flows_score = if groups.len() <= 2 {
            0.5
        } else {
            let mut score = 0.4 + 0.05 * data_flows.len() as f64;
            if has_raw_bodies {
                score += 0.15;
            }
            score.clamp(0.0, 1.0)
        };

        let avg_requests_per_group = if groups.is_empty() {
            0.0
        } else {
            groups.iter().map(|g| g.example_count).sum::<usize>() as f64 / groups.len() as f64
        };
        let has_success = api_data.requests.iter().any(|r| r.status < 400);
        let has_error = api_data.requests.iter().any(|r| r.status >= 400);
        let mut coverage_score = 0.2 + 0.1 * avg_requests_per_group;
        if has_raw_bodies {
            coverage_score += 0.15;
        }
        if has_success && has_error {
            coverage_score += 0.1;
        }
        let coverage_score = coverage_score.clamp(0.0, 1.0);

        let round = |v: f64| (v * 100.0).round() / 100.0;
        let entities_r = round(entities_score);
        let auth_r = round(auth_score.clamp(0.0, 1.0));
        let data_flows_r = round(data_flows_score);
        let coverage_r = round(coverage_score);
        let overall = round((entities_r + auth_r + data_flows_r + coverage_r) / 4.0);

        Confidence {
            entities: entities_r,
            auth: auth_r,
            data_flows: data_flows_r,
            coverage: coverage_r,
            overall,
        }
    }

    fn compose_summary(
        &self,
        api_data: &ApiData,
        entities: &[Entity],
        auth_flows: &[AuthFlow],
        data_flows: &[DataFlow],
        api_style: ApiStyle,
        versioning: VersioningPattern,
        confidence: &Confidence,
    ) -> String {
        let style_label = match api_style {
            ApiStyle::Rest => "a REST-style",
            ApiStyle::Graphql => "a GraphQL",
            ApiStyle::Rpc => "an RPC-style",
            ApiStyle::Mixed => "a mixed-style",
        };
        let version_label = match versioning {
            VersioningPattern::Path => "path-based versioning",
            VersioningPattern::Header => "header-based versioning",
            VersioningPattern::Query => "query-based versioning",
            VersioningPattern::None => "no detected versioning",
        };
        format!(
            "{} exposes {style_label} API with {} endpoint group(s) across {} entit{}, using {} and {} ({} method). {} auth flow(s) and {} data flow(s) were traced; overall confidence {:.2}.",
            api_data.service,
            api_data.endpoint_groups.len(),
            entities.len(),
            if entities.len() == 1 { "y" } else { "ies" },
            api_data.auth_method_label,
            version_label,
            api_data.auth_method_label,
            auth_flows.len(),
            data_flows.len(),
            confidence.overall,
        )
    }
}

fn resource_name(normalized_path: &str) -> String {
    let mut segments: Vec<&str> = normalized_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }
    if let Some(first) = segments.first() {
        if VERSION_SEGMENT_RE.is_match(first) {
            segments.remove(0);
        }
    }
    segments
        .iter()
        .rev()
        .find(|s| !s.starts_with('{'))
        .map(|s| s.to_string())
        .unwrap_or_else(|| "resource".to_string())
}

fn category_covers(categories: &BTreeSet<Category>, verb: &str) -> bool {
    match verb {
        "read" => categories.contains(&Category::Read),
        "create" => categories.contains(&Category::Write),
        "update" => categories.contains(&Category::Write),
        "delete" => categories.contains(&Category::Delete),
        _ => false,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn array_len_of(schema: &TypeSummary) -> Option<usize> {
    match schema {
        TypeSummary::Array { len, .. } => *len,
        _ => None,
    }
}

fn matches_consumer_slot(field: &str, consumer: &EndpointGroup) -> Option<(ConsumerLocation, String)> {
    let field_norm = normalize_name(field);
    for p in &consumer.path_params {
        if names_match(&field_norm, &normalize_name(&p.name)) {
            return Some((ConsumerLocation::Path, p.name.clone()));
        }
    }
    for q in &consumer.query_params {
        if names_match(&field_norm, &normalize_name(&q.name)) {
            return Some((ConsumerLocation::Query, q.name.clone()));
        }
    }
    if let TypeSummary::Object { fields, .. } = &consumer.request_body_schema {
        for name in fields.keys() {
            if names_match(&field_norm, &normalize_name(name)) {
                return Some((ConsumerLocation::Body, name.clone()));
            }
        }
    }
    if field.eq_ignore_ascii_case("token") || field.eq_ignore_ascii_case("accesstoken") {
        if consumer
            .consumes
            .iter()
            .any(|c| c.eq_ignore_ascii_case("authorization"))
        {
            return Some((ConsumerLocation::Header, "Authorization".to_string()));
        }
    }
    None
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '-'], "")
}

fn names_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let shorter_len = a.len().min(b.len());
    if shorter_len < 3 {
        return false;
    }
    a.contains(b) || b.contains(a)
}

fn find_orchestrators(flows: &[DataFlow]) -> Vec<String> {
    let mut producers_by_consumer: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for flow in flows {
        producers_by_consumer
            .entry(flow.consumer.clone())
            .or_default()
            .insert(flow.producer.clone());
    }
    producers_by_consumer
        .into_iter()
        .filter(|(_, producers)| producers.len() >= 2)
        .map(|(consumer, _)| consumer)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_strips_api_and_version_prefix() {
        assert_eq!(resource_name("/api/v1/users/{userId}"), "users");
        assert_eq!(resource_name("/api/v1/users"), "users");
    }

    #[test]
    fn names_match_handles_underscore_variants() {
        assert!(names_match(&normalize_name("user_id"), &normalize_name("userId")));
    }

    #[test]
    fn names_match_rejects_short_substrings() {
        assert!(!names_match("id", "x"));
    }

    fn group_with_response(method: &str, path: &str, response: serde_json::Value) -> EndpointGroup {
        let cfg = crate::config::SchemaConfig::default();
        let schema = crate::schema::SchemaInferrer::new(&cfg).infer(&response);
        EndpointGroup {
            method: method.to_string(),
            normalized_path: path.to_string(),
            description: String::new(),
            category: Category::Read,
            path_params: Vec::new(),
            query_params: Vec::new(),
            request_body_schema: TypeSummary::Unknown,
            response_body_schema: schema,
            example_count: 1,
            produces: Vec::new(),
            consumes: Vec::new(),
            response_summary: String::new(),
            endpoint_id: "abc123abc123".to_string(),
            resource_types: vec![crate::types::ResourceType::Xhr],
        }
    }

    #[test]
    fn extract_entities_unions_field_types_across_groups() {
        let prober_cfg = crate::config::ProberConfig::default();
        let prober = EndpointProber::new(&prober_cfg);
        let analyzer = AgenticAnalyzer::new(&prober);
        let groups = vec![
            group_with_response("GET", "/api/v1/users", serde_json::json!({"id": 1})),
            group_with_response(
                "GET",
                "/api/v1/users/{userId}",
                serde_json::json!({"id": 1.5}),
            ),
        ];
        let entities = analyzer.extract_entities(&groups);
        let user = entities.iter().find(|e| e.name == "User").unwrap();
        let id_field = user.fields.iter().find(|f| f.name == "id").unwrap();
        assert_eq!(id_field.inferred_type, TypeSummary::Mixed);
        assert_eq!(id_field.seen_in.len(), 2);
    }

    fn request_with_response_headers(headers: Vec<(String, String)>) -> crate::types::ParsedRequest {
        crate::types::ParsedRequest {
            method: "GET".to_string(),
            url: "https://api.acme.com/api/v1/widgets".to_string(),
            host: "api.acme.com".to_string(),
            raw_path: "/api/v1/widgets".to_string(),
            normalized_path: "/api/v1/widgets".to_string(),
            status: 200,
            response_content_type: None,
            request_json: None,
            response_json: None,
            resource_type: crate::types::ResourceType::Xhr,
            query_params: Vec::new(),
            request_headers: Vec::new(),
            response_headers: headers,
            request_cookies: Vec::new(),
        }
    }

    #[test]
    fn compound_x_ratelimit_header_is_detected_as_signal() {
        let prober_cfg = crate::config::ProberConfig::default();
        let prober = EndpointProber::new(&prober_cfg);
        let analyzer = AgenticAnalyzer::new(&prober);
        let mut api_data = crate::types::ApiData {
            service: "acme".to_string(),
            base_url: "https://api.acme.com".to_string(),
            base_urls: vec!["https://api.acme.com".to_string()],
            auth_method: crate::types::AuthMethod::None,
            auth_method_label: "none".to_string(),
            auth_headers: Default::default(),
            cookies: Default::default(),
            auth_info: Default::default(),
            csrf_provenance: Default::default(),
            requests: Vec::new(),
            endpoints: Default::default(),
            endpoint_groups: Vec::new(),
        };
        api_data.requests.push(request_with_response_headers(vec![(
            "x-ratelimit-requests-limit".to_string(),
            "60".to_string(),
        )]));
        let rate_limits = analyzer.extract_rate_limits(&[], &api_data);
        assert_eq!(rate_limits.len(), 1);
        assert_eq!(rate_limits[0].endpoint, "GET /api/v1/widgets");
    }
}
