//! Pure probe-suggestion generator (spec §4.7).

use crate::config::ProberConfig;
use crate::types::{Category, EndpointGroup, Suggestion};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

const SUB_RESOURCES: &[&str] = &["comments", "settings", "activity", "tags", "attachments", "history"];
const COLLECTION_OPS: &[(&str, &str)] = &[
    ("GET", "/search"),
    ("POST", "/search"),
    ("GET", "/count"),
    ("GET", "/export"),
    ("POST", "/bulk"),
    ("POST", "/batch"),
];
const USER_PROBES: &[&str] = &["/me", "/profile", "/account"];
const DOC_PROBES: &[(&str, &str)] = &[
    ("GET", "/openapi.json"),
    ("GET", "/swagger.json"),
    ("GET", "/api-docs"),
    ("POST", "/graphql"),
];
const UTILITY_PROBES: &[&str] = &["/health", "/status", "/version"];

static VERSION_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^v(\d+)$").unwrap());

/// Pure probe-suggestion generator: `(groups, config) -> suggestions`
/// (spec §4.7). No I/O, deterministic over its inputs.
pub struct EndpointProber<'a> {
    config: &'a ProberConfig,
}

impl<'a> EndpointProber<'a> {
    /// Build a prober bound to the given config.
    pub fn new(config: &'a ProberConfig) -> Self {
        Self { config }
    }

    /// Generate suggestions for the given groupset. `has_auth_material`
    /// gates the user-profile probe strategy (spec §4.7 "if config carries
    /// auth headers or cookies").
    pub fn probe(&self, groups: &[EndpointGroup], has_auth_material: bool) -> Vec<Suggestion> {
        let existing: BTreeSet<(String, String)> = groups
            .iter()
            .map(|g| (g.method.clone(), g.normalized_path.clone()))
            .collect();

        let mut out = Vec::new();
        out.extend(self.crud_completion(groups));
        out.extend(self.sub_resource_probes(groups));
        out.extend(self.collection_ops(groups));
        if has_auth_material {
            out.extend(self.user_probes(groups));
        }
        if !self.config.disable_doc_probes {
            out.extend(self.doc_probes());
        }
        if self.config.aggressive {
            out.extend(self.version_variants(groups));
            out.extend(self.utility_probes(groups));
        }

        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        let mut deduped = Vec::new();
        for s in out {
            let key = (s.method.clone(), s.path.clone());
            if existing.contains(&key) || seen.contains(&key) {
                continue;
            }
            seen.insert(key);
            deduped.push(s);
        }
        deduped.truncate(self.config.max_probes);
        deduped
    }

    fn crud_completion(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let mut by_base: std::collections::BTreeMap<String, BTreeSet<String>> =
            std::collections::BTreeMap::new();
        let mut collection_path_of: std::collections::BTreeMap<String, String> =
            std::collections::BTreeMap::new();
        let mut item_path_of: std::collections::BTreeMap<String, String> =
            std::collections::BTreeMap::new();

        for g in groups {
            let base = base_resource_path(&g.normalized_path);
            by_base.entry(base.clone()).or_default().insert(g.method.clone());
            if g.normalized_path.trim_end_matches('/').ends_with('}') {
                item_path_of.entry(base.clone()).or_insert_with(|| g.normalized_path.clone());
            } else {
                collection_path_of.entry(base.clone()).or_insert_with(|| g.normalized_path.clone());
            }
        }

        let mut out = Vec::new();
        for (base, methods) in &by_base {
            let resource_label = base.rsplit('/').find(|s| !s.is_empty()).unwrap_or("resource");
            if let Some(item_path) = item_path_of.get(base) {
                if !methods.contains("DELETE") {
                    out.push(Suggestion {
                        method: "DELETE".to_string(),
                        path: item_path.clone(),
                        reason: format!("CRUD gap for {}", capitalize_plural(resource_label)),
                        confidence: 0.7,
                    });
                }
                if !methods.contains("PUT") && !methods.contains("PATCH") {
                    out.push(Suggestion {
                        method: "PUT".to_string(),
                        path: item_path.clone(),
                        reason: format!("CRUD gap for {}", capitalize_plural(resource_label)),
                        confidence: 0.6,
                    });
                }
                if !methods.contains("GET") {
                    out.push(Suggestion {
                        method: "GET".to_string(),
                        path: item_path.clone(),
                        reason: format!("CRUD gap for {}", capitalize_plural(resource_label)),
                        confidence: 0.6,
                    });
                }
            }
            if let Some(collection_path) = collection_path_of.get(base) {
                if !methods.contains("POST") {
                    out.push(Suggestion {
                        method: "POST".to_string(),
                        path: collection_path.clone(),
                        reason: format!("CRUD gap for {}", capitalize_plural(resource_label)),
                        confidence: 0.6,
                    });
                }
                if !methods.contains("GET") {
                    out.push(Suggestion {
                        method: "GET".to_string(),
                        path: collection_path.clone(),
                        reason: format!("CRUD gap for {}", capitalize_plural(resource_label)),
                        confidence: 0.6,
                    });
                }
            }
        }
        out
    }

    fn sub_resource_probes(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let mut out = Vec::new();
        for g in groups {
            if !g.normalized_path.trim_end_matches('/').ends_with('}') {
                continue;
            }
            let has_sub_resource = groups.iter().any(|other| {
                other.normalized_path.starts_with(&format!("{}/", g.normalized_path))
            });
            if has_sub_resource {
                continue;
            }
            for sub in SUB_RESOURCES {
                out.push(Suggestion {
                    method: "GET".to_string(),
                    path: format!("{}/{sub}", g.normalized_path),
                    reason: format!("sub-resource probe for {}", g.normalized_path),
                    confidence: 0.3,
                });
            }
        }
        out
    }

    fn collection_ops(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let mut out = Vec::new();
        for g in groups {
            if g.method != "GET" || g.category != Category::Read {
                continue;
            }
            if g.normalized_path.trim_end_matches('/').ends_with('}') {
                continue;
            }
            for (method, suffix) in COLLECTION_OPS {
                out.push(Suggestion {
                    method: method.to_string(),
                    path: format!("{}{suffix}", g.normalized_path.trim_end_matches('/')),
                    reason: format!("collection operation probe for {}", g.normalized_path),
                    confidence: 0.3,
                });
            }
        }
        out
    }

    fn user_probes(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let prefix = most_common_prefix(groups);
        let mut out = Vec::new();
        for probe in USER_PROBES {
            out.push(Suggestion {
                method: "GET".to_string(),
                path: probe.to_string(),
                reason: "auth material observed, suggesting a user-profile endpoint".to_string(),
                confidence: 0.4,
            });
            if !prefix.is_empty() {
                out.push(Suggestion {
                    method: "GET".to_string(),
                    path: format!("{prefix}{probe}"),
                    reason: "auth material observed, suggesting a user-profile endpoint".to_string(),
                    confidence: 0.4,
                });
            }
        }
        out
    }

    fn doc_probes(&self) -> Vec<Suggestion> {
        DOC_PROBES
            .iter()
            .map(|(method, path)| Suggestion {
                method: method.to_string(),
                path: path.to_string(),
                reason: "standard API documentation endpoint probe".to_string(),
                confidence: 0.2,
            })
            .collect()
    }

    fn version_variants(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let mut out = Vec::new();
        let mut seen_versions = BTreeSet::new();
        for g in groups {
            for seg in g.normalized_path.split('/') {
                if let Some(caps) = VERSION_SEGMENT_RE.captures(seg) {
                    let n: i64 = caps[1].parse().unwrap_or(0);
                    if !seen_versions.insert(n) {
                        continue;
                    }
                    for variant in [n - 1, n + 1] {
                        if variant <= 0 {
                            continue;
                        }
                        let new_path = g.normalized_path.replacen(seg, &format!("v{variant}"), 1);
                        out.push(Suggestion {
                            method: g.method.clone(),
                            path: new_path,
                            reason: format!("version variant probe for v{n}"),
                            confidence: 0.2,
                        });
                    }
                }
            }
        }
        out
    }

    fn utility_probes(&self, groups: &[EndpointGroup]) -> Vec<Suggestion> {
        let prefix = most_common_prefix(groups);
        let mut out = Vec::new();
        for probe in UTILITY_PROBES {
            out.push(Suggestion {
                method: "GET".to_string(),
                path: probe.to_string(),
                reason: "utility endpoint probe".to_string(),
                confidence: 0.2,
            });
            if !prefix.is_empty() {
                out.push(Suggestion {
                    method: "GET".to_string(),
                    path: format!("{prefix}{probe}"),
                    reason: "utility endpoint probe".to_string(),
                    confidence: 0.2,
                });
            }
        }
        out
    }
}

/// The normalized path with its trailing `{param}` segment removed, if any —
/// the "base resource path" a CRUD family hangs off of.
fn base_resource_path(normalized_path: &str) -> String {
    let trimmed = normalized_path.trim_end_matches('/');
    if trimmed.ends_with('}') {
        trimmed.rsplit_once('/').map(|(base, _)| base.to_string()).unwrap_or_default()
    } else {
        trimmed.to_string()
    }
}

fn most_common_prefix(groups: &[EndpointGroup]) -> String {
    let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    for g in groups {
        let segments: Vec<&str> = g.normalized_path.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(first) = segments.first() {
            if !first.starts_with('{') {
                *counts.entry(format!("/{first}")).or_insert(0) += 1;
            }
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(prefix, _)| prefix)
        .unwrap_or_default()
}

fn capitalize_plural(resource: &str) -> String {
    let mut chars = resource.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ResourceType, TypeSummary};

    fn group(method: &str, path: &str, category: Category) -> EndpointGroup {
        EndpointGroup {
            method: method.to_string(),
            normalized_path: path.to_string(),
            description: String::new(),
            category,
            path_params: Vec::new(),
            query_params: Vec::new(),
            request_body_schema: TypeSummary::Unknown,
            response_body_schema: TypeSummary::Unknown,
            example_count: 1,
            produces: Vec::new(),
            consumes: Vec::new(),
            response_summary: String::new(),
            endpoint_id: "abc123abc123".to_string(),
            resource_types: vec![ResourceType::Xhr],
        }
    }

    #[test]
    fn suggests_crud_gap_for_users() {
        let cfg = ProberConfig::default();
        let prober = EndpointProber::new(&cfg);
        let groups = vec![
            group("GET", "/api/v1/users", Category::Read),
            group("GET", "/api/v1/users/{userId}", Category::Read),
            group("POST", "/api/v1/users", Category::Write),
        ];
        let suggestions = prober.probe(&groups, false);
        assert!(suggestions
            .iter()
            .any(|s| s.method == "DELETE" && s.path == "/api/v1/users/{userId}"));
        assert!(suggestions
            .iter()
            .any(|s| s.method == "PUT" && s.path == "/api/v1/users/{userId}"));
    }

    #[test]
    fn dedupes_against_existing_groups() {
        let cfg = ProberConfig::default();
        let prober = EndpointProber::new(&cfg);
        let groups = vec![group("GET", "/openapi.json", Category::Read)];
        let suggestions = prober.probe(&groups, false);
        assert!(!suggestions.iter().any(|s| s.path == "/openapi.json"));
    }

    #[test]
    fn respects_max_probes_cap() {
        let mut cfg = ProberConfig::default();
        cfg.max_probes = 3;
        let prober = EndpointProber::new(&cfg);
        let groups = vec![group("GET", "/api/v1/users/{userId}", Category::Read)];
        let suggestions = prober.probe(&groups, false);
        assert!(suggestions.len() <= 3);
    }

    #[test]
    fn aggressive_mode_adds_version_variants() {
        let mut cfg = ProberConfig::default();
        cfg.aggressive = true;
        let prober = EndpointProber::new(&cfg);
        let groups = vec![group("GET", "/api/v2/users", Category::Read)];
        let suggestions = prober.probe(&groups, false);
        assert!(suggestions.iter().any(|s| s.path.contains("/v1/") || s.path.contains("/v3/")));
    }
}
