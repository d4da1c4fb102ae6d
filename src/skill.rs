//! Skill package assembly, merge-with-prior, and atomic disk write
//! (spec §4.8, §5, §6; `scripts/examples.sh` per SPEC_FULL §1.1).

use crate::error::{AnalysisError, Warning};
use crate::types::{ApiData, Category, EndpointGroup, EndpointRef, SkillPackage};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

const HASH_PLACEHOLDER: &str = "PLACEHOLDER";

static SKILL_MD_ENDPOINT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"`(GET|POST|PUT|PATCH|DELETE|HEAD) (\S+)`").unwrap()
});

/// Everything read back from a prior package directory, when one exists and
/// parses cleanly.
struct PriorPackage {
    skill_md: String,
    endpoints_ref: Vec<EndpointRef>,
    version_hash: Option<String>,
}

/// Assembles a stable, mergeable [`SkillPackage`] from enriched [`ApiData`]
/// (spec §4.8).
pub struct SkillBuilder<'a> {
    api_data: &'a ApiData,
}

impl<'a> SkillBuilder<'a> {
    /// Build over the given enriched `ApiData` (its `endpoint_groups` must
    /// already be populated by [`crate::enrich::EndpointEnricher`]).
    pub fn new(api_data: &'a ApiData) -> Self {
        Self { api_data }
    }

    /// Build a package, optionally merging with a prior one loaded from
    /// `output_dir/<service>`. Also returns any warnings raised along the
    /// way — currently just a corrupt-prior-package notice (spec §7
    /// `PackageConflict`: treated as "no prior", but still surfaced).
    pub fn build(&self, output_dir: &Path) -> Result<(SkillPackage, Vec<Warning>), AnalysisError> {
        if self.api_data.endpoint_groups.is_empty() {
            return Err(AnalysisError::NoInternalApi {
                reason: "no endpoint groups survived filtering".to_string(),
            });
        }

        let service_dir = output_dir.join(&self.api_data.service);
        let mut warnings = Vec::new();
        let prior = match load_prior(&service_dir) {
            PriorLoad::Ok(p) => Some(p),
            PriorLoad::Absent => None,
            PriorLoad::Corrupt(cause) => {
                let path = service_dir.display().to_string();
                tracing::warn!(%path, %cause, "existing skill package is corrupt, treating as absent");
                warnings.push(Warning::PackageConflict { path, cause });
                None
            }
        };

        let groups = &self.api_data.endpoint_groups;
        let current_keys: std::collections::BTreeSet<(String, String)> = groups
            .iter()
            .map(|g| (g.method.clone(), g.normalized_path.clone()))
            .collect();

        let mut endpoints_ref: Vec<EndpointRef> = groups
            .iter()
            .map(|g| EndpointRef {
                method: g.method.clone(),
                normalized_path: g.normalized_path.clone(),
                endpoint_id: g.endpoint_id.clone(),
            })
            .collect();

        let mut carried_over: Vec<EndpointRef> = Vec::new();
        if let Some(prior) = &prior {
            for entry in &prior.endpoints_ref {
                let key = (entry.method.clone(), entry.normalized_path.clone());
                if !current_keys.contains(&key) {
                    endpoints_ref.push(entry.clone());
                    carried_over.push(entry.clone());
                }
            }
        }
        endpoints_ref.sort_by(|a, b| {
            a.method
                .cmp(&b.method)
                .then_with(|| a.normalized_path.cmp(&b.normalized_path))
        });

        let skill_md = compose_skill_md(self.api_data, groups, &carried_over);
        let api_template = compose_api_template(groups);
        let auth_json = compose_auth_json(self.api_data);
        let examples_sh = compose_examples_sh(self.api_data, groups);
        let reference_md = compose_reference_md(groups);

        let version_hash = compute_version_hash(&skill_md, &api_template, &endpoints_ref);
        let skill_md = skill_md.replacen(HASH_PLACEHOLDER, &version_hash, 1);

        let changed = match &prior {
            Some(p) => p.version_hash.as_deref() != Some(version_hash.as_str()),
            None => true,
        };
        let diff = compute_diff(prior.as_ref(), groups.len(), changed);

        Ok((
            SkillPackage {
                skill_md,
                auth_json,
                api_template,
                examples_sh,
                reference_md,
                endpoints_ref,
                version_hash,
                diff,
                changed,
            },
            warnings,
        ))
    }
}

/// Outcome of looking for a prior package directory: genuinely absent (fresh
/// publish, no warning), present and readable, or present but unparseable
/// (spec §7 `PackageConflict` — treated as absent, but warned about).
enum PriorLoad {
    Absent,
    Ok(PriorPackage),
    Corrupt(String),
}

fn load_prior(service_dir: &Path) -> PriorLoad {
    let skill_md_path = service_dir.join("SKILL.md");
    let endpoints_path = service_dir.join("references").join("ENDPOINTS.json");

    let skill_md = match fs::read_to_string(&skill_md_path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return PriorLoad::Absent,
        Err(e) => return PriorLoad::Corrupt(format!("reading SKILL.md: {e}")),
    };

    if !skill_md.starts_with("---\n") {
        return PriorLoad::Corrupt("SKILL.md is missing its frontmatter delimiter".to_string());
    }

    let version_hash = extract_frontmatter_field(&skill_md, "versionHash");
    if version_hash.is_none() {
        return PriorLoad::Corrupt("SKILL.md frontmatter has no versionHash field".to_string());
    }

    let endpoints_ref: Vec<EndpointRef> = fs::read_to_string(&endpoints_path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| parse_skill_md_endpoints(&skill_md));

    PriorLoad::Ok(PriorPackage {
        skill_md,
        endpoints_ref,
        version_hash,
    })
}

/// Recover `{method, path}` pairs from `` `METHOD /path` `` occurrences in a
/// prior `SKILL.md`, used when `ENDPOINTS.json` is missing or corrupt.
fn parse_skill_md_endpoints(skill_md: &str) -> Vec<EndpointRef> {
    SKILL_MD_ENDPOINT_LINE_RE
        .captures_iter(skill_md)
        .map(|caps| EndpointRef {
            method: caps[1].to_string(),
            normalized_path: caps[2].to_string(),
            endpoint_id: String::new(),
        })
        .collect()
}

fn extract_frontmatter_field(skill_md: &str, field: &str) -> Option<String> {
    let needle = format!("{field}:");
    skill_md.lines().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix(&needle)
            .map(|v| v.trim().trim_matches('"').to_string())
    })
}

fn compose_skill_md(api_data: &ApiData, groups: &[EndpointGroup], carried_over: &[EndpointRef]) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("name: {}\n", api_data.service));
    out.push_str(&format!(
        "description: Internal API surface captured for {}\n",
        api_data.service
    ));
    out.push_str("metadata:\n");
    out.push_str("  version: 1.0\n");
    out.push_str(&format!("  versionHash: {HASH_PLACEHOLDER}\n"));
    out.push_str(&format!("  baseUrl: {}\n", api_data.base_url));
    out.push_str(&format!("  authMethod: {}\n", api_data.auth_method_label));
    out.push_str(&format!("  endpointCount: {}\n", groups.len()));
    out.push_str("  apiType: rest\n");
    out.push_str("---\n\n");

    out.push_str("## About\n\n");
    out.push_str(&format!(
        "This skill describes the internal API observed for `{}`, reconstructed from captured traffic.\n\n",
        api_data.service
    ));

    out.push_str("## When to Use\n\n");
    out.push_str("Use this skill when an agent needs to call this site's internal API directly instead of driving the UI.\n\n");

    out.push_str("## Quick Start\n\n");
    out.push_str("```js\n");
    out.push_str(&format!("import {{ Client }} from './scripts/api.js';\n\nconst client = new Client('{}');\n", api_data.base_url));
    out.push_str("```\n\n");

    out.push_str("## Captured Authentication\n\n");
    out.push_str(&format!(
        "- Auth method: {}\n- Headers observed: {}\n- Cookies observed: {}\n\n",
        api_data.auth_method_label,
        api_data.auth_headers.len(),
        api_data.cookies.len()
    ));

    out.push_str("## Internal Endpoints\n\n");
    for g in groups {
        out.push_str(&format!(
            "- `{} {}` — {}",
            g.method, g.normalized_path, g.response_summary
        ));
        if !g.description.is_empty() {
            out.push_str(&format!(" ({})", g.description));
        }
        out.push('\n');
    }
    for entry in carried_over {
        out.push_str(&format!(
            "- `{} {}` — previously observed, not seen in this capture\n",
            entry.method, entry.normalized_path
        ));
    }
    out.push('\n');

    out.push_str("## Error Handling\n\n");
    out.push_str("Endpoints may return non-2xx statuses; see `analysis.errors` in the traffic-analysis output for the observed taxonomy per endpoint.\n");

    out
}

fn compose_api_template(groups: &[EndpointGroup]) -> String {
    let mut out = String::new();
    out.push_str("// Generated typed client template. Path-parameter substitution is textual.\n");
    out.push_str("export class Client {\n");
    out.push_str("  constructor(baseUrl) { this.baseUrl = baseUrl; }\n\n");
    out.push_str("  get(path) { return fetch(this.baseUrl + path); }\n");
    out.push_str("  post(path, body) { return fetch(this.baseUrl + path, { method: 'POST', body: JSON.stringify(body) }); }\n");
    out.push_str("  put(path, body) { return fetch(this.baseUrl + path, { method: 'PUT', body: JSON.stringify(body) }); }\n");
    out.push_str("  delete(path) { return fetch(this.baseUrl + path, { method: 'DELETE' }); }\n\n");

    let mut used_names: BTreeMap<String, usize> = BTreeMap::new();
    for g in groups {
        let base_name = method_name(g);
        let count = used_names.entry(base_name.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            base_name
        } else {
            format!("{base_name}_{count}")
        };
        let params: Vec<String> = g.path_params.iter().map(|p| p.name.clone()).collect();
        let call_args = params.join(", ");
        let mut path_expr = g.normalized_path.clone();
        for p in &g.path_params {
            path_expr = path_expr.replace(&format!("{{{}}}", p.name), &format!("${{{}}}", p.name));
        }
        let verb_call = match g.method.as_str() {
            "GET" | "HEAD" => format!("this.get(`{path_expr}`)"),
            "DELETE" => format!("this.delete(`{path_expr}`)"),
            _ if params.is_empty() => format!("this.post(`{path_expr}`, body)"),
            _ => format!("this.post(`{path_expr}`, body)"),
        };
        let args = if params.is_empty() {
            "body".to_string()
        } else {
            format!("{call_args}, body")
        };
        out.push_str(&format!("  {name}({args}) {{ return {verb_call}; }}\n"));
    }
    out.push_str("}\n");
    out
}

fn method_name(group: &EndpointGroup) -> String {
    let verb = match group.method.as_str() {
        "GET" => "get",
        "POST" => "create",
        "PUT" | "PATCH" => "update",
        "DELETE" => "delete",
        "HEAD" => "head",
        _ => "call",
    };
    let resource = group
        .normalized_path
        .split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .last()
        .unwrap_or("resource");
    format!("{verb}{}", capitalize(resource))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn compose_auth_json(api_data: &ApiData) -> String {
    #[derive(serde::Serialize)]
    struct AuthJson<'a> {
        service: &'a str,
        base_url: &'a str,
        auth_method: String,
        headers: &'a BTreeMap<String, String>,
        cookies: &'a BTreeMap<String, String>,
        #[serde(rename = "localStorage")]
        local_storage: &'a BTreeMap<String, String>,
        #[serde(rename = "sessionStorage")]
        session_storage: BTreeMap<String, String>,
        #[serde(rename = "metaTokens")]
        meta_tokens: BTreeMap<String, String>,
        #[serde(rename = "csrfProvenance")]
        csrf_provenance: Vec<crate::types::CsrfProvenance>,
    }

    let doc = AuthJson {
        service: &api_data.service,
        base_url: &api_data.base_url,
        auth_method: auth_method_slug(api_data.auth_method),
        headers: &api_data.auth_headers,
        cookies: &api_data.cookies,
        local_storage: &api_data.auth_info,
        session_storage: BTreeMap::new(),
        meta_tokens: BTreeMap::new(),
        csrf_provenance: api_data.csrf_provenance.values().cloned().collect(),
    };
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

/// Curl-based quickstart script, grounded on the teacher's
/// `generate_examples_sh` (SPEC_FULL §1.1).
fn compose_examples_sh(api_data: &ApiData, groups: &[EndpointGroup]) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(&format!("# Example requests for {}\n", api_data.service));
    out.push_str(&format!("BASE_URL=\"{}\"\n\n", api_data.base_url));

    let mut by_count: Vec<&EndpointGroup> = groups.iter().collect();
    by_count.sort_by(|a, b| b.example_count.cmp(&a.example_count));

    for g in by_count.into_iter().take(20) {
        out.push_str(&format!("# {} {}\n", g.method, g.normalized_path));
        out.push_str(&format!("curl -X {} \"$BASE_URL{}\"", g.method, g.normalized_path));
        if let Some(auth) = api_data.auth_headers.get("authorization") {
            out.push_str(&format!(" \\\n  -H \"Authorization: {auth}\""));
        }
        for (name, _) in api_data.cookies.iter().take(1) {
            out.push_str(&format!(" \\\n  -H \"Cookie: {name}=$SESSION_COOKIE\""));
        }
        out.push_str("\n\n");
    }
    out
}

fn compose_reference_md(groups: &[EndpointGroup]) -> String {
    let mut out = String::new();
    out.push_str("# Endpoint Reference\n\n");
    for g in groups {
        out.push_str(&format!("## `{} {}`\n\n", g.method, g.normalized_path));
        out.push_str(&format!("- Category: {:?}\n", g.category));
        out.push_str(&format!("- Observations: {}\n", g.example_count));
        out.push_str(&format!("- Response: {}\n", g.response_summary));
        if !g.path_params.is_empty() {
            out.push_str("- Path params:\n");
            for p in &g.path_params {
                out.push_str(&format!("  - `{}` (e.g. `{}`)\n", p.name, p.example));
            }
        }
        if !g.query_params.is_empty() {
            out.push_str("- Query params:\n");
            for q in &g.query_params {
                out.push_str(&format!("  - `{}` (e.g. `{}`)\n", q.name, q.example));
            }
        }
        out.push('\n');
    }
    out
}

fn compute_version_hash(skill_md: &str, api_template: &str, endpoints_ref: &[EndpointRef]) -> String {
    let endpoints_json = serde_json::to_string(endpoints_ref).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(skill_md.as_bytes());
    hasher.update(api_template.as_bytes());
    hasher.update(endpoints_json.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")[..8].to_string()
}

/// `+N new endpoint(s)` when the count grew, `Updated (N endpoints)` when
/// the count held but the generated content actually differs, else no-op
/// (spec §4.8 step 7) — `changed` is the same version-hash comparison the
/// caller already made, so an unchanged rebuild at equal count reports `None`
/// rather than a spurious "Updated".
fn compute_diff(prior: Option<&PriorPackage>, current_count: usize, changed: bool) -> Option<String> {
    let prior = prior?;
    let prior_count = prior.endpoints_ref.len();
    if current_count > prior_count {
        Some(format!("+{} new endpoint(s)", current_count - prior_count))
    } else if current_count == prior_count && changed {
        Some(format!("Updated ({current_count} endpoints)"))
    } else {
        None
    }
}

/// Write a built package to `output_dir/<service>/...` under a per-service
/// advisory lock, atomically (temp file + rename), per spec §5.
///
/// Only `auth.json` is rewritten unconditionally; everything else is
/// skipped when `package.changed` is false.
pub fn write_package(output_dir: &Path, service: &str, package: &SkillPackage) -> io::Result<()> {
    let service_dir = output_dir.join(service);
    fs::create_dir_all(&service_dir)?;
    fs::create_dir_all(service_dir.join("scripts"))?;
    fs::create_dir_all(service_dir.join("references"))?;

    let lock_path = service_dir.join(".lock");
    let _lock = AdvisoryLock::acquire(&lock_path)?;

    if package.changed {
        write_atomic(&service_dir.join("SKILL.md"), package.skill_md.as_bytes())?;
        write_atomic(&service_dir.join("scripts").join("api.js"), package.api_template.as_bytes())?;
        write_atomic(&service_dir.join("scripts").join("examples.sh"), package.examples_sh.as_bytes())?;
        write_atomic(
            &service_dir.join("references").join("REFERENCE.md"),
            package.reference_md.as_bytes(),
        )?;
        let endpoints_json = serde_json::to_string_pretty(&package.endpoints_ref)?;
        write_atomic(
            &service_dir.join("references").join("ENDPOINTS.json"),
            endpoints_json.as_bytes(),
        )?;
    }
    write_atomic(&service_dir.join("auth.json"), package.auth_json.as_bytes())?;

    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

/// Per-service advisory lock using a sibling `.lock` file created with
/// `create_new`, since no cross-platform flock crate is in use here.
/// Released (the lock file removed) on drop.
struct AdvisoryLock {
    path: std::path::PathBuf,
}

impl AdvisoryLock {
    fn acquire(path: &Path) -> io::Result<Self> {
        fs::OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for AdvisoryLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthMethod, ResourceType, TypeSummary};
    use std::collections::BTreeMap;

    fn api_data_with_one_group() -> ApiData {
        let group = EndpointGroup {
            method: "GET".to_string(),
            normalized_path: "/api/v1/users/{userId}".to_string(),
            description: String::new(),
            category: Category::Read,
            path_params: vec![crate::types::PathParam {
                name: "userId".to_string(),
                example: "4231".to_string(),
                inferred_type: TypeSummary::Int,
            }],
            query_params: Vec::new(),
            request_body_schema: TypeSummary::Unknown,
            response_body_schema: TypeSummary::Unknown,
            example_count: 1,
            produces: vec!["id".to_string()],
            consumes: vec!["userId".to_string()],
            response_summary: "object".to_string(),
            endpoint_id: "abc123abc123".to_string(),
            resource_types: vec![ResourceType::Xhr],
        };
        ApiData {
            service: "acme".to_string(),
            base_url: "https://api.acme.com".to_string(),
            base_urls: vec!["https://api.acme.com".to_string()],
            auth_method: AuthMethod::None,
            auth_method_label: "none".to_string(),
            auth_headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            auth_info: BTreeMap::new(),
            csrf_provenance: BTreeMap::new(),
            requests: Vec::new(),
            endpoints: BTreeMap::new(),
            endpoint_groups: vec![group],
        }
    }

    #[test]
    fn build_without_prior_succeeds() {
        let api_data = api_data_with_one_group();
        let builder = SkillBuilder::new(&api_data);
        let dir = tempfile::tempdir().unwrap();
        let (package, warnings) = builder.build(dir.path()).unwrap();
        assert_eq!(package.version_hash.len(), 8);
        assert!(!package.skill_md.contains(HASH_PLACEHOLDER));
        assert_eq!(package.endpoints_ref.len(), 1);
        assert!(package.changed);
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_groupset_is_no_internal_api() {
        let mut api_data = api_data_with_one_group();
        api_data.endpoint_groups.clear();
        let builder = SkillBuilder::new(&api_data);
        let dir = tempfile::tempdir().unwrap();
        let err = builder.build(dir.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoInternalApi { .. }));
    }

    #[test]
    fn rebuild_is_idempotent_in_hash() {
        let api_data = api_data_with_one_group();
        let builder = SkillBuilder::new(&api_data);
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = builder.build(dir.path()).unwrap();
        write_package(dir.path(), "acme", &first).unwrap();
        let (second, warnings) = builder.build(dir.path()).unwrap();
        assert_eq!(first.version_hash, second.version_hash);
        assert!(!second.changed);
        assert_eq!(second.diff, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn merge_keeps_prior_endpoint_not_re_observed() {
        let api_data = api_data_with_one_group();
        let builder = SkillBuilder::new(&api_data);
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = builder.build(dir.path()).unwrap();
        write_package(dir.path(), "acme", &first).unwrap();

        let mut second_api_data = api_data_with_one_group();
        second_api_data.endpoint_groups[0].normalized_path = "/api/v1/orders".to_string();
        second_api_data.endpoint_groups[0].endpoint_id = "def456def456".to_string();
        second_api_data.endpoint_groups[0].path_params.clear();
        let second_builder = SkillBuilder::new(&second_api_data);
        let (second, _) = second_builder.build(dir.path()).unwrap();
        assert!(second
            .endpoints_ref
            .iter()
            .any(|e| e.normalized_path == "/api/v1/users/{userId}"));
        assert!(second
            .endpoints_ref
            .iter()
            .any(|e| e.normalized_path == "/api/v1/orders"));
    }

    #[test]
    fn corrupt_prior_package_is_treated_as_absent_with_warning() {
        let api_data = api_data_with_one_group();
        let dir = tempfile::tempdir().unwrap();
        let service_dir = dir.path().join("acme");
        fs::create_dir_all(service_dir.join("references")).unwrap();
        fs::write(service_dir.join("SKILL.md"), "not a skill package at all").unwrap();

        let builder = SkillBuilder::new(&api_data);
        let (package, warnings) = builder.build(dir.path()).unwrap();
        assert!(package.changed);
        assert_eq!(package.diff, None);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::PackageConflict { cause, .. } if cause.contains("frontmatter")
        ));
    }
}
