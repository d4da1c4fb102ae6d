//! Turns captured HTTP traffic into a durable, agent-consumable description
//! of a site's internal API (spec §1-2).
//!
//! This crate is a library, not a process (spec §6 "Exit/error surface").
//! [`analyze`] runs the offline pipeline — noise filtering, HAR parsing,
//! auth/CSRF extraction, endpoint enrichment, and the agentic analysis —
//! over a byte buffer containing a HAR document. [`build_skill`] takes the
//! resulting [`types::ApiData`] and assembles/merges a [`types::SkillPackage`]
//! on disk. The `siteskill` binary (`src/main.rs`) is a thin CLI shell over
//! both.

pub mod analyzer;
pub mod auth;
pub mod config;
pub mod context;
pub mod describe;
pub mod enrich;
pub mod error;
pub mod har;
pub mod noise;
pub mod prober;
pub mod schema;
pub mod skill;
pub mod types;

use auth::{AuthExtractor, MetaToken, StorageToken};
use config::AnalysisConfig;
use context::AnalysisContext;
use describe::{describe, Describer, NoopDescriber};
use enrich::EndpointEnricher;
use error::AnalysisError;
use har::HarParser;
use noise::NoiseFilter;
use prober::EndpointProber;
use error::Warning;
use types::{AgenticAnalysis, ApiData, Exchange, SkillPackage};

/// Everything a caller gets back from one [`analyze`] pass: the enriched
/// API description, the higher-order analysis over it, and any warnings
/// accumulated along the way (spec §7 "per-exchange errors are warnings").
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Normalized, enriched API description.
    pub api_data: ApiData,
    /// Derived entities/flows/suggestions/confidence.
    pub analysis: AgenticAnalysis,
    /// Non-fatal problems encountered along the way.
    pub warnings: Vec<error::Warning>,
}

/// Run the full offline pipeline over already-decoded exchanges (spec §2
/// data-flow: `Exchanges → NoiseFilter → HarParser → AuthExtractor →
/// EndpointEnricher → { AgenticAnalyzer, EndpointProber }`).
///
/// `storage_tokens`/`meta_tokens` are collaborator-supplied (browser
/// storage and `<meta>` tags aren't observable from HAR alone; see spec
/// §4.4). `describer` lets a caller wire an external description refiner
/// through the spec §9 extension point; pass [`NoopDescriber`] for the
/// default heuristic-only behavior.
///
/// `seed_url`, when known, is the primary URL the capture was seeded from
/// (e.g. the page the browser was pointed at); it sharpens `base_url`
/// selection toward same-root-domain hosts (SPEC_FULL §1.1).
///
/// Fails only with [`AnalysisError::NoInternalApi`] when no endpoint groups
/// survive filtering — every other problem is downgraded to a warning and
/// the pass proceeds (spec §7 propagation policy).
pub fn analyze_exchanges(
    exchanges: &[Exchange],
    config: &AnalysisConfig,
    storage_tokens: &[StorageToken],
    meta_tokens: &[MetaToken],
    describer: &dyn Describer,
    seed_url: Option<&str>,
) -> Result<AnalysisOutput, AnalysisError> {
    let noise = NoiseFilter::new(&config.noise);
    let har_parser = HarParser::new(&config.schema);
    let (mut api_data, parse_warnings) = har_parser.parse(exchanges, &noise, seed_url);

    let mut ctx = AnalysisContext::new(api_data.service.clone(), api_data.base_url.clone());
    ctx.absorb(parse_warnings);

    let auth_extractor = AuthExtractor::new(&config.auth);
    auth_extractor.apply(&mut api_data, storage_tokens, meta_tokens);

    let enricher = EndpointEnricher::new(&config.schema);
    let mut groups = enricher.enrich(&api_data.endpoints, &api_data.service);
    for g in &mut groups {
        g.description = describe::heuristic_description(g);
    }
    let groups = describe(groups, describer);

    if groups.is_empty() {
        return Err(AnalysisError::NoInternalApi {
            reason: if exchanges.is_empty() {
                "archive is empty".to_string()
            } else {
                "all exchanges scored as noise or were dropped during filtering".to_string()
            },
        });
    }
    api_data.endpoint_groups = groups;

    let prober = EndpointProber::new(&config.prober);
    let analyzer = analyzer::AgenticAnalyzer::new(&prober);
    let analysis = analyzer.analyze(&api_data);

    Ok(AnalysisOutput {
        api_data,
        analysis,
        warnings: ctx.warnings,
    })
}

/// Convenience wrapper: decode a raw HAR document, then [`analyze_exchanges`]
/// with a no-op describer and no collaborator-supplied storage/meta tokens.
///
/// Fails with [`AnalysisError::InputMalformed`] if the bytes aren't valid
/// HAR at all (spec §7).
pub fn analyze_har(bytes: &[u8], config: &AnalysisConfig) -> Result<AnalysisOutput, AnalysisError> {
    let exchanges = har::decode_har(bytes)?;
    analyze_exchanges(&exchanges, config, &[], &[], &NoopDescriber, None)
}

/// Build (and merge-with-prior) a skill package from already-enriched
/// `api_data`, without writing it to disk. Call [`skill::write_package`]
/// to persist the result. Also returns any warnings raised while building
/// (currently just a corrupt-prior-package notice, spec §7 `PackageConflict`).
///
/// Fails with [`AnalysisError::NoInternalApi`] if `api_data.endpoint_groups`
/// is empty — there is nothing to publish (spec §4.8, §7).
pub fn build_skill(
    api_data: &ApiData,
    output_dir: &std::path::Path,
) -> Result<(SkillPackage, Vec<Warning>), AnalysisError> {
    skill::SkillBuilder::new(api_data).build(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ResourceType, TypeSummary};

    fn exchange(method: &str, url: &str, status: u16, response_json: Option<serde_json::Value>) -> Exchange {
        Exchange {
            method: method.to_string(),
            url: url.to_string(),
            request_headers: Vec::new(),
            request_cookies: Vec::new(),
            request_body: None,
            status,
            response_headers: Vec::new(),
            response_body: response_json
                .map(|v| ("application/json".to_string(), v.to_string())),
            resource_type: ResourceType::Xhr,
        }
    }

    #[test]
    fn empty_archive_is_no_internal_api() {
        let config = AnalysisConfig::default();
        let err = analyze_exchanges(&[], &config, &[], &[], &NoopDescriber, None).unwrap_err();
        assert!(matches!(err, AnalysisError::NoInternalApi { .. }));
    }

    #[test]
    fn noise_only_archive_is_no_internal_api() {
        let config = AnalysisConfig::default();
        let exchanges = vec![exchange(
            "POST",
            "https://host.example.com/tracking/events",
            200,
            Some(serde_json::json!({})),
        )];
        let err = analyze_exchanges(&exchanges, &config, &[], &[], &NoopDescriber, None).unwrap_err();
        assert!(matches!(err, AnalysisError::NoInternalApi { .. }));
    }

    #[test]
    fn single_exchange_yields_one_group_with_no_auth() {
        let config = AnalysisConfig::default();
        let exchanges = vec![exchange(
            "GET",
            "https://api.acme.com/api/v1/users/4231",
            200,
            Some(serde_json::json!({"id": 4231, "name": "A"})),
        )];
        let out = analyze_exchanges(&exchanges, &config, &[], &[], &NoopDescriber, None).unwrap();
        assert_eq!(out.api_data.endpoint_groups.len(), 1);
        assert_eq!(out.api_data.auth_method, types::AuthMethod::None);
        let group = &out.api_data.endpoint_groups[0];
        assert_eq!(group.normalized_path, "/api/v1/users/{userId}");
        assert!(group.produces.contains(&"id".to_string()));
        assert!(!matches!(group.response_body_schema, TypeSummary::Unknown));
    }

    #[test]
    fn jwt_storage_token_promotes_to_bearer_end_to_end() {
        let config = AnalysisConfig::default();
        let exchanges = vec![exchange(
            "GET",
            "https://api.acme.com/me",
            200,
            Some(serde_json::json!({"id": 1})),
        )];
        let storage = vec![StorageToken {
            kind: types::ProvenanceKind::LocalStorage,
            key: "access_token".to_string(),
            value: "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.sig".to_string(),
        }];
        let out = analyze_exchanges(&exchanges, &config, &storage, &[], &NoopDescriber, None).unwrap();
        assert_eq!(out.api_data.auth_method, types::AuthMethod::Bearer);
        assert_eq!(
            out.api_data.auth_headers.get("authorization").unwrap(),
            "Bearer eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.sig"
        );
    }

    #[test]
    fn build_skill_from_analysis_output_round_trips() {
        let config = AnalysisConfig::default();
        let exchanges = vec![exchange(
            "GET",
            "https://api.acme.com/api/v1/users",
            200,
            Some(serde_json::json!([{"id": 1}, {"id": 2}])),
        )];
        let out = analyze_exchanges(&exchanges, &config, &[], &[], &NoopDescriber, None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let (package, warnings) = build_skill(&out.api_data, dir.path()).unwrap();
        assert_eq!(package.version_hash.len(), 8);
        assert_eq!(package.endpoints_ref.len(), 1);
        assert!(warnings.is_empty());
    }
}
