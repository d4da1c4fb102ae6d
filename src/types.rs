//! Data model (spec §3): HAR wire shapes, the normalized pipeline types, and
//! the artifacts the pipeline ultimately produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// HAR wire format (spec §6, shape resolved in SPEC_FULL §4.3.1)
// ---------------------------------------------------------------------------

/// Root of a HAR 1.2 document: `{log: {entries: [...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Har {
    /// The single top-level `log` object.
    pub log: HarLog,
}

/// `log` object: just the entry list, plus whatever else HAR carries that we ignore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarLog {
    /// One entry per captured HTTP round-trip.
    pub entries: Vec<HarEntry>,
}

/// One HAR entry: a request/response pair plus our own `resourceType` extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarEntry {
    /// The request side.
    pub request: HarRequest,
    /// The response side.
    pub response: HarResponse,
    /// Non-standard field some capture tools attach; HAR itself has no
    /// resource-type concept. Defaults to `other` when absent.
    #[serde(default, alias = "resourceType", alias = "_resourceType")]
    pub resource_type: Option<String>,
    /// ISO-8601 capture timestamp, when present.
    #[serde(default)]
    pub started_date_time: Option<String>,
}

/// A HAR request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarRequest {
    /// HTTP method, uppercase.
    pub method: String,
    /// Full absolute URL.
    pub url: String,
    /// Ordered header list (HAR represents headers as a list, not a map).
    #[serde(default)]
    pub headers: Vec<HarNameValue>,
    /// Query-string key/value pairs, already split out of `url`.
    #[serde(default)]
    pub query_string: Vec<HarNameValue>,
    /// Cookies sent with the request.
    #[serde(default)]
    pub cookies: Vec<HarNameValue>,
    /// Request body, when present.
    #[serde(default)]
    pub post_data: Option<HarPostData>,
}

/// A HAR response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status line text, when present.
    #[serde(default)]
    pub status_text: Option<String>,
    /// Ordered header list.
    #[serde(default)]
    pub headers: Vec<HarNameValue>,
    /// Response body, when present.
    #[serde(default)]
    pub content: Option<HarContent>,
}

/// A HAR `{name, value}` pair — used for headers, query string, and cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarNameValue {
    /// Field name, as captured (preserve case for display; lookups are
    /// case-insensitive at the call site).
    pub name: String,
    /// Field value.
    #[serde(default)]
    pub value: String,
}

/// A HAR request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarPostData {
    /// MIME type of the body.
    #[serde(default)]
    pub mime_type: String,
    /// Raw body text, when captured.
    #[serde(default)]
    pub text: Option<String>,
}

/// A HAR response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarContent {
    /// MIME type of the body.
    #[serde(default)]
    pub mime_type: String,
    /// Raw body text, when captured.
    #[serde(default)]
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Exchange (spec §3) — the input-only, collaborator-agnostic representation
// ---------------------------------------------------------------------------

/// One resource category an exchange can be tagged with, used by
/// [`crate::har::HarParser`] to drop non-API traffic before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Top-level page navigation.
    Document,
    /// `XMLHttpRequest`.
    Xhr,
    /// `fetch()`.
    Fetch,
    /// `<script>` load.
    Script,
    /// Image asset.
    Image,
    /// `<link rel=stylesheet>`.
    Stylesheet,
    /// Web font.
    Font,
    /// Audio/video.
    Media,
    /// Anything else (including unknown).
    Other,
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Other
    }
}

impl ResourceType {
    /// Parse a free-form resource-type string the way capture tools spell it.
    pub fn parse(raw: &str) -> ResourceType {
        match raw.to_ascii_lowercase().as_str() {
            "document" => ResourceType::Document,
            "xhr" => ResourceType::Xhr,
            "fetch" => ResourceType::Fetch,
            "script" => ResourceType::Script,
            "image" | "img" => ResourceType::Image,
            "stylesheet" | "css" => ResourceType::Stylesheet,
            "font" => ResourceType::Font,
            "media" => ResourceType::Media,
            _ => ResourceType::Other,
        }
    }
}

/// One HTTP round-trip, as handed to the pipeline.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// HTTP method, uppercase.
    pub method: String,
    /// Full absolute URL.
    pub url: String,
    /// Request headers, order-preserving, case-insensitively looked up.
    pub request_headers: Vec<(String, String)>,
    /// Request cookies as name/value pairs.
    pub request_cookies: Vec<(String, String)>,
    /// Raw request body bytes plus declared MIME type, if a body was sent.
    pub request_body: Option<(String, String)>,
    /// HTTP status code.
    pub status: u16,
    /// Response headers, order-preserving.
    pub response_headers: Vec<(String, String)>,
    /// Raw response body bytes plus declared MIME type, if a body came back.
    pub response_body: Option<(String, String)>,
    /// Browser resource-type classification.
    pub resource_type: ResourceType,
}

impl Exchange {
    /// Case-insensitive header lookup, most-recent-if-duplicated wins within
    /// the header list itself (HAR allows repeated header names).
    pub fn request_header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.request_headers, name)
    }

    /// Case-insensitive response-header lookup.
    pub fn response_header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.response_headers, name)
    }
}

fn header_lookup<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .rev()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// ParsedRequest (spec §3)
// ---------------------------------------------------------------------------

/// A normalized, filtered request derived from an [`Exchange`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRequest {
    /// HTTP method, uppercase.
    pub method: String,
    /// Original absolute URL.
    pub url: String,
    /// Lower-cased host.
    pub host: String,
    /// Raw, unnormalized path (case preserved).
    pub raw_path: String,
    /// Path with id-like segments replaced by `{param}` placeholders.
    pub normalized_path: String,
    /// HTTP status code.
    pub status: u16,
    /// Declared response `Content-Type`, when present.
    pub response_content_type: Option<String>,
    /// Parsed JSON request body, when the body was present and well-formed JSON.
    pub request_json: Option<serde_json::Value>,
    /// Parsed JSON response body, when the body was present and well-formed JSON.
    pub response_json: Option<serde_json::Value>,
    /// Resource-type classification carried through for diagnostics.
    pub resource_type: ResourceType,
    /// Query parameters observed on this specific request.
    pub query_params: Vec<(String, String)>,
    /// Request headers (kept for auth/CSRF extraction downstream).
    pub request_headers: Vec<(String, String)>,
    /// Response headers (kept for rate-limit/pagination-by-header extraction).
    pub response_headers: Vec<(String, String)>,
    /// Request cookies.
    pub request_cookies: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// TypeSummary / SchemaInferrer output (spec §4.1, §9)
// ---------------------------------------------------------------------------

/// A shallow description of a JSON value's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeSummary {
    /// `null`.
    Null,
    /// `true`/`false`.
    Bool,
    /// Integer number.
    Int,
    /// Floating-point number (`.` or exponent present).
    Float,
    /// Plain string, no recognized sub-class.
    String,
    /// `YYYY-MM-DD`.
    Date,
    /// RFC3339-ish datetime.
    Datetime,
    /// Canonical 8-4-4-4-12 UUID.
    Uuid,
    /// Three-segment, base64url JWT.
    Jwt,
    /// A small, closed set of observed string values.
    Enum {
        /// The distinct values observed, insertion order.
        values: Vec<String>,
    },
    /// Homogeneous array of `T`, with the observed length when known.
    Array {
        /// Element type summary.
        element: Box<TypeSummary>,
        /// Observed length, when this summary came from a single observation.
        len: Option<usize>,
    },
    /// An object with up to M recorded top-level keys.
    Object {
        /// Field name -> type summary, insertion order.
        fields: BTreeMap<String, TypeSummary>,
        /// True when the object had more keys than the configured cap.
        truncated: bool,
    },
    /// Observed as more than one incompatible type across merges.
    Mixed,
    /// No evidence available (e.g. body absent, or non-JSON content-type).
    Unknown,
}

impl TypeSummary {
    /// A short, human label for documentation/`response_summary` use.
    pub fn short_label(&self) -> String {
        match self {
            TypeSummary::Null => "null".to_string(),
            TypeSummary::Bool => "bool".to_string(),
            TypeSummary::Int => "int".to_string(),
            TypeSummary::Float => "float".to_string(),
            TypeSummary::String => "string".to_string(),
            TypeSummary::Date => "date".to_string(),
            TypeSummary::Datetime => "datetime".to_string(),
            TypeSummary::Uuid => "uuid".to_string(),
            TypeSummary::Jwt => "jwt".to_string(),
            TypeSummary::Enum { values } => format!("enum({})", values.join("|")),
            TypeSummary::Array { element, len } => match len {
                Some(n) => format!("array<{}>[{}]", element.short_label(), n),
                None => format!("array<{}>", element.short_label()),
            },
            TypeSummary::Object { truncated, .. } => {
                if *truncated {
                    "object(truncated)".to_string()
                } else {
                    "object".to_string()
                }
            }
            TypeSummary::Mixed => "mixed".to_string(),
            TypeSummary::Unknown => "unknown".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointGroup (spec §3, §4.5)
// ---------------------------------------------------------------------------

/// Broad behavioral category an endpoint group falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Read-only retrieval (GET/HEAD, non-auth path).
    Read,
    /// Mutation (POST/PUT/PATCH, non-auth path).
    Write,
    /// Deletion (DELETE).
    Delete,
    /// Login/refresh/session/token path, regardless of method.
    Auth,
    /// Anything not covered above.
    Other,
}

/// One observed path parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathParam {
    /// Placeholder name, e.g. `userId`.
    pub name: String,
    /// One observed literal value for this segment.
    pub example: String,
    /// SchemaInferrer's string sub-classification of the example.
    pub inferred_type: TypeSummary,
}

/// One observed query parameter, unioned across all observations in the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParam {
    /// Parameter name.
    pub name: String,
    /// Any one observed value.
    pub example: String,
    /// SchemaInferrer's classification of the observed value(s).
    pub inferred_type: TypeSummary,
}

/// All observations keyed by `(method, normalized_path)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointGroup {
    /// HTTP method.
    pub method: String,
    /// Normalized path (the other half of the group key).
    pub normalized_path: String,
    /// Heuristic description; an external describer may refine this later
    /// via [`crate::describe::describe`].
    pub description: String,
    /// Behavioral category.
    pub category: Category,
    /// Ordered path-parameter placeholders.
    pub path_params: Vec<PathParam>,
    /// Unioned query parameters.
    pub query_params: Vec<QueryParam>,
    /// Inferred request-body schema (merged across observations).
    pub request_body_schema: TypeSummary,
    /// Inferred response-body schema (merged across observations).
    pub response_body_schema: TypeSummary,
    /// How many exchanges aggregate into this group.
    pub example_count: usize,
    /// Response field names likely to be consumed elsewhere (ids, tokens).
    pub produces: Vec<String>,
    /// Request path/query/body names likely fed by a prior response.
    pub consumes: Vec<String>,
    /// Short human summary of the response shape, e.g. `array[12]` for collections.
    pub response_summary: String,
    /// Stable 12-hex identifier, see [`crate::enrich::endpoint_id`].
    pub endpoint_id: String,
    /// Resource type(s) observed for this group (diagnostics only).
    pub resource_types: Vec<ResourceType>,
}

// ---------------------------------------------------------------------------
// ApiData (spec §3)
// ---------------------------------------------------------------------------

/// Canonical auth mechanism classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// No auth material observed.
    None,
    /// Cookie-based session.
    Cookie,
    /// Custom header, not recognized as bearer/api-key.
    Header,
    /// `Authorization: Bearer ...`.
    Bearer,
    /// Recognized API-key-style header.
    ApiKey,
    /// `Authorization: Basic ...`.
    Basic,
    /// Two or more independent mechanisms observed.
    Mixed,
}

/// Where a CSRF-slot value ultimately came from, so a replayer can refresh it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceKind {
    /// A browser cookie.
    Cookie,
    /// `window.localStorage`.
    LocalStorage,
    /// `window.sessionStorage`.
    SessionStorage,
    /// A `<meta>` tag.
    Meta,
    /// An observed request header.
    Header,
}

/// Structured record of a CSRF token's source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfProvenance {
    /// Which kind of source this came from.
    pub kind: ProvenanceKind,
    /// The key within that source (cookie name, storage key, meta name, or header name).
    pub key: String,
}

/// Full normalized API description produced by [`crate::har::HarParser`] and
/// [`crate::auth::AuthExtractor`], later enriched with `endpoint_groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiData {
    /// Derived service name, e.g. `acme-api`.
    pub service: String,
    /// Primary origin (scheme+host) by request-count.
    pub base_url: String,
    /// All observed origins, ranked by request count.
    pub base_urls: Vec<String>,
    /// Canonical auth-method classification.
    pub auth_method: AuthMethod,
    /// Human-readable auth-method label for prose (SPEC_FULL §1.1); additive.
    pub auth_method_label: String,
    /// Auth header name -> most-recently-observed sample value.
    pub auth_headers: BTreeMap<String, String>,
    /// Cookie name -> most-recently-observed value.
    pub cookies: BTreeMap<String, String>,
    /// Named tokens pulled from storage/meta sources.
    pub auth_info: BTreeMap<String, String>,
    /// Logical CSRF slot name -> provenance record.
    pub csrf_provenance: BTreeMap<String, CsrfProvenance>,
    /// Every surviving parsed request, arrival order.
    pub requests: Vec<ParsedRequest>,
    /// `"METHOD /path"` -> observations, arrival order.
    pub endpoints: BTreeMap<String, Vec<ParsedRequest>>,
    /// Populated by [`crate::enrich::EndpointEnricher`]; empty until then.
    #[serde(default)]
    pub endpoint_groups: Vec<EndpointGroup>,
}

// ---------------------------------------------------------------------------
// AgenticAnalysis (spec §3, §4.6)
// ---------------------------------------------------------------------------

/// One inferred domain entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Singular, capitalized entity name, e.g. `User`.
    pub name: String,
    /// Union of response-schema fields across the entity's endpoints.
    pub fields: Vec<EntityField>,
    /// Endpoint keys (`"METHOD /path"`) belonging to this entity.
    pub endpoints: Vec<String>,
    /// CRUD verbs not observed for this entity.
    pub missing_ops: Vec<String>,
    /// True iff `missing_ops` is empty.
    pub crud_complete: bool,
}

/// One field observed on an entity's response schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityField {
    /// Field name.
    pub name: String,
    /// Inferred type.
    pub inferred_type: TypeSummary,
    /// Endpoint keys where this field was observed.
    pub seen_in: Vec<String>,
    /// True if the field was ever observed as `null`.
    pub nullable: bool,
    /// True if the name matches an id-like pattern.
    pub is_id: bool,
}

/// One inferred authentication flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFlow {
    /// Endpoint key, e.g. `"POST /auth/login"`.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Request-body field names.
    pub input_fields: Vec<String>,
    /// Response-body field names matching token patterns, optionally tagged
    /// `name(jwt)`/`name(opaque)`.
    pub produced_tokens: Vec<String>,
    /// Endpoint keys observed carrying the resulting credential.
    pub consumed_by: Vec<String>,
    /// Endpoint key of a detected refresh/renew/rotate call, if any.
    pub refresh_endpoint: Option<String>,
}

/// Which query/response-field family a GET endpoint's pagination uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationStyle {
    /// `offset`/`limit`/`skip`/`take`.
    OffsetLimit,
    /// `page`/`per_page`/`size`.
    PageNumber,
    /// `cursor`/`after`/`next_token`.
    Cursor,
    /// `Link: rel="next"` response header.
    LinkHeader,
}

/// One inferred pagination pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    /// Endpoint key this pattern was observed on.
    pub endpoint: String,
    /// Detected style.
    pub style: PaginationStyle,
    /// Parameter/field names involved.
    pub params: Vec<String>,
    /// One observed example value, when available.
    pub example: Option<String>,
}

/// A note that a GET endpoint looks like it should paginate but doesn't.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationGap {
    /// Endpoint key.
    pub endpoint: String,
    /// Observed array length that triggered the note.
    pub observed_len: usize,
}

/// One observed error-response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    /// HTTP status code.
    pub status: u16,
    /// Response body shape summary.
    pub shape: TypeSummary,
    /// Field names from the fixed error-field vocabulary, observed present.
    pub fields_observed: Vec<String>,
    /// One example message, truncated to 120 chars.
    pub example_message: Option<String>,
    /// Endpoint keys that produced this status.
    pub endpoints: Vec<String>,
    /// True for 429/502/503/504.
    pub retryable: bool,
    /// True for 400/401/403/404/422.
    pub terminal: bool,
}

/// Rate-limit signal observed on response headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimit {
    /// Endpoint key.
    pub endpoint: String,
    /// Request limit, when present.
    pub limit: Option<i64>,
    /// Remaining count, when present.
    pub remaining: Option<i64>,
    /// Window length in seconds, when derivable.
    pub window_seconds: Option<i64>,
    /// Raw `Retry-After` value, when present.
    pub retry_after: Option<i64>,
}

/// Where a consumed value is plugged into a consumer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerLocation {
    /// Path parameter.
    Path,
    /// Query parameter.
    Query,
    /// Request header.
    Header,
    /// Request-body field.
    Body,
}

/// One produced-field -> consumer-slot edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlow {
    /// Producer endpoint key.
    pub producer: String,
    /// Field name on the producer's response.
    pub producer_field: String,
    /// Consumer endpoint key.
    pub consumer: String,
    /// Where in the consumer request the value is plugged in.
    pub consumer_location: ConsumerLocation,
    /// Name of the consumer slot.
    pub consumer_field: String,
}

/// One suggested-but-unobserved endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// HTTP method of the suggested call.
    pub method: String,
    /// Path of the suggested call.
    pub path: String,
    /// Why it's suggested.
    pub reason: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Overall API shape classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStyle {
    /// REST-ish: parametric collection/item paths, standard verbs.
    Rest,
    /// GraphQL: single `/graphql`-ish endpoint.
    Graphql,
    /// RPC: verb-named POST leaves.
    Rpc,
    /// No single style dominates.
    Mixed,
}

/// Where API version information was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersioningPattern {
    /// `vN`/`vN.N` path segment.
    Path,
    /// `Accept-Version`/`API-Version`/`X-API-Version` header.
    Header,
    /// `?version=`/`?api_version=` query param.
    Query,
    /// No versioning signal detected.
    None,
}

/// Four sub-scores plus their average, all in [0, 1], rounded to 2 decimals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    /// Entity-extraction confidence.
    pub entities: f64,
    /// Auth-flow confidence.
    pub auth: f64,
    /// Data-flow confidence.
    pub data_flows: f64,
    /// Request/response coverage confidence.
    pub coverage: f64,
    /// Average of the four sub-scores.
    pub overall: f64,
}

/// The full higher-order analysis (spec §3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticAnalysis {
    /// Inferred domain entities.
    pub entities: Vec<Entity>,
    /// Inferred auth flows.
    pub auth_flows: Vec<AuthFlow>,
    /// Inferred pagination patterns.
    pub pagination: Vec<Pagination>,
    /// GET endpoints that look under-paginated.
    pub pagination_gaps: Vec<PaginationGap>,
    /// Observed error taxonomy.
    pub errors: Vec<ErrorShape>,
    /// Observed rate-limit signals.
    pub rate_limits: Vec<RateLimit>,
    /// Inferred data flows between endpoints.
    pub data_flows: Vec<DataFlow>,
    /// Endpoint keys that consume from >= 2 distinct producers.
    pub orchestrators: Vec<String>,
    /// Suggested gaps/probes (from [`crate::prober::EndpointProber`] plus gap-specific additions).
    pub suggestions: Vec<Suggestion>,
    /// Overall API style classification.
    pub api_style: ApiStyle,
    /// Detected versioning pattern.
    pub versioning: VersioningPattern,
    /// Confidence sub-scores.
    pub confidence: Confidence,
    /// One-paragraph natural-language summary.
    pub summary: String,
}

// ---------------------------------------------------------------------------
// SkillPackage (spec §3, §4.8, §6)
// ---------------------------------------------------------------------------

/// One entry in the stable endpoint reference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRef {
    /// HTTP method.
    pub method: String,
    /// Normalized path.
    pub normalized_path: String,
    /// Stable 12-hex identifier.
    pub endpoint_id: String,
}

/// The full assembled skill package (spec §4.8, §6).
#[derive(Debug, Clone)]
pub struct SkillPackage {
    /// Rendered `SKILL.md` content.
    pub skill_md: String,
    /// Rendered `auth.json` content.
    pub auth_json: String,
    /// Rendered typed-client template source.
    pub api_template: String,
    /// Rendered `scripts/examples.sh` content (SPEC_FULL §1.1).
    pub examples_sh: String,
    /// Rendered `references/REFERENCE.md` content.
    pub reference_md: String,
    /// Stable, ordered endpoint list.
    pub endpoints_ref: Vec<EndpointRef>,
    /// 8-hex-char content fingerprint.
    pub version_hash: String,
    /// Human summary of what changed vs. the prior package, if any.
    pub diff: Option<String>,
    /// Whether anything actually changed vs. the prior package (files are
    /// only rewritten when this is true; `auth.json` is the one exception).
    pub changed: bool,
}
