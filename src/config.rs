//! Tunable thresholds and limits for the analysis pipeline.
//!
//! Defaults reproduce every constant named in the spec; callers only need to
//! override something here to experiment with the scoring model or to widen
//! schema-inference limits for an unusually large API surface.

use serde::{Deserialize, Serialize};

/// Knobs for [`crate::schema::SchemaInferrer`] (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Max array elements sampled when inferring an element type.
    #[serde(default = "default_array_sample")]
    pub array_sample: usize,
    /// Max top-level object keys recorded before truncating.
    #[serde(default = "default_object_keys")]
    pub object_keys: usize,
    /// Minimum scalar-string observations before enum detection kicks in.
    #[serde(default = "default_enum_min_observations")]
    pub enum_min_observations: usize,
    /// Max distinct values for a field to still be considered enum-like.
    #[serde(default = "default_enum_max_distinct")]
    pub enum_max_distinct: usize,
    /// Max unique/total ratio for enum detection.
    #[serde(default = "default_enum_max_ratio")]
    pub enum_max_ratio: f64,
}

fn default_array_sample() -> usize {
    8
}
fn default_object_keys() -> usize {
    24
}
fn default_enum_min_observations() -> usize {
    3
}
fn default_enum_max_distinct() -> usize {
    5
}
fn default_enum_max_ratio() -> f64 {
    0.5
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            array_sample: default_array_sample(),
            object_keys: default_object_keys(),
            enum_min_observations: default_enum_min_observations(),
            enum_max_distinct: default_enum_max_distinct(),
            enum_max_ratio: default_enum_max_ratio(),
        }
    }
}

/// Knobs for [`crate::noise::NoiseFilter`] (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Final-score threshold at/above which an exchange is filtered as noise.
    #[serde(default = "default_noise_threshold")]
    pub threshold: f64,
    /// Any single signal at/above this is taken as the final score directly.
    #[serde(default = "default_noise_dominant")]
    pub dominant_signal: f64,
}

fn default_noise_threshold() -> f64 {
    0.6
}
fn default_noise_dominant() -> f64 {
    0.9
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            threshold: default_noise_threshold(),
            dominant_signal: default_noise_dominant(),
        }
    }
}

/// Knobs for [`crate::prober::EndpointProber`] (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProberConfig {
    /// Emit version-variant and health/status/version utility probes.
    #[serde(default)]
    pub aggressive: bool,
    /// Suppress `/openapi.json`-style doc probes.
    #[serde(default)]
    pub disable_doc_probes: bool,
    /// Hard cap on the number of suggestions emitted.
    #[serde(default = "default_max_probes")]
    pub max_probes: usize,
}

fn default_max_probes() -> usize {
    50
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            aggressive: false,
            disable_doc_probes: false,
            max_probes: default_max_probes(),
        }
    }
}

/// Extra header names [`crate::auth::AuthExtractor`] should treat as
/// auth-bearing, beyond the built-in set (spec §4.4: "extensible by a
/// caller-provided set").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Additional case-insensitive header names to recognize as auth headers.
    #[serde(default)]
    pub extra_auth_headers: Vec<String>,
}

/// Top-level configuration threaded through a whole analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// See [`SchemaConfig`].
    #[serde(default)]
    pub schema: SchemaConfig,
    /// See [`NoiseConfig`].
    #[serde(default)]
    pub noise: NoiseConfig,
    /// See [`ProberConfig`].
    #[serde(default)]
    pub prober: ProberConfig,
    /// See [`AuthConfig`].
    #[serde(default)]
    pub auth: AuthConfig,
}
