//! Error taxonomy for the traffic-analysis pipeline (spec §7).

use std::fmt;

/// Fatal-to-the-pass failures. Per-exchange problems are not represented here
/// — they're accumulated as [`Warning`]s on [`crate::context::AnalysisContext`]
/// instead, since a single malformed exchange should never abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The archive could not be parsed as HAR at all.
    #[error("input archive could not be parsed as HAR: {0}")]
    InputMalformed(String),

    /// After filtering, no endpoint groups remain — there is nothing to
    /// publish a skill package for.
    #[error("no internal API endpoints survived filtering ({reason})")]
    NoInternalApi {
        /// Human-readable reason (e.g. "archive is empty" or "all exchanges scored as noise").
        reason: String,
    },

    /// A prior skill package exists on disk but could not be parsed.
    #[error("existing skill package at {path} is corrupt and was treated as absent: {cause}")]
    PackageConflict {
        /// Path to the corrupt package directory.
        path: String,
        /// Underlying parse failure.
        cause: String,
    },

    /// Two distinct payloads hashed to the same short prefix. Theoretical;
    /// see spec §7 — any integrity check upstream should treat this as a
    /// signal to do a full re-publish rather than trust the short hash.
    #[error("hash collision detected for {kind} (prefix {prefix})")]
    HashCollision {
        /// Which kind of short hash collided (`endpoint_id` or `version_hash`).
        kind: &'static str,
        /// The colliding hex prefix.
        prefix: String,
    },
}

/// A recoverable, per-exchange/per-body problem. Never fatal to the pass;
/// accumulated on [`crate::context::AnalysisContext::warnings`] and also
/// emitted via `tracing::warn!` at the point it's recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A request/response body was declared as JSON but failed to parse; it
    /// was treated as opaque text and analysis proceeded.
    SchemaUnparseable {
        /// Where the body came from, for diagnostics (e.g. `"GET /api/users response"`).
        context: String,
    },
    /// A single exchange's URL could not be parsed; the exchange was dropped.
    UrlInvalid {
        /// The raw, unparseable URL string.
        url: String,
    },
    /// A prior skill package exists on disk but could not be parsed; it was
    /// treated as absent and the build proceeded as a fresh publish.
    PackageConflict {
        /// Path to the corrupt package directory.
        path: String,
        /// Underlying parse failure.
        cause: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SchemaUnparseable { context } => {
                write!(f, "body unparseable as JSON, treated as opaque text: {context}")
            }
            Warning::UrlInvalid { url } => write!(f, "invalid URL dropped: {url}"),
            Warning::PackageConflict { path, cause } => write!(
                f,
                "existing skill package at {path} is corrupt and was treated as absent: {cause}"
            ),
        }
    }
}

/// Convenience alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, AnalysisError>;
