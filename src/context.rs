//! Threads a single analysis pass's identity and accumulated warnings
//! through the pipeline stages (spec §9 "Pipeline composition").
//!
//! Stage structs ([`crate::har::HarParser`], [`crate::auth::AuthExtractor`],
//! ...) stay pure over their explicit arguments; `AnalysisContext` is just
//! the bit of shared bookkeeping — service name, base URL, warnings — that
//! would otherwise need to be threaded through every call individually.

use crate::error::Warning;

/// Identity and diagnostics for one analysis pass.
///
/// Populated once [`crate::har::HarParser`] has derived the service name and
/// base URL; every later stage reads it, none of them mutate it except to
/// append warnings.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Derived service slug, e.g. `acme-api`.
    pub service: String,
    /// Primary origin (scheme+host).
    pub base_url: String,
    /// Warnings accumulated so far this pass (spec §7 "per-exchange errors
    /// are warnings").
    pub warnings: Vec<Warning>,
}

impl AnalysisContext {
    /// Start a context for the given service/base URL, with no warnings yet.
    pub fn new(service: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            base_url: base_url.into(),
            warnings: Vec::new(),
        }
    }

    /// Record a warning, also emitting it at `tracing::warn!` level so a
    /// caller tailing logs sees it without inspecting the returned value.
    pub fn record_warning(&mut self, warning: Warning) {
        tracing::warn!(%warning, "analysis warning");
        self.warnings.push(warning);
    }

    /// Absorb a batch of warnings produced by an earlier, already-completed
    /// stage (e.g. [`crate::har::HarParser::parse`], which collects its own
    /// warnings internally before this context exists).
    pub fn absorb(&mut self, warnings: Vec<Warning>) {
        for w in warnings {
            self.record_warning(w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbs_and_records_warnings() {
        let mut ctx = AnalysisContext::new("acme", "https://api.acme.com");
        ctx.absorb(vec![Warning::UrlInvalid {
            url: "not a url".to_string(),
        }]);
        assert_eq!(ctx.warnings.len(), 1);
    }
}
