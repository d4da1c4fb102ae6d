//! Optional description-enrichment extension point (spec §9).
//!
//! The core never blocks on an external refiner; `describe` defaults to a
//! no-op that leaves each group's heuristic description untouched. A
//! collaborator wires an LLM-backed refiner through [`Describer`] and passes
//! it to [`crate::context::AnalysisContext`] explicitly — there is no global
//! hook.

use crate::types::EndpointGroup;

/// Refines `group.description` for each group, or leaves it as-is.
///
/// Implementors must be total and must not fail the pass: a refiner that
/// can't produce a better description should just return the input
/// description unchanged.
pub trait Describer {
    /// Produce a (possibly unchanged) description for one group.
    fn describe_one(&self, group: &EndpointGroup) -> String;
}

/// The default no-op describer: keeps every group's heuristic description.
pub struct NoopDescriber;

impl Describer for NoopDescriber {
    fn describe_one(&self, group: &EndpointGroup) -> String {
        group.description.clone()
    }
}

/// Apply a describer across a whole groupset, producing refined groups.
///
/// A missing/no-op refiner is indistinguishable from passing
/// [`NoopDescriber`] — the heuristic description survives unchanged.
pub fn describe(groups: Vec<EndpointGroup>, describer: &dyn Describer) -> Vec<EndpointGroup> {
    groups
        .into_iter()
        .map(|mut g| {
            g.description = describer.describe_one(&g);
            g
        })
        .collect()
}

/// Build the initial heuristic description for a group before any external
/// refinement: `"<METHOD> <normalized_path>"` plus its response shape, when
/// known.
pub fn heuristic_description(group: &EndpointGroup) -> String {
    if group.response_summary.is_empty() || group.response_summary == "unknown" {
        format!("{} {}", group.method, group.normalized_path)
    } else {
        format!(
            "{} {} -> {}",
            group.method, group.normalized_path, group.response_summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ResourceType, TypeSummary};

    fn group() -> EndpointGroup {
        EndpointGroup {
            method: "GET".to_string(),
            normalized_path: "/api/v1/users/{userId}".to_string(),
            description: String::new(),
            category: Category::Read,
            path_params: Vec::new(),
            query_params: Vec::new(),
            request_body_schema: TypeSummary::Unknown,
            response_body_schema: TypeSummary::Unknown,
            example_count: 1,
            produces: Vec::new(),
            consumes: Vec::new(),
            response_summary: "object".to_string(),
            endpoint_id: "abc123abc123".to_string(),
            resource_types: vec![ResourceType::Xhr],
        }
    }

    #[test]
    fn noop_describer_keeps_description() {
        let mut g = group();
        g.description = "existing".to_string();
        let result = describe(vec![g], &NoopDescriber);
        assert_eq!(result[0].description, "existing");
    }

    #[test]
    fn heuristic_description_includes_response_shape() {
        let g = group();
        assert_eq!(
            heuristic_description(&g),
            "GET /api/v1/users/{userId} -> object"
        );
    }
}
