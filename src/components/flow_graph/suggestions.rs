//! Suggestion overlay annotation and navigation.
//!
//! Update/delete suggestions annotate live nodes in place; add suggestions
//! become overlay nodes in the builder so they participate in normal layout.
//! Navigation only ever sees non-standalone suggestions; placeholders are
//! excluded from cycling and from the displayed count.

use super::ids;
use super::types::{Node, SuggestionGroup, SuggestionKind, SuggestionMarker, SuggestionOp};

/// Annotate base-graph nodes that are targeted by update/delete suggestions.
/// Targets that do not resolve to a live node are skipped silently; the
/// suggestion simply has no visual effect until the data catches up.
pub fn annotate_nodes(nodes: &mut [Node], group: &SuggestionGroup) {
	for suggestion in &group.suggestions {
		let (kind, target) = match &suggestion.op {
			SuggestionOp::Update(update) => (SuggestionKind::Update, update.resource_id.as_str()),
			SuggestionOp::Delete { resource_id } => (SuggestionKind::Delete, resource_id.as_str()),
			SuggestionOp::Add(_) => continue,
		};
		let Some(node) = nodes
			.iter_mut()
			.find(|n| ids::matches_resource(&n.id, target))
		else {
			continue;
		};
		if let Some(resource) = node.resource_mut() {
			resource.suggestion = Some(SuggestionMarker {
				suggestion_id: suggestion.id.clone(),
				kind,
				standalone: suggestion.is_standalone,
			});
		}
	}
}

/// Index of the next navigable suggestion, wrapping around.
pub fn wrap_next(current: usize, len: usize) -> usize {
	if len == 0 { 0 } else { (current + 1) % len }
}

/// Index of the previous navigable suggestion, wrapping around.
pub fn wrap_previous(current: usize, len: usize) -> usize {
	if len == 0 { 0 } else { (current + len - 1) % len }
}

/// Keep the index on a sensible neighbor after the list shrinks.
pub fn clamp_index(current: usize, len: usize) -> usize {
	if len == 0 { 0 } else { current.min(len - 1) }
}
