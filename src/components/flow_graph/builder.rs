//! Derives the canonical node/edge collections from external domain props.
//!
//! Output is pre-arranged: the layout pass runs exactly once before the
//! builder returns, so freshly built graphs never render unpositioned.

use serde_json::Value;

use super::ids;
use super::layout;
use super::suggestions;
use super::types::{
	AgentData, Edge, EdgeKind, GraphProps, Mode, Node, NodeData, Position, Resource, ResourceData,
	ResourceKind, SuggestionKind, SuggestionMarker, SuggestionOp, TraceSpan, SPAN_ERROR,
	SPAN_RUNNING, SPAN_SUCCESS,
};

/// Escalations are surfaced to the model as synthetic tools under this prefix.
const ESCALATION_TOOL_PREFIX: &str = "escalate_to_";
/// Span attribute value identifying a model completion span.
const COMPLETION_SPAN_TYPE: &str = "completion";

/// Build the full node/edge set for one agent graph, arranged and ready to
/// merge into the store. `prev_nodes` preserves user-adjusted sibling order
/// for resources that survive the rebuild.
pub fn build_graph(props: &GraphProps, prev_nodes: &[Node]) -> (Vec<Node>, Vec<Edge>) {
	let parent = props.parent_node_id.as_deref();
	let agent_id = ids::agent_node_id(parent, &props.definition.process_key);

	let mut nodes = vec![Node {
		id: agent_id.clone(),
		position: Position::ORIGIN,
		size: None,
		selected: false,
		draggable: false,
		data: NodeData::Agent(AgentData {
			name: props.name.clone(),
			description: props.description.clone(),
			definition: props.definition.clone(),
			parent_node_id: parent.map(str::to_string),
		}),
	}];

	if let Some(model) = &props.model {
		nodes.push(resource_node(parent, model, ResourceKind::Model, 0, props));
	}

	for (index, resource) in props.resources.iter().enumerate() {
		let order = prev_order(prev_nodes, &resource.id).unwrap_or(index);
		nodes.push(resource_node(parent, resource, resource.kind, order, props));
	}

	if let Some(group) = &props.suggestion_group {
		suggestions::annotate_nodes(&mut nodes, group);
		let mut overlay_order = props.resources.len();
		for suggestion in &group.suggestions {
			let SuggestionOp::Add(draft) = &suggestion.op else {
				continue;
			};
			let mut node = resource_node(parent, draft, draft.kind, overlay_order, props);
			node.draggable = false;
			if let Some(resource) = node.resource_mut() {
				resource.suggestion = Some(SuggestionMarker {
					suggestion_id: suggestion.id.clone(),
					kind: SuggestionKind::Add,
					standalone: suggestion.is_standalone,
				});
			}
			nodes.push(node);
			overlay_order += 1;
		}
	}

	let edges: Vec<Edge> = nodes
		.iter()
		.filter_map(|node| {
			let resource = node.resource()?;
			Some(build_edge(&agent_id, &node.id, resource, props.mode))
		})
		.collect();

	let arranged = layout::auto_arrange(&nodes, &edges);
	(arranged, edges)
}

fn resource_node(
	parent: Option<&str>,
	resource: &Resource,
	kind: ResourceKind,
	order: usize,
	props: &GraphProps,
) -> Node {
	let id = ids::node_id(parent, &resource.name, &resource.id);
	let is_active = props.active_resource_ids.iter().any(|a| a == &resource.id);
	let (has_running, has_success, has_error) =
		resource_status(&props.spans, kind, &resource.name);

	Node {
		id,
		position: Position::default(),
		size: None,
		selected: false,
		// The model is a singleton, never reorderable.
		draggable: props.mode == Mode::Design && kind != ResourceKind::Model,
		data: NodeData::Resource(ResourceData {
			kind,
			name: resource.name.clone(),
			description: resource.description.clone(),
			order,
			is_active,
			has_error,
			has_success,
			has_running,
			original_position: None,
			suggestion: None,
		}),
	}
}

fn build_edge(agent_id: &str, node_id: &str, resource: &ResourceData, mode: Mode) -> Edge {
	let handle = resource.kind.handle();
	// Context-like resources anchor the edge themselves; the rest anchor on
	// the agent.
	let (source, target) = match resource.kind {
		ResourceKind::Context | ResourceKind::MemorySpace => (node_id, agent_id),
		_ => (agent_id, node_id),
	};
	Edge {
		id: ids::edge_id(source, target),
		source: source.to_string(),
		target: target.to_string(),
		source_handle: handle,
		target_handle: handle,
		kind: EdgeKind::Default,
		animated: mode == Mode::View && resource.is_active,
		selectable: false,
	}
}

fn prev_order(prev_nodes: &[Node], resource_id: &str) -> Option<usize> {
	prev_nodes
		.iter()
		.find(|n| ids::matches_resource(&n.id, resource_id))
		.and_then(|n| n.resource())
		.map(|r| r.order)
}

/// Normalized tool name used for span attribute matching.
pub fn normalized_tool_name(kind: ResourceKind, name: &str) -> String {
	let cleaned = name.split_whitespace().collect::<Vec<_>>().join("_");
	if kind == ResourceKind::Escalation {
		format!("{ESCALATION_TOOL_PREFIX}{cleaned}")
	} else {
		cleaned
	}
}

/// (running, success, error) derived from the first matching span. Spans with
/// malformed attributes never match and never fail the build.
fn resource_status(spans: &[TraceSpan], kind: ResourceKind, name: &str) -> (bool, bool, bool) {
	let needle = normalized_tool_name(kind, name);
	for span in spans {
		let Ok(attributes) = serde_json::from_str::<Value>(&span.attributes) else {
			continue;
		};
		let matched = if kind == ResourceKind::Model {
			attributes.get("type").and_then(Value::as_str) == Some(COMPLETION_SPAN_TYPE)
		} else {
			attributes.get("toolName").and_then(Value::as_str) == Some(needle.as_str())
		};
		if matched {
			return match span.status {
				SPAN_RUNNING => (true, false, false),
				SPAN_SUCCESS => (false, true, false),
				SPAN_ERROR => (false, false, true),
				_ => (false, false, false),
			};
		}
	}
	(false, false, false)
}
