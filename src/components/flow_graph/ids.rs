//! Composite node/edge identifier scheme.
//!
//! Node ids are `[parentPrefix=>]name:resourceId`: human-traceable on the
//! left, stable on the right, path-like across nesting levels. Edge ids join
//! their endpoint ids with a distinct delimiter. None of the delimiters may
//! occur in names or resource ids; lookups are suffix/prefix matches.

/// Separates nesting levels inside a node id.
pub const NESTING_DELIMITER: &str = "=>";
/// Separates the display name from the stable resource id within a segment.
pub const NAME_SEPARATOR: &str = ":";
/// Separates the endpoint ids inside an edge id.
pub const EDGE_DELIMITER: &str = "::";

/// Compose a resource node id.
pub fn node_id(parent: Option<&str>, name: &str, resource_id: &str) -> String {
	match parent {
		Some(parent) => format!("{parent}{NESTING_DELIMITER}{name}{NAME_SEPARATOR}{resource_id}"),
		None => format!("{name}{NAME_SEPARATOR}{resource_id}"),
	}
}

/// Compose an agent node id from its process key.
pub fn agent_node_id(parent: Option<&str>, process_key: &str) -> String {
	match parent {
		Some(parent) => format!("{parent}{NESTING_DELIMITER}{process_key}"),
		None => process_key.to_string(),
	}
}

/// Compose an edge id from its endpoint node ids.
pub fn edge_id(source: &str, target: &str) -> String {
	format!("{source}{EDGE_DELIMITER}{target}")
}

/// Trailing stable resource id of a node id, if the id carries one.
pub fn resource_id_of(node_id: &str) -> Option<&str> {
	node_id.rsplit_once(NAME_SEPARATOR).map(|(_, id)| id)
}

/// Whether a node id refers to the given resource.
pub fn matches_resource(node_id: &str, resource_id: &str) -> bool {
	resource_id_of(node_id) == Some(resource_id)
}

/// Prefix shared by every node of the graph nested under this node.
pub fn nested_prefix(node_id: &str) -> String {
	format!("{node_id}{NESTING_DELIMITER}")
}

/// Parent prefix of a node id, or `None` at the root level.
pub fn parent_prefix_of(node_id: &str) -> Option<&str> {
	node_id.rsplit_once(NESTING_DELIMITER).map(|(parent, _)| parent)
}
