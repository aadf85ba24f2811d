use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nominal agent node width, used until the canvas reports a measured size.
pub const AGENT_WIDTH: f64 = 260.0;
/// Nominal agent node height.
pub const AGENT_HEIGHT: f64 = 120.0;
/// Nominal resource node width.
pub const RESOURCE_WIDTH: f64 = 180.0;
/// Nominal resource node height.
pub const RESOURCE_HEIGHT: f64 = 72.0;

/// Spacing between sibling nodes inside one handle group.
pub const GROUP_SPACING: f64 = 40.0;
/// Distance from an agent edge to the adjacent resource row/column.
pub const SIDE_GAP: f64 = 120.0;
/// Horizontal shift applied to a lone row node so the edge is not a straight vertical line.
pub const SINGLE_NODE_OFFSET: f64 = 60.0;
/// Vertical offset of the model handle from the agent's top edge.
pub const MODEL_HANDLE_OFFSET: f64 = 36.0;
/// Horizontal gap between an expandable resource and its nested agent.
pub const NESTED_AGENT_GAP: f64 = 160.0;
/// Extra horizontal gap when the nested agent has upper connections of its own.
pub const NESTED_AGENT_TOP_EXTRA: f64 = 120.0;
/// Delay before re-arranging after a resource add/remove, so new nodes get measured first.
pub const ARRANGE_DELAY_MS: i32 = 50;

/// Span status codes as reported by the tracing backend.
pub const SPAN_RUNNING: i32 = 0;
/// Span finished successfully.
pub const SPAN_SUCCESS: i32 = 1;
/// Span finished with an error.
pub const SPAN_ERROR: i32 = 2;

/// Marker on a tool resource whose project is itself an agent.
pub const AGENT_PROJECT_TYPE: &str = "agent";

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

/// Editor mode supplied by the embedding application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
	Design,
	View,
}

/// Kind of an attached resource, also selects its handle on the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
	Tool,
	Context,
	Escalation,
	Mcp,
	MemorySpace,
	Model,
}

impl ResourceKind {
	pub fn handle(self) -> Handle {
		match self {
			ResourceKind::Tool => Handle::Tool,
			ResourceKind::Context => Handle::Context,
			ResourceKind::Escalation => Handle::Escalation,
			ResourceKind::Mcp => Handle::Mcp,
			ResourceKind::MemorySpace => Handle::MemorySpace,
			ResourceKind::Model => Handle::Model,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			ResourceKind::Tool => "Tool",
			ResourceKind::Context => "Context",
			ResourceKind::Escalation => "Escalation",
			ResourceKind::Mcp => "MCP",
			ResourceKind::MemorySpace => "Memory",
			ResourceKind::Model => "Model",
		}
	}
}

/// Logical attachment slot on the agent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
	Tool,
	Context,
	Escalation,
	Mcp,
	MemorySpace,
	Model,
}

impl Handle {
	/// Stable ordering used when several handle types share one side.
	pub const ALL: [Handle; 6] = [
		Handle::Model,
		Handle::Context,
		Handle::MemorySpace,
		Handle::Tool,
		Handle::Mcp,
		Handle::Escalation,
	];

	/// Fixed handle-to-side mapping.
	pub fn side(self) -> Side {
		match self {
			Handle::Context | Handle::MemorySpace => Side::Top,
			Handle::Tool | Handle::Mcp => Side::Bottom,
			Handle::Escalation => Side::Right,
			Handle::Model => Side::Left,
		}
	}
}

/// Physical side of the agent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
	Top,
	Bottom,
	Left,
	Right,
}

impl Side {
	/// Top/bottom sides lay nodes out in horizontal rows, left/right in vertical columns.
	pub fn is_row(self) -> bool {
		matches!(self, Side::Top | Side::Bottom)
	}
}

/// Externally owned domain resource. The graph reflects these, it never owns them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: ResourceKind,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub icon_url: Option<String>,
	#[serde(default)]
	pub project_type: Option<String>,
	#[serde(default)]
	pub slug: Option<String>,
	#[serde(default)]
	pub folder_path: Option<String>,
	#[serde(default)]
	pub available_tools: Vec<String>,
}

impl Resource {
	/// A tool resource backed by an agent project can be expanded in place.
	pub fn is_expandable_agent(&self) -> bool {
		self.kind == ResourceKind::Tool && self.project_type.as_deref() == Some(AGENT_PROJECT_TYPE)
	}
}

/// Domain definition of an agent. Opaque to layout except for the fields below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
	pub process_key: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub resources: Vec<Resource>,
	#[serde(default)]
	pub model: Option<Resource>,
}

/// One execution span from the trace backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSpan {
	pub id: String,
	#[serde(default)]
	pub parent_id: Option<String>,
	pub span_type: String,
	pub start_time: DateTime<Utc>,
	pub end_time: DateTime<Utc>,
	pub status: i32,
	/// Free-form JSON payload; malformed content is treated as "no match".
	#[serde(default)]
	pub attributes: String,
}

/// Proposed mutation carried by a suggestion.
#[derive(Clone, Debug, PartialEq)]
pub enum SuggestionOp {
	Add(Resource),
	Update(ResourceUpdate),
	Delete { resource_id: String },
}

/// Changed fields for an update suggestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
	pub resource_id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
	pub id: String,
	pub op: SuggestionOp,
	/// Standalone suggestions are interactive placeholders, excluded from
	/// bulk actions and from next/previous navigation.
	pub is_standalone: bool,
}

impl Suggestion {
	/// Resource id this suggestion targets (the draft's own id for adds).
	pub fn target_resource_id(&self) -> &str {
		match &self.op {
			SuggestionOp::Add(draft) => &draft.id,
			SuggestionOp::Update(update) => &update.resource_id,
			SuggestionOp::Delete { resource_id } => resource_id,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SuggestionGroup {
	pub id: String,
	pub suggestions: Vec<Suggestion>,
}

impl SuggestionGroup {
	/// Non-standalone suggestions, the only ones navigation and bulk actions see.
	pub fn actionable(&self) -> impl Iterator<Item = &Suggestion> {
		self.suggestions.iter().filter(|s| !s.is_standalone)
	}

	/// The pending placeholder, if any.
	pub fn standalone_placeholder(&self) -> Option<&Suggestion> {
		self.suggestions.iter().find(|s| s.is_standalone)
	}

	/// Copy of the group with placeholders stripped.
	pub fn without_standalone(&self) -> SuggestionGroup {
		SuggestionGroup {
			id: self.id.clone(),
			suggestions: self.actionable().cloned().collect(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionKind {
	Add,
	Update,
	Delete,
}

/// Annotation placed on a node that participates in a suggestion.
#[derive(Clone, Debug, PartialEq)]
pub struct SuggestionMarker {
	pub suggestion_id: String,
	pub kind: SuggestionKind,
	pub standalone: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestionAction {
	Accept,
	Reject,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentData {
	pub name: String,
	pub description: String,
	pub definition: AgentDefinition,
	/// Set on nested agents only; points at the resource node that spawned them.
	pub parent_node_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceData {
	pub kind: ResourceKind,
	pub name: String,
	pub description: String,
	/// Sibling sequence index; drag-reordering rewrites this.
	pub order: usize,
	pub is_active: bool,
	pub has_error: bool,
	pub has_success: bool,
	pub has_running: bool,
	/// Saved position while drag-preview spacing is applied.
	pub original_position: Option<Position>,
	pub suggestion: Option<SuggestionMarker>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
	Agent(AgentData),
	Resource(ResourceData),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub position: Position,
	/// Measured size, reported by the canvas after first paint.
	pub size: Option<Size>,
	pub selected: bool,
	pub draggable: bool,
	pub data: NodeData,
}

impl Node {
	pub fn is_agent(&self) -> bool {
		matches!(self.data, NodeData::Agent(_))
	}

	pub fn is_root_agent(&self) -> bool {
		matches!(&self.data, NodeData::Agent(a) if a.parent_node_id.is_none())
	}

	pub fn agent(&self) -> Option<&AgentData> {
		match &self.data {
			NodeData::Agent(a) => Some(a),
			NodeData::Resource(_) => None,
		}
	}

	pub fn resource(&self) -> Option<&ResourceData> {
		match &self.data {
			NodeData::Resource(r) => Some(r),
			NodeData::Agent(_) => None,
		}
	}

	pub fn resource_mut(&mut self) -> Option<&mut ResourceData> {
		match &mut self.data {
			NodeData::Resource(r) => Some(r),
			NodeData::Agent(_) => None,
		}
	}

	pub fn nominal_size(&self) -> Size {
		match self.data {
			NodeData::Agent(_) => Size {
				width: AGENT_WIDTH,
				height: AGENT_HEIGHT,
			},
			NodeData::Resource(_) => Size {
				width: RESOURCE_WIDTH,
				height: RESOURCE_HEIGHT,
			},
		}
	}

	/// Measured size, falling back to the nominal constants.
	pub fn size_or_nominal(&self) -> Size {
		self.size.unwrap_or_else(|| self.nominal_size())
	}

	pub fn center(&self) -> Position {
		let size = self.size_or_nominal();
		Position {
			x: self.position.x + size.width / 2.0,
			y: self.position.y + size.height / 2.0,
		}
	}

	pub fn contains(&self, x: f64, y: f64) -> bool {
		let size = self.size_or_nominal();
		x >= self.position.x
			&& x <= self.position.x + size.width
			&& y >= self.position.y
			&& y <= self.position.y + size.height
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
	Default,
	/// Link between an expandable resource and its nested agent.
	Connector,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub source_handle: Handle,
	pub target_handle: Handle,
	pub kind: EdgeKind,
	pub animated: bool,
	pub selectable: bool,
}

impl Edge {
	pub fn other_endpoint(&self, node_id: &str) -> Option<&str> {
		if self.source == node_id {
			Some(&self.target)
		} else if self.target == node_id {
			Some(&self.source)
		} else {
			None
		}
	}
}

/// Immutable prop snapshot supplied by the embedding application.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphProps {
	pub mode: Mode,
	pub name: String,
	pub description: String,
	pub definition: AgentDefinition,
	pub resources: Vec<Resource>,
	pub model: Option<Resource>,
	pub spans: Vec<TraceSpan>,
	pub active_resource_ids: Vec<String>,
	pub suggestion_group: Option<SuggestionGroup>,
	/// Set when this graph is built nested under a resource node.
	pub parent_node_id: Option<String>,
	pub initial_selected_resource_id: Option<String>,
}

/// Graph change requests, mirroring the rendering layer's change events.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
	Position { id: String, position: Position },
	Dimensions { id: String, size: Size },
	Select { id: String, selected: bool },
	Remove { id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
	Remove { id: String },
}

/// Outbound callback surface. Every hook is optional and defaults to a no-op.
/// Hooks cross the component prop boundary, which requires `Send + Sync` even
/// though the canvas itself runs single-threaded.
#[derive(Clone, Default)]
pub struct GraphCallbacks {
	pub on_select_resource: Option<Arc<dyn Fn(Option<String>) + Send + Sync>>,
	pub on_add_resource: Option<Arc<dyn Fn(ResourceKind) + Send + Sync>>,
	pub on_remove_resource: Option<Arc<dyn Fn(Resource) + Send + Sync>>,
	/// Returning `None` bypasses placeholder mode and falls back to `on_add_resource`.
	pub on_request_resource_placeholder:
		Option<Arc<dyn Fn(ResourceKind, SuggestionGroup) -> Option<Resource> + Send + Sync>>,
	pub on_act_on_suggestion: Option<Arc<dyn Fn(String, SuggestionAction) + Send + Sync>>,
	pub on_act_on_suggestion_group: Option<Arc<dyn Fn(String, SuggestionAction) + Send + Sync>>,
	pub on_placeholder_node_click: Option<Arc<dyn Fn(ResourceKind, ResourceData) + Send + Sync>>,
	pub on_toggle_enabled: Option<Arc<dyn Fn(String, bool) + Send + Sync>>,
	pub on_add_breakpoint: Option<Arc<dyn Fn(String) + Send + Sync>>,
	pub on_remove_breakpoint: Option<Arc<dyn Fn(String) + Send + Sync>>,
	pub on_add_guardrail: Option<Arc<dyn Fn(String) + Send + Sync>>,
}

impl GraphCallbacks {
	pub fn emit_select_resource(&self, id: Option<String>) {
		if let Some(cb) = &self.on_select_resource {
			cb(id);
		}
	}

	pub fn emit_add_resource(&self, kind: ResourceKind) {
		if let Some(cb) = &self.on_add_resource {
			cb(kind);
		}
	}

	pub fn emit_remove_resource(&self, resource: Resource) {
		if let Some(cb) = &self.on_remove_resource {
			cb(resource);
		}
	}

	pub fn emit_act_on_suggestion(&self, id: String, action: SuggestionAction) {
		if let Some(cb) = &self.on_act_on_suggestion {
			cb(id, action);
		}
	}

	pub fn emit_act_on_suggestion_group(&self, group_id: String, action: SuggestionAction) {
		if let Some(cb) = &self.on_act_on_suggestion_group {
			cb(group_id, action);
		}
	}

	pub fn emit_placeholder_node_click(&self, kind: ResourceKind, data: ResourceData) {
		if let Some(cb) = &self.on_placeholder_node_click {
			cb(kind, data);
		}
	}
}
