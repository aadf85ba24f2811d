mod builder;
mod component;
mod ids;
mod layout;
mod render;
mod scheduler;
mod store;
mod suggestions;
mod types;

pub use builder::normalized_tool_name;
pub use component::FlowGraphCanvas;
pub use store::{GraphStore, ViewTransform};
pub use types::{
	AgentData, AgentDefinition, Edge, EdgeChange, EdgeKind, GraphCallbacks, GraphProps, Handle,
	Mode, Node, NodeChange, NodeData, Position, Resource, ResourceData, ResourceKind,
	ResourceUpdate, Side, Size, Suggestion, SuggestionAction, SuggestionGroup, SuggestionKind,
	SuggestionMarker, SuggestionOp, TraceSpan,
};
