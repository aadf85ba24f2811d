//! Live graph state for one mounted canvas.
//!
//! The store is the single source of truth during a session: it reconciles
//! every incoming prop snapshot against user-visible state (positions,
//! selection, drag previews) and mediates all graph-mutating interaction.
//! It owns only derived copies: prop objects are immutable snapshots, and
//! structural changes (resource add/remove, suggestion accept/reject) are
//! delegated to the embedding application through callbacks, taking effect
//! on the next prop update.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use super::builder;
use super::ids;
use super::layout;
use super::scheduler::Scheduler;
use super::suggestions;
use super::types::{
	AgentDefinition, Edge, EdgeChange, EdgeKind, GraphCallbacks, GraphProps, Mode, Node,
	NodeChange, NodeData, Position, Resource, ResourceKind, Size, Suggestion, SuggestionAction,
	SuggestionOp, ARRANGE_DELAY_MS, GROUP_SPACING,
};

/// Pan/zoom transform of the viewport.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		ViewTransform { x: 0.0, y: 0.0, k: 1.0 }
	}
}

const FIT_VIEW_PADDING: f64 = 48.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 1.5;

pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	props: Option<GraphProps>,
	callbacks: GraphCallbacks,
	scheduler: Rc<dyn Scheduler>,
	pub transform: ViewTransform,
	pub flow_time: f64,
	width: f64,
	height: f64,
	selected_node_id: Option<String>,
	dragged_node_id: Option<String>,
	/// `Some(insert_after)` while a drag preview is applied.
	drag_preview: Option<Option<String>>,
	suggestion_index: usize,
	skip_placeholder_click: bool,
}

impl GraphStore {
	pub fn new(callbacks: GraphCallbacks, scheduler: Rc<dyn Scheduler>) -> Self {
		GraphStore {
			nodes: Vec::new(),
			edges: Vec::new(),
			props: None,
			callbacks,
			scheduler,
			transform: ViewTransform::default(),
			flow_time: 0.0,
			width: 0.0,
			height: 0.0,
			selected_node_id: None,
			dragged_node_id: None,
			drag_preview: None,
			suggestion_index: 0,
			skip_placeholder_click: false,
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn selected_node_id(&self) -> Option<&str> {
		self.selected_node_id.as_deref()
	}

	pub fn dragged_node_id(&self) -> Option<&str> {
		self.dragged_node_id.as_deref()
	}

	pub fn mode(&self) -> Mode {
		self.props.as_ref().map_or(Mode::Design, |p| p.mode)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	/// Advance the animation clock driving edge dash flow.
	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
	}

	pub fn find_node(&self, node_id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == node_id)
	}

	fn find_node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == node_id)
	}

	/// Topmost node under a world-space point.
	pub fn node_at_position(&self, x: f64, y: f64) -> Option<&Node> {
		self.nodes.iter().rev().find(|n| n.contains(x, y))
	}

	// --- prop reconciliation ------------------------------------------------

	/// Reconcile an incoming prop snapshot against the live graph, preserving
	/// user-visible state for nodes that keep their logical identity.
	pub fn handle_props_update(store: &Rc<RefCell<GraphStore>>, props: GraphProps) {
		let mut emit_select: Option<Option<String>> = None;
		let mut emit_accept_placeholder: Option<String> = None;
		let mut schedule_arrange = false;

		{
			let mut s = store.borrow_mut();

			let old_ids: HashSet<String> = s
				.props
				.as_ref()
				.map(|p| p.resources.iter().map(|r| r.id.clone()).collect())
				.unwrap_or_default();
			let new_ids: HashSet<String> =
				props.resources.iter().map(|r| r.id.clone()).collect();
			let added: Vec<&Resource> = props
				.resources
				.iter()
				.filter(|r| !old_ids.contains(&r.id))
				.collect();
			let added_count = added.len();
			let removed_any = old_ids.iter().any(|id| !new_ids.contains(id));
			let first_render = s.props.is_none();
			let prev_selected = s.selected_node_id.clone();

			let (mut nodes, mut edges) = builder::build_graph(&props, &s.nodes);

			// Map fresh nodes back onto their prior logical identity and keep
			// the user-visible state the rebuild would otherwise discard.
			for node in &mut nodes {
				let Some(prev) = s.nodes.iter().find(|p| same_identity(p, node)) else {
					continue;
				};
				node.position = prev.position;
				node.selected = prev.selected;
				node.size = prev.size;
			}

			// Spliced-in nested expansions are not rebuilt from props; carry
			// them over while their owning resource is still alive.
			let mut preserved: Vec<Node> = Vec::new();
			for prev in &s.nodes {
				if nodes.iter().any(|n| same_identity(prev, n)) {
					continue;
				}
				let under_live_resource = nodes.iter().any(|n| {
					!n.is_agent() && prev.id.starts_with(&ids::nested_prefix(&n.id))
				});
				if under_live_resource {
					preserved.push(prev.clone());
				}
			}
			if !preserved.is_empty() {
				let kept: HashSet<&str> = preserved.iter().map(|n| n.id.as_str()).collect();
				edges.extend(
					s.edges
						.iter()
						.filter(|e| kept.contains(e.source.as_str()) || kept.contains(e.target.as_str()))
						.cloned(),
				);
				nodes.extend(preserved);
			}

			// On the first snapshot a caller-provided initial selection wins
			// over the first-added auto-select below.
			let initial_target: Option<String> = if first_render {
				props.initial_selected_resource_id.as_ref().and_then(|rid| {
					nodes
						.iter()
						.find(|n| ids::matches_resource(&n.id, rid))
						.map(|n| n.id.clone())
				})
			} else {
				None
			};

			// Genuinely new resources steal the selection.
			let first_added_id = added.first().map(|r| r.id.clone());
			if initial_target.is_none() {
				if let Some(rid) = &first_added_id {
					let target = nodes
						.iter()
						.find(|n| {
							ids::matches_resource(&n.id, rid)
								&& n.resource().is_some_and(|r| r.suggestion.is_none())
						})
						.or_else(|| nodes.iter().find(|n| ids::matches_resource(&n.id, rid)))
						.map(|n| n.id.clone());
					if let Some(node_id) = target {
						select_only(&mut nodes, Some(&node_id));
					}
				}
			}

			// A pending placeholder is implicitly resolved by the manual
			// creation of any other resource.
			let prev_placeholder: Option<Suggestion> = s
				.props
				.as_ref()
				.and_then(|p| p.suggestion_group.as_ref())
				.and_then(|g| g.standalone_placeholder())
				.cloned();
			if let (Some(placeholder), Some(rid)) = (&prev_placeholder, &first_added_id) {
				if placeholder.target_resource_id() != rid.as_str() {
					emit_accept_placeholder = Some(placeholder.id.clone());
				}
			}

			let new_placeholder: Option<Suggestion> = props
				.suggestion_group
				.as_ref()
				.and_then(|g| g.standalone_placeholder())
				.cloned();
			let placeholder_appeared = match (&prev_placeholder, &new_placeholder) {
				(None, Some(_)) => true,
				(Some(a), Some(b)) => a.id != b.id,
				_ => false,
			};

			s.nodes = nodes;
			s.edges = edges;
			s.selected_node_id = s.nodes.iter().find(|n| n.selected).map(|n| n.id.clone());

			if placeholder_appeared {
				if let Some(placeholder) = &new_placeholder {
					let node_id = s
						.nodes
						.iter()
						.find(|n| {
							n.resource().is_some_and(|r| {
								r.suggestion
									.as_ref()
									.is_some_and(|m| m.suggestion_id == placeholder.id)
							})
						})
						.map(|n| n.id.clone());
					if let Some(node_id) = node_id {
						// the system created this placeholder itself; selecting
						// it must not re-open the creation dialog
						s.skip_placeholder_click = true;
						s.set_selected_node_id(Some(node_id));
					}
				}
			}

			if let Some(node_id) = initial_target.clone() {
				s.set_selected_node_id(Some(node_id));
			}

			let actionable = props
				.suggestion_group
				.as_ref()
				.map_or(0, |g| g.actionable().count());
			s.suggestion_index = suggestions::clamp_index(s.suggestion_index, actionable);

			s.props = Some(props);

			if added_count > 0 || removed_any {
				schedule_arrange = true;
				debug!("reconciled resources: {added_count} added, removed={removed_any}");
			}
			// The caller already knows its own initial selection; only
			// store-driven selection changes are reported back.
			if added_count > 0 && initial_target.is_none() {
				emit_select = Some(first_added_id);
			} else if removed_any
				&& prev_selected.is_some()
				&& prev_selected != s.selected_node_id
				&& s.selected_node_id.is_none()
			{
				// a removal took the selection with it
				emit_select = Some(None);
			}
		}

		let callbacks = store.borrow().callbacks.clone();
		if let Some(selected) = emit_select {
			callbacks.emit_select_resource(selected);
		}
		if let Some(placeholder_id) = emit_accept_placeholder {
			callbacks.emit_act_on_suggestion(placeholder_id, SuggestionAction::Accept);
		}
		if schedule_arrange {
			let st = Rc::clone(store);
			let scheduler = store.borrow().scheduler.clone();
			scheduler.delay(
				ARRANGE_DELAY_MS,
				Box::new(move || GraphStore::auto_arrange_and_fit_view(&st)),
			);
		}
	}

	// --- selection ----------------------------------------------------------

	/// Mark exactly one node selected. Clicking a standalone placeholder
	/// diverts into the placeholder-click callback instead of selecting,
	/// unless the internal skip flag was armed.
	pub fn set_selected_node_id(&mut self, id: Option<String>) {
		let skip = std::mem::take(&mut self.skip_placeholder_click);

		if let Some(id) = &id {
			let marker_info = self.find_node(id).and_then(|n| {
				n.resource()
					.and_then(|r| r.suggestion.as_ref().map(|m| (r.clone(), m.clone())))
			});
			if let Some((resource, marker)) = marker_info {
				if marker.standalone && !skip {
					self.callbacks
						.emit_placeholder_node_click(resource.kind, resource);
					return;
				}
				if !marker.standalone {
					if let Some(pos) = self.actionable_position(&marker.suggestion_id) {
						self.suggestion_index = pos;
					}
				}
			}
		}

		select_only(&mut self.nodes, id.as_deref());
		self.selected_node_id = id;
	}

	/// Selection driven by a canvas click. Unlike the internal setter this
	/// reports the change back through `on_select_resource`; agent nodes and
	/// background clicks report `None`.
	pub fn select_from_pointer(&mut self, id: Option<String>) {
		let before = self.selected_node_id.clone();
		self.set_selected_node_id(id);
		if self.selected_node_id == before {
			return;
		}
		let resource_id = self
			.selected_node_id
			.as_ref()
			.and_then(|id| self.find_node(id))
			.filter(|n| !n.is_agent())
			.and_then(|n| ids::resource_id_of(&n.id))
			.map(str::to_string);
		self.callbacks.emit_select_resource(resource_id);
	}

	fn actionable_position(&self, suggestion_id: &str) -> Option<usize> {
		self.props
			.as_ref()
			.and_then(|p| p.suggestion_group.as_ref())
			.and_then(|g| g.actionable().position(|s| s.id == suggestion_id))
	}

	// --- drag reorder -------------------------------------------------------

	pub fn set_dragging(&mut self, dragging: bool, node_id: Option<&str>) {
		if dragging {
			self.dragged_node_id = node_id.map(str::to_string);
		} else {
			self.dragged_node_id = None;
		}
	}

	/// Push same-type siblings aside to preview the insertion point. Only a
	/// change of insertion point triggers a recompute; edge insertions push
	/// the whole run while middle insertions open a single gap.
	pub fn set_drag_preview(&mut self, dragged: Option<&str>, insert_after: Option<&str>) {
		let Some(dragged_id) = dragged else {
			self.restore_preview_positions();
			self.drag_preview = None;
			return;
		};

		let wanted = insert_after.map(str::to_string);
		if self.dragged_node_id.as_deref() == Some(dragged_id)
			&& self.drag_preview.as_ref() == Some(&wanted)
		{
			return;
		}
		self.dragged_node_id = Some(dragged_id.to_string());
		self.drag_preview = Some(wanted);

		self.restore_preview_positions();

		let siblings = self.sibling_ids(dragged_id);
		let insert_index = match insert_after {
			None => 0,
			Some(after) => match siblings.iter().position(|id| id == after) {
				Some(pos) => pos + 1,
				None => return,
			},
		};

		let Some(dragged_node) = self.find_node(dragged_id) else {
			return;
		};
		let gap = dragged_node.size_or_nominal();
		let along_row = dragged_node
			.resource()
			.is_some_and(|r| r.kind.handle().side().is_row());

		for id in siblings.into_iter().skip(insert_index) {
			let Some(node) = self.find_node_mut(&id) else {
				continue;
			};
			let base = node.position;
			if let Some(resource) = node.resource_mut() {
				if resource.original_position.is_none() {
					resource.original_position = Some(base);
				}
			}
			if along_row {
				node.position.x += gap.width + GROUP_SPACING;
			} else {
				node.position.y += gap.height + GROUP_SPACING;
			}
		}
	}

	/// Drop target for the node currently being dragged: the last same-type
	/// sibling whose center the dragged node has passed.
	pub fn drag_insert_target(&self, dragged_id: &str) -> Option<String> {
		let dragged = self.find_node(dragged_id)?;
		let along_row = dragged
			.resource()
			.map(|r| r.kind.handle().side().is_row())?;
		let dragged_center = if along_row { dragged.center().x } else { dragged.center().y };

		let mut target = None;
		for id in self.sibling_ids(dragged_id) {
			let Some(node) = self.find_node(&id) else {
				continue;
			};
			let base = node
				.resource()
				.and_then(|r| r.original_position)
				.unwrap_or(node.position);
			let size = node.size_or_nominal();
			let center = if along_row {
				base.x + size.width / 2.0
			} else {
				base.y + size.height / 2.0
			};
			if center < dragged_center {
				target = Some(id);
			}
		}
		target
	}

	/// Same-kind resource nodes under the same parent, ordered, excluding the
	/// dragged node itself.
	fn sibling_ids(&self, node_id: &str) -> Vec<String> {
		let Some(node) = self.find_node(node_id) else {
			return Vec::new();
		};
		let Some(kind) = node.resource().map(|r| r.kind) else {
			return Vec::new();
		};
		let parent = ids::parent_prefix_of(&node.id);

		let mut siblings: Vec<(usize, String)> = self
			.nodes
			.iter()
			.filter(|n| n.id != node_id)
			.filter(|n| ids::parent_prefix_of(&n.id) == parent)
			.filter_map(|n| {
				let r = n.resource()?;
				(r.kind == kind).then(|| (r.order, n.id.clone()))
			})
			.collect();
		siblings.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
		siblings.into_iter().map(|(_, id)| id).collect()
	}

	fn restore_preview_positions(&mut self) {
		for node in &mut self.nodes {
			let original = node
				.resource_mut()
				.and_then(|r| r.original_position.take());
			if let Some(position) = original {
				node.position = position;
			}
		}
	}

	/// Leave the drag state machine: restore spaced-out siblings and re-run
	/// the full layout.
	pub fn clear_drag_and_auto_arrange(store: &Rc<RefCell<GraphStore>>) {
		{
			let mut s = store.borrow_mut();
			s.restore_preview_positions();
			s.dragged_node_id = None;
			s.drag_preview = None;
		}
		GraphStore::auto_arrange_and_fit_view(store);
	}

	/// Swap the order fields of two same-type siblings.
	pub fn reorder_nodes(&mut self, a_id: &str, b_id: &str) {
		let Some(a_order) = self.find_node(a_id).and_then(|n| n.resource()).map(|r| r.order)
		else {
			return;
		};
		let Some(b_order) = self.find_node(b_id).and_then(|n| n.resource()).map(|r| r.order)
		else {
			return;
		};
		if let Some(r) = self.find_node_mut(a_id).and_then(Node::resource_mut) {
			r.order = b_order;
		}
		if let Some(r) = self.find_node_mut(b_id).and_then(Node::resource_mut) {
			r.order = a_order;
		}
	}

	/// Commit a drag: the dragged node lands right after `target` (or first,
	/// when `target` is `None`); later siblings slide one slot down. The next
	/// layout pass reflects the new order.
	pub fn insert_node_after(&mut self, dragged_id: &str, target: Option<&str>) {
		let siblings = self.sibling_ids(dragged_id);
		match target {
			Some(target_id) => {
				let Some(target_order) = self
					.find_node(target_id)
					.and_then(|n| n.resource())
					.map(|r| r.order)
				else {
					return;
				};
				for id in siblings {
					let Some(r) = self.find_node_mut(&id).and_then(Node::resource_mut) else {
						continue;
					};
					if r.order > target_order {
						r.order += 1;
					}
				}
				if let Some(r) = self.find_node_mut(dragged_id).and_then(Node::resource_mut) {
					r.order = target_order + 1;
				}
			}
			None => {
				for id in siblings {
					if let Some(r) = self.find_node_mut(&id).and_then(Node::resource_mut) {
						r.order += 1;
					}
				}
				if let Some(r) = self.find_node_mut(dragged_id).and_then(Node::resource_mut) {
					r.order = 0;
				}
			}
		}
	}

	// --- change application ---------------------------------------------------

	pub fn apply_node_changes(&mut self, changes: Vec<NodeChange>) {
		for change in changes {
			match change {
				NodeChange::Position { id, position } => {
					if let Some(node) = self.find_node_mut(&id) {
						node.position = position;
					}
				}
				NodeChange::Dimensions { id, size } => {
					if let Some(node) = self.find_node_mut(&id) {
						node.size = Some(size);
					}
				}
				NodeChange::Select { id, selected } => {
					if selected {
						select_only(&mut self.nodes, Some(&id));
						self.selected_node_id = Some(id);
					} else if let Some(node) = self.find_node_mut(&id) {
						node.selected = false;
						if self.selected_node_id.as_deref() == Some(&id) {
							self.selected_node_id = None;
						}
					}
				}
				NodeChange::Remove { id } => self.request_remove(&id),
			}
		}
	}

	/// Node removal is delegated: the store never drops nodes itself, it
	/// waits for the next prop update to reflect the removal.
	pub fn delete_node(&mut self, node_id: &str) {
		self.request_remove(node_id);
	}

	fn request_remove(&mut self, node_id: &str) {
		if self.mode() != Mode::Design {
			return;
		}
		let Some(node) = self.find_node(node_id) else {
			return;
		};
		// agents and the singleton model are structurally protected
		match &node.data {
			NodeData::Agent(_) => return,
			NodeData::Resource(r) if r.kind == ResourceKind::Model => return,
			NodeData::Resource(_) => {}
		}
		let Some(rid) = ids::resource_id_of(node_id) else {
			return;
		};
		let Some(resource) = self
			.props
			.as_ref()
			.and_then(|p| p.resources.iter().find(|r| r.id == rid))
			.cloned()
		else {
			return;
		};
		self.callbacks.emit_remove_resource(resource);
	}

	pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) {
		if self.mode() != Mode::Design {
			return;
		}
		for change in changes {
			let EdgeChange::Remove { id } = change;
			let Some(pos) = self.edges.iter().position(|e| e.id == id) else {
				continue;
			};
			let (source, target) =
				(self.edges[pos].source.clone(), self.edges[pos].target.clone());
			let source_node = self.find_node(&source);
			let target_node = self.find_node(&target);
			let touches_agent = source_node.is_some_and(Node::is_agent)
				|| target_node.is_some_and(Node::is_agent);
			if touches_agent && source_node.is_some() && target_node.is_some() {
				// agent edges only disappear as cleanup after their other
				// endpoint is gone
				continue;
			}
			self.edges.remove(pos);
		}
	}

	// --- nested agents --------------------------------------------------------

	/// Expand a tool resource that is itself an agent into a nested subgraph.
	pub fn expand_agent(
		store: &Rc<RefCell<GraphStore>>,
		resource_id: &str,
		definition: AgentDefinition,
	) {
		{
			let mut s = store.borrow_mut();
			let expandable = s
				.props
				.as_ref()
				.and_then(|p| p.resources.iter().find(|r| r.id == resource_id))
				.is_some_and(Resource::is_expandable_agent);
			if !expandable {
				return;
			}
			let Some(node_id) = s
				.nodes
				.iter()
				.find(|n| ids::matches_resource(&n.id, resource_id))
				.map(|n| n.id.clone())
			else {
				return;
			};
			let prefix = ids::nested_prefix(&node_id);
			if s.nodes.iter().any(|n| n.id.starts_with(&prefix)) {
				return; // already expanded
			}

			let nested_props = GraphProps {
				mode: s.mode(),
				name: definition.name.clone(),
				description: definition.description.clone(),
				resources: definition.resources.clone(),
				model: definition.model.clone(),
				definition: definition.clone(),
				spans: Vec::new(),
				active_resource_ids: Vec::new(),
				suggestion_group: None,
				parent_node_id: Some(node_id.clone()),
				initial_selected_resource_id: None,
			};
			let (mut nested_nodes, nested_edges) = builder::build_graph(&nested_props, &[]);
			let nested_agent_id = ids::agent_node_id(Some(&node_id), &definition.process_key);

			s.nodes.append(&mut nested_nodes);
			s.edges.extend(nested_edges);
			s.edges.push(Edge {
				id: ids::edge_id(&node_id, &nested_agent_id),
				source: node_id,
				target: nested_agent_id.clone(),
				source_handle: super::types::Handle::Tool,
				target_handle: super::types::Handle::Tool,
				kind: EdgeKind::Connector,
				animated: false,
				selectable: false,
			});
			s.set_selected_node_id(Some(nested_agent_id));
			debug!("expanded nested agent for resource {resource_id}");
		}
		GraphStore::auto_arrange_and_fit_view(store);
	}

	/// Remove a previously expanded nested subgraph.
	pub fn collapse_agent(store: &Rc<RefCell<GraphStore>>, resource_id: &str) {
		{
			let mut s = store.borrow_mut();
			let Some(node_id) = s
				.nodes
				.iter()
				.find(|n| ids::matches_resource(&n.id, resource_id))
				.map(|n| n.id.clone())
			else {
				return;
			};
			let prefix = ids::nested_prefix(&node_id);
			let removed: HashSet<String> = s
				.nodes
				.iter()
				.filter(|n| n.id.starts_with(&prefix))
				.map(|n| n.id.clone())
				.collect();
			if removed.is_empty() {
				return;
			}
			s.nodes.retain(|n| !removed.contains(&n.id));
			s.edges
				.retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
			if s
				.selected_node_id
				.as_ref()
				.is_some_and(|id| removed.contains(id))
			{
				s.selected_node_id = None;
			}
		}
		GraphStore::auto_arrange_and_fit_view(store);
	}

	// --- arrangement ----------------------------------------------------------

	/// Defer arrangement until every node reports a measured size, then lay
	/// out and fit the viewport on the following frame. The poll is unbounded;
	/// if sizes never stabilize, arrangement never fires.
	pub fn auto_arrange_and_fit_view(store: &Rc<RefCell<GraphStore>>) {
		let st = Rc::clone(store);
		let scheduler = store.borrow().scheduler.clone();
		scheduler.next_frame(Box::new(move || {
			let ready = {
				let s = st.borrow();
				!s.nodes.is_empty() && s.nodes.iter().all(|n| n.size.is_some())
			};
			if !ready {
				GraphStore::auto_arrange_and_fit_view(&st);
				return;
			}
			{
				let mut s = st.borrow_mut();
				let arranged = layout::auto_arrange(&s.nodes, &s.edges);
				s.nodes = arranged;
			}
			let st_fit = Rc::clone(&st);
			let scheduler = st.borrow().scheduler.clone();
			scheduler.next_frame(Box::new(move || st_fit.borrow_mut().fit_view()));
		}));
	}

	/// Fit the node bounding box into the canvas extent.
	pub fn fit_view(&mut self) {
		if self.nodes.is_empty() || self.width <= 0.0 || self.height <= 0.0 {
			return;
		}
		let mut min_x = f64::INFINITY;
		let mut min_y = f64::INFINITY;
		let mut max_x = f64::NEG_INFINITY;
		let mut max_y = f64::NEG_INFINITY;
		for node in &self.nodes {
			let size = node.size_or_nominal();
			min_x = min_x.min(node.position.x);
			min_y = min_y.min(node.position.y);
			max_x = max_x.max(node.position.x + size.width);
			max_y = max_y.max(node.position.y + size.height);
		}
		let bbox_w = (max_x - min_x).max(1.0);
		let bbox_h = (max_y - min_y).max(1.0);
		let k = ((self.width - 2.0 * FIT_VIEW_PADDING) / bbox_w)
			.min((self.height - 2.0 * FIT_VIEW_PADDING) / bbox_h)
			.clamp(MIN_ZOOM, MAX_ZOOM);
		self.transform = ViewTransform {
			x: (self.width - bbox_w * k) / 2.0 - min_x * k,
			y: (self.height - bbox_h * k) / 2.0 - min_y * k,
			k,
		};
	}

	// --- suggestions ------------------------------------------------------------

	/// Number of navigable (non-standalone) suggestions.
	pub fn suggestion_count(&self) -> usize {
		self.props
			.as_ref()
			.and_then(|p| p.suggestion_group.as_ref())
			.map_or(0, |g| g.actionable().count())
	}

	pub fn current_suggestion_index(&self) -> usize {
		self.suggestion_index
	}

	pub fn navigate_to_next_suggestion(&mut self) {
		let len = self.suggestion_count();
		if len == 0 {
			return;
		}
		self.suggestion_index = suggestions::wrap_next(self.suggestion_index, len);
		self.select_current_suggestion();
	}

	pub fn navigate_to_previous_suggestion(&mut self) {
		let len = self.suggestion_count();
		if len == 0 {
			return;
		}
		self.suggestion_index = suggestions::wrap_previous(self.suggestion_index, len);
		self.select_current_suggestion();
	}

	fn select_current_suggestion(&mut self) {
		let suggestion = self
			.props
			.as_ref()
			.and_then(|p| p.suggestion_group.as_ref())
			.and_then(|g| g.actionable().nth(self.suggestion_index))
			.cloned();
		let Some(suggestion) = suggestion else {
			return;
		};
		let node_id = match &suggestion.op {
			SuggestionOp::Add(_) => self
				.nodes
				.iter()
				.find(|n| {
					n.resource().is_some_and(|r| {
						r.suggestion
							.as_ref()
							.is_some_and(|m| m.suggestion_id == suggestion.id)
					})
				})
				.map(|n| n.id.clone()),
			_ => self
				.nodes
				.iter()
				.find(|n| ids::matches_resource(&n.id, suggestion.target_resource_id()))
				.map(|n| n.id.clone()),
		};
		if let Some(node_id) = node_id {
			self.set_selected_node_id(Some(node_id));
		}
	}

	/// Forward an accept/reject and resync navigation once the caller's
	/// refreshed props have landed.
	pub fn act_on_suggestion(
		store: &Rc<RefCell<GraphStore>>,
		suggestion_id: &str,
		action: SuggestionAction,
	) {
		let callbacks = store.borrow().callbacks.clone();
		callbacks.emit_act_on_suggestion(suggestion_id.to_string(), action);

		let st = Rc::clone(store);
		let scheduler = store.borrow().scheduler.clone();
		scheduler.microtask(Box::new(move || {
			let mut s = st.borrow_mut();
			let len = s.suggestion_count();
			s.suggestion_index = suggestions::clamp_index(s.suggestion_index, len);
			if len > 0 {
				s.select_current_suggestion();
			}
		}));
	}

	/// Bulk accept/reject. A group holding only standalone placeholders is a
	/// no-op.
	pub fn act_on_suggestion_group(&self, action: SuggestionAction) {
		let Some(group) = self
			.props
			.as_ref()
			.and_then(|p| p.suggestion_group.as_ref())
		else {
			return;
		};
		if group.actionable().next().is_none() {
			return;
		}
		self.callbacks
			.emit_act_on_suggestion_group(group.id.clone(), action);
	}

	/// Ask the embedding application for a placeholder draft; a `None` reply
	/// bypasses placeholder mode and adds the resource directly.
	pub fn request_resource_placeholder(&self, kind: ResourceKind) {
		let cleaned = self
			.props
			.as_ref()
			.and_then(|p| p.suggestion_group.clone())
			.unwrap_or_default()
			.without_standalone();
		if let Some(cb) = &self.callbacks.on_request_resource_placeholder {
			if cb(kind, cleaned).is_some() {
				return;
			}
		}
		self.callbacks.emit_add_resource(kind);
	}

	// --- pass-through resource actions ---------------------------------------

	pub fn toggle_resource_enabled(&self, resource_id: &str, enabled: bool) {
		if let Some(cb) = &self.callbacks.on_toggle_enabled {
			cb(resource_id.to_string(), enabled);
		}
	}

	pub fn add_breakpoint(&self, resource_id: &str) {
		if let Some(cb) = &self.callbacks.on_add_breakpoint {
			cb(resource_id.to_string());
		}
	}

	pub fn remove_breakpoint(&self, resource_id: &str) {
		if let Some(cb) = &self.callbacks.on_remove_breakpoint {
			cb(resource_id.to_string());
		}
	}

	pub fn add_guardrail(&self, resource_id: &str) {
		if let Some(cb) = &self.callbacks.on_add_guardrail {
			cb(resource_id.to_string());
		}
	}

	/// Used by the measurement pass to report canvas-computed node sizes.
	pub fn set_node_size(&mut self, node_id: &str, size: Size) {
		self.apply_node_changes(vec![NodeChange::Dimensions {
			id: node_id.to_string(),
			size,
		}]);
	}

	pub fn set_node_position(&mut self, node_id: &str, position: Position) {
		self.apply_node_changes(vec![NodeChange::Position {
			id: node_id.to_string(),
			position,
		}]);
	}
}

/// Resource nodes keep their identity through the trailing resource id; agent
/// nodes through their parent pointer.
fn same_identity(prev: &Node, new: &Node) -> bool {
	match (&prev.data, &new.data) {
		(NodeData::Agent(a), NodeData::Agent(b)) => a.parent_node_id == b.parent_node_id,
		(NodeData::Resource(_), NodeData::Resource(_)) => {
			matches!(
				(ids::resource_id_of(&prev.id), ids::resource_id_of(&new.id)),
				(Some(a), Some(b)) if a == b
			) && ids::parent_prefix_of(&prev.id) == ids::parent_prefix_of(&new.id)
		}
		_ => false,
	}
}

fn select_only(nodes: &mut [Node], id: Option<&str>) {
	for node in nodes {
		node.selected = Some(node.id.as_str()) == id;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::builder::tests::{props, tool};
	use crate::components::flow_graph::types::{
		Suggestion, SuggestionGroup, SuggestionOp, AGENT_WIDTH, RESOURCE_HEIGHT, RESOURCE_WIDTH,
		SINGLE_NODE_OFFSET,
	};
	use pretty_assertions::assert_eq;
	use std::collections::VecDeque;
	use std::sync::{Arc, Mutex};

	/// Deterministic scheduler: every deferral lands on one queue, drained by
	/// hand. The drain is capped so a self-rescheduling measurement poll cannot
	/// spin a test forever.
	#[derive(Default)]
	struct ManualScheduler {
		queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
	}

	impl ManualScheduler {
		fn run_all(&self) {
			for _ in 0..100 {
				let Some(job) = self.queue.borrow_mut().pop_front() else {
					return;
				};
				job();
			}
		}
	}

	impl Scheduler for ManualScheduler {
		fn delay(&self, _ms: i32, f: Box<dyn FnOnce()>) {
			self.queue.borrow_mut().push_back(f);
		}

		fn next_frame(&self, f: Box<dyn FnOnce()>) {
			self.queue.borrow_mut().push_back(f);
		}

		fn microtask(&self, f: Box<dyn FnOnce()>) {
			self.queue.borrow_mut().push_back(f);
		}
	}

	fn setup(callbacks: GraphCallbacks) -> (Rc<RefCell<GraphStore>>, Rc<ManualScheduler>) {
		let scheduler = Rc::new(ManualScheduler::default());
		let store = Rc::new(RefCell::new(GraphStore::new(
			callbacks,
			scheduler.clone() as Rc<dyn Scheduler>,
		)));
		(store, scheduler)
	}

	fn measure_all(store: &Rc<RefCell<GraphStore>>) {
		let ids: Vec<String> = store.borrow().nodes().iter().map(|n| n.id.clone()).collect();
		let mut s = store.borrow_mut();
		for id in ids {
			let size = s.find_node(&id).map(Node::nominal_size);
			if let Some(size) = size {
				s.set_node_size(&id, size);
			}
		}
	}

	fn position_of(store: &Rc<RefCell<GraphStore>>, node_id: &str) -> Position {
		store
			.borrow()
			.find_node(node_id)
			.map(|n| n.position)
			.unwrap_or_else(|| panic!("missing node {node_id}"))
	}

	fn order_of(store: &Rc<RefCell<GraphStore>>, node_id: &str) -> usize {
		store
			.borrow()
			.find_node(node_id)
			.and_then(|n| n.resource().map(|r| r.order))
			.unwrap_or_else(|| panic!("missing resource node {node_id}"))
	}

	fn delete_suggestion(id: &str, resource_id: &str) -> Suggestion {
		Suggestion {
			id: id.to_string(),
			op: SuggestionOp::Delete {
				resource_id: resource_id.to_string(),
			},
			is_standalone: false,
		}
	}

	fn placeholder_suggestion(id: &str, draft: Resource) -> Suggestion {
		Suggestion {
			id: id.to_string(),
			op: SuggestionOp::Add(draft),
			is_standalone: true,
		}
	}

	fn selection_sink() -> (Arc<Mutex<Vec<Option<String>>>>, GraphCallbacks) {
		let selections: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
		let sink = selections.clone();
		let callbacks = GraphCallbacks {
			on_select_resource: Some(Arc::new(move |id| sink.lock().unwrap().push(id))),
			..Default::default()
		};
		(selections, callbacks)
	}

	#[test]
	fn auto_selects_first_added_resource_and_notifies() {
		let (selections, callbacks) = selection_sink();
		let (store, scheduler) = setup(callbacks);

		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));

		assert_eq!(selections.lock().unwrap().as_slice(), &[Some("t1".to_string())]);
		assert_eq!(store.borrow().selected_node_id(), Some("search:t1"));
		scheduler.run_all();
	}

	#[test]
	fn removal_clears_selection_only_when_selected_node_disappears() {
		let (selections, callbacks) = selection_sink();
		let (store, _) = setup(callbacks);

		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));
		GraphStore::handle_props_update(
			&store,
			props(Mode::Design, vec![tool("t1", "search"), tool("t2", "fetch")]),
		);
		assert_eq!(store.borrow().selected_node_id(), Some("fetch:t2"));

		// removing an unselected resource leaves the selection alone
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t2", "fetch")]));
		assert_eq!(
			selections.lock().unwrap().as_slice(),
			&[Some("t1".to_string()), Some("t2".to_string())]
		);

		// removing the selected resource notifies with None
		GraphStore::handle_props_update(&store, props(Mode::Design, Vec::new()));
		assert_eq!(selections.lock().unwrap().last(), Some(&None));
		assert_eq!(store.borrow().selected_node_id(), None);
	}

	#[test]
	fn initial_selection_wins_over_first_added_auto_select() {
		let (selections, callbacks) = selection_sink();
		let (store, _) = setup(callbacks);

		let mut p = props(Mode::Design, vec![tool("t1", "search"), tool("t2", "fetch")]);
		p.initial_selected_resource_id = Some("t2".to_string());
		GraphStore::handle_props_update(&store, p);

		// the initially selected node is the one actually selected, and the
		// caller is not told about a selection it asked for itself
		assert_eq!(store.borrow().selected_node_id(), Some("fetch:t2"));
		assert!(selections.lock().unwrap().is_empty());

		// later additions notify as usual
		let mut p2 = props(
			Mode::Design,
			vec![tool("t1", "search"), tool("t2", "fetch"), tool("t3", "ping")],
		);
		p2.initial_selected_resource_id = Some("t2".to_string());
		GraphStore::handle_props_update(&store, p2);
		assert_eq!(store.borrow().selected_node_id(), Some("ping:t3"));
		assert_eq!(selections.lock().unwrap().as_slice(), &[Some("t3".to_string())]);
	}

	#[test]
	fn pointer_selection_notifies_only_on_change() {
		let (selections, callbacks) = selection_sink();
		let (store, _) = setup(callbacks);

		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));
		selections.lock().unwrap().clear();

		// clicking the already selected node is silent
		store.borrow_mut().select_from_pointer(Some("search:t1".into()));
		assert!(selections.lock().unwrap().is_empty());

		// the agent node carries no resource id
		store.borrow_mut().select_from_pointer(Some("support_agent".into()));
		assert_eq!(selections.lock().unwrap().as_slice(), &[None]);

		store.borrow_mut().select_from_pointer(Some("search:t1".into()));
		assert_eq!(
			selections.lock().unwrap().as_slice(),
			&[None, Some("t1".to_string())]
		);

		// background click deselects and notifies once
		store.borrow_mut().select_from_pointer(None);
		assert_eq!(store.borrow().selected_node_id(), None);
		assert_eq!(
			selections.lock().unwrap().as_slice(),
			&[None, Some("t1".to_string()), None]
		);
	}

	#[test]
	fn preserves_positions_across_prop_updates() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));

		let moved = Position { x: 5.0, y: 7.0 };
		store.borrow_mut().set_node_position("search:t1", moved);

		GraphStore::handle_props_update(
			&store,
			props(Mode::Design, vec![tool("t1", "search"), tool("t2", "fetch")]),
		);

		assert_eq!(position_of(&store, "search:t1"), moved);
	}

	#[test]
	fn remove_requests_are_delegated_and_protected() {
		let removed: Arc<Mutex<Vec<String>>> = Arc::default();
		let sink = removed.clone();
		let callbacks = GraphCallbacks {
			on_remove_resource: Some(Arc::new(move |r| sink.lock().unwrap().push(r.id))),
			..Default::default()
		};
		let (store, _) = setup(callbacks);

		let mut model = tool("m1", "gpt");
		model.kind = ResourceKind::Model;
		let mut p = props(Mode::Design, vec![tool("t1", "search")]);
		p.model = Some(model);
		GraphStore::handle_props_update(&store, p);
		let node_count = store.borrow().nodes().len();

		store.borrow_mut().delete_node("support_agent");
		store.borrow_mut().delete_node("gpt:m1");
		assert!(removed.lock().unwrap().is_empty());

		store.borrow_mut().delete_node("search:t1");
		assert_eq!(removed.lock().unwrap().as_slice(), &["t1".to_string()]);
		// removal is delegated; the node waits for the next prop update
		assert_eq!(store.borrow().nodes().len(), node_count);
	}

	#[test]
	fn view_mode_blocks_structural_changes() {
		let removed: Arc<Mutex<Vec<String>>> = Arc::default();
		let sink = removed.clone();
		let callbacks = GraphCallbacks {
			on_remove_resource: Some(Arc::new(move |r| sink.lock().unwrap().push(r.id))),
			..Default::default()
		};
		let (store, _) = setup(callbacks);
		GraphStore::handle_props_update(&store, props(Mode::View, vec![tool("t1", "search")]));

		store.borrow_mut().delete_node("search:t1");
		assert!(removed.lock().unwrap().is_empty());

		let edge_count = store.borrow().edges().len();
		store.borrow_mut().apply_edge_changes(vec![EdgeChange::Remove {
			id: ids::edge_id("support_agent", "search:t1"),
		}]);
		assert_eq!(store.borrow().edges().len(), edge_count);
	}

	#[test]
	fn agent_edges_survive_removal_requests() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));

		let edge_id = ids::edge_id("support_agent", "search:t1");
		store
			.borrow_mut()
			.apply_edge_changes(vec![EdgeChange::Remove { id: edge_id.clone() }]);

		assert!(store.borrow().edges().iter().any(|e| e.id == edge_id));
	}

	#[test]
	fn insert_after_target_shifts_later_siblings() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(
			&store,
			props(
				Mode::Design,
				vec![tool("t1", "a"), tool("t2", "b"), tool("t3", "c")],
			),
		);

		store.borrow_mut().insert_node_after("a:t1", Some("c:t3"));

		assert_eq!(order_of(&store, "a:t1"), 3);
		assert_eq!(order_of(&store, "b:t2"), 1);
		assert_eq!(order_of(&store, "c:t3"), 2);
	}

	#[test]
	fn insert_at_head_renumbers_all_siblings() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(
			&store,
			props(
				Mode::Design,
				vec![tool("t1", "a"), tool("t2", "b"), tool("t3", "c")],
			),
		);

		store.borrow_mut().insert_node_after("c:t3", None);

		assert_eq!(order_of(&store, "c:t3"), 0);
		assert_eq!(order_of(&store, "a:t1"), 1);
		assert_eq!(order_of(&store, "b:t2"), 2);
	}

	#[test]
	fn reorder_swaps_order_fields() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(
			&store,
			props(Mode::Design, vec![tool("t1", "a"), tool("t2", "b")]),
		);

		store.borrow_mut().reorder_nodes("a:t1", "b:t2");

		assert_eq!(order_of(&store, "a:t1"), 1);
		assert_eq!(order_of(&store, "b:t2"), 0);
	}

	#[test]
	fn drag_preview_spaces_siblings_and_restores() {
		let (store, _) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(
			&store,
			props(
				Mode::Design,
				vec![tool("t1", "a"), tool("t2", "b"), tool("t3", "c")],
			),
		);

		let b_before = position_of(&store, "b:t2");
		let c_before = position_of(&store, "c:t3");
		let shift = RESOURCE_WIDTH + GROUP_SPACING;

		{
			let mut s = store.borrow_mut();
			s.set_dragging(true, Some("a:t1"));
			s.set_drag_preview(Some("a:t1"), None);
		}
		assert_eq!(position_of(&store, "b:t2").x, b_before.x + shift);
		assert_eq!(position_of(&store, "c:t3").x, c_before.x + shift);

		store.borrow_mut().set_drag_preview(Some("a:t1"), Some("b:t2"));
		assert_eq!(position_of(&store, "b:t2"), b_before);
		assert_eq!(position_of(&store, "c:t3").x, c_before.x + shift);

		store.borrow_mut().set_drag_preview(None, None);
		assert_eq!(position_of(&store, "b:t2"), b_before);
		assert_eq!(position_of(&store, "c:t3"), c_before);
		let originals_cleared = store
			.borrow()
			.nodes()
			.iter()
			.all(|n| n.resource().is_none_or(|r| r.original_position.is_none()));
		assert!(originals_cleared);
	}

	#[test]
	fn standalone_placeholder_selects_without_callback_then_diverts_clicks() {
		let clicks: Arc<Mutex<Vec<ResourceKind>>> = Arc::default();
		let sink = clicks.clone();
		let callbacks = GraphCallbacks {
			on_placeholder_node_click: Some(Arc::new(move |kind, _| {
				sink.lock().unwrap().push(kind);
			})),
			..Default::default()
		};
		let (store, _) = setup(callbacks);

		let mut p = props(Mode::Design, Vec::new());
		p.suggestion_group = Some(SuggestionGroup {
			id: "sg".into(),
			suggestions: vec![placeholder_suggestion("ph", tool("ph-1", "draft"))],
		});
		GraphStore::handle_props_update(&store, p);

		// programmatic appearance selects the placeholder silently
		assert_eq!(store.borrow().selected_node_id(), Some("draft:ph-1"));
		assert!(clicks.lock().unwrap().is_empty());

		// a user click on it opens the creation flow instead of selecting
		store
			.borrow_mut()
			.set_selected_node_id(Some("draft:ph-1".into()));
		assert_eq!(clicks.lock().unwrap().as_slice(), &[ResourceKind::Tool]);
	}

	#[test]
	fn placeholder_auto_accepts_once_when_another_resource_lands() {
		let acts: Arc<Mutex<Vec<(String, SuggestionAction)>>> = Arc::default();
		let sink = acts.clone();
		let callbacks = GraphCallbacks {
			on_act_on_suggestion: Some(Arc::new(move |id, action| {
				sink.lock().unwrap().push((id, action));
			})),
			..Default::default()
		};
		let (store, _) = setup(callbacks);

		let group = SuggestionGroup {
			id: "sg".into(),
			suggestions: vec![placeholder_suggestion("ph", tool("ph-1", "draft"))],
		};
		let mut p1 = props(Mode::Design, vec![tool("t1", "search")]);
		p1.suggestion_group = Some(group.clone());
		GraphStore::handle_props_update(&store, p1);
		assert!(acts.lock().unwrap().is_empty());

		let mut p2 = props(Mode::Design, vec![tool("t1", "search"), tool("t2", "fetch")]);
		p2.suggestion_group = Some(group.clone());
		GraphStore::handle_props_update(&store, p2);
		assert_eq!(
			acts.lock().unwrap().as_slice(),
			&[("ph".to_string(), SuggestionAction::Accept)]
		);

		let mut p3 = props(Mode::Design, vec![tool("t1", "search"), tool("t2", "fetch")]);
		p3.suggestion_group = Some(group);
		GraphStore::handle_props_update(&store, p3);
		assert_eq!(acts.lock().unwrap().len(), 1);
	}

	#[test]
	fn navigation_skips_standalone_and_wraps() {
		let (store, _) = setup(GraphCallbacks::default());

		let mut p = props(Mode::Design, vec![tool("t1", "alpha"), tool("t2", "beta")]);
		p.suggestion_group = Some(SuggestionGroup {
			id: "sg".into(),
			suggestions: vec![
				placeholder_suggestion("ph", tool("ph-1", "draft")),
				delete_suggestion("s1", "t1"),
				delete_suggestion("s2", "t2"),
			],
		});
		GraphStore::handle_props_update(&store, p);

		assert_eq!(store.borrow().suggestion_count(), 2);

		store.borrow_mut().navigate_to_next_suggestion();
		assert_eq!(store.borrow().selected_node_id(), Some("beta:t2"));

		store.borrow_mut().navigate_to_next_suggestion();
		assert_eq!(store.borrow().selected_node_id(), Some("alpha:t1"));

		store.borrow_mut().navigate_to_previous_suggestion();
		assert_eq!(store.borrow().selected_node_id(), Some("beta:t2"));
	}

	#[test]
	fn group_actions_skip_placeholder_only_groups() {
		let acts: Arc<Mutex<Vec<(String, SuggestionAction)>>> = Arc::default();
		let sink = acts.clone();
		let callbacks = GraphCallbacks {
			on_act_on_suggestion_group: Some(Arc::new(move |id, action| {
				sink.lock().unwrap().push((id, action));
			})),
			..Default::default()
		};
		let (store, _) = setup(callbacks);

		let mut p = props(Mode::Design, vec![tool("t1", "alpha")]);
		p.suggestion_group = Some(SuggestionGroup {
			id: "sg".into(),
			suggestions: vec![placeholder_suggestion("ph", tool("ph-1", "draft"))],
		});
		GraphStore::handle_props_update(&store, p);

		store.borrow().act_on_suggestion_group(SuggestionAction::Accept);
		assert!(acts.lock().unwrap().is_empty());

		let mut p2 = props(Mode::Design, vec![tool("t1", "alpha")]);
		p2.suggestion_group = Some(SuggestionGroup {
			id: "sg".into(),
			suggestions: vec![delete_suggestion("s1", "t1")],
		});
		GraphStore::handle_props_update(&store, p2);

		store.borrow().act_on_suggestion_group(SuggestionAction::Accept);
		assert_eq!(
			acts.lock().unwrap().as_slice(),
			&[("sg".to_string(), SuggestionAction::Accept)]
		);
	}

	#[test]
	fn expands_and_collapses_nested_agents() {
		let (store, scheduler) = setup(GraphCallbacks::default());

		let mut planner = tool("t1", "planner");
		planner.project_type = Some("agent".into());
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![planner]));

		let definition = AgentDefinition {
			process_key: "child".into(),
			name: "Child".into(),
			description: String::new(),
			resources: vec![tool("c1", "lookup")],
			model: None,
		};
		GraphStore::expand_agent(&store, "t1", definition.clone());

		{
			let s = store.borrow();
			assert!(s.find_node("planner:t1=>child").is_some());
			assert!(s.find_node("planner:t1=>lookup:c1").is_some());
			let connector = s
				.edges()
				.iter()
				.find(|e| e.id == ids::edge_id("planner:t1", "planner:t1=>child"))
				.cloned();
			assert_eq!(connector.map(|e| e.kind), Some(EdgeKind::Connector));
			assert_eq!(s.selected_node_id(), Some("planner:t1=>child"));
		}

		// a second expansion of the same resource is a no-op
		let before = store.borrow().nodes().len();
		GraphStore::expand_agent(&store, "t1", definition);
		assert_eq!(store.borrow().nodes().len(), before);

		// the expansion survives unrelated prop refreshes
		let mut planner2 = tool("t1", "planner");
		planner2.project_type = Some("agent".into());
		GraphStore::handle_props_update(
			&store,
			props(Mode::Design, vec![planner2, tool("t2", "fetch")]),
		);
		assert!(store.borrow().find_node("planner:t1=>child").is_some());
		assert!(store.borrow().find_node("planner:t1=>lookup:c1").is_some());

		GraphStore::collapse_agent(&store, "t1");
		{
			let s = store.borrow();
			assert!(s.find_node("planner:t1=>child").is_none());
			assert!(s.find_node("planner:t1=>lookup:c1").is_none());
			assert!(!s
				.edges()
				.iter()
				.any(|e| e.target == "planner:t1=>child" || e.source == "planner:t1=>child"));
		}
		scheduler.run_all();
	}

	#[test]
	fn arrangement_waits_for_measured_sizes() {
		let (store, scheduler) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));

		let nominal_x = AGENT_WIDTH / 2.0 - RESOURCE_WIDTH / 2.0 + SINGLE_NODE_OFFSET;
		assert_eq!(position_of(&store, "search:t1").x, nominal_x);

		// unmeasured nodes keep the poll alive and the positions untouched
		scheduler.run_all();
		assert_eq!(position_of(&store, "search:t1").x, nominal_x);

		measure_all(&store);
		store.borrow_mut().set_node_size(
			"search:t1",
			Size {
				width: 400.0,
				height: RESOURCE_HEIGHT,
			},
		);
		scheduler.run_all();

		assert_eq!(
			position_of(&store, "search:t1").x,
			AGENT_WIDTH / 2.0 - 200.0 + SINGLE_NODE_OFFSET
		);
		assert_eq!(position_of(&store, "support_agent"), Position::ORIGIN);
	}

	#[test]
	fn fit_view_centers_and_clamps_zoom() {
		let (store, scheduler) = setup(GraphCallbacks::default());
		GraphStore::handle_props_update(&store, props(Mode::Design, vec![tool("t1", "search")]));
		measure_all(&store);
		scheduler.run_all();

		let mut s = store.borrow_mut();
		s.resize(800.0, 600.0);
		s.fit_view();
		assert!(s.transform.k >= 0.1 && s.transform.k <= 1.5);
		assert!(s.transform.k > 0.5);
	}
}
