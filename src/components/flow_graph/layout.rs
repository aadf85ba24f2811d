//! Deterministic auto-arrangement.
//!
//! Positions every node reachable from the root agent: the agent anchors at
//! the origin, resources stack on the side their handle maps to, and expanded
//! nested agents recurse to the right of the resource that spawned them.
//! Pure over its inputs; nodes not reachable from an agent pass through
//! unmodified.

use std::collections::HashMap;

use super::ids;
use super::types::{
	Edge, EdgeKind, Handle, Node, NodeData, Position, ResourceKind, Side, Size, GROUP_SPACING,
	MODEL_HANDLE_OFFSET, NESTED_AGENT_GAP, NESTED_AGENT_TOP_EXTRA, SIDE_GAP, SINGLE_NODE_OFFSET,
};

/// Arrange the graph around its root agent. Returns a positioned clone.
pub fn auto_arrange(nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
	let mut arranged = nodes.to_vec();
	let Some(root_id) = arranged
		.iter()
		.find(|n| n.is_root_agent())
		.map(|n| n.id.clone())
	else {
		return arranged;
	};

	if let Some(root) = arranged.iter_mut().find(|n| n.id == root_id) {
		root.position = Position::ORIGIN;
	}

	let mut depth_floors: Vec<f64> = Vec::new();
	arrange_agent(&mut arranged, edges, &root_id, 1, &mut depth_floors);
	arranged
}

/// Place every resource attached to `agent_id`, then recurse into expansions.
fn arrange_agent(
	nodes: &mut Vec<Node>,
	edges: &[Edge],
	agent_id: &str,
	depth: usize,
	depth_floors: &mut Vec<f64>,
) {
	let Some(agent) = nodes.iter().find(|n| n.id == agent_id) else {
		return;
	};
	let agent_pos = agent.position;
	let agent_size = agent.size_or_nominal();

	let mut grouped: HashMap<Handle, Vec<usize>> = HashMap::new();
	for edge in edges.iter().filter(|e| e.kind == EdgeKind::Default) {
		let Some(other) = edge.other_endpoint(agent_id) else {
			continue;
		};
		let handle = if edge.source == agent_id {
			edge.source_handle
		} else {
			edge.target_handle
		};
		if let Some(idx) = nodes.iter().position(|n| n.id == other) {
			grouped.entry(handle).or_default().push(idx);
		}
	}

	// Same-type siblings reflect drag-reordering through their order field.
	for idxs in grouped.values_mut() {
		idxs.sort_by(|&a, &b| {
			let oa = nodes[a].resource().map_or(0, |r| r.order);
			let ob = nodes[b].resource().map_or(0, |r| r.order);
			oa.cmp(&ob).then_with(|| nodes[a].id.cmp(&nodes[b].id))
		});
	}

	let mut by_side: [(Side, Vec<(Handle, Vec<usize>)>); 4] = [
		(Side::Left, Vec::new()),
		(Side::Right, Vec::new()),
		(Side::Top, Vec::new()),
		(Side::Bottom, Vec::new()),
	];
	for handle in Handle::ALL {
		if let Some(idxs) = grouped.remove(&handle) {
			if !idxs.is_empty() {
				by_side[side_slot(handle.side())].1.push((handle, idxs));
			}
		}
	}

	let attached: Vec<usize> = by_side
		.iter()
		.flat_map(|(_, groups)| groups.iter().flat_map(|(_, idxs)| idxs.iter().copied()))
		.collect();

	for (side, groups) in &by_side {
		if groups.is_empty() {
			continue;
		}
		if side.is_row() {
			place_row(nodes, groups, *side, agent_pos, agent_size);
		} else {
			place_column(nodes, groups, *side, agent_pos, agent_size);
		}
	}

	// Expanded sub-agents fan out to the right of the resource that owns them,
	// stacked per depth so sibling expansions never overlap.
	for res_idx in attached {
		let res_id = nodes[res_idx].id.clone();
		let Some(nested_idx) = nodes.iter().position(
			|n| matches!(&n.data, NodeData::Agent(a) if a.parent_node_id.as_deref() == Some(res_id.as_str())),
		) else {
			continue;
		};
		let nested_id = nodes[nested_idx].id.clone();

		let res_pos = nodes[res_idx].position;
		let res_size = nodes[res_idx].size_or_nominal();
		let nested_size = nodes[nested_idx].size_or_nominal();
		let extra = if agent_has_top_connections(edges, &nested_id) {
			NESTED_AGENT_TOP_EXTRA
		} else {
			0.0
		};

		let base_y = res_pos.y + res_size.height / 2.0 - nested_size.height / 2.0;
		let y = base_y.max(depth_floor(depth_floors, depth));
		nodes[nested_idx].position = Position {
			x: res_pos.x + res_size.width + NESTED_AGENT_GAP + extra,
			y,
		};

		arrange_agent(nodes, edges, &nested_id, depth + 1, depth_floors);

		let bottom = subtree_bottom(nodes, &ids::nested_prefix(&res_id), y + nested_size.height);
		raise_depth_floor(depth_floors, depth, bottom + 2.0 * GROUP_SPACING);
	}
}

fn side_slot(side: Side) -> usize {
	match side {
		Side::Left => 0,
		Side::Right => 1,
		Side::Top => 2,
		Side::Bottom => 3,
	}
}

/// Vertical stack on the left/right side, centered on the agent midpoint.
fn place_column(
	nodes: &mut [Node],
	groups: &[(Handle, Vec<usize>)],
	side: Side,
	agent_pos: Position,
	agent_size: Size,
) {
	let indices: Vec<usize> = groups
		.iter()
		.flat_map(|(_, idxs)| idxs.iter().copied())
		.collect();

	// A lone model node sits level with the model handle, not stack-centered.
	if let [idx] = indices[..] {
		if nodes[idx].resource().map(|r| r.kind) == Some(ResourceKind::Model) {
			let size = nodes[idx].size_or_nominal();
			nodes[idx].position = Position {
				x: column_x(side, agent_pos, agent_size, size.width),
				y: agent_pos.y + MODEL_HANDLE_OFFSET - size.height / 2.0,
			};
			return;
		}
	}

	let total: f64 = indices
		.iter()
		.map(|&i| nodes[i].size_or_nominal().height)
		.sum::<f64>()
		+ GROUP_SPACING * indices.len().saturating_sub(1) as f64;
	let mut y = agent_pos.y + agent_size.height / 2.0 - total / 2.0;
	for idx in indices {
		let size = nodes[idx].size_or_nominal();
		nodes[idx].position = Position {
			x: column_x(side, agent_pos, agent_size, size.width),
			y,
		};
		y += size.height + GROUP_SPACING;
	}
}

fn column_x(side: Side, agent_pos: Position, agent_size: Size, node_width: f64) -> f64 {
	match side {
		Side::Left => agent_pos.x - SIDE_GAP - node_width,
		_ => agent_pos.x + agent_size.width + SIDE_GAP,
	}
}

/// Horizontal row above/below the agent, distributed by handle-type count.
fn place_row(
	nodes: &mut [Node],
	groups: &[(Handle, Vec<usize>)],
	side: Side,
	agent_pos: Position,
	agent_size: Size,
) {
	let cx = agent_pos.x + agent_size.width / 2.0;
	let widths: Vec<f64> = groups
		.iter()
		.map(|(_, idxs)| group_width(nodes, idxs))
		.collect();

	let starts: Vec<f64> = match groups.len() {
		1 => {
			let mut start = cx - widths[0] / 2.0;
			if groups[0].1.len() == 1 {
				// Avoid a visually straight vertical edge for a single node.
				start += SINGLE_NODE_OFFSET;
			}
			vec![start]
		}
		2 => vec![cx - GROUP_SPACING - widths[0], cx + GROUP_SPACING],
		3 => {
			let middle = cx - widths[1] / 2.0;
			vec![
				middle - 2.0 * GROUP_SPACING - widths[0],
				middle,
				middle + widths[1] + 2.0 * GROUP_SPACING,
			]
		}
		n => {
			let total: f64 = widths.iter().sum::<f64>() + 2.0 * GROUP_SPACING * (n - 1) as f64;
			let mut start = cx - total / 2.0;
			widths
				.iter()
				.map(|w| {
					let s = start;
					start += w + 2.0 * GROUP_SPACING;
					s
				})
				.collect()
		}
	};

	for ((_, idxs), start) in groups.iter().zip(starts) {
		let mut x = start;
		for &idx in idxs {
			let size = nodes[idx].size_or_nominal();
			let y = match side {
				Side::Top => agent_pos.y - SIDE_GAP - size.height,
				_ => agent_pos.y + agent_size.height + SIDE_GAP,
			};
			nodes[idx].position = Position { x, y };
			x += size.width + GROUP_SPACING;
		}
	}
}

fn group_width(nodes: &[Node], idxs: &[usize]) -> f64 {
	idxs.iter()
		.map(|&i| nodes[i].size_or_nominal().width)
		.sum::<f64>()
		+ GROUP_SPACING * idxs.len().saturating_sub(1) as f64
}

fn agent_has_top_connections(edges: &[Edge], agent_id: &str) -> bool {
	edges.iter().filter(|e| e.kind == EdgeKind::Default).any(|e| {
		let handle = if e.source == agent_id {
			Some(e.source_handle)
		} else if e.target == agent_id {
			Some(e.target_handle)
		} else {
			None
		};
		handle.is_some_and(|h| h.side() == Side::Top)
	})
}

fn depth_floor(floors: &[f64], depth: usize) -> f64 {
	floors.get(depth).copied().unwrap_or(f64::NEG_INFINITY)
}

fn raise_depth_floor(floors: &mut Vec<f64>, depth: usize, value: f64) {
	if floors.len() <= depth {
		floors.resize(depth + 1, f64::NEG_INFINITY);
	}
	floors[depth] = floors[depth].max(value);
}

fn subtree_bottom(nodes: &[Node], prefix: &str, fallback: f64) -> f64 {
	nodes
		.iter()
		.filter(|n| n.id.starts_with(prefix))
		.map(|n| n.position.y + n.size_or_nominal().height)
		.fold(fallback, f64::max)
}
