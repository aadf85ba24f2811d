use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::store::GraphStore;
use super::types::{EdgeKind, Node, NodeData, Side, SuggestionKind, MODEL_HANDLE_OFFSET};

const BACKGROUND: &str = "#12121a";
const AGENT_FILL: &str = "#2a2a45";
const RESOURCE_FILL: &str = "#1e1e32";
const BORDER: &str = "rgba(140, 150, 190, 0.5)";
const SELECTION: &str = "#64b4ff";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.55)";
const CONNECTOR_COLOR: &str = "rgba(160, 160, 180, 0.45)";
const SUGGEST_ADD: &str = "#4caf7d";
const SUGGEST_UPDATE: &str = "#e0a84c";
const SUGGEST_DELETE: &str = "#e05c5c";
const CORNER_RADIUS: f64 = 8.0;

pub fn render(store: &GraphStore, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(store.transform.x, store.transform.y);
	let _ = ctx.scale(store.transform.k, store.transform.k);
	draw_edges(store, ctx);
	draw_nodes(store, ctx);
	ctx.restore();
}

fn draw_edges(store: &GraphStore, ctx: &CanvasRenderingContext2d) {
	let k = store.transform.k;
	let (line_width, dash, gap) = (1.5 / k, 8.0 / k, 4.0 / k);
	let dash_offset = -(store.flow_time * 30.0) % (dash + gap);

	for edge in store.edges() {
		let (Some(source), Some(target)) =
			(store.find_node(&edge.source), store.find_node(&edge.target))
		else {
			continue;
		};
		// The handle side names the agent's side; the far endpoint faces back.
		// Connector edges run resource-to-expansion and always go rightward.
		let side = if edge.kind == EdgeKind::Connector {
			Side::Right
		} else {
			edge.source_handle.side()
		};
		let (x1, y1) = endpoint_anchor(source, side, edge.kind);
		let (x2, y2) = endpoint_anchor(target, side, edge.kind);

		match edge.kind {
			EdgeKind::Connector => {
				ctx.set_stroke_style_str(CONNECTOR_COLOR);
				ctx.set_line_width(line_width);
				set_dash(ctx, dash, gap);
				ctx.set_line_dash_offset(0.0);
			}
			EdgeKind::Default if edge.animated => {
				ctx.set_stroke_style_str(EDGE_COLOR);
				ctx.set_line_width(line_width * 1.4);
				set_dash(ctx, dash, gap);
				ctx.set_line_dash_offset(dash_offset);
			}
			EdgeKind::Default => {
				ctx.set_stroke_style_str(EDGE_COLOR);
				ctx.set_line_width(line_width);
				clear_dash(ctx);
			}
		}

		// Cubic curve bowing along the handle axis, so parallel edges of one
		// side stay visually distinct.
		let (c1x, c1y, c2x, c2y) = control_points(side, x1, y1, x2, y2);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.bezier_curve_to(c1x, c1y, c2x, c2y, x2, y2);
		ctx.stroke();
	}
	clear_dash(ctx);
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: f64, gap: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
}

fn clear_dash(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn control_points(side: Side, x1: f64, y1: f64, x2: f64, y2: f64) -> (f64, f64, f64, f64) {
	if side.is_row() {
		let bow = ((y2 - y1) * 0.5).abs().max(24.0);
		let dir = if y2 >= y1 { 1.0 } else { -1.0 };
		(x1, y1 + dir * bow, x2, y2 - dir * bow)
	} else {
		let bow = ((x2 - x1) * 0.5).abs().max(24.0);
		let dir = if x2 >= x1 { 1.0 } else { -1.0 };
		(x1 + dir * bow, y1, x2 - dir * bow, y2)
	}
}

/// Anchor point of an edge endpoint. Agents anchor on the handle's own side
/// (the model handle at a fixed offset down the left edge), resources on the
/// side facing back at the agent. Connector endpoints always run left-to-right.
fn endpoint_anchor(node: &Node, side: Side, kind: EdgeKind) -> (f64, f64) {
	let size = node.size_or_nominal();
	let (x, y) = (node.position.x, node.position.y);

	let facing = match kind {
		EdgeKind::Connector if node.is_agent() => Side::Left,
		EdgeKind::Connector => Side::Right,
		EdgeKind::Default if node.is_agent() => {
			if side == Side::Left {
				return (x, y + MODEL_HANDLE_OFFSET);
			}
			side
		}
		EdgeKind::Default => opposite(side),
	};
	match facing {
		Side::Top => (x + size.width / 2.0, y),
		Side::Bottom => (x + size.width / 2.0, y + size.height),
		Side::Left => (x, y + size.height / 2.0),
		Side::Right => (x + size.width, y + size.height / 2.0),
	}
}

fn opposite(side: Side) -> Side {
	match side {
		Side::Top => Side::Bottom,
		Side::Bottom => Side::Top,
		Side::Left => Side::Right,
		Side::Right => Side::Left,
	}
}

fn draw_nodes(store: &GraphStore, ctx: &CanvasRenderingContext2d) {
	let k = store.transform.k;
	for node in store.nodes() {
		let size = node.size_or_nominal();
		let (x, y, w, h) = (node.position.x, node.position.y, size.width, size.height);

		let suggestion = node.resource().and_then(|r| r.suggestion.as_ref());
		let deleted = suggestion.is_some_and(|m| m.kind == SuggestionKind::Delete);
		if deleted {
			ctx.set_global_alpha(0.45);
		}

		rounded_rect(ctx, x, y, w, h, CORNER_RADIUS);
		ctx.set_fill_style_str(if node.is_agent() {
			AGENT_FILL
		} else {
			RESOURCE_FILL
		});
		ctx.fill();

		match suggestion.map(|m| (m.kind, m.standalone)) {
			Some((SuggestionKind::Add, true)) => {
				set_dash(ctx, 6.0 / k, 4.0 / k);
				ctx.set_stroke_style_str(BORDER);
			}
			Some((SuggestionKind::Add, false)) => {
				set_dash(ctx, 6.0 / k, 4.0 / k);
				ctx.set_stroke_style_str(SUGGEST_ADD);
			}
			Some((SuggestionKind::Update, _)) => {
				clear_dash(ctx);
				ctx.set_stroke_style_str(SUGGEST_UPDATE);
			}
			Some((SuggestionKind::Delete, _)) => {
				set_dash(ctx, 6.0 / k, 4.0 / k);
				ctx.set_stroke_style_str(SUGGEST_DELETE);
			}
			None => {
				clear_dash(ctx);
				ctx.set_stroke_style_str(BORDER);
			}
		}
		ctx.set_line_width(1.5 / k);
		rounded_rect(ctx, x, y, w, h, CORNER_RADIUS);
		ctx.stroke();
		clear_dash(ctx);

		if node.selected {
			rounded_rect(
				ctx,
				x - 3.0 / k,
				y - 3.0 / k,
				w + 6.0 / k,
				h + 6.0 / k,
				CORNER_RADIUS + 3.0 / k,
			);
			ctx.set_stroke_style_str(SELECTION);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		draw_labels(ctx, node, x, y, w, h);
		if let Some(resource) = node.resource() {
			draw_status_dot(ctx, store, resource, x, y, w);
		}

		if deleted {
			ctx.set_global_alpha(1.0);
		}
	}
}

fn draw_labels(ctx: &CanvasRenderingContext2d, node: &Node, x: f64, y: f64, w: f64, h: f64) {
	ctx.set_text_align("center");
	match &node.data {
		NodeData::Agent(agent) => {
			ctx.set_fill_style_str("white");
			ctx.set_font("600 15px sans-serif");
			let _ = ctx.fill_text(&agent.name, x + w / 2.0, y + h / 2.0 - 4.0);
			if !agent.description.is_empty() {
				ctx.set_fill_style_str("rgba(255, 255, 255, 0.55)");
				ctx.set_font("12px sans-serif");
				let _ = ctx.fill_text(&agent.description, x + w / 2.0, y + h / 2.0 + 14.0);
			}
		}
		NodeData::Resource(resource) => {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.5)");
			ctx.set_font("10px sans-serif");
			let _ = ctx.fill_text(resource.kind.label(), x + w / 2.0, y + 16.0);
			ctx.set_fill_style_str("white");
			ctx.set_font("13px sans-serif");
			let _ = ctx.fill_text(&resource.name, x + w / 2.0, y + h / 2.0 + 8.0);
		}
	}
	ctx.set_text_align("start");
}

fn draw_status_dot(
	ctx: &CanvasRenderingContext2d,
	store: &GraphStore,
	resource: &super::types::ResourceData,
	x: f64,
	y: f64,
	w: f64,
) {
	let color = if resource.has_error {
		"#e05c5c"
	} else if resource.has_running {
		"#64b4ff"
	} else if resource.has_success {
		"#4caf7d"
	} else if resource.is_active {
		"#e0a84c"
	} else {
		return;
	};
	let pulse = if resource.has_running {
		0.75 + 0.25 * (store.flow_time * 4.0).sin()
	} else {
		1.0
	};
	ctx.set_global_alpha(pulse);
	ctx.begin_path();
	let _ = ctx.arc(x + w - 10.0, y + 10.0, 4.0, 0.0, 2.0 * std::f64::consts::PI);
	ctx.set_fill_style_str(color);
	ctx.fill();
	ctx.set_global_alpha(1.0);
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

/// Measure every unmeasured node against rendered label width, widening past
/// the nominal size when the name demands it.
pub fn measure_nodes(store: &mut GraphStore, ctx: &CanvasRenderingContext2d) {
	let unmeasured: Vec<(String, String, f64, f64)> = store
		.nodes()
		.iter()
		.filter(|n| n.size.is_none())
		.map(|n| {
			let nominal = n.nominal_size();
			let label = match &n.data {
				NodeData::Agent(a) => a.name.clone(),
				NodeData::Resource(r) => r.name.clone(),
			};
			(n.id.clone(), label, nominal.width, nominal.height)
		})
		.collect();

	ctx.set_font("13px sans-serif");
	for (id, label, nominal_w, nominal_h) in unmeasured {
		let text_w = ctx
			.measure_text(&label)
			.map(|m| m.width())
			.unwrap_or(0.0);
		store.set_node_size(
			&id,
			super::types::Size {
				width: nominal_w.max(text_w + 32.0),
				height: nominal_h,
			},
		);
	}
}
