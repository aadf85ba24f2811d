use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::render;
use super::scheduler::WebScheduler;
use super::store::GraphStore;
use super::types::{GraphCallbacks, GraphProps, Position};

const ZOOM_MIN: f64 = 0.1;
const ZOOM_MAX: f64 = 2.5;

/// Pointer bookkeeping local to the canvas; the store only learns about
/// world-space results (positions, previews, commits).
#[derive(Default)]
struct PointerState {
	dragging: Option<String>,
	drag_start: (f64, f64),
	node_start: Position,
	panning: bool,
	pan_start: (f64, f64),
	transform_start: (f64, f64),
}

#[component]
pub fn FlowGraphCanvas(
	#[prop(into)] data: Signal<GraphProps>,
	#[prop(optional)] callbacks: GraphCallbacks,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let store: Rc<RefCell<GraphStore>> = Rc::new(RefCell::new(GraphStore::new(
		callbacks,
		Rc::new(WebScheduler),
	)));
	let pointer: Rc<RefCell<PointerState>> = Rc::default();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (store_init, animate_init, resize_cb_init) =
		(store.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		store_init.borrow_mut().resize(w, h);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		if fullscreen {
			let (store_resize, canvas_resize) = (store_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				store_resize.borrow_mut().resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (store_anim, animate_inner) = (store_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			{
				let mut s = store_anim.borrow_mut();
				s.tick(0.016);
				render::measure_nodes(&mut s, &ctx);
				let (cw, ch) = (s.width(), s.height());
				render::render(&s, &ctx, cw, ch);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let store_props = store.clone();
	Effect::new(move |_| {
		GraphStore::handle_props_update(&store_props, data.get());
	});

	let to_world = |store: &GraphStore, x: f64, y: f64| -> (f64, f64) {
		(
			(x - store.transform.x) / store.transform.k,
			(y - store.transform.y) / store.transform.k,
		)
	};

	let (store_md, pointer_md) = (store.clone(), pointer.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut s = store_md.borrow_mut();
		let mut p = pointer_md.borrow_mut();
		let (wx, wy) = to_world(&s, x, y);
		let hit = s
			.node_at_position(wx, wy)
			.map(|n| (n.id.clone(), n.draggable, n.position));

		match hit {
			Some((id, draggable, position)) => {
				s.select_from_pointer(Some(id.clone()));
				if draggable {
					s.set_dragging(true, Some(&id));
					p.dragging = Some(id);
					p.drag_start = (x, y);
					p.node_start = position;
				}
			}
			None => {
				s.select_from_pointer(None);
				p.panning = true;
				p.pan_start = (x, y);
				p.transform_start = (s.transform.x, s.transform.y);
			}
		}
	};

	let (store_mm, pointer_mm) = (store.clone(), pointer.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut s = store_mm.borrow_mut();
		let p = pointer_mm.borrow();

		if let Some(dragged) = p.dragging.clone() {
			let (dx, dy) = (
				(x - p.drag_start.0) / s.transform.k,
				(y - p.drag_start.1) / s.transform.k,
			);
			s.set_node_position(
				&dragged,
				Position {
					x: p.node_start.x + dx,
					y: p.node_start.y + dy,
				},
			);
			let target = s.drag_insert_target(&dragged);
			s.set_drag_preview(Some(&dragged), target.as_deref());
		} else if p.panning {
			s.transform.x = p.transform_start.0 + (x - p.pan_start.0);
			s.transform.y = p.transform_start.1 + (y - p.pan_start.1);
		}
	};

	let (store_mu, pointer_mu) = (store.clone(), pointer.clone());
	let on_mouseup = move |_: MouseEvent| {
		let dragged = pointer_mu.borrow_mut().dragging.take();
		pointer_mu.borrow_mut().panning = false;

		if let Some(dragged) = dragged {
			let target = store_mu.borrow().drag_insert_target(&dragged);
			store_mu
				.borrow_mut()
				.insert_node_after(&dragged, target.as_deref());
			GraphStore::clear_drag_and_auto_arrange(&store_mu);
		}
	};

	let (store_ml, pointer_ml) = (store.clone(), pointer.clone());
	let on_mouseleave = move |_: MouseEvent| {
		let dragged = pointer_ml.borrow_mut().dragging.take();
		pointer_ml.borrow_mut().panning = false;
		if dragged.is_some() {
			GraphStore::clear_drag_and_auto_arrange(&store_ml);
		}
	};

	let store_wh = store.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut s = store_wh.borrow_mut();
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		let new_k = (s.transform.k * factor).clamp(ZOOM_MIN, ZOOM_MAX);
		let ratio = new_k / s.transform.k;
		s.transform.x = x - (x - s.transform.x) * ratio;
		s.transform.y = y - (y - s.transform.y) * ratio;
		s.transform.k = new_k;
	};

	let store_kd = store.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Delete" || ev.key() == "Backspace" {
			let selected = store_kd.borrow().selected_node_id().map(str::to_string);
			if let Some(id) = selected {
				store_kd.borrow_mut().delete_node(&id);
			}
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="flow-graph-canvas"
			tabindex="0"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:keydown=on_keydown
			style="display: block; cursor: grab; outline: none;"
		/>
	}
}
