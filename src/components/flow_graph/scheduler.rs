//! Cooperative scheduling seam for the store's deferred side effects.
//!
//! The store never touches timers directly; it asks a [`Scheduler`] for a
//! short delay (post-add arrangement), the next animation frame (measurement
//! polling, fit-view), or a microtask (letting the caller's prop refresh land
//! before re-reading suggestion state). Tests drive a manual queue instead.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub trait Scheduler {
	fn delay(&self, ms: i32, f: Box<dyn FnOnce()>);
	fn next_frame(&self, f: Box<dyn FnOnce()>);
	fn microtask(&self, f: Box<dyn FnOnce()>);
}

/// Browser-backed scheduler. No-ops outside a window context.
pub struct WebScheduler;

impl Scheduler for WebScheduler {
	fn delay(&self, ms: i32, f: Box<dyn FnOnce()>) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let cb = Closure::once_into_js(f);
		let _ = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms);
	}

	fn next_frame(&self, f: Box<dyn FnOnce()>) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let cb = Closure::once_into_js(f);
		let _ = window.request_animation_frame(cb.unchecked_ref());
	}

	fn microtask(&self, f: Box<dyn FnOnce()>) {
		let mut f = Some(f);
		let cb = Closure::wrap(Box::new(move |_: JsValue| {
			if let Some(f) = f.take() {
				f();
			}
		}) as Box<dyn FnMut(JsValue)>);
		let _ = js_sys::Promise::resolve(&JsValue::UNDEFINED).then(&cb);
		// one-shot: the closure is released once the microtask has run
		cb.forget();
	}
}
