use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlLinkElement, MouseEvent, PointerEvent, WheelEvent};

use super::config::{GraphConfig, PanButton};
use super::interaction::InteractionEvent;
use super::render;
use super::state::ForceGraphState;
use super::types::GraphData;
use crate::data::{CancelToken, HttpSource, assemble, navigation_path};

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GraphStatus {
	Loading,
	Ready,
	Unavailable,
}

/// DOM handles and graph state shared by the frame loop and event handlers.
#[derive(Default)]
struct Mounted {
	canvas: Option<HtmlCanvasElement>,
	ctx: Option<CanvasRenderingContext2d>,
	dpr: f64,
	state: Option<ForceGraphState>,
	/// Data that arrived before the canvas was ready.
	pending: Option<GraphData>,
	cancel: Option<CancelToken>,
	prefetched: HashSet<String>,
	raf_handle: Option<i32>,
}

impl Mounted {
	/// Builds the graph for `data`, or replaces the one already shown.
	fn install(&mut self, data: GraphData, config: &GraphConfig) {
		let (Some(canvas), Some(ctx)) = (&self.canvas, &self.ctx) else {
			self.pending = Some(data);
			return;
		};
		ctx.set_font(&render::font(config.font_size, &config.font_family));
		let measure = |text: &str| {
			ctx.measure_text(text)
				.map(|m| m.width())
				.unwrap_or(text.chars().count() as f64 * config.font_size * 0.6)
		};
		let scope: &Element = canvas;

		match &mut self.state {
			Some(state) => state.rebuild(data, &measure, Some(scope)),
			None => {
				let (w, h) = container_size(canvas);
				self.state = Some(ForceGraphState::new(data, config.clone(), w, h, &measure, Some(scope)));
			}
		}
	}

	fn position(&self, ev: &MouseEvent) -> Option<(f64, f64)> {
		let rect = self.canvas.as_ref()?.get_bounding_client_rect();
		Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
	}

	/// Applies an interaction outcome; returns a path to navigate to.
	fn react(&mut self, event: InteractionEvent) -> Option<String> {
		let state = self.state.as_ref()?;
		match event {
			InteractionEvent::HoverChanged(hovered) => {
				if let Some(canvas) = &self.canvas {
					let cursor = if hovered.is_some() { "pointer" } else { "grab" };
					let _ = web_sys::HtmlElement::style(canvas).set_property("cursor", cursor);
				}
				let id = hovered.and_then(|h| state.document_id(h))?;
				if self.prefetched.insert(id.to_owned()) {
					prefetch(&navigation_path(id));
				}
				None
			}
			InteractionEvent::Navigate(node) => state.document_id(node).map(navigation_path),
		}
	}

	fn teardown(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel.cancel();
		}
		if let (Some(handle), Some(window)) = (self.raf_handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(handle);
		}
		if let Some(state) = self.state.as_mut() {
			state.dispose();
		}
		self.state = None;
		self.pending = None;
	}
}

fn container_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((DEFAULT_WIDTH, DEFAULT_HEIGHT))
}

fn size_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64, dpr: f64) {
	canvas.set_width((width * dpr) as u32);
	canvas.set_height((height * dpr) as u32);
	let style = web_sys::HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{width}px"));
	let _ = style.set_property("height", &format!("{height}px"));
}

/// Hints the browser to fetch a page the pointer is resting on.
fn prefetch(href: &str) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	let (Some(head), Ok(link)) = (document.head(), document.create_element("link")) else {
		return;
	};
	let Ok(link) = link.dyn_into::<HtmlLinkElement>() else {
		return;
	};
	link.set_rel("prefetch");
	link.set_href(href);
	if head.append_child(&link).is_err() {
		warn!("could not add prefetch hint for {href}");
	}
}

/// Interactive backlink graph of the document at `current`.
///
/// The graph is rebuilt whenever `current` changes; a load still in flight
/// for the previous document is cancelled and its result discarded.
#[component]
pub fn BacklinkGraph(#[prop(into)] current: Signal<String>, #[prop(optional)] config: GraphConfig) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let status = RwSignal::new(GraphStatus::Loading);
	let shared: Rc<RefCell<Mounted>> = Rc::new(RefCell::new(Mounted::default()));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let navigate = use_navigate();

	let (shared_init, animate_init, resize_cb_init, config_init) =
		(shared.clone(), animate.clone(), resize_cb.clone(), config.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
			_ => None,
		};
		let Some(ctx) = ctx else {
			warn!("canvas 2d context unavailable");
			status.set(GraphStatus::Unavailable);
			return;
		};

		let dpr = window.device_pixel_ratio().max(1.0);
		let (w, h) = container_size(&canvas);
		size_canvas(&canvas, w, h, dpr);
		{
			let mut m = shared_init.borrow_mut();
			m.canvas = Some(canvas.clone());
			m.ctx = Some(ctx);
			m.dpr = dpr;
			if let Some(data) = m.pending.take() {
				m.install(data, &config_init);
			}
		}

		let state_resize = shared_init.clone();
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let mut guard = state_resize.borrow_mut();
			let m = &mut *guard;
			let Some(canvas) = &m.canvas else {
				return;
			};
			let (nw, nh) = container_size(canvas);
			size_canvas(canvas, nw, nh, m.dpr);
			if let Some(s) = m.state.as_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (shared_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			let mut guard = state_anim.borrow_mut();
			let m = &mut *guard;
			if let (Some(s), Some(ctx)) = (m.state.as_mut(), m.ctx.as_ref()) {
				if s.frame(now) {
					render::render(s, ctx, m.dpr);
				}
			}
			m.raf_handle = animate_inner.borrow().as_ref().and_then(|cb| {
				web_sys::window()?
					.request_animation_frame(cb.as_ref().unchecked_ref())
					.ok()
			});
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			shared_init.borrow_mut().raf_handle = window.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
		}
	});

	let (shared_load, config_load) = (shared.clone(), config.clone());
	Effect::new(move |_| {
		let url = current.get();
		let cancel = CancelToken::new();
		let previous = shared_load.borrow_mut().cancel.replace(cancel.clone());
		if let Some(previous) = previous {
			debug!("superseding graph load");
			previous.cancel();
		}
		status.set(GraphStatus::Loading);

		let (shared, config) = (shared_load.clone(), config_load.clone());
		spawn_local(async move {
			let source = HttpSource::new(config.endpoints.clone(), &cancel);
			let result = assemble(&source, &url, config.skip_segments, &cancel).await;
			if cancel.is_cancelled() {
				debug!("discarding graph for {url}");
				return;
			}
			match result {
				Ok(data) => {
					info!("showing {} documents for {url}", data.nodes.len());
					shared.borrow_mut().install(data, &config);
					status.set(GraphStatus::Ready);
				}
				Err(err) if err.is_aborted() => debug!("graph load for {url} aborted"),
				Err(err) => {
					warn!("no graph for {url}: {err}");
					status.set(GraphStatus::Unavailable);
				}
			}
		});
	});

	let teardown = StoredValue::new_local((shared.clone(), animate.clone(), resize_cb.clone()));
	on_cleanup(move || {
		teardown.try_with_value(|(shared, animate, resize_cb)| {
			shared.borrow_mut().teardown();
			if let (Some(cb), Some(window)) = (resize_cb.borrow_mut().take(), web_sys::window()) {
				let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			animate.borrow_mut().take();
		});
	});

	let (shared_pd, navigate_pd) = (shared.clone(), navigate.clone());
	let on_pointerdown = move |ev: PointerEvent| {
		let event = {
			let mut guard = shared_pd.borrow_mut();
			let m = &mut *guard;
			let Some((x, y)) = m.position(&ev) else {
				return;
			};
			let Some(s) = m.state.as_mut() else {
				return;
			};
			let event = s.pointer_down(ev.pointer_id(), x, y, ev.button());
			// pressed pointers report their release here even off the canvas
			if let Some(canvas) = &m.canvas {
				let _ = canvas.set_pointer_capture(ev.pointer_id());
			}
			event.and_then(|e| m.react(e))
		};
		if let Some(path) = event {
			navigate_pd(&path, Default::default());
		}
	};

	let shared_pm = shared.clone();
	let on_pointermove = move |ev: PointerEvent| {
		let mut guard = shared_pm.borrow_mut();
		let m = &mut *guard;
		let Some((x, y)) = m.position(&ev) else {
			return;
		};
		let event = m.state.as_mut().and_then(|s| s.pointer_move(ev.pointer_id(), x, y));
		if let Some(event) = event {
			m.react(event);
		}
	};

	let (shared_pu, navigate_pu) = (shared.clone(), navigate.clone());
	let on_pointerup = move |ev: PointerEvent| {
		let path = {
			let mut m = shared_pu.borrow_mut();
			let event = m.state.as_mut().and_then(|s| s.pointer_up(ev.pointer_id()));
			event.and_then(|e| m.react(e))
		};
		if let Some(path) = path {
			navigate_pu(&path, Default::default());
		}
	};

	let on_pointercancel = on_pointerup.clone();

	let shared_pl = shared.clone();
	let on_pointerleave = move |_: PointerEvent| {
		let mut m = shared_pl.borrow_mut();
		if let Some(event) = m.state.as_mut().and_then(|s| s.pointer_leave()) {
			m.react(event);
		}
	};

	let (shared_wh, zoom) = (shared.clone(), config.enable_zoom);
	let on_wheel = move |ev: WheelEvent| {
		if !zoom {
			return;
		}
		ev.prevent_default();
		let mut guard = shared_wh.borrow_mut();
		let m = &mut *guard;
		let Some((x, y)) = m.position(&ev) else {
			return;
		};
		if let Some(s) = m.state.as_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	let pan_right = config.pan_button == PanButton::Right;
	let on_contextmenu = move |ev: MouseEvent| {
		if pan_right {
			ev.prevent_default();
		}
	};

	view! {
		<div class="backlink-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="backlink-graph-canvas"
				on:pointerdown=on_pointerdown
				on:pointermove=on_pointermove
				on:pointerup=on_pointerup
				on:pointercancel=on_pointercancel
				on:pointerleave=on_pointerleave
				on:wheel=on_wheel
				on:contextmenu=on_contextmenu
				style="display: block; cursor: grab; touch-action: none;"
			/>
			<Show when=move || status.get() == GraphStatus::Unavailable>
				<p class="backlink-graph-empty">"No graph available"</p>
			</Show>
		</div>
	}
}
