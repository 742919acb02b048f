use log::debug;
use web_sys::Element;

use super::color::{Rgb, resolve_color};
use super::config::GraphConfig;
use super::interaction::{InteractionController, InteractionEvent, Pointer};
use super::scene::{Focus, Palette, Scene, label_box, node_radius};
use super::simulation::ForceSimulation;
use super::types::{GraphData, NodeId};
use super::viewport::Viewport;

/// Measures rendered label text width in CSS pixels.
pub type MeasureText<'a> = &'a dyn Fn(&str) -> f64;

/// Browser pointer id (`PointerEvent.pointerId`).
pub type PointerId = i32;

/// Two-finger zoom in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pinch {
	/// Finger distance at the previous move.
	distance: f64,
}

/// Everything one mounted graph owns, driven once per animation frame.
pub struct ForceGraphState {
	pub config: GraphConfig,
	pub sim: ForceSimulation,
	pub scene: Scene,
	pub viewport: Viewport,
	pub interaction: InteractionController,
	/// Resolved legend rows.
	pub legend: Vec<(String, Rgb)>,
	/// Pressed pointers in press order; the first one drives drags and pans.
	pointers: Vec<(PointerId, (f64, f64))>,
	pinch: Option<Pinch>,
	dirty: bool,
}

impl ForceGraphState {
	pub fn new(
		data: GraphData,
		config: GraphConfig,
		width: f64,
		height: f64,
		measure: MeasureText<'_>,
		scope: Option<&Element>,
	) -> Self {
		let mut sim = ForceSimulation::new();
		let palette = Palette::resolve(&config, scope);
		let scene = Self::bind(&mut sim, data, &config, palette, measure, scope);
		let legend = config
			.legend()
			.into_iter()
			.map(|(title, color)| (title.to_owned(), resolve_color(color, scope, Rgb::BLACK)))
			.collect();
		Self {
			legend,
			viewport: Viewport::new(width, height, config.enable_zoom),
			config,
			sim,
			scene,
			interaction: InteractionController::new(),
			pointers: Vec::new(),
			pinch: None,
			dirty: true,
		}
	}

	/// Seeds `sim` with `data`, attaches measured labels and builds the scene.
	fn bind(
		sim: &mut ForceSimulation,
		data: GraphData,
		config: &GraphConfig,
		palette: Palette,
		measure: MeasureText<'_>,
		scope: Option<&Element>,
	) -> Scene {
		sim.initialize(data, config);
		let labels: Vec<_> = sim
			.nodes()
			.iter()
			.enumerate()
			.map(|(id, node)| {
				node.label_text().map(|text| {
					let radius = node_radius(node.is_current, sim.degree(id));
					label_box(radius, measure(text), config.font_size, config.labels.padding)
				})
			})
			.collect();
		for (id, label) in labels.into_iter().enumerate() {
			sim.set_label(id, label);
		}
		Scene::new(sim, config, palette, scope)
	}

	/// Replaces the graph wholesale, keeping the viewport.
	pub fn rebuild(&mut self, data: GraphData, measure: MeasureText<'_>, scope: Option<&Element>) {
		self.interaction.cancel(&mut self.sim);
		self.viewport.end_pan();
		self.pointers.clear();
		self.pinch = None;
		let palette = self.scene.palette.clone();
		self.scene = Self::bind(&mut self.sim, data, &self.config, palette, measure, scope);
		self.dirty = true;
	}

	/// Advances one frame; returns whether anything needs redrawing.
	pub fn frame(&mut self, now: f64) -> bool {
		let moved = self.sim.tick();
		let focus = Focus {
			hovered: self.interaction.hovered(),
			dragged: self.interaction.dragged(),
		};
		let animating = self.scene.is_animating(now);
		self.scene.sync(&self.sim, focus, now);
		std::mem::take(&mut self.dirty) || moved || animating
	}

	fn pointer(&self, sx: f64, sy: f64) -> Pointer {
		Pointer {
			screen: (sx, sy),
			world: self.viewport.screen_to_world(sx, sy),
		}
	}

	/// Whether two pressed pointers are zooming the view.
	pub fn is_pinching(&self) -> bool {
		self.pinch.is_some()
	}

	fn finger_span(&self) -> Option<((f64, f64), f64)> {
		let [(_, (ax, ay)), (_, (bx, by))] = self.pointers.get(..2)? else {
			return None;
		};
		Some((((ax + bx) / 2.0, (ay + by) / 2.0), (bx - ax).hypot(by - ay)))
	}

	pub fn pointer_down(&mut self, id: PointerId, sx: f64, sy: f64, button: i16) -> Option<InteractionEvent> {
		self.pointers.retain(|(p, _)| *p != id);
		self.pointers.push((id, (sx, sy)));
		self.dirty = true;

		if self.pointers.len() > 1 {
			// a second finger on a free canvas turns a pan into a pinch
			if self.pointers.len() == 2 && self.config.enable_zoom && self.interaction.captured().is_none() {
				self.viewport.end_pan();
				self.pinch = self.finger_span().map(|(_, distance)| Pinch { distance });
			}
			return None;
		}

		let pointer = self.pointer(sx, sy);
		let hit = self.scene.hit_test(pointer.world.0, pointer.world.1);
		match hit {
			Some(target) if button == 0 => self.interaction.pointer_down(target, pointer, &mut self.sim),
			None if button == self.config.pan_button.code() => {
				self.viewport.begin_pan(sx, sy);
				None
			}
			_ => None,
		}
	}

	pub fn pointer_move(&mut self, id: PointerId, sx: f64, sy: f64) -> Option<InteractionEvent> {
		let slot = self.pointers.iter().position(|(p, _)| *p == id);
		if let Some(slot) = slot {
			self.pointers[slot].1 = (sx, sy);
		}

		if let Some(pinch) = self.pinch {
			if slot.is_some_and(|s| s < 2) {
				if let Some(((mx, my), distance)) = self.finger_span() {
					if pinch.distance > 0.0 && distance > 0.0 {
						self.viewport.zoom_at(mx, my, distance / pinch.distance);
					}
					self.pinch = Some(Pinch { distance });
					self.dirty = true;
				}
			}
			return None;
		}
		if slot.is_some_and(|s| s > 0) {
			return None;
		}

		let pointer = self.pointer(sx, sy);
		if let Some(target) = self.interaction.captured() {
			self.dirty |= self.interaction.pointer_move(target, pointer, &mut self.sim);
			return None;
		}
		if self.viewport.pan_to(sx, sy) {
			if let Some(bounds) = self.scene.bounds() {
				self.viewport.clamp_to(bounds);
			}
			self.dirty = true;
			return None;
		}
		let hit = self.scene.hit_test(pointer.world.0, pointer.world.1);
		self.interaction.pointer_over(hit)
	}

	/// Pointer released or cancelled. Only the first pressed pointer ends a
	/// drag or pan; lifting either pinching finger ends the pinch.
	pub fn pointer_up(&mut self, id: PointerId) -> Option<InteractionEvent> {
		let slot = self.pointers.iter().position(|(p, _)| *p == id);
		if let Some(slot) = slot {
			self.pointers.remove(slot);
		}
		self.dirty = true;

		if self.pinch.is_some() {
			if self.pointers.len() < 2 {
				self.pinch = None;
			}
			return None;
		}
		if slot.is_some_and(|s| s > 0) {
			return None;
		}
		self.viewport.end_pan();
		self.interaction.pointer_up(&mut self.sim)
	}

	/// Pointer left the canvas. Drags continue until pointer-up.
	pub fn pointer_leave(&mut self) -> Option<InteractionEvent> {
		self.viewport.end_pan();
		self.interaction.pointer_leave()
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.viewport.wheel(sx, sy, delta_y);
		self.dirty = true;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		debug!("graph resized to {width}x{height}");
		self.viewport.resize(width, height);
		self.dirty = true;
	}

	/// Id of the document behind arena index `id`.
	pub fn document_id(&self, id: NodeId) -> Option<&str> {
		self.sim.node(id).map(|n| n.id.as_str())
	}

	/// Clears pins and stops the simulation.
	pub fn dispose(&mut self) {
		self.interaction.cancel(&mut self.sim);
		self.pointers.clear();
		self.pinch = None;
		self.sim.dispose();
	}
}
