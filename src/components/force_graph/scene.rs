//! Retained drawables mirroring the simulation arena.
//!
//! The scene owns rendering-derived state only: resolved colors, hover
//! tweens and draw order. Geometry is copied from the simulation on every
//! [`Scene::sync`].

use std::collections::HashSet;

use web_sys::Element;

use super::color::{Rgb, inherited_background, resolve_color};
use super::config::GraphConfig;
use super::simulation::ForceSimulation;
use super::types::{LabelBox, NodeId, Rect};

const CURRENT_RADIUS: f64 = 7.5;
const NODE_RADIUS: f64 = 5.5;
const MIN_RADIUS: f64 = 4.0;
/// Extra pick tolerance around node circles.
const HIT_SLOP: f64 = 2.0;
/// Gap between a node's circle and its label.
const LABEL_GAP: f64 = 4.0;
const DIM_MIX: f64 = 0.5;

const STROKE_MS: f64 = 250.0;
const LABEL_MS: f64 = 300.0;
const LINK_MS: f64 = 250.0;
const HOVER_STROKE: f64 = 2.0;
const CURRENT_STROKE: f64 = 1.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// `base * sqrt(in + out)`, never smaller than [`MIN_RADIUS`].
pub fn node_radius(is_current: bool, degree: usize) -> f64 {
	let base = if is_current { CURRENT_RADIUS } else { NODE_RADIUS };
	(base * (degree as f64).sqrt()).max(MIN_RADIUS)
}

/// Label box for a node of radius `radius`, centered below the circle.
pub fn label_box(radius: f64, text_width: f64, text_height: f64, padding: f64) -> LabelBox {
	let (width, height) = (text_width + padding * 2.0, text_height + padding * 2.0);
	LabelBox::anchored(-width / 2.0, radius + LABEL_GAP, width, height)
}

/// Eased scalar animation. Times are in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
	from: f64,
	to: f64,
	start: f64,
	duration: f64,
}

impl Tween {
	pub fn constant(value: f64) -> Self {
		Self {
			from: value,
			to: value,
			start: 0.0,
			duration: 0.0,
		}
	}

	pub fn value(&self, now: f64) -> f64 {
		if self.duration <= 0.0 {
			return self.to;
		}
		let t = ((now - self.start) / self.duration).clamp(0.0, 1.0);
		self.from + (self.to - self.from) * ease_out_cubic(t)
	}

	pub fn target(&self) -> f64 {
		self.to
	}

	/// Starts a new animation from the current value; no-op if already
	/// heading to `to`.
	pub fn retarget(&mut self, to: f64, now: f64, duration: f64) {
		if self.to == to {
			return;
		}
		self.from = self.value(now);
		self.to = to;
		self.start = now;
		self.duration = duration;
	}

	pub fn is_settled(&self, now: f64) -> bool {
		now - self.start >= self.duration
	}
}

/// Resolved colors for one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub active_node: Rgb,
	pub active_link: Rgb,
	pub link_inactive: Rgb,
	pub node_stroke: Rgb,
	pub label_bg: Rgb,
	pub label: Rgb,
	pub label_border: Rgb,
	/// Page background nodes are dimmed toward.
	pub background: Rgb,
}

impl Palette {
	/// Resolves configured colors, looking CSS variables up on `scope`.
	pub fn resolve(config: &GraphConfig, scope: Option<&Element>) -> Self {
		let c = &config.colors;
		let color = |value: &str, fallback: Rgb| resolve_color(value, scope, fallback);
		Self {
			active_node: color(&c.active_node, Rgb::new(0.0, 231.0, 227.0)),
			active_link: color(&c.active_link, Rgb::new(255.0, 105.0, 163.0)),
			link_inactive: color(&c.link_inactive, Rgb::new(173.0, 173.0, 173.0)),
			node_stroke: color(&c.node_stroke, Rgb::BLACK),
			label_bg: color(&c.label_bg, Rgb::new(237.0, 237.0, 237.0)),
			label: color(&c.label, Rgb::BLACK),
			label_border: color(&c.label_border, Rgb::BLACK),
			background: scope.map_or(Rgb::WHITE, inherited_background),
		}
	}
}

/// Something under the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitTarget {
	Node(NodeId),
	Label(NodeId),
}

impl HitTarget {
	pub fn node(self) -> NodeId {
		match self {
			HitTarget::Node(id) | HitTarget::Label(id) => id,
		}
	}
}

/// Pointer-derived state the scene reflects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Focus {
	pub hovered: Option<NodeId>,
	pub dragged: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodePrimitive {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub is_current: bool,
	base_fill: Rgb,
	pub fill: Rgb,
	stroke: Tween,
	pub stroke_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkPrimitive {
	pub source: NodeId,
	pub target: NodeId,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub width: f64,
	emphasis: Tween,
	pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelPrimitive {
	pub owner: NodeId,
	pub text: String,
	pub rect: Rect,
	alpha: Tween,
	pub opacity: f64,
}

pub struct Scene {
	pub nodes: Vec<NodePrimitive>,
	pub links: Vec<LinkPrimitive>,
	/// Indexed like `nodes`; `None` for untitled nodes.
	pub labels: Vec<Option<LabelPrimitive>>,
	pub palette: Palette,
	order: Vec<NodeId>,
	focus: Focus,
	idle_label_alpha: f64,
	dim_on_drag: bool,
}

impl Scene {
	/// One primitive per node, link and label of `sim`.
	pub fn new(sim: &ForceSimulation, config: &GraphConfig, palette: Palette, scope: Option<&Element>) -> Self {
		let idle_label_alpha = config.idle_label_alpha();
		let nodes = sim
			.nodes()
			.iter()
			.enumerate()
			.map(|(id, node)| {
				let fallback = resolve_color(&config.colors.node_inactive, scope, Rgb::new(26.0, 173.0, 171.0));
				let base_fill = resolve_color(config.node_color(node), scope, fallback);
				let stroke = if node.is_current { CURRENT_STROKE } else { 0.0 };
				NodePrimitive {
					id,
					x: node.x,
					y: node.y,
					radius: node_radius(node.is_current, sim.degree(id)),
					is_current: node.is_current,
					base_fill,
					fill: base_fill,
					stroke: Tween::constant(stroke),
					stroke_width: stroke,
				}
			})
			.collect();
		let links = sim
			.links()
			.iter()
			.map(|l| LinkPrimitive {
				source: l.source,
				target: l.target,
				x1: 0.0,
				y1: 0.0,
				x2: 0.0,
				y2: 0.0,
				width: 1.0 + l.strength,
				emphasis: Tween::constant(0.0),
				color: palette.link_inactive,
			})
			.collect();
		let labels = sim
			.nodes()
			.iter()
			.enumerate()
			.map(|(owner, node)| {
				let text = node.label_text()?;
				Some(LabelPrimitive {
					owner,
					text: text.to_owned(),
					rect: Rect::default(),
					alpha: Tween::constant(idle_label_alpha),
					opacity: idle_label_alpha,
				})
			})
			.collect();

		let mut scene = Self {
			nodes,
			links,
			labels,
			palette,
			order: Vec::new(),
			focus: Focus::default(),
			idle_label_alpha,
			dim_on_drag: config.dim_on_drag,
		};
		scene.sync(sim, Focus::default(), 0.0);
		scene
	}

	/// Copies positions from `sim` and advances hover animations to `now`.
	pub fn sync(&mut self, sim: &ForceSimulation, focus: Focus, now: f64) {
		if focus.hovered != self.focus.hovered {
			self.retarget_hover(focus.hovered, now);
		}
		self.focus = focus;

		let undimmed: Option<HashSet<NodeId>> = focus
			.dragged
			.filter(|_| self.dim_on_drag)
			.map(|id| sim.neighbors(id).chain(std::iter::once(id)).collect());

		for prim in &mut self.nodes {
			if let Some(node) = sim.node(prim.id) {
				prim.x = node.x;
				prim.y = node.y;
			}
			let fill = if focus.hovered == Some(prim.id) {
				self.palette.active_node
			} else {
				prim.base_fill
			};
			prim.fill = match &undimmed {
				Some(keep) if !keep.contains(&prim.id) => fill.mix(self.palette.background, DIM_MIX),
				_ => fill,
			};
			prim.stroke_width = prim.stroke.value(now);
		}

		for link in &mut self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			(link.x1, link.y1, link.x2, link.y2) = (s.x, s.y, t.x, t.y);
			link.color = self
				.palette
				.link_inactive
				.mix(self.palette.active_link, link.emphasis.value(now));
		}

		for label in self.labels.iter_mut().flatten() {
			if let Some(node) = sim.node(label.owner) {
				if let Some(lbox) = &node.label {
					label.rect = lbox.rect_at(node.x, node.y);
				}
			}
			label.opacity = label.alpha.value(now);
		}

		self.order = (0..self.nodes.len()).collect();
		let rank = |id: &NodeId| {
			let prim = &self.nodes[*id];
			(focus.hovered == Some(*id), prim.is_current)
		};
		self.order.sort_by_key(rank);
	}

	fn retarget_hover(&mut self, hovered: Option<NodeId>, now: f64) {
		for prim in &mut self.nodes {
			let rest = if prim.is_current { CURRENT_STROKE } else { 0.0 };
			let to = if hovered == Some(prim.id) { HOVER_STROKE } else { rest };
			prim.stroke.retarget(to, now, STROKE_MS);
		}
		for link in &mut self.links {
			let touches = hovered.is_some_and(|h| link.source == h || link.target == h);
			link.emphasis
				.retarget(if touches { 1.0 } else { 0.0 }, now, LINK_MS);
		}
		let idle = self.idle_label_alpha;
		for label in self.labels.iter_mut().flatten() {
			let to = if hovered == Some(label.owner) { 1.0 } else { idle };
			label.alpha.retarget(to, now, LABEL_MS);
		}
	}

	/// Node ids back to front; the current and hovered nodes come last.
	pub fn draw_order(&self) -> &[NodeId] {
		&self.order
	}

	/// Topmost primitive at world point `(x, y)`. Labels sit above nodes.
	pub fn hit_test(&self, x: f64, y: f64) -> Option<HitTarget> {
		let label_hit = self.order.iter().rev().find(|&&id| {
			self.labels[id]
				.as_ref()
				.is_some_and(|l| l.opacity > 0.05 && l.rect.contains(x, y))
		});
		if let Some(&id) = label_hit {
			return Some(HitTarget::Label(id));
		}
		self.order
			.iter()
			.rev()
			.find(|&&id| {
				let n = &self.nodes[id];
				(n.x - x).hypot(n.y - y) <= n.radius + HIT_SLOP
			})
			.map(|&id| HitTarget::Node(id))
	}

	/// Whether any tween is still moving at `now`.
	pub fn is_animating(&self, now: f64) -> bool {
		self.nodes.iter().any(|n| !n.stroke.is_settled(now))
			|| self.links.iter().any(|l| !l.emphasis.is_settled(now))
			|| self.labels.iter().flatten().any(|l| !l.alpha.is_settled(now))
	}

	/// World-space bounding box of all nodes.
	pub fn bounds(&self) -> Option<Rect> {
		let placed = self.nodes.iter().filter(|n| n.x.is_finite() && n.y.is_finite());
		let (x0, y0, x1, y1) = placed.fold(None, |acc: Option<(f64, f64, f64, f64)>, n| {
			let (x0, y0, x1, y1) = acc.unwrap_or((n.x, n.y, n.x, n.y));
			Some((x0.min(n.x), y0.min(n.y), x1.max(n.x), y1.max(n.y)))
		})?;
		Some(Rect {
			x: x0,
			y: y0,
			width: x1 - x0,
			height: y1 - y0,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{DocumentNode, GraphData, LinkEdge};

	fn palette() -> Palette {
		Palette::resolve(&GraphConfig::default(), None)
	}

	/// `/a` (current) links to `/b`; `/c` is unrelated. Nodes pinned on a line.
	fn fixture(config: &GraphConfig) -> (ForceSimulation, Scene) {
		let mut a = DocumentNode::new("/a", Some("Alpha".into()), "n");
		a.is_current = true;
		let nodes = vec![
			a,
			DocumentNode::new("/b", Some("Beta".into()), "n"),
			DocumentNode::new("/c", None, "n"),
		];
		let links = vec![LinkEdge {
			source: "/a".into(),
			target: "/b".into(),
			strength: 0.5,
		}];
		let mut sim = ForceSimulation::new();
		sim.initialize(GraphData { nodes, links }, config);
		for (id, x) in [(0, 0.0), (1, 100.0), (2, 200.0)] {
			sim.set_pin(id, x, 0.0);
		}
		for id in 0..2 {
			let radius = node_radius(id == 0, sim.degree(id));
			sim.set_label(id, Some(label_box(radius, 40.0, 14.0, 6.0)));
		}
		let scene = Scene::new(&sim, config, palette(), None);
		(sim, scene)
	}

	#[test]
	fn radius_grows_with_degree() {
		assert_eq!(node_radius(false, 0), MIN_RADIUS);
		assert_eq!(node_radius(false, 4), 11.0);
		assert_eq!(node_radius(true, 4), 15.0);
	}

	#[test]
	fn label_anchor_depends_on_radius() {
		let small = label_box(4.0, 40.0, 14.0, 6.0);
		let large = label_box(15.0, 40.0, 14.0, 6.0);

		assert_eq!((small.width, small.height), (52.0, 26.0));
		assert_eq!(small.base_x, -26.0);
		assert!(large.base_y > small.base_y);
	}

	#[test]
	fn primitives_mirror_the_arena() {
		let (_, scene) = fixture(&GraphConfig::default());

		assert_eq!(scene.nodes.len(), 3);
		assert_eq!(scene.links.len(), 1);
		assert!(scene.labels[0].is_some() && scene.labels[2].is_none());
		assert_eq!((scene.links[0].x1, scene.links[0].x2), (0.0, 100.0));
		assert_eq!(scene.nodes[0].stroke_width, CURRENT_STROKE);
		// current node drawn last
		assert_eq!(scene.draw_order().last(), Some(&0));
	}

	#[test]
	fn labels_are_hit_before_nodes() {
		let (_, scene) = fixture(&GraphConfig::default());
		let label = scene.labels[1].as_ref().unwrap().rect;
		let (lx, ly) = label.center();

		assert_eq!(scene.hit_test(100.0, 0.0), Some(HitTarget::Node(1)));
		assert_eq!(scene.hit_test(lx, ly), Some(HitTarget::Label(1)));
		assert_eq!(scene.hit_test(150.0, -50.0), None);
	}

	#[test]
	fn hidden_labels_are_not_hit() {
		let config = GraphConfig {
			hide_inactive_labels: true,
			..Default::default()
		};
		let (_, scene) = fixture(&config);
		let (lx, ly) = scene.labels[1].as_ref().unwrap().rect.center();

		assert_eq!(scene.hit_test(lx, ly), None);
	}

	#[test]
	fn hover_animates_and_raises() {
		let (sim, mut scene) = fixture(&GraphConfig::default());
		let hover = Focus {
			hovered: Some(2),
			dragged: None,
		};

		scene.sync(&sim, hover, 1000.0);
		assert_eq!(scene.nodes[2].stroke_width, 0.0);
		assert_eq!(scene.draw_order().last(), Some(&2));
		assert_eq!(scene.nodes[2].fill, scene.palette.active_node);
		assert!(scene.is_animating(1100.0));

		scene.sync(&sim, hover, 1000.0 + STROKE_MS);
		assert_eq!(scene.nodes[2].stroke_width, HOVER_STROKE);

		scene.sync(&sim, Focus::default(), 2000.0);
		scene.sync(&sim, Focus::default(), 2000.0 + STROKE_MS);
		assert_eq!(scene.nodes[2].stroke_width, 0.0);
		assert!(!scene.is_animating(3000.0));
	}

	#[test]
	fn hovered_links_and_labels_light_up() {
		let (sim, mut scene) = fixture(&GraphConfig::default());
		let hover = Focus {
			hovered: Some(1),
			dragged: None,
		};

		scene.sync(&sim, hover, 0.0);
		scene.sync(&sim, hover, LABEL_MS);

		assert_eq!(scene.links[0].color, scene.palette.active_link);
		assert_eq!(scene.labels[1].as_ref().unwrap().opacity, 1.0);
		assert_eq!(scene.labels[0].as_ref().unwrap().opacity, 0.5);
	}

	#[test]
	fn dragging_dims_unrelated_nodes() {
		let config = GraphConfig {
			dim_on_drag: true,
			..Default::default()
		};
		let (sim, mut scene) = fixture(&config);
		let base = scene.nodes[2].fill;

		scene.sync(
			&sim,
			Focus {
				hovered: None,
				dragged: Some(0),
			},
			0.0,
		);

		assert_eq!(scene.nodes[2].fill, base.mix(scene.palette.background, DIM_MIX));
		assert_eq!(scene.nodes[1].fill, scene.nodes[1].base_fill);
	}

	#[test]
	fn bounds_cover_all_nodes() {
		let (_, scene) = fixture(&GraphConfig::default());

		assert_eq!(
			scene.bounds(),
			Some(Rect {
				x: 0.0,
				y: 0.0,
				width: 200.0,
				height: 0.0
			})
		);
	}
}
