//! Anchored label collision.
//!
//! Every label box is a small secondary body attached to its node. Each tick
//! overlapping boxes are pushed apart along the axis of least overlap, then
//! every box is pulled back toward its anchor offset, integrated and clamped
//! to a maximum distance from the node.

use super::forces::{Force, SimLink};
use super::types::{DocumentNode, LabelBox, Rect};

#[derive(Clone, Debug, PartialEq)]
pub struct AnchoredLabelCollide {
	/// Gap kept between boxes.
	pub padding: f64,
	/// Relaxation passes per tick.
	pub iterations: usize,
	pub collide_strength: f64,
	/// Pull toward the anchor offset, scaled by alpha.
	pub anchor_strength: f64,
	/// Hard bound on the offset length.
	pub max_distance: f64,
	/// Velocity retained per pass, in `0..=1`.
	pub damping: f64,
	/// Overlaps at or below this are ignored.
	pub overlap_epsilon: f64,
}

impl Default for AnchoredLabelCollide {
	fn default() -> Self {
		Self {
			padding: 6.0,
			iterations: 2,
			collide_strength: 1.0,
			anchor_strength: 0.2,
			max_distance: 80.0,
			damping: 0.75,
			overlap_epsilon: 0.25,
		}
	}
}

impl AnchoredLabelCollide {
	fn absolute_rect(node: &DocumentNode) -> Option<Rect> {
		let label = node.label.as_ref()?;
		node.has_position().then(|| label.rect_at(node.x, node.y))
	}

	fn clamp_base(&self, label: &mut LabelBox) {
		let r = label.base_x.hypot(label.base_y);
		if r > self.max_distance {
			let s = self.max_distance / r;
			label.base_x *= s;
			label.base_y *= s;
		}
	}

	fn clamp_offset(&self, label: &mut LabelBox) {
		let r = label.x.hypot(label.y);
		if r <= self.max_distance || r == 0.0 {
			return;
		}
		let s = self.max_distance / r;
		label.x *= s;
		label.y *= s;
		label.vx *= 0.5;
		label.vy *= 0.5;
	}

	/// Velocity pushes for one pass, indexed like `nodes`.
	fn collisions(&self, nodes: &[DocumentNode], alpha: f64) -> Vec<(f64, f64)> {
		let rects: Vec<Option<Rect>> = nodes.iter().map(Self::absolute_rect).collect();
		let mut pushes = vec![(0.0, 0.0); nodes.len()];

		for (i, a) in rects.iter().enumerate() {
			let Some(a) = a else { continue };
			for (j, b) in rects.iter().enumerate() {
				let Some(b) = b else { continue };
				// each unordered pair once
				if nodes[i].id >= nodes[j].id || !a.overlaps(b, self.padding) {
					continue;
				}
				let ((acx, acy), (bcx, bcy)) = (a.center(), b.center());
				let (dx, dy) = (acx - bcx, acy - bcy);
				let overlap_x = a.width / 2.0 + b.width / 2.0 + self.padding - dx.abs();
				let overlap_y = a.height / 2.0 + b.height / 2.0 + self.padding - dy.abs();
				if overlap_x <= self.overlap_epsilon || overlap_y <= self.overlap_epsilon {
					continue;
				}

				let scale = 0.5 * self.collide_strength * alpha;
				let direction = |d: f64| if d == 0.0 { 1.0 } else { d.signum() };
				if overlap_x < overlap_y {
					let push = direction(dx) * overlap_x * scale;
					pushes[i].0 += push;
					pushes[j].0 -= push;
				} else {
					let push = direction(dy) * overlap_y * scale;
					pushes[i].1 += push;
					pushes[j].1 -= push;
				}
			}
		}
		pushes
	}
}

impl Force for AnchoredLabelCollide {
	fn apply(&mut self, nodes: &mut [DocumentNode], _links: &[SimLink], alpha: f64) {
		for _ in 0..self.iterations {
			let pushes = self.collisions(nodes, alpha);

			for (node, (px, py)) in nodes.iter_mut().zip(pushes) {
				if !node.has_position() {
					continue;
				}
				let Some(label) = node.label.as_mut() else {
					continue;
				};
				self.clamp_base(label);
				if label.held {
					label.vx = 0.0;
					label.vy = 0.0;
					continue;
				}

				let ax = (label.base_x - label.x) * self.anchor_strength * alpha;
				let ay = (label.base_y - label.y) * self.anchor_strength * alpha;
				label.vx = (label.vx + px + ax) * self.damping;
				label.vy = (label.vy + py + ay) * self.damping;
				label.x += label.vx;
				label.y += label.vy;
				self.clamp_offset(label);
			}
		}
	}
}
