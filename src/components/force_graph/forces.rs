//! Node forces: many-body repulsion, link springs and centering.

use super::types::{DocumentNode, NodeId};

/// Distance substituted when two nodes sit on the same point.
const MIN_DISTANCE: f64 = 1.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// A link bound to arena indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	pub source: NodeId,
	pub target: NodeId,
	/// Visual emphasis carried over from the assembled edge.
	pub strength: f64,
}

/// A force contributes velocity (or position) deltas once per tick.
pub trait Force {
	/// Called whenever the node or link set is replaced.
	fn initialize(&mut self, _nodes: &[DocumentNode], _links: &[SimLink]) {}

	fn apply(&mut self, nodes: &mut [DocumentNode], links: &[SimLink], alpha: f64);
}

/// Offset used for a coincident pair; antisymmetric in `(i, j)`.
fn separation(i: NodeId, j: NodeId) -> (f64, f64) {
	let angle = i.min(j) as f64 * GOLDEN_ANGLE + j.max(i) as f64;
	let sign = if i < j { 1.0 } else { -1.0 };
	(sign * angle.cos() * MIN_DISTANCE, sign * angle.sin() * MIN_DISTANCE)
}

/// Pairwise charge force. Negative strength repels.
#[derive(Clone, Debug)]
pub struct ManyBody {
	pub strength: f64,
	pub distance_min2: f64,
}

impl ManyBody {
	pub fn new(strength: f64) -> Self {
		Self {
			strength,
			distance_min2: MIN_DISTANCE * MIN_DISTANCE,
		}
	}
}

impl Force for ManyBody {
	fn apply(&mut self, nodes: &mut [DocumentNode], _links: &[SimLink], alpha: f64) {
		let positions: Vec<Option<(f64, f64)>> = nodes
			.iter()
			.map(|n| n.has_position().then(|| n.position()))
			.collect();

		for (i, node) in nodes.iter_mut().enumerate() {
			let Some((xi, yi)) = positions[i] else {
				continue;
			};
			for (j, other) in positions.iter().enumerate() {
				let Some((xj, yj)) = *other else {
					continue;
				};
				if i == j {
					continue;
				}
				let (mut dx, mut dy) = (xj - xi, yj - yi);
				let mut l = dx * dx + dy * dy;
				if l == 0.0 {
					(dx, dy) = separation(i, j);
					l = dx * dx + dy * dy;
				}
				if l < self.distance_min2 {
					l = (self.distance_min2 * l).sqrt();
				}
				let w = self.strength * alpha / l;
				node.vx += dx * w;
				node.vy += dy * w;
			}
		}
	}
}

/// Hookean springs toward a rest length, stiffness `1 / min(degree)`.
#[derive(Clone, Debug)]
pub struct LinkSpring {
	pub distance: f64,
	stiffness: Vec<f64>,
	bias: Vec<f64>,
}

impl LinkSpring {
	pub fn new(distance: f64) -> Self {
		Self {
			distance,
			stiffness: Vec::new(),
			bias: Vec::new(),
		}
	}
}

impl Force for LinkSpring {
	fn initialize(&mut self, nodes: &[DocumentNode], links: &[SimLink]) {
		let mut count = vec![0usize; nodes.len()];
		for link in links {
			count[link.source] += 1;
			count[link.target] += 1;
		}
		self.stiffness = links
			.iter()
			.map(|l| 1.0 / count[l.source].min(count[l.target]).max(1) as f64)
			.collect();
		self.bias = links
			.iter()
			.map(|l| {
				let (s, t) = (count[l.source] as f64, count[l.target] as f64);
				s / (s + t).max(1.0)
			})
			.collect();
	}

	fn apply(&mut self, nodes: &mut [DocumentNode], links: &[SimLink], alpha: f64) {
		for (k, link) in links.iter().enumerate() {
			let (s, t) = (link.source, link.target);
			if s == t || !nodes[s].has_position() || !nodes[t].has_position() {
				continue;
			}
			let mut x = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut y = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if x == 0.0 && y == 0.0 {
				(x, y) = separation(s, t);
			}
			let l = (x * x + y * y).sqrt();
			let f = (l - self.distance) / l * alpha * self.stiffness[k];
			let (x, y) = (x * f, y * f);
			let bias = self.bias[k];

			nodes[t].vx -= x * bias;
			nodes[t].vy -= y * bias;
			nodes[s].vx += x * (1.0 - bias);
			nodes[s].vy += y * (1.0 - bias);
		}
	}
}

/// Translates the node set so its centroid approaches `(x, y)`.
#[derive(Clone, Debug)]
pub struct Center {
	pub x: f64,
	pub y: f64,
	pub strength: f64,
}

impl Default for Center {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			strength: 1.0,
		}
	}
}

impl Force for Center {
	fn apply(&mut self, nodes: &mut [DocumentNode], _links: &[SimLink], _alpha: f64) {
		let placed = nodes.iter().filter(|n| n.has_position());
		let (count, sx, sy) = placed.fold((0usize, 0.0, 0.0), |(c, sx, sy), n| (c + 1, sx + n.x, sy + n.y));
		if count == 0 {
			return;
		}
		let dx = (sx / count as f64 - self.x) * self.strength;
		let dy = (sy / count as f64 - self.y) * self.strength;
		for node in nodes.iter_mut().filter(|n| n.has_position()) {
			node.x -= dx;
			node.y -= dy;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn placed(id: &str, x: f64, y: f64) -> DocumentNode {
		let mut node = DocumentNode::new(id, None, "n");
		node.x = x;
		node.y = y;
		node
	}

	#[test]
	fn coincident_nodes_repel_without_nan() {
		let mut nodes = vec![placed("/a", 3.0, 3.0), placed("/b", 3.0, 3.0)];

		ManyBody::new(-400.0).apply(&mut nodes, &[], 1.0);

		for node in &nodes {
			assert!(node.vx.is_finite() && node.vy.is_finite());
		}
		assert!(nodes[0].vx != 0.0 || nodes[0].vy != 0.0);
		assert!((nodes[0].vx + nodes[1].vx).abs() < 1e-9);
	}

	#[test]
	fn repulsion_pushes_apart() {
		let mut nodes = vec![placed("/a", 0.0, 0.0), placed("/b", 10.0, 0.0)];

		ManyBody::new(-400.0).apply(&mut nodes, &[], 1.0);

		assert!(nodes[0].vx < 0.0);
		assert!(nodes[1].vx > 0.0);
	}

	#[test]
	fn unplaced_nodes_are_ignored() {
		let mut nodes = vec![placed("/a", 0.0, 0.0), DocumentNode::new("/b", None, "n")];

		ManyBody::new(-400.0).apply(&mut nodes, &[], 1.0);

		assert_eq!(nodes[0].vx, 0.0);
		assert_eq!(nodes[1].vx, 0.0);
	}

	#[test]
	fn stretched_spring_contracts() {
		let mut nodes = vec![placed("/a", 0.0, 0.0), placed("/b", 100.0, 0.0)];
		let links = vec![SimLink {
			source: 0,
			target: 1,
			strength: 1.0,
		}];
		let mut spring = LinkSpring::new(40.0);
		spring.initialize(&nodes, &links);

		spring.apply(&mut nodes, &links, 1.0);

		assert!(nodes[0].vx > 0.0);
		assert!(nodes[1].vx < 0.0);
	}

	#[test]
	fn centering_moves_centroid() {
		let mut nodes = vec![placed("/a", 10.0, 10.0), placed("/b", 30.0, 10.0)];

		Center::default().apply(&mut nodes, &[], 1.0);

		assert_eq!(nodes[0].position(), (-10.0, 0.0));
		assert_eq!(nodes[1].position(), (10.0, 0.0));
	}
}
