use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, info};

use super::config::GraphConfig;
use super::forces::{Center, Force, LinkSpring, ManyBody, SimLink};
use super::label_collide::AnchoredLabelCollide;
use super::types::{DocumentNode, GraphData, LabelBox, NodeId};

const INITIAL_RADIUS: f64 = 10.0;

/// Lifecycle of a [`ForceSimulation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationState {
	#[default]
	Uninitialized,
	Running,
	/// Settled (alpha below the minimum with no target) or paused explicitly.
	Paused,
	Disposed,
}

/// Owns the node arena and advances it one step per frame.
///
/// Only the simulation writes `x`, `y`, `vx` and `vy`; pins and label
/// offsets are written through [`set_pin`](Self::set_pin) and
/// [`set_label_offset`](Self::set_label_offset).
pub struct ForceSimulation {
	state: SimulationState,
	nodes: Vec<DocumentNode>,
	links: Vec<SimLink>,
	ids: HashMap<String, NodeId>,
	in_degree: Vec<usize>,
	out_degree: Vec<usize>,
	forces: Vec<Box<dyn Force>>,
	/// Whether [`AnchoredLabelCollide`] is among `forces`.
	label_force: bool,
	alpha: f64,
	alpha_target: f64,
	alpha_min: f64,
	alpha_decay: f64,
	velocity_decay: f64,
}

impl Default for ForceSimulation {
	fn default() -> Self {
		Self::new()
	}
}

impl ForceSimulation {
	pub fn new() -> Self {
		let alpha_min = 0.001;
		Self {
			state: SimulationState::Uninitialized,
			nodes: Vec::new(),
			links: Vec::new(),
			ids: HashMap::new(),
			in_degree: Vec::new(),
			out_degree: Vec::new(),
			forces: Vec::new(),
			label_force: false,
			alpha: 0.0,
			alpha_target: 0.0,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
		}
	}

	/// Binds a new node and link set, replacing whatever was there.
	///
	/// Links whose endpoints are not in `data.nodes` are dropped.
	pub fn initialize(&mut self, data: GraphData, config: &GraphConfig) {
		self.release();

		self.ids = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		self.nodes = data.nodes;
		self.links = data
			.links
			.iter()
			.filter_map(|l| {
				Some(SimLink {
					source: *self.ids.get(&l.source)?,
					target: *self.ids.get(&l.target)?,
					strength: l.strength,
				})
			})
			.collect();
		if self.links.len() < data.links.len() {
			debug!("dropped {} links with unknown endpoints", data.links.len() - self.links.len());
		}

		self.in_degree = vec![0; self.nodes.len()];
		self.out_degree = vec![0; self.nodes.len()];
		for link in &self.links {
			self.out_degree[link.source] += 1;
			self.in_degree[link.target] += 1;
		}

		self.place_unplaced();

		self.forces = vec![
			Box::new(ManyBody::new(-100.0 * config.repel_force)),
			Box::new(LinkSpring::new(config.link_distance)),
			Box::new(Center::default()),
		];
		self.label_force = !config.hide_inactive_labels;
		if self.label_force {
			self.forces.push(Box::new(AnchoredLabelCollide::default()));
		}
		for force in &mut self.forces {
			force.initialize(&self.nodes, &self.links);
		}

		self.alpha = 1.0;
		self.alpha_target = 0.0;
		self.state = SimulationState::Running;
		info!(
			"simulation initialized with {} nodes, {} links",
			self.nodes.len(),
			self.links.len()
		);
	}

	/// Phyllotaxis arrangement for nodes without a position.
	fn place_unplaced(&mut self) {
		let angle_step = PI * (3.0 - 5f64.sqrt());
		for (i, node) in self.nodes.iter_mut().enumerate() {
			if !node.x.is_finite() || !node.y.is_finite() {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * angle_step;
				node.x = node.fx.unwrap_or(radius * angle.cos());
				node.y = node.fy.unwrap_or(radius * angle.sin());
			}
			if !node.vx.is_finite() || !node.vy.is_finite() {
				node.vx = 0.0;
				node.vy = 0.0;
			}
		}
	}

	/// One step. Returns `false` when nothing was simulated.
	pub fn tick(&mut self) -> bool {
		if self.state != SimulationState::Running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		for force in &mut self.forces {
			force.apply(&mut self.nodes, &self.links, self.alpha);
		}

		let retain = 1.0 - self.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= retain;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= retain;
					node.y += node.vy;
				}
			}
		}

		if self.alpha < self.alpha_min && self.alpha_target == 0.0 {
			debug!("simulation settled");
			self.state = SimulationState::Paused;
		}
		true
	}

	/// Raises the alpha target so the layout stays live during interaction.
	pub fn reheat(&mut self) {
		self.alpha_target = 1.0;
		self.resume();
	}

	/// Lets the layout settle again.
	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
	}

	pub fn pause(&mut self) {
		if self.state == SimulationState::Running {
			self.state = SimulationState::Paused;
		}
	}

	pub fn resume(&mut self) {
		if self.state == SimulationState::Paused {
			self.state = SimulationState::Running;
		}
	}

	/// Fixes `id` at `(x, y)` until [`clear_pin`](Self::clear_pin).
	pub fn set_pin(&mut self, id: NodeId, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.fx = Some(x);
			node.fy = Some(y);
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	/// No-op for a node that is not pinned.
	pub fn clear_pin(&mut self, id: NodeId) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Replaces the label attached to `id`.
	pub fn set_label(&mut self, id: NodeId, label: Option<LabelBox>) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.label = label;
		}
	}

	/// Moves a label by hand and holds it there until released.
	pub fn set_label_offset(&mut self, id: NodeId, x: f64, y: f64) {
		if let Some(label) = self.nodes.get_mut(id).and_then(|n| n.label.as_mut()) {
			label.x = x;
			label.y = y;
			label.vx = 0.0;
			label.vy = 0.0;
			label.held = true;
		}
	}

	/// Hands a held label back to the collision force, which pulls it home.
	/// Without that force the label snaps straight back to its anchor.
	pub fn release_label(&mut self, id: NodeId) {
		let snap = !self.label_force;
		if let Some(label) = self.nodes.get_mut(id).and_then(|n| n.label.as_mut()) {
			label.held = false;
			if snap {
				label.x = label.base_x;
				label.y = label.base_y;
				label.vx = 0.0;
				label.vy = 0.0;
			}
		}
	}

	/// Whether labels are simulated by the collision force.
	pub fn has_label_force(&self) -> bool {
		self.label_force
	}

	fn release(&mut self) {
		self.nodes.clear();
		self.links.clear();
		self.ids.clear();
		self.in_degree.clear();
		self.out_degree.clear();
		self.forces.clear();
		self.label_force = false;
		self.alpha = 0.0;
		self.alpha_target = 0.0;
	}

	/// Stops ticking and drops all nodes and links.
	pub fn dispose(&mut self) {
		self.release();
		self.state = SimulationState::Disposed;
	}

	pub fn state(&self) -> SimulationState {
		self.state
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn nodes(&self) -> &[DocumentNode] {
		&self.nodes
	}

	pub fn node(&self, id: NodeId) -> Option<&DocumentNode> {
		self.nodes.get(id)
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn index_of(&self, id: &str) -> Option<NodeId> {
		self.ids.get(id).copied()
	}

	/// `in + out` degree.
	pub fn degree(&self, id: NodeId) -> usize {
		self.in_degree.get(id).copied().unwrap_or(0) + self.out_degree.get(id).copied().unwrap_or(0)
	}

	/// Nodes sharing a link with `id`.
	pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
		self.links.iter().filter_map(move |l| {
			if l.source == id {
				Some(l.target)
			} else if l.target == id {
				Some(l.source)
			} else {
				None
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::LinkEdge;

	fn graph(ids: &[&str], links: &[(&str, &str)]) -> GraphData {
		GraphData {
			nodes: ids
				.iter()
				.map(|id| DocumentNode::new(*id, Some(id.to_string()), "n"))
				.collect(),
			links: links
				.iter()
				.map(|(s, t)| LinkEdge {
					source: s.to_string(),
					target: t.to_string(),
					strength: 1.0,
				})
				.collect(),
		}
	}

	fn running(ids: &[&str], links: &[(&str, &str)]) -> ForceSimulation {
		let mut sim = ForceSimulation::new();
		sim.initialize(graph(ids, links), &GraphConfig::default());
		sim
	}

	#[test]
	fn initialize_places_every_node() {
		let sim = running(&["/a", "/b", "/c"], &[("/a", "/b"), ("/a", "/zz")]);

		assert_eq!(sim.state(), SimulationState::Running);
		assert_eq!(sim.alpha(), 1.0);
		assert!(sim.nodes().iter().all(DocumentNode::has_position));
		assert_eq!(sim.links().len(), 1);
		assert_eq!(sim.degree(0), 1);
		assert_eq!(sim.neighbors(1).collect::<Vec<_>>(), vec![0]);
	}

	#[test]
	fn pinned_node_stays_exactly_put() {
		let mut sim = running(&["/a", "/b", "/c"], &[("/a", "/b"), ("/b", "/c")]);
		sim.set_pin(1, 12.5, -7.25);
		sim.reheat();

		for _ in 0..200 {
			sim.tick();
			assert_eq!(sim.node(1).unwrap().position(), (12.5, -7.25));
		}

		sim.clear_pin(1);
		sim.cool();
		for _ in 0..5 {
			sim.tick();
		}
		assert_ne!(sim.node(1).unwrap().position(), (12.5, -7.25));
	}

	#[test]
	fn settles_into_paused() {
		let mut sim = running(&["/a", "/b"], &[("/a", "/b")]);

		for _ in 0..400 {
			sim.tick();
		}

		assert_eq!(sim.state(), SimulationState::Paused);
		assert!(!sim.tick());
		for node in sim.nodes() {
			assert!(node.x.is_finite() && node.y.is_finite());
		}
	}

	#[test]
	fn reheat_resumes_and_cool_lets_it_settle() {
		let mut sim = running(&["/a", "/b"], &[("/a", "/b")]);
		for _ in 0..400 {
			sim.tick();
		}

		sim.reheat();
		assert_eq!(sim.state(), SimulationState::Running);
		let before = sim.alpha();
		sim.tick();
		assert!(sim.alpha() > before);

		sim.cool();
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn reinitialize_replaces_previous_graph() {
		let mut sim = running(&["/a", "/b"], &[("/a", "/b")]);
		sim.set_pin(0, 1.0, 1.0);

		sim.initialize(graph(&["/x"], &[]), &GraphConfig::default());

		assert_eq!(sim.nodes().len(), 1);
		assert!(sim.links().is_empty());
		assert_eq!(sim.index_of("/a"), None);
		assert_eq!(sim.alpha(), 1.0);
	}

	#[test]
	fn disposed_simulation_does_nothing() {
		let mut sim = running(&["/a"], &[]);

		sim.dispose();

		assert_eq!(sim.state(), SimulationState::Disposed);
		assert!(!sim.tick());
		assert!(sim.nodes().is_empty());
		sim.reheat();
		assert_eq!(sim.state(), SimulationState::Disposed);
	}

	#[test]
	fn clearing_an_unpinned_node_is_harmless() {
		let mut sim = running(&["/a"], &[]);

		sim.clear_pin(0);
		sim.clear_pin(42);

		assert!(!sim.node(0).unwrap().is_pinned());
	}
}
