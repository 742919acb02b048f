//! Pointer state machine.
//!
//! The controller is the only writer of pins and hand-placed label offsets.
//! At most one entity is dragged at a time: the first pointer-down wins and
//! later ones are ignored until pointer-up.

use log::debug;

use super::scene::HitTarget;
use super::simulation::ForceSimulation;
use super::types::NodeId;

/// Screen distance a pointer may travel before a press becomes a drag.
pub const CLICK_TOLERANCE: f64 = 3.0;

/// A pointer position in both coordinate spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
	pub screen: (f64, f64),
	pub world: (f64, f64),
}

/// Bookkeeping for the entity being dragged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
	pub target: HitTarget,
	/// Pointer offset from the node origin (node drags) or from the label
	/// corner (label drags).
	grab: (f64, f64),
	/// Owner position when the drag started.
	anchor: (f64, f64),
	start: (f64, f64),
	moved: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
	#[default]
	Idle,
	HoveringNode(NodeId),
	HoveringLabel(NodeId),
	DraggingNode(Drag),
	DraggingLabel(Drag),
}

/// Outcomes the host reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
	HoverChanged(Option<NodeId>),
	Navigate(NodeId),
}

#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	state: InteractionState,
}

impl InteractionController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> InteractionState {
		self.state
	}

	fn drag(&self) -> Option<&Drag> {
		match &self.state {
			InteractionState::DraggingNode(d) | InteractionState::DraggingLabel(d) => Some(d),
			_ => None,
		}
	}

	/// The entity holding the pointer, if a drag is active.
	pub fn captured(&self) -> Option<HitTarget> {
		self.drag().map(|d| d.target)
	}

	pub fn dragged(&self) -> Option<NodeId> {
		self.captured().map(HitTarget::node)
	}

	/// Node shown as hovered; a dragged node counts as hovered.
	pub fn hovered(&self) -> Option<NodeId> {
		match self.state {
			InteractionState::Idle => None,
			InteractionState::HoveringNode(id) | InteractionState::HoveringLabel(id) => Some(id),
			InteractionState::DraggingNode(d) | InteractionState::DraggingLabel(d) => Some(d.target.node()),
		}
	}

	fn transition(&mut self, next: InteractionState) -> Option<InteractionEvent> {
		let before = self.hovered();
		self.state = next;
		let after = self.hovered();
		(before != after).then_some(InteractionEvent::HoverChanged(after))
	}

	/// Pointer entered `target`, or empty space for `None`. Ignored while
	/// dragging.
	pub fn pointer_over(&mut self, target: Option<HitTarget>) -> Option<InteractionEvent> {
		if self.drag().is_some() {
			return None;
		}
		self.transition(match target {
			None => InteractionState::Idle,
			Some(HitTarget::Node(id)) => InteractionState::HoveringNode(id),
			Some(HitTarget::Label(id)) => InteractionState::HoveringLabel(id),
		})
	}

	/// Pointer left the hovered primitive or the canvas.
	pub fn pointer_leave(&mut self) -> Option<InteractionEvent> {
		self.pointer_over(None)
	}

	/// Starts a drag on `target`. No-op while another drag is active.
	pub fn pointer_down(
		&mut self,
		target: HitTarget,
		pointer: Pointer,
		sim: &mut ForceSimulation,
	) -> Option<InteractionEvent> {
		if self.drag().is_some() {
			debug!("pointer-down on {target:?} ignored, drag in progress");
			return None;
		}
		let id = target.node();
		let node = sim.node(id)?;
		let anchor = node.position();
		let (wx, wy) = pointer.world;

		let grab = match target {
			HitTarget::Node(_) => (wx - anchor.0, wy - anchor.1),
			HitTarget::Label(_) => {
				let label = node.label.as_ref()?;
				(wx - anchor.0 - label.x, wy - anchor.1 - label.y)
			}
		};

		// a label drag leaves its owner pinned where it was
		sim.set_pin(id, anchor.0, anchor.1);
		sim.reheat();

		let drag = Drag {
			target,
			grab,
			anchor,
			start: pointer.screen,
			moved: false,
		};
		self.transition(match target {
			HitTarget::Node(_) => InteractionState::DraggingNode(drag),
			HitTarget::Label(_) => InteractionState::DraggingLabel(drag),
		})
	}

	/// Moves the dragged entity. A move addressed to anything other than the
	/// entity recorded at pointer-down is ignored; returns whether it applied.
	pub fn pointer_move(&mut self, target: HitTarget, pointer: Pointer, sim: &mut ForceSimulation) -> bool {
		let drag = match &mut self.state {
			InteractionState::DraggingNode(d) | InteractionState::DraggingLabel(d) if d.target == target => d,
			_ => return false,
		};
		let (sx, sy) = pointer.screen;
		if (sx - drag.start.0).hypot(sy - drag.start.1) > CLICK_TOLERANCE {
			drag.moved = true;
		}
		if !drag.moved {
			return true;
		}

		let (wx, wy) = pointer.world;
		match target {
			HitTarget::Node(id) => sim.set_pin(id, wx - drag.grab.0, wy - drag.grab.1),
			HitTarget::Label(id) => sim.set_label_offset(
				id,
				wx - drag.anchor.0 - drag.grab.0,
				wy - drag.anchor.1 - drag.grab.1,
			),
		}
		true
	}

	/// Ends the drag. Returns [`InteractionEvent::Navigate`] for a press
	/// that never moved. Calling it with no drag active does nothing.
	pub fn pointer_up(&mut self, sim: &mut ForceSimulation) -> Option<InteractionEvent> {
		let drag = *self.drag()?;
		self.release(&drag, sim);
		self.state = InteractionState::Idle;
		let id = drag.target.node();
		if drag.moved {
			Some(InteractionEvent::HoverChanged(None))
		} else {
			Some(InteractionEvent::Navigate(id))
		}
	}

	fn release(&self, drag: &Drag, sim: &mut ForceSimulation) {
		let id = drag.target.node();
		sim.clear_pin(id);
		if let HitTarget::Label(_) = drag.target {
			sim.release_label(id);
		}
		sim.cool();
	}

	/// Drops any drag and hover, e.g. on unmount.
	pub fn cancel(&mut self, sim: &mut ForceSimulation) {
		if let Some(drag) = self.drag().copied() {
			self.release(&drag, sim);
		}
		self.state = InteractionState::Idle;
	}
}
