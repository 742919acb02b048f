/// Index of a node inside the simulation arena.
pub type NodeId = usize;

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn center(&self) -> (f64, f64) {
		(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
	}

	/// Whether the rectangles, each grown by `padding`, intersect.
	pub fn overlaps(&self, other: &Rect, padding: f64) -> bool {
		!(self.x + self.width + padding <= other.x
			|| other.x + other.width + padding <= self.x
			|| self.y + self.height + padding <= other.y
			|| other.y + other.height + padding <= self.y)
	}
}

/// Label box attached to a node, positioned relative to the node origin and
/// simulated on its own by the label collision force.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelBox {
	/// Offset of the box's top-left corner from the node.
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	/// Offset velocity.
	pub vx: f64,
	pub vy: f64,
	/// Preferred offset the box is pulled back toward.
	pub base_x: f64,
	pub base_y: f64,
	/// Held by the pointer; the collision force leaves a held box in place.
	pub held: bool,
}

impl LabelBox {
	/// Box of the given size sitting at its anchor.
	pub fn anchored(base_x: f64, base_y: f64, width: f64, height: f64) -> Self {
		Self {
			x: base_x,
			y: base_y,
			width,
			height,
			vx: 0.0,
			vy: 0.0,
			base_x,
			base_y,
			held: false,
		}
	}

	/// Absolute rectangle for an owner at `(x, y)`.
	pub fn rect_at(&self, x: f64, y: f64) -> Rect {
		Rect {
			x: x + self.x,
			y: y + self.y,
			width: self.width,
			height: self.height,
		}
	}
}

/// A document in the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentNode {
	/// Canonical id, e.g. `/notes/rust`.
	pub id: String,
	/// Display title; nodes without one get no label.
	pub title: Option<String>,
	/// Content collection, used for coloring.
	pub collection: String,
	/// Explicit fill color overriding the collection/path color.
	pub color: Option<String>,
	/// The document being viewed.
	pub is_current: bool,
	/// Position, NaN until the simulation places the node.
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position, set while dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Attached label, `None` when the node has no title.
	pub label: Option<LabelBox>,
}

impl DocumentNode {
	/// Unplaced node.
	pub fn new(id: impl Into<String>, title: Option<String>, collection: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			title,
			collection: collection.into(),
			color: None,
			is_current: false,
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			label: None,
		}
	}

	/// Whether the simulation has placed this node.
	pub fn has_position(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	/// Whether the node is pinned.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}

	/// Position as a pair.
	pub fn position(&self) -> (f64, f64) {
		(self.x, self.y)
	}

	/// Text shown on the label.
	pub fn label_text(&self) -> Option<&str> {
		self.title.as_deref().filter(|t| !t.is_empty())
	}
}

/// A link between two documents, referencing them by id.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkEdge {
	pub source: String,
	pub target: String,
	/// Visual emphasis derived from how many displayed nodes reference it.
	pub strength: f64,
}

/// Fully resolved snapshot handed to the simulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<DocumentNode>,
	pub links: Vec<LinkEdge>,
}

impl GraphData {
	/// Node ids, sorted.
	pub fn node_ids(&self) -> Vec<&str> {
		let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort_unstable();
		ids
	}
}
