use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::DocumentNode;
use crate::data::Endpoints;

/// Options recognized by the graph. Every field has a default so a partial
/// JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
	/// Wheel / pinch zoom.
	pub enable_zoom: bool,
	/// Multiplier on the many-body repulsion (`-100 * repel_force`).
	pub repel_force: f64,
	/// Preferred spring length.
	pub link_distance: f64,
	/// Fade nodes unrelated to the dragged one toward the background.
	pub dim_on_drag: bool,
	/// Hide labels until hovered; also disables label collision.
	pub hide_inactive_labels: bool,
	/// Draw the color legend.
	pub enable_legend: bool,
	/// Label font size in CSS pixels.
	pub font_size: f64,
	pub font_family: String,
	/// Leading URL segments dropped when deriving ids.
	pub skip_segments: usize,
	/// Mouse button that pans the background.
	pub pan_button: PanButton,
	pub colors: ColorConfig,
	pub labels: LabelStyle,
	/// Id prefix → fill color and legend title.
	pub path_colors: BTreeMap<String, PathColor>,
	pub endpoints: Endpoints,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			enable_zoom: true,
			repel_force: 4.0,
			link_distance: 40.0,
			dim_on_drag: false,
			hide_inactive_labels: false,
			enable_legend: true,
			font_size: 14.0,
			font_family: "sans-serif".into(),
			skip_segments: 0,
			pan_button: PanButton::Left,
			colors: ColorConfig::default(),
			labels: LabelStyle::default(),
			path_colors: BTreeMap::new(),
			endpoints: Endpoints::default(),
		}
	}
}

impl GraphConfig {
	/// Fill color of `node` before hover/dim effects.
	///
	/// The current node uses the active color, then an explicit node color,
	/// then the longest matching path prefix, then the inactive color.
	pub fn node_color<'a>(&'a self, node: &'a DocumentNode) -> &'a str {
		if node.is_current {
			return &self.colors.active_node;
		}
		if let Some(color) = &node.color {
			return color;
		}
		self.path_color(&node.id)
			.unwrap_or(&self.colors.node_inactive)
	}

	fn path_color(&self, id: &str) -> Option<&str> {
		self.path_colors
			.iter()
			.filter(|(prefix, _)| id.starts_with(prefix.as_str()))
			.max_by_key(|(prefix, _)| prefix.len())
			.map(|(_, pc)| pc.color.as_str())
	}

	/// Legend rows: `(title, color)`.
	pub fn legend(&self) -> Vec<(&str, &str)> {
		let mut rows = vec![
			("Current", self.colors.active_node.as_str()),
			("Note", self.colors.node_inactive.as_str()),
		];
		rows.extend(
			self.path_colors
				.values()
				.map(|pc| (pc.title.as_str(), pc.color.as_str())),
		);
		rows
	}

	/// Resting label opacity.
	pub fn idle_label_alpha(&self) -> f64 {
		if self.hide_inactive_labels { 0.0 } else { 0.5 }
	}
}

/// Colors per semantic role. Values may be any CSS color or `var(--x)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorConfig {
	pub active_node: String,
	pub node_inactive: String,
	pub active_link: String,
	pub link_inactive: String,
	pub node_stroke: String,
	pub label_bg: String,
	pub label: String,
	pub label_border: String,
}

impl Default for ColorConfig {
	fn default() -> Self {
		Self {
			active_node: "#00e7e3".into(),
			node_inactive: "#1aadab".into(),
			active_link: "#ff69a3".into(),
			link_inactive: "#adadad".into(),
			node_stroke: "#000000".into(),
			label_bg: "#ededed".into(),
			label: "#000000".into(),
			label_border: "#000000".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelStyle {
	pub border_width: f64,
	pub padding: f64,
	pub border_style: BorderStyle,
}

impl Default for LabelStyle {
	fn default() -> Self {
		Self {
			border_width: 0.0,
			padding: 6.0,
			border_style: BorderStyle::Solid,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
	#[default]
	Solid,
	Dashed,
	Dotted,
}

impl BorderStyle {
	/// Line dash `[dash, gap]`, `None` for a solid border.
	pub fn dash_pattern(self) -> Option<[f64; 2]> {
		match self {
			BorderStyle::Solid => None,
			BorderStyle::Dashed => Some([2.0, 5.0]),
			BorderStyle::Dotted => Some([0.5, 3.0]),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanButton {
	#[default]
	Left,
	Middle,
	Right,
}

impl PanButton {
	/// `MouseEvent.button` value.
	pub fn code(self) -> i16 {
		match self {
			PanButton::Left => 0,
			PanButton::Middle => 1,
			PanButton::Right => 2,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathColor {
	pub color: String,
	pub title: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: GraphConfig = serde_json::from_str(
			r#"{"repelForce": 2, "labels": {"borderStyle": "dashed"}, "colors": {"activeLink": "red"}}"#,
		)
		.unwrap();

		assert_eq!(config.repel_force, 2.0);
		assert_eq!(config.link_distance, 40.0);
		assert_eq!(config.labels.border_style, BorderStyle::Dashed);
		assert_eq!(config.labels.padding, 6.0);
		assert_eq!(config.colors.active_link, "red");
		assert_eq!(config.colors.node_inactive, "#1aadab");
	}

	#[test]
	fn node_color_precedence() {
		let mut config = GraphConfig::default();
		config.path_colors.insert(
			"/blog".into(),
			PathColor {
				color: "#111".into(),
				title: "Blog".into(),
			},
		);
		config.path_colors.insert(
			"/blog/drafts".into(),
			PathColor {
				color: "#222".into(),
				title: "Drafts".into(),
			},
		);

		let mut node = DocumentNode::new("/blog/drafts/x", None, "blog");
		assert_eq!(config.node_color(&node), "#222");
		node.id = "/blog/y".into();
		assert_eq!(config.node_color(&node), "#111");
		node.id = "/other".into();
		assert_eq!(config.node_color(&node), "#1aadab");
		node.color = Some("#333".into());
		assert_eq!(config.node_color(&node), "#333");
		node.is_current = true;
		assert_eq!(config.node_color(&node), "#00e7e3");
		assert_eq!(config.legend().len(), 4);
	}

	#[test]
	fn dash_patterns() {
		assert_eq!(BorderStyle::Solid.dash_pattern(), None);
		assert_eq!(BorderStyle::Dotted.dash_pattern(), Some([0.5, 3.0]));
	}
}
