use super::types::Rect;

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;
const WHEEL_STEP: f64 = 1.1;

/// Translation then uniform scale: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PanState {
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Pan/zoom state of the canvas. World origin starts at the container
/// center.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	pub transform: ViewTransform,
	pub width: f64,
	pub height: f64,
	pub zoom_enabled: bool,
	pan: Option<PanState>,
}

impl Viewport {
	pub fn new(width: f64, height: f64, zoom_enabled: bool) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			width,
			height,
			zoom_enabled,
			pan: None,
		}
	}

	pub fn scale(&self) -> f64 {
		self.transform.k
	}

	/// Resolution labels are rasterized at.
	pub fn text_resolution(&self) -> f64 {
		self.transform.k.max(1.0)
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		let t = &self.transform;
		((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
		let t = &self.transform;
		(wx * t.k + t.x, wy * t.k + t.y)
	}

	/// Scales by `factor` keeping the world point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		if !self.zoom_enabled {
			return;
		}
		let t = &mut self.transform;
		let k = (t.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = k;
	}

	/// Wheel handler: one fixed step per event.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 1.0 / WHEEL_STEP } else { WHEEL_STEP };
		self.zoom_at(sx, sy, factor);
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = Some(PanState {
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		});
	}

	pub fn is_panning(&self) -> bool {
		self.pan.is_some()
	}

	/// Returns whether a pan was in progress.
	pub fn pan_to(&mut self, sx: f64, sy: f64) -> bool {
		let Some(pan) = self.pan else {
			return false;
		};
		self.transform.x = pan.transform_start_x + (sx - pan.start_x);
		self.transform.y = pan.transform_start_y + (sy - pan.start_y);
		true
	}

	pub fn end_pan(&mut self) {
		self.pan = None;
	}

	/// Keeps the world point at the center of the old size centered.
	pub fn resize(&mut self, width: f64, height: f64) {
		let (cx, cy) = self.screen_to_world(self.width / 2.0, self.height / 2.0);
		self.width = width;
		self.height = height;
		self.transform.x = width / 2.0 - cx * self.transform.k;
		self.transform.y = height / 2.0 - cy * self.transform.k;
	}

	/// Keeps the center of `content` (world units) inside the container.
	pub fn clamp_to(&mut self, content: Rect) {
		let (cx, cy) = content.center();
		let (sx, sy) = self.world_to_screen(cx, cy);
		self.transform.x += sx.clamp(0.0, self.width) - sx;
		self.transform.y += sy.clamp(0.0, self.height) - sy;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: (f64, f64), b: (f64, f64)) -> bool {
		(a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
	}

	#[test]
	fn origin_starts_centered() {
		let viewport = Viewport::new(800.0, 600.0, true);

		assert_eq!(viewport.world_to_screen(0.0, 0.0), (400.0, 300.0));
		assert_eq!(viewport.screen_to_world(410.0, 290.0), (10.0, -10.0));
	}

	#[test]
	fn zoom_keeps_cursor_point_fixed() {
		let mut viewport = Viewport::new(800.0, 600.0, true);
		let before = viewport.screen_to_world(100.0, 50.0);

		viewport.zoom_at(100.0, 50.0, 2.0);

		assert_eq!(viewport.scale(), 2.0);
		assert!(close(viewport.screen_to_world(100.0, 50.0), before));
		assert_eq!(viewport.text_resolution(), 2.0);
	}

	#[test]
	fn zoom_is_clamped_and_can_be_disabled() {
		let mut viewport = Viewport::new(800.0, 600.0, true);
		for _ in 0..50 {
			viewport.wheel(0.0, 0.0, -1.0);
		}
		assert_eq!(viewport.scale(), MAX_ZOOM);
		viewport.zoom_at(0.0, 0.0, 0.001);
		assert_eq!(viewport.scale(), MIN_ZOOM);
		assert_eq!(viewport.text_resolution(), 1.0);

		let mut fixed = Viewport::new(800.0, 600.0, false);
		fixed.wheel(0.0, 0.0, -1.0);
		assert_eq!(fixed.scale(), 1.0);
	}

	#[test]
	fn pan_follows_pointer() {
		let mut viewport = Viewport::new(800.0, 600.0, true);
		assert!(!viewport.pan_to(5.0, 5.0));

		viewport.begin_pan(10.0, 10.0);
		assert!(viewport.pan_to(30.0, 5.0));
		viewport.end_pan();

		assert_eq!(viewport.world_to_screen(0.0, 0.0), (420.0, 295.0));
		assert!(!viewport.is_panning());
	}

	#[test]
	fn resize_keeps_center() {
		let mut viewport = Viewport::new(800.0, 600.0, true);
		viewport.zoom_at(0.0, 0.0, 2.0);
		let center = viewport.screen_to_world(400.0, 300.0);

		viewport.resize(400.0, 200.0);

		assert!(close(viewport.screen_to_world(200.0, 100.0), center));
	}

	#[test]
	fn content_cannot_leave_the_container() {
		let mut viewport = Viewport::new(800.0, 600.0, true);
		viewport.begin_pan(0.0, 0.0);
		viewport.pan_to(5000.0, -5000.0);
		let content = Rect {
			x: -10.0,
			y: -10.0,
			width: 20.0,
			height: 20.0,
		};

		viewport.clamp_to(content);

		assert_eq!(viewport.world_to_screen(0.0, 0.0), (800.0, 0.0));
	}
}
