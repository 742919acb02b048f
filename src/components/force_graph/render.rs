use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::{LabelPrimitive, Scene};
use super::state::ForceGraphState;

const LABEL_CORNER: f64 = 3.75;
const LEGEND_MARGIN: f64 = 12.0;
const LEGEND_ROW: f64 = 18.0;
const LEGEND_SWATCH: f64 = 5.0;

pub fn font(size: f64, family: &str) -> String {
	format!("{size}px {family}")
}

/// Draws one frame. `dpr` is the device pixel ratio the canvas was sized
/// with.
pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, dpr: f64) {
	let vp = &state.viewport;
	let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
	ctx.clear_rect(0.0, 0.0, vp.width, vp.height);

	let t = vp.transform;
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(&state.scene, ctx);
	draw_nodes(&state.scene, ctx);
	draw_labels(state, ctx);
	ctx.restore();

	if state.config.enable_legend {
		draw_legend(state, ctx);
	}
}

fn draw_links(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	for link in &scene.links {
		if !(link.x1.is_finite() && link.x2.is_finite()) {
			continue;
		}
		ctx.set_stroke_style_str(&link.color.to_string());
		ctx.set_line_width(link.width);
		ctx.begin_path();
		ctx.move_to(link.x1, link.y1);
		ctx.line_to(link.x2, link.y2);
		ctx.stroke();
	}
}

fn draw_nodes(scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let stroke = scene.palette.node_stroke.to_string();
	for &id in scene.draw_order() {
		let node = &scene.nodes[id];
		if !node.x.is_finite() || !node.y.is_finite() {
			continue;
		}
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.fill.to_string());
		ctx.fill();
		if node.stroke_width > 0.01 {
			ctx.set_stroke_style_str(&stroke);
			ctx.set_line_width(node.stroke_width);
			ctx.stroke();
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let scene = &state.scene;
	for &id in scene.draw_order() {
		if let Some(label) = &scene.labels[id] {
			if label.opacity > 0.0 && label.rect.x.is_finite() {
				draw_label(state, label, ctx);
			}
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_label(state: &ForceGraphState, label: &LabelPrimitive, ctx: &CanvasRenderingContext2d) {
	let (palette, style) = (&state.scene.palette, &state.config.labels);
	let r = label.rect;
	ctx.set_global_alpha(label.opacity);

	rounded_rect(ctx, r.x, r.y, r.width, r.height, LABEL_CORNER);
	ctx.set_fill_style_str(&palette.label_bg.to_string());
	ctx.fill();

	if style.border_width > 0.0 {
		let dash = js_sys::Array::new();
		if let Some([on, off]) = style.border_style.dash_pattern() {
			dash.push(&JsValue::from_f64(on));
			dash.push(&JsValue::from_f64(off));
		}
		let _ = ctx.set_line_dash(&dash);
		ctx.set_stroke_style_str(&palette.label_border.to_string());
		ctx.set_line_width(style.border_width);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	// text is rasterized at the zoom-compensated resolution
	let res = state.viewport.text_resolution();
	let (cx, cy) = r.center();
	ctx.save();
	let _ = ctx.translate(cx, cy);
	let _ = ctx.scale(1.0 / res, 1.0 / res);
	ctx.set_font(&font(state.config.font_size * res, &state.config.font_family));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_fill_style_str(&palette.label.to_string());
	let _ = ctx.fill_text(&label.text, 0.0, 0.0);
	ctx.restore();
}

fn draw_legend(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let text = state.scene.palette.label.to_string();
	ctx.set_font(&font(state.config.font_size * 0.85, &state.config.font_family));
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");

	for (row, (title, color)) in state.legend.iter().enumerate() {
		let y = LEGEND_MARGIN + row as f64 * LEGEND_ROW;
		ctx.begin_path();
		let _ = ctx.arc(LEGEND_MARGIN, y, LEGEND_SWATCH, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&color.to_string());
		ctx.fill();
		ctx.set_fill_style_str(&text);
		let _ = ctx.fill_text(title, LEGEND_MARGIN + LEGEND_SWATCH * 2.0 + 4.0, y);
	}
}
