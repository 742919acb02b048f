//! Color parsing, mixing and CSS lookups.

use std::fmt;

use web_sys::Element;

/// An sRGB color with alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
	pub r: f64,
	pub g: f64,
	pub b: f64,
	pub a: f64,
}

impl Rgb {
	pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
	pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

	/// Opaque color.
	pub const fn new(r: f64, g: f64, b: f64) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a few
	/// keywords.
	pub fn parse(input: &str) -> Option<Rgb> {
		let s = input.trim();
		match s.to_ascii_lowercase().as_str() {
			"black" => return Some(Self::BLACK),
			"white" => return Some(Self::WHITE),
			"transparent" => return Some(Rgb { a: 0.0, ..Self::BLACK }),
			_ => {}
		}
		if let Some(hex) = s.strip_prefix('#') {
			return Self::parse_hex(hex);
		}
		let inner = s
			.strip_prefix("rgba(")
			.or_else(|| s.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let parts: Vec<f64> = inner
			.split([',', ' ', '/'])
			.filter(|p| !p.is_empty())
			.map(|p| p.trim().parse::<f64>())
			.collect::<Result<_, _>>()
			.ok()?;
		match parts.as_slice() {
			[r, g, b] => Some(Rgb::new(*r, *g, *b)),
			[r, g, b, a] => Some(Rgb {
				r: *r,
				g: *g,
				b: *b,
				a: a.clamp(0.0, 1.0),
			}),
			_ => None,
		}
	}

	fn parse_hex(hex: &str) -> Option<Rgb> {
		if !hex.is_ascii() {
			return None;
		}
		let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(f64::from);
		match hex.len() {
			3 | 4 => {
				let mut values = hex
					.chars()
					.map(|c| channel(&c.to_string().repeat(2)));
				let r = values.next()??;
				let g = values.next()??;
				let b = values.next()??;
				let a = values.next().flatten().map_or(1.0, |a| a / 255.0);
				Some(Rgb { r, g, b, a })
			}
			6 | 8 => {
				let r = channel(&hex[0..2])?;
				let g = channel(&hex[2..4])?;
				let b = channel(&hex[4..6])?;
				let a = if hex.len() == 8 {
					channel(&hex[6..8])? / 255.0
				} else {
					1.0
				};
				Some(Rgb { r, g, b, a })
			}
			_ => None,
		}
	}

	/// Linear blend: `t = 0` is `self`, `t = 1` is `other`.
	pub fn mix(self, other: Rgb, t: f64) -> Rgb {
		let t = t.clamp(0.0, 1.0);
		let lerp = |a: f64, b: f64| a + (b - a) * t;
		Rgb {
			r: lerp(self.r, other.r),
			g: lerp(self.g, other.g),
			b: lerp(self.b, other.b),
			a: lerp(self.a, other.a),
		}
	}

	/// Same color with alpha multiplied by `alpha`.
	pub fn with_alpha(self, alpha: f64) -> Rgb {
		Rgb {
			a: (self.a * alpha).clamp(0.0, 1.0),
			..self
		}
	}

	/// Whether the color is fully transparent.
	pub fn is_transparent(&self) -> bool {
		self.a <= 0.0
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"rgba({}, {}, {}, {})",
			self.r.round().clamp(0.0, 255.0),
			self.g.round().clamp(0.0, 255.0),
			self.b.round().clamp(0.0, 255.0),
			(self.a * 1000.0).round() / 1000.0
		)
	}
}

/// Name of the custom property referenced by `var(--name, fallback)`.
pub fn css_var_name(value: &str) -> Option<&str> {
	let inner = value.trim().strip_prefix("var(")?.strip_suffix(')')?;
	let name = inner.split(',').next()?.trim();
	name.starts_with("--").then_some(name)
}

fn css_var_fallback(value: &str) -> Option<&str> {
	let inner = value.trim().strip_prefix("var(")?.strip_suffix(')')?;
	inner.split_once(',').map(|(_, fallback)| fallback.trim())
}

/// Resolves `value` to a color, looking `var(--x)` references up on `scope`.
///
/// Unparseable values resolve to `fallback`.
pub fn resolve_color(value: &str, scope: Option<&Element>, fallback: Rgb) -> Rgb {
	let Some(name) = css_var_name(value) else {
		return Rgb::parse(value).unwrap_or(fallback);
	};
	let looked_up = scope
		.and_then(computed_property(name))
		.filter(|v| !v.trim().is_empty());
	looked_up
		.as_deref()
		.and_then(Rgb::parse)
		.or_else(|| css_var_fallback(value).and_then(Rgb::parse))
		.unwrap_or(fallback)
}

fn computed_property(name: &str) -> impl Fn(&Element) -> Option<String> + '_ {
	move |element| {
		let style = web_sys::window()?.get_computed_style(element).ok()??;
		style.get_property_value(name).ok()
	}
}

/// First non-transparent background color on `element` or its ancestors;
/// white when none is set.
pub fn inherited_background(element: &Element) -> Rgb {
	let lookup = computed_property("background-color");
	let mut current = Some(element.clone());
	while let Some(el) = current {
		if let Some(color) = lookup(&el).as_deref().and_then(Rgb::parse) {
			if !color.is_transparent() {
				return color;
			}
		}
		current = el.parent_element();
	}
	Rgb::WHITE
}
