//! Leptos client-side app wiring and routes, plus the link index shared with
//! the `link-index` build tool.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info, warn};

// Modules
pub mod components;
pub mod data;
pub mod error;
pub mod index;
mod pages;

// Top-Level pages
use crate::components::force_graph::GraphConfig;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Id of the optional `<script type="application/json">` element holding
/// the graph configuration.
pub const CONFIG_ELEMENT_ID: &str = "graph-config";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Reads the graph configuration embedded in the page, falling back to the
/// defaults when it is missing or malformed.
pub fn load_config() -> GraphConfig {
	let text = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
		.and_then(|e| e.text_content());
	match text {
		Some(text) => parse_config(&text),
		None => GraphConfig::default(),
	}
}

fn parse_config(text: &str) -> GraphConfig {
	serde_json::from_str(text).unwrap_or_else(|err| {
		warn!("ignoring malformed graph config: {err}");
		GraphConfig::default()
	})
}

/// An app router which renders the graph for whatever document is open.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	provide_context(load_config());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />

		<Title text="Backlinks" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/*any") view=Home />
			</Routes>
		</Router>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn embedded_config_overrides_defaults() {
		let config = parse_config(r#"{"repelForce": 8, "panButton": "middle", "skipSegments": 1}"#);

		assert_eq!(config.repel_force, 8.0);
		assert_eq!(config.skip_segments, 1);
		assert!(config.enable_zoom);
	}

	#[test]
	fn malformed_config_falls_back() {
		assert_eq!(parse_config("{not json"), GraphConfig::default());
	}
}
