use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::components::force_graph::{BacklinkGraph, GraphConfig};

/// Backlink graph of the document at the current location.
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<GraphConfig>().unwrap_or_default();
	let pathname = use_location().pathname;

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="backlink-graph-page">
				<BacklinkGraph current=pathname config=config />
			</div>
		</ErrorBoundary>
	}
}
