//! Browser `fetch` implementation of [`DocumentSource`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Request, RequestInit, Response};

use super::source::{CancelToken, DocumentEntry, DocumentSource};
use crate::error::GraphError;
use crate::index::FullLinkIndex;

/// URLs of the three JSON endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
	/// Adjacency index.
	pub index: String,
	/// Collection names.
	pub collections: String,
	/// Prefix of per-document entries; `/{collection}/{slug}.json` is appended.
	pub entries: String,
}

impl Default for Endpoints {
	fn default() -> Self {
		Self {
			index: "/api/links.json".into(),
			collections: "/api/collections.json".into(),
			entries: "/api/entries".into(),
		}
	}
}

impl Endpoints {
	/// URL of one document's metadata.
	pub fn entry_url(&self, collection: &str, slug: &str) -> String {
		format!("{}/{}/{}.json", self.entries.trim_end_matches('/'), collection, slug)
	}
}

/// Fetches graph data over HTTP; every request is aborted when the owning
/// run is cancelled.
pub struct HttpSource {
	endpoints: Endpoints,
	controller: Option<AbortController>,
}

impl HttpSource {
	/// Source bound to `cancel`.
	pub fn new(endpoints: Endpoints, cancel: &CancelToken) -> Self {
		let controller = AbortController::new().ok();
		if let Some(controller) = controller.clone() {
			cancel.on_cancel(move || controller.abort());
		}
		Self {
			endpoints,
			controller,
		}
	}

	/// GETs `url` and decodes it; `Ok(None)` on 404 or a JSON `null` body.
	async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &'static str) -> Result<Option<T>, GraphError> {
		let fetch_error = |err: wasm_bindgen::JsValue| GraphError::Fetch {
			url: url.to_owned(),
			message: err.as_string().unwrap_or_else(|| format!("{err:?}")),
		};
		let window = web_sys::window().ok_or_else(|| GraphError::Js("no window".into()))?;

		let init = RequestInit::new();
		init.set_method("GET");
		if let Some(controller) = &self.controller {
			init.set_signal(Some(&controller.signal()));
		}
		let encoded: String = js_sys::encode_uri(url).into();
		let request = Request::new_with_str_and_init(&encoded, &init).map_err(fetch_error)?;
		request.headers().set("Accept", "application/json")?;

		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(fetch_error)?
			.dyn_into()?;
		if response.status() == 404 {
			return Ok(None);
		}
		if !response.ok() {
			return Err(GraphError::Status {
				url: url.to_owned(),
				status: response.status(),
			});
		}

		let body = JsFuture::from(response.text()?).await.map_err(fetch_error)?;
		let body = body.as_string().unwrap_or_default();
		serde_json::from_str::<Option<T>>(&body).map_err(|source| GraphError::Decode { what, source })
	}
}

impl DocumentSource for HttpSource {
	async fn link_index(&self) -> Result<FullLinkIndex, GraphError> {
		Ok(self
			.get_json(&self.endpoints.index, "link index")
			.await?
			.unwrap_or_default())
	}

	async fn collections(&self) -> Result<Vec<String>, GraphError> {
		Ok(self
			.get_json(&self.endpoints.collections, "collection list")
			.await?
			.unwrap_or_default())
	}

	async fn entry(&self, collection: &str, slug: &str) -> Result<Option<DocumentEntry>, GraphError> {
		self.get_json(&self.endpoints.entry_url(collection, slug), "document entry")
			.await
	}
}
