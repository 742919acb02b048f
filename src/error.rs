//! Error type shared by the data loader and the index builder.

use thiserror::Error;

/// Failures while loading or building link graph data.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The request could not be sent or the connection failed.
	#[error("request to {url} failed: {message}")]
	Fetch {
		/// Requested URL.
		url: String,
		/// Browser supplied reason.
		message: String,
	},
	/// The server answered with a non-success status.
	#[error("request to {url} returned status {status}")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// The response body was not the JSON shape we expected.
	#[error("could not decode {what}: {source}")]
	Decode {
		/// Which payload was being decoded.
		what: &'static str,
		/// Underlying parser error.
		#[source]
		source: serde_json::Error,
	},
	/// The run was superseded before it finished.
	#[error("graph assembly was superseded")]
	Aborted,
	/// Filesystem failure while scanning a content tree.
	#[error("i/o error at {path}: {source}")]
	Io {
		/// Offending path.
		path: String,
		/// Underlying error.
		#[source]
		source: std::io::Error,
	},
	/// A browser API threw.
	#[error("javascript error: {0}")]
	Js(String),
}

impl GraphError {
	/// True when the error only signals cancellation.
	pub fn is_aborted(&self) -> bool {
		matches!(self, GraphError::Aborted)
	}
}

impl From<wasm_bindgen::JsValue> for GraphError {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		GraphError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
