//! Where the assembler gets its data from.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::index::FullLinkIndex;

/// Metadata record for one document, as served by the entry endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
	/// File path inside the collection, with extension.
	pub id: String,
	/// Owning collection.
	pub collection: String,
	/// Path inside the collection, without extension.
	#[serde(default)]
	pub slug: String,
	/// Front-matter fields.
	#[serde(default)]
	pub data: Map<String, Value>,
}

impl DocumentEntry {
	/// Non-empty `title` field, if any.
	pub fn title(&self) -> Option<&str> {
		self.data
			.get("title")
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|t| !t.is_empty())
	}
}

/// Async access to the index and per-document metadata.
///
/// All methods run on the browser's single thread, so futures need not be
/// `Send`.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
	/// Fetches the adjacency index. Failure is fatal to the graph.
	async fn link_index(&self) -> Result<FullLinkIndex, GraphError>;

	/// Fetches the collection names.
	async fn collections(&self) -> Result<Vec<String>, GraphError>;

	/// Fetches one document's metadata; `Ok(None)` when it does not exist.
	async fn entry(&self, collection: &str, slug: &str) -> Result<Option<DocumentEntry>, GraphError>;
}

/// Cooperative cancellation flag shared between a run and its owner.
///
/// Cloning shares the flag. Optional hooks run once on cancel (used to abort
/// in-flight browser requests).
#[derive(Clone, Default)]
pub struct CancelToken {
	cancelled: Rc<Cell<bool>>,
	hooks: Rc<RefCell<Vec<Box<dyn FnOnce()>>>>,
}

impl CancelToken {
	/// Fresh, un-cancelled token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the run as superseded and fires the hooks. Idempotent.
	pub fn cancel(&self) {
		if self.cancelled.replace(true) {
			return;
		}
		let hooks = std::mem::take(&mut *self.hooks.borrow_mut());
		for hook in hooks {
			hook();
		}
	}

	/// Whether [`cancel`](Self::cancel) has been called.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.get()
	}

	/// `Err(Aborted)` once cancelled.
	pub fn check(&self) -> Result<(), GraphError> {
		if self.is_cancelled() {
			Err(GraphError::Aborted)
		} else {
			Ok(())
		}
	}

	/// Registers `hook` to run on cancel; runs it now if already cancelled.
	pub fn on_cancel(&self, hook: impl FnOnce() + 'static) {
		if self.is_cancelled() {
			hook();
		} else {
			self.hooks.borrow_mut().push(Box::new(hook));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cancel_runs_hooks_once() {
		let token = CancelToken::new();
		let fired = Rc::new(Cell::new(0));
		let counter = fired.clone();
		token.on_cancel(move || counter.set(counter.get() + 1));

		assert!(token.check().is_ok());
		token.clone().cancel();
		token.cancel();

		assert_eq!(fired.get(), 1);
		assert!(token.check().unwrap_err().is_aborted());
	}

	#[test]
	fn late_hook_fires_immediately() {
		let token = CancelToken::new();
		token.cancel();
		let fired = Rc::new(Cell::new(false));
		let flag = fired.clone();
		token.on_cancel(move || flag.set(true));

		assert!(fired.get());
	}

	#[test]
	fn title_must_be_non_empty() {
		let entry: DocumentEntry = serde_json::from_str(
			r#"{"id": "a.md", "collection": "notes", "data": {"title": "  "}}"#,
		)
		.unwrap();

		assert_eq!(entry.title(), None);
		assert_eq!(entry.slug, "");
	}
}
