//! Canonical document ids and the collection prefix map.

use std::borrow::Cow;
use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Turns a raw URL path into a canonical document id.
///
/// Query and fragment are dropped, percent escapes decoded, the first
/// `skip_segments` path segments removed, a single trailing slash stripped and
/// the result prefixed with `/`. Ids, fetch slugs and current-document checks
/// must all go through this function.
pub fn normalize_id(raw: &str, skip_segments: usize) -> String {
	let path = raw.split(['?', '#']).next().unwrap_or_default();
	let decoded = percent_decode(path);
	let mut rest = decoded.strip_prefix('/').unwrap_or(&decoded);
	for _ in 0..skip_segments {
		rest = rest.split_once('/').map(|(_, tail)| tail).unwrap_or_default();
	}
	let rest = rest.strip_suffix('/').unwrap_or(rest);
	format!("/{rest}")
}

/// Path the router navigates to for a node id (whitespace becomes `-`).
pub fn navigation_path(id: &str) -> String {
	id.split_whitespace().collect::<Vec<_>>().join("-")
}

fn percent_decode(input: &str) -> String {
	percent_decode_str(input)
		.decode_utf8()
		.map(Cow::into_owned)
		.unwrap_or_else(|_| input.to_owned())
}

/// Maps an id's leading segment to its collection in O(1).
#[derive(Clone, Debug, Default)]
pub struct CollectionMap {
	by_prefix: HashMap<String, String>,
}

impl CollectionMap {
	/// Builds the map once from the collection list.
	pub fn new<I, S>(collections: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let by_prefix = collections
			.into_iter()
			.map(Into::into)
			.filter(|c: &String| !c.is_empty())
			.map(|c| (c.clone(), c))
			.collect();
		Self { by_prefix }
	}

	/// Splits `/collection/slug` into `(collection, slug)` when the leading
	/// segment is a known collection and the slug is non-empty.
	pub fn split<'a>(&'a self, id: &'a str) -> Option<(&'a str, &'a str)> {
		let rest = id.strip_prefix('/').unwrap_or(id);
		let (head, slug) = rest.split_once('/')?;
		let collection = self.by_prefix.get(head)?;
		(!slug.is_empty()).then_some((collection.as_str(), slug))
	}

	/// Canonical id of a document in `collection` with `slug`.
	pub fn id_for(collection: &str, slug: &str) -> String {
		normalize_id(&format!("/{collection}/{slug}"), 0)
	}

	/// Number of known collections.
	pub fn len(&self) -> usize {
		self.by_prefix.len()
	}

	/// True when no collection is known.
	pub fn is_empty(&self) -> bool {
		self.by_prefix.is_empty()
	}
}
