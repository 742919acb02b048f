//! Backlink / forward-link index shared by the builder and the browser client.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
pub mod builder;
#[cfg(not(target_arch = "wasm32"))]
pub mod frontmatter;
pub mod wikilink;

/// One directed wiki-link between two canonical document ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexLink {
	/// Document containing the link.
	pub source: String,
	/// Document the link points at.
	pub target: String,
}

impl IndexLink {
	/// Convenience constructor.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Outgoing and incoming links keyed by canonical id.
///
/// Every link stored under `links[a]` with target `b` is also stored under
/// `backlinks[b]`, and the reverse. Both maps carry a key for every id that
/// takes part in at least one link, possibly with an empty list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyIndex {
	/// id → links whose source is id.
	#[serde(default)]
	pub links: BTreeMap<String, Vec<IndexLink>>,
	/// id → links whose target is id.
	#[serde(default)]
	pub backlinks: BTreeMap<String, Vec<IndexLink>>,
}

impl AdjacencyIndex {
	/// Records `source → target` in both directions. Duplicates are ignored.
	pub fn insert(&mut self, source: &str, target: &str) {
		for id in [source, target] {
			self.links.entry(id.to_owned()).or_default();
			self.backlinks.entry(id.to_owned()).or_default();
		}
		let link = IndexLink::new(source, target);
		let outgoing = self.links.entry(source.to_owned()).or_default();
		if outgoing.contains(&link) {
			return;
		}
		outgoing.push(link.clone());
		self.backlinks.entry(target.to_owned()).or_default().push(link);
	}

	/// Links leaving `id`.
	pub fn outgoing(&self, id: &str) -> &[IndexLink] {
		self.links.get(id).map(Vec::as_slice).unwrap_or_default()
	}

	/// Links arriving at `id`.
	pub fn incoming(&self, id: &str) -> &[IndexLink] {
		self.backlinks.get(id).map(Vec::as_slice).unwrap_or_default()
	}

	/// Every distinct link in the index, ordered by `(source, target)`.
	pub fn flatten(&self) -> Vec<IndexLink> {
		self.links
			.values()
			.chain(self.backlinks.values())
			.flatten()
			.cloned()
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}

	/// Checks the mirror invariant between `links` and `backlinks`.
	pub fn is_symmetric(&self) -> bool {
		let forward = self.links.iter().all(|(id, list)| {
			list.iter()
				.all(|l| &l.source == id && self.incoming(&l.target).contains(l))
		});
		let backward = self.backlinks.iter().all(|(id, list)| {
			list.iter()
				.all(|l| &l.target == id && self.outgoing(&l.source).contains(l))
		});
		forward && backward
	}
}

/// Payload of the index endpoint: the adjacency maps plus the flat,
/// de-duplicated link list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullLinkIndex {
	/// Adjacency maps.
	pub index: AdjacencyIndex,
	/// Every link once, unique by `(source, target)`.
	pub links: Vec<IndexLink>,
}

impl From<AdjacencyIndex> for FullLinkIndex {
	fn from(index: AdjacencyIndex) -> Self {
		let links = index.flatten();
		Self { index, links }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_mirrors_into_backlinks() {
		let mut index = AdjacencyIndex::default();
		index.insert("/a", "/b");
		index.insert("/a", "/c");
		index.insert("/c", "/b");

		assert!(index.is_symmetric());
		assert_eq!(index.outgoing("/a").len(), 2);
		assert_eq!(index.incoming("/b").len(), 2);
		assert!(index.incoming("/b").contains(&IndexLink::new("/a", "/b")));
		assert!(index.outgoing("/b").is_empty());
		assert!(index.links.contains_key("/b"));
	}

	#[test]
	fn duplicate_links_are_stored_once() {
		let mut index = AdjacencyIndex::default();
		index.insert("/a", "/b");
		index.insert("/a", "/b");

		assert_eq!(index.outgoing("/a").len(), 1);
		assert_eq!(index.incoming("/b").len(), 1);
	}

	#[test]
	fn flat_list_is_deduplicated() {
		let mut index = AdjacencyIndex::default();
		index.insert("/a", "/b");
		index.insert("/b", "/a");
		let full = FullLinkIndex::from(index);

		assert_eq!(
			full.links,
			vec![IndexLink::new("/a", "/b"), IndexLink::new("/b", "/a")]
		);
	}

	#[test]
	fn tampered_index_is_not_symmetric() {
		let mut index = AdjacencyIndex::default();
		index.insert("/a", "/b");
		index.backlinks.get_mut("/b").unwrap().clear();

		assert!(!index.is_symmetric());
	}

	#[test]
	fn decodes_endpoint_json() {
		let json = r#"{
			"index": {
				"links": {"/a": [{"source": "/a", "target": "/b"}]},
				"backlinks": {"/b": [{"source": "/a", "target": "/b"}]}
			},
			"links": [{"source": "/a", "target": "/b"}]
		}"#;
		let full: FullLinkIndex = serde_json::from_str(json).unwrap();

		assert_eq!(full.index.outgoing("/a")[0].target, "/b");
		assert_eq!(full.links.len(), 1);
	}
}
