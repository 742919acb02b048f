//! Builds the ego network of the current document.

use std::collections::{BTreeSet, HashSet};

use futures::future::join_all;
use log::{debug, info};

use super::ids::{CollectionMap, normalize_id};
use super::source::{CancelToken, DocumentSource};
use crate::components::force_graph::{DocumentNode, GraphData, LinkEdge};
use crate::error::GraphError;
use crate::index::wikilink::strip_document_extension;

/// Computes the graph shown for `current_url`.
///
/// The ego set (current id, its link targets and backlink sources) is
/// resolved concurrently; ids that do not resolve are dropped. Every index
/// link touching a resolved node is kept, and endpoints outside the ego set
/// are resolved and appended. Returns `Err(Aborted)` as soon as `cancel`
/// fires; a partial graph is never returned.
pub async fn assemble<S: DocumentSource>(
	source: &S,
	current_url: &str,
	skip_segments: usize,
	cancel: &CancelToken,
) -> Result<GraphData, GraphError> {
	let full = source.link_index().await?;
	cancel.check()?;
	let collections = CollectionMap::new(source.collections().await?);
	cancel.check()?;

	let current = normalize_id(current_url, skip_segments);
	let ego: BTreeSet<&str> = full
		.index
		.outgoing(&current)
		.iter()
		.map(|l| l.target.as_str())
		.chain(full.index.incoming(&current).iter().map(|l| l.source.as_str()))
		.chain(std::iter::once(current.as_str()))
		.collect();

	let mut nodes = resolve_all(source, &collections, ego.into_iter()).await;
	cancel.check()?;

	let resolved: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
	let touching: Vec<_> = full
		.links
		.iter()
		.filter(|l| l.source != l.target)
		.filter(|l| resolved.contains(&l.source) || resolved.contains(&l.target))
		.collect();

	let missing: BTreeSet<&str> = touching
		.iter()
		.flat_map(|l| [l.source.as_str(), l.target.as_str()])
		.filter(|id| !resolved.contains(*id))
		.collect();
	if !missing.is_empty() {
		let extra = resolve_all(source, &collections, missing.into_iter()).await;
		cancel.check()?;
		nodes.extend(extra);
	}

	let displayed: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let total = touching.len().max(1) as f64;
	let links: Vec<LinkEdge> = touching
		.iter()
		.filter(|l| displayed.contains(l.source.as_str()) && displayed.contains(l.target.as_str()))
		.map(|l| {
			let referencing = [&l.source, &l.target]
				.into_iter()
				.filter(|id| resolved.contains(*id))
				.count();
			LinkEdge {
				source: l.source.clone(),
				target: l.target.clone(),
				strength: (referencing as f64 / total).ln_1p(),
			}
		})
		.collect();

	for node in &mut nodes {
		node.is_current = node.id == current;
	}

	info!(
		"assembled graph for {current}: {} nodes, {} links",
		nodes.len(),
		links.len()
	);
	Ok(GraphData { nodes, links })
}

async fn resolve_all<'a, S: DocumentSource>(
	source: &S,
	collections: &CollectionMap,
	ids: impl Iterator<Item = &'a str>,
) -> Vec<DocumentNode> {
	join_all(ids.map(|id| resolve(source, collections, id)))
		.await
		.into_iter()
		.flatten()
		.collect()
}

async fn resolve<S: DocumentSource>(
	source: &S,
	collections: &CollectionMap,
	id: &str,
) -> Option<DocumentNode> {
	let Some((collection, slug)) = collections.split(id) else {
		debug!("dropping {id}: no matching collection");
		return None;
	};
	let entry = match source.entry(collection, slug).await {
		Ok(Some(entry)) => entry,
		Ok(None) => {
			debug!("dropping {id}: not found");
			return None;
		}
		Err(err) => {
			debug!("dropping {id}: {err}");
			return None;
		}
	};

	let slug = if entry.slug.is_empty() {
		strip_document_extension(&entry.id)
	} else {
		entry.slug.as_str()
	};
	let mut node = DocumentNode::new(
		CollectionMap::id_for(&entry.collection, slug),
		entry.title().map(str::to_owned),
		entry.collection.clone(),
	);
	node.color = entry
		.data
		.get("color")
		.and_then(|c| c.as_str())
		.map(str::to_owned);
	Some(node)
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::collections::HashMap;

	use futures::executor::block_on;
	use serde_json::json;

	use super::*;
	use crate::data::DocumentEntry;
	use crate::index::{AdjacencyIndex, FullLinkIndex};

	#[derive(Default)]
	struct MemorySource {
		index: AdjacencyIndex,
		entries: HashMap<String, DocumentEntry>,
		failing: HashSet<String>,
		index_fails: bool,
		cancel_on_entry: Option<CancelToken>,
		requested: RefCell<Vec<String>>,
	}

	impl MemorySource {
		fn with_links(links: &[(&str, &str)]) -> Self {
			let mut index = AdjacencyIndex::default();
			for (s, t) in links {
				index.insert(s, t);
			}
			Self {
				index,
				..Default::default()
			}
		}

		fn document(mut self, id: &str, title: &str) -> Self {
			let rest = id.trim_start_matches('/');
			let (collection, slug) = rest.split_once('/').unwrap();
			self.entries.insert(
				id.to_owned(),
				DocumentEntry {
					id: format!("{slug}.md"),
					collection: collection.to_owned(),
					slug: slug.to_owned(),
					data: json!({ "title": title }).as_object().unwrap().clone(),
				},
			);
			self
		}
	}

	impl DocumentSource for MemorySource {
		async fn link_index(&self) -> Result<FullLinkIndex, GraphError> {
			if self.index_fails {
				return Err(GraphError::Status {
					url: "/api/links.json".into(),
					status: 500,
				});
			}
			Ok(FullLinkIndex::from(self.index.clone()))
		}

		async fn collections(&self) -> Result<Vec<String>, GraphError> {
			Ok(vec!["n".into(), "m".into()])
		}

		async fn entry(&self, collection: &str, slug: &str) -> Result<Option<DocumentEntry>, GraphError> {
			let id = format!("/{collection}/{slug}");
			self.requested.borrow_mut().push(id.clone());
			if let Some(token) = &self.cancel_on_entry {
				token.cancel();
			}
			if self.failing.contains(&id) {
				return Err(GraphError::Js("boom".into()));
			}
			Ok(self.entries.get(&id).cloned())
		}
	}

	fn ids(data: &GraphData) -> Vec<&str> {
		data.node_ids()
	}

	#[test]
	fn ego_set_of_single_link() {
		let mut index = AdjacencyIndex::default();
		index.links.insert("/n/a".into(), vec![crate::index::IndexLink::new("/n/a", "/n/b")]);
		index
			.backlinks
			.insert("/n/b".into(), vec![crate::index::IndexLink::new("/n/a", "/n/b")]);
		let source = MemorySource {
			index,
			..Default::default()
		}
		.document("/n/a", "A")
		.document("/n/b", "B");

		let data = block_on(assemble(&source, "/n/a/", 0, &CancelToken::new())).unwrap();

		assert_eq!(ids(&data), vec!["/n/a", "/n/b"]);
		assert_eq!(data.links.len(), 1);
		let current: Vec<_> = data.nodes.iter().filter(|n| n.is_current).collect();
		assert_eq!(current.len(), 1);
		assert_eq!(current[0].id, "/n/a");
		assert_eq!(current[0].title.as_deref(), Some("A"));
	}

	#[test]
	fn second_degree_nodes_come_from_edges() {
		let source = MemorySource::with_links(&[("/n/a", "/n/b"), ("/n/b", "/n/c"), ("/n/c", "/n/d")])
			.document("/n/a", "A")
			.document("/n/b", "B")
			.document("/n/c", "C")
			.document("/n/d", "D");

		let data = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap();

		// b's link to c pulls c in; c's link to d touches nothing displayed
		assert_eq!(ids(&data), vec!["/n/a", "/n/b", "/n/c"]);
		assert_eq!(data.links.len(), 2);
	}

	#[test]
	fn unresolvable_nodes_are_dropped_with_their_edges() {
		let mut source =
			MemorySource::with_links(&[("/n/a", "/n/b"), ("/n/c", "/n/a"), ("/n/a", "/x/gone")])
				.document("/n/a", "A")
				.document("/n/b", "B")
				.document("/n/c", "C");
		source.failing.insert("/n/c".into());

		let data = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap();

		assert_eq!(ids(&data), vec!["/n/a", "/n/b"]);
		assert!(data.links.iter().all(|l| l.source != "/n/c" && l.target != "/x/gone"));
	}

	#[test]
	fn index_failure_is_fatal() {
		let mut source = MemorySource::with_links(&[("/n/a", "/n/b")]);
		source.index_fails = true;

		let err = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap_err();

		assert!(matches!(err, GraphError::Status { status: 500, .. }));
	}

	#[test]
	fn repeated_runs_agree() {
		let source = MemorySource::with_links(&[("/n/a", "/n/b"), ("/m/c", "/n/a"), ("/n/b", "/m/c")])
			.document("/n/a", "A")
			.document("/n/b", "B")
			.document("/m/c", "C");

		let first = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap();
		let second = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap();

		assert_eq!(ids(&first), ids(&second));
		assert_eq!(first.links, second.links);
	}

	#[test]
	fn strength_grows_with_reference_share() {
		let source = MemorySource::with_links(&[("/n/a", "/n/b"), ("/n/b", "/n/c")])
			.document("/n/a", "A")
			.document("/n/b", "B")
			.document("/n/c", "C");

		let data = block_on(assemble(&source, "/n/a", 0, &CancelToken::new())).unwrap();
		let strength = |s: &str, t: &str| {
			data.links
				.iter()
				.find(|l| l.source == s && l.target == t)
				.map(|l| l.strength)
				.unwrap()
		};

		// a-b has both endpoints in the ego set, b-c only one
		assert!(strength("/n/a", "/n/b") > strength("/n/b", "/n/c"));
		assert!(strength("/n/b", "/n/c") > 0.0);
	}

	#[test]
	fn cancelled_run_is_abandoned() {
		let token = CancelToken::new();
		let mut source = MemorySource::with_links(&[("/n/a", "/n/b")])
			.document("/n/a", "A")
			.document("/n/b", "B");
		source.cancel_on_entry = Some(token.clone());

		let result = block_on(assemble(&source, "/n/a", 0, &token));

		assert!(result.unwrap_err().is_aborted());
	}

	#[test]
	fn skip_segments_apply_to_the_current_id() {
		let source = MemorySource::with_links(&[("/n/a", "/n/b")])
			.document("/n/a", "A")
			.document("/n/b", "B");

		let data = block_on(assemble(&source, "/docs/n/b/", 1, &CancelToken::new())).unwrap();

		assert!(data.nodes.iter().any(|n| n.id == "/n/b" && n.is_current));
		assert_eq!(source.requested.borrow().len(), 2);
	}
}
