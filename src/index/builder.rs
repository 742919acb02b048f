//! Scans a content directory and builds the link index.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::Regex;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use super::wikilink::{DOCUMENT_EXTENSIONS, PermalinkResolver, extract_targets, strip_document_extension};
use super::{AdjacencyIndex, FullLinkIndex, frontmatter};
use crate::data::DocumentEntry;
use crate::error::GraphError;

const TEMPLATE_DIRS: &[&str] = &["templates", "_templates"];

/// A document found under the content root.
#[derive(Clone, Debug)]
pub struct ContentDocument {
	/// Path relative to the content root, `/`-separated, with extension.
	pub relative_path: String,
	/// Canonical id: `/` + relative path without extension.
	pub permalink: String,
	/// First directory below the root, if the document lives in one.
	pub collection: Option<String>,
	/// Path inside the collection without extension.
	pub slug: String,
	/// Front-matter fields.
	pub fields: Map<String, Value>,
	body: String,
}

impl ContentDocument {
	/// Metadata record served for this document, if it belongs to a collection.
	pub fn entry(&self) -> Option<DocumentEntry> {
		let collection = self.collection.clone()?;
		let id = self
			.relative_path
			.strip_prefix(&format!("{collection}/"))
			.unwrap_or(&self.relative_path)
			.to_owned();
		Some(DocumentEntry {
			id,
			collection,
			slug: self.slug.clone(),
			data: self.fields.clone(),
		})
	}
}

/// Output of a full scan.
#[derive(Clone, Debug, Default)]
pub struct BuiltIndex {
	/// Every indexed document.
	pub documents: Vec<ContentDocument>,
	/// The adjacency maps.
	pub index: AdjacencyIndex,
	/// Top-level directory names.
	pub collections: Vec<String>,
	/// Wiki-links whose target did not resolve.
	pub unresolved: usize,
}

impl BuiltIndex {
	/// Endpoint payload for the index.
	pub fn full_index(&self) -> FullLinkIndex {
		FullLinkIndex::from(self.index.clone())
	}
}

/// Builds an [`AdjacencyIndex`] from a directory of wiki-linked documents.
pub struct LinkIndexBuilder {
	root: PathBuf,
	excludes: Vec<Regex>,
}

impl LinkIndexBuilder {
	/// Builder over `root`, the content directory whose children are collections.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			excludes: Vec::new(),
		}
	}

	/// Skips documents whose relative path matches `pattern`.
	pub fn exclude(mut self, pattern: Regex) -> Self {
		self.excludes.push(pattern);
		self
	}

	/// Content root.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Lists top-level directories, sorted.
	pub fn collections(&self) -> Result<Vec<String>, GraphError> {
		let entries = fs::read_dir(&self.root).map_err(|source| self.io_error(&self.root, source))?;
		let mut collections = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|source| self.io_error(&self.root, source))?;
			if entry.path().is_dir() {
				collections.push(entry.file_name().to_string_lossy().into_owned());
			}
		}
		collections.sort();
		Ok(collections)
	}

	/// Reads every document below the root.
	pub fn scan(&self) -> Result<Vec<ContentDocument>, GraphError> {
		let mut documents = Vec::new();
		for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
			let entry = entry.map_err(|err| {
				let path = err.path().unwrap_or(self.root.as_path()).to_path_buf();
				GraphError::Io {
					path: path.display().to_string(),
					source: err.into(),
				}
			})?;
			if !entry.file_type().is_file() {
				continue;
			}
			let Ok(relative) = entry.path().strip_prefix(&self.root) else {
				continue;
			};
			let relative_path = relative
				.components()
				.map(|c| c.as_os_str().to_string_lossy())
				.collect::<Vec<_>>()
				.join("/");
			if !self.accepts(&relative_path) {
				continue;
			}

			let content =
				fs::read_to_string(entry.path()).map_err(|source| self.io_error(entry.path(), source))?;
			let (fields, body) = frontmatter::split(&content);
			let stem = strip_document_extension(&relative_path).to_owned();
			let (collection, slug) = match stem.split_once('/') {
				Some((collection, slug)) => (Some(collection.to_owned()), slug.to_owned()),
				None => (None, stem.clone()),
			};
			documents.push(ContentDocument {
				permalink: format!("/{stem}"),
				relative_path,
				collection,
				slug,
				fields,
				body: body.to_owned(),
			});
		}
		debug!("scanned {} documents under {}", documents.len(), self.root.display());
		Ok(documents)
	}

	/// Scans the tree and links every resolvable wiki-link.
	pub fn build(&self) -> Result<BuiltIndex, GraphError> {
		let documents = self.scan()?;
		let resolver = PermalinkResolver::new(documents.iter().map(|d| d.permalink.clone()));
		let mut index = AdjacencyIndex::default();
		let mut unresolved = 0;

		for document in &documents {
			for target in extract_targets(&document.body) {
				match resolver.resolve(&target) {
					Some(permalink) if permalink != document.permalink => {
						index.insert(&document.permalink, &permalink);
					}
					Some(_) => {}
					None => {
						debug!("{}: unresolved wiki-link [[{target}]]", document.permalink);
						unresolved += 1;
					}
				}
			}
		}

		info!(
			"indexed {} documents, {} linked ids, {} unresolved links",
			documents.len(),
			index.links.len(),
			unresolved
		);
		Ok(BuiltIndex {
			documents,
			index,
			collections: self.collections()?,
			unresolved,
		})
	}

	fn accepts(&self, relative_path: &str) -> bool {
		let Some((_, ext)) = relative_path.rsplit_once('.') else {
			return false;
		};
		if !DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
			return false;
		}
		let in_templates = relative_path
			.split('/')
			.any(|segment| TEMPLATE_DIRS.iter().any(|t| segment.eq_ignore_ascii_case(t)));
		!in_templates && !self.excludes.iter().any(|re| re.is_match(relative_path))
	}

	fn io_error(&self, path: &Path, source: std::io::Error) -> GraphError {
		GraphError::Io {
			path: path.display().to_string(),
			source,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::index::IndexLink;

	fn write(root: &Path, path: &str, content: &str) {
		let full = root.join(path);
		fs::create_dir_all(full.parent().unwrap()).unwrap();
		fs::write(full, content).unwrap();
	}

	fn fixture() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path();
		write(root, "random/one.md", "---\ntitle: 'One'\n---\n[[random/two]] [[three]] [[nowhere]]\n");
		write(root, "random/two.md", "---\ntitle: Two\n---\n[[one|back]] [[two]]\n");
		write(root, "notes/three.mdx", "no links here\n");
		write(root, "notes/templates/tpl.md", "[[one]]\n");
		write(root, "notes/image.png", "[[one]]\n");
		dir
	}

	#[test]
	fn builds_symmetric_index() {
		let dir = fixture();
		let built = LinkIndexBuilder::new(dir.path()).build().unwrap();

		assert!(built.index.is_symmetric());
		assert_eq!(built.documents.len(), 3);
		assert_eq!(built.unresolved, 1);
		assert_eq!(
			built.index.outgoing("/random/one"),
			&[
				IndexLink::new("/random/one", "/random/two"),
				IndexLink::new("/random/one", "/notes/three"),
			]
		);
		assert_eq!(
			built.index.incoming("/random/one"),
			&[IndexLink::new("/random/two", "/random/one")]
		);
		// self link omitted
		assert!(!built.index.outgoing("/random/two").iter().any(|l| l.target == "/random/two"));
		assert_eq!(built.collections, vec!["notes", "random"]);
	}

	#[test]
	fn templates_and_excludes_are_skipped() {
		let dir = fixture();
		let built = LinkIndexBuilder::new(dir.path())
			.exclude(Regex::new("^notes/").unwrap())
			.build()
			.unwrap();

		assert!(built.documents.iter().all(|d| !d.relative_path.starts_with("notes/")));
		assert!(built.index.incoming("/notes/three").is_empty());
	}

	#[test]
	fn entries_carry_front_matter() {
		let dir = fixture();
		let documents = LinkIndexBuilder::new(dir.path()).scan().unwrap();
		let one = documents.iter().find(|d| d.permalink == "/random/one").unwrap();
		let entry = one.entry().unwrap();

		assert_eq!(entry.id, "one.md");
		assert_eq!(entry.collection, "random");
		assert_eq!(entry.slug, "one");
		assert_eq!(entry.title(), Some("One"));
	}

	#[test]
	fn missing_root_is_an_io_error() {
		let err = LinkIndexBuilder::new("/definitely/not/here").build().unwrap_err();

		assert!(matches!(err, GraphError::Io { .. }));
	}
}
