//! Wiki-link extraction and permalink resolution.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// File extensions treated as documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkdn", "mkd", "mdwn", "mdx"];

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"!?\[\[([^\[\]\n]+?)\]\]").expect("wiki-link pattern is valid")
});

static INLINE_CODE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"`[^`\n]*`").expect("inline code pattern is valid"));

/// Returns the raw targets of every wiki-link in `content`, in order.
///
/// Aliases (`[[a|b]]`) and headings (`[[a#h]]`) are stripped; links inside
/// fenced code blocks and inline code spans are ignored.
pub fn extract_targets(content: &str) -> Vec<String> {
	let mut targets = Vec::new();
	let mut fence: Option<&str> = None;

	for line in content.lines() {
		let trimmed = line.trim_start();
		let marker = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m));
		match (fence, marker) {
			(None, Some(m)) => {
				fence = Some(m);
				continue;
			}
			(Some(open), Some(m)) if open == m => {
				fence = None;
				continue;
			}
			(Some(_), _) => continue,
			(None, None) => {}
		}

		let without_code = INLINE_CODE.replace_all(line, "");
		for capture in WIKI_LINK.captures_iter(&without_code) {
			let inner = &capture[1];
			let target = inner.split('|').next().unwrap_or_default();
			let target = target.split('#').next().unwrap_or_default().trim();
			if !target.is_empty() {
				targets.push(target.to_owned());
			}
		}
	}
	targets
}

/// Strips a document extension, if any.
pub fn strip_document_extension(path: &str) -> &str {
	match path.rsplit_once('.') {
		Some((stem, ext))
			if !stem.is_empty()
				&& DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) =>
		{
			stem
		}
		_ => path,
	}
}

/// Resolves wiki-link targets against the set of known permalinks.
#[derive(Clone, Debug, Default)]
pub struct PermalinkResolver {
	permalinks: BTreeSet<String>,
}

impl PermalinkResolver {
	/// Builds a resolver over canonical permalinks (`/dir/name`).
	pub fn new<I, S>(permalinks: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			permalinks: permalinks.into_iter().map(Into::into).collect(),
		}
	}

	/// Whether `permalink` names a known document.
	pub fn contains(&self, permalink: &str) -> bool {
		self.permalinks.contains(permalink)
	}

	/// Maps a raw target to the permalink it points at.
	///
	/// An exact path wins; otherwise the shortest permalink ending in
	/// `/target` is chosen (ties broken lexicographically). Unknown targets
	/// resolve to `None`.
	pub fn resolve(&self, target: &str) -> Option<String> {
		let cleaned = target.replace('\\', "/");
		let cleaned = strip_document_extension(cleaned.trim()).trim_matches('/');
		if cleaned.is_empty() {
			return None;
		}

		let exact = format!("/{cleaned}");
		if self.permalinks.contains(&exact) {
			return Some(exact);
		}

		self.permalinks
			.iter()
			.filter(|p| p.ends_with(&exact))
			.min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
			.cloned()
	}
}
