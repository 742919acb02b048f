//! Build-time tool that scans a content tree and writes the JSON payloads
//! the graph loads: the link index, the collection list and one metadata
//! record per document.

#[cfg(not(target_arch = "wasm32"))]
mod native {
	use std::fs;
	use std::path::{Path, PathBuf};

	use anyhow::{Context, Result};
	use backlink_graph::index::builder::LinkIndexBuilder;
	use clap::Parser;
	use log::{info, warn};
	use regex::Regex;
	use serde::Serialize;

	#[derive(Parser)]
	#[command(name = "link-index")]
	#[command(about = "Build the backlink index for a directory of wiki-linked documents")]
	struct Args {
		/// Content root; each top-level directory is a collection
		#[arg(short, long, default_value = "content")]
		root: PathBuf,

		/// Output directory for the JSON endpoints
		#[arg(short, long, default_value = "public/api")]
		out: PathBuf,

		/// Regex of relative paths to leave out (repeatable)
		#[arg(short, long)]
		exclude: Vec<String>,
	}

	fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
		}
		let json = serde_json::to_string(value)?;
		fs::write(path, json).with_context(|| format!("writing {}", path.display()))
	}

	pub fn main() -> Result<()> {
		env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
		let args = Args::parse();

		let mut builder = LinkIndexBuilder::new(&args.root);
		for pattern in &args.exclude {
			let re = Regex::new(pattern).with_context(|| format!("invalid --exclude pattern {pattern:?}"))?;
			builder = builder.exclude(re);
		}
		let built = builder
			.build()
			.with_context(|| format!("indexing {}", args.root.display()))?;

		let index = built.full_index();
		write_json(&args.out.join("links.json"), &index)?;
		write_json(&args.out.join("collections.json"), &built.collections)?;

		let mut written = 0;
		for document in &built.documents {
			let Some(entry) = document.entry() else {
				warn!("{} is outside any collection, no entry written", document.relative_path);
				continue;
			};
			let path = args
				.out
				.join("entries")
				.join(&entry.collection)
				.join(format!("{}.json", entry.slug));
			write_json(&path, &entry)?;
			written += 1;
		}

		info!(
			"wrote index of {} links and {written} entries to {}",
			index.links.len(),
			args.out.display()
		);
		if built.unresolved > 0 {
			warn!("{} wiki-links did not resolve", built.unresolved);
		}
		Ok(())
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
	native::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
