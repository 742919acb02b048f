//! YAML front-matter reader.

use log::debug;
use serde_json::{Map, Value};

/// Splits a document into its front-matter fields and body.
///
/// The block between the leading `---` fences is parsed as YAML; top-level
/// string keys become JSON fields. A document without a leading block, or
/// with an unterminated one, has no fields. Malformed YAML yields no fields
/// but still strips the block from the body.
pub fn split(content: &str) -> (Map<String, Value>, &str) {
	let rest = content.strip_prefix('\u{feff}').unwrap_or(content);
	let Some(after_open) = rest
		.strip_prefix("---\n")
		.or_else(|| rest.strip_prefix("---\r\n"))
	else {
		return (Map::new(), content);
	};

	let mut offset = 0;
	for line in after_open.split_inclusive('\n') {
		let start = offset;
		offset += line.len();
		if line.trim_end() == "---" {
			return (parse(&after_open[..start]), &after_open[offset..]);
		}
	}

	// unterminated block: treat the whole file as body
	(Map::new(), content)
}

fn parse(yaml: &str) -> Map<String, Value> {
	let mapping = match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
		Ok(serde_yaml::Value::Mapping(mapping)) => mapping,
		Ok(_) => return Map::new(),
		Err(err) => {
			debug!("ignoring malformed front matter: {err}");
			return Map::new();
		}
	};
	mapping
		.into_iter()
		.filter_map(|(key, value)| {
			let key = key.as_str()?.to_owned();
			// values json cannot hold, e.g. maps with non-string keys, are dropped
			let value = serde_json::to_value(value).ok()?;
			Some((key, value))
		})
		.collect()
}
