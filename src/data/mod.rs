//! Loading the graph for the current document.

mod assembler;
mod http;
mod ids;
mod source;

pub use assembler::assemble;
pub use http::{Endpoints, HttpSource};
pub use ids::{CollectionMap, navigation_path, normalize_id};
pub use source::{CancelToken, DocumentEntry, DocumentSource};
