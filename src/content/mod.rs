//! Content pipeline: markdown rendering, page loading, directory indexing

pub mod index;
pub mod markdown;
pub mod page;

pub use index::{ContentIndex, ContentItem, ContentKind};
pub use markdown::MarkdownRenderer;
pub use page::{load_page, Page};
