//! Page loading

use std::fs;
use std::path::Path;

use crate::content::MarkdownRenderer;
use crate::error::SiteError;

/// A single rendered page. Built per request, never cached.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    /// Rendered, sanitized HTML.
    pub content: String,
}

/// Read the markdown file at `path` and render it into a [`Page`].
///
/// A missing file maps to [`SiteError::NotFound`] so callers can answer 404;
/// every other failure is a server-side error.
pub fn load_page(
    renderer: &MarkdownRenderer,
    title: &str,
    path: &Path,
) -> Result<Page, SiteError> {
    let markdown =
        fs::read_to_string(path).map_err(|e| SiteError::from_io(path.to_path_buf(), e))?;
    let content = renderer.render(&markdown)?;
    Ok(Page {
        title: title.to_string(),
        content,
    })
}
