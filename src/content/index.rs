//! Content indexer - discovers posts under the docs directory tree
//!
//! The filesystem is the source of truth: each post lives at
//! `<docs>/<kind>/<id>/README.md`, so identity and ordering come straight
//! from the directory layout. Listings are recomputed on every request.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::SiteError;

/// A category of posts with its own index page and subdirectory convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Notes,
    Blogs,
}

impl ContentKind {
    /// Subdirectory of the docs root holding this kind of content.
    pub fn dir_name(self) -> &'static str {
        match self {
            ContentKind::Notes => "notes",
            ContentKind::Blogs => "blogs",
        }
    }
}

/// One discovered post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub title: String,
    pub id: String,
    pub updated_at: DateTime<Local>,
}

/// Walks content-kind subdirectories and produces sorted listings.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    docs_root: PathBuf,
}

impl ContentIndex {
    pub fn new(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
        }
    }

    /// All posts of the given kind, ascending by id.
    pub fn list(&self, kind: ContentKind) -> Result<Vec<ContentItem>, SiteError> {
        let mut items = self.scan(kind)?;
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    /// The most recently modified posts of the given kind, newest first,
    /// truncated to `limit`. Posts with equal mtimes keep their id order,
    /// so the result is deterministic for an unchanged tree.
    pub fn recent(&self, kind: ContentKind, limit: usize) -> Result<Vec<ContentItem>, SiteError> {
        let mut items = self.list(kind)?;
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items.truncate(limit);
        Ok(items)
    }

    /// Walk `<docs>/<kind>` and collect every `.md` file except the kind's
    /// own root `README.md` index. Walk errors propagate; there is no
    /// best-effort partial listing.
    fn scan(&self, kind: ContentKind) -> Result<Vec<ContentItem>, SiteError> {
        let base = self.docs_root.join(kind.dir_name());
        let root_readme = base.join("README.md");

        let mut items = Vec::new();
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if path == root_readme || !entry.file_type().is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            let raw = fs::read_to_string(path)
                .map_err(|e| SiteError::from_io(path.to_path_buf(), e))?;
            let modified = entry
                .metadata()?
                .modified()
                .map_err(|e| SiteError::from_io(path.to_path_buf(), e))?;

            items.push(ContentItem {
                title: md_title(&raw),
                id: id_from_path(path),
                updated_at: modified.into(),
            });
        }

        Ok(items)
    }
}

/// Title of a markdown document: its first line with leading `#` markers and
/// whitespace stripped, or "Untitled" for an empty document.
pub fn md_title(content: &str) -> String {
    match content.lines().next() {
        Some(line) => line.trim().trim_start_matches(['#', ' ']).to_string(),
        None => "Untitled".to_string(),
    }
}

/// Post id for a markdown file: the name of its parent directory.
fn id_from_path(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
