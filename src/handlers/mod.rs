//! Route handlers, one per logical page
//!
//! Every handler is one-shot: resolve the markdown path under the docs
//! root, load and render the page, attach listings where the template needs
//! them, and hand the result to the template engine. Errors map to 404 for
//! a missing file and 500 for everything else, with detail going to the log
//! only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

use crate::config::Config;
use crate::content::{load_page, ContentIndex, ContentKind, MarkdownRenderer, Page};
use crate::error::SiteError;
use crate::templates::{
    HomeContext, ListTemplate, ListingContext, PageContext, PlainTemplate, TemplateEngine,
};

/// How many entries the home page shows per recent-content panel.
const RECENT_LIMIT: usize = 5;

/// Read-only state shared by all handlers, built once at startup.
pub struct AppState {
    pub config: Config,
    pub renderer: MarkdownRenderer,
    pub index: ContentIndex,
    pub templates: TemplateEngine,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, SiteError> {
        let renderer = MarkdownRenderer::new(&config.syntax.light_mode.theme, true);
        let index = ContentIndex::new(&config.docs_path);
        let templates = TemplateEngine::new()?;
        Ok(Self {
            config,
            renderer,
            index,
            templates,
        })
    }

    /// Load the markdown file at `path` with the site title as page title.
    fn load(&self, path: std::path::PathBuf) -> Result<Page, SiteError> {
        load_page(&self.renderer, &self.config.title, &path)
    }

    /// Base template context for a loaded page.
    fn page_context(&self, page: Page) -> PageContext {
        PageContext {
            title: page.title,
            description: self.config.description.clone(),
            nav: self.config.nav.clone(),
            social: self.config.social.clone(),
            content: page.content,
        }
    }
}

/// `GET /` - front page with recent blogs and notes.
pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, SiteError> {
    let page = state.load(state.config.docs_path.join("README.md"))?;
    let recent_blogs = state.index.recent(ContentKind::Blogs, RECENT_LIMIT)?;
    let recent_notes = state.index.recent(ContentKind::Notes, RECENT_LIMIT)?;

    let ctx = HomeContext {
        page: state.page_context(page),
        recent_blogs,
        recent_notes,
    };
    Ok(Html(state.templates.render_home(&ctx)?))
}

/// `GET /about`
pub async fn about(State(state): State<Arc<AppState>>) -> Result<Html<String>, SiteError> {
    let page = state.load(state.config.docs_path.join("about.md"))?;
    let ctx = state.page_context(page);
    Ok(Html(state.templates.render_plain(PlainTemplate::About, &ctx)?))
}

/// `GET /notes` - notes index with the full listing.
pub async fn notes(State(state): State<Arc<AppState>>) -> Result<Html<String>, SiteError> {
    listing(&state, ContentKind::Notes, ListTemplate::Notes)
}

/// `GET /blogs` - blogs index with the full listing.
pub async fn blogs(State(state): State<Arc<AppState>>) -> Result<Html<String>, SiteError> {
    listing(&state, ContentKind::Blogs, ListTemplate::Blogs)
}

fn listing(
    state: &AppState,
    kind: ContentKind,
    template: ListTemplate,
) -> Result<Html<String>, SiteError> {
    let page = state.load(
        state
            .config
            .docs_path
            .join(kind.dir_name())
            .join("README.md"),
    )?;
    let items = state.index.list(kind)?;

    let ctx = ListingContext {
        page: state.page_context(page),
        items,
    };
    Ok(Html(state.templates.render_listing(template, &ctx)?))
}

/// `GET /notes/{id}` - a single note; missing id answers 404.
pub async fn note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, SiteError> {
    single(&state, ContentKind::Notes, PlainTemplate::Note, &id)
}

/// `GET /blogs/{id}` - a single blog post; missing id answers 404.
pub async fn blog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, SiteError> {
    single(&state, ContentKind::Blogs, PlainTemplate::Blog, &id)
}

fn single(
    state: &AppState,
    kind: ContentKind,
    template: PlainTemplate,
    id: &str,
) -> Result<Html<String>, SiteError> {
    let page = state.load(
        state
            .config
            .docs_path
            .join(kind.dir_name())
            .join(id)
            .join("README.md"),
    )?;
    let ctx = state.page_context(page);
    Ok(Html(state.templates.render_plain(template, &ctx)?))
}

/// Render the not-found page with a 404 status. Falls back to plain text if
/// the template itself fails.
pub fn not_found_page(state: &AppState) -> Response {
    let ctx = PageContext {
        title: state.config.title.clone(),
        description: state.config.description.clone(),
        nav: state.config.nav.clone(),
        social: state.config.social.clone(),
        content: String::new(),
    };
    match state.templates.render_plain(PlainTemplate::NotFound, &ctx) {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(err) => {
            tracing::error!(err = %err, "failed to render notfound template");
            (StatusCode::NOT_FOUND, "404 page not found").into_response()
        }
    }
}
