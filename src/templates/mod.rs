//! HTML template engine using Tera
//!
//! All page templates are embedded in the binary and parsed once at startup;
//! a bad bundle is fatal before the server accepts traffic. Each template
//! kind has its own context shape, so a template can only ever be rendered
//! with the fields it expects.

use serde::Serialize;
use tera::Tera;

use crate::config::NavItem;
use crate::content::ContentItem;
use crate::error::SiteError;

/// Fields every page template receives.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub title: String,
    pub description: String,
    pub nav: Vec<NavItem>,
    pub social: Vec<NavItem>,
    /// Pre-rendered, sanitized HTML; injected with `| safe`, never
    /// re-escaped.
    pub content: String,
}

/// Context for listing pages (notes index, blogs index).
#[derive(Debug, Serialize)]
pub struct ListingContext {
    #[serde(flatten)]
    pub page: PageContext,
    pub items: Vec<ContentItem>,
}

/// Context for the home page with its recent-content panels.
#[derive(Debug, Serialize)]
pub struct HomeContext {
    #[serde(flatten)]
    pub page: PageContext,
    pub recent_blogs: Vec<ContentItem>,
    pub recent_notes: Vec<ContentItem>,
}

/// Templates that take a bare [`PageContext`].
#[derive(Debug, Clone, Copy)]
pub enum PlainTemplate {
    About,
    Note,
    Blog,
    NotFound,
}

impl PlainTemplate {
    fn file_name(self) -> &'static str {
        match self {
            PlainTemplate::About => "about.html",
            PlainTemplate::Note => "note.html",
            PlainTemplate::Blog => "blog.html",
            PlainTemplate::NotFound => "notfound.html",
        }
    }
}

/// Templates that take a [`ListingContext`].
#[derive(Debug, Clone, Copy)]
pub enum ListTemplate {
    Notes,
    Blogs,
}

impl ListTemplate {
    fn file_name(self) -> &'static str {
        match self {
            ListTemplate::Notes => "notes.html",
            ListTemplate::Blogs => "blogs.html",
        }
    }
}

/// Template renderer with the embedded site theme.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Parse the embedded template bundle. Fails only on a broken bundle,
    /// which is a startup-fatal condition.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("home.html", include_str!("site/home.html")),
            ("about.html", include_str!("site/about.html")),
            ("notes.html", include_str!("site/notes.html")),
            ("note.html", include_str!("site/note.html")),
            ("blogs.html", include_str!("site/blogs.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("notfound.html", include_str!("site/notfound.html")),
            ("partials/head.html", include_str!("site/partials/head.html")),
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/footer.html",
                include_str!("site/partials/footer.html"),
            ),
        ])?;
        Ok(Self { tera })
    }

    /// Render a plain page template.
    pub fn render_plain(
        &self,
        template: PlainTemplate,
        ctx: &PageContext,
    ) -> Result<String, SiteError> {
        self.render(template.file_name(), ctx)
    }

    /// Render a listing page template.
    pub fn render_listing(
        &self,
        template: ListTemplate,
        ctx: &ListingContext,
    ) -> Result<String, SiteError> {
        self.render(template.file_name(), ctx)
    }

    /// Render the home page template.
    pub fn render_home(&self, ctx: &HomeContext) -> Result<String, SiteError> {
        self.render("home.html", ctx)
    }

    /// Execute a template into a buffer; nothing reaches the response on
    /// failure.
    fn render(&self, name: &str, data: &impl Serialize) -> Result<String, SiteError> {
        let context = tera::Context::from_serialize(data)?;
        Ok(self.tera.render(name, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn page_ctx(content: &str) -> PageContext {
        PageContext {
            title: "site".to_string(),
            description: "a description".to_string(),
            nav: vec![NavItem {
                name: "Notes".to_string(),
                url: "/notes".to_string(),
            }],
            social: Vec::new(),
            content: content.to_string(),
        }
    }

    fn item(id: &str, title: &str) -> ContentItem {
        ContentItem {
            title: title.to_string(),
            id: id.to_string(),
            updated_at: Local::now(),
        }
    }

    #[test]
    fn test_bundle_parses() {
        assert!(TemplateEngine::new().is_ok());
    }

    #[test]
    fn test_content_is_not_reescaped() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render_plain(PlainTemplate::About, &page_ctx("<h1>raw</h1>"))
            .unwrap();
        assert!(html.contains("<h1>raw</h1>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let mut ctx = page_ctx("body");
        ctx.title = "a <b> title".to_string();
        let html = engine.render_plain(PlainTemplate::Note, &ctx).unwrap();
        assert!(html.contains("a &lt;b&gt; title"));
        assert!(!html.contains("<title>a <b> title"));
    }

    #[test]
    fn test_nav_items_render() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render_plain(PlainTemplate::Blog, &page_ctx("x"))
            .unwrap();
        assert!(html.contains(r#"<a href="/notes">Notes</a>"#));
    }

    #[test]
    fn test_listing_renders_items() {
        let engine = TemplateEngine::new().unwrap();
        let ctx = ListingContext {
            page: page_ctx("index"),
            items: vec![item("first-post", "First Post"), item("second", "Second")],
        };
        let html = engine.render_listing(ListTemplate::Notes, &ctx).unwrap();
        assert!(html.contains(r#"href="/notes/first-post""#));
        assert!(html.contains("First Post"));
        assert!(html.contains("Second"));
    }

    #[test]
    fn test_home_renders_recent_panels() {
        let engine = TemplateEngine::new().unwrap();
        let ctx = HomeContext {
            page: page_ctx("welcome"),
            recent_blogs: vec![item("a-blog", "A Blog")],
            recent_notes: vec![item("a-note", "A Note")],
        };
        let html = engine.render_home(&ctx).unwrap();
        assert!(html.contains(r#"href="/blogs/a-blog""#));
        assert!(html.contains(r#"href="/notes/a-note""#));
        assert!(html.contains("welcome"));
    }
}
