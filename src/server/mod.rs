//! Router assembly and server bootstrap

pub mod middleware;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::handlers::{self, AppState};

/// How long in-flight requests get to finish after a termination signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Build the full application router with the middleware chain applied.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/about", get(handlers::about))
        .route("/notes", get(handlers::notes))
        .route("/notes/:id", get(handlers::note))
        .route("/blogs", get(handlers::blogs))
        .route("/blogs/:id", get(handlers::blog))
        .fallback(static_files)
        .with_state(state)
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::log_request))
}

/// Fallback: serve public assets from disk, or the not-found page.
async fn static_files(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let mut service = ServeDir::new(&state.config.public_path);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => handlers::not_found_page(&state),
        Err(err) => {
            tracing::error!(err = %err, "failed to serve static file");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error: something went wrong",
            )
                .into_response()
        }
    }
}

/// Load state, bind the listener, and serve until a termination signal.
///
/// Shutdown is graceful: the listener stops accepting, in-flight requests
/// get [`SHUTDOWN_GRACE`] to finish, then the server task is aborted.
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let app = router(state.clone());

    let addr = state.config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, url = %state.config.url, "server is starting");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("server task failed")??;
            return Ok(());
        }
        result = shutdown_signal() => result?,
    }

    tracing::info!("shutting down server");
    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(result) => result.context("server task failed")??,
        Err(_) => {
            server.abort();
            tracing::warn!("grace period expired, forcing shutdown");
        }
    }
    tracing::info!("server gracefully stopped");
    Ok(())
}

/// Resolve on SIGINT, SIGTERM, SIGHUP, or SIGQUIT.
#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = hangup.recv() => {}
        _ = quit.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use axum::http::Request;
    use std::fs;
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write_post(docs: &Path, kind: &str, id: &str, body: &str, mtime: SystemTime) {
        let dir = docs.join(kind).join(id);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("README.md");
        fs::write(&path, body).unwrap();
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn stamp(offset_secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + offset_secs)
    }

    /// Docs tree with a home page, about page, two notes, and six blogs
    /// (more than one recent-panel's worth).
    fn fixture() -> (TempDir, Router) {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("README.md"), "# Welcome Home\n\nfront page").unwrap();
        fs::write(docs.join("about.md"), "# About\n\nabout me").unwrap();

        fs::create_dir_all(docs.join("notes")).unwrap();
        fs::write(docs.join("notes/README.md"), "# Notes").unwrap();
        write_post(&docs, "notes", "first-note", "# First Note\n\nnote body", stamp(1));
        write_post(&docs, "notes", "second-note", "# Second Note", stamp(2));

        fs::create_dir_all(docs.join("blogs")).unwrap();
        fs::write(docs.join("blogs/README.md"), "# Blogs").unwrap();
        for i in 1..=6u64 {
            write_post(
                &docs,
                "blogs",
                &format!("blog-{i}"),
                &format!("# Blog {i}"),
                stamp(10 + i),
            );
        }

        let config = Config {
            docs_path: docs,
            public_path: tmp.path().join("public"),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        (tmp, router(state))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_home_shows_five_most_recent() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome Home"));
        // Six blogs exist; only the five newest appear.
        for i in 2..=6 {
            assert!(body.contains(&format!("/blogs/blog-{i}")), "blog-{i} missing");
        }
        assert!(!body.contains("/blogs/blog-1\""));
        // Both notes fit within the limit.
        assert!(body.contains("/notes/first-note"));
        assert!(body.contains("/notes/second-note"));
    }

    #[tokio::test]
    async fn test_about_page() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("about me"));
    }

    #[tokio::test]
    async fn test_notes_listing_is_complete() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/notes").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/notes/first-note"));
        assert!(body.contains("/notes/second-note"));
    }

    #[tokio::test]
    async fn test_single_note() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/notes/first-note").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("note body"));
        assert!(body.contains(r#"class="note""#));
    }

    #[tokio::test]
    async fn test_single_blog_uses_blog_template() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/blogs/blog-3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Blog 3"));
        assert!(body.contains(r#"class="blog""#));
    }

    #[tokio::test]
    async fn test_missing_note_is_404() {
        let (_tmp, app) = fixture();
        let (status, _, _) = get(app, "/notes/no-such-note").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_path_renders_notfound_page() {
        let (_tmp, app) = fixture();
        let (status, _, body) = get(app, "/no/such/path").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("does not exist"));
    }

    #[tokio::test]
    async fn test_security_headers_on_every_response() {
        let (_tmp, app) = fixture();
        for uri in ["/", "/notes/no-such-note", "/no/such/path"] {
            let (_, headers, _) = get(app.clone(), uri).await;
            assert_eq!(headers[header::X_FRAME_OPTIONS], "deny", "uri {uri}");
            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
            assert_eq!(headers[header::CACHE_CONTROL], "no-store, max-age=0");
            assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
            assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
            assert_eq!(headers[header::SERVER], "");
        }
    }

    #[tokio::test]
    async fn test_post_is_method_not_allowed() {
        let (_tmp, app) = fixture();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_static_file_from_public_dir() {
        let (tmp, _) = fixture();
        let public = tmp.path().join("public/styles");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("main.css"), "body { margin: 0; }").unwrap();

        let config = Config {
            docs_path: tmp.path().join("docs"),
            public_path: tmp.path().join("public"),
            ..Config::default()
        };
        let app = router(Arc::new(AppState::new(config).unwrap()));
        let (status, _, body) = get(app, "/styles/main.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("margin"));
    }
}
