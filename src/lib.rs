//! mdsite: a personal static-content web server
//!
//! Serves a tree of markdown documents (home page, about page, notes,
//! blogs) as HTML. Pages are rendered per request from the docs directory,
//! which is the source of truth for content identity and ordering; the
//! template bundle and configuration are loaded once at startup and shared
//! read-only across requests.

pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod server;
pub mod templates;
