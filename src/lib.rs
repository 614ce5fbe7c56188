//! quire: a static blog generator.
//!
//! The library holds the content model ([`posts`], [`toc`]) and the site
//! pipeline built on it ([`build`]); the `quire` binary is a thin CLI.

pub mod build;
pub mod config;
pub mod content;
pub mod feed;
pub mod frontmatter;
pub mod lint;
pub mod logger;
pub mod models;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod share;
pub mod sitemap;
pub mod toc;

use rust_embed::RustEmbed;

/// Starter site: config, templates and a first post.
#[derive(RustEmbed)]
#[folder = "assets/default_site/"]
pub struct Asset;
