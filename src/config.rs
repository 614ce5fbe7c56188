//! Configuration logic for the quire engine.
//!
//! This module handles the deserialization of `quire.toml` and provides
//! sane defaults for any missing fields. It is split into `[site]` and
//! `[build]` tables to keep the file organized.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::posts::LoadPolicy;

/// The root configuration schema for a quire project.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    // --- Directory Settings ---

    /// Directory containing the blog post Markdown files.
    /// Defaults to `./content`.
    #[serde(default = "default_content")]
    pub content_dir: PathBuf,

    /// Directory probed for post illustrations (`<slug>.png`, `<slug>-dark.png`).
    /// Defaults to `./public/images`.
    #[serde(default = "default_images")]
    pub images_dir: PathBuf,

    /// Directory for raw assets like images, fonts, and scripts.
    /// Everything in here is copied directly to the output.
    #[serde(default = "default_static")]
    pub static_dir: PathBuf,

    /// Directory holding `index.html` and `post.html` Tera templates.
    /// Missing templates fall back to the embedded defaults.
    #[serde(default = "default_templates")]
    pub templates_dir: PathBuf,

    /// Target directory for the generated static site.
    /// Defaults to `./.build`.
    #[serde(default = "default_output")]
    pub output_dir: PathBuf,

    // --- Core Metadata ---

    /// The base domain for absolute link generation (e.g., "https://example.com").
    /// Essential for RSS feeds, the sitemap and share links.
    #[serde(default = "default_url")]
    pub base_url: String,

    /// Public URL prefix under which `images_dir` is served.
    #[serde(default = "default_image_prefix")]
    pub image_prefix: String,

    #[serde(default)]
    pub site: SiteMetadata,

    #[serde(default)]
    pub build: BuildSettings,
}

/// Metadata describing the website for SEO and RSS purposes.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteMetadata {
    /// The name of the website, used in `<title>` tags and RSS headers.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// Contact address used in the RSS `<author>` element.
    #[serde(default)]
    pub email: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Social preview image used for posts without their own illustration.
    pub default_image: Option<String>,

    #[serde(default = "default_bool_true")]
    pub generate_rss: bool,

    #[serde(default = "default_bool_true")]
    pub generate_sitemap: bool,

    /// Whether to generate a `search.json` index for client-side search.
    #[serde(default = "default_bool_true")]
    pub generate_search: bool,

    // --- Listing ---

    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,

    /// How many related posts are shown under each post.
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

/// Flags and options that tune the build process.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildSettings {
    /// If true, the output directory is wiped before every build.
    #[serde(default = "default_bool_true")]
    pub clean_output: bool,

    #[serde(default = "default_bool_false")]
    pub minify_html: bool,

    /// Toggle for syntax highlighting in code blocks via Syntect.
    #[serde(default = "default_bool_true")]
    pub use_syntect: bool,

    /// Name of the syntax highlighting theme (e.g., "base16-ocean.dark").
    #[serde(default = "default_theme")]
    pub syntax_theme: String,

    /// Fail the build on the first invalid post instead of skipping it.
    #[serde(default = "default_bool_false")]
    pub strict: bool,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!("{} not found. Run 'quire init' to begin.", path.display())
        })?;
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.build.strict { LoadPolicy::Strict } else { LoadPolicy::Skip }
    }

    /// Absolute URL of a post page.
    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), slug)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content(),
            images_dir: default_images(),
            static_dir: default_static(),
            templates_dir: default_templates(),
            output_dir: default_output(),
            base_url: default_url(),
            image_prefix: default_image_prefix(),
            site: SiteMetadata::default(),
            build: BuildSettings::default(),
        }
    }
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            author: String::new(),
            email: String::new(),
            language: default_language(),
            default_image: None,
            generate_rss: true,
            generate_sitemap: true,
            generate_search: true,
            posts_per_page: default_posts_per_page(),
            related_limit: default_related_limit(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            clean_output: true,
            minify_html: false,
            use_syntect: true,
            syntax_theme: default_theme(),
            strict: false,
        }
    }
}

// --- Default value providers ---

fn default_content() -> PathBuf { PathBuf::from("./content") }
fn default_images() -> PathBuf { PathBuf::from("./public/images") }
fn default_static() -> PathBuf { PathBuf::from("./public") }
fn default_templates() -> PathBuf { PathBuf::from("./templates") }
fn default_output() -> PathBuf { PathBuf::from("./.build") }
fn default_url() -> String { "https://example.com".to_string() }
fn default_image_prefix() -> String { "/images".to_string() }
fn default_title() -> String { "a quire blog".to_string() }
fn default_language() -> String { "en-us".to_string() }
fn default_theme() -> String { "base16-ocean.dark".to_string() }
fn default_bool_true() -> bool { true }
fn default_bool_false() -> bool { false }
fn default_posts_per_page() -> usize { 4 }
fn default_related_limit() -> usize { 3 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::default();
        assert_eq!(config.content_dir, PathBuf::from("./content"));
        assert_eq!(config.site.posts_per_page, 4);
        assert_eq!(config.site.related_limit, 3);
        assert!(config.site.generate_rss);
        assert!(!config.build.strict);
        assert_eq!(config.load_policy(), LoadPolicy::Skip);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            base_url = "https://blog.example.org/"

            [site]
            title = "Notes"
            posts_per_page = 10

            [build]
            strict = true
            "#,
        )
        .unwrap();

        assert_eq!(config.site.title, "Notes");
        assert_eq!(config.site.posts_per_page, 10);
        assert_eq!(config.site.language, "en-us");
        assert!(config.build.use_syntect);
        assert_eq!(config.load_policy(), LoadPolicy::Strict);
        assert_eq!(config.post_url("hello"), "https://blog.example.org/hello");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("quire.toml")).unwrap_err();
        assert!(err.to_string().contains("quire init"));
        assert!(Config::load_or_default(&dir.path().join("quire.toml")).is_ok());
    }
}
