//! The build pipeline for `quire`.
//!
//! Loads the post index once, then renders post pages in parallel with
//! `rayon`, followed by the paginated listing, the feed, the sitemap and
//! the search index.

use crate::{
    Asset,
    config::Config,
    content::{FsContent, FsImages},
    debug, feed, logger,
    models::Post,
    pagination,
    posts::PostIndex,
    render::{self, Highlighter},
    share, sitemap, toc,
};
use anyhow::{Context, Result};
use chrono::Utc;
use minify_html::{Cfg, minify};
use rayon::prelude::*;
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};
use tera::Tera;

const TEMPLATES: [&str; 3] = ["macros.html", "index.html", "post.html"];
const STEPS: usize = 5;
const SNIPPET_CHARS: usize = 140;

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub posts: usize,
    pub skipped: usize,
    pub pages: usize,
}

/// Loads templates from the project, falling back to the embedded defaults
/// one file at a time, so a project can override just `post.html`.
fn load_templates(dir: &Path) -> Result<Tera> {
    let mut sources = Vec::with_capacity(TEMPLATES.len());
    for name in TEMPLATES {
        let path = dir.join(name);
        let source = if path.is_file() {
            debug!("template"; "{}", path.display());
            fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
        } else {
            let file = Asset::get(&format!("templates/{}", name))
                .with_context(|| format!("no embedded template {}", name))?;
            String::from_utf8(file.data.into_owned())?
        };
        sources.push((name, source));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources).context("failed to compile templates")?;
    Ok(tera)
}

/// Minifies HTML when enabled; falls back to the input on invalid UTF-8.
fn process_html(html: String, should_minify: bool) -> String {
    if !should_minify {
        return html;
    }

    let mut cfg = Cfg::new();
    cfg.minify_js = true;
    cfg.minify_css = true;
    cfg.keep_comments = false;

    let minified = minify(html.as_bytes(), &cfg);
    String::from_utf8(minified).unwrap_or(html)
}

/// Standard recursive directory copy.
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in walkdir::WalkDir::new(&src).min_depth(1) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(&src).map_err(io::Error::other)?;
        let target = dst.as_ref().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[derive(Serialize)]
pub struct SearchEntry<'a> {
    title: &'a str,
    slug: &'a str,
    date: &'a str,
    tags: &'a [String],
    excerpt: &'a str,
    snippet: String,
}

pub fn search_index(posts: &[Post]) -> Vec<SearchEntry<'_>> {
    posts
        .iter()
        .map(|p| SearchEntry {
            title: &p.title,
            slug: &p.slug,
            date: &p.date,
            tags: &p.tags,
            excerpt: &p.excerpt,
            snippet: render::strip_markdown(&p.body).chars().take(SNIPPET_CHARS).collect(),
        })
        .collect()
}

fn render_post(
    tera: &Tera,
    index: &PostIndex,
    post: &Post,
    highlighter: Option<&Highlighter>,
    config: &Config,
) -> Result<String> {
    let outline = toc::parse_headings(&post.body);
    let url = config.post_url(&post.slug);

    let mut ctx = tera::Context::new();
    ctx.insert("config", config);
    ctx.insert("post", post);
    ctx.insert("post_url", &url);
    ctx.insert("content", &render::render_markdown(&post.body, highlighter));
    ctx.insert("toc", &outline);
    ctx.insert("toc_ids", &toc::flatten_ids(&outline));
    ctx.insert("related", &index.get_related(&post.slug, &post.tags, config.site.related_limit));
    ctx.insert("adjacent", &index.get_adjacent(&post.slug));
    ctx.insert("share", &share::share_links(&url, &post.title));
    ctx.insert(
        "social_image",
        &post.image.as_deref().or(config.site.default_image.as_deref()),
    );

    let rendered = tera
        .render("post.html", &ctx)
        .with_context(|| format!("failed to render post '{}'", post.slug))?;
    Ok(process_html(rendered, config.build.minify_html))
}

fn render_listing(tera: &Tera, index: &PostIndex, config: &Config) -> Result<usize> {
    let mut page_no = 1;
    while let Some(page) = index.paginate(page_no, config.site.posts_per_page) {
        let mut ctx = tera::Context::new();
        ctx.insert("config", config);
        ctx.insert("posts", page.posts);
        ctx.insert("current_page", &page.current);
        ctx.insert("total_pages", &page.total_pages);
        ctx.insert("page_numbers", &pagination::page_numbers(page.current, page.total_pages));
        ctx.insert(
            "prev_url",
            &(page.current > 1).then(|| pagination::page_path(page.current - 1)),
        );
        ctx.insert(
            "next_url",
            &(page.current < page.total_pages).then(|| pagination::page_path(page.current + 1)),
        );

        let rendered = tera
            .render("index.html", &ctx)
            .with_context(|| format!("failed to render listing page {}", page_no))?;

        let dest = if page_no == 1 {
            config.output_dir.join("index.html")
        } else {
            config.output_dir.join("page").join(page_no.to_string()).join("index.html")
        };
        write_file(&dest, process_html(rendered, config.build.minify_html))?;
        page_no += 1;
    }
    Ok(page_no - 1)
}

/// The orchestrator of the `quire` build.
pub fn perform_build(config: &Config) -> Result<BuildSummary> {
    let start = Instant::now();
    let tera = load_templates(&config.templates_dir)?;

    // --- STEP 1: OUTPUT & STATIC ASSETS ---
    logger::step(1, STEPS, "Preparing output directory...");
    if config.build.clean_output && config.output_dir.exists() {
        fs::remove_dir_all(&config.output_dir)
            .with_context(|| format!("failed to clean {}", config.output_dir.display()))?;
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    if config.static_dir.exists() {
        copy_dir_all(&config.static_dir, &config.output_dir)
            .with_context(|| format!("failed to copy {}", config.static_dir.display()))?;
    }
    let images = FsImages::new(&config.images_dir);
    if images.dir().exists() && !images.dir().starts_with(&config.static_dir) {
        let dest: PathBuf = config.output_dir.join(config.image_prefix.trim_start_matches('/'));
        copy_dir_all(images.dir(), dest)
            .with_context(|| format!("failed to copy {}", images.dir().display()))?;
    }

    // --- STEP 2: CONTENT ---
    logger::step(2, STEPS, "Loading posts...");
    let source = FsContent::new(&config.content_dir);
    let index = PostIndex::load(&source, &images, &config.image_prefix, config.load_policy())?;
    for invalid in index.skipped() {
        logger::warn(&format!("skipped {}", invalid));
    }
    if index.is_empty() {
        logger::warn(&format!("no posts found in {}", config.content_dir.display()));
    }

    // --- STEP 3: POSTS ---
    logger::step(3, STEPS, "Rendering posts...");
    let highlighter = if config.build.use_syntect {
        Some(Highlighter::new(&config.build.syntax_theme)?)
    } else {
        None
    };
    index.all().par_iter().try_for_each(|post| -> Result<()> {
        let html = render_post(&tera, &index, post, highlighter.as_ref(), config)?;
        let dest = config.output_dir.join(&post.slug).join("index.html");
        write_file(&dest, html)?;
        debug!("post"; "{}", post.slug);
        Ok(())
    })?;

    // --- STEP 4: LISTING ---
    logger::step(4, STEPS, "Rendering listing pages...");
    let pages = render_listing(&tera, &index, config)?;

    // --- STEP 5: FEEDS & INDICES ---
    logger::step(5, STEPS, "Writing feed, sitemap and search index...");
    if config.site.generate_rss {
        write_file(&config.output_dir.join("rss.xml"), feed::generate_rss(index.all(), config))?;
    }
    if config.site.generate_sitemap {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let xml = sitemap::generate_sitemap(index.all(), config, &today);
        write_file(&config.output_dir.join("sitemap.xml"), xml)?;
    }
    if config.site.generate_search {
        let entries = search_index(index.all());
        write_file(&config.output_dir.join("search.json"), serde_json::to_string(&entries)?)?;
    }

    logger::success(&format!(
        "built {} posts and {} listing pages in {:.2}s.",
        index.len(),
        pages,
        start.elapsed().as_secs_f32()
    ));

    Ok(BuildSummary { posts: index.len(), skipped: index.skipped().len(), pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_post(dir: &Path, slug: &str, date: &str, tags: &str, body: &str) {
        let raw = format!(
            "---\ntitle: Post {slug}\nauthor: Tester\ndate: {date}\nexcerpt: About {slug}\ntags: [{tags}]\n---\n{body}\n"
        );
        fs::write(dir.join(format!("{}.md", slug)), raw).unwrap();
    }

    fn project() -> (tempfile::TempDir, Config) {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.content_dir = root.path().join("content");
        config.static_dir = root.path().join("public");
        config.images_dir = root.path().join("public/images");
        config.templates_dir = root.path().join("templates");
        config.output_dir = root.path().join("out");
        config.site.posts_per_page = 2;
        config.build.use_syntect = false;

        fs::create_dir_all(&config.content_dir).unwrap();
        fs::create_dir_all(&config.images_dir).unwrap();
        fs::write(config.images_dir.join("first.png"), [0u8]).unwrap();
        (root, config)
    }

    #[test]
    fn builds_a_site() {
        let (_root, config) = project();
        let content = &config.content_dir;
        write_post(content, "first", "2024-01-01", "rust", "## Intro\n\n### Details\n\ntext");
        write_post(content, "second", "2024-02-01", "rust, web", "## Only\n\n```\n## fenced\n```");
        write_post(content, "third", "2024-03-01", "web", "body");
        fs::write(content.join("broken.md"), "---\ntitle: nope\n---\nbody").unwrap();

        let summary = perform_build(&config).unwrap();
        assert_eq!(summary.posts, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.pages, 2);

        let out = &config.output_dir;
        let first = fs::read_to_string(out.join("first/index.html")).unwrap();
        assert!(first.contains(r#"id="intro""#));
        assert!(first.contains(r##"href="#details""##));
        assert!(first.contains(r#"data-toc-ids="intro details""#));
        assert!(first.contains("/images/first.png"));
        assert!(first.contains("/second/"));

        let second = fs::read_to_string(out.join("second/index.html")).unwrap();
        assert!(!second.contains(r##"href="#fenced""##));

        assert!(out.join("index.html").is_file());
        assert!(out.join("page/2/index.html").is_file());
        assert!(!out.join("page/3/index.html").exists());
        assert!(out.join("images/first.png").is_file());
        assert!(!out.join("broken/index.html").exists());

        let rss = fs::read_to_string(out.join("rss.xml")).unwrap();
        assert!(rss.contains("https://example.com/third"));
        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/first</loc>"));

        let search: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("search.json")).unwrap()).unwrap();
        let slugs: Vec<&str> = search.as_array().unwrap().iter().map(|e| e["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["third", "second", "first"]);
    }

    #[test]
    fn strict_build_fails_on_invalid_posts() {
        let (_root, mut config) = project();
        config.build.strict = true;
        write_post(&config.content_dir, "ok", "2024-01-01", "x", "body");
        fs::write(config.content_dir.join("bad.md"), "no front matter").unwrap();

        let err = perform_build(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("bad"));
    }

    #[test]
    fn project_templates_override_defaults() {
        let (_root, config) = project();
        fs::create_dir_all(&config.templates_dir).unwrap();
        fs::write(config.templates_dir.join("post.html"), "custom {{ post.title }}").unwrap();
        write_post(&config.content_dir, "only", "2024-01-01", "x", "body");

        perform_build(&config).unwrap();
        let html = fs::read_to_string(config.output_dir.join("only/index.html")).unwrap();
        assert_eq!(html, "custom Post only");
    }

    #[test]
    fn search_snippets_are_plain_text() {
        let post = Post {
            slug: "s".to_string(),
            title: "T".to_string(),
            author: "A".to_string(),
            excerpt: "E".to_string(),
            date: "2024-01-01".to_string(),
            tags: vec![],
            body: format!("## Heading\n\n{}", "word ".repeat(100)),
            image: None,
            image_dark: None,
            reading_time: 1,
        };
        let entries = search_index(std::slice::from_ref(&post));
        assert_eq!(entries[0].snippet.chars().count(), SNIPPET_CHARS);
        assert!(entries[0].snippet.starts_with("Heading"));
    }
}
