//! Sitemap generation.
//!
//! The home page comes first, followed by one entry per post:
//!
//! ```xml
//! <url>
//!   <loc>https://example.com/hello-world</loc>
//!   <lastmod>2025-01-01</lastmod>
//!   <changefreq>monthly</changefreq>
//!   <priority>0.8</priority>
//! </url>
//! ```

use crate::{config::Config, models::Post};
use std::borrow::Cow;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

struct UrlEntry {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

pub fn generate_sitemap(posts: &[Post], config: &Config, today: &str) -> String {
    let home = UrlEntry {
        loc: config.base_url.clone(),
        lastmod: today.to_string(),
        changefreq: "weekly",
        priority: "1.0",
    };
    let entries = std::iter::once(home).chain(posts.iter().map(|p| UrlEntry {
        loc: config.post_url(&p.slug),
        lastmod: p.date.clone(),
        changefreq: "monthly",
        priority: "0.8",
    }));

    let mut xml = String::with_capacity(256 + posts.len() * 160);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for entry in entries {
        xml.push_str("  <url>\n    <loc>");
        xml.push_str(&escape_xml(&entry.loc));
        xml.push_str("</loc>\n    <lastmod>");
        xml.push_str(&escape_xml(&entry.lastmod));
        xml.push_str("</lastmod>\n    <changefreq>");
        xml.push_str(entry.changefreq);
        xml.push_str("</changefreq>\n    <priority>");
        xml.push_str(entry.priority);
        xml.push_str("</priority>\n  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}
