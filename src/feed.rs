use crate::{config::Config, models::Post};
use chrono::{NaiveDate, NaiveTime, Utc};
use rss::extension::atom::{AtomExtensionBuilder, Link};
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::collections::BTreeMap;

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

fn format_rss_date(date_str: &str) -> String {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().to_rfc2822())
        .unwrap_or_else(|_| Utc::now().to_rfc2822())
}

fn item_author(post: &Post, config: &Config) -> String {
    if config.site.email.is_empty() {
        post.author.clone()
    } else {
        format!("{} ({})", config.site.email, post.author)
    }
}

/// RSS 2.0 feed of every post, newest first, with full bodies.
pub fn generate_rss(posts: &[Post], config: &Config) -> String {
    let items: Vec<_> = posts
        .iter()
        .map(|p| {
            let link = config.post_url(&p.slug);
            let categories = p.tags.iter().map(|t| CategoryBuilder::default().name(t.clone()).build()).collect::<Vec<_>>();
            ItemBuilder::default()
                .title(Some(p.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
                .description(Some(p.excerpt.clone()))
                .content(Some(p.body.clone()))
                .author(Some(item_author(p, config)))
                .categories(categories)
                .pub_date(Some(format_rss_date(&p.date)))
                .build()
        })
        .collect();

    let last_build = posts
        .first()
        .map(|p| format_rss_date(&p.date))
        .unwrap_or_else(|| Utc::now().to_rfc2822());

    let namespaces = BTreeMap::from([("content".to_string(), CONTENT_NS.to_string())]);

    // The atom namespace is declared by the extension itself.
    let self_link = Link {
        href: format!("{}/rss.xml", config.base_url.trim_end_matches('/')),
        rel: "self".to_string(),
        mime_type: Some("application/rss+xml".to_string()),
        ..Default::default()
    };

    ChannelBuilder::default()
        .title(config.site.title.clone())
        .link(config.base_url.clone())
        .description(config.site.description.clone())
        .language(Some(config.site.language.clone()))
        .last_build_date(Some(last_build))
        .namespaces(namespaces)
        .atom_ext(Some(AtomExtensionBuilder::default().link(self_link).build()))
        .items(items)
        .build()
        .to_string()
}
