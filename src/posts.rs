//! The post index: every post, newest first, plus the lookups pages need.

use rayon::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

use crate::{
    content::{ContentSource, ImageProbe, probe_images},
    frontmatter::{self, FrontMatterError},
    models::{Adjacent, Page, Post},
};

const WORDS_PER_MINUTE: usize = 200;

/// What to do with an entry whose front matter does not validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Leave it out and keep a diagnostic.
    Skip,
    /// Fail the whole load.
    Strict,
}

#[derive(Debug, Error, PartialEq)]
#[error("{id}: {source}")]
pub struct InvalidPost {
    pub id: String,
    #[source]
    pub source: FrontMatterError,
}

pub fn reading_time(body: &str) -> usize {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

impl Post {
    /// Builds a post from a raw document. `slug` is the entry id.
    pub fn from_entry(
        slug: &str,
        raw: &str,
        images: &dyn ImageProbe,
        image_prefix: &str,
    ) -> Result<Post, FrontMatterError> {
        let (meta, body) = frontmatter::parse(raw)?;
        let (image, image_dark) = probe_images(images, image_prefix, slug);

        Ok(Post {
            slug: slug.to_string(),
            title: meta.title,
            author: meta.author,
            excerpt: meta.excerpt,
            date: meta.date,
            tags: meta.tags,
            reading_time: reading_time(body),
            body: body.to_string(),
            image,
            image_dark,
        })
    }
}

#[derive(Debug, Default)]
pub struct PostIndex {
    posts: Vec<Post>,
    skipped: Vec<InvalidPost>,
}

impl PostIndex {
    /// Reads every entry of `source`, newest first.
    ///
    /// Posts sharing a date keep the source's enumeration order.
    pub fn load(
        source: &dyn ContentSource,
        images: &dyn ImageProbe,
        image_prefix: &str,
        policy: LoadPolicy,
    ) -> anyhow::Result<Self> {
        let ids = source.list_entries()?;

        let parsed: Vec<Option<Result<Post, InvalidPost>>> = ids
            .par_iter()
            .map(|id| -> anyhow::Result<Option<Result<Post, InvalidPost>>> {
                let Some(raw) = source.read_entry(id)? else {
                    // Vanished between listing and reading.
                    return Ok(None);
                };
                Ok(Some(
                    Post::from_entry(id, &raw, images, image_prefix)
                        .map_err(|source| InvalidPost { id: id.clone(), source }),
                ))
            })
            .collect::<anyhow::Result<_>>()?;

        let mut index = PostIndex::default();
        for entry in parsed.into_iter().flatten() {
            match entry {
                Ok(post) => index.posts.push(post),
                Err(invalid) if policy == LoadPolicy::Strict => return Err(invalid.into()),
                Err(invalid) => index.skipped.push(invalid),
            }
        }
        index.sort();
        Ok(index)
    }

    /// Loads a single post without enumerating the whole source.
    pub fn load_one(
        source: &dyn ContentSource,
        images: &dyn ImageProbe,
        image_prefix: &str,
        slug: &str,
    ) -> anyhow::Result<Option<Post>> {
        let Some(raw) = source.read_entry(slug)? else {
            return Ok(None);
        };
        let post = Post::from_entry(slug, &raw, images, image_prefix)
            .map_err(|source| InvalidPost { id: slug.to_string(), source })?;
        Ok(Some(post))
    }

    fn sort(&mut self) {
        // ISO dates order lexicographically; sort_by is stable.
        self.posts.sort_by(|a, b| b.date.cmp(&a.date));
    }

    pub fn all(&self) -> &[Post] {
        &self.posts
    }

    /// Entries left out under [`LoadPolicy::Skip`].
    pub fn skipped(&self) -> &[InvalidPost] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn position(&self, slug: &str) -> Option<usize> {
        self.posts.iter().position(|p| p.slug == slug)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Post> {
        self.position(slug).map(|i| &self.posts[i])
    }

    pub fn get_adjacent(&self, slug: &str) -> Adjacent<'_> {
        let Some(i) = self.position(slug) else {
            return Adjacent::default();
        };
        Adjacent {
            previous: i.checked_sub(1).map(|p| &self.posts[p]),
            next: self.posts.get(i + 1),
        }
    }

    /// Posts sharing tags with `tags`, most shared tags first.
    ///
    /// Equal scores keep the date order. Posts sharing nothing are dropped.
    pub fn get_related(&self, slug: &str, tags: &[String], limit: usize) -> Vec<&Post> {
        let wanted: HashSet<&str> = tags.iter().map(String::as_str).collect();

        let mut scored: Vec<(usize, &Post)> = self
            .posts
            .iter()
            .filter(|p| p.slug != slug)
            .map(|p| {
                let own: HashSet<&str> = p.tags.iter().map(String::as_str).collect();
                (own.intersection(&wanted).count(), p)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, p)| p).collect()
    }

    /// Case-insensitive match on title, excerpt or any tag.
    pub fn search(&self, query: &str) -> Vec<&Post> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.posts.iter().collect();
        }
        self.posts
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p.excerpt.to_lowercase().contains(&needle)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The `page`-th (1-based) slice of `per_page` posts.
    ///
    /// An empty index still has one (empty) first page.
    pub fn paginate(&self, page: usize, per_page: usize) -> Option<Page<'_>> {
        let per_page = per_page.max(1);
        let total_pages = self.posts.len().div_ceil(per_page).max(1);
        if page == 0 || page > total_pages {
            return None;
        }
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(self.posts.len());
        Some(Page { posts: &self.posts[start..end], current: page, total_pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContent;

    fn doc(date: &str, tags: &[&str]) -> String {
        let tags = tags.iter().map(|t| format!("\"{}\"", t)).collect::<Vec<_>>().join(", ");
        format!(
            "---\ntitle: Post from {date}\nauthor: Tester\ndate: {date}\nexcerpt: About {date}\ntags: [{tags}]\n---\nSome body text.\n"
        )
    }

    fn no_images() -> HashSet<String> {
        HashSet::new()
    }

    fn load(source: &MemoryContent) -> PostIndex {
        PostIndex::load(source, &no_images(), "/images", LoadPolicy::Skip).unwrap()
    }

    fn slugs<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<&'a str> {
        posts.into_iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn reading_time_rounds_up_with_floor_of_one() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time("word"), 1);
        assert_eq!(reading_time(&"w ".repeat(200)), 1);
        assert_eq!(reading_time(&"w ".repeat(201)), 2);
        assert_eq!(reading_time(&"w\n".repeat(400)), 2);
    }

    #[test]
    fn sorts_newest_first_and_keeps_ties_stable() {
        let source = MemoryContent::new()
            .with("old", &doc("2023-05-01", &[]))
            .with("tie-first", &doc("2024-02-02", &[]))
            .with("new", &doc("2024-09-30", &[]))
            .with("tie-second", &doc("2024-02-02", &[]));
        let index = load(&source);
        assert_eq!(slugs(index.all()), vec!["new", "tie-first", "tie-second", "old"]);
    }

    #[test]
    fn derives_fields() {
        let images: HashSet<String> = ["hello.png".to_string(), "hello-dark.PNG".to_string()].into();
        let source = MemoryContent::new().with("hello", &doc("2024-01-01", &["rust"]));
        let index = PostIndex::load(&source, &images, "/images", LoadPolicy::Skip).unwrap();
        let post = index.get_by_slug("hello").unwrap();
        assert_eq!(post.title, "Post from 2024-01-01");
        assert_eq!(post.author, "Tester");
        assert_eq!(post.body, "Some body text.");
        assert_eq!(post.reading_time, 1);
        assert_eq!(post.image.as_deref(), Some("/images/hello.png"));
        assert_eq!(post.image_dark.as_deref(), Some("/images/hello-dark.PNG"));
        assert!(index.get_by_slug("nope").is_none());
    }

    #[test]
    fn skip_policy_drops_invalid_entries() {
        let source = MemoryContent::new()
            .with("good", &doc("2024-01-01", &[]))
            .with("bad", "---\ntitle: Only a title\n---\nbody");
        let index = load(&source);
        assert_eq!(slugs(index.all()), vec!["good"]);
        assert_eq!(index.skipped().len(), 1);
        assert_eq!(index.skipped()[0].id, "bad");
    }

    #[test]
    fn strict_policy_fails_the_load() {
        let source = MemoryContent::new()
            .with("good", &doc("2024-01-01", &[]))
            .with("bad", &doc("01/02/2024", &[]));
        let err = PostIndex::load(&source, &no_images(), "/images", LoadPolicy::Strict).unwrap_err();
        assert!(err.to_string().starts_with("bad:"));
    }

    #[test]
    fn load_one_reads_a_single_entry() {
        let source = MemoryContent::new().with("a", &doc("2024-01-01", &[]));
        let post = PostIndex::load_one(&source, &no_images(), "/images", "a").unwrap();
        assert_eq!(post.unwrap().slug, "a");
        assert!(PostIndex::load_one(&source, &no_images(), "/images", "b").unwrap().is_none());
    }

    #[test]
    fn adjacent_posts() {
        let source = MemoryContent::new()
            .with("a", &doc("2024-01-01", &[]))
            .with("b", &doc("2024-01-02", &[]))
            .with("c", &doc("2024-01-03", &[]));
        let index = load(&source);

        let mid = index.get_adjacent("b");
        assert_eq!(mid.previous.map(|p| p.slug.as_str()), Some("c"));
        assert_eq!(mid.next.map(|p| p.slug.as_str()), Some("a"));

        let newest = index.get_adjacent("c");
        assert!(newest.previous.is_none());
        assert_eq!(newest.next.map(|p| p.slug.as_str()), Some("b"));

        let oldest = index.get_adjacent("a");
        assert_eq!(oldest.previous.map(|p| p.slug.as_str()), Some("b"));
        assert!(oldest.next.is_none());

        let missing = index.get_adjacent("zzz");
        assert!(missing.previous.is_none() && missing.next.is_none());
    }

    #[test]
    fn related_posts_rank_by_shared_tags() {
        let source = MemoryContent::new()
            .with("p1", &doc("2024-01-03", &["go"]))
            .with("p2", &doc("2024-01-02", &["go", "rust"]))
            .with("p3", &doc("2024-01-01", &[]))
            .with("x", &doc("2024-01-04", &["go", "rust"]));
        let index = load(&source);
        let tags = vec!["go".to_string(), "rust".to_string()];

        assert_eq!(slugs(index.get_related("x", &tags, 2)), vec!["p2", "p1"]);
        assert_eq!(slugs(index.get_related("x", &tags, 1)), vec!["p2"]);
        assert!(index.get_related("x", &[], 3).is_empty());
    }

    #[test]
    fn related_ties_keep_date_order() {
        let source = MemoryContent::new()
            .with("older", &doc("2024-01-01", &["web"]))
            .with("newer", &doc("2024-06-01", &["web", "web"]))
            .with("self", &doc("2024-03-01", &["web"]));
        let index = load(&source);
        let tags = vec!["web".to_string()];
        assert_eq!(slugs(index.get_related("self", &tags, 5)), vec!["newer", "older"]);
    }

    #[test]
    fn search_matches_title_excerpt_and_tags() {
        let source = MemoryContent::new()
            .with("webrtc", "---\ntitle: WebRTC in practice\nauthor: A\ndate: 2024-01-03\nexcerpt: Peers\ntags: [networking]\n---\nb")
            .with("vpn", "---\ntitle: Home VPN\nauthor: A\ndate: 2024-01-02\nexcerpt: WireGuard setup\ntags: [sysadmin]\n---\nb")
            .with("ci", "---\ntitle: CI\nauthor: A\ndate: 2024-01-01\nexcerpt: Pipelines\ntags: [DevOps]\n---\nb");
        let index = load(&source);

        assert_eq!(slugs(index.search("webrtc")), vec!["webrtc"]);
        assert_eq!(slugs(index.search("wireguard")), vec!["vpn"]);
        assert_eq!(slugs(index.search("devops")), vec!["ci"]);
        assert_eq!(index.search("  ").len(), 3);
        assert!(index.search("kubernetes").is_empty());
    }

    #[test]
    fn paginates() {
        let mut source = MemoryContent::new();
        for day in 1..=9 {
            source = source.with(&format!("p{}", day), &doc(&format!("2024-01-0{}", day), &[]));
        }
        let index = load(&source);

        let first = index.paginate(1, 4).unwrap();
        assert_eq!(first.total_pages, 3);
        assert_eq!(slugs(first.posts), vec!["p9", "p8", "p7", "p6"]);
        let last = index.paginate(3, 4).unwrap();
        assert_eq!(slugs(last.posts), vec!["p1"]);
        assert!(index.paginate(4, 4).is_none());
        assert!(index.paginate(0, 4).is_none());

        let empty = PostIndex::default();
        let only = empty.paginate(1, 4).unwrap();
        assert_eq!(only.total_pages, 1);
        assert!(only.posts.is_empty());
    }
}
