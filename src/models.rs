use serde::Serialize;

/// A blog entry, as loaded from one content file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub tags: Vec<String>,
    /// Raw markdown, front matter removed.
    pub body: String,
    pub image: Option<String>,
    pub image_dark: Option<String>,
    /// Minutes.
    pub reading_time: usize,
}

/// Chronological neighbours of a post in the date-descending list.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct Adjacent<'a> {
    /// The newer post.
    pub previous: Option<&'a Post>,
    /// The older post.
    pub next: Option<&'a Post>,
}

/// One slice of the post list.
#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub posts: &'a [Post],
    /// 1-based.
    pub current: usize,
    pub total_pages: usize,
}
