//! Table of contents: heading extraction, nesting and active-section lookup.
//!
//! Headings are scanned straight from the markdown source, line by line,
//! so the outline is available before (and independently of) rendering.
//! Only levels 2 through 4 take part; the post title owns level 1.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Scroll bias, in pixels, applied when deciding which heading is active.
pub const LOOKAHEAD: f64 = 120.0;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{2,4})\s+(.+)$").expect("heading pattern is valid"));

/// One entry in a table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<HeadingNode>,
}

/// Turns heading (or file) text into a URL-safe anchor id.
///
/// Lowercases, drops anything outside `[a-z0-9\s-]`, turns whitespace runs
/// into a single hyphen, collapses hyphen runs and trims hyphens at both
/// ends. Distinct headings with the same visible text get the same id.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        }
    }
    slug
}

/// Tracks whether the scanner is inside a fenced code block.
#[derive(Default)]
struct Fence {
    open: Option<(char, usize)>,
}

impl Fence {
    /// Feeds one line; returns true when the line is fence syntax or fenced content.
    fn consume(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        let marker = trimmed.chars().next();
        let run = match marker {
            Some(m @ ('`' | '~')) if indent < 4 => trimmed.chars().take_while(|&c| c == m).count(),
            _ => 0,
        };

        match (self.open, marker) {
            (Some((open_char, open_len)), Some(m)) if m == open_char && run >= open_len => {
                // A closing fence carries nothing but the marker run.
                if trimmed[run..].trim().is_empty() {
                    self.open = None;
                }
                true
            }
            (Some(_), _) => true,
            // A backtick in the info string makes the line ordinary text.
            (None, Some('`')) if run >= 3 && trimmed[run..].contains('`') => false,
            (None, Some(m)) if run >= 3 => {
                self.open = Some((m, run));
                true
            }
            _ => false,
        }
    }
}

/// Splits a trailing `{#id .class key=value}` block off heading text.
///
/// Returns the heading text without the block and the explicit id, if the
/// block names one. The last `#id` wins, as in the markdown renderer.
pub fn split_attributes(text: &str) -> (&str, Option<&str>) {
    let text = text.trim_end();
    let Some(open) = text.strip_suffix('}').and_then(|inner| inner.rfind('{')) else {
        return (text, None);
    };
    let id = text[open + 1..text.len() - 1]
        .split_whitespace()
        .filter_map(|attr| attr.strip_prefix('#'))
        .filter(|id| !id.is_empty())
        .last();
    (text[..open].trim_end(), id)
}

/// Extracts the h2–h4 outline of a markdown document as a forest.
///
/// Lines inside fenced code blocks are skipped. Inline markup in heading
/// text is kept verbatim, both in `text` and when slugging the `id`. A
/// trailing attribute block is dropped from `text`, and its `#id`, when
/// present, replaces the slug.
pub fn parse_headings(markdown: &str) -> Vec<HeadingNode> {
    let mut roots: Vec<HeadingNode> = Vec::new();
    // Indices into the tree: the path from a root down to the last pushed node.
    let mut stack: Vec<(usize, u8)> = Vec::new();
    let mut fence = Fence::default();

    for line in markdown.lines() {
        if fence.consume(line) {
            continue;
        }
        let Some(caps) = HEADING_RE.captures(line) else {
            continue;
        };
        let (text, explicit_id) = split_attributes(caps[2].trim());
        if text.is_empty() {
            continue;
        }
        // The pattern bounds the marker run to 2..=4.
        let level = caps[1].len() as u8;
        let node = HeadingNode {
            id: explicit_id.map_or_else(|| slugify(text), str::to_string),
            text: text.to_string(),
            level,
            children: Vec::new(),
        };

        while stack.last().is_some_and(|&(_, top)| top >= level) {
            stack.pop();
        }

        let siblings = match stack.split_first() {
            None => &mut roots,
            Some((&(root, _), rest)) => {
                let mut parent = &mut roots[root];
                for &(child, _) in rest {
                    parent = &mut parent.children[child];
                }
                &mut parent.children
            }
        };
        siblings.push(node);
        stack.push((siblings.len() - 1, level));
    }

    roots
}

/// Returns the ids of every ancestor of `target_id`, root first.
///
/// `None` when no node carries that id; an empty path for a root node.
pub fn find_parent_ids(forest: &[HeadingNode], target_id: &str) -> Option<Vec<String>> {
    fn walk(items: &[HeadingNode], target_id: &str, path: &mut Vec<String>) -> bool {
        for item in items {
            if item.id == target_id {
                return true;
            }
            path.push(item.id.clone());
            if walk(&item.children, target_id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    walk(forest, target_id, &mut path).then_some(path)
}

/// Pre-order list of ids, i.e. the order the headings appear in the source.
pub fn flatten_ids(forest: &[HeadingNode]) -> Vec<String> {
    fn walk(items: &[HeadingNode], out: &mut Vec<String>) {
        for item in items {
            out.push(item.id.clone());
            walk(&item.children, out);
        }
    }

    let mut out = Vec::new();
    walk(forest, &mut out);
    out
}

/// Picks the heading the reader is currently looking at.
///
/// `headings` is the source-ordered list of `(id, document offset)`. The
/// last heading at or above `scroll + LOOKAHEAD` wins; before the first
/// heading is reached, the first one is active.
pub fn active_heading<'a>(headings: &'a [(String, f64)], scroll: f64) -> Option<&'a str> {
    let (first, _) = headings.first()?;
    let threshold = scroll + LOOKAHEAD;
    let active = headings
        .iter()
        .take_while(|(_, offset)| *offset <= threshold)
        .last()
        .map_or(first, |(id, _)| id);
    Some(active.as_str())
}
