//! Typed front matter.
//!
//! A post starts with a metadata block fenced by `---` (YAML) or `+++`
//! (TOML). Both formats deserialize into the same loose shape first, and
//! are then validated into [`FrontMatter`], where every required field is
//! present and well formed.

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::{fmt, sync::LazyLock};
use thiserror::Error;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// The required front matter keys, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Date,
    Excerpt,
    Tags,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Author, Field::Date, Field::Excerpt, Field::Tags];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Date => "date",
            Field::Excerpt => "excerpt",
            Field::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FrontMatterError {
    #[error("file does not start with a front matter delimiter (--- or +++)")]
    MissingOpening,
    #[error("front matter closing delimiter ({0}) not found")]
    Unclosed(&'static str),
    #[error("front matter does not parse: {0}")]
    Syntax(String),
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<Field>),
    #[error("date format invalid, expected YYYY-MM-DD, got: {0}")]
    InvalidDate(String),
    #[error("tags should be a list of strings")]
    TagsNotList,
}

fn join_fields(fields: &[Field]) -> String {
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

/// Validated metadata of a single post.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub author: String,
    pub date: String,
    pub excerpt: String,
    pub tags: Vec<String>,
}

/// What the metadata block looks like before validation.
#[derive(Debug, Default, Deserialize)]
struct RawFrontMatter {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    excerpt: Option<String>,
    tags: Option<serde_json::Value>,
}

#[derive(Clone, Copy)]
enum Format {
    Yaml,
    Toml,
}

/// Splits a document into its metadata block and body without validating.
///
/// Returns the format, the raw block and the body (trimmed).
fn split(raw: &str) -> Result<(Format, &str, &str), FrontMatterError> {
    let raw = raw.trim_start();
    let (delimiter, format) = if raw.starts_with("---") {
        ("---", Format::Yaml)
    } else if raw.starts_with("+++") {
        ("+++", Format::Toml)
    } else {
        return Err(FrontMatterError::MissingOpening);
    };

    let after_open = match raw.find('\n') {
        Some(i) => &raw[i + 1..],
        None => return Err(FrontMatterError::Unclosed(delimiter)),
    };

    // The closing delimiter has to sit on a line of its own.
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim() == delimiter {
            let block = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((format, block, body.trim()));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unclosed(delimiter))
}

fn deserialize(format: Format, block: &str) -> Result<RawFrontMatter, FrontMatterError> {
    match format {
        Format::Yaml => {
            if block.trim().is_empty() {
                return Ok(RawFrontMatter::default());
            }
            serde_yaml::from_str(block).map_err(|e| FrontMatterError::Syntax(e.to_string()))
        }
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(block).map_err(|e| FrontMatterError::Syntax(e.to_string()))?;
            // Bare TOML dates are datetimes, not strings.
            if let Some(toml::Value::Datetime(d)) = table.get("date") {
                let date = d.to_string();
                table.insert("date".to_string(), toml::Value::String(date));
            }
            RawFrontMatter::deserialize(toml::Value::Table(table))
                .map_err(|e| FrontMatterError::Syntax(e.to_string()))
        }
    }
}

fn is_valid_date(date: &str) -> bool {
    DATE_RE.is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

impl RawFrontMatter {
    fn validate(self) -> Result<FrontMatter, FrontMatterError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let missing: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|field| match field {
                Field::Title => !present(&self.title),
                Field::Author => !present(&self.author),
                Field::Date => !present(&self.date),
                Field::Excerpt => !present(&self.excerpt),
                Field::Tags => matches!(self.tags, None | Some(serde_json::Value::Null)),
            })
            .collect();
        if !missing.is_empty() {
            return Err(FrontMatterError::MissingFields(missing));
        }

        let date = self.date.unwrap_or_default().trim().to_string();
        if !is_valid_date(&date) {
            return Err(FrontMatterError::InvalidDate(date));
        }

        let tags = match self.tags {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s.trim().to_string()),
                    _ => Err(FrontMatterError::TagsNotList),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(FrontMatterError::TagsNotList),
        };

        Ok(FrontMatter {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            date,
            excerpt: self.excerpt.unwrap_or_default(),
            tags,
        })
    }
}

/// Parses and validates a post document, returning its metadata and body.
pub fn parse(raw: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let (format, block, body) = split(raw)?;
    let meta = deserialize(format, block)?.validate()?;
    Ok((meta, body))
}
